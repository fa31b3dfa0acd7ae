//! Reuters-21578 SGML source parsing.

use std::collections::BTreeMap;

use crate::error::{IrError, Result};
use crate::index::DocId;

const DOC_HEADER: &str = "<REUTERS";
const ID_FIELD: &str = "NEWID=\"";
const TXT_BEG_TAG: &str = "<TEXT";
const TXT_END_TAG: &str = "</TEXT";
const TITLE_BEG_TAG: &str = "<TITLE>";
const TITLE_END_TAG: &str = "</TITLE>";
const BODY_BEG_TAG: &str = "<BODY>";
const BODY_END_TAG: &str = "</BODY>";

/// Entities replaced in raw text. `&amp;` goes last so that decoded
/// ampersands are not decoded a second time.
const HTML_SPECIAL_CHARS: [(&str, char); 12] = [
    ("&#1;", ' '),
    ("&#2;", ' '),
    ("&#3;", ' '),
    ("&#5;", '\u{5}'),
    ("&#22;", ' '),
    ("&#27;", ' '),
    ("&#30;", '\u{1e}'),
    ("&#31;", '\u{1f}'),
    ("&#127;", ' '),
    ("&lt;", '<'),
    ("&gt;", '>'),
    ("&amp;", '&'),
];

/// Extracts `doc id → title + "\n" + body` from one SGML file.
pub fn parse_sgml(text: &str) -> Result<BTreeMap<DocId, String>> {
    let mut docs = BTreeMap::new();
    let mut lines = text.lines();
    while let Some(line) = lines.next() {
        if !line.starts_with(DOC_HEADER) {
            continue;
        }
        let doc_id = doc_id_from_header(line)?;
        let raw = next_text_block(&mut lines, doc_id)?;
        let doc = format!(
            "{}\n{}",
            text_between_tags(&raw, TITLE_BEG_TAG, TITLE_END_TAG),
            text_between_tags(&raw, BODY_BEG_TAG, BODY_END_TAG)
        );
        docs.insert(doc_id, doc);
    }
    Ok(docs)
}

fn doc_id_from_header(header: &str) -> Result<DocId> {
    let start = header
        .find(ID_FIELD)
        .map(|i| i + ID_FIELD.len())
        .ok_or_else(|| IrError::MalformedCorpus(format!("no {ID_FIELD} in {header:?}")))?;
    let len = header[start..].find('"').unwrap_or(header.len() - start);
    header[start..start + len]
        .parse()
        .map_err(|_| IrError::MalformedCorpus(format!("invalid document id in {header:?}")))
}

/// Collects the lines after the next `<TEXT` line up to the closing tag.
fn next_text_block<'a, I>(lines: &mut I, doc_id: DocId) -> Result<String>
where
    I: Iterator<Item = &'a str>,
{
    if !lines.by_ref().any(|l| l.contains(TXT_BEG_TAG)) {
        return Err(IrError::MalformedCorpus(format!("document {doc_id} has no {TXT_BEG_TAG} field")));
    }
    let mut text = String::new();
    for line in lines {
        text.push('\n');
        match line.find(TXT_END_TAG) {
            Some(end) => {
                text.push_str(&line[..end]);
                return Ok(text);
            }
            None => text.push_str(line),
        }
    }
    Err(IrError::MalformedCorpus(format!("document {doc_id} has no {TXT_END_TAG} field")))
}

/// Text between the first `beg` and the following `end`; empty if `beg` is absent.
fn text_between_tags<'a>(text: &'a str, beg: &str, end: &str) -> &'a str {
    let Some(start) = text.find(beg).map(|i| i + beg.len()) else {
        return "";
    };
    let rest = &text[start..];
    rest.find(end).map_or(rest, |e| &rest[..e])
}

/// Decodes the entities found in the corpus in place. Each entity keeps its
/// width: leading bytes become spaces and the last byte the decoded character.
pub fn convert_html_special_chars(doc: &mut String) {
    for (entity, ch) in HTML_SPECIAL_CHARS {
        if !doc.contains(entity) {
            continue;
        }
        let mut replacement = " ".repeat(entity.len() - 1);
        replacement.push(ch);
        *doc = doc.replace(entity, &replacement);
    }
}
