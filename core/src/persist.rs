use std::collections::HashSet;
use std::fs::{self, create_dir_all, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IrError, Result};
use crate::index::{Dictionary, DocId, Position, PositionMode, PositionalIndex, Posting, TermId};

pub const POS_LIST_BEG_TAG: &str = "<POS_LIST>";
pub const POS_LIST_END_TAG: &str = "</POS_LIST>";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: u32,
    pub created_at: String,
    #[serde(default)]
    pub position_mode: PositionMode,
    pub version: u32,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn dictionary(&self) -> PathBuf { self.root.join("dict.txt") }
    pub fn index(&self) -> PathBuf { self.root.join("index.txt") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

/// Writes through a sibling temp file and renames it into place, so readers
/// never observe a partially written artifact.
fn write_atomically<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    if let Some(dir) = path.parent() {
        create_dir_all(dir)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    let mut w = BufWriter::new(File::create(&tmp)?);
    fill(&mut w)?;
    w.into_inner().map_err(|e| e.into_error())?.sync_all()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn read_artifact(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => IrError::MissingArtifact { path: path.to_path_buf() },
        _ => IrError::Io(e),
    })
}

pub fn write_dictionary(paths: &IndexPaths, dict: &Dictionary) -> Result<()> {
    let mut entries: Vec<(&String, &TermId)> = dict.iter().collect();
    entries.sort_by_key(|(_, id)| **id);
    write_atomically(&paths.dictionary(), |w| {
        for (term, id) in entries {
            writeln!(w, "{term} {id}")?;
        }
        Ok(())
    })
}

pub fn read_dictionary(paths: &IndexPaths) -> Result<Dictionary> {
    let text = read_artifact(&paths.dictionary())?;
    parse_dictionary(&text)
}

pub fn parse_dictionary(text: &str) -> Result<Dictionary> {
    let mut dict = Dictionary::new();
    let mut ids = HashSet::new();
    let mut id_lines = Vec::new();
    for (n, line) in text.lines().enumerate() {
        let line_no = n + 1;
        let mut fields = line.split_whitespace();
        let (term, id) = match (fields.next(), fields.next(), fields.next()) {
            (None, _, _) => continue,
            (Some(term), Some(id), None) => (term, id),
            _ => return Err(IrError::malformed(line_no, "expected `<term> <term_id>`")),
        };
        let id: TermId = id
            .parse()
            .map_err(|_| IrError::malformed(line_no, format!("invalid term id {id:?}")))?;
        if !ids.insert(id) || dict.insert(term.to_string(), id).is_some() {
            return Err(IrError::malformed(line_no, format!("duplicate entry for {term:?} / {id}")));
        }
        id_lines.push((id, line_no));
    }
    // unique ids are dense iff every id is below the term count
    if let Some((id, line_no)) = id_lines.into_iter().find(|(id, _)| *id as usize >= dict.len()) {
        return Err(IrError::malformed(line_no, format!("term id {id} out of range for {} terms", dict.len())));
    }
    Ok(dict)
}

pub fn write_index(paths: &IndexPaths, index: &PositionalIndex) -> Result<()> {
    write_atomically(&paths.index(), |w| {
        for (term_id, postings) in index.iter() {
            writeln!(w, "{term_id}\n{POS_LIST_BEG_TAG}")?;
            for posting in postings {
                write!(w, "\t{} :", posting.doc_id)?;
                for pos in &posting.positions {
                    write!(w, " {pos}")?;
                }
                writeln!(w)?;
            }
            writeln!(w, "{POS_LIST_END_TAG}")?;
        }
        Ok(())
    })
}

/// Reads the index file; term ids must lie in `0..num_terms`.
pub fn read_index(paths: &IndexPaths, num_terms: usize) -> Result<PositionalIndex> {
    let text = read_artifact(&paths.index())?;
    parse_index(&text, num_terms)
}

/// Parses the block format produced by [`write_index`]. Any deviation from the
/// tag/field layout, or a term id outside `0..num_terms`, is an error.
pub fn parse_index(text: &str, num_terms: usize) -> Result<PositionalIndex> {
    let mut index = PositionalIndex::new();
    let mut seen = HashSet::new();
    let mut lines = text.lines().enumerate().map(|(n, l)| (n + 1, l.trim_end_matches('\r')));

    while let Some((line_no, line)) = lines.next() {
        if line.trim().is_empty() {
            continue;
        }
        let term_id: TermId = line
            .trim()
            .parse()
            .map_err(|_| IrError::malformed(line_no, format!("expected term id, found {line:?}")))?;
        if term_id as usize >= num_terms {
            return Err(IrError::malformed(line_no, format!("term id {term_id} is not in the dictionary")));
        }
        if !seen.insert(term_id) {
            return Err(IrError::malformed(line_no, format!("term id {term_id} appears twice")));
        }
        match lines.next() {
            Some((_, tag)) if tag == POS_LIST_BEG_TAG => {}
            Some((n, tag)) => return Err(IrError::malformed(n, format!("expected {POS_LIST_BEG_TAG}, found {tag:?}"))),
            None => return Err(IrError::malformed(line_no + 1, format!("missing {POS_LIST_BEG_TAG}"))),
        }

        let list = index.slot_mut(term_id);
        loop {
            let (n, line) = lines
                .next()
                .ok_or_else(|| IrError::malformed(line_no, format!("unterminated posting list for term {term_id}")))?;
            if line == POS_LIST_END_TAG {
                break;
            }
            let posting = parse_posting(n, line)?;
            if list.last().is_some_and(|prev| prev.doc_id >= posting.doc_id) {
                return Err(IrError::malformed(n, "document ids out of order"));
            }
            list.push(posting);
        }
    }
    Ok(index)
}

fn parse_posting(line_no: usize, line: &str) -> Result<Posting> {
    let (doc, positions) = line
        .split_once(':')
        .ok_or_else(|| IrError::malformed(line_no, format!("expected `<doc_id> : <positions>`, found {line:?}")))?;
    let doc_id: DocId = doc
        .trim()
        .parse()
        .map_err(|_| IrError::malformed(line_no, format!("invalid document id {:?}", doc.trim())))?;
    let mut posting = Posting::new(doc_id);
    for field in positions.split_whitespace() {
        let pos: Position = field
            .parse()
            .map_err(|_| IrError::malformed(line_no, format!("invalid position {field:?}")))?;
        if posting.positions.last().is_some_and(|&prev| prev >= pos) {
            return Err(IrError::malformed(line_no, "positions out of order"));
        }
        posting.positions.push(pos);
    }
    if posting.positions.is_empty() {
        return Err(IrError::malformed(line_no, "posting without positions"));
    }
    Ok(posting)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    let json = serde_json::to_string_pretty(meta)?;
    write_atomically(&paths.meta(), |w| w.write_all(json.as_bytes()))
}

/// Metadata is optional; an index directory without it loads with defaults.
pub fn load_meta(paths: &IndexPaths) -> Result<Option<MetaFile>> {
    match read_artifact(&paths.meta()) {
        Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
        Err(IrError::MissingArtifact { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Persists dictionary, index and metadata, each as a full rewrite.
pub fn save_index(paths: &IndexPaths, dict: &Dictionary, index: &PositionalIndex, meta: &MetaFile) -> Result<()> {
    write_dictionary(paths, dict)?;
    write_index(paths, index)?;
    save_meta(paths, meta)?;
    tracing::info!(root = %paths.root.display(), num_terms = dict.len(), "index written");
    Ok(())
}

/// Loads the dictionary and the index; fails without partial state if either is absent.
pub fn load_index(paths: &IndexPaths) -> Result<(Dictionary, PositionalIndex)> {
    let dict = read_dictionary(paths)?;
    let index = read_index(paths, dict.len())?;
    tracing::info!(root = %paths.root.display(), num_terms = dict.len(), "index loaded");
    Ok((dict, index))
}
