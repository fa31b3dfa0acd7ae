use ir_core::tokenizer::get_doc_terms;
use ir_core::Normalizer;

#[test]
fn it_normalizes_and_stems() {
    let n = Normalizer::english();
    let toks = get_doc_terms(&n, "Running Runners RUN! The \"cafe's\" menu.");
    let words: Vec<String> = toks.into_iter().map(|(w, _)| w).collect();
    assert!(words.contains(&"run".to_string()));
    // apostrophes and quotes are deleted before stemming
    assert!(words.contains(&"cafe".to_string()));
    assert!(words.contains(&"menu".to_string()));
}

#[test]
fn it_filters_stopwords() {
    let n = Normalizer::english();
    let toks = get_doc_terms(&n, "The quick brown fox and the lazy dog");
    let words: Vec<String> = toks.iter().map(|(w, _)| w.clone()).collect();
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
    // positions refer to the raw split
    assert_eq!(toks.first(), Some(&("quick".to_string(), 1)));
    assert_eq!(toks.last(), Some(&("dog".to_string(), 7)));
}

#[test]
fn it_drops_punctuation_only_tokens() {
    let n = Normalizer::english();
    let toks = get_doc_terms(&n, "profits -- rose , sharply ...");
    let positions: Vec<u32> = toks.iter().map(|(_, p)| *p).collect();
    assert_eq!(positions, vec![0, 2, 4]);
}
