use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ir_core::builder::{build_parallel, terms_from_raw_docs};
use ir_core::corpus::{convert_html_special_chars, parse_sgml};
use ir_core::index::PositionMode;
use ir_core::persist::{save_index, IndexPaths, MetaFile};
use ir_core::query_syntax::parse_query;
use ir_core::{DocId, IrError, Normalizer, QueryProcessor};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query a positional inverted index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from Reuters SGML files
    Build {
        /// Input path (.sgm file or directory of .sgm files)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long, default_value = "./index")]
        output: String,
        /// Stopword list (whitespace separated); defaults to the built-in English list
        #[arg(long)]
        stopwords: Option<PathBuf>,
        /// Disable stemming
        #[arg(long, default_value_t = false)]
        no_stem: bool,
        /// Renumber positions 0..k-1 after stopword removal
        #[arg(long, default_value_t = false)]
        compact_positions: bool,
        /// Worker threads for tokenization and shard building (default: all cores)
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Answer queries read from stdin
    Query {
        /// Index directory
        #[arg(long, default_value = "./index")]
        index: String,
        /// Stopword list used when the index was built
        #[arg(long)]
        stopwords: Option<PathBuf>,
        /// Disable stemming
        #[arg(long, default_value_t = false)]
        no_stem: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(io::stderr).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, stopwords, no_stem, compact_positions, threads } => {
            if let Some(n) = threads {
                configure_threads(n)?;
            }
            let normalizer = Normalizer::from_config(stopwords.as_deref(), !no_stem)?;
            let mode = if compact_positions { PositionMode::Compact } else { PositionMode::Source };
            build_index(&input, &output, &normalizer, mode)
        }
        Commands::Query { index, stopwords, no_stem } => {
            let normalizer = Normalizer::from_config(stopwords.as_deref(), !no_stem)?;
            query_loop(&index, &normalizer)
        }
    }
}

fn configure_threads(n: usize) -> Result<()> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n)
        .build_global()
        .context("configuring the worker pool")
}

/// Sorted `.sgm` files under `input`, or `input` itself if it is a file.
fn list_corpus_files(input: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).max_depth(1).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && p.extension().and_then(|s| s.to_str()) == Some("sgm") {
                files.push(p.to_path_buf());
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    }
    files.sort();
    files
}

fn build_index(input: &str, output: &str, normalizer: &Normalizer, mode: PositionMode) -> Result<()> {
    let files = list_corpus_files(Path::new(input));
    if files.is_empty() {
        bail!("no .sgm files found at {input}");
    }

    let mut raw_docs: BTreeMap<DocId, String> = BTreeMap::new();
    for file in &files {
        let bytes = fs::read(file).with_context(|| format!("reading {}", file.display()))?;
        let text = String::from_utf8_lossy(&bytes);
        let docs = parse_sgml(&text).with_context(|| format!("parsing {}", file.display()))?;
        tracing::debug!(file = %file.display(), docs = docs.len(), "parsed corpus file");
        for (doc_id, mut doc) in docs {
            if raw_docs.contains_key(&doc_id) {
                tracing::warn!(doc_id, file = %file.display(), "duplicate document id, keeping first");
                continue;
            }
            convert_html_special_chars(&mut doc);
            raw_docs.insert(doc_id, doc);
        }
    }
    tracing::info!(files = files.len(), num_docs = raw_docs.len(), "ingested documents");

    let doc_terms = terms_from_raw_docs(normalizer, &raw_docs);
    let (dictionary, index) = build_parallel(doc_terms, mode)?;

    let meta = MetaFile {
        num_docs: raw_docs.len() as u32,
        num_terms: dictionary.len() as u32,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "".into()),
        position_mode: mode,
        version: 1,
    };
    save_index(&IndexPaths::new(output), &dictionary, &index, &meta)?;

    tracing::info!(output, num_terms = dictionary.len(), "index build complete");
    Ok(())
}

fn query_loop(index: &str, normalizer: &Normalizer) -> Result<()> {
    print!("Reading index files...");
    io::stdout().flush()?;
    let processor = match QueryProcessor::load(&IndexPaths::new(index)) {
        Ok(p) => p,
        Err(e @ IrError::MissingArtifact { .. }) => {
            println!();
            return Err(e).context("build the index first with `indexer build`");
        }
        Err(e) => return Err(e.into()),
    };
    println!("OK!\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();
    loop {
        print!("Please enter a search query and press Enter\n> ");
        stdout.flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(());
        }

        let results = match parse_query(normalizer, &line, processor.position_mode())
            .and_then(|q| processor.execute(&q))
        {
            Ok(results) => results,
            Err(IrError::InvalidQuery(msg)) => {
                println!("{msg}\n");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if results.is_empty() {
            println!("No match found!");
        } else {
            println!("Matching documents:");
            for doc_id in results {
                println!("{doc_id}");
            }
        }
    }
}
