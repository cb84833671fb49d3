use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use sift_core::{build_index, DirCorpus, EngineConfig, IndexStore, SearchEngine, SearchHit, SearchOptions};
use tracing_subscriber::{fmt, EnvFilter};

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "sift-indexer")]
#[command(about = "Build and query a tf-idf document index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Paths {
    /// Corpus directory (top-level files are indexed)
    #[arg(long, default_value = "./corpus")]
    corpus: PathBuf,
    /// Index directory
    #[arg(long, default_value = "./index")]
    index: PathBuf,
}

impl Paths {
    fn config(&self) -> EngineConfig {
        EngineConfig::new(&self.corpus, &self.index)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the index from the corpus and persist it
    Build {
        #[command(flatten)]
        paths: Paths,
    },
    /// Run a single query and print the ranked documents
    Query {
        #[command(flatten)]
        paths: Paths,
        /// Expand query terms with similar-sounding vocabulary terms
        #[arg(long, default_value_t = false)]
        soundex: bool,
        /// Correct misspelled query terms against the vocabulary
        #[arg(long, default_value_t = false)]
        spell: bool,
        /// Query text
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Print statistics of the persisted index
    Stats {
        /// Index directory
        #[arg(long, default_value = "./index")]
        index: PathBuf,
    },
    /// Interactive query prompt
    Repl {
        #[command(flatten)]
        paths: Paths,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { paths } => build(&paths.config()),
        Commands::Query { paths, soundex, spell, query } => {
            let engine = SearchEngine::open(&paths.config())?;
            let options = SearchOptions { use_soundex: soundex, use_spell_correction: spell };
            let hits = engine.search(&query.join(" "), options);
            print_hits(&hits);
            Ok(())
        }
        Commands::Stats { index } => stats(index),
        Commands::Repl { paths } => repl(&paths.config()),
    }
}

fn build(config: &EngineConfig) -> Result<()> {
    let snapshot = build_index(&DirCorpus::new(&config.corpus_dir))
        .with_context(|| format!("cannot read corpus at {}", config.corpus_dir.display()))?;
    IndexStore::new(&config.index_dir).save(&snapshot).context("failed to persist index")?;
    let stats = snapshot.stats();
    tracing::info!(index = %config.index_dir.display(), "index written");
    println!(
        "Index built and saved with {} documents and {} unique terms.",
        stats.num_docs, stats.num_terms
    );
    Ok(())
}

fn stats(index: PathBuf) -> Result<()> {
    let store = IndexStore::new(&index);
    match store.load()? {
        Some(snapshot) => {
            let s = snapshot.stats();
            println!("documents:      {}", s.num_docs);
            println!("unique terms:   {}", s.num_terms);
            println!("soundex codes:  {}", s.num_soundex_codes);
            if let Ok(meta) = store.load_meta() {
                println!("created at:     {}", meta.created_at);
                println!("format version: {}", meta.version);
            }
        }
        None => println!("No index found at {}", index.display()),
    }
    Ok(())
}

fn repl(config: &EngineConfig) -> Result<()> {
    let engine = SearchEngine::open(config)?;
    let stats = engine.stats();
    if stats.num_docs == 0 {
        println!("No documents found or indexed.");
        return Ok(());
    }
    println!("\nIndex ready for {} documents with {} unique terms.", stats.num_docs, stats.num_terms);
    println!("Enter your queries. Type 'exit' to quit.\n");

    // Ctrl-C raises the flag instead of killing the process; the running query
    // sees it and returns early
    let interrupt = Arc::new(AtomicBool::new(false));
    let _signals = watch_interrupts(interrupt.clone())?;

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        let Some(query) = prompt(&mut lines, "\nEnter query (or 'exit'): ")? else { break };
        let query = query.trim().to_string();
        if matches!(query.to_lowercase().as_str(), "exit" | "quit") {
            break;
        }
        if query.is_empty() {
            println!("Empty query. Please try again.");
            continue;
        }

        let use_soundex = ask_yes_no(&mut lines, "Enable Soundex? (y/n): ")?;
        let use_spell_correction = ask_yes_no(&mut lines, "Enable Spell Correction? (y/n): ")?;

        interrupt.store(false, Ordering::SeqCst);
        let start = Instant::now();
        let options = SearchOptions { use_soundex, use_spell_correction };
        let hits = engine.search_interruptible(&query, options, &interrupt);
        let elapsed = start.elapsed();

        if interrupt.swap(false, Ordering::SeqCst) {
            println!("\nSearch interrupted. Type 'exit' to quit or try another query.");
        } else if hits.is_empty() {
            println!("\nNo matching documents found.");
        } else {
            println!("\nFound {} results in {:.3} seconds:", hits.len(), elapsed.as_secs_f64());
            print_hits(&hits);
        }
    }
    println!("\nExiting search system.");
    Ok(())
}

/// Spawn a background runtime that sets `flag` on every Ctrl-C.
/// The runtime must stay alive for as long as interrupts should be caught.
fn watch_interrupts(flag: Arc<AtomicBool>) -> Result<tokio::runtime::Runtime> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .context("failed to start signal runtime")?;
    runtime.spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                break;
            }
            tracing::debug!("interrupt received");
            flag.store(true, Ordering::SeqCst);
        }
    });
    Ok(runtime)
}

fn prompt<B: BufRead>(lines: &mut io::Lines<B>, text: &str) -> Result<Option<String>> {
    print!("{text}");
    io::stdout().flush()?;
    match lines.next() {
        Some(line) => Ok(Some(line?)),
        None => Ok(None),
    }
}

fn ask_yes_no<B: BufRead>(lines: &mut io::Lines<B>, text: &str) -> Result<bool> {
    Ok(prompt(lines, text)?.is_some_and(|answer| answer.trim().eq_ignore_ascii_case("y")))
}

fn print_hits(hits: &[SearchHit]) {
    if hits.is_empty() {
        println!("No matching documents found.");
        return;
    }
    println!("{}", "-".repeat(70));
    for (i, hit) in hits.iter().enumerate() {
        println!("{:2}. {:<45} (cosine similarity: {:.6})", i + 1, hit.document, hit.score);
    }
    println!("{}", "-".repeat(70));
}
