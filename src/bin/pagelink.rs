//! pagelink - PageXML to Web Annotation CLI
//!
//! Converts a corpus of PageXML transcriptions into JSON-LD annotation
//! documents, maintains the entity curation ledger, and enriches curated
//! identifiers from external knowledge bases.
//!
//! # Usage
//!
//! ```bash
//! # Convert a corpus and update the ledger
//! pagelink convert data/corpus --ledger annotations.csv --out rdf/
//!
//! # Include the diary/entry metadata sheets
//! pagelink convert data/corpus --ledger annotations.csv --out rdf/ \
//!     --diaries data/metadata_diaries.csv --entries data/metadata_entries.csv
//!
//! # Fetch labels and coordinates for curated uris
//! pagelink enrich annotations.csv
//!
//! # Show configuration
//! pagelink info
//! ```

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};

use pagelink::pipeline::DocumentOutcome;
use pagelink::{metadata, Config, Ledger, LookupCache, Pipeline};

/// PageXML to Web Annotation converter with entity linking
#[derive(Parser)]
#[command(name = "pagelink")]
#[command(author, version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a PageXML corpus to JSON-LD annotations
    #[command(visible_alias = "c")]
    Convert(ConvertArgs),

    /// Enrich ledger rows that have a uri but no label
    #[command(visible_alias = "e")]
    Enrich(EnrichArgs),

    /// Show version and configuration
    #[command(visible_alias = "i")]
    Info,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// Corpus directory containing PageXML files
    corpus: PathBuf,

    /// Ledger CSV path; read at start, rewritten at end
    #[arg(long, default_value = "annotations.csv")]
    ledger: PathBuf,

    /// Output directory for the JSON-LD documents
    #[arg(long, short, default_value = "rdf")]
    out: PathBuf,

    /// Diary metadata sheet
    #[arg(long)]
    diaries: Option<PathBuf>,

    /// Entry metadata sheet
    #[arg(long)]
    entries: Option<PathBuf>,

    /// Identifier prefix for minted annotations
    #[arg(long)]
    prefix: Option<String>,
}

#[derive(clap::Args)]
struct EnrichArgs {
    /// Ledger CSV path
    ledger: PathBuf,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

fn write_jsonld<T: serde::Serialize>(path: &PathBuf, value: &T) -> pagelink::Result<()> {
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

fn run_convert(args: ConvertArgs) -> pagelink::Result<()> {
    let mut config = Config::new();
    if let Some(prefix) = args.prefix {
        config = config.with_prefix(prefix);
    }

    let pipeline = Pipeline::new(config);
    let mut ledger = Ledger::load(&args.ledger)?;
    let before = ledger.len();

    let report = pipeline.run(&args.corpus, &mut ledger)?;

    fs::create_dir_all(&args.out)?;
    write_jsonld(
        &args.out.join("textual_annotations.jsonld"),
        &report.textual_annotations,
    )?;
    write_jsonld(
        &args.out.join("entity_annotations.jsonld"),
        &report.entity_annotations,
    )?;

    if let (Some(diaries_path), Some(entries_path)) = (&args.diaries, &args.entries) {
        let diaries = metadata::load_diaries(diaries_path)?;
        let entries = metadata::load_entries(entries_path)?;
        let resources = metadata::generate_metadata(
            &diaries,
            &entries,
            &report.region_bodies,
            pipeline.config(),
        );
        write_jsonld(&args.out.join("metadata.jsonld"), &resources)?;
    }

    ledger.save(&args.ledger)?;

    eprintln!(
        "{} documents converted, {} failed",
        report.converted(),
        report.failed()
    );
    for doc in &report.documents {
        if let DocumentOutcome::Failed(reason) = &doc.outcome {
            eprintln!("  failed: {} ({reason})", doc.path.display());
        }
    }
    eprintln!(
        "ledger: {} rows ({} new, {} awaiting curation)",
        ledger.len(),
        ledger.len() - before,
        ledger.unresolved_count()
    );
    Ok(())
}

fn run_enrich(args: EnrichArgs) -> pagelink::Result<()> {
    let config = Config::new().with_request_timeout(args.timeout);
    let mut ledger = Ledger::load(&args.ledger)?;
    let mut cache = LookupCache::with_defaults(&config);

    let stats = cache.enrich(&mut ledger);
    ledger.save(&args.ledger)?;

    eprintln!(
        "{} rows enriched, {} already labeled, {} failed",
        stats.enriched, stats.already_labeled, stats.failed
    );
    Ok(())
}

fn run_info() {
    let config = Config::new();
    println!("pagelink {}", env!("CARGO_PKG_VERSION"));
    println!("prefix:    {}", config.prefix);
    println!("wikidata:  {}", config.wikidata_endpoint);
    println!("adamlink:  {}", config.adamlink_endpoint);

    let mut extract: Vec<&str> = config.extract_tags.iter().map(|t| t.as_label()).collect();
    extract.sort_unstable();
    println!("extracted: {}", extract.join(", "));

    let mut skipped: Vec<&str> = config.resolver_skip.iter().map(|t| t.as_label()).collect();
    skipped.sort_unstable();
    println!("skipped:   {}", skipped.join(", "));
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Convert(args) => run_convert(args),
        Commands::Enrich(args) => run_enrich(args),
        Commands::Info => {
            run_info();
            Ok(())
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
