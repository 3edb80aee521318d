// src/main.rs
mod config;
mod document;
mod export;
mod extractors;
mod pipeline;
mod source;
mod storage;
mod utils;
mod watch;

use std::path::PathBuf;

use clap::Parser;
use config::{Configuration, PreferenceStore};
use document::HtmlDocument;
use pipeline::GradeExtractionPipeline;
use source::DocumentSource;
use storage::StorageManager;
use utils::error::ExtractError;
use utils::AppError;

/// Finds grade tables in an HTML page, summarizes them and exports them as CSV
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// HTML file or http(s) URL of the grades page
    input: String,

    /// JSON preference file (loaded, and written by --save-config / --reset-config)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Flag normalized grades strictly below this value (0-10)
    #[arg(long)]
    threshold: Option<f64>,

    /// File name for the CSV export
    #[arg(long)]
    csv_filename: Option<String>,

    /// Keyword marking grade tables; repeat to replace the built-in vocabulary
    #[arg(short, long = "keyword")]
    keywords: Vec<String>,

    /// Do not flag low grades
    #[arg(long)]
    no_highlight: bool,

    /// Write the candidate tables as CSV
    #[arg(short, long)]
    export: bool,

    /// Write a copy of the page with low grades and summaries marked
    #[arg(short, long)]
    annotate: bool,

    /// Write a print-ready copy of the page showing only the best candidate table
    #[arg(short, long)]
    print: bool,

    /// Write a copy of the page with every grade mark from earlier runs removed
    #[arg(long)]
    clear: bool,

    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Persist the effective settings to the --config file
    #[arg(long)]
    save_config: bool,

    /// Restore default settings in the --config file before applying overrides
    #[arg(long)]
    reset_config: bool,

    /// Re-run whenever the local input file changes
    #[arg(short, long)]
    watch: bool,

    /// Output directory for exported files
    #[arg(short, long, default_value = "./output")]
    output_dir: String,
}

/// Stored preferences with command-line overrides applied.
fn resolve_config(args: &Args) -> Result<Configuration, AppError> {
    let store = args.config.as_ref().map(PreferenceStore::new);

    let mut config = match &store {
        Some(store) if args.reset_config => store.reset()?,
        Some(store) => store.load(),
        None => Configuration::default(),
    };

    if let Some(threshold) = args.threshold {
        config.low_grade_threshold = threshold;
    }
    if let Some(name) = &args.csv_filename {
        config.csv_filename = name.clone();
    }
    if !args.keywords.is_empty() {
        config.keyword_vocabulary = args.keywords.iter().cloned().collect();
    }
    if args.no_highlight {
        config.highlight_low_grades = false;
    }

    let config = config.sanitized();

    if args.save_config {
        match &store {
            Some(store) => store.save(&config)?,
            None => tracing::warn!("--save-config given without --config; nothing saved"),
        }
    }

    Ok(config)
}

/// One full pass over a page: summaries, then the requested outputs.
fn process(
    source: &DocumentSource,
    html: &str,
    pipeline: &GradeExtractionPipeline,
    storage: &StorageManager,
    args: &Args,
) -> Result<(), AppError> {
    let doc = HtmlDocument::parse(html);

    if args.clear {
        storage.save_page(source, "cleared", &utils::annotate::clear_marks(&doc))?;
    }

    let report = pipeline.compute_summaries(doc.document())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for table in &report.tables {
            println!("{}", table.summary);
            for row in table.rows.iter().filter(|r| r.is_low_grade) {
                let cells: Vec<&str> = row.raw_cells.iter().map(|c| c.trim()).collect();
                println!("  low grade: {}", cells.join(" | "));
            }
        }
    }

    if let Err(e) = storage.save_report_metadata(source, &report) {
        tracing::error!("Failed to save summary metadata: {}", e);
    }

    if args.annotate {
        let annotated = utils::annotate::annotate_html(&doc, &report);
        storage.save_page(source, "annotated", &annotated)?;
    }

    if args.print {
        let table = pipeline.print_target(doc.document())?;
        storage.save_page(source, "print", &utils::annotate::print_page(&doc, table))?;
    }

    if args.export {
        match pipeline.export_csv(doc.document()) {
            Ok(export) => {
                let path = storage.save_csv(&export)?;
                println!("CSV written to {}", path.display());
            }
            Err(ExtractError::NothingToExport) => println!("Nothing to export"),
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::info!("Starting processing for args: {:?}", args);

    // 3. Resolve settings and storage
    let config = resolve_config(&args)?;
    let storage = StorageManager::new(&args.output_dir)?;
    let pipeline = GradeExtractionPipeline::new(config);

    // 4. Load the page and run once
    let source = DocumentSource::parse(&args.input);
    let html = source.load().await?;
    tracing::info!("Loaded document ({} bytes)", html.len());

    let first_run = process(&source, &html, &pipeline, &storage, &args);

    if !args.watch {
        return first_run;
    }
    if let Err(e) = &first_run {
        tracing::warn!("{}", e);
    }

    // 5. Watch mode: re-run on every debounced change
    let Some(path) = source.local_path() else {
        tracing::warn!("--watch only works with local files");
        return first_run;
    };
    if !pipeline.config().auto_calc_on_change {
        tracing::warn!("autoCalcOnChange is disabled in the preferences; not watching");
        return first_run;
    }

    watch::watch_file(path, || {
        let html = match std::fs::read(path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                tracing::error!("Failed to re-read {}: {}", path.display(), e);
                return;
            }
        };
        if let Err(e) = process(&source, &html, &pipeline, &storage, &args) {
            tracing::warn!("{}", e);
        }
    })
    .await;

    Ok(())
}
