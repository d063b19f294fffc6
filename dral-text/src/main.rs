//! dral-text - DRaL spreadsheet importer
//!
//! Imports occurrence, sentence and text metadata sheets into the DRaL
//! database, and offers maintenance and read-only reporting commands.
//!
//! Settings resolution (highest first): command line, environment
//! (`DRAL_DATABASE`, `DRAL_REFERENCE_TEXT`), `config.toml`, defaults.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use dral_common::db::init_database;
use dral_common::db::Text;
use dral_common::Settings;
use dral_text::db::reports::{self, OccurrenceFilter, OccurrencePage, OmissionRow};
use dral_text::db::texts;
use dral_text::{Action, ImportOutcome, Importer};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command-line arguments for dral-text
#[derive(Parser, Debug)]
#[command(name = "dral-text")]
#[command(about = "Import and reconcile DRaL spreadsheets")]
#[command(version)]
struct Args {
    /// SQLite database file
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Code of the reference text (the original language)
    #[arg(long, global = true)]
    reference_text: Option<String>,

    /// Print the result as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import occurrence sheets
    Import { file: PathBuf },
    /// Import sentence sheets ("<chapter> <text code>")
    ImportSentences { file: PathBuf },
    /// Import text metadata
    ImportTexts { file: PathBuf },
    /// Recompute derived occurrence fields
    Clean,
    /// Delete all imported data
    Clear,
    /// List occurrences, 100 per page
    List {
        /// Text code
        #[arg(long)]
        text: Option<String>,
        /// Lemma string
        #[arg(long)]
        lemma: Option<String>,
        /// Chapter slug
        #[arg(long)]
        chapter: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: i64,
    },
    /// Relative omission of each lemma in one text
    Omission { text: String },
    /// Known texts and their metadata
    Texts,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::resolve(args.database.as_deref(), args.reference_text.as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Starting dral-text v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Database: {}", settings.database_path.display());
    info!("Reference text: {}", settings.reference_text);

    let pool = init_database(&settings.database_path)
        .await
        .with_context(|| format!("Failed to open {}", settings.database_path.display()))?;

    let (action, file) = match args.command {
        Command::Import { file } => (Action::Import, Some(file)),
        Command::ImportSentences { file } => (Action::ImportSentences, Some(file)),
        Command::ImportTexts { file } => (Action::ImportTexts, Some(file)),
        Command::Clean => (Action::Clean, None),
        Command::Clear => (Action::Clear, None),
        Command::List {
            text,
            lemma,
            chapter,
            page,
        } => {
            let filter = OccurrenceFilter {
                text,
                lemma,
                chapter,
            };
            let mut conn = pool.acquire().await?;
            let page = reports::list_occurrences(&mut conn, &filter, page).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&page)?);
            } else {
                print_lines(page_lines(&page));
            }
            return Ok(());
        }
        Command::Omission { text } => {
            let mut conn = pool.acquire().await?;
            let rows = reports::omission_report(&mut conn, &text).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                print_lines(omission_lines(&rows));
            }
            return Ok(());
        }
        Command::Texts => {
            let mut conn = pool.acquire().await?;
            let texts = texts::list_texts(&mut conn).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&texts)?);
            } else {
                print_lines(text_lines(&texts));
            }
            return Ok(());
        }
    };

    let importer = Importer::new(pool.clone(), settings.reference_text.clone());
    let outcome = importer.run(action, file.as_deref()).await;
    pool.close().await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }

    match outcome.error {
        Some(error) => Err(anyhow!(error)),
        None => Ok(()),
    }
}

fn print_outcome(outcome: &ImportOutcome) {
    for message in &outcome.messages {
        println!("{:?}: {}", message.severity, message.message);
    }
    for line in outcome.stats.display_lines() {
        println!("{}", line);
    }
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

/// Tab-separated occurrence rows under a page header
fn page_lines(page: &OccurrencePage) -> Vec<String> {
    let mut lines = vec![format!(
        "Page {} of {} ({} occurrences)",
        page.page, page.total_pages, page.total_results
    )];
    lines.extend(page.rows.iter().map(|row| {
        format!(
            "{}\t{}\t{}\t{}\t{}:{}\t{}\t{}",
            row.chapter,
            row.text,
            row.lemma,
            row.sentence_index,
            row.cell_line,
            row.cell_col,
            row.cell,
            row.string.as_deref().unwrap_or("")
        )
    }));
    lines
}

fn omission_lines(rows: &[OmissionRow]) -> Vec<String> {
    rows.iter()
        .map(|row| {
            format!(
                "{}\t{}\t{} of {} omitted ({:.2})",
                row.text, row.lemma, row.omitted, row.freq, row.ratio_omitted
            )
        })
        .collect()
}

fn text_lines(texts: &[Text]) -> Vec<String> {
    texts
        .iter()
        .map(|text| {
            let year = text
                .original_publication_year
                .map(|year| year.to_string())
                .unwrap_or_default();
            format!(
                "{}\t{}\t{}\t{}{}",
                text.code,
                text.language.as_deref().unwrap_or(""),
                text.authors.as_deref().unwrap_or(""),
                year,
                if text.is_public { "\tpublic" } else { "" }
            )
        })
        .collect()
}
