//! edureconcile command-line front end.
//!
//! Works over JSON files holding an array of teacher or school objects, as
//! exported from the backend store.
//!
//! **Usage:**
//! ```bash
//! edureconcile detect --input teachers.json --kind teacher
//! edureconcile listing --input schools.json --kind school
//! edureconcile similarity "Gayaza High School" "Gayaza High Schol"
//! edureconcile report --teachers teachers.json --schools schools.json
//! ```

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use edureconcile::{
    compute_similarity, EntityKind, EntityRecord, InMemoryEntityStore, NullSink,
    ReconcileConfig, ReconciliationEngine, School, Teacher,
};

/// Duplicate detection for teacher and school records
#[derive(Parser, Debug)]
#[command(name = "edureconcile", version)]
#[command(about = "Find and report duplicate teacher and school records")]
struct Args {
    /// JSON config file
    #[arg(long, global = true, value_name = "FILE", env = "EDURECONCILE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print duplicate groups as JSON
    Detect {
        /// Records file (JSON array)
        #[arg(long, value_name = "FILE")]
        input: PathBuf,

        /// Record family: teacher or school
        #[arg(long)]
        kind: EntityKind,
    },

    /// Print the public listing with near-duplicates collapsed
    Listing {
        /// Records file (JSON array)
        #[arg(long, value_name = "FILE")]
        input: PathBuf,

        /// Record family: teacher or school
        #[arg(long)]
        kind: EntityKind,
    },

    /// Print the normalized similarity of two names
    Similarity {
        /// First name
        a: String,
        /// Second name
        b: String,
    },

    /// Print the marketplace report as text
    Report {
        /// Teachers file (JSON array)
        #[arg(long, value_name = "FILE")]
        teachers: PathBuf,

        /// Schools file (JSON array)
        #[arg(long, value_name = "FILE")]
        schools: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("edureconcile=info")),
        )
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = match &args.config {
        Some(path) => ReconcileConfig::from_path(path)?,
        None => ReconcileConfig::default(),
    };

    match args.command {
        Command::Detect { input, kind } => {
            let engine = engine_for(config, load_kind(&input, kind)?)?;
            let groups = engine.scan(kind)?;
            info!(%kind, groups = groups.len(), "detection finished");
            println!("{}", serde_json::to_string_pretty(&groups)?);
        }
        Command::Listing { input, kind } => {
            let engine = engine_for(config, load_kind(&input, kind)?)?;
            let listed = engine.public_listing(kind)?;
            println!("{}", serde_json::to_string_pretty(&listed)?);
        }
        Command::Similarity { a, b } => {
            println!("{:.4}", compute_similarity(&a, &b));
        }
        Command::Report { teachers, schools } => {
            let mut records = load_kind(&teachers, EntityKind::Teacher)?;
            records.extend(load_kind(&schools, EntityKind::School)?);
            let engine = engine_for(config, records)?;
            print!("{}", engine.report()?.render_text());
        }
    }
    Ok(())
}

fn engine_for(
    config: ReconcileConfig,
    records: Vec<EntityRecord>,
) -> Result<ReconciliationEngine, Box<dyn Error>> {
    let store = InMemoryEntityStore::with_records(records)?;
    Ok(ReconciliationEngine::new(
        Arc::new(store),
        Arc::new(NullSink),
        config,
    )?)
}

fn load_kind(path: &Path, kind: EntityKind) -> Result<Vec<EntityRecord>, Box<dyn Error>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("reading {}: {e}", path.display()))?;
    let records: Vec<EntityRecord> = match kind {
        EntityKind::Teacher => serde_json::from_str::<Vec<Teacher>>(&raw)?
            .into_iter()
            .map(EntityRecord::from)
            .collect(),
        EntityKind::School => serde_json::from_str::<Vec<School>>(&raw)?
            .into_iter()
            .map(EntityRecord::from)
            .collect(),
    };
    info!(%kind, count = records.len(), path = %path.display(), "records loaded");
    Ok(records)
}
