use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use edition_sync::catalog_store::{
    DocumentStatus, EventSink, LoggingEventSink, NoOpEventSink, ReleaseId,
};
use edition_sync::config::{self, DEFAULT_BUSY_TIMEOUT_MS};
use edition_sync::{integrity, CatalogService, SqliteCatalogStore};

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(name = "edition-sync")]
#[command(about = "Maintain release editions and derived credits of a catalog database")]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite catalog database file.
    #[clap(long, value_parser = parse_path)]
    pub db: Option<PathBuf>,

    /// How long a write waits on a locked database, in milliseconds.
    #[clap(long, default_value_t = DEFAULT_BUSY_TIMEOUT_MS)]
    pub busy_timeout_ms: u64,

    /// Do not log committed catalog events.
    #[clap(long)]
    pub quiet_events: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan the catalog for broken edition invariants.
    Check,
    /// Recompute the derived credits of one release.
    Reconcile { release: i64 },
    /// Recompute the derived credits of every unarchived release.
    ReconcileAll,
    /// Recompute the edition counts of a release and its cohort.
    RefreshEditions { release: i64 },
    /// List the releases sharing an edition cohort with a release.
    SameEditions { release: i64 },
    /// Link a subject release to one or more masters.
    Link {
        subject: i64,
        #[arg(required = true)]
        masters: Vec<i64>,
        /// Discard the subject's own tracks when it is linked.
        #[clap(long)]
        force: bool,
    },
    /// Remove links from a subject release to masters.
    Unlink {
        subject: i64,
        #[arg(required = true)]
        masters: Vec<i64>,
    },
    /// Promote a subject release to master of its cohort.
    SetMaster { release: i64 },
    /// Pull master track changes into stale subject groups.
    SyncSubjects { master: i64 },
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            db_path: args.db.clone(),
            busy_timeout_ms: args.busy_timeout_ms,
            log_events: !args.quiet_events,
        }
    }
}

fn ids(raw: &[i64]) -> Vec<ReleaseId> {
    raw.iter().copied().map(ReleaseId::from).collect()
}

fn run(service: &CatalogService, command: Command) -> Result<()> {
    match command {
        Command::Check => {
            let report = service.store().read(integrity::check)?;
            if !report.is_clean() {
                for violation in &report.violations {
                    println!("{}", violation);
                }
                bail!(
                    "{} violations in {} releases",
                    report.violations.len(),
                    report.releases_checked
                );
            }
            println!("{} releases checked, no violations", report.releases_checked);
        }
        Command::Reconcile { release } => {
            let outcome = service.reconcile_release(release.into())?;
            println!(
                "release {}: removed {} normal rows, {} work rows, {} recording rows",
                release,
                outcome.normal_removed,
                outcome.from_work.writes(),
                outcome.from_recording.writes()
            );
        }
        Command::ReconcileAll => {
            let outcome = service.reconcile_all()?;
            println!("{} credit writes", outcome.writes());
        }
        Command::RefreshEditions { release } => {
            let changed = service.refresh_edition_count(release.into())?;
            println!("{} releases updated", changed.len());
        }
        Command::SameEditions { release } => {
            for edition in service.same_editions(release.into(), &DocumentStatus::UNARCHIVED)? {
                println!(
                    "{}\t{}\t{}",
                    edition.id,
                    edition.status.to_db_str(),
                    edition.title
                );
            }
        }
        Command::Link {
            subject,
            masters,
            force,
        } => {
            let groups = service.relation_to_master(subject.into(), &ids(&masters), force)?;
            println!("release {} now inherits {} track groups", subject, groups.len());
        }
        Command::Unlink { subject, masters } => {
            service.clear_relation_to_master(subject.into(), &ids(&masters))?;
            println!("release {} unlinked", subject);
        }
        Command::SetMaster { release } => {
            let cohort = service.set_as_master(release.into())?;
            println!("release {} is master of {} releases", release, cohort.len());
        }
        Command::SyncSubjects { master } => {
            let touched = service.sync_subjects(master.into())?;
            if touched.is_empty() {
                warn!("No stale subject groups under master {}", master);
            }
            println!("{} subject releases refreshed", touched.len());
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    if !app_config.db_path.exists() {
        info!("Creating new catalog database at {:?}", app_config.db_path);
    }
    let sink: Arc<dyn EventSink> = if app_config.log_events {
        Arc::new(LoggingEventSink)
    } else {
        Arc::new(NoOpEventSink)
    };
    let store = SqliteCatalogStore::open(&app_config.db_path, app_config.busy_timeout)?
        .with_event_sink(sink);

    run(&CatalogService::new(store), cli_args.command)
}
