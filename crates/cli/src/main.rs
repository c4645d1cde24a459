mod prompt;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use uploadarr_core::{
    load_config, validate_config, ComplianceManager, Config, DefaultAnswers, FileListAdapter,
    HashingTorrentBuilder, HdbAdapter, Prompt, SanitizedConfig, SubmissionContext,
    TrackerAdapter, UploadResult, Uploader,
};

use prompt::TerminalPrompt;

#[derive(Debug, Parser)]
#[command(name = "uploadarr", version)]
#[command(about = "Submit a prepared release to private trackers")]
struct Cli {
    #[command(subcommand)]
    command: Command,
    /// Configuration file
    #[arg(long, env = "UPLOADARR_CONFIG", default_value = "config.toml", global = true)]
    config: PathBuf,
    /// Tracker to use; repeat for several. Every configured tracker when absent.
    #[arg(long = "tracker", value_name = "ID", global = true)]
    trackers: Vec<String>,
    /// Build each submission form without sending it
    #[arg(long, global = true)]
    debug: bool,
    /// Answer every prompt with its default
    #[arg(long, global = true)]
    unattended: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
enum Command {
    /// Upload a release to each tracker
    Upload {
        /// Release context JSON
        context: PathBuf,
    },
    /// List releases already on each tracker
    Search {
        /// Release context JSON
        context: PathBuf,
    },
}

impl Command {
    fn context(&self) -> &Path {
        match self {
            Self::Upload { context } | Self::Search { context } => context,
        }
    }
}

impl Cli {
    fn tracker_ids(&self) -> Vec<String> {
        self.trackers.iter().map(|t| t.to_uppercase()).collect()
    }
}

async fn load_context(path: &Path) -> Result<SubmissionContext> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read release context {:?}", path))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid release context {:?}", path))
}

fn build_adapters(config: &Config, wanted: &[String]) -> Result<Vec<Box<dyn TrackerAdapter>>> {
    let enabled = |id: &str| wanted.is_empty() || wanted.iter().any(|w| w == id);
    let mut adapters: Vec<Box<dyn TrackerAdapter>> = Vec::new();

    if let Some(hdb) = &config.trackers.hdb {
        if enabled("HDB") {
            adapters.push(Box::new(
                HdbAdapter::new(hdb, config).context("Failed to set up HDB")?,
            ));
        }
    }
    if let Some(fl) = &config.trackers.filelist {
        if enabled("FL") {
            adapters.push(Box::new(
                FileListAdapter::new(fl, config).context("Failed to set up FL")?,
            ));
        }
    }

    for id in wanted {
        if !adapters.iter().any(|a| a.id() == id) {
            warn!(tracker = %id, "Tracker requested but not configured");
        }
    }
    Ok(adapters)
}

/// Log one upload outcome; `true` when the release is on the site.
fn report(tracker: &str, result: &UploadResult) -> bool {
    match result {
        UploadResult::Success {
            remote_id,
            details_url,
        } => {
            info!(tracker, remote_id, url = %details_url, "Uploaded");
            true
        }
        UploadResult::Duplicate(existing) => {
            warn!(tracker, count = existing.len(), "Skipped, release already on site");
            true
        }
        UploadResult::DryRun(form) => {
            let fields = serde_json::to_string_pretty(form).unwrap_or_default();
            info!(tracker, "Dry run, would submit:\n{}", fields);
            true
        }
        UploadResult::Rejected(e) => {
            error!(tracker, error = %e, "Upload rejected");
            if let uploadarr_core::UploadError::UnexpectedResponse { form, body, .. } = e {
                debug!(tracker, form = ?form.fields, "Rejected submission");
                debug!(tracker, "Site response:\n{}", body);
            }
            false
        }
        UploadResult::TransportError { detail, form } => {
            error!(tracker, error = %detail, "Upload request failed");
            debug!(tracker, form = ?form.fields, "Unsent submission");
            false
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Loading configuration from {:?}", cli.config
    );
    let mut config = load_config(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
    validate_config(&config).context("Configuration validation failed")?;
    config.debug |= cli.debug;
    config.unattended |= cli.unattended;
    debug!(
        config = %serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default(),
        "Configuration loaded"
    );

    let ctx = load_context(cli.command.context()).await?;
    info!(release = %ctx.name, uuid = %ctx.uuid, "Loaded release");

    let adapters = build_adapters(&config, &cli.tracker_ids())?;
    if adapters.is_empty() {
        bail!("No trackers configured");
    }

    let prompt: Arc<dyn Prompt> = if config.unattended {
        Arc::new(DefaultAnswers)
    } else {
        Arc::new(TerminalPrompt::new())
    };
    let compliance = ComplianceManager::new(Arc::new(HashingTorrentBuilder), &config.torrent);
    let uploader = Uploader::new(compliance, &config, prompt);

    let mut failures = 0;
    for adapter in &adapters {
        let tracker = adapter.id();
        match cli.command {
            Command::Search { .. } => {
                let found = uploader.search_duplicates(adapter.as_ref(), &ctx).await;
                if found.is_empty() {
                    info!(tracker, "No existing releases found");
                }
                for name in found {
                    println!("[{tracker}] {name}");
                }
            }
            Command::Upload { .. } => match uploader.upload(adapter.as_ref(), &ctx).await {
                Ok(result) => {
                    if !report(tracker, &result) {
                        failures += 1;
                    }
                }
                Err(e) => {
                    error!(tracker, error = %e, "Upload aborted");
                    failures += 1;
                }
            },
        }
    }

    if failures > 0 {
        bail!("{failures} of {} uploads failed", adapters.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(list: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("uploadarr").chain(list.iter().copied()))
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_upload_defaults() {
        let cli = parse(&["upload", "release.json"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Upload {
                context: PathBuf::from("release.json")
            }
        );
        assert!(cli.tracker_ids().is_empty());
        assert!(!cli.debug);
        assert!(!cli.unattended);
    }

    #[test]
    fn test_parse_search_with_trackers() {
        let cli = parse(&[
            "search",
            "r.json",
            "--tracker",
            "hdb",
            "--tracker",
            "FL",
            "--unattended",
        ])
        .unwrap();
        assert_eq!(cli.command.context(), Path::new("r.json"));
        assert!(matches!(cli.command, Command::Search { .. }));
        assert_eq!(cli.tracker_ids(), vec!["HDB".to_string(), "FL".to_string()]);
        assert!(cli.unattended);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["upload"]).is_err());
        assert!(parse(&["upload", "r.json", "--bogus"]).is_err());
        assert!(parse(&["upload", "r.json", "--tracker"]).is_err());
        assert!(parse(&["upload", "a.json", "b.json"]).is_err());
    }

    #[tokio::test]
    async fn test_load_context() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("release.json");
        std::fs::write(
            &path,
            r#"{"uuid": "abc", "name": "Movie 2020 1080p BluRay x264-GRP", "category": "MOVIE", "imdb_id": 1234567}"#,
        )
        .unwrap();

        let ctx = load_context(&path).await.unwrap();
        assert_eq!(ctx.uuid, "abc");
        assert_eq!(ctx.imdb(), Some(1234567));
        assert!(load_context(&temp.path().join("missing.json")).await.is_err());
    }

    #[test]
    fn test_no_trackers_configured() {
        let adapters = build_adapters(&Config::default(), &[]).unwrap();
        assert!(adapters.is_empty());
    }
}
