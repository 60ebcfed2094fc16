//! Harvest command implementation

use crate::collector::{CollectionOrchestrator, CollectorConfig, RunSummary};
use crate::fetcher::slack_http::SlackHttpClient;
use crate::fetcher::ConversationSource;
use crate::report::{aggregate, write_custom_emoji, write_report};
use crate::resume::{ChannelListDocument, ErrorLedger, JsonFileStore, RunLock, StoragePaths};
use clap::Parser;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use super::CliError;

/// Environment variable holding the Slack token
pub const TOKEN_ENV: &str = "SLACK_API_TOKEN";

/// Slack reaction harvester CLI
#[derive(Parser, Debug)]
#[command(name = "reaction-harvester")]
#[command(about = "Collect emoji reactions from every public Slack channel", long_about = None)]
#[command(version)]
pub struct Cli {
    /// List public channels again instead of using the saved list
    #[arg(long)]
    pub get_public_channels: bool,

    /// Aggregate collected reactions into the report and exit
    #[arg(short = 't', long)]
    pub totalize: bool,

    /// Retry channels recorded in the error ledger
    #[arg(long)]
    pub try_errors: bool,

    /// Export the workspace's custom emoji and exit
    #[arg(short = 'e', long)]
    pub emoji: bool,

    /// Page size for API requests (values below 1 use 200, values above 1000 use 1000)
    #[arg(short = 'l', long, default_value_t = 200, allow_negative_numbers = true)]
    pub limit: i64,

    /// Directory for the channel list, error ledger and run lock
    #[arg(long, default_value = crate::resume::DEFAULT_STATE_DIR)]
    pub state_dir: PathBuf,

    /// Directory for per-channel reaction documents
    #[arg(long, default_value = crate::resume::DEFAULT_CHATS_DIR)]
    pub chats_dir: PathBuf,

    /// Output path of the aggregate report
    #[arg(long, default_value = "result.csv")]
    pub report: PathBuf,

    /// Output path of the custom emoji export
    #[arg(long, default_value = "emoji-custom.csv")]
    pub emoji_output: PathBuf,

    /// Seconds to wait between API calls and at every cooldown
    #[arg(long, default_value_t = 5)]
    pub page_delay_secs: u64,

    /// Serve Prometheus metrics on this address
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,

    /// Slack API token
    #[arg(long, env = TOKEN_ENV, hide_env_values = true)]
    pub token: Option<String>,
}

impl Cli {
    /// Storage locations selected on the command line
    pub fn storage_paths(&self) -> StoragePaths {
        StoragePaths::new(&self.state_dir, &self.chats_dir)
    }

    /// Collection settings selected on the command line
    pub fn collector_config(&self) -> CollectorConfig {
        CollectorConfig::default()
            .with_page_limit(self.limit)
            .with_delay(Duration::from_secs(self.page_delay_secs))
    }

    /// Run the selected actions
    ///
    /// `--totalize` and `--emoji` run (in that order) instead of collection.
    pub async fn execute(&self) -> Result<(), CliError> {
        let paths = self.storage_paths();
        paths.ensure_dirs()?;

        if self.totalize {
            totalize(&paths, &self.report)?;
        }
        if self.emoji {
            export_custom_emoji(&self.client()?, &self.emoji_output).await?;
        }
        if self.totalize || self.emoji {
            return Ok(());
        }

        let summary = self.harvest(&paths).await?;
        if summary.failed > 0 {
            warn!(
                failed = summary.failed,
                "Some channels failed; rerun with --try-errors to retry them"
            );
        }
        Ok(())
    }

    fn client(&self) -> Result<SlackHttpClient, CliError> {
        let token = self
            .token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| {
                CliError::ConfigurationError(format!(
                    "Slack token missing: set {TOKEN_ENV} (or .env) or pass --token"
                ))
            })?;
        Ok(SlackHttpClient::new(token)?)
    }

    async fn harvest(&self, paths: &StoragePaths) -> Result<RunSummary, CliError> {
        let client = self.client()?;

        let mut run_lock = RunLock::open(paths.run_lock_path())?;
        let _guard = run_lock.try_exclusive()?;

        let config = self.collector_config();
        info!(
            limit = config.page_limit.get(),
            page_delay_secs = config.page_delay.as_secs(),
            state_dir = %paths.state_dir().display(),
            chats_dir = %paths.chats_dir().display(),
            "Starting harvest"
        );

        let mut orchestrator = CollectionOrchestrator::new(
            client,
            JsonFileStore::new(paths.chats_dir()),
            ErrorLedger::open(paths.error_ledger_path())?,
            ChannelListDocument::new(paths.channel_list_path()),
            config,
        );

        let channels = orchestrator
            .load_or_list_channels(self.get_public_channels)
            .await?;
        let summary = orchestrator
            .collect_reactions(&channels, self.try_errors)
            .await?;
        Ok(summary)
    }
}

/// Aggregate every stored channel into the report at `report_path`
///
/// # Returns
/// Number of report rows
pub fn totalize(paths: &StoragePaths, report_path: &Path) -> Result<usize, CliError> {
    let store = JsonFileStore::new(paths.chats_dir());
    let total = aggregate(&store)?;
    Ok(write_report(report_path, &total)?)
}

/// Export the workspace's custom emoji to `path`
///
/// # Returns
/// Number of exported emoji
pub async fn export_custom_emoji<C: ConversationSource>(
    source: &C,
    path: &Path,
) -> Result<usize, CliError> {
    let emoji = source.list_custom_emoji().await?;
    Ok(write_custom_emoji(path, &emoji)?)
}
