use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use rolecall_config::ConfigStore;
use rolecall_core::{AllowListService, CommandRouter};
use rolecall_telemetry::{DEFAULT_LOG_LEVEL, GlobalContextGuard, LogFormat, LoggingConfig};
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::console::{self, ConsoleDirectory, RoleSpec, parse_role_spec};
use crate::error::{AppError, AppResult};

const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Command-line and environment settings for the console gateway.
#[derive(Debug, Parser)]
#[command(name = "rolecall", version, about = "Self-assignable role manager")]
pub(crate) struct AppArgs {
    /// Path of the JSON configuration document.
    #[arg(long, env = "ROLECALL_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, env = "ROLECALL_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,
    /// Log output format; defaults to pretty in debug builds and JSON otherwise.
    #[arg(long, env = "ROLECALL_LOG_FORMAT", value_enum)]
    log_format: Option<LogFormatArg>,
    /// Platform role offered to the console, as `community:name`.
    #[arg(
        long = "role",
        env = "ROLECALL_ROLES",
        value_delimiter = ',',
        value_parser = parse_role_spec
    )]
    roles: Vec<RoleSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormatArg {
    Json,
    Pretty,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Json => Self::Json,
            LogFormatArg::Pretty => Self::Pretty,
        }
    }
}

impl AppArgs {
    fn logging(&self) -> LoggingConfig<'_> {
        LoggingConfig {
            level: &self.log_level,
            format: self.log_format.map_or_else(LogFormat::infer, LogFormat::from),
            build_sha: option_env!("ROLECALL_BUILD_SHA").unwrap_or("dev"),
        }
    }
}

/// Dependencies required to serve the console gateway.
pub(crate) struct BootstrapDependencies {
    store: Arc<ConfigStore>,
    directory: Arc<ConsoleDirectory>,
}

impl BootstrapDependencies {
    /// Open the configuration store and build the console role directory.
    ///
    /// A store that cannot be opened is fatal; the gateway never starts
    /// without a committed document.
    pub(crate) async fn from_args(args: &AppArgs) -> AppResult<Self> {
        let store = ConfigStore::open(&args.config)
            .await
            .map_err(|err| AppError::config("config_store.open", err))?;
        let directory = ConsoleDirectory::new(&args.roles);

        Ok(Self {
            store: Arc::new(store),
            directory: Arc::new(directory),
        })
    }
}

/// Entry point for the rolecall boot sequence.
///
/// # Errors
///
/// Returns an error if logging cannot be installed, the configuration document
/// cannot be opened, or the gateway's input or output fails.
pub async fn run_app() -> AppResult<()> {
    let args = AppArgs::parse();
    rolecall_telemetry::init_logging(&args.logging())
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;
    let _context = GlobalContextGuard::new("console");

    info!(config = %args.config.display(), "rolecall bootstrap starting");

    let dependencies = match BootstrapDependencies::from_args(&args).await {
        Ok(dependencies) => dependencies,
        Err(err) => {
            error!(error = %err, config = %args.config.display(), "configuration store unavailable");
            return Err(err);
        }
    };

    let reloads = reload_signals()?;
    Box::pin(run_app_with(
        dependencies,
        reloads,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    ))
    .await
}

/// Forward `SIGHUP` to the gateway as configuration reload requests.
///
/// Requests arriving while one is still pending collapse into it.
fn reload_signals() -> AppResult<mpsc::Receiver<()>> {
    let (sender, receiver) = mpsc::channel(1);
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        use tokio::sync::mpsc::error::TrySendError;

        let mut hangup = signal(SignalKind::hangup())
            .map_err(|source| AppError::io("signal.hangup", source))?;
        tokio::spawn(async move {
            while hangup.recv().await.is_some() {
                info!("reload requested");
                if let Err(TrySendError::Closed(())) = sender.try_send(()) {
                    break;
                }
            }
        });
    }
    #[cfg(not(unix))]
    drop(sender);
    Ok(receiver)
}

/// Boot sequence that relies entirely on injected dependencies to simplify testing.
pub(crate) async fn run_app_with<R, W>(
    dependencies: BootstrapDependencies,
    reloads: mpsc::Receiver<()>,
    input: R,
    output: W,
) -> AppResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let BootstrapDependencies { store, directory } = dependencies;
    info!(
        roles = directory.role_count(),
        path = %store.path().display(),
        "console gateway ready"
    );

    let router = CommandRouter::new(AllowListService::new(Arc::clone(&store), directory));
    console::serve(&router, &store, reloads, input, output).await?;

    info!("rolecall shutdown complete");
    Ok(())
}
