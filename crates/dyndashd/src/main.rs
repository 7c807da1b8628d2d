// # dyndashd - dashboard daemon
//
// This is a thin integration layer: it reads the configuration file,
// initializes logging, builds the provider/resolver/store components and
// runs the reconciler next to the HTTP server. All update logic lives in
// dyndash-core.
//
// ## Configuration
//
// Settings come from a JSON file (see dyndash_core::AppConfig); the
// command line only points at files and optionally overrides the listen
// address:
//
// ```bash
// dyndashd --config /etc/dyndash/config.json \
//          --bindings /var/lib/dyndash/ddns_bindings.json \
//          --listen 0.0.0.0:11151
// ```

use anyhow::{Context, Result};
use clap::Parser;
use dyndash_core::config::LOG_FILE_PREFIX;
use dyndash_core::{AppConfig, FileBindingStore, Reconciler, ReconcilerEvent, SharedProvider};
use dyndash_ip::SystemIpResolver;
use dyndash_provider_alidns::AlidnsClient;
use dyndash_web::AppState;
use dyndash_web::auth::SessionStore;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Dynamic DNS dashboard daemon", rename_all = "kebab-case")]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(long, value_name = "PATH", default_value = "config.json")]
    config: PathBuf,

    /// Path to the DDNS binding store file
    #[arg(long, value_name = "PATH", default_value = "ddns_bindings.json")]
    bindings: PathBuf,

    /// Override the configured listen address
    #[arg(long, value_name = "ADDR")]
    listen: Option<SocketAddr>,

    /// Override the configured log directory
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,
}

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DaemonExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<DaemonExitCode> for ExitCode {
    fn from(code: DaemonExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            return DaemonExitCode::RuntimeError.into();
        }
    };

    let config = match rt.block_on(AppConfig::load(&cli.config)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {}", e);
            return DaemonExitCode::ConfigError.into();
        }
    };

    let log_dir = cli
        .log_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.log_dir));

    // The guard must outlive the runtime so buffered log lines reach disk
    let _log_guard = match init_tracing(&log_dir) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to initialize logging: {}", e);
            return DaemonExitCode::ConfigError.into();
        }
    };

    info!("starting dyndashd");
    info!(
        "config {}, bindings {}, checking every {}s",
        cli.config.display(),
        cli.bindings.display(),
        config.check_interval
    );

    match rt.block_on(run_daemon(cli, config, log_dir)) {
        Ok(()) => {
            info!("clean shutdown");
            DaemonExitCode::CleanShutdown.into()
        }
        Err(e) => {
            error!("daemon error: {:#}", e);
            DaemonExitCode::RuntimeError.into()
        }
    }
}

/// Console + daily-rotating file output, 7 files retained
fn init_tracing(log_dir: &Path) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::RollingFileAppender::builder()
        .rotation(tracing_appender::rolling::Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .max_log_files(7)
        .build(log_dir)
        .context("failed to create rolling log appender")?;
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    Ok(guard)
}

async fn run_daemon(cli: Cli, config: AppConfig, log_dir: PathBuf) -> Result<()> {
    let listen_addr: SocketAddr = match cli.listen {
        Some(addr) => addr,
        None => config
            .listen_addr
            .parse()
            .with_context(|| format!("invalid listen address {}", config.listen_addr))?,
    };

    // Provider handle stays unconfigured until credentials exist; the
    // settings page can supply them later without a restart.
    let provider = SharedProvider::unconfigured();
    match config.credentials() {
        Some((id, secret)) => {
            provider.replace(Some(Arc::new(AlidnsClient::new(id, secret)?)));
            info!("alidns provider configured");
        }
        None => {
            warn!("provider credentials not configured; set them in the dashboard settings");
        }
    }

    let resolver = Arc::new(SystemIpResolver::new(config.probe_urls.clone()));
    let bindings = Arc::new(FileBindingStore::new(&cli.bindings).await?);

    let (reconciler, events) = Reconciler::new(
        provider.clone(),
        resolver.clone(),
        bindings.clone(),
        Duration::from_secs(config.check_interval),
    );
    let reconciler = Arc::new(reconciler);

    tokio::spawn(log_events(events));

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let reconciler_task = {
        let reconciler = reconciler.clone();
        tokio::spawn(async move { reconciler.run_with_shutdown(Some(shutdown_rx)).await })
    };

    let state: dyndash_web::SharedState = Arc::new(AppState {
        config: tokio::sync::RwLock::new(config),
        config_path: cli.config.clone(),
        provider,
        resolver,
        bindings,
        reconciler: reconciler.clone(),
        sessions: SessionStore::new(),
        log_dir,
    });

    let app = dyndash_web::create_router(state);

    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind to {}", listen_addr))?;
    info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server exited with error")?;

    // Stop the reconciler and wait for its final store flush
    let _ = shutdown_tx.send(());
    match reconciler_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("reconciler stopped with error: {}", e),
        Err(e) => warn!("reconciler task failed: {}", e),
    }

    Ok(())
}

/// Drain reconciler events into the log at sensible levels.
///
/// The per-binding outcomes are already logged where they happen; this
/// keeps the channel drained and gives each pass a one-line summary.
async fn log_events(mut events: tokio::sync::mpsc::Receiver<ReconcilerEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            ReconcilerEvent::TickStarted { bindings } => {
                debug!("reconciliation pass over {} binding(s)", bindings);
            }
            ReconcilerEvent::TickFinished { summary } => {
                if summary.updated > 0 || summary.failed > 0 {
                    info!(
                        "pass finished: {} updated, {} unchanged, {} failed",
                        summary.updated, summary.unchanged, summary.failed
                    );
                } else {
                    debug!("pass finished: all {} binding(s) unchanged", summary.unchanged);
                }
            }
            ReconcilerEvent::UpdateSucceeded { fqdn, new_ip, .. } => {
                debug!("event: {} -> {}", fqdn, new_ip);
            }
            ReconcilerEvent::UpdateSkipped { .. } => {}
            ReconcilerEvent::UpdateFailed { fqdn, error, .. } => {
                debug!("event: update of {} failed: {}", fqdn, error);
            }
            ReconcilerEvent::ResolveFailed { interface, .. } => {
                debug!("event: no IP via {}", interface);
            }
        }
    }
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

    tokio::select! {
        _ = sigterm.recv() => info!("SIGTERM received"),
        _ = tokio::signal::ctrl_c() => info!("SIGINT received"),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to wait for CTRL-C: {}", e);
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
