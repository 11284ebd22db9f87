//! `covalent-dashboard` -- terminal view of a Covalent dispatcher.
//!
//! Renders the paginated dispatch list to stdout on every state change and
//! reads line commands from stdin (`help` lists them). Logs go to stderr.
//! See [`DashboardConfig::from_env`] for the environment variables.

use std::sync::Arc;
use std::time::Duration;

use covalent_client::reconnect::ReconnectConfig;
use covalent_client::socket::SocketClient;
use covalent_client::{
    CovalentApi, DashboardApi, FixtureApi, LiveChannel, NoopChannel, NotificationChannel,
};
use covalent_core::logs::LogQuery;
use covalent_dashboard::commands::{parse_command, UserCommand, HELP};
use covalent_dashboard::config::{DashboardConfig, LogFormat};
use covalent_dashboard::view::{render, ListView};
use covalent_store::{ListState, StoreDriver, StoreHandle, SystemClock};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "covalent_dashboard=info,covalent_store=info,covalent_client=info";

/// File written by `download-logs`, in the working directory.
const LOG_DOWNLOAD_PATH: &str = "covalent_ui.log";

/// Clear screen and move the cursor home.
const CLEAR: &str = "\x1b[2J\x1b[H";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = DashboardConfig::from_env()?;
    init_tracing(config.log_format);

    tracing::info!(
        api_url = %config.api_url,
        socket_url = %config.socket_url,
        demo_mode = config.demo_mode,
        page_size = config.tuning.page_size,
        "Starting covalent-dashboard",
    );

    let (api, channel, live): (Arc<dyn DashboardApi>, Arc<dyn NotificationChannel>, _) =
        if config.demo_mode {
            (
                Arc::new(FixtureApi::bundled()?),
                Arc::new(NoopChannel::new()),
                None,
            )
        } else {
            let api = CovalentApi::with_timeout(
                config.api_url.clone(),
                Duration::from_secs(config.request_timeout_secs),
            )?;
            let live = Arc::new(LiveChannel::start(
                SocketClient::new(config.socket_url.clone()),
                ReconnectConfig::default(),
            ));
            (Arc::new(api), Arc::clone(&live) as Arc<dyn NotificationChannel>, Some(live))
        };

    let handle = StoreDriver::new(
        Arc::clone(&api),
        channel,
        Arc::new(SystemClock),
        config.tuning.clone(),
    )
    .spawn();

    let result = run_console(&handle, api.as_ref()).await;

    handle.shutdown().await;
    if let Some(live) = live {
        live.shutdown().await;
    }
    tracing::info!("covalent-dashboard stopped");
    result
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

/// Render on every state change and execute commands until `quit`, EOF or
/// Ctrl-C.
async fn run_console(handle: &StoreHandle, api: &dyn DashboardApi) -> anyhow::Result<()> {
    let mut view = ListView::new();
    let mut states = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut state = states.borrow_and_update().clone();
    draw(&view, &state);

    loop {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    tracing::warn!("List store stopped unexpectedly");
                    return Ok(());
                }
                state = states.borrow_and_update().clone();
                draw(&view, &state);
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(());
                };
                let command = match parse_command(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(e) => {
                        println!("{e}");
                        continue;
                    }
                };
                match command {
                    UserCommand::Quit => return Ok(()),
                    UserCommand::Store(intent) => handle.send(intent).await?,
                    UserCommand::Delete => {
                        if !view.request_delete(&state) {
                            println!("Nothing selected.");
                            continue;
                        }
                        draw(&view, &state);
                    }
                    UserCommand::DeleteAll => {
                        view.request_delete_all(&state);
                        draw(&view, &state);
                    }
                    UserCommand::Confirm => {
                        if let Some(intent) = view.confirm() {
                            handle.send(intent).await?;
                        }
                        draw(&view, &state);
                    }
                    UserCommand::Cancel => {
                        view.cancel();
                        draw(&view, &state);
                    }
                    UserCommand::Logs { search } => show_logs(api, search).await,
                    UserCommand::DownloadLogs => download_logs(api).await,
                    UserCommand::Settings => show_settings(api).await,
                    UserCommand::Help => println!("{HELP}"),
                }
            }
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}

fn draw(view: &ListView, state: &ListState) {
    print!("{CLEAR}{}", render(&view.model(state)));
}

// ---------------------------------------------------------------------------
// Console-only commands (not part of the list store)
// ---------------------------------------------------------------------------

async fn show_logs(api: &dyn DashboardApi, search: String) {
    let query = LogQuery {
        search,
        ..Default::default()
    };
    match api.list_logs(&query).await {
        Ok(page) => {
            println!("{} log lines", page.total_count);
            for entry in page.items {
                let date = entry
                    .log_date
                    .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default();
                println!("{date} {:<8} {}", entry.status, entry.message);
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load logs");
            println!("Failed to load logs: {e}");
        }
    }
}

async fn download_logs(api: &dyn DashboardApi) {
    let content = match api.download_logs().await {
        Ok(content) => content,
        Err(e) => {
            tracing::error!(error = %e, "Failed to download logs");
            println!("Failed to download logs: {e}");
            return;
        }
    };
    match tokio::fs::write(LOG_DOWNLOAD_PATH, content.as_bytes()).await {
        Ok(()) => println!("Saved {} bytes to {LOG_DOWNLOAD_PATH}", content.len()),
        Err(e) => {
            tracing::error!(error = %e, path = LOG_DOWNLOAD_PATH, "Failed to write log file");
            println!("Failed to write {LOG_DOWNLOAD_PATH}: {e}");
        }
    }
}

async fn show_settings(api: &dyn DashboardApi) {
    match api.settings().await {
        Ok(settings) => match serde_json::to_string_pretty(&settings) {
            Ok(json) => println!("{json}"),
            Err(e) => println!("Failed to format settings: {e}"),
        },
        Err(e) => {
            tracing::error!(error = %e, "Failed to load settings");
            println!("Failed to load settings: {e}");
        }
    }
}
