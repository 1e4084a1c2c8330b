//! Infradeck - Entry Point
//!
//! Serves the dashboard's REST API and realtime execution hub.

use std::collections::HashMap;
use std::env;

use anyhow::Context;
use infradeck::app::options::AppOptions;
use infradeck::app::run::run;
use infradeck::filesys::file::File;
use infradeck::logs::{init_logging, LogLevel, LogOptions};
use infradeck::storage::layout::StorageLayout;
use infradeck::storage::settings::Settings;
use infradeck::utils::version_info;

use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    let version = version_info();
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version) {
            Ok(text) => println!("{}", text),
            Err(e) => println!("{}: {}", version.version, e),
        }
        return;
    }

    let settings = match load_settings(&cli_args).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to load settings: {:#}", e);
            return;
        }
    };

    // Initialize logging
    let layout = StorageLayout::new(settings.workspace.base_dir.clone());
    let log_options = LogOptions {
        log_level: settings.log_level,
        to_file: settings.log_to_file,
        log_dir: layout.logs_dir().path().to_path_buf(),
        json_format: settings.json_logs,
        ..Default::default()
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            println!("Failed to initialize logging: {e}");
            None
        }
    };

    // Run the server
    let options = AppOptions::from_settings(&settings);
    info!(
        "Running infradeck {} ({}) with options: {:?}",
        version.version, version.git_hash, options
    );
    if let Err(e) = run(options, await_shutdown_signal()).await {
        error!("Failed to run infradeck: {e}");
    }
}

/// Settings file (`--config=<path>`, default `<data dir>/settings.json`)
/// with `--host`, `--port` and `--log-level` overrides applied.
async fn load_settings(cli_args: &HashMap<String, String>) -> anyhow::Result<Settings> {
    let file = match cli_args.get("config") {
        Some(path) => File::new(path),
        None => StorageLayout::default().settings_file(),
    };
    let mut settings = Settings::load(&file)
        .await
        .with_context(|| format!("reading {}", file.path().display()))?;

    if let Some(host) = cli_args.get("host") {
        settings.server.host = host.clone();
    }
    if let Some(port) = cli_args.get("port") {
        settings.server.port = port
            .parse()
            .with_context(|| format!("invalid --port value {:?}", port))?;
    }
    if let Some(level) = cli_args.get("log-level") {
        settings.log_level = level
            .parse::<LogLevel>()
            .map_err(|e| anyhow::anyhow!("invalid --log-level value {:?}: {}", level, e))?;
    }
    Ok(settings)
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
                _ => {
                    error!("Failed to install signal handlers, falling back to Ctrl+C");
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Ctrl+C received, shutting down...");
    }
}
