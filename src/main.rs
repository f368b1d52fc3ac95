use epic_viewer::api::ApiClient;
use epic_viewer::app::EpicApp;
use epic_viewer::cli::Args;
use epic_viewer::config::{self, Settings};
use epic_viewer::core::generation::Generation;
use epic_viewer::core::session::Session;
use epic_viewer::core::workers::Workers;
use epic_viewer::server::{Catalog, EpicServer, ServerOptions};

use anyhow::{Context, anyhow};
use clap::Parser;
use eframe::egui;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

/// Demo catalog: one week, 12 frames per day
const DEMO_DAYS: usize = 7;
const DEMO_FRAMES: usize = 12;
const DEMO_FIRST_DATE: &str = "2015-06-13";

fn main() -> anyhow::Result<()> {
    // Parse command-line arguments first (needed for log setup)
    let args = Args::parse();

    // Create path configuration from CLI args and environment
    let path_config = config::PathConfig::from_env_and_cli(args.config_dir.clone());

    if let Err(e) = config::ensure_dirs(&path_config) {
        eprintln!("Warning: Failed to create application directories: {}", e);
    }

    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    // Initialize logger based on --log flag
    if let Some(log_path_opt) = &args.log_file {
        let log_path = log_path_opt
            .as_ref()
            .cloned()
            .unwrap_or_else(|| config::data_file(config::LOG_FILE, &path_config));

        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .filter_module("egui", log::LevelFilter::Info) // Suppress egui DEBUG spam
            .filter_module("eframe", log::LevelFilter::Info)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        // Console logging (respects RUST_LOG if set)
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .filter_module("egui", log::LevelFilter::Info)
            .filter_module("eframe", log::LevelFilter::Info)
            .format_timestamp_millis()
            .init();
    }

    info!("EPIC Earth Viewer starting...");
    debug!("Command-line args: {:?}", args);

    let persistence_path = config::config_file(config::CONFIG_FILE, &path_config);
    info!("Config path: {}", persistence_path.display());

    // Embedded backend with synthetic imagery
    let demo_server = if args.demo {
        let options = ServerOptions {
            image_latency: Duration::from_millis(150),
            ..ServerOptions::default()
        };
        let server = EpicServer::start_with("127.0.0.1:0", Catalog::demo(DEMO_DAYS, DEMO_FRAMES), options)?;
        info!("Demo mode: serving {} days from {}", DEMO_DAYS, server.base_url());
        Some(server)
    } else {
        None
    };

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(format!("EPIC Earth Viewer v{} • Space play/pause • F2 monitor", env!("CARGO_PKG_VERSION")))
            .with_inner_size([1280.0, 900.0])
            .with_resizable(true),
        persist_window: true,
        persistence_path: Some(persistence_path),
        ..Default::default()
    };

    eframe::run_native(
        "EPIC Earth Viewer",
        native_options,
        Box::new(move |cc| {
            // Load persisted settings if available, otherwise defaults
            let settings: Settings = cc
                .storage
                .and_then(|storage| storage.get_string(eframe::APP_KEY))
                .and_then(|json| match Settings::from_json(&json) {
                    Ok(settings) => Some(settings),
                    Err(e) => {
                        warn!("Ignoring persisted settings: {:#}", e);
                        None
                    }
                })
                .unwrap_or_else(|| {
                    info!("No persisted settings found, using defaults");
                    Settings::default()
                });

            // CLI overrides apply to this run only
            let mut run = settings.clone();
            run.apply_args(&args);
            if let Some(server) = &demo_server {
                run.api_base_url = server.base_url();
                if args.date.is_none() {
                    run.default_date = DEMO_FIRST_DATE.to_string();
                }
            }

            let num_workers = run.worker_count();
            info!("Using {} worker threads, backend {}", num_workers, run.api_base_url);
            let workers = Arc::new(Workers::new(num_workers, Generation::new()));
            let client = Arc::new(ApiClient::new(&run.api_base_url, run.request_timeout()));

            let mut session = Session::new(run.session_config(), client.clone(), client, workers);
            if let Err(e) = session.start() {
                warn!("Startup date rejected: {}", e);
            }

            Ok(Box::new(EpicApp::new(settings, session, &run.api_base_url, demo_server)))
        }),
    )
    .map_err(|e| anyhow!("Failed to run application: {}", e))
}
