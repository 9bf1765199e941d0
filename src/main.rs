use slipstream::app::NarrativeApp;
use slipstream::cli::Args;
use slipstream::config;
use slipstream::config::AppSettings;

use clap::Parser;
use eframe::egui;
use log::{debug, info};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

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
            .unwrap_or_else(|| config::data_file("slipstream.log"));

        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(&log_path)?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .filter_module("egui", log::LevelFilter::Info) // Suppress egui DEBUG spam
            .filter_module("eframe", log::LevelFilter::Info)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        // Console logging; respects RUST_LOG if set
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

    info!("Slipstream starting...");
    debug!("Command-line args: {:?}", args);
    info!("Config path: {}", config::config_file("slipstream.json").display());

    let settings = AppSettings::load_or_default();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(format!("Slipstream v{}", env!("CARGO_PKG_VERSION")))
            .with_inner_size([1280.0, 800.0])
            .with_resizable(true),
        persist_window: true,
        #[cfg(not(target_arch = "wasm32"))]
        persistence_path: Some(config::config_file("slipstream_window.json")),
        ..Default::default()
    };

    eframe::run_native(
        "Slipstream",
        native_options,
        Box::new(move |_cc| Ok(Box::new(NarrativeApp::new(settings, &args)))),
    )
    .map_err(|e| anyhow::anyhow!("eframe failed: {e}"))?;

    info!("Application exiting");
    Ok(())
}
