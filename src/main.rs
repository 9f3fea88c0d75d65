use clap::Parser;
use eframe::egui;
use log::info;
use std::path::PathBuf;

use video_concatenator::app::APP_TITLE;
use video_concatenator::config;
use video_concatenator::logging::setup_logging;
use video_concatenator::{Config, ConcatApp};

#[derive(Parser)]
#[command(version, about = "Pick, order and join video files with ffmpeg")]
struct Cli {
    /// Config file to use instead of config.toml next to the executable
    #[arg(long)]
    config_file: Option<PathBuf>,
    /// Directory to load on start-up
    #[arg(long)]
    directory: Option<PathBuf>,
}

fn main() -> eframe::Result<()> {
    let args = Cli::parse();

    let config_path = args.config_file.or_else(Config::default_path);
    let (config, diagnostics) = Config::load(config_path.as_deref());

    if let Err(e) = setup_logging(&config.logging) {
        eprintln!("Logging unavailable: {:#}", e);
    }

    info!("Starting {}", APP_TITLE);
    config::report(&diagnostics);

    let viewport = egui::ViewportBuilder::default()
        .with_title(APP_TITLE)
        .with_inner_size([config.ui.window_width, config.ui.window_height])
        .with_resizable(true);

    let options = eframe::NativeOptions {
        viewport,
        centered: true,
        ..Default::default()
    };

    let directory = args.directory;
    eframe::run_native(
        APP_TITLE,
        options,
        Box::new(move |_cc| {
            let mut app = ConcatApp::with_native(config);
            if let Some(dir) = directory {
                app.load_directory(&dir);
            }
            Ok(Box::new(app))
        }),
    )
}
