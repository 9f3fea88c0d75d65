pub mod app;
pub mod concat;
pub mod config;
pub mod file_scanner;
pub mod logging;
pub mod session;

pub use app::{ConcatApp, Dialogs, NativeDialogs};
pub use config::{Config, FfmpegConfig, LoggingConfig, UiConfig, VideoConfig};
