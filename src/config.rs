use log::Level;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub video: VideoConfig,
    pub ffmpeg: FfmpegConfig,
    pub logging: LoggingConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Recognized extensions, lowercase and without the leading dot.
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FfmpegConfig {
    pub binary: String,
    /// Concat list path, relative paths resolve against the working directory.
    pub manifest: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: String,
    pub max_lines: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct UiConfig {
    pub window_width: f32,
    pub window_height: f32,
}

/// A message from config loading, logged once the logger is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
}

impl Diagnostic {
    fn new(level: Level, message: String) -> Self {
        Self { level, message }
    }
}

pub fn report(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        log::log!(diagnostic.level, "{}", diagnostic.message);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            video: VideoConfig::default(),
            ffmpeg: FfmpegConfig::default(),
            logging: LoggingConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            extensions: ["mp4", "avi", "mkv", "mov"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            binary: "ffmpeg".to_string(),
            manifest: "input_list.txt".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: "video_concatenator.log".to_string(),
            max_lines: 10000,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_width: 1000.0,
            window_height: 800.0,
        }
    }
}

impl Config {
    /// `config.toml` next to the executable, if the executable path is known.
    pub fn default_path() -> Option<PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(CONFIG_FILE_NAME)))
    }

    /// Loads the config at `path`, falling back to defaults when the file is
    /// missing or unusable. The logger is not installed yet when this runs, so
    /// what happened is returned for [`report`] instead of logged here.
    pub fn load(path: Option<&Path>) -> (Self, Vec<Diagnostic>) {
        let Some(path) = path else {
            return (
                Self::default(),
                vec![Diagnostic::new(
                    Level::Warn,
                    "Executable directory unknown, using default config".to_string(),
                )],
            );
        };

        let mut diagnostics = vec![Diagnostic::new(
            Level::Info,
            format!("Loading config from {}", path.display()),
        )];
        let config = match fs::read_to_string(path) {
            Ok(config_str) => match toml::from_str::<Config>(&config_str) {
                Ok(config) => {
                    diagnostics.push(Diagnostic::new(
                        Level::Info,
                        "Config loaded successfully".to_string(),
                    ));
                    config.normalized()
                }
                Err(e) => {
                    diagnostics.push(Diagnostic::new(
                        Level::Error,
                        format!("Failed to parse config: {}, using defaults", e),
                    ));
                    Self::default()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                diagnostics.push(Diagnostic::new(
                    Level::Warn,
                    "Config file not found, using defaults".to_string(),
                ));
                Self::default()
            }
            Err(e) => {
                diagnostics.push(Diagnostic::new(
                    Level::Error,
                    format!("Failed to read config {}: {}, using defaults", path.display(), e),
                ));
                Self::default()
            }
        };
        (config, diagnostics)
    }

    fn normalized(mut self) -> Self {
        for ext in &mut self.video.extensions {
            *ext = ext.trim_start_matches('.').to_ascii_lowercase();
        }
        self
    }
}
