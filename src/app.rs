use eframe::egui;
use log::{error, info, warn};
use std::mem;
use std::path::{Path, PathBuf};

use crate::concat::{self, ConcatTool, Ffmpeg, MIN_INPUTS, OUTPUT_FILTERS};
use crate::config::Config;
use crate::session::Session;

pub const APP_TITLE: &str = "Video Concatenator";

const SELECT_AT_LEAST_TWO: &str = "Please select at least two videos to concatenate.";
const SUCCESS_MESSAGE: &str = "Videos have been concatenated successfully.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Native pickers and message boxes. `None` from a picker means the user
/// cancelled.
pub trait Dialogs {
    fn pick_folder(&self) -> Option<PathBuf>;
    fn save_output(&self, start_dir: Option<&Path>) -> Option<PathBuf>;
    fn message(&self, severity: Severity, title: &str, body: &str);
}

pub struct NativeDialogs;

impl Dialogs for NativeDialogs {
    fn pick_folder(&self) -> Option<PathBuf> {
        rfd::FileDialog::new().pick_folder()
    }

    fn save_output(&self, start_dir: Option<&Path>) -> Option<PathBuf> {
        let mut dialog = rfd::FileDialog::new()
            .set_title("Save concatenated video")
            .set_file_name(format!("output.{}", concat::DEFAULT_OUTPUT_EXTENSION));
        for (label, ext) in OUTPUT_FILTERS {
            dialog = dialog.add_filter(label, &[ext]);
        }
        if let Some(dir) = start_dir {
            dialog = dialog.set_directory(dir);
        }
        dialog.save_file()
    }

    fn message(&self, severity: Severity, title: &str, body: &str) {
        let level = match severity {
            Severity::Info => rfd::MessageLevel::Info,
            Severity::Warning => rfd::MessageLevel::Warning,
            Severity::Error => rfd::MessageLevel::Error,
        };
        rfd::MessageDialog::new()
            .set_level(level)
            .set_title(title)
            .set_description(body)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }
}

#[derive(Debug, PartialEq)]
enum State {
    Idle,
    /// Concatenation confirmed; runs once the status line has been painted.
    Busy { output: PathBuf, frames_drawn: u8 },
}

pub struct ConcatApp {
    config: Config,
    session: Session,
    status: String,
    state: State,
    dialogs: Box<dyn Dialogs>,
    tool: Box<dyn ConcatTool>,
}

impl ConcatApp {
    pub fn new(config: Config, dialogs: Box<dyn Dialogs>, tool: Box<dyn ConcatTool>) -> Self {
        Self {
            config,
            session: Session::new(),
            status: "Ready".to_string(),
            state: State::Idle,
            dialogs,
            tool,
        }
    }

    pub fn with_native(config: Config) -> Self {
        let tool = Ffmpeg::new(config.ffmpeg.binary.clone());
        Self::new(config, Box::new(NativeDialogs), Box::new(tool))
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state, State::Busy { .. })
    }

    pub fn select_directory(&mut self) {
        match self.dialogs.pick_folder() {
            Some(dir) => self.load_directory(&dir),
            None => info!("Directory selection cancelled"),
        }
    }

    pub fn load_directory(&mut self, dir: &Path) {
        info!("Loading video files from {}", dir.display());
        match self
            .session
            .load_directory(dir, &self.config.video.extensions)
        {
            Ok(count) => {
                info!("Scanned {} video files", count);
                self.status = format!("Loaded {} videos from {}", count, dir.display());
            }
            Err(e) => {
                error!("Failed to scan video files: {:#}", e);
                self.status = format!("Error: {:#}", e);
            }
        }
    }

    pub fn move_up(&mut self) {
        if self.session.move_up() {
            info!("Moved selection up: {:?}", self.session.selected_indices());
        }
    }

    pub fn move_down(&mut self) {
        if self.session.move_down() {
            info!("Moved selection down: {:?}", self.session.selected_indices());
        }
    }

    /// Validates the selection and asks for the output file. Returns whether a
    /// concatenation was queued.
    pub fn request_concatenation(&mut self) -> bool {
        if self.is_busy() {
            return false;
        }

        let selected = self.session.selected_count();
        if selected < MIN_INPUTS {
            let title = if selected == 0 {
                "No Videos Selected"
            } else {
                "Not Enough Videos"
            };
            warn!("Concatenation refused with {} selected", selected);
            self.dialogs
                .message(Severity::Warning, title, SELECT_AT_LEAST_TWO);
            return false;
        }

        let Some(output) = self.dialogs.save_output(self.session.directory()) else {
            info!("Output selection cancelled");
            return false;
        };

        self.state = State::Busy {
            output: concat::with_default_extension(output),
            frames_drawn: 0,
        };
        self.status = "Concatenating videos...".to_string();
        true
    }

    /// Runs a queued concatenation on the calling thread, then returns to idle.
    pub fn run_pending(&mut self) {
        let State::Busy { output, .. } = mem::replace(&mut self.state, State::Idle) else {
            return;
        };

        let inputs: Vec<PathBuf> = self
            .session
            .selected_entries()
            .into_iter()
            .map(|file| file.path.clone())
            .collect();
        let manifest = PathBuf::from(&self.config.ffmpeg.manifest);

        match concat::concatenate(self.tool.as_ref(), &manifest, &inputs, &output) {
            Ok(()) => {
                info!("Wrote {}", output.display());
                self.status = SUCCESS_MESSAGE.to_string();
                self.dialogs
                    .message(Severity::Info, "Success", SUCCESS_MESSAGE);
            }
            Err(e) => {
                error!("Concatenation failed: {:#}", e);
                self.status = format!("Error: {:#}", e);
                self.dialogs.message(
                    Severity::Error,
                    "Error",
                    &format!("An error occurred: {:#}", e),
                );
            }
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let (select_all, clear) = ctx.input(|i| {
            (
                i.modifiers.command && i.key_pressed(egui::Key::A),
                i.key_pressed(egui::Key::Escape),
            )
        });
        if select_all {
            self.session.select_all();
        }
        if clear {
            self.session.clear_selection();
        }
    }
}

impl eframe::App for ConcatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if matches!(self.state, State::Busy { frames_drawn, .. } if frames_drawn >= 2) {
            self.run_pending();
        }

        let idle = !self.is_busy();
        if idle {
            self.handle_shortcuts(ctx);
        }

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.label(&self.status);
        });

        egui::TopBottomPanel::bottom("controls").show(ctx, |ui| {
            ui.add_space(5.0);
            ui.horizontal(|ui| {
                if ui.add_enabled(idle, egui::Button::new("Move Up")).clicked() {
                    self.move_up();
                }
                if ui.add_enabled(idle, egui::Button::new("Move Down")).clicked() {
                    self.move_down();
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .add_enabled(idle, egui::Button::new("Concatenate Videos"))
                        .clicked()
                    {
                        self.request_concatenation();
                    }
                });
            });
            ui.add_space(5.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                if ui
                    .add_enabled(idle, egui::Button::new("Select Video Directory"))
                    .clicked()
                {
                    self.select_directory();
                }
            });
            ui.separator();

            let mut clicked = None;
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for (index, file) in self.session.files().iter().enumerate() {
                        let label = ui
                            .selectable_label(self.session.is_selected(index), file.name.as_str());
                        if label.clicked() {
                            clicked = Some(index);
                        }
                    }
                });
            if let Some(index) = clicked.filter(|_| idle) {
                self.session.toggle(index);
            }
        });

        if let State::Busy { frames_drawn, .. } = &mut self.state {
            *frames_drawn = frames_drawn.saturating_add(1);
            ctx.request_repaint();
        }
    }
}
