//! Desktop window.
//!
//! A projection of [`AppState`]: each frame renders the state and turns
//! clicks into state operations. File dialogs come from `rfd`; everything
//! else is plain egui.

use crate::app::{AppState, Notification};
use crate::selection::HEIF_EXTENSIONS;
use std::path::PathBuf;
use std::time::Duration;

const WINDOW_TITLE: &str = "Bee Photo Converter";

pub struct BeeConvertApp {
    state: AppState,
    /// Texture of the current preview and the file it was made from.
    preview_texture: Option<(PathBuf, egui::TextureHandle)>,
}

impl BeeConvertApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, state: AppState) -> Self {
        Self {
            state,
            preview_texture: None,
        }
    }

    fn sync_preview_texture(&mut self, ctx: &egui::Context) {
        let Some(preview) = self.state.preview() else {
            self.preview_texture = None;
            return;
        };
        if let Some((source, _)) = &self.preview_texture
            && *source == preview.source
        {
            return;
        }
        let image = egui::ColorImage::from_rgba_unmultiplied(
            [preview.width as usize, preview.height as usize],
            &preview.rgba,
        );
        let texture = ctx.load_texture("preview", image, egui::TextureOptions::default());
        self.preview_texture = Some((preview.source.clone(), texture));
    }

    fn render_toolbar(&mut self, ui: &mut egui::Ui) {
        let converting = self.state.is_converting();
        ui.horizontal(|ui| {
            ui.add_enabled_ui(!converting, |ui| {
                if ui.button("Choose Files").clicked()
                    && let Some(paths) = rfd::FileDialog::new()
                        .set_title("Select HEIF Images")
                        .add_filter("HEIF/HEIC Images", HEIF_EXTENSIONS)
                        .add_filter("All Files", &["*"])
                        .pick_files()
                {
                    self.state.choose_files(paths);
                }

                if ui.button("Choose Folder").clicked()
                    && let Some(dir) = rfd::FileDialog::new()
                        .set_title("Select the folder containing HEIF images")
                        .pick_folder()
                {
                    self.state.choose_folder(&dir);
                }

                let can_convert = !self.state.selection().is_empty();
                if ui
                    .add_enabled(can_convert, egui::Button::new("Convert"))
                    .clicked()
                    && let Err(e) = self.state.start_batch()
                {
                    tracing::error!("could not start conversion: {e}");
                }

                if ui.button("Clear").clicked() {
                    self.state.clear();
                }
            });

            if converting {
                ui.spinner();
                if ui.button("Cancel").clicked() {
                    self.state.cancel_batch();
                }
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Exit").clicked() {
                    ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });
        });
    }

    fn render_source_list(&mut self, ui: &mut egui::Ui) {
        ui.heading(format!("Source ({})", self.state.selection().len()));
        ui.separator();

        let mut clicked = None;
        egui::ScrollArea::vertical()
            .id_salt("source_list")
            .show(ui, |ui| {
                for (idx, task) in self.state.selection().tasks().iter().enumerate() {
                    let label = task.source.display().to_string();
                    let selected = self.state.selected() == Some(idx);
                    if ui.selectable_label(selected, label).clicked() {
                        clicked = Some(idx);
                    }
                }
            });

        if let Some(idx) = clicked {
            self.state.select(idx);
        }
    }

    fn render_alternate_dir(&mut self, ui: &mut egui::Ui) {
        let mut enabled = self.state.alternate_enabled();
        if ui
            .checkbox(&mut enabled, "Save to alternate folder")
            .changed()
            && let Err(e) = self.state.set_alternate_enabled(enabled)
        {
            tracing::warn!("could not read remembered folder: {e}");
        }

        ui.add_enabled_ui(enabled, |ui| {
            ui.horizontal(|ui| {
                let mut dir = self.state.alternate_dir().to_string();
                if ui.text_edit_singleline(&mut dir).changed() {
                    self.state.set_alternate_dir(dir);
                }
                if ui.button("Browse").clicked()
                    && let Some(picked) = rfd::FileDialog::new()
                        .set_title("Select the destination folder for converted images")
                        .pick_folder()
                {
                    self.state
                        .set_alternate_dir(picked.to_string_lossy().into_owned());
                }
            });
        });
    }

    fn render_preview(&self, ui: &mut egui::Ui) {
        match &self.preview_texture {
            Some((_, texture)) => {
                ui.add(egui::Image::from_texture(
                    egui::load::SizedTexture::from_handle(texture),
                ));
            }
            None => {
                ui.weak("No preview");
            }
        }
    }

    fn render_results(&self, ui: &mut egui::Ui) {
        ui.heading("Results");
        ui.separator();
        egui::ScrollArea::vertical()
            .id_salt("results")
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for entry in self.state.results().entries() {
                    ui.label(entry);
                }
            });
    }

    fn render_notification(&mut self, ctx: &egui::Context) {
        let Some(Notification::Error { title, message }) = self.state.notification().cloned()
        else {
            return;
        };
        let mut dismissed = false;
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(message);
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });
        if dismissed {
            self.state.dismiss_notification();
        }
    }
}

impl eframe::App for BeeConvertApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.poll_events();
        self.sync_preview_texture(ctx);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.render_toolbar(ui));
        egui::SidePanel::left("sources")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.render_source_list(ui));
        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_preview(ui);
            ui.separator();
            self.render_alternate_dir(ui);
            ui.separator();
            self.render_results(ui);
        });
        self.render_notification(ctx);

        // Keep draining worker events while a batch runs
        if self.state.is_converting() {
            ctx.request_repaint_after(Duration::from_millis(50));
        }
    }
}

/// Open the window and run until it is closed.
pub fn run(state: AppState) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 640.0])
            .with_title(WINDOW_TITLE),
        ..Default::default()
    };
    eframe::run_native(
        WINDOW_TITLE,
        options,
        Box::new(|cc| Ok(Box::new(BeeConvertApp::new(cc, state)))),
    )
}
