use crate::controller::ResponseStatus;
use crate::typewriter::Typewriter;
use eframe::egui;
use egui_commonmark::{CommonMarkCache, CommonMarkViewer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseAction {
    None,
    Stop,
    Close,
    Copied,
    CopyFailed(String),
}

/// Always-on-top window showing the revealed answer.
pub struct ResponseWindow {
    cache: CommonMarkCache,
    pos: egui::Pos2,
    size: egui::Vec2,
}

impl ResponseWindow {
    pub fn new(pos: (f32, f32), size: (f32, f32)) -> Self {
        Self {
            cache: CommonMarkCache::default(),
            pos: egui::pos2(pos.0, pos.1),
            size: egui::vec2(size.0, size.1),
        }
    }

    pub fn show(
        &mut self,
        ctx: &egui::Context,
        typewriter: &mut Typewriter,
        status: &ResponseStatus,
    ) -> ResponseAction {
        let builder = egui::ViewportBuilder::default()
            .with_title("Answer")
            .with_position(self.pos)
            .with_inner_size(self.size)
            .with_always_on_top();

        ctx.show_viewport_immediate(
            egui::ViewportId::from_hash_of("response_window"),
            builder,
            |ctx, class| {
                if matches!(class, egui::ViewportClass::Embedded) {
                    let mut open = true;
                    let mut action = ResponseAction::None;
                    egui::Window::new("Answer")
                        .open(&mut open)
                        .default_pos(self.pos)
                        .default_size(self.size)
                        .show(ctx, |ui| action = self.contents(ui, typewriter, status));
                    if !open {
                        action = ResponseAction::Close;
                    }
                    action
                } else {
                    let mut action = egui::CentralPanel::default()
                        .frame(egui::Frame::central_panel(&ctx.style()).fill(egui::Color32::WHITE))
                        .show(ctx, |ui| self.contents(ui, typewriter, status))
                        .inner;
                    if ctx.input(|i| i.viewport().close_requested()) {
                        action = ResponseAction::Close;
                    }
                    action
                }
            },
        )
    }

    fn contents(
        &mut self,
        ui: &mut egui::Ui,
        typewriter: &mut Typewriter,
        status: &ResponseStatus,
    ) -> ResponseAction {
        let mut action = ResponseAction::None;
        ui.visuals_mut().override_text_color = Some(egui::Color32::BLACK);

        ui.horizontal(|ui| {
            match status {
                ResponseStatus::Streaming => {
                    ui.spinner();
                    ui.label("Streaming…");
                    if ui.button("Stop").clicked() {
                        action = ResponseAction::Stop;
                    }
                }
                ResponseStatus::Stopping => {
                    ui.spinner();
                    ui.label("Stopping…");
                }
                ResponseStatus::Done if typewriter.is_revealing() => {
                    ui.label("Revealing…");
                }
                ResponseStatus::Done => {
                    ui.label("Done");
                }
                ResponseStatus::Failed(_) => {
                    ui.colored_label(egui::Color32::DARK_RED, "Failed");
                }
                ResponseStatus::Empty => {}
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.small_button("Copy HTML").clicked() {
                    action = copy_to_clipboard(typewriter.html());
                }
                if ui.small_button("Copy text").clicked() {
                    action = copy_to_clipboard(typewriter.revealed());
                }
            });
        });
        ui.separator();

        let scroll = typewriter.take_scroll_request();
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                CommonMarkViewer::new("response_markdown").show(
                    ui,
                    &mut self.cache,
                    typewriter.revealed(),
                );
                if let ResponseStatus::Failed(msg) = status {
                    ui.add_space(8.0);
                    ui.colored_label(egui::Color32::DARK_RED, format!("Error: {msg}"));
                }
                if scroll {
                    ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
                }
            });
        action
    }
}

fn copy_to_clipboard(text: &str) -> ResponseAction {
    match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text.to_string())) {
        Ok(()) => ResponseAction::Copied,
        Err(e) => ResponseAction::CopyFailed(e.to_string()),
    }
}
