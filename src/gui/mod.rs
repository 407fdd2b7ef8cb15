mod prompt_dialog;
mod response_window;

pub use prompt_dialog::PromptAction;
pub use response_window::{ResponseAction, ResponseWindow};

use crate::capture::PrimaryScreenGrabber;
use crate::controller::{Controller, ControllerEffect, MenuCommand};
use crate::draw::{paint_paths, PenStyle};
use crate::gemini::GeminiClient;
use crate::settings::Settings;
use eframe::egui;
use egui_toast::{Toast, ToastKind, ToastOptions, Toasts};
use std::sync::Arc;
use std::time::Instant;

pub type AppController = Controller<GeminiClient, PrimaryScreenGrabber>;

// Frames to wait after the context menu closes before grabbing the screen,
// so the menu is not part of the capture.
const CAPTURE_SETTLE_FRAMES: u8 = 2;

/// Full-screen transparent drawing surface hosting the prompt dialog and the
/// answer window.
pub struct OverlayApp {
    controller: AppController,
    response: ResponseWindow,
    toasts: Toasts,
    pen: PenStyle,
    enable_toasts: bool,
    toast_duration: f32,
    deferred: Option<(MenuCommand, u8)>,
}

impl OverlayApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: &Settings, client: GeminiClient) -> Self {
        let ctx = cc.egui_ctx.clone();
        let notify = Arc::new(move || ctx.request_repaint());
        let controller = Controller::new(
            settings.app_config(),
            Arc::new(client),
            PrimaryScreenGrabber,
            notify,
        );
        Self {
            controller,
            response: ResponseWindow::new(
                settings.response_window_pos,
                settings.response_window_size,
            ),
            toasts: Toasts::new().anchor(egui::Align2::RIGHT_TOP, [-10.0, 10.0]),
            pen: PenStyle::from_rgba(settings.pen_color, settings.pen_width),
            enable_toasts: settings.enable_toasts,
            toast_duration: settings.toast_duration,
            deferred: None,
        }
    }

    fn toast(&mut self, kind: ToastKind, text: String) {
        // Errors are always shown; informational toasts honour the setting.
        if !self.enable_toasts && !matches!(kind, ToastKind::Error) {
            return;
        }
        self.toasts.add(Toast {
            text: text.into(),
            kind,
            options: ToastOptions::default().duration_in_seconds(self.toast_duration as f64),
        });
    }

    fn apply_effect(&mut self, ctx: &egui::Context, effect: ControllerEffect) {
        match effect {
            ControllerEffect::Minimize => ctx.send_viewport_cmd(egui::ViewportCommand::Minimized(true)),
            ControllerEffect::Quit => ctx.send_viewport_cmd(egui::ViewportCommand::Close),
            ControllerEffect::Rejected => self.toast(
                ToastKind::Warning,
                "An answer is still streaming; stop it before asking again".into(),
            ),
            ControllerEffect::CaptureFailed(msg) => self.toast(ToastKind::Error, msg),
            ControllerEffect::Redraw
            | ControllerEffect::PromptOpened
            | ControllerEffect::QueryStarted(_) => ctx.request_repaint(),
            ControllerEffect::Aborted | ControllerEffect::None => {}
        }
    }

    fn run_deferred(&mut self, ctx: &egui::Context) {
        if let Some((command, frames)) = self.deferred.take() {
            if frames == 0 {
                let effect = self.controller.handle_menu(command);
                self.apply_effect(ctx, effect);
            } else {
                self.deferred = Some((command, frames - 1));
                ctx.request_repaint();
            }
        }
    }

    fn surface(&mut self, ctx: &egui::Context) -> Option<MenuCommand> {
        let mut chosen = None;
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                let response = ui.allocate_rect(rect, egui::Sense::click_and_drag());

                let drawing = self.controller.paths().is_drawing();
                if response.hovered() || drawing {
                    let events = ctx.input(|i| i.events.clone());
                    if self.controller.draw_input().handle_events(&events, drawing) {
                        ctx.request_repaint();
                    }
                }

                paint_paths(ui.painter(), self.controller.paths(), self.pen);

                response.clone().context_menu(|ui| {
                    for (i, command) in MenuCommand::ALL.into_iter().enumerate() {
                        if i > 0 {
                            ui.separator();
                        }
                        if ui.button(command.label()).clicked() {
                            chosen = Some(command);
                            ui.close_menu();
                        }
                    }
                });
            });
        chosen
    }
}

impl eframe::App for OverlayApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        if self.controller.pump(now) {
            ctx.request_repaint();
        }

        self.run_deferred(ctx);

        if let Some(command) = self.surface(ctx) {
            match command {
                MenuCommand::AskWithScreenshot => {
                    self.deferred = Some((command, CAPTURE_SETTLE_FRAMES));
                    ctx.request_repaint();
                }
                _ => {
                    let effect = self.controller.handle_menu(command);
                    self.apply_effect(ctx, effect);
                }
            }
        }

        let model_id = self.controller.config().model_id.clone();
        let action = match self.controller.prompt_mut() {
            Some(state) => prompt_dialog::show(ctx, state, &model_id),
            None => PromptAction::None,
        };
        let effect = match action {
            PromptAction::Submit(text) => Some(self.controller.submit_prompt(&text)),
            PromptAction::Cancel => Some(self.controller.cancel_prompt()),
            PromptAction::None => None,
        };
        if let Some(effect) = effect {
            self.apply_effect(ctx, effect);
        }

        if self.controller.response_visible() {
            let status = self.controller.status().clone();
            let action = self
                .response
                .show(ctx, self.controller.typewriter_mut(), &status);
            match action {
                ResponseAction::Stop => self.controller.stop_query(),
                ResponseAction::Close => self.controller.hide_response(),
                ResponseAction::Copied => self.toast(ToastKind::Info, "Copied to clipboard".into()),
                ResponseAction::CopyFailed(e) => {
                    self.toast(ToastKind::Error, format!("Clipboard unavailable: {e}"))
                }
                ResponseAction::None => {}
            }
        }

        self.toasts.show(ctx);

        if let Some(deadline) = self.controller.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(Instant::now()));
        }
    }

    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        // Not fully transparent: the window must keep receiving pointer input
        // across its whole area.
        [0.0, 0.0, 0.0, 1.0 / 255.0]
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.controller.stop_query();
        tracing::info!("overlay closed");
    }
}
