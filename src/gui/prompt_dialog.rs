use crate::controller::PromptState;
use eframe::egui;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptAction {
    None,
    Submit(String),
    Cancel,
}

fn question_label(model_id: &str) -> String {
    let model = model_id.strip_prefix("models/").unwrap_or(model_id);
    format!("Your question for {model}:")
}

/// Multi-line prompt entry. Ctrl+Enter confirms, Escape cancels.
pub fn show(ctx: &egui::Context, state: &mut PromptState, model_id: &str) -> PromptAction {
    let mut action = PromptAction::None;
    let mut open = true;
    let title = if state.with_screenshot {
        "Ask about the screen"
    } else {
        "Ask"
    };
    egui::Window::new(title)
        .id(egui::Id::new("prompt_dialog"))
        .open(&mut open)
        .collapsible(false)
        .resizable(true)
        .default_pos((450.0, 500.0))
        .default_size((400.0, 140.0))
        .show(ctx, |ui| {
            ui.label(question_label(model_id));
            let edit = ui.add(
                egui::TextEdit::multiline(&mut state.text)
                    .desired_rows(4)
                    .desired_width(f32::INFINITY),
            );
            if !edit.has_focus() {
                edit.request_focus();
            }
            ui.horizontal(|ui| {
                if ui.button("OK").clicked() {
                    action = PromptAction::Submit(state.text.clone());
                }
                if ui.button("Cancel").clicked() {
                    action = PromptAction::Cancel;
                }
                ui.weak("Ctrl+Enter to send");
            });
        });

    let (confirm, cancel) = ctx.input(|i| {
        (
            i.modifiers.command && i.key_pressed(egui::Key::Enter),
            i.key_pressed(egui::Key::Escape),
        )
    });
    if action == PromptAction::None {
        if confirm {
            action = PromptAction::Submit(state.text.clone());
        } else if cancel || !open {
            action = PromptAction::Cancel;
        }
    }
    action
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_names_the_configured_model() {
        assert_eq!(question_label("gemini-2.5-pro"), "Your question for gemini-2.5-pro:");
        assert_eq!(question_label("models/custom-7b"), "Your question for custom-7b:");
    }
}
