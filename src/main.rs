use ink_ask::gemini::GeminiClient;
use ink_ask::gui::OverlayApp;
use ink_ask::logging;
use ink_ask::settings::Settings;

use eframe::egui;
use std::path::PathBuf;

const SETTINGS_FILE: &str = "settings.json";

fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the key may come from the real environment.
    let dotenv = dotenvy::dotenv();
    let settings = Settings::load(SETTINGS_FILE)?;
    logging::init(settings.debug_logging, settings.log_file.as_ref().map(PathBuf::from));
    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "loaded environment file");
    }

    let config = settings.app_config();
    if config.api_key.is_empty() {
        tracing::warn!("no API key configured; queries will fail to authenticate");
    }
    let client = GeminiClient::new(&config)?;
    tracing::info!(model = %config.model_id, policy = %config.query_policy, "starting overlay");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("ink_ask")
            .with_transparent(true)
            .with_decorations(false)
            .with_always_on_top()
            .with_fullscreen(true),
        ..Default::default()
    };

    eframe::run_native(
        "ink_ask",
        native_options,
        Box::new(move |cc| Box::new(OverlayApp::new(cc, &settings, client))),
    )
    .map_err(|e| anyhow::anyhow!("event loop failed: {e}"))?;
    Ok(())
}
