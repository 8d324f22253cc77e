use std::panic;
use std::sync::Arc;

use coach_gpt::app::App;
use coach_gpt::{Coach, GeminiClient, KnowledgeBase, Settings, logging};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let first_run = !Settings::default_path().exists();
    let settings = Settings::load();
    logging::init(Settings::data_dir(), settings.debug_mode)?;
    log::info!("CoachGPT start: {}", chrono::Local::now());

    // Write the defaults once so there is a file to edit.
    if first_run {
        if let Err(e) = Settings::default().save() {
            log::warn!("Failed to write default settings: {e}");
        }
    }

    panic::set_hook(Box::new(|panic_info| {
        if let Some(location) = panic_info.location() {
            log::error!(
                "Panic occurred in file '{}' at line {}",
                location.file(),
                location.line(),
            );
        }
        if let Some(message) = panic_info.payload().downcast_ref::<&str>() {
            eprintln!("Panic message: {}", message);
        }
    }));

    if !settings.has_api_key() {
        log::warn!(
            "No Gemini API key configured, replies will come from the local fallback. Set {} or edit {}",
            coach_gpt::settings::API_KEY_ENV,
            Settings::default_path().display()
        );
    }

    let knowledge = Arc::new(KnowledgeBase::load(&settings.knowledge_base_path));
    let generator = GeminiClient::from_settings(&settings)?;
    let coach = Coach::from_settings(&settings, generator, knowledge);

    let mut app = App::new(coach, &settings);
    if let Err(err) = app.run().await {
        log::error!("App error: {err}");
        eprintln!("Error: {err}");
    }

    Ok(())
}
