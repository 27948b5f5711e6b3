//! One-shot send command: streams the response to stdout, then reports
//! which view won focus.

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use studio_core::message::Attachment;
use studio_application::SessionUseCase;
use studio_infrastructure::{ConfigService, SessionStore};
use studio_interaction::GeminiClient;

pub async fn run(prompt: &str, session_id: Option<&str>, attachments: &[PathBuf]) -> Result<()> {
    let config = ConfigService::new().get_config();
    let client = GeminiClient::try_from_env()?
        .with_model(config.model)
        .with_timeout(Duration::from_secs(config.timeout_secs));

    let store = Arc::new(SessionStore::default_location()?);
    let usecase = SessionUseCase::new(store, Arc::new(client))?;

    if let Some(id) = session_id {
        usecase.switch_session(id).await?;
    }

    let attachments = attachments
        .iter()
        .map(|path| load_attachment(path))
        .collect::<Result<Vec<_>>>()?;

    let mut stdout = std::io::stdout();
    let outcome = usecase
        .send_message(prompt, attachments, &mut |chunk| {
            let _ = stdout.write_all(chunk.as_bytes());
            let _ = stdout.flush();
        })
        .await;
    println!();

    // Make sure the session collection hits disk before reporting.
    usecase.flush().await;

    let outcome = outcome?;
    println!("[session {}] active view: {}", outcome.session_id, outcome.active_view);
    Ok(())
}

fn load_attachment(path: &Path) -> Result<Attachment> {
    let bytes =
        std::fs::read(path).context(format!("Failed to read attachment: {}", path.display()))?;
    let mime_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string();

    let mut attachment = Attachment::new(mime_type, BASE64_STANDARD.encode(bytes));
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        attachment = attachment.with_file_name(name);
    }
    Ok(attachment)
}
