//! Project export command.

use anyhow::{bail, Result};
use std::path::Path;
use studio_core::session::ChatSession;
use studio_infrastructure::{write_export, SessionStore};

pub fn run(id: Option<&str>, out_dir: &Path) -> Result<()> {
    let store = SessionStore::default_location()?;
    let sessions = store.load()?;

    let session = match id {
        Some(id) => match sessions.iter().find(|s| s.id == id) {
            Some(session) => session.clone(),
            None => bail!("No session with id '{id}'"),
        },
        // No selection: wrap a fresh state so the export still
        // produces a valid project document.
        None => ChatSession::new("Untitled Project"),
    };

    let path = write_export(&session, out_dir)?;
    println!("Exported to {}", path.display());
    Ok(())
}
