//! Session management commands operating directly on the store.

use anyhow::{bail, Result};
use chrono::{TimeZone, Utc};
use studio_infrastructure::SessionStore;

pub fn list() -> Result<()> {
    let store = SessionStore::default_location()?;
    let mut sessions = store.load()?;
    if sessions.is_empty() {
        println!("No stored sessions.");
        return Ok(());
    }

    sessions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    for session in &sessions {
        let modified = Utc
            .timestamp_millis_opt(session.timestamp)
            .single()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| session.timestamp.to_string());
        println!(
            "{}  {}  ({} messages)  {}",
            session.id,
            modified,
            session.state.messages.len(),
            session.title,
        );
    }

    Ok(())
}

pub fn delete(id: &str) -> Result<()> {
    let store = SessionStore::default_location()?;
    let mut sessions = store.load()?;
    let before = sessions.len();
    sessions.retain(|s| s.id != id);
    if sessions.len() == before {
        bail!("No session with id '{id}'");
    }
    store.save(&sessions)?;
    println!("Deleted session {id}");
    Ok(())
}

pub fn rename(id: &str, title: &str) -> Result<()> {
    let store = SessionStore::default_location()?;
    let mut sessions = store.load()?;
    let session = sessions
        .iter_mut()
        .find(|s| s.id == id)
        .ok_or_else(|| anyhow::anyhow!("No session with id '{id}'"))?;
    session.rename(title);
    store.save(&sessions)?;
    println!("Renamed session {id} to '{}'", title.trim());
    Ok(())
}
