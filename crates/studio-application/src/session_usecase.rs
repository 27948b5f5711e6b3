//! Session use case implementation.
//!
//! `SessionUseCase` owns the in-memory session list and the active
//! session pointer, runs the send pipeline (stream, extract, fold,
//! persist), and enforces the one-in-flight-generation-per-session
//! invariant by rejecting a second send while one is running.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use studio_core::app_state::ActiveView;
use studio_core::extractor::extract_assets;
use studio_core::message::{Attachment, Message};
use studio_core::reducer::{apply_failure, apply_generation, GENERATION_FAILURE_NOTICE};
use studio_core::session::ChatSession;
use studio_core::StudioError;
use studio_infrastructure::{write_export, DebouncedSaver, SessionStore};
use studio_interaction::GenerationSource;
use tokio::sync::RwLock;

/// Title used when exporting with no session selected.
const UNTITLED_EXPORT_TITLE: &str = "Untitled Project";

/// Result of a completed send: which view won focus and the raw text.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub active_view: ActiveView,
    pub response: String,
    pub session_id: String,
}

pub struct SessionUseCase {
    /// Session list, most recently created first.
    sessions: RwLock<Vec<ChatSession>>,
    /// Currently active session ID.
    active_session_id: RwLock<Option<String>>,
    /// Which derived output is currently primary.
    active_view: RwLock<ActiveView>,
    /// Persistent storage backend.
    store: Arc<SessionStore>,
    /// Debounced writer for the session collection.
    saver: DebouncedSaver,
    /// Streaming generation source.
    source: Arc<dyn GenerationSource>,
}

impl SessionUseCase {
    /// Creates the use case, reading the persisted collection once.
    ///
    /// # Errors
    ///
    /// Returns an error if the sessions file exists but cannot be read
    /// or parsed.
    pub fn new(store: Arc<SessionStore>, source: Arc<dyn GenerationSource>) -> Result<Self> {
        let mut sessions = store.load().context("Failed to load session collection")?;
        // The flag is only meaningful between dispatch and stream
        // completion within one process; a snapshot written while a
        // generation was running must not wedge the session after a
        // restart.
        for session in &mut sessions {
            session.state.is_generating = false;
        }
        let saver = DebouncedSaver::spawn_default(store.clone());

        Ok(Self {
            sessions: RwLock::new(sessions),
            active_session_id: RwLock::new(None),
            active_view: RwLock::new(ActiveView::default()),
            store,
            saver,
            source,
        })
    }

    /// Returns a snapshot of all sessions.
    pub async fn sessions(&self) -> Vec<ChatSession> {
        self.sessions.read().await.clone()
    }

    /// Returns the currently active session, if any.
    pub async fn active_session(&self) -> Option<ChatSession> {
        // Clone the id and release its lock before touching the
        // session list; holding both here would invert the
        // sessions-then-pointer lock order used by `send_message`.
        let id = self.active_session_id.read().await.clone()?;
        let sessions = self.sessions.read().await;
        sessions.iter().find(|s| s.id == id).cloned()
    }

    /// Returns the ID of the currently active session.
    pub async fn active_session_id(&self) -> Option<String> {
        self.active_session_id.read().await.clone()
    }

    /// Returns the currently active view.
    pub async fn active_view(&self) -> ActiveView {
        *self.active_view.read().await
    }

    /// Creates a new empty session and makes it active.
    pub async fn start_new_session(&self) -> ChatSession {
        let session = ChatSession::new(studio_core::session::DEFAULT_SESSION_TITLE);
        {
            let mut sessions = self.sessions.write().await;
            sessions.insert(0, session.clone());
        }
        *self.active_session_id.write().await = Some(session.id.clone());
        *self.active_view.write().await = ActiveView::default();
        self.persist().await;
        session
    }

    /// Makes an existing session active.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no session has the given ID.
    pub async fn switch_session(&self, session_id: &str) -> Result<ChatSession, StudioError> {
        let session = {
            let sessions = self.sessions.read().await;
            sessions
                .iter()
                .find(|s| s.id == session_id)
                .cloned()
                .ok_or_else(|| StudioError::not_found("session", session_id))?
        };
        *self.active_session_id.write().await = Some(session.id.clone());
        Ok(session)
    }

    /// Deletes a session. Deleting the active session clears the
    /// active pointer.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no session has the given ID.
    pub async fn delete_session(&self, session_id: &str) -> Result<(), StudioError> {
        {
            let mut sessions = self.sessions.write().await;
            let before = sessions.len();
            sessions.retain(|s| s.id != session_id);
            if sessions.len() == before {
                return Err(StudioError::not_found("session", session_id));
            }
        }

        let mut active = self.active_session_id.write().await;
        if active.as_deref() == Some(session_id) {
            *active = None;
        }
        drop(active);

        self.persist().await;
        Ok(())
    }

    /// Renames a session. Blank titles are ignored by the domain rule.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no session has the given ID.
    pub async fn rename_session(&self, session_id: &str, title: &str) -> Result<(), StudioError> {
        {
            let mut sessions = self.sessions.write().await;
            let session = sessions
                .iter_mut()
                .find(|s| s.id == session_id)
                .ok_or_else(|| StudioError::not_found("session", session_id))?;
            session.rename(title);
        }
        self.persist().await;
        Ok(())
    }

    /// Exports a session to `out_dir`.
    ///
    /// With no ID, exports the active session; with no active session
    /// either, exports a synthesized "Untitled Project" wrapper around
    /// the default state so the operation always produces a document.
    pub async fn export_session(
        &self,
        session_id: Option<&str>,
        out_dir: impl AsRef<Path>,
    ) -> Result<PathBuf> {
        let session = match session_id {
            Some(id) => {
                let sessions = self.sessions.read().await;
                sessions
                    .iter()
                    .find(|s| s.id == id)
                    .cloned()
                    .ok_or_else(|| StudioError::not_found("session", id))?
            }
            None => match self.active_session().await {
                Some(session) => session,
                None => ChatSession::new(UNTITLED_EXPORT_TITLE),
            },
        };

        write_export(&session, out_dir)
    }

    /// Sends a prompt on the active session (creating one when none is
    /// active) and folds the generated assets into its state.
    ///
    /// `on_chunk` observes each text fragment in arrival order while
    /// the accumulator builds the full response.
    ///
    /// # Errors
    ///
    /// - `GenerationInFlight` if the session is already generating; no
    ///   state is mutated.
    /// - `Generation` if the stream fails; the failure notice has then
    ///   already been folded into the session as a system message.
    pub async fn send_message(
        &self,
        text: &str,
        attachments: Vec<Attachment>,
        on_chunk: &mut (dyn FnMut(&str) + Send),
    ) -> Result<SendOutcome, StudioError> {
        let user_message = Message::from_user(text, attachments.clone());

        // Guard and optimistic update under one write lock so two
        // concurrent sends cannot both pass the in-flight check.
        let (session_id, history) = {
            let mut sessions = self.sessions.write().await;
            let mut active = self.active_session_id.write().await;

            let session_id = match active
                .clone()
                .filter(|id| sessions.iter().any(|s| s.id == *id))
            {
                Some(id) => id,
                None => {
                    let session = ChatSession::from_first_message(text);
                    let id = session.id.clone();
                    sessions.insert(0, session);
                    *active = Some(id.clone());
                    id
                }
            };

            let session = sessions
                .iter_mut()
                .find(|s| s.id == session_id)
                .ok_or_else(|| StudioError::internal("active session vanished"))?;

            if session.state.is_generating {
                return Err(StudioError::GenerationInFlight(session_id));
            }

            session.state = session.state.with_pending_message(user_message);
            (session_id, session.state.messages.clone())
        };
        self.persist().await;

        // Stream outside the locks; fragments are applied to the
        // accumulator strictly in arrival order.
        let mut accumulated = String::new();
        let result = self
            .source
            .stream_message(&history, text, &attachments, &mut |chunk| {
                accumulated.push_str(chunk);
                on_chunk(chunk);
            })
            .await;

        match result {
            Ok(_) => {
                // The accumulator, not the source's return value, is
                // the canonical full text handed to the extractor.
                let full_text = accumulated;
                let assets = extract_assets(&full_text);
                let view = {
                    let mut sessions = self.sessions.write().await;
                    let mut view_lock = self.active_view.write().await;
                    let session = sessions
                        .iter_mut()
                        .find(|s| s.id == session_id)
                        .ok_or_else(|| StudioError::internal("active session vanished"))?;

                    let (next_state, next_view) =
                        apply_generation(&session.state, *view_lock, &assets, &full_text);
                    session.state = next_state;
                    session.touch();
                    *view_lock = next_view;
                    next_view
                };
                self.persist().await;

                Ok(SendOutcome {
                    active_view: view,
                    response: full_text,
                    session_id,
                })
            }
            Err(err) => {
                tracing::error!("Generation failed for session {session_id}: {err}");
                {
                    let mut sessions = self.sessions.write().await;
                    if let Some(session) = sessions.iter_mut().find(|s| s.id == session_id) {
                        session.state = apply_failure(&session.state, GENERATION_FAILURE_NOTICE);
                    }
                }
                self.persist().await;
                Err(StudioError::generation(err.to_string()))
            }
        }
    }

    /// Writes any pending snapshot immediately. Call before shutdown.
    pub async fn flush(&self) {
        self.saver.flush().await;
    }

    /// Returns the path of the backing sessions file.
    pub fn store_path(&self) -> &Path {
        self.store.file_path()
    }

    async fn persist(&self) {
        let snapshot = self.sessions.read().await.clone();
        self.saver.request_save(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use studio_core::app_state::INITIAL_CODE;
    use studio_core::message::MessageRole;
    use studio_interaction::{ChunkSink, InteractionError};
    use tempfile::TempDir;
    use tokio::sync::Notify;

    /// Source that streams a canned response in two fragments,
    /// optionally parking until released so tests can observe the
    /// in-flight state.
    struct ScriptedSource {
        response: String,
        gate: Option<Arc<Notify>>,
    }

    impl ScriptedSource {
        fn new(response: impl Into<String>) -> Self {
            Self {
                response: response.into(),
                gate: None,
            }
        }

        fn gated(response: impl Into<String>, gate: Arc<Notify>) -> Self {
            Self {
                response: response.into(),
                gate: Some(gate),
            }
        }
    }

    #[async_trait]
    impl GenerationSource for ScriptedSource {
        async fn stream_message(
            &self,
            _history: &[Message],
            _new_message: &str,
            _attachments: &[Attachment],
            on_chunk: ChunkSink<'_>,
        ) -> Result<String, InteractionError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            let mid = self.response.len() / 2;
            // Split on a char boundary near the middle.
            let mid = (mid..self.response.len())
                .find(|i| self.response.is_char_boundary(*i))
                .unwrap_or(0);
            on_chunk(&self.response[..mid]);
            on_chunk(&self.response[mid..]);
            Ok(self.response.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl GenerationSource for FailingSource {
        async fn stream_message(
            &self,
            _history: &[Message],
            _new_message: &str,
            _attachments: &[Attachment],
            _on_chunk: ChunkSink<'_>,
        ) -> Result<String, InteractionError> {
            Err(InteractionError::Request {
                message: "connection refused".into(),
                is_retryable: true,
            })
        }
    }

    fn usecase_with(
        temp_dir: &TempDir,
        source: Arc<dyn GenerationSource>,
    ) -> Arc<SessionUseCase> {
        let store = Arc::new(SessionStore::new(temp_dir.path()).unwrap());
        Arc::new(SessionUseCase::new(store, source).unwrap())
    }

    #[tokio::test]
    async fn test_send_creates_session_and_folds_assets() {
        let temp_dir = TempDir::new().unwrap();
        let response = "```html-preview\n<div>Hi</div>\n```\n```tsx\nconst X = () => null;\n```";
        let usecase = usecase_with(&temp_dir, Arc::new(ScriptedSource::new(response)));

        let mut streamed = String::new();
        let outcome = usecase
            .send_message("Build a greeting screen", Vec::new(), &mut |c| {
                streamed.push_str(c)
            })
            .await
            .unwrap();

        assert_eq!(outcome.active_view, ActiveView::Preview);
        assert_eq!(streamed, response);

        let session = usecase.active_session().await.unwrap();
        assert_eq!(session.title, "Build a greeting screen");
        assert_eq!(session.state.current_preview_html, "<div>Hi</div>");
        assert_eq!(session.state.current_code, "const X = () => null;");
        assert!(!session.state.is_generating);

        // Log: user message then model message with the raw text.
        assert_eq!(session.state.messages.len(), 2);
        assert_eq!(session.state.messages[0].role, MessageRole::User);
        assert_eq!(session.state.messages[1].role, MessageRole::Model);
        assert_eq!(session.state.messages[1].content, response);
    }

    #[tokio::test]
    async fn test_analysis_wins_view_over_preview() {
        let temp_dir = TempDir::new().unwrap();
        let response = concat!(
            "```html-preview\n<div>ui</div>\n```\n",
            "```json-analysis\n[{\"name\":\"SEO\",\"value\":10,\"fullMark\":100}]\n```",
        );
        let usecase = usecase_with(&temp_dir, Arc::new(ScriptedSource::new(response)));

        let outcome = usecase
            .send_message("analyze it", Vec::new(), &mut |_| {})
            .await
            .unwrap();

        assert_eq!(outcome.active_view, ActiveView::Analysis);
        let session = usecase.active_session().await.unwrap();
        assert_eq!(session.state.analysis_data.len(), 1);
        assert_eq!(session.state.current_preview_html, "<div>ui</div>");
    }

    #[tokio::test]
    async fn test_failure_appends_system_message_and_keeps_artifacts() {
        let temp_dir = TempDir::new().unwrap();
        let usecase = usecase_with(&temp_dir, Arc::new(FailingSource));

        let err = usecase
            .send_message("do something", Vec::new(), &mut |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::Generation(_)));

        let session = usecase.active_session().await.unwrap();
        assert!(!session.state.is_generating);
        assert_eq!(session.state.current_code, INITIAL_CODE);
        let last = session.state.messages.last().unwrap();
        assert_eq!(last.role, MessageRole::System);
        assert_eq!(last.content, GENERATION_FAILURE_NOTICE);
    }

    #[tokio::test]
    async fn test_concurrent_send_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let gate = Arc::new(Notify::new());
        let usecase = usecase_with(
            &temp_dir,
            Arc::new(ScriptedSource::gated("slow reply", gate.clone())),
        );

        let first = {
            let usecase = usecase.clone();
            tokio::spawn(async move {
                usecase
                    .send_message("first", Vec::new(), &mut |_| {})
                    .await
            })
        };

        // Wait until the first send has raised the in-flight flag.
        loop {
            if let Some(session) = usecase.active_session().await {
                if session.state.is_generating {
                    break;
                }
            }
            tokio::task::yield_now().await;
        }

        let err = usecase
            .send_message("second", Vec::new(), &mut |_| {})
            .await
            .unwrap_err();
        assert!(err.is_generation_in_flight());

        gate.notify_one();
        first.await.unwrap().unwrap();

        let session = usecase.active_session().await.unwrap();
        assert!(!session.state.is_generating);
    }

    #[tokio::test]
    async fn test_lifecycle_and_persistence_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let usecase = usecase_with(&temp_dir, Arc::new(ScriptedSource::new("plain advice")));

        let created = usecase.start_new_session().await;
        usecase
            .rename_session(&created.id, "Renamed Project")
            .await
            .unwrap();
        usecase
            .send_message("hello", Vec::new(), &mut |_| {})
            .await
            .unwrap();
        usecase.flush().await;

        // A fresh use case reads the same collection back.
        let store = Arc::new(SessionStore::new(temp_dir.path()).unwrap());
        let reopened =
            SessionUseCase::new(store, Arc::new(ScriptedSource::new("unused"))).unwrap();
        let sessions = reopened.sessions().await;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].title, "Renamed Project");
        assert_eq!(sessions[0].state.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_clears_active_pointer() {
        let temp_dir = TempDir::new().unwrap();
        let usecase = usecase_with(&temp_dir, Arc::new(ScriptedSource::new("unused")));

        let session = usecase.start_new_session().await;
        usecase.delete_session(&session.id).await.unwrap();

        assert!(usecase.active_session_id().await.is_none());
        assert!(usecase.sessions().await.is_empty());
        assert!(usecase
            .delete_session(&session.id)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_export_with_no_selection_synthesizes_wrapper() {
        let temp_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        let usecase = usecase_with(&temp_dir, Arc::new(ScriptedSource::new("unused")));

        let path = usecase
            .export_session(None, out_dir.path())
            .await
            .unwrap();
        assert!(path.ends_with("Untitled_Project_export.json"));

        let json = std::fs::read_to_string(&path).unwrap();
        let session: ChatSession = serde_json::from_str(&json).unwrap();
        assert_eq!(session.title, "Untitled Project");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_sends_and_reads_do_not_deadlock() {
        let temp_dir = TempDir::new().unwrap();
        let usecase = usecase_with(&temp_dir, Arc::new(ScriptedSource::new("plain advice")));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let usecase = usecase.clone();
                tokio::spawn(async move {
                    for _ in 0..200 {
                        let _ = usecase.active_session().await;
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        let sends = {
            let usecase = usecase.clone();
            tokio::spawn(async move {
                for _ in 0..25 {
                    usecase
                        .send_message("hello", Vec::new(), &mut |_| {})
                        .await
                        .unwrap();
                }
            })
        };

        tokio::time::timeout(std::time::Duration::from_secs(10), async {
            for reader in readers {
                reader.await.unwrap();
            }
            sends.await.unwrap();
        })
        .await
        .expect("session reads and sends deadlocked");
    }

    #[tokio::test]
    async fn test_snapshot_taken_mid_generation_does_not_wedge_session() {
        let temp_dir = TempDir::new().unwrap();
        let gate = Arc::new(Notify::new());
        let usecase = usecase_with(
            &temp_dir,
            Arc::new(ScriptedSource::gated("slow reply", gate.clone())),
        );

        let first = {
            let usecase = usecase.clone();
            tokio::spawn(async move {
                usecase
                    .send_message("first", Vec::new(), &mut |_| {})
                    .await
            })
        };

        loop {
            if let Some(session) = usecase.active_session().await {
                if session.state.is_generating {
                    break;
                }
            }
            tokio::task::yield_now().await;
        }

        // Force the mid-generation snapshot to disk, as a crash at
        // this point would leave it.
        usecase.flush().await;

        // A fresh process over the same collection must accept sends.
        let store = Arc::new(SessionStore::new(temp_dir.path()).unwrap());
        let reopened = Arc::new(
            SessionUseCase::new(store, Arc::new(ScriptedSource::new("fresh reply"))).unwrap(),
        );
        let session = reopened.sessions().await.pop().unwrap();
        assert!(!session.state.is_generating);

        reopened.switch_session(&session.id).await.unwrap();
        reopened
            .send_message("second", Vec::new(), &mut |_| {})
            .await
            .unwrap();

        gate.notify_one();
        first.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_switch_session() {
        let temp_dir = TempDir::new().unwrap();
        let usecase = usecase_with(&temp_dir, Arc::new(ScriptedSource::new("unused")));

        let first = usecase.start_new_session().await;
        let second = usecase.start_new_session().await;
        assert_eq!(usecase.active_session_id().await, Some(second.id.clone()));

        usecase.switch_session(&first.id).await.unwrap();
        assert_eq!(usecase.active_session_id().await, Some(first.id));

        assert!(usecase
            .switch_session("no-such-id")
            .await
            .unwrap_err()
            .is_not_found());
    }
}
