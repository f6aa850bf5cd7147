// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Workspace — owns ingested documents and their live sessions.
//
// Each document slot sits behind its own `tokio::sync::Mutex`, so every
// operation and gesture on one document runs one at a time while different
// documents proceed concurrently. Heavy work (rendering, assembling) runs on
// the blocking pool with the slot held.

use std::collections::HashMap;
use std::sync::Arc;

use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_core::types::{DocumentId, ProgressEvent, SessionMode, TransformationResult};
use pagewerk_document::SourceDocument;
use pagewerk_document::render::PageRenderer;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use crate::session::{CommitError, InteractionSession};

struct Slot {
    document: SourceDocument,
    session: Option<InteractionSession>,
}

/// Per-document controller. Cheap to clone; clones share the same documents.
#[derive(Clone, Default)]
pub struct Workspace {
    slots: Arc<RwLock<HashMap<DocumentId, Arc<Mutex<Slot>>>>>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a document and return its identifier.
    pub async fn ingest(&self, document: SourceDocument) -> DocumentId {
        let id = DocumentId::new();
        info!(%id, name = document.name(), pages = document.page_count(), "Document ingested");
        let slot = Slot {
            document,
            session: None,
        };
        self.slots
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(slot)));
        id
    }

    /// Identifiers of every held document.
    pub async fn document_ids(&self) -> Vec<DocumentId> {
        self.slots.read().await.keys().copied().collect()
    }

    /// The current content of a document. Waits for in-flight work on it.
    pub async fn document(&self, id: DocumentId) -> Result<SourceDocument> {
        let slot = self.slot(id).await?;
        let guard = slot.lock().await;
        Ok(guard.document.clone())
    }

    /// Swap in new content for a document, e.g. a transformation's output.
    pub async fn replace(&self, id: DocumentId, document: SourceDocument) -> Result<()> {
        let slot = self.slot(id).await?;
        let mut guard = slot.lock().await;
        if guard.session.is_some() {
            return Err(PagewerkError::SessionActive(id));
        }
        debug!(%id, pages = document.page_count(), "Document replaced");
        guard.document = document;
        Ok(())
    }

    /// Forget a document, discarding any live session on it.
    pub async fn evict(&self, id: DocumentId) -> Result<SourceDocument> {
        let slot = self
            .slots
            .write()
            .await
            .remove(&id)
            .ok_or(PagewerkError::UnknownDocument(id))?;

        let mut guard = slot.lock().await;
        if guard.session.take().is_some() {
            warn!(%id, "Evicted document had a live session; discarded");
        }
        info!(%id, "Document evicted");
        Ok(guard.document.clone())
    }

    /// Run a transformation on the blocking pool. Rejected while a session
    /// is live on the document.
    #[instrument(skip(self, op))]
    pub async fn apply<F>(&self, id: DocumentId, op: F) -> Result<TransformationResult>
    where
        F: FnOnce(&SourceDocument) -> Result<TransformationResult> + Send + 'static,
    {
        let slot = self.slot(id).await?;
        let guard = slot.lock().await;
        if guard.session.is_some() {
            return Err(PagewerkError::SessionActive(id));
        }

        let document = guard.document.clone();
        let result = run_blocking(move || op(&document)).await??;
        debug!(%id, name = %result.suggested_name, "Operation applied");
        Ok(result)
    }

    // -- Sessions -------------------------------------------------------------

    /// Open a page grid session. Only one session may be live per document.
    #[instrument(skip(self, renderer, on_progress))]
    pub async fn open_session(
        &self,
        id: DocumentId,
        mode: SessionMode,
        renderer: Arc<dyn PageRenderer + Send + Sync>,
        scale: f32,
        on_progress: impl FnMut(ProgressEvent) + Send + 'static,
    ) -> Result<()> {
        let slot = self.slot(id).await?;
        let mut guard = slot.lock().await;
        if guard.session.is_some() {
            return Err(PagewerkError::SessionActive(id));
        }

        let document = guard.document.clone();
        let session = run_blocking(move || {
            InteractionSession::open(&document, id, mode, renderer.as_ref(), scale, on_progress)
        })
        .await??;
        guard.session = Some(session);
        Ok(())
    }

    /// Apply a gesture (or read state) on the live session.
    pub async fn with_session<R>(
        &self,
        id: DocumentId,
        gesture: impl FnOnce(&mut InteractionSession) -> Result<R>,
    ) -> Result<R> {
        let slot = self.slot(id).await?;
        let mut guard = slot.lock().await;
        match guard.session.as_mut() {
            Some(session) => gesture(session),
            None => Err(PagewerkError::InvalidTransition {
                action: "edit pages",
                state: "not open for editing",
            }),
        }
    }

    /// Whether a session is live on the document.
    pub async fn has_session(&self, id: DocumentId) -> Result<bool> {
        let slot = self.slot(id).await?;
        let guard = slot.lock().await;
        Ok(guard.session.is_some())
    }

    /// Commit the live session. On success the document is replaced by the
    /// result (keeping its name) and the result is returned; on failure the
    /// session stays live and unchanged.
    #[instrument(skip(self))]
    pub async fn commit_session(&self, id: DocumentId) -> Result<TransformationResult> {
        let slot = self.slot(id).await?;
        let mut guard = slot.lock().await;
        let session = guard.session.take().ok_or(PagewerkError::InvalidTransition {
            action: "save changes",
            state: "not open for editing",
        })?;

        let document = guard.document.clone();
        let outcome = run_blocking(move || {
            commit_and_reload(session, &document, |name, bytes| {
                SourceDocument::from_pdf_bytes(name, bytes)
            })
        })
        .await?;

        match outcome {
            Ok((result, replacement)) => {
                guard.document = replacement;
                info!(%id, name = %result.suggested_name, "Session committed");
                Ok(result)
            }
            Err(CommitError { session, error }) => {
                guard.session = Some(session);
                Err(error)
            }
        }
    }

    /// Drop the live session without applying it.
    pub async fn cancel_session(&self, id: DocumentId) -> Result<bool> {
        let slot = self.slot(id).await?;
        let mut guard = slot.lock().await;
        Ok(match guard.session.take() {
            Some(session) => {
                session.cancel();
                true
            }
            None => false,
        })
    }

    async fn slot(&self, id: DocumentId) -> Result<Arc<Mutex<Slot>>> {
        self.slots
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(PagewerkError::UnknownDocument(id))
    }
}

/// Commit `session` against `document` and re-read the output with `reload`.
/// The session comes back inside the error if either step fails.
fn commit_and_reload<R>(
    session: InteractionSession,
    document: &SourceDocument,
    reload: R,
) -> std::result::Result<(TransformationResult, SourceDocument), CommitError>
where
    R: FnOnce(&str, Vec<u8>) -> Result<SourceDocument>,
{
    let fallback = session.clone();
    let committed = session.commit(document)?;
    match reload(document.name(), committed.as_bytes().to_vec()) {
        Ok(replacement) => Ok((committed, replacement)),
        Err(error) => {
            warn!(%error, "Committed output could not be re-read; session kept");
            Err(CommitError {
                session: fallback,
                error,
            })
        }
    }
}

/// Run `work` on the blocking pool, surfacing a panicked task as an error.
async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| PagewerkError::Io(std::io::Error::other(format!("worker task failed: {err}"))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagewerk_core::PageRange;
    use pagewerk_core::types::PageIndex;
    use pagewerk_document::fixtures::{FakeRenderer, page_labels, sample_pdf};

    use crate::session::SessionState;

    fn doc(pages: usize) -> SourceDocument {
        SourceDocument::from_pdf_bytes("desk.pdf", sample_pdf(pages)).expect("ingest")
    }

    fn renderer() -> Arc<dyn PageRenderer + Send + Sync> {
        Arc::new(FakeRenderer::new())
    }

    #[tokio::test]
    async fn ingest_and_fetch() {
        let workspace = Workspace::new();
        let id = workspace.ingest(doc(3)).await;
        assert_eq!(workspace.document(id).await.expect("document").page_count(), 3);
        assert_eq!(workspace.document_ids().await, vec![id]);
    }

    #[tokio::test]
    async fn unknown_document_is_reported() {
        let workspace = Workspace::new();
        let id = DocumentId::new();
        let err = workspace.document(id).await.expect_err("unknown");
        assert!(matches!(err, PagewerkError::UnknownDocument(missing) if missing == id));
    }

    #[tokio::test]
    async fn only_one_session_per_document() {
        let workspace = Workspace::new();
        let id = workspace.ingest(doc(3)).await;
        workspace
            .open_session(id, SessionMode::Reorder, renderer(), 0.3, |_| {})
            .await
            .expect("first session");

        let err = workspace
            .open_session(id, SessionMode::Delete, renderer(), 0.3, |_| {})
            .await
            .expect_err("second session");
        assert!(matches!(err, PagewerkError::SessionActive(_)));

        assert!(workspace.cancel_session(id).await.expect("cancel"));
        workspace
            .open_session(id, SessionMode::Delete, renderer(), 0.3, |_| {})
            .await
            .expect("session after cancel");
    }

    #[tokio::test]
    async fn committed_reorder_replaces_document() {
        let workspace = Workspace::new();
        let id = workspace.ingest(doc(4)).await;
        workspace
            .open_session(id, SessionMode::Reorder, renderer(), 0.3, |_| {})
            .await
            .expect("open");
        workspace
            .with_session(id, |session| {
                session.begin_drag(0)?;
                session.drop_at(2)
            })
            .await
            .expect("drag");

        let result = workspace.commit_session(id).await.expect("commit");
        assert_eq!(result.suggested_name, "desk_reordered.pdf");
        assert!(!workspace.has_session(id).await.expect("lookup"));

        let current = workspace.document(id).await.expect("document");
        assert_eq!(current.name(), "desk.pdf");
        assert_eq!(
            page_labels(current.bytes()),
            vec!["Page 2", "Page 3", "Page 1", "Page 4"]
        );
    }

    #[tokio::test]
    async fn failed_commit_keeps_session_and_document() {
        let workspace = Workspace::new();
        let id = workspace.ingest(doc(2)).await;
        workspace
            .open_session(id, SessionMode::Delete, renderer(), 0.3, |_| {})
            .await
            .expect("open");

        let err = workspace.commit_session(id).await.expect_err("nothing selected");
        assert!(matches!(err, PagewerkError::OperationPrecondition(_)));
        assert!(workspace.has_session(id).await.expect("lookup"));
        assert_eq!(workspace.document(id).await.expect("doc").page_count(), 2);

        workspace
            .with_session(id, |session| session.toggle(PageIndex(0)))
            .await
            .expect("toggle");
        workspace.commit_session(id).await.expect("commit");
        assert_eq!(workspace.document(id).await.expect("doc").page_count(), 1);
    }

    #[tokio::test]
    async fn apply_is_rejected_while_session_is_live() {
        let workspace = Workspace::new();
        let id = workspace.ingest(doc(5)).await;
        let split = |document: &SourceDocument| {
            pagewerk_document::split(document, &PageRange::parse("2,4"))
        };

        let result = workspace.apply(id, split).await.expect("apply");
        assert_eq!(page_labels(result.as_bytes()), vec!["Page 2", "Page 4"]);

        workspace
            .open_session(id, SessionMode::Delete, renderer(), 0.3, |_| {})
            .await
            .expect("open");
        let err = workspace.apply(id, split).await.expect_err("session live");
        assert!(matches!(err, PagewerkError::SessionActive(_)));
    }

    #[tokio::test]
    async fn gestures_without_session_are_rejected() {
        let workspace = Workspace::new();
        let id = workspace.ingest(doc(2)).await;
        let err = workspace
            .with_session(id, |session| session.begin_drag(0))
            .await
            .expect_err("no session");
        assert!(matches!(err, PagewerkError::InvalidTransition { .. }));
        assert!(workspace.commit_session(id).await.is_err());
    }

    #[tokio::test]
    async fn evict_discards_live_session() {
        let workspace = Workspace::new();
        let id = workspace.ingest(doc(2)).await;
        workspace
            .open_session(id, SessionMode::Reorder, renderer(), 0.3, |_| {})
            .await
            .expect("open");

        let evicted = workspace.evict(id).await.expect("evict");
        assert_eq!(evicted.page_count(), 2);
        assert!(matches!(
            workspace.has_session(id).await,
            Err(PagewerkError::UnknownDocument(_))
        ));
    }

    #[tokio::test]
    async fn different_documents_run_concurrently() {
        let workspace = Workspace::new();
        let a = workspace.ingest(doc(3)).await;
        let b = workspace.ingest(doc(4)).await;

        let (left, right) = tokio::join!(
            workspace.apply(a, |d| pagewerk_document::rotate(d, 90, None)),
            workspace.apply(b, |d| pagewerk_document::rotate(d, 180, None)),
        );
        assert_eq!(left.expect("a").suggested_name, "desk_rotated.pdf");
        assert_eq!(right.expect("b").suggested_name, "desk_rotated.pdf");
    }

    #[tokio::test]
    async fn replace_swaps_content() {
        let workspace = Workspace::new();
        let id = workspace.ingest(doc(2)).await;
        workspace.replace(id, doc(6)).await.expect("replace");
        assert_eq!(workspace.document(id).await.expect("doc").page_count(), 6);
    }

    #[tokio::test]
    async fn cancel_from_dragging_allows_reopen() {
        let workspace = Workspace::new();
        let id = workspace.ingest(doc(3)).await;
        workspace
            .open_session(id, SessionMode::Reorder, renderer(), 0.3, |_| {})
            .await
            .expect("open");
        let state = workspace
            .with_session(id, |session| {
                session.begin_drag(1)?;
                Ok(session.state())
            })
            .await
            .expect("drag");
        assert_eq!(state, SessionState::Dragging { from: 1 });

        assert!(workspace.cancel_session(id).await.expect("cancel"));
        assert!(!workspace.has_session(id).await.expect("lookup"));

        workspace
            .open_session(id, SessionMode::Reorder, renderer(), 0.3, |_| {})
            .await
            .expect("reopen");
        let (state, arrangement) = workspace
            .with_session(id, |session| Ok((session.state(), session.arrangement().to_vec())))
            .await
            .expect("state");
        assert_eq!(state, SessionState::Loaded);
        assert_eq!(arrangement, vec![PageIndex(0), PageIndex(1), PageIndex(2)]);
    }

    #[tokio::test]
    async fn failed_open_leaves_no_session() {
        let workspace = Workspace::new();
        let id = workspace.ingest(doc(3)).await;
        let broken: Arc<dyn PageRenderer + Send + Sync> =
            Arc::new(FakeRenderer::failing_at(PageIndex(1)));

        let err = workspace
            .open_session(id, SessionMode::Delete, broken, 0.3, |_| {})
            .await
            .expect_err("render failure");
        assert!(matches!(err, PagewerkError::RenderFailure(_)));
        assert!(!workspace.has_session(id).await.expect("lookup"));

        workspace
            .open_session(id, SessionMode::Delete, renderer(), 0.3, |_| {})
            .await
            .expect("open after failure");
        assert!(workspace.has_session(id).await.expect("lookup"));
    }

    #[test]
    fn unreadable_commit_output_returns_session() {
        let document = doc(3);
        let mut session = InteractionSession::open(
            &document,
            DocumentId::new(),
            SessionMode::Delete,
            &FakeRenderer::new(),
            0.3,
            |_| {},
        )
        .expect("open");
        session.toggle(PageIndex(2)).expect("toggle");

        let CommitError { session, error } = commit_and_reload(session, &document, |_, _| {
            Err(PagewerkError::CorruptDocument("truncated".into()))
        })
        .expect_err("reload fails");
        assert!(matches!(error, PagewerkError::CorruptDocument(_)));
        assert_eq!(session.state(), SessionState::Loaded);
        assert!(session.selection().contains(&PageIndex(2)));
    }
}
