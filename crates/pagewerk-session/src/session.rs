// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Interaction session — the state machine behind the reorder and delete grids.
//
//   (no session) --open--> Loaded --begin_drag--> Dragging { from }
//                           ^  |                      |
//                           |  +--toggle (delete)     +--drop_at / cancel_drag--> Loaded
//                           |
//   commit (ok) / cancel consume the session.
//
// Gestures in the wrong mode or state are rejected and leave the session as
// it was.

use std::collections::BTreeSet;

use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_core::types::{DocumentId, PageIndex, ProgressEvent, SessionMode, TransformationResult};
use pagewerk_document::render::{PageRenderer, Thumbnail, thumbnails};
use pagewerk_document::{SourceDocument, delete_pages, reorder};
use tracing::{debug, info, instrument, warn};

/// Where a live session is in its gesture cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Loaded,
    /// A page is being dragged from grid position `from`.
    Dragging { from: usize },
}

/// A failed commit hands the untouched session back with the error.
#[derive(Debug, thiserror::Error)]
#[error("commit failed: {error}")]
pub struct CommitError {
    pub session: InteractionSession,
    #[source]
    pub error: PagewerkError,
}

/// Pending edits for one document's page grid.
#[derive(Debug, Clone)]
pub struct InteractionSession {
    document_id: DocumentId,
    mode: SessionMode,
    arrangement: Vec<PageIndex>,
    selection: BTreeSet<PageIndex>,
    thumbnails: Vec<Thumbnail>,
    state: SessionState,
}

impl InteractionSession {
    /// Render thumbnails for every page and start a session with the
    /// identity arrangement and an empty selection.
    ///
    /// A render failure aborts the open; no session is created.
    #[instrument(skip(document, renderer, on_progress), fields(pages = document.page_count()))]
    pub fn open(
        document: &SourceDocument,
        document_id: DocumentId,
        mode: SessionMode,
        renderer: &dyn PageRenderer,
        scale: f32,
        on_progress: impl FnMut(ProgressEvent),
    ) -> Result<Self> {
        let thumbs = thumbnails(document, renderer, scale, on_progress)?;
        info!(%document_id, ?mode, "Session opened");
        Ok(Self {
            document_id,
            mode,
            arrangement: PageIndex::all(document.page_count()).collect(),
            selection: BTreeSet::new(),
            thumbnails: thumbs,
            state: SessionState::Loaded,
        })
    }

    pub fn document_id(&self) -> DocumentId {
        self.document_id
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Current grid order, as original page indices.
    pub fn arrangement(&self) -> &[PageIndex] {
        &self.arrangement
    }

    /// Pages currently marked for deletion.
    pub fn selection(&self) -> &BTreeSet<PageIndex> {
        &self.selection
    }

    /// Thumbnails indexed by original page index.
    pub fn thumbnails(&self) -> &[Thumbnail] {
        &self.thumbnails
    }

    /// Thumbnails in the order the grid currently shows them.
    pub fn arranged_thumbnails(&self) -> impl Iterator<Item = &Thumbnail> {
        self.arrangement
            .iter()
            .filter_map(|index| self.thumbnails.get(index.0))
    }

    // -- Reorder gestures ---------------------------------------------------

    /// Pick up the page at grid `position`.
    pub fn begin_drag(&mut self, position: usize) -> Result<()> {
        self.require(SessionMode::Reorder, "drag a page")?;
        if self.state != SessionState::Loaded {
            return Err(self.reject("start another drag"));
        }
        if position >= self.arrangement.len() {
            return Err(PagewerkError::InvalidInput(format!(
                "grid position {position} is outside the {}-page grid",
                self.arrangement.len()
            )));
        }
        self.state = SessionState::Dragging { from: position };
        debug!(position, "Drag started");
        Ok(())
    }

    /// Drop the dragged page at grid `target` (clamped to the last position).
    pub fn drop_at(&mut self, target: usize) -> Result<()> {
        self.require(SessionMode::Reorder, "drop a page")?;
        let SessionState::Dragging { from } = self.state else {
            return Err(self.reject("drop a page"));
        };
        self.arrangement = move_position(&self.arrangement, from, target);
        self.state = SessionState::Loaded;
        debug!(from, target, "Page dropped");
        Ok(())
    }

    /// Abandon the drag; the arrangement is unchanged.
    pub fn cancel_drag(&mut self) -> Result<()> {
        self.require(SessionMode::Reorder, "cancel a drag")?;
        if !matches!(self.state, SessionState::Dragging { .. }) {
            return Err(self.reject("cancel a drag"));
        }
        self.state = SessionState::Loaded;
        Ok(())
    }

    // -- Delete gestures ----------------------------------------------------

    /// Flip whether `index` is marked for deletion. Returns the new membership.
    pub fn toggle(&mut self, index: PageIndex) -> Result<bool> {
        self.require(SessionMode::Delete, "select a page")?;
        if index.0 >= self.arrangement.len() {
            return Err(PagewerkError::InvalidInput(format!(
                "page index {index} is outside the {}-page grid",
                self.arrangement.len()
            )));
        }
        let selected = if self.selection.remove(&index) {
            false
        } else {
            self.selection.insert(index);
            true
        };
        debug!(%index, selected, "Selection toggled");
        Ok(selected)
    }

    // -- Ending the session -------------------------------------------------

    /// Apply the pending edit to `document`.
    ///
    /// On success the session is consumed. On failure it comes back unchanged
    /// inside the error so the user can adjust and retry.
    #[instrument(skip_all, fields(document_id = %self.document_id, mode = ?self.mode))]
    pub fn commit(
        self,
        document: &SourceDocument,
    ) -> std::result::Result<TransformationResult, CommitError> {
        if let SessionState::Dragging { .. } = self.state {
            let error = self.reject("save changes");
            return Err(CommitError {
                session: self,
                error,
            });
        }

        let outcome = match self.mode {
            SessionMode::Reorder => reorder(document, &self.arrangement),
            SessionMode::Delete => delete_pages(document, &self.selection),
        };
        match outcome {
            Ok(result) => {
                info!(name = %result.suggested_name, "Session committed");
                Ok(result)
            }
            Err(error) => {
                warn!(%error, "Commit failed, session kept");
                Err(CommitError {
                    session: self,
                    error,
                })
            }
        }
    }

    /// Discard the session from any state.
    pub fn cancel(self) {
        debug!(document_id = %self.document_id, "Session cancelled");
    }

    fn require(&self, mode: SessionMode, action: &'static str) -> Result<()> {
        if self.mode == mode {
            Ok(())
        } else {
            Err(self.reject(action))
        }
    }

    fn reject(&self, action: &'static str) -> PagewerkError {
        let state = match (self.state, self.mode) {
            (SessionState::Dragging { .. }, _) => "in the middle of a drag",
            (SessionState::Loaded, SessionMode::Reorder) => "in reorder mode",
            (SessionState::Loaded, SessionMode::Delete) => "in delete mode",
        };
        PagewerkError::InvalidTransition { action, state }
    }
}

/// Move the entry at `from` to `to`: remove it, then insert it at `to`
/// (clamped to the last position). An out-of-range `from` leaves the
/// arrangement unchanged.
pub fn move_position(arrangement: &[PageIndex], from: usize, to: usize) -> Vec<PageIndex> {
    let mut moved = arrangement.to_vec();
    if from >= moved.len() {
        return moved;
    }
    let page = moved.remove(from);
    let to = to.min(moved.len());
    moved.insert(to, page);
    moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagewerk_document::fixtures::{FakeRenderer, page_labels, sample_pdf};

    fn indices(values: &[usize]) -> Vec<PageIndex> {
        values.iter().copied().map(PageIndex).collect()
    }

    fn doc(pages: usize) -> SourceDocument {
        SourceDocument::from_pdf_bytes("grid.pdf", sample_pdf(pages)).expect("ingest")
    }

    fn open(document: &SourceDocument, mode: SessionMode) -> InteractionSession {
        InteractionSession::open(document, DocumentId::new(), mode, &FakeRenderer::new(), 0.3, |_| {})
            .expect("open session")
    }

    #[test]
    fn move_position_removes_then_inserts() {
        let identity = indices(&[0, 1, 2, 3]);
        assert_eq!(move_position(&identity, 0, 2), indices(&[1, 2, 0, 3]));
        assert_eq!(move_position(&identity, 3, 0), indices(&[3, 0, 1, 2]));
        assert_eq!(move_position(&identity, 1, 99), indices(&[0, 2, 3, 1]));
        assert_eq!(move_position(&identity, 7, 0), identity);
    }

    #[test]
    fn open_starts_loaded_with_identity() {
        let document = doc(3);
        let mut events = Vec::new();
        let session = InteractionSession::open(
            &document,
            DocumentId::new(),
            SessionMode::Reorder,
            &FakeRenderer::new(),
            0.5,
            |e| events.push(e.current),
        )
        .expect("open");

        assert_eq!(session.state(), SessionState::Loaded);
        assert_eq!(session.arrangement(), indices(&[0, 1, 2]).as_slice());
        assert!(session.selection().is_empty());
        assert_eq!(session.thumbnails().len(), 3);
        assert_eq!(events, vec![1, 2, 3]);
    }

    #[test]
    fn render_failure_creates_no_session() {
        let document = doc(3);
        let renderer = FakeRenderer::failing_at(PageIndex(2));
        let err = InteractionSession::open(
            &document,
            DocumentId::new(),
            SessionMode::Delete,
            &renderer,
            0.3,
            |_| {},
        )
        .expect_err("render failure");
        assert!(matches!(err, PagewerkError::RenderFailure(_)));
    }

    #[test]
    fn drag_zero_to_two_then_commit() {
        let document = doc(4);
        let mut session = open(&document, SessionMode::Reorder);

        session.begin_drag(0).expect("begin");
        assert_eq!(session.state(), SessionState::Dragging { from: 0 });
        session.drop_at(2).expect("drop");
        assert_eq!(session.arrangement(), indices(&[1, 2, 0, 3]).as_slice());

        let arranged: Vec<usize> = session.arranged_thumbnails().map(|t| t.index.0).collect();
        assert_eq!(arranged, vec![1, 2, 0, 3]);

        let result = session.commit(&document).expect("commit");
        assert_eq!(
            page_labels(result.as_bytes()),
            vec!["Page 2", "Page 3", "Page 1", "Page 4"]
        );
    }

    #[test]
    fn cancel_drag_keeps_arrangement() {
        let document = doc(3);
        let mut session = open(&document, SessionMode::Reorder);
        session.begin_drag(1).expect("begin");
        session.cancel_drag().expect("cancel");
        assert_eq!(session.state(), SessionState::Loaded);
        assert_eq!(session.arrangement(), indices(&[0, 1, 2]).as_slice());
    }

    #[test]
    fn drop_without_drag_is_rejected() {
        let document = doc(3);
        let mut session = open(&document, SessionMode::Reorder);
        let err = session.drop_at(1).expect_err("not dragging");
        assert!(matches!(err, PagewerkError::InvalidTransition { .. }));
        assert!(session.cancel_drag().is_err());
        assert_eq!(session.state(), SessionState::Loaded);
    }

    #[test]
    fn second_drag_is_rejected_while_dragging() {
        let document = doc(3);
        let mut session = open(&document, SessionMode::Reorder);
        session.begin_drag(0).expect("begin");
        assert!(session.begin_drag(1).is_err());
        assert_eq!(session.state(), SessionState::Dragging { from: 0 });
    }

    #[test]
    fn drag_out_of_bounds_is_rejected() {
        let document = doc(2);
        let mut session = open(&document, SessionMode::Reorder);
        let err = session.begin_drag(2).expect_err("outside grid");
        assert!(matches!(err, PagewerkError::InvalidInput(_)));
    }

    #[test]
    fn commit_while_dragging_returns_session() {
        let document = doc(3);
        let mut session = open(&document, SessionMode::Reorder);
        session.begin_drag(0).expect("begin");

        let CommitError { session, error } = session.commit(&document).expect_err("dragging");
        assert!(matches!(error, PagewerkError::InvalidTransition { .. }));
        assert_eq!(session.state(), SessionState::Dragging { from: 0 });
    }

    #[test]
    fn delete_selection_then_commit() {
        let document = doc(5);
        let mut session = open(&document, SessionMode::Delete);
        assert!(session.toggle(PageIndex(1)).expect("toggle"));
        assert!(session.toggle(PageIndex(3)).expect("toggle"));
        assert!(session.toggle(PageIndex(4)).expect("toggle"));
        assert!(!session.toggle(PageIndex(4)).expect("toggle off"));

        let result = session.commit(&document).expect("commit");
        assert_eq!(
            page_labels(result.as_bytes()),
            vec!["Page 1", "Page 3", "Page 5"]
        );
    }

    #[test]
    fn failed_commit_keeps_selection() {
        let document = doc(2);
        let mut session = open(&document, SessionMode::Delete);
        session.toggle(PageIndex(0)).expect("toggle");
        session.toggle(PageIndex(1)).expect("toggle");

        let CommitError { session, error } = session.commit(&document).expect_err("every page");
        assert!(matches!(error, PagewerkError::OperationPrecondition(_)));
        assert_eq!(session.selection().len(), 2);
    }

    #[test]
    fn gestures_are_mode_specific() {
        let document = doc(3);
        let mut delete = open(&document, SessionMode::Delete);
        assert!(matches!(
            delete.begin_drag(0),
            Err(PagewerkError::InvalidTransition { .. })
        ));

        let mut reorder = open(&document, SessionMode::Reorder);
        assert!(matches!(
            reorder.toggle(PageIndex(0)),
            Err(PagewerkError::InvalidTransition { .. })
        ));
        assert!(reorder.selection().is_empty());
    }

    #[test]
    fn toggle_out_of_bounds_is_rejected() {
        let document = doc(2);
        let mut session = open(&document, SessionMode::Delete);
        assert!(session.toggle(PageIndex(5)).is_err());
        assert!(session.selection().is_empty());
    }
}
