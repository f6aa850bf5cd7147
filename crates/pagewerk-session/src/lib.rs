// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagewerk-session — Interactive page grids and the per-document workspace.
//
// An `InteractionSession` turns grid gestures (drag, drop, toggle) into a
// pending arrangement or selection; a `Workspace` owns documents and their
// sessions and serialises all work on the same document.

pub mod session;
pub mod workspace;

pub use session::{CommitError, InteractionSession, SessionState, move_position};
pub use workspace::Workspace;
