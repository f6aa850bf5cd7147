// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — codec adapter, structural operations, stamping, and image pages.

pub mod codec;
pub mod ops;
pub mod stamp;
pub mod writer;

pub use ops::{delete_pages, merge, reorder, rotate, split, split_to_singles};
pub use stamp::{paginate, watermark};
pub use writer::{ImageBatchOutcome, images_to_document};
