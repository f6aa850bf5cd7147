// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Writing transformation results to disk.

use std::path::{Path, PathBuf};

use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_core::types::TransformationResult;
use tracing::debug;

/// Write `result` under `out_dir` using its suggested name.
///
/// The directory is created if missing. Existing files are overwritten.
pub fn write_result(out_dir: &Path, result: &TransformationResult) -> Result<PathBuf> {
    let name = Path::new(&result.suggested_name)
        .file_name()
        .ok_or_else(|| {
            PagewerkError::InvalidInput(format!(
                "unusable output name {:?}",
                result.suggested_name
            ))
        })?;

    std::fs::create_dir_all(out_dir)?;
    let path = out_dir.join(name);
    std::fs::write(&path, result.as_bytes())?;
    debug!(path = %path.display(), bytes = result.as_bytes().len(), "Result written");
    Ok(path)
}
