//! Files read once at startup: the preset override table and the admin UI page.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use visca_core::presets::PresetError;
use visca_core::{PresetTable, StatsSink};

use crate::infrastructure::admin_api::FALLBACK_INDEX;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid preset file {path}: {source}")]
    Presets {
        path: PathBuf,
        #[source]
        source: PresetError,
    },
}

/// Returns the built-in presets, with `path`'s `[presets]` table applied if
/// given.
///
/// # Errors
///
/// A missing, unreadable or invalid override file is an error: the operator
/// asked for it explicitly.
pub fn load_presets(path: Option<&Path>) -> Result<PresetTable, AssetError> {
    let table = PresetTable::builtin();
    let Some(path) = path else {
        return Ok(table);
    };

    let text = fs::read_to_string(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    table
        .with_overrides(&text)
        .map_err(|source| AssetError::Presets {
            path: path.to_path_buf(),
            source,
        })
}

/// Reads the admin UI page, falling back to a built-in page (with a warning)
/// if the file is missing or unreadable.
pub fn load_index_html(path: Option<&Path>, sink: &StatsSink) -> String {
    let Some(path) = path else {
        return FALLBACK_INDEX.to_string();
    };
    match fs::read_to_string(path) {
        Ok(html) => html,
        Err(e) => {
            sink.warn(format!("UI {} unavailable: {e}", path.display()));
            FALLBACK_INDEX.to_string()
        }
    }
}
