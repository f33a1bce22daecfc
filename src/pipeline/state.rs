//! Resumable job state: per-page status persisted next to the page texts.
//!
//! A page file on disk already means "do not OCR this page again", but on its
//! own it cannot tell a real transcription from a placeholder written after a
//! timeout. The manifest records which is which so that a later run can
//! report placeholder pages, retry them on request, or refuse to compose.
//!
//! The manifest is advisory: if it is missing (older runs, or deleted by
//! hand) or unreadable as JSON, it is rebuilt from the page files themselves.

use crate::error::{Ocr2MdError, OcrError};
use crate::layout::write_atomic;
use crate::output::is_placeholder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Status of one page across runs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PageState {
    /// No page file yet.
    #[default]
    Pending,
    /// Page file holds OCR output.
    Done,
    /// Page file holds a placeholder.
    Failed {
        /// The error that produced the placeholder, when known.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<OcrError>,
    },
}

impl PageState {
    pub fn is_failed(&self) -> bool {
        matches!(self, PageState::Failed { .. })
    }
}

/// Per-page states keyed by 1-indexed page number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobState {
    pages: BTreeMap<usize, PageState>,
}

impl JobState {
    /// Load the manifest at `path`.
    ///
    /// A missing or unparseable file yields an empty state, which
    /// [`JobState::reconcile_existing`] then refills from the page files.
    pub async fn load(path: &Path) -> Result<Self, Ocr2MdError> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No job state at {}", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(Ocr2MdError::ReadFailed {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };
        match serde_json::from_str(&raw) {
            Ok(state) => Ok(state),
            Err(e) => {
                warn!(
                    "Ignoring unreadable job state {}: {}; rebuilding from page files",
                    path.display(),
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// Persist the manifest atomically.
    pub async fn save(&self, path: &Path) -> Result<(), Ocr2MdError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| Ocr2MdError::StateSerializeFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        write_atomic(path, &json).await
    }

    pub fn get(&self, page: usize) -> PageState {
        self.pages.get(&page).cloned().unwrap_or_default()
    }

    pub fn set(&mut self, page: usize, state: PageState) {
        self.pages.insert(page, state);
    }

    /// State of a page whose text file already exists.
    ///
    /// A recorded `Done`/`Failed` wins; otherwise the file content decides.
    /// The inferred state is stored.
    pub fn reconcile_existing(&mut self, page: usize, existing_text: &str) -> PageState {
        let state = match self.get(page) {
            PageState::Pending if is_placeholder(existing_text) => {
                PageState::Failed { error: None }
            }
            PageState::Pending => PageState::Done,
            known => known,
        };
        self.set(page, state.clone());
        state
    }

    /// Pages currently marked `Failed`, ascending.
    pub fn failed_pages(&self) -> Vec<usize> {
        self.pages
            .iter()
            .filter(|(_, s)| s.is_failed())
            .map(|(p, _)| *p)
            .collect()
    }
}
