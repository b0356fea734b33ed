//! Core domain types for ReleaseWatch update records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Category used when a version string carries no `"<Category> - "` prefix.
pub const DEFAULT_CATEGORY: &str = "General";

/// Separator between the category prefix and the title inside `version`.
const CATEGORY_SEPARATOR: &str = " - ";

// ---------------------------------------------------------------------------
// UpdateId
// ---------------------------------------------------------------------------

/// Content-derived identifier of a persisted update (16 lowercase hex chars).
///
/// Derived in `releasewatch-core`; this type only carries it around.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpdateId(pub String);

impl UpdateId {
    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UpdateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for UpdateId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ---------------------------------------------------------------------------
// DraftUpdate
// ---------------------------------------------------------------------------

/// A release note as extracted from a vendor page, before reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftUpdate {
    /// Vendor title, optionally prefixed with `"<Category> - "`.
    pub version: String,
    /// Release day. No time-of-day component.
    pub date: NaiveDate,
    /// Plain-text description (may be empty).
    pub description: String,
    /// Source page URL (shared by every note on that page).
    pub link: String,
}

impl DraftUpdate {
    /// Category prefix of `version`, or [`DEFAULT_CATEGORY`].
    pub fn category(&self) -> &str {
        match self.version.split_once(CATEGORY_SEPARATOR) {
            Some((category, _)) if !category.trim().is_empty() => category.trim(),
            _ => DEFAULT_CATEGORY,
        }
    }

    /// `version` with the category prefix removed.
    pub fn title(&self) -> &str {
        match self.version.split_once(CATEGORY_SEPARATOR) {
            Some((_, title)) => title.trim(),
            None => self.version.trim(),
        }
    }
}

// ---------------------------------------------------------------------------
// PersistedUpdate
// ---------------------------------------------------------------------------

/// A reconciled update as stored in the `updates` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedUpdate {
    /// Storage-internal row id (UUID v7).
    pub id: String,
    /// Content-derived identity, unique across the table.
    pub unique_id: UpdateId,
    /// Name of the extractor's tool (e.g. `Veracode`).
    pub tool: String,
    pub version: String,
    pub date: NaiveDate,
    pub description: String,
    pub link: String,
    /// First time this update was seen. Never changes.
    pub created_at: DateTime<Utc>,
    /// Last time the content was overwritten.
    pub updated_at: DateTime<Utc>,
    /// Version counter, starts at 1 and increments on every overwrite.
    pub revision: u32,
}

impl PersistedUpdate {
    /// Build a fresh record for a draft seen for the first time.
    pub fn first_seen(tool: &str, unique_id: UpdateId, draft: &DraftUpdate) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            unique_id,
            tool: tool.to_string(),
            version: draft.version.clone(),
            date: draft.date,
            description: draft.description.clone(),
            link: draft.link.clone(),
            created_at: now,
            updated_at: now,
            revision: 1,
        }
    }

    /// Whether the mutable content (`description`, `link`, `version`) matches `draft`.
    pub fn same_content(&self, draft: &DraftUpdate) -> bool {
        self.description == draft.description
            && self.link == draft.link
            && self.version == draft.version
    }
}

// ---------------------------------------------------------------------------
// UpdateOutcome
// ---------------------------------------------------------------------------

/// Classification of one draft against persisted state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateOutcome {
    /// First time this identity was seen; a record was inserted.
    New,
    /// Identity existed with different content; the record was overwritten.
    Updated,
    /// Identity existed with identical content; nothing was written.
    Unchanged,
}

impl std::fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::New => "new",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
        };
        f.write_str(label)
    }
}
