//! Content-derived update identity.

use chrono::NaiveDate;
use releasewatch_shared::{DraftUpdate, UpdateId};
use sha2::{Digest, Sha256};

/// Number of hex characters kept from the digest (64 bits).
pub const UNIQUE_ID_LEN: usize = 16;

/// Identity of `draft` when produced by `tool`.
///
/// A pure function of tool, calendar day and version: description and link
/// do not participate, so edits to those map onto the same record.
pub fn unique_id(tool: &str, draft: &DraftUpdate) -> UpdateId {
    unique_id_for(tool, draft.date, &draft.version)
}

/// `hex(sha256("{tool}:{YYYY-MM-DD}:{version}"))`, truncated.
pub fn unique_id_for(tool: &str, date: NaiveDate, version: &str) -> UpdateId {
    let mut hasher = Sha256::new();
    hasher.update(format!("{tool}:{}:{version}", date.format("%Y-%m-%d")).as_bytes());
    let hex = format!("{:x}", hasher.finalize());
    UpdateId(hex[..UNIQUE_ID_LEN].to_string())
}
