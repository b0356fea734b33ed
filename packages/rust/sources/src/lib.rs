//! Vendor release-note sources.
//!
//! This crate provides:
//! - [`UpdateSource`]: the extractor trait, one implementation per vendor
//! - [`SourceRegistry`]: the explicit list of built-in sources
//! - [`PageFetcher`]: the shared HTTP client with timeout and status checks

pub mod dates;
pub mod extractors;
pub mod fetch;
mod text;

pub use dates::HeadingDates;
pub use extractors::{
    SdElementsSource, SourceRegistry, UpdateSource, VeracodeRssSource, VeracodeSource,
    parse_dated_notes, parse_release_page,
};
pub use fetch::PageFetcher;
