//! Run reports: per-tool, per-category outcome tallies and their console
//! rendering. Nothing here makes decisions; it only presents outcomes the
//! reconciler already computed.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::ops::AddAssign;

use serde::Serialize;

use releasewatch_shared::{DraftUpdate, UpdateOutcome};

/// Changed entries listed per category before collapsing into "... and N more".
const MAX_LISTED_PER_CATEGORY: usize = 5;

/// Titles longer than this are shortened when rendered.
const MAX_TITLE_CHARS: usize = 55;

// ---------------------------------------------------------------------------
// Counts
// ---------------------------------------------------------------------------

/// Tally of reconciliation outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub new: usize,
    pub updated: usize,
    pub unchanged: usize,
}

impl OutcomeCounts {
    pub fn record(&mut self, outcome: UpdateOutcome) {
        match outcome {
            UpdateOutcome::New => self.new += 1,
            UpdateOutcome::Updated => self.updated += 1,
            UpdateOutcome::Unchanged => self.unchanged += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.new + self.updated + self.unchanged
    }

    /// Entries that caused a write.
    pub fn changed(&self) -> usize {
        self.new + self.updated
    }
}

impl AddAssign for OutcomeCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.new += rhs.new;
        self.updated += rhs.updated;
        self.unchanged += rhs.unchanged;
    }
}

impl std::fmt::Display for OutcomeCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} new, {} updated, {} unchanged",
            self.new, self.updated, self.unchanged
        )
    }
}

// ---------------------------------------------------------------------------
// Per-category / per-tool reports
// ---------------------------------------------------------------------------

/// One reconciled draft as shown in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    /// Version with the category prefix removed.
    pub title: String,
    pub outcome: UpdateOutcome,
}

/// Outcomes for one category, in the order they were reconciled.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryReport {
    pub counts: OutcomeCounts,
    pub entries: Vec<ReportEntry>,
}

impl CategoryReport {
    /// Entries that were inserted or overwritten.
    pub fn changed_entries(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries
            .iter()
            .filter(|e| e.outcome != UpdateOutcome::Unchanged)
    }
}

/// Outcomes of one source run, grouped by category.
#[derive(Debug, Clone, Serialize)]
pub struct ToolReport {
    /// Registry key of the source.
    pub key: String,
    pub tool: String,
    pub counts: OutcomeCounts,
    /// Sorted by category name.
    pub categories: BTreeMap<String, CategoryReport>,
}

impl ToolReport {
    pub fn new(key: impl Into<String>, tool: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            tool: tool.into(),
            counts: OutcomeCounts::default(),
            categories: BTreeMap::new(),
        }
    }

    /// Add one reconciled draft.
    pub fn record(&mut self, draft: &DraftUpdate, outcome: UpdateOutcome) {
        self.counts.record(outcome);
        let category = self
            .categories
            .entry(draft.category().to_string())
            .or_default();
        category.counts.record(outcome);
        category.entries.push(ReportEntry {
            title: draft.title().to_string(),
            outcome,
        });
    }

    /// Render the console tree for this tool.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "== {} ({}) ==", self.tool, self.key);

        if self.categories.is_empty() {
            let _ = writeln!(out, "(no updates found)");
        }

        let last_index = self.categories.len().saturating_sub(1);
        for (i, (name, category)) in self.categories.iter().enumerate() {
            let is_last = i == last_index;
            let branch = if is_last { "└──" } else { "├──" };
            let indent = if is_last { "    " } else { "│   " };

            let _ = writeln!(out, "{branch} {name}{}", badges(&category.counts));

            let changed: Vec<&ReportEntry> = category.changed_entries().collect();
            let remaining = changed.len().saturating_sub(MAX_LISTED_PER_CATEGORY);
            let shown = &changed[..changed.len().min(MAX_LISTED_PER_CATEGORY)];

            for (j, entry) in shown.iter().enumerate() {
                let is_last_entry = j + 1 == shown.len() && remaining == 0;
                let entry_branch = if is_last_entry { "└──" } else { "├──" };
                let marker = match entry.outcome {
                    UpdateOutcome::New => '+',
                    _ => '~',
                };
                let _ = writeln!(
                    out,
                    "{indent}{entry_branch} {marker} {}",
                    shorten(&entry.title)
                );
            }
            if remaining > 0 {
                let _ = writeln!(out, "{indent}└── ... and {remaining} more");
            }
        }

        let _ = writeln!(out, "Summary: {}", self.counts);
        out
    }
}

/// `" (2 new, 1 updated)"`, or nothing when the category had no writes.
fn badges(counts: &OutcomeCounts) -> String {
    let mut parts = Vec::new();
    if counts.new > 0 {
        parts.push(format!("{} new", counts.new));
    }
    if counts.updated > 0 {
        parts.push(format!("{} updated", counts.updated));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

fn shorten(title: &str) -> String {
    if title.chars().count() > MAX_TITLE_CHARS {
        let head: String = title.chars().take(MAX_TITLE_CHARS - 3).collect();
        format!("{head}...")
    } else {
        title.to_string()
    }
}

// ---------------------------------------------------------------------------
// Whole run
// ---------------------------------------------------------------------------

/// Reports of every source in one run, in execution order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub tools: Vec<ToolReport>,
}

impl RunReport {
    /// Outcome counts across all sources.
    pub fn totals(&self) -> OutcomeCounts {
        let mut totals = OutcomeCounts::default();
        for tool in &self.tools {
            totals += tool.counts;
        }
        totals
    }

    /// Closing line printed after the per-tool trees.
    pub fn summary_line(&self) -> String {
        format!(
            "Total: {} across {} source(s)",
            self.totals(),
            self.tools.len()
        )
    }
}

// ---------------------------------------------------------------------------
// Draft preview (no storage involved)
// ---------------------------------------------------------------------------

/// Newest drafts of one source plus per-category counts, for dry runs.
#[derive(Debug, Clone, Serialize)]
pub struct DraftPreview {
    pub tool: String,
    pub total: usize,
    /// Draft count per category, sorted by name.
    pub categories: BTreeMap<String, usize>,
    /// Newest first, at most the requested limit.
    pub newest: Vec<DraftUpdate>,
}

impl DraftPreview {
    pub fn new(tool: impl Into<String>, drafts: &[DraftUpdate], limit: usize) -> Self {
        let mut categories = BTreeMap::new();
        for draft in drafts {
            *categories.entry(draft.category().to_string()).or_insert(0) += 1;
        }

        let mut newest = drafts.to_vec();
        // Stable sort keeps page order within a day.
        newest.sort_by(|a, b| b.date.cmp(&a.date));
        newest.truncate(limit);

        Self {
            tool: tool.into(),
            total: drafts.len(),
            categories,
            newest,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "== {} preview: {} update(s) ==", self.tool, self.total);
        for draft in &self.newest {
            let _ = writeln!(out, "{}  {}", draft.date.format("%Y-%m-%d"), draft.version);
            if !draft.description.is_empty() {
                let _ = writeln!(out, "            {}", shorten(&draft.description));
            }
            let _ = writeln!(out, "            {}", draft.link);
        }
        let _ = writeln!(out, "By category:");
        for (name, count) in &self.categories {
            let _ = writeln!(out, "  {name}: {count}");
        }
        out
    }
}
