//! Merge plan: the flattened, ordered page list of the output document
//!
//! Page numbers are assigned once over this list, never per source document.

/// Which input a page comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceRef {
    Main,
    /// Zero-based position in the user's trial list
    Trial(usize),
}

/// One page of the output document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanEntry {
    /// Page `index` (zero-based) of an input document
    Original { source: SourceRef, index: usize },
    /// Synthesized cover preceding trial `trial`
    Cover { trial: usize, label: String },
}

impl PlanEntry {
    pub fn is_cover(&self) -> bool {
        matches!(self, PlanEntry::Cover { .. })
    }
}

/// A trial as seen by the planner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialPages {
    pub label: String,
    pub page_count: usize,
}

impl TrialPages {
    pub fn new(label: impl Into<String>, page_count: usize) -> Self {
        Self {
            label: label.into(),
            page_count,
        }
    }
}

/// Ordered output pages plus the resolved total
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan {
    entries: Vec<PlanEntry>,
    cover_positions: Vec<usize>,
}

impl MergePlan {
    /// Main pages first, then for each trial in order its cover and its pages
    pub fn build(main_pages: usize, trials: &[TrialPages]) -> Self {
        let capacity = main_pages
            + trials.iter().map(|t| t.page_count + 1).sum::<usize>();
        let mut entries = Vec::with_capacity(capacity);
        let mut cover_positions = Vec::with_capacity(trials.len());

        entries.extend((0..main_pages).map(|index| PlanEntry::Original {
            source: SourceRef::Main,
            index,
        }));

        for (trial, pages) in trials.iter().enumerate() {
            entries.push(PlanEntry::Cover {
                trial,
                label: pages.label.clone(),
            });
            cover_positions.push(entries.len());
            entries.extend((0..pages.page_count).map(|index| PlanEntry::Original {
                source: SourceRef::Trial(trial),
                index,
            }));
        }

        Self {
            entries,
            cover_positions,
        }
    }

    pub fn total_pages(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    /// 1-based page number of the cover for `trial`
    pub fn cover_position(&self, trial: usize) -> Option<usize> {
        self.cover_positions.get(trial).copied()
    }

    /// 1-based cover page numbers in trial order
    pub fn cover_positions(&self) -> &[usize] {
        &self.cover_positions
    }

    /// Entries paired with their 1-based page number
    pub fn numbered(&self) -> impl Iterator<Item = (usize, &PlanEntry)> + '_ {
        self.entries.iter().enumerate().map(|(i, e)| (i + 1, e))
    }
}
