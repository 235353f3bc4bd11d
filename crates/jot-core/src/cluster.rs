//! Cluster detection: deciding which marker runs count as metadata.

use crate::marker::MarkerKind;

/// A maximal contiguous run of marker tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cluster {
    /// Index of the first token in the run.
    pub start: usize,
    /// Index one past the last token in the run.
    pub end: usize,
    /// The run begins at the first token of the input.
    pub touches_start: bool,
    /// The run ends at the last token of the input.
    pub touches_end: bool,
}

impl Cluster {
    /// Whether this run counts as metadata.
    ///
    /// A run is valid only when anchored to an edge of the input. Runs are
    /// maximal, so a run that would chain to an edge through adjacent marker
    /// runs is already part of that run; transitive anchoring reduces to
    /// touching index 0 or the final index.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.touches_start || self.touches_end
    }

    /// Whether `index` falls inside this run.
    #[must_use]
    pub const fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }
}

/// Finds every maximal marker run, valid or not.
pub fn marker_runs(kinds: &[MarkerKind]) -> Vec<Cluster> {
    let mut runs = Vec::new();
    let mut i = 0;
    while i < kinds.len() {
        if kinds[i].is_marker() {
            let start = i;
            while i < kinds.len() && kinds[i].is_marker() {
                i += 1;
            }
            runs.push(Cluster {
                start,
                end: i,
                touches_start: start == 0,
                touches_end: i == kinds.len(),
            });
        } else {
            i += 1;
        }
    }
    runs
}

/// Finds the marker runs that count as metadata.
///
/// Runs stranded mid-sentence (`walk #work the dog`) are discarded; their
/// tokens stay in the cleaned content as ordinary words. An input that is
/// nothing but markers is one run touching both edges.
pub fn find_valid_clusters(kinds: &[MarkerKind]) -> Vec<Cluster> {
    marker_runs(kinds)
        .into_iter()
        .filter(Cluster::is_valid)
        .collect()
}
