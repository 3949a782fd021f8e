//! In-memory bin collection refreshed from the backend.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::model::{Bin, BinId, BinSnapshot, BinStatus, SystemStats};

/// Priority above which a bin counts as high priority.
pub const HIGH_PRIORITY_THRESHOLD: f64 = 0.7;
/// Fill level from which a bin counts as critical.
pub const CRITICAL_FILL_LEVEL: f64 = 90.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
/// Display statistics derived from the current bin list.
pub struct RegistryStats {
    /// Number of bins.
    pub total: usize,
    /// Bins above [`HIGH_PRIORITY_THRESHOLD`].
    pub high_priority: usize,
    /// Bins at or above [`CRITICAL_FILL_LEVEL`].
    pub critical: usize,
    /// Mean fill level, 0 for an empty list.
    pub average_fill: f64,
}

impl RegistryStats {
    fn derive(bins: &[Bin]) -> Self {
        let total = bins.len();
        let high_priority = bins
            .iter()
            .filter(|bin| bin.priority_score > HIGH_PRIORITY_THRESHOLD)
            .count();
        let critical = bins
            .iter()
            .filter(|bin| bin.fill_level >= CRITICAL_FILL_LEVEL)
            .count();
        let average_fill = if bins.is_empty() {
            0.0
        } else {
            #[expect(clippy::cast_precision_loss, reason = "bin counts are small")]
            let count = total as f64;
            bins.iter().map(|bin| bin.fill_level).sum::<f64>() / count
        };
        Self {
            total,
            high_priority,
            critical,
            average_fill,
        }
    }
}

/// Bin collection with a single current selection.
///
/// Refreshes replace the whole collection at once, so readers see either the
/// old or the new list.
#[derive(Debug, Default)]
pub struct BinRegistry {
    bins: Vec<Bin>,
    system_stats: Option<SystemStats>,
    stats: RegistryStats,
    selected: Option<BinId>,
    provisional: HashSet<BinId>,
}

impl BinRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the collection with an authoritative snapshot.
    ///
    /// Drops every provisional patch and clears the selection if the selected
    /// bin disappeared.
    pub fn replace(&mut self, snapshot: BinSnapshot) {
        self.stats = RegistryStats::derive(&snapshot.bins);
        self.bins = snapshot.bins;
        self.system_stats = snapshot.system_stats;
        self.provisional.clear();
        if let Some(selected) = &self.selected
            && self.get(selected).is_none()
        {
            debug!(bin_id = %selected, "selected bin vanished after refresh");
            self.selected = None;
        }
        info!(
            count = self.stats.total,
            high_priority = self.stats.high_priority,
            critical = self.stats.critical,
            "bin registry refreshed"
        );
    }

    /// All bins in backend order.
    #[must_use]
    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    /// Look up a bin by id.
    #[must_use]
    pub fn get(&self, id: &BinId) -> Option<&Bin> {
        self.bins.iter().find(|bin| &bin.id == id)
    }

    /// Statistics derived from the current list.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        self.stats
    }

    /// Statistics reported by the backend with the last refresh.
    #[must_use]
    pub fn system_stats(&self) -> Option<&SystemStats> {
        self.system_stats.as_ref()
    }

    /// Set or clear the current selection.
    ///
    /// Selecting an id that is not in the collection does nothing.
    pub fn select(&mut self, id: Option<&BinId>) {
        match id {
            None => self.selected = None,
            Some(id) if self.get(id).is_some() => self.selected = Some(id.clone()),
            Some(id) => debug!(bin_id = %id, "ignoring selection of unknown bin"),
        }
    }

    /// Currently selected bin id.
    #[must_use]
    pub fn selected_id(&self) -> Option<&BinId> {
        self.selected.as_ref()
    }

    /// Currently selected bin.
    #[must_use]
    pub fn selected(&self) -> Option<&Bin> {
        self.selected.as_ref().and_then(|id| self.get(id))
    }

    /// Bins ordered by descending priority score, ties in backend order.
    ///
    /// The returned iterator is lazy and can be cloned to restart it.
    pub fn sorted_by_priority(&self) -> impl Iterator<Item = &Bin> + Clone + '_ {
        let mut order: Vec<usize> = (0..self.bins.len()).collect();
        // sort_by is stable, which keeps insertion order for equal scores
        order.sort_by(|&left, &right| {
            let left_score = self.bins.get(left).map_or(0.0, |bin| bin.priority_score);
            let right_score = self.bins.get(right).map_or(0.0, |bin| bin.priority_score);
            right_score.total_cmp(&left_score)
        });
        order.into_iter().filter_map(move |index| self.bins.get(index))
    }

    /// Locally mark a bin as collected until the next refresh.
    ///
    /// Returns `false` when the bin is unknown.
    pub fn apply_collection_patch(&mut self, id: &BinId) -> bool {
        let Some(bin) = self.bins.iter_mut().find(|bin| &bin.id == id) else {
            return false;
        };
        bin.fill_level = 0.0;
        bin.status = BinStatus::Normal;
        self.provisional.insert(id.clone());
        self.stats = RegistryStats::derive(&self.bins);
        true
    }

    /// Whether the bin carries a local patch not yet confirmed by the backend.
    #[must_use]
    pub fn is_provisional(&self, id: &BinId) -> bool {
        self.provisional.contains(id)
    }
}
