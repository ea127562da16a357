use crate::models::region::{Region, RegionId};
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

/// County boundaries grouped by parent area (state).
///
/// Regions within a state are held in ascending id order, which is the order
/// the station resolver searches them in.
#[derive(Debug, Clone, Default)]
pub struct RegionIndex {
    by_state: HashMap<String, Vec<Region>>,
}

impl RegionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk-load regions. Duplicate region ids within a state keep the first
    /// occurrence.
    pub fn from_regions(regions: impl IntoIterator<Item = Region>) -> Self {
        let mut by_state: HashMap<String, Vec<Region>> = HashMap::new();
        for region in regions {
            by_state.entry(region.state.clone()).or_default().push(region);
        }

        for (state, regions) in by_state.iter_mut() {
            regions.sort_by_key(|r| r.id);
            let before = regions.len();
            regions.dedup_by_key(|r| r.id);
            if regions.len() != before {
                warn!(
                    state = %state,
                    dropped = before - regions.len(),
                    "Duplicate region ids in boundary catalog"
                );
            }
        }

        Self { by_state }
    }

    /// Regions of a state; empty for states with no loaded boundaries.
    pub fn regions_in(&self, state: &str) -> &[Region] {
        self.by_state.get(state).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_state(&self, state: &str) -> bool {
        self.by_state.contains_key(state)
    }

    pub fn states(&self) -> impl Iterator<Item = &str> {
        self.by_state.keys().map(String::as_str)
    }

    pub fn region_count(&self) -> usize {
        self.by_state.values().map(Vec::len).sum()
    }

    pub fn malformed_count(&self) -> usize {
        self.by_state
            .values()
            .flatten()
            .filter(|r| !r.is_valid())
            .count()
    }

    pub fn region_ids(&self) -> BTreeSet<RegionId> {
        self.by_state.values().flatten().map(|r| r.id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.by_state.is_empty()
    }
}
