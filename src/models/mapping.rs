use crate::models::region::RegionId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Station id -> county id lookup produced by the resolver. Unresolved
/// stations are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationRegionMapping {
    stations: BTreeMap<String, RegionId>,
}

impl StationRegionMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, station_id: impl Into<String>, region: RegionId) {
        self.stations.insert(station_id.into().to_uppercase(), region);
    }

    /// Station ids are matched as stored (upper-case).
    pub fn get(&self, station_id: &str) -> Option<RegionId> {
        self.stations.get(station_id).copied()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, RegionId)> {
        self.stations.iter().map(|(id, region)| (id.as_str(), *region))
    }

    /// The region axis shared by every partition aggregated against this mapping.
    pub fn region_axis(&self) -> RegionAxis {
        RegionAxis::new(self.stations.values().copied())
    }
}

impl FromIterator<(String, RegionId)> for StationRegionMapping {
    fn from_iter<T: IntoIterator<Item = (String, RegionId)>>(iter: T) -> Self {
        let mut mapping = Self::new();
        for (station, region) in iter {
            mapping.insert(station, region);
        }
        mapping
    }
}

/// Ascending, de-duplicated region ids with an id -> index lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionAxis {
    ids: Vec<RegionId>,
    positions: HashMap<RegionId, usize>,
}

impl RegionAxis {
    pub fn new(ids: impl IntoIterator<Item = RegionId>) -> Self {
        let mut ids: Vec<RegionId> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();

        let positions = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        Self { ids, positions }
    }

    pub fn index_of(&self, region: RegionId) -> Option<usize> {
        self.positions.get(&region).copied()
    }

    pub fn ids(&self) -> &[RegionId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_normalises_ids() {
        let mut mapping = StationRegionMapping::new();
        mapping.insert("usc00010008", 1001);

        assert_eq!(mapping.get("USC00010008"), Some(1001));
        assert_eq!(mapping.get("USC99999999"), None);
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn test_region_axis_sorted_unique() {
        let mapping: StationRegionMapping = vec![
            ("S3".to_string(), 13001),
            ("S1".to_string(), 1003),
            ("S2".to_string(), 1001),
            ("S4".to_string(), 1003),
        ]
        .into_iter()
        .collect();

        let axis = mapping.region_axis();
        assert_eq!(axis.ids(), &[1001, 1003, 13001]);
        assert_eq!(axis.index_of(1003), Some(1));
        assert_eq!(axis.index_of(42), None);
    }

    #[test]
    fn test_mapping_json_is_flat() {
        let mapping: StationRegionMapping =
            vec![("USC00010008".to_string(), 1001)].into_iter().collect();

        let json = serde_json::to_string(&mapping).unwrap();
        assert_eq!(json, r#"{"USC00010008":1001}"#);

        let back: StationRegionMapping = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mapping);
    }
}
