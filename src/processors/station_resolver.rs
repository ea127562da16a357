use crate::error::ProcessingError;
use crate::models::{AdjacencyGraph, RegionId, RegionIndex, Station, StationRegionMapping};
use crate::utils::progress::ProgressReporter;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// Neither the station's state nor any neighbour has loaded boundaries
    NoRegionsForState,
    /// Regions were searched but none contains the station
    NoContainingRegion,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedStation {
    pub station_id: String,
    pub state: String,
    pub reason: UnresolvedReason,
}

/// A malformed boundary reached while searching for a station's county.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryFailure {
    pub station_id: String,
    pub region_id: RegionId,
    pub region_state: String,
    /// Position of the region in the station's search order
    pub search_position: usize,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StationOutcome {
    Resolved(RegionId),
    Unresolved(UnresolvedReason),
    Failed(GeometryFailure),
}

#[derive(Debug, Clone, Default)]
pub struct ResolutionReport {
    pub total_stations: usize,
    pub mapping: StationRegionMapping,
    pub unresolved: Vec<UnresolvedStation>,
    pub failures: Vec<GeometryFailure>,
}

impl ResolutionReport {
    pub fn resolved_count(&self) -> usize {
        self.mapping.len()
    }

    pub fn summary(&self) -> String {
        let no_regions = self
            .unresolved
            .iter()
            .filter(|u| u.reason == UnresolvedReason::NoRegionsForState)
            .count();

        format!(
            "Station Resolution Summary:\n\
            - Stations: {}\n\
            - Resolved: {}\n\
            - Unresolved: {} ({} with no loaded boundaries)\n\
            - Geometry failures: {}\n\
            - Counties covered: {}",
            self.total_stations,
            self.resolved_count(),
            self.unresolved.len(),
            no_regions,
            self.failures.len(),
            self.mapping.region_axis().len()
        )
    }
}

/// Assigns stations to the county whose boundary contains them, searching the
/// station's own state first and then its neighbouring states.
pub struct StationResolver<'a> {
    regions: &'a RegionIndex,
    adjacency: &'a AdjacencyGraph,
}

impl<'a> StationResolver<'a> {
    pub fn new(regions: &'a RegionIndex, adjacency: &'a AdjacencyGraph) -> Self {
        Self { regions, adjacency }
    }

    /// Own state first, then neighbours in ascending code order.
    pub fn search_order<'s>(&'s self, state: &'s str) -> Vec<&'s str> {
        std::iter::once(state)
            .chain(self.adjacency.neighbors(state))
            .collect()
    }

    /// First containing region in search order wins.
    pub fn resolve_station(&self, station: &Station) -> StationOutcome {
        let point = station.location();
        let mut searched_any = false;
        let mut position = 0;

        for state in self.search_order(&station.state) {
            for region in self.regions.regions_in(state) {
                searched_any = true;
                match region.contains(&point) {
                    Ok(true) => return StationOutcome::Resolved(region.id),
                    Ok(false) => {}
                    Err(ProcessingError::MalformedGeometry { region_id, reason }) => {
                        return StationOutcome::Failed(GeometryFailure {
                            station_id: station.id.clone(),
                            region_id,
                            region_state: region.state.clone(),
                            search_position: position,
                            reason,
                        });
                    }
                    Err(e) => {
                        return StationOutcome::Failed(GeometryFailure {
                            station_id: station.id.clone(),
                            region_id: region.id,
                            region_state: region.state.clone(),
                            search_position: position,
                            reason: e.to_string(),
                        });
                    }
                }
                position += 1;
            }
        }

        if searched_any {
            StationOutcome::Unresolved(UnresolvedReason::NoContainingRegion)
        } else {
            StationOutcome::Unresolved(UnresolvedReason::NoRegionsForState)
        }
    }

    /// Resolve every station in parallel. The report is independent of scheduling.
    pub fn resolve(
        &self,
        stations: &[Station],
        progress: Option<&ProgressReporter>,
    ) -> ResolutionReport {
        let processed = AtomicUsize::new(0);

        if let Some(p) = progress {
            p.set_message(&format!("Resolving {} stations...", stations.len()));
        }

        let outcomes: Vec<StationOutcome> = stations
            .par_iter()
            .map(|station| {
                let outcome = self.resolve_station(station);

                let count = processed.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(p) = progress {
                    p.update(count as u64);
                }

                outcome
            })
            .collect();

        let mut report = ResolutionReport {
            total_stations: stations.len(),
            ..Default::default()
        };

        for (station, outcome) in stations.iter().zip(outcomes) {
            match outcome {
                StationOutcome::Resolved(region) => report.mapping.insert(station.id.clone(), region),
                StationOutcome::Unresolved(reason) => {
                    debug!(station = %station.id, state = %station.state, ?reason, "No county match, skipping");
                    report.unresolved.push(UnresolvedStation {
                        station_id: station.id.clone(),
                        state: station.state.clone(),
                        reason,
                    });
                }
                StationOutcome::Failed(failure) => {
                    warn!(
                        station = %failure.station_id,
                        region = failure.region_id,
                        region_state = %failure.region_state,
                        position = failure.search_position,
                        reason = %failure.reason,
                        "Malformed county geometry, station left unresolved"
                    );
                    report.failures.push(failure);
                }
            }
        }

        info!(
            resolved = report.resolved_count(),
            unresolved = report.unresolved.len(),
            failures = report.failures.len(),
            "Station resolution complete"
        );

        if let Some(p) = progress {
            p.finish_with_message(&format!("Resolved {} stations", report.resolved_count()));
        }

        report
    }
}

/// Resolve `stations` against the county index with state-adjacency fallback.
pub fn resolve(
    stations: &[Station],
    regions: &RegionIndex,
    adjacency: &AdjacencyGraph,
) -> ResolutionReport {
    StationResolver::new(regions, adjacency).resolve(stations, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Region;
    use geo::{polygon, MultiPolygon};

    fn square(id: RegionId, state: &str, x0: f64, y0: f64) -> Region {
        Region::new(
            id,
            state,
            MultiPolygon::new(vec![polygon![
                (x: x0, y: y0),
                (x: x0 + 1.0, y: y0),
                (x: x0 + 1.0, y: y0 + 1.0),
                (x: x0, y: y0 + 1.0),
            ]]),
        )
    }

    // Station coordinates are (lat, lon) = (y, x).
    fn station(id: &str, state: &str, x: f64, y: f64) -> Station {
        Station::new(id, state, y, x)
    }

    #[test]
    fn test_resolves_within_own_state() {
        let index = RegionIndex::from_regions(vec![square(1, "AA", 0.0, 0.0), square(2, "AA", 1.0, 0.0)]);
        let graph = AdjacencyGraph::new();
        let resolver = StationResolver::new(&index, &graph);

        assert_eq!(resolver.resolve_station(&station("S1", "AA", 0.5, 0.5)), StationOutcome::Resolved(1));
        assert_eq!(resolver.resolve_station(&station("S2", "AA", 1.5, 0.5)), StationOutcome::Resolved(2));
    }

    #[test]
    fn test_falls_back_to_neighbouring_state() {
        // Station labelled AA but located in BB's county
        let index = RegionIndex::from_regions(vec![square(1, "AA", 0.0, 0.0), square(2, "BB", 5.0, 0.0)]);
        let graph = AdjacencyGraph::from_relations(vec![("AA", "BB")]);
        let resolver = StationResolver::new(&index, &graph);

        assert_eq!(resolver.resolve_station(&station("S1", "AA", 5.5, 0.5)), StationOutcome::Resolved(2));
    }

    #[test]
    fn test_state_without_regions_uses_neighbours() {
        let index = RegionIndex::from_regions(vec![square(3, "Y", 0.0, 0.0)]);
        let graph = AdjacencyGraph::from_relations(vec![("X", "Y")]);
        let resolver = StationResolver::new(&index, &graph);

        assert_eq!(resolver.resolve_station(&station("S2", "X", 0.5, 0.5)), StationOutcome::Resolved(3));
    }

    #[test]
    fn test_unresolved_reasons() {
        let index = RegionIndex::from_regions(vec![square(1, "AA", 0.0, 0.0)]);
        let graph = AdjacencyGraph::new();
        let resolver = StationResolver::new(&index, &graph);

        assert_eq!(
            resolver.resolve_station(&station("S1", "AA", 9.0, 9.0)),
            StationOutcome::Unresolved(UnresolvedReason::NoContainingRegion)
        );
        assert_eq!(
            resolver.resolve_station(&station("S2", "PR", 0.5, 0.5)),
            StationOutcome::Unresolved(UnresolvedReason::NoRegionsForState)
        );
    }

    #[test]
    fn test_non_adjacent_states_are_not_searched() {
        let index = RegionIndex::from_regions(vec![square(1, "AA", 0.0, 0.0), square(2, "CC", 5.0, 0.0)]);
        let graph = AdjacencyGraph::from_relations(vec![("AA", "BB")]);
        let resolver = StationResolver::new(&index, &graph);

        assert_eq!(
            resolver.resolve_station(&station("S1", "AA", 5.5, 0.5)),
            StationOutcome::Unresolved(UnresolvedReason::NoContainingRegion)
        );
    }

    #[test]
    fn test_malformed_geometry_fails_station_only() {
        let index = RegionIndex::from_regions(vec![
            Region::malformed(1, "AA", "ring has 2 positions"),
            square(2, "BB", 0.0, 0.0),
        ]);
        let graph = AdjacencyGraph::new();
        let stations = vec![station("S1", "AA", 0.5, 0.5), station("S2", "BB", 0.5, 0.5)];

        let report = resolve(&stations, &index, &graph);

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].station_id, "S1");
        assert_eq!(report.failures[0].region_id, 1);
        assert_eq!(report.failures[0].search_position, 0);
        assert_eq!(report.mapping.get("S2"), Some(2));
        assert_eq!(report.mapping.get("S1"), None);
    }

    #[test]
    fn test_malformed_neighbour_region_reports_its_state() {
        // Own state has a valid county that misses the station; the neighbour's is broken
        let index = RegionIndex::from_regions(vec![
            square(1, "X", 0.0, 0.0),
            Region::malformed(7, "Y", "ring is not closed"),
        ]);
        let graph = AdjacencyGraph::from_relations(vec![("X", "Y")]);
        let resolver = StationResolver::new(&index, &graph);

        match resolver.resolve_station(&station("S1", "X", 5.5, 0.5)) {
            StationOutcome::Failed(failure) => {
                assert_eq!(failure.station_id, "S1");
                assert_eq!(failure.region_id, 7);
                assert_eq!(failure.region_state, "Y");
                assert_eq!(failure.search_position, 1);
            }
            other => panic!("expected geometry failure, got {:?}", other),
        }
    }

    #[test]
    fn test_first_match_wins_on_overlap() {
        let index = RegionIndex::from_regions(vec![square(5, "AA", 0.0, 0.0), square(4, "AA", 0.0, 0.0)]);
        let graph = AdjacencyGraph::new();
        let resolver = StationResolver::new(&index, &graph);

        // Regions are searched in ascending id order
        assert_eq!(resolver.resolve_station(&station("S1", "AA", 0.5, 0.5)), StationOutcome::Resolved(4));
    }

    #[test]
    fn test_report_counts() {
        let index = RegionIndex::from_regions(vec![square(1, "AA", 0.0, 0.0)]);
        let graph = AdjacencyGraph::new();
        let stations = vec![
            station("S1", "AA", 0.5, 0.5),
            station("S2", "AA", 3.0, 3.0),
            station("S3", "GU", 0.5, 0.5),
        ];

        let report = resolve(&stations, &index, &graph);

        assert_eq!(report.total_stations, 3);
        assert_eq!(report.resolved_count(), 1);
        assert_eq!(report.unresolved.len(), 2);
        assert_eq!(report.unresolved[0].station_id, "S2");
        assert!(report.summary().contains("Resolved: 1"));
    }
}
