use crate::error::Result;
use crate::models::AdjacencyGraph;
use std::path::Path;
use tracing::{info, warn};

/// Reads `StateCode,NeighborStateCode` pairs into a symmetric adjacency graph.
pub struct AdjacencyReader;

impl AdjacencyReader {
    pub fn new() -> Self {
        Self
    }

    pub fn read_graph(&self, path: &Path) -> Result<AdjacencyGraph> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let mut graph = AdjacencyGraph::new();
        for (row, result) in reader.records().enumerate() {
            let record = result?;
            match (record.get(0), record.get(1)) {
                (Some(state), Some(neighbor)) if !state.is_empty() && !neighbor.is_empty() => {
                    graph.add_relation(state, neighbor);
                }
                _ => warn!(row = row + 1, "Skipping incomplete adjacency row"),
            }
        }

        info!(
            states = graph.state_count(),
            edges = graph.edge_count(),
            "Loaded state adjacency"
        );
        Ok(graph)
    }
}

impl Default for AdjacencyReader {
    fn default() -> Self {
        Self::new()
    }
}
