use std::collections::{BTreeSet, HashMap};

/// Undirected adjacency between parent areas (states).
#[derive(Debug, Clone, Default)]
pub struct AdjacencyGraph {
    neighbors: HashMap<String, BTreeSet<String>>,
}

impl AdjacencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_relations<A, B>(relations: impl IntoIterator<Item = (A, B)>) -> Self
    where
        A: Into<String>,
        B: Into<String>,
    {
        let mut graph = Self::new();
        for (a, b) in relations {
            graph.add_relation(a, b);
        }
        graph
    }

    /// Insert `a <-> b`. Repeated relations are idempotent; a state is never
    /// its own neighbour.
    pub fn add_relation(&mut self, a: impl Into<String>, b: impl Into<String>) {
        let (a, b) = (a.into(), b.into());
        if a == b {
            return;
        }
        self.neighbors.entry(a.clone()).or_default().insert(b.clone());
        self.neighbors.entry(b).or_default().insert(a);
    }

    /// Neighbours in ascending code order; empty for unknown states.
    pub fn neighbors(&self, state: &str) -> impl Iterator<Item = &str> {
        self.neighbors
            .get(state)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    pub fn are_adjacent(&self, a: &str, b: &str) -> bool {
        self.neighbors.get(a).is_some_and(|n| n.contains(b))
    }

    pub fn state_count(&self) -> usize {
        self.neighbors.len()
    }

    pub fn edge_count(&self) -> usize {
        self.neighbors.values().map(BTreeSet::len).sum::<usize>() / 2
    }
}
