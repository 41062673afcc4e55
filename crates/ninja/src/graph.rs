//! Dependency graph over declared build edges.
//!
//! Ninja itself only discovers duplicate producers and cycles when it loads
//! the file. Building the graph up front lets the generator refuse to write a
//! file Ninja would reject, and lets callers inspect which edges may run in
//! parallel.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::error::NinjaError;
use crate::types::Edge;

/// A DAG of build edges, connected producer -> consumer.
pub struct BuildGraph {
  /// Node weight is the index into `edges`.
  graph: DiGraph<usize, ()>,

  /// Map from output path to the node producing it.
  producers: HashMap<String, NodeIndex>,

  edges: Vec<Edge>,
}

impl BuildGraph {
  /// Build the graph from edges in declaration order.
  ///
  /// # Errors
  ///
  /// Returns `DuplicateOutput` when two edges claim one output and `Cycle`
  /// when the edges depend on each other.
  pub fn from_edges(edges: &[Edge]) -> Result<Self, NinjaError> {
    let mut graph = DiGraph::new();
    let mut producers = HashMap::new();

    // First pass: one node per edge, indexed by every output
    for (i, edge) in edges.iter().enumerate() {
      let idx = graph.add_node(i);
      for output in &edge.outputs {
        if producers.insert(output.clone(), idx).is_some() {
          return Err(NinjaError::DuplicateOutput(output.clone()));
        }
      }
    }

    // Second pass: connect producers of inputs to their consumers.
    // Inputs without a producer are source files.
    for (i, edge) in edges.iter().enumerate() {
      let consumer = NodeIndex::new(i);
      for input in &edge.inputs {
        if let Some(&producer) = producers.get(input) {
          if producer == consumer {
            return Err(NinjaError::Cycle(input.clone()));
          }
          graph.update_edge(producer, consumer, ());
        }
      }
    }

    let built = Self {
      graph,
      producers,
      edges: edges.to_vec(),
    };
    built.verify_acyclic()?;
    Ok(built)
  }

  fn verify_acyclic(&self) -> Result<(), NinjaError> {
    toposort(&self.graph, None).map_err(|cycle| {
      let edge = &self.edges[self.graph[cycle.node_id()]];
      NinjaError::Cycle(edge.outputs.first().cloned().unwrap_or_default())
    })?;
    Ok(())
  }

  pub fn len(&self) -> usize {
    self.edges.len()
  }

  pub fn is_empty(&self) -> bool {
    self.edges.is_empty()
  }

  /// Edges whose outputs the edge producing `path` directly consumes.
  pub fn dependencies(&self, path: &str) -> Vec<&Edge> {
    let Some(&idx) = self.producers.get(path) else {
      return Vec::new();
    };

    let mut deps: Vec<usize> = self
      .graph
      .neighbors_directed(idx, Direction::Incoming)
      .map(|dep| self.graph[dep])
      .collect();
    deps.sort_unstable();
    deps.into_iter().map(|i| &self.edges[i]).collect()
  }

  /// Group edges into waves that Ninja may run in parallel.
  ///
  /// Every edge in a wave only depends on edges in earlier waves.
  pub fn waves(&self) -> Vec<Vec<&Edge>> {
    let mut in_degree: Vec<usize> = self
      .graph
      .node_indices()
      .map(|idx| self.graph.neighbors_directed(idx, Direction::Incoming).count())
      .collect();
    let mut done = vec![false; in_degree.len()];
    let mut waves = Vec::new();

    loop {
      let ready: Vec<NodeIndex> = self
        .graph
        .node_indices()
        .filter(|idx| !done[idx.index()] && in_degree[idx.index()] == 0)
        .collect();

      // Acyclicity was verified on construction, so an empty wave means we are done
      if ready.is_empty() {
        break;
      }

      for &idx in &ready {
        done[idx.index()] = true;
        for dependent in self.graph.neighbors_directed(idx, Direction::Outgoing) {
          in_degree[dependent.index()] = in_degree[dependent.index()].saturating_sub(1);
        }
      }

      waves.push(ready.into_iter().map(|idx| &self.edges[self.graph[idx]]).collect());
    }

    waves
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn chain(prefix: &str) -> Vec<Edge> {
    vec![
      Edge::new("init").output(format!("{prefix}/local.conf")).input("src.stamp"),
      Edge::new("layers")
        .output(format!("{prefix}/layers.stamp"))
        .input(format!("{prefix}/local.conf")),
      Edge::new("build")
        .output(format!("{prefix}/image.wic"))
        .input(format!("{prefix}/layers.stamp")),
    ]
  }

  #[test]
  fn source_files_have_no_dependencies() {
    let graph = BuildGraph::from_edges(&chain("a")).unwrap();
    assert_eq!(graph.len(), 3);
    assert!(graph.dependencies("src.stamp").is_empty());
  }

  #[test]
  fn dependencies_follow_inputs() {
    let graph = BuildGraph::from_edges(&chain("a")).unwrap();
    let deps = graph.dependencies("a/image.wic");
    assert_eq!(deps.len(), 1);
    assert_eq!(deps[0].rule, "layers");
    assert!(graph.dependencies("a/local.conf").is_empty());
  }

  #[test]
  fn duplicate_output_is_rejected() {
    let mut edges = chain("a");
    edges.push(Edge::new("other").output("a/image.wic"));

    let err = BuildGraph::from_edges(&edges).err().unwrap();
    assert_eq!(err, NinjaError::DuplicateOutput("a/image.wic".to_string()));
  }

  #[test]
  fn cycle_is_rejected() {
    let edges = vec![
      Edge::new("x").output("one").input("two"),
      Edge::new("y").output("two").input("one"),
    ];
    assert!(matches!(BuildGraph::from_edges(&edges), Err(NinjaError::Cycle(_))));
  }

  #[test]
  fn self_dependency_is_a_cycle() {
    let edges = vec![Edge::new("x").output("one").input("one")];
    assert_eq!(
      BuildGraph::from_edges(&edges).err().unwrap(),
      NinjaError::Cycle("one".to_string())
    );
  }

  #[test]
  fn independent_chains_share_waves() {
    let mut edges = chain("a");
    edges.extend(chain("b"));
    let graph = BuildGraph::from_edges(&edges).unwrap();

    let waves = graph.waves();
    assert_eq!(waves.len(), 3);
    for wave in &waves {
      assert_eq!(wave.len(), 2);
      assert_eq!(wave[0].rule, wave[1].rule);
    }
  }
}
