//! Dependency graph diagnostics.
//!
//! A [`DependencyGraph`] is collected depth-first from a set of root actions
//! and rendered as Graphviz `dot` text. Each node is colored by its
//! [`Readiness`]:
//!
//! - **satisfied** (`green`): the action and all its dependencies, transitively
//! - **runnable** (`orange`): not satisfied, but every dependency is
//! - **blocked** (`red`): otherwise
//!
//! Collection visits each action once, so diamonds produce one node. Cycles
//! are not rejected while collecting; readiness evaluation reports them as
//! [`GraphError::Cycle`].

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use thiserror::Error;

use crate::action::{ActionError, ActionId, ActionRef};

#[derive(Debug, Error)]
pub enum GraphError {
  #[error("dependency cycle detected at {action}")]
  Cycle { action: String },

  #[error(transparent)]
  Action(ActionError),
}

impl From<ActionError> for GraphError {
  fn from(err: ActionError) -> Self {
    match err {
      ActionError::Cycle { action } => GraphError::Cycle { action },
      other => GraphError::Action(other),
    }
  }
}

/// Readiness of an action, for visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
  Satisfied,
  Runnable,
  Blocked,
}

impl Readiness {
  pub fn color(self) -> &'static str {
    match self {
      Readiness::Satisfied => "green",
      Readiness::Runnable => "orange",
      Readiness::Blocked => "red",
    }
  }
}

impl fmt::Display for Readiness {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Readiness::Satisfied => write!(f, "satisfied"),
      Readiness::Runnable => write!(f, "runnable"),
      Readiness::Blocked => write!(f, "blocked"),
    }
  }
}

/// Actions reachable from a set of roots, with edges from each dependency
/// to its dependent.
pub struct DependencyGraph {
  graph: DiGraph<ActionRef, ()>,
  nodes: HashMap<ActionId, NodeIndex>,
  visit_order: Vec<ActionId>,
}

impl DependencyGraph {
  pub fn from_roots<'a>(roots: impl IntoIterator<Item = &'a ActionRef>) -> Self {
    let mut graph = Self {
      graph: DiGraph::new(),
      nodes: HashMap::new(),
      visit_order: Vec::new(),
    };
    for root in roots {
      graph.visit(root);
    }
    graph
  }

  fn visit(&mut self, action: &ActionRef) -> NodeIndex {
    if let Some(&index) = self.nodes.get(&action.id()) {
      return index;
    }

    let index = self.graph.add_node(ActionRef::clone(action));
    self.nodes.insert(action.id(), index);
    self.visit_order.push(action.id());

    for dependency in action.dependencies().iter() {
      let dependency_index = self.visit(dependency);
      self.graph.update_edge(dependency_index, index, ());
    }

    index
  }

  pub fn node_count(&self) -> usize {
    self.graph.node_count()
  }

  pub fn edge_count(&self) -> usize {
    self.graph.edge_count()
  }

  /// Action ids in the order they were first reached.
  pub fn visit_order(&self) -> &[ActionId] {
    &self.visit_order
  }

  pub fn actions(&self) -> impl Iterator<Item = &ActionRef> {
    self.graph.node_weights()
  }

  /// Direct dependents of `action` within the graph.
  pub fn dependents(&self, action: ActionId) -> Vec<ActionRef> {
    let Some(&index) = self.nodes.get(&action) else {
      return Vec::new();
    };
    self
      .graph
      .neighbors_directed(index, Direction::Outgoing)
      .map(|n| ActionRef::clone(&self.graph[n]))
      .collect()
  }

  /// Classify every action in the graph.
  pub fn readiness(&self) -> Result<HashMap<ActionId, Readiness>, GraphError> {
    let mut memo = HashMap::new();
    let mut in_progress = HashSet::new();
    let mut readiness = HashMap::new();

    for action in self.graph.node_weights() {
      let state = if action.satisfied_recursively(&mut memo, &mut in_progress)? {
        Readiness::Satisfied
      } else {
        let mut runnable = true;
        for dependency in action.dependencies().iter() {
          if !dependency.satisfied_recursively(&mut memo, &mut in_progress)? {
            runnable = false;
            break;
          }
        }
        if runnable { Readiness::Runnable } else { Readiness::Blocked }
      };
      readiness.insert(action.id(), state);
    }

    Ok(readiness)
  }

  /// Node and edge declarations, deduplicated and sorted.
  pub fn lines(&self) -> Result<BTreeSet<String>, GraphError> {
    let readiness = self.readiness()?;
    let mut lines = BTreeSet::new();

    for index in self.graph.node_indices() {
      let action = &self.graph[index];
      let state = readiness.get(&action.id()).copied().unwrap_or(Readiness::Blocked);
      lines.insert(format!(
        "  \"{}\"[ shape=box, style=filled, color={} ];",
        escape(&action.name_for_graph()),
        state.color()
      ));
    }

    for edge in self.graph.raw_edges() {
      let dependency = &self.graph[edge.source()];
      let dependent = &self.graph[edge.target()];
      lines.insert(format!(
        "  \"{}\" -> \"{}\";",
        escape(&dependency.name_for_graph()),
        escape(&dependent.name_for_graph())
      ));
    }

    Ok(lines)
  }

  /// The graph as `dot` text.
  pub fn render(&self) -> Result<String, GraphError> {
    let mut text = String::from("digraph dependency_graph {\n  splines=ortho\n");
    for line in self.lines()? {
      text.push_str(&line);
      text.push('\n');
    }
    text.push_str("}\n");
    Ok(text)
  }
}

fn escape(name: &str) -> String {
  name.replace('\\', "\\\\").replace('"', "\\\"")
}
