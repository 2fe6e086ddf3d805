use std::collections::{HashMap, HashSet};

use log::debug;
use serde::Deserialize;

use crate::error::GraphError;
use crate::scenario::node::ScenarioNode;

pub const DEFAULT_START_NODE_ID: &str = "start";

fn default_start() -> String {
    DEFAULT_START_NODE_ID.into()
}

/// On-disk shape of a scenario. Nodes are listed in authoring order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDocument {
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_start")]
    pub start_node_id: String,
    pub nodes: Vec<ScenarioNode>,
}

/// The full scenario graph: a map of node-id -> ScenarioNode.
///
/// Only constructed through [`ScenarioGraph::from_document`], which checks
/// referential closure, so every `next_node_id` in a built graph resolves.
/// There are no mutating operations; share it behind an `Arc` between episodes.
#[derive(Debug, Clone)]
pub struct ScenarioGraph {
    title: String,
    nodes: HashMap<String, ScenarioNode>,
    start_node_id: String,
}

impl ScenarioGraph {
    pub fn from_json(source: &str) -> Result<Self, GraphError> {
        let document: ScenarioDocument = serde_json::from_str(source)?;
        Self::from_document(document)
    }

    pub fn from_document(document: ScenarioDocument) -> Result<Self, GraphError> {
        let ScenarioDocument {
            title,
            start_node_id,
            nodes: list,
        } = document;

        let mut nodes = HashMap::with_capacity(list.len());
        let mut order = Vec::with_capacity(list.len());
        for node in list {
            if nodes.contains_key(&node.id) {
                return Err(GraphError::DuplicateNode { id: node.id });
            }
            order.push(node.id.clone());
            nodes.insert(node.id.clone(), node);
        }

        if !nodes.contains_key(&start_node_id) {
            return Err(GraphError::MissingStart { id: start_node_id });
        }
        if nodes[&start_node_id].is_terminal {
            return Err(GraphError::TerminalStart { id: start_node_id });
        }

        // Walk in authoring order so the first defect reported is stable.
        for id in &order {
            validate_node(&nodes[id], &nodes)?;
        }

        debug!(
            "Loaded scenario '{}' ({} nodes, start={})",
            title,
            nodes.len(),
            start_node_id
        );

        Ok(Self {
            title,
            nodes,
            start_node_id,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn start_node_id(&self) -> &str {
        &self.start_node_id
    }

    pub fn start_node(&self) -> &ScenarioNode {
        self.nodes
            .get(&self.start_node_id)
            .expect("start node is checked at construction")
    }

    pub fn get(&self, id: &str) -> Option<&ScenarioNode> {
        self.nodes.get(id)
    }

    /// Like [`get`](Self::get), but a missing id is a [`GraphError::NotFound`].
    pub fn node(&self, id: &str) -> Result<&ScenarioNode, GraphError> {
        self.nodes
            .get(id)
            .ok_or_else(|| GraphError::NotFound { id: id.to_string() })
    }

    pub fn is_terminal(&self, node: &ScenarioNode) -> bool {
        node.is_terminal
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ScenarioNode> {
        self.nodes.values()
    }

    /// Ids of every terminal node, sorted.
    pub fn terminals(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .nodes
            .values()
            .filter(|n| n.is_terminal)
            .map(|n| n.id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Number of choices on the longest path from the start node to a
    /// terminal node (the most decisions a player can make in one episode).
    /// A back edge onto the current path contributes nothing.
    pub fn longest_path(&self) -> usize {
        let mut on_path = HashSet::new();
        self.longest_path_from(&self.start_node_id, &mut on_path)
    }

    fn longest_path_from<'a>(&'a self, node_id: &'a str, on_path: &mut HashSet<&'a str>) -> usize {
        let node = match self.nodes.get(node_id) {
            Some(n) => n,
            None => return 0,
        };
        if node.is_terminal || !on_path.insert(node_id) {
            return 0;
        }
        let max_child = node
            .choices
            .iter()
            .filter_map(|c| c.next_node_id.as_deref())
            .map(|id| self.longest_path_from(id, on_path))
            .max()
            .unwrap_or(0);
        on_path.remove(node_id);
        1 + max_child
    }
}

fn validate_node(
    node: &ScenarioNode,
    nodes: &HashMap<String, ScenarioNode>,
) -> Result<(), GraphError> {
    if !node.is_terminal && node.choices.is_empty() {
        return Err(GraphError::EmptyChoices {
            id: node.id.clone(),
        });
    }

    let mut seen = HashSet::new();
    for choice in &node.choices {
        if !seen.insert(choice.id.as_str()) {
            return Err(GraphError::DuplicateChoice {
                node_id: node.id.clone(),
                choice_id: choice.id.clone(),
            });
        }
        if choice.confidence_level > 10 {
            return Err(GraphError::ConfidenceOutOfRange {
                node_id: node.id.clone(),
                choice_id: choice.id.clone(),
                level: choice.confidence_level,
            });
        }
        match &choice.next_node_id {
            Some(next) if !nodes.contains_key(next) => {
                return Err(GraphError::NotFound { id: next.clone() });
            }
            Some(_) => {}
            None if !node.is_terminal => {
                return Err(GraphError::MissingNext {
                    node_id: node.id.clone(),
                    choice_id: choice.id.clone(),
                });
            }
            None => {}
        }
    }

    Ok(())
}
