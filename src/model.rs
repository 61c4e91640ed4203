use serde::Deserialize;

/// A participant in the call flow ("UE", "gNB", "AMF", ...).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub color: String,
}

/// One directed message between two nodes. Position in `Flow::steps` is its
/// place in the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Step {
    pub source: String,
    pub target: String,
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Flow {
    pub nodes: Vec<Node>,
    pub steps: Vec<Step>,
}

impl Flow {
    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    /// Highest valid step index, or 0 for a flow without steps.
    pub fn last_step(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    pub fn clamp_step(&self, step: usize) -> usize {
        step.min(self.last_step())
    }
}
