use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::DataIntegrityError;

pub type NodeId = u32;
pub type AssignmentId = u32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: NodeId,
    pub name: String,
    /// Cluster label, starting at 1.
    pub group: u32,
}

/// Strength or free-form label attached to an interaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InteractionWeight {
    Strength(f64),
    Label(String),
}

impl Default for InteractionWeight {
    fn default() -> Self {
        Self::Strength(1.0)
    }
}

impl InteractionWeight {
    /// Numeric weight, if the value is a number or a label that parses as one.
    pub fn strength(&self) -> Option<f64> {
        match self {
            Self::Strength(value) => Some(*value),
            Self::Label(label) => label.trim().parse::<f64>().ok(),
        }
    }
}

/// Undirected edge between two users, tagged with the assignment it happened in.
#[derive(Clone, Debug, PartialEq)]
pub struct Interaction {
    pub source: NodeId,
    pub target: NodeId,
    pub assignment_id: AssignmentId,
    pub weight: InteractionWeight,
}

impl Interaction {
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assignment {
    pub id: AssignmentId,
    pub title: String,
}

/// Validated, immutable interaction graph.
#[derive(Clone, Debug)]
pub struct SocialGraph {
    users: Vec<User>,
    interactions: Vec<Interaction>,
    assignments: Vec<Assignment>,
    index_by_id: HashMap<NodeId, usize>,
}

impl SocialGraph {
    pub fn new(
        users: Vec<User>,
        interactions: Vec<Interaction>,
        assignments: Vec<Assignment>,
    ) -> Result<Self, DataIntegrityError> {
        let mut index_by_id = HashMap::with_capacity(users.len());
        for (index, user) in users.iter().enumerate() {
            if user.group == 0 {
                return Err(DataIntegrityError::InvalidGroup { id: user.id });
            }
            if index_by_id.insert(user.id, index).is_some() {
                return Err(DataIntegrityError::DuplicateNode { index, id: user.id });
            }
        }

        for (index, interaction) in interactions.iter().enumerate() {
            for id in [interaction.source, interaction.target] {
                if !index_by_id.contains_key(&id) {
                    return Err(DataIntegrityError::UnknownEndpoint { index, id });
                }
            }
            if let InteractionWeight::Strength(value) = interaction.weight
                && (!value.is_finite() || value < 0.0)
            {
                return Err(DataIntegrityError::InvalidWeight { index, value });
            }
        }

        let mut seen_assignments = HashSet::with_capacity(assignments.len());
        for (index, assignment) in assignments.iter().enumerate() {
            if !seen_assignments.insert(assignment.id) {
                return Err(DataIntegrityError::DuplicateAssignment {
                    index,
                    id: assignment.id,
                });
            }
        }

        Ok(Self {
            users,
            interactions,
            assignments,
            index_by_id,
        })
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn user(&self, id: NodeId) -> Option<&User> {
        self.index_by_id.get(&id).map(|&index| &self.users[index])
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.users.iter().map(|user| user.id)
    }

    pub fn node_count(&self) -> usize {
        self.users.len()
    }

    pub fn edge_count(&self) -> usize {
        self.interactions.len()
    }

    /// Every assignment id a filter selection may name.
    pub fn assignment_universe(&self) -> BTreeSet<AssignmentId> {
        self.assignments
            .iter()
            .map(|assignment| assignment.id)
            .collect()
    }

    pub fn assignment_title(&self, id: AssignmentId) -> Option<&str> {
        self.assignments
            .iter()
            .find(|assignment| assignment.id == id)
            .map(|assignment| assignment.title.as_str())
    }

    /// Number of users that appear in at least one interaction.
    pub fn connected_user_count(&self) -> usize {
        self.interactions
            .iter()
            .flat_map(|interaction| [interaction.source, interaction.target])
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn unconnected_user_count(&self) -> usize {
        self.node_count() - self.connected_user_count()
    }
}
