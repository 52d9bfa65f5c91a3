use thiserror::Error;

use crate::graph::{AssignmentId, NodeId};

/// Malformed graph input. Each variant names the offending record.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum DataIntegrityError {
    #[error("users[{index}] repeats user id {id}")]
    DuplicateNode { index: usize, id: NodeId },
    #[error("links[{index}] references unknown user id {id}")]
    UnknownEndpoint { index: usize, id: NodeId },
    #[error("assignments[{index}] repeats assignment id {id}")]
    DuplicateAssignment { index: usize, id: AssignmentId },
    #[error("user {id} has group 0; group labels start at 1")]
    InvalidGroup { id: NodeId },
    #[error("links[{index}] has invalid weight {value}")]
    InvalidWeight { index: usize, value: f64 },
}

/// A filter toggle named an assignment outside the known universe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("unknown assignment id {0}; selection left unchanged")]
pub struct UnknownAssignmentWarning(pub AssignmentId);

/// The engine was driven in a way its current state does not allow.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum PreconditionViolation {
    #[error("simulation is idle; start a run first")]
    NotRunning,
    #[error("cannot start a run without nodes")]
    EmptyNodeSet,
    #[error("node {0} is not part of the active run")]
    UnknownNode(NodeId),
    #[error("node {0} is not being dragged")]
    NotDragging(NodeId),
    #[error("drag position ({x}, {y}) for node {id} is not finite")]
    NonFinitePosition { id: NodeId, x: f32, y: f32 },
    #[error("alpha target {0} is not finite")]
    NonFiniteAlphaTarget(f32),
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Data(#[from] DataIntegrityError),
    #[error(transparent)]
    Precondition(#[from] PreconditionViolation),
    #[error("invalid simulation config: {field} = {value}")]
    InvalidConfig { field: &'static str, value: f32 },
}
