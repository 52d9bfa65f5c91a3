//! Force-directed layout and assignment filtering for social interaction graphs.

pub mod error;
pub mod filter;
pub mod graph;
pub mod report;
pub mod session;
pub mod simulation;

pub use error::{
    DataIntegrityError, PreconditionViolation, SimulationError, UnknownAssignmentWarning,
};
pub use session::Session;
