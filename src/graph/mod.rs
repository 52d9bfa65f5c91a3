mod group;
mod load;
mod model;
mod parse;

pub use group::{DisjointSet, connected_components};
pub use load::load_graph;
pub use model::{
    Assignment, AssignmentId, Interaction, InteractionWeight, NodeId, SocialGraph, User,
};
pub use parse::parse_graph_payload;
