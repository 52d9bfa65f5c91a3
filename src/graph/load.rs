use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::model::SocialGraph;
use super::parse::parse_graph_payload;

pub fn load_graph(path: &Path) -> Result<SocialGraph> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read graph payload {}", path.display()))?;

    let graph = parse_graph_payload(&raw)
        .with_context(|| format!("failed to load graph payload {}", path.display()))?;

    info!(
        users = graph.node_count(),
        links = graph.edge_count(),
        assignments = graph.assignments().len(),
        users_without_interactions = graph.unconnected_user_count(),
        "loaded interaction graph"
    );

    Ok(graph)
}
