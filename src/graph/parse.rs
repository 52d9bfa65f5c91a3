use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use super::group::connected_components;
use super::model::{
    Assignment, AssignmentId, Interaction, InteractionWeight, NodeId, SocialGraph, User,
};
use crate::error::DataIntegrityError;

#[derive(Clone, Debug, Default, Deserialize)]
pub(super) struct RawPayload {
    #[serde(default)]
    pub(super) users: Vec<RawUser>,
    #[serde(default)]
    pub(super) links: Vec<RawLink>,
    #[serde(default)]
    pub(super) assignments: Vec<RawAssignment>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawUser {
    pub(super) id: NodeId,
    #[serde(default)]
    pub(super) name: String,
    #[serde(default)]
    pub(super) group: Option<u32>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawLink {
    pub(super) user1: NodeId,
    pub(super) user2: NodeId,
    #[serde(rename = "assignmentId")]
    pub(super) assignment_id: AssignmentId,
    #[serde(default)]
    pub(super) value: Option<InteractionWeight>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawAssignment {
    #[serde(rename = "assignmentId")]
    pub(super) assignment_id: AssignmentId,
    #[serde(default)]
    pub(super) title: String,
}

/// Parses a `{ users, links, assignments }` payload into a validated graph.
pub fn parse_graph_payload(raw: &str) -> Result<SocialGraph> {
    let payload: RawPayload = serde_json::from_str(raw).context("invalid graph payload JSON")?;
    Ok(build_graph(payload)?)
}

pub(super) fn build_graph(payload: RawPayload) -> Result<SocialGraph, DataIntegrityError> {
    let interactions = payload
        .links
        .into_iter()
        .map(|link| Interaction {
            source: link.user1,
            target: link.user2,
            assignment_id: link.assignment_id,
            weight: link.value.unwrap_or_default(),
        })
        .collect::<Vec<_>>();

    let assignments = payload
        .assignments
        .into_iter()
        .map(|assignment| Assignment {
            id: assignment.assignment_id,
            title: assignment.title,
        })
        .collect::<Vec<_>>();

    let missing_groups = payload
        .users
        .iter()
        .filter(|user| user.group.is_none())
        .count();

    let users = if missing_groups == 0 {
        payload
            .users
            .into_iter()
            .map(|user| User {
                id: user.id,
                name: user.name,
                group: user.group.unwrap_or(1),
            })
            .collect::<Vec<_>>()
    } else {
        // One missing label relabels every user from connected components.
        let ids = payload.users.iter().map(|user| user.id).collect::<Vec<_>>();
        let groups = connected_components(&ids, &interactions);
        debug!(
            missing_groups,
            components = groups.values().max().copied().unwrap_or(0),
            "backfilled user groups from connected components"
        );
        payload
            .users
            .into_iter()
            .map(|user| User {
                group: groups.get(&user.id).copied().unwrap_or(1),
                id: user.id,
                name: user.name,
            })
            .collect::<Vec<_>>()
    };

    SocialGraph::new(users, interactions, assignments)
}
