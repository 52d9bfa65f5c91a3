use serde::Serialize;

use crate::filter::FilterSelection;
use crate::graph::{AssignmentId, InteractionWeight, NodeId};
use crate::session::Session;
use crate::simulation::Phase;

/// Everything a renderer needs to draw the current frame.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutReport {
    pub selection: FilterSelection,
    pub phase: Phase,
    pub alpha: Option<f32>,
    pub ticks: u64,
    pub users_without_interactions: usize,
    pub isolated: usize,
    pub nodes: Vec<NodeReport>,
    pub links: Vec<LinkReport>,
}

#[derive(Clone, Debug, Serialize)]
pub struct NodeReport {
    pub id: NodeId,
    pub name: String,
    pub group: u32,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub interactions: usize,
    pub isolated: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkReport {
    pub source: NodeId,
    pub target: NodeId,
    pub assignment_id: AssignmentId,
    pub assignment: Option<String>,
    pub value: InteractionWeight,
}

impl LayoutReport {
    pub fn from_session(session: &Session) -> Self {
        let graph = session.graph();
        let view = session.view();
        let simulation = session.simulation();
        let state = simulation.state();

        let nodes = graph
            .users()
            .iter()
            .map(|user| {
                let position = simulation.position(user.id);
                NodeReport {
                    id: user.id,
                    name: user.name.clone(),
                    group: user.group,
                    x: position.map(|position| position.x),
                    y: position.map(|position| position.y),
                    interactions: view.interaction_count(user.id),
                    isolated: view.is_isolated(user.id),
                }
            })
            .collect();

        let links = view
            .active_edges()
            .iter()
            .map(|edge| LinkReport {
                source: edge.source,
                target: edge.target,
                assignment_id: edge.assignment_id,
                assignment: graph.assignment_title(edge.assignment_id).map(str::to_owned),
                value: edge.weight.clone(),
            })
            .collect();

        Self {
            selection: view.selection().clone(),
            phase: simulation.phase(),
            alpha: state.map(|state| state.alpha),
            ticks: state.map_or(0, |state| state.tick_count),
            users_without_interactions: graph.unconnected_user_count(),
            isolated: view.isolated_nodes().len(),
            nodes,
            links,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::graph::parse_graph_payload;
    use crate::simulation::SimulationConfig;

    #[test]
    fn serializes_nodes_and_active_links() {
        let graph = parse_graph_payload(
            r#"{
                "users": [
                    { "id": 1, "name": "Alex", "group": 1 },
                    { "id": 2, "name": "Sam", "group": 1 },
                    { "id": 3, "name": "Riley", "group": 2 }
                ],
                "links": [ { "user1": 1, "user2": 2, "assignmentId": 7, "value": 2 } ],
                "assignments": [ { "assignmentId": 7, "title": "Essay" } ]
            }"#,
        )
        .unwrap();
        let mut session = Session::new(graph, SimulationConfig::default()).unwrap();
        session.simulation_mut().run_to_convergence(None).unwrap();

        let value = serde_json::to_value(LayoutReport::from_session(&session)).unwrap();
        assert_eq!(value["selection"], json!("all"));
        assert_eq!(value["phase"], json!("cooled"));
        assert_eq!(serde_json::to_value(Phase::Idle).unwrap(), json!("idle"));
        assert_eq!(value["isolated"], json!(1));
        assert_eq!(value["usersWithoutInteractions"], json!(1));
        assert_eq!(value["nodes"][2]["isolated"], json!(true));
        assert!(value["nodes"][0]["x"].is_number());
        assert_eq!(
            value["links"][0],
            json!({
                "source": 1,
                "target": 2,
                "assignmentId": 7,
                "assignment": "Essay",
                "value": 2.0
            })
        );
    }
}
