use geo::{LineString, Point};
use log::info;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};

use super::{
    clean::{WorkLine, clean_lines},
    config::{DirectionConfig, HoleFilling, IsolationPolicy},
    cut::cut_lines,
    directed::{EdgePlan, plan_edges},
    holes::hole_lines,
    isolation::kept_edges,
    nodes::NodeTable,
};
use crate::{
    Error,
    geometry::line_length,
    model::{
        DirectionClass, EdgeDirection, LineFeatures, Network, NetworkLine, RoadEdge, RoadNode,
    },
};

/// Two-phase construction of a [`Network`] from line features
///
/// Configuration calls only record settings; [`NetworkBuilder::build`] runs
/// cleaning, hole closing, cutting, edge emission and isolation removal in
/// that order.
#[derive(Debug, Clone)]
pub struct NetworkBuilder {
    features: LineFeatures,
    holes: Option<HoleFilling>,
    max_length: Option<f64>,
    direction: Option<DirectionConfig>,
    isolation: IsolationPolicy,
}

impl NetworkBuilder {
    pub fn new(features: LineFeatures) -> Self {
        Self {
            features,
            holes: None,
            max_length: None,
            direction: None,
            isolation: IsolationPolicy::KeepAll,
        }
    }

    /// Connects dead ends to nearby nodes in the direction of the dead-end line
    #[must_use]
    pub fn close_network_holes(mut self, max_distance: f64, max_angle: f64, fill_value: f64) -> Self {
        self.holes = Some(HoleFilling::ToNodes {
            max_distance,
            max_angle,
            fill_value,
        });
        self
    }

    /// Connects dead ends to the nearest other dead end
    #[must_use]
    pub fn close_network_holes_to_deadends(mut self, max_distance: f64, fill_value: f64) -> Self {
        self.holes = Some(HoleFilling::ToDeadends {
            max_distance,
            fill_value,
        });
        self
    }

    #[must_use]
    pub fn cut_lines(mut self, max_length: f64) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Keeps only the largest connected component
    #[must_use]
    pub fn remove_isolated(self) -> Self {
        self.isolation_policy(IsolationPolicy::LargestComponent)
    }

    #[must_use]
    pub fn isolation_policy(mut self, policy: IsolationPolicy) -> Self {
        self.isolation = policy;
        self
    }

    #[must_use]
    pub fn make_directed_network(mut self, config: DirectionConfig) -> Self {
        self.direction = Some(config);
        self
    }

    /// Runs all build phases
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, if a configured
    /// column is missing, if a direction category is unknown, or if no lines
    /// are left to build from.
    pub fn build(self) -> Result<Network, Error> {
        validate_config(&self)?;

        info!("Cleaning {} line features", self.features.len());
        let mut lines = clean_lines(&self.features);
        if lines.is_empty() {
            return Err(Error::EmptyNetwork("cleaning"));
        }

        if let Some(filling) = self.holes {
            let holes = hole_lines(&lines, filling);
            info!("Closed {} network holes", holes.len());
            lines.extend(holes);
        }

        if let Some(max_length) = self.max_length {
            let before = lines.len();
            lines = cut_lines(lines, max_length);
            info!("Cut {before} lines into {} pieces", lines.len());
        }

        let nodes = NodeTable::from_lines(&lines);
        let plan = plan_edges(&self.features, &lines, &nodes, self.direction.as_ref())?;

        let kept = kept_edges(nodes.len(), &plan.edges, self.isolation);
        let removed = kept.iter().filter(|&&keep| !keep).count();
        if removed > 0 {
            info!("Removed {removed} edges outside the kept network component");
        }

        let network = assemble(lines, &nodes, plan, &kept, self.direction.is_some());
        if network.edge_count() == 0 {
            return Err(Error::EmptyNetwork("edge emission"));
        }

        info!("Network built successfully: {network}");
        Ok(network)
    }
}

fn validate_config(builder: &NetworkBuilder) -> Result<(), Error> {
    let positive_finite = |value: f64| value.is_finite() && value > 0.0;
    let non_negative_finite = |value: f64| value.is_finite() && value >= 0.0;

    match builder.holes {
        Some(HoleFilling::ToNodes {
            max_distance,
            max_angle,
            fill_value,
        }) => {
            if !non_negative_finite(max_distance) || !non_negative_finite(max_angle) {
                return Err(Error::InvalidInput(format!(
                    "hole distance and angle must be non-negative, got {max_distance} and {max_angle}"
                )));
            }
            if !non_negative_finite(fill_value) {
                return Err(Error::InvalidInput(format!(
                    "hole fill value must be non-negative, got {fill_value}"
                )));
            }
        }
        Some(HoleFilling::ToDeadends {
            max_distance,
            fill_value,
        }) => {
            if !non_negative_finite(max_distance) || !non_negative_finite(fill_value) {
                return Err(Error::InvalidInput(format!(
                    "hole distance and fill value must be non-negative, got {max_distance} and {fill_value}"
                )));
            }
        }
        None => {}
    }

    if let Some(max_length) = builder.max_length {
        if !positive_finite(max_length) {
            return Err(Error::InvalidInput(format!(
                "maximum line length must be positive, got {max_length}"
            )));
        }
    }

    Ok(())
}

/// Builds the graph from kept edges, renumbering nodes and lines densely
fn assemble(
    work_lines: Vec<WorkLine>,
    nodes: &NodeTable,
    plan: EdgePlan,
    kept: &[bool],
    directed: bool,
) -> Network {
    let mut node_ids: Vec<Option<NodeIndex>> = vec![None; nodes.len()];
    let mut line_ids: Vec<Option<usize>> = vec![None; work_lines.len()];
    let mut degrees = vec![0usize; nodes.len()];
    let mut graph: DiGraph<RoadNode, RoadEdge> = DiGraph::with_capacity(nodes.len(), plan.edges.len());
    let mut lines: Vec<NetworkLine> = Vec::with_capacity(work_lines.len());

    let mut node_id = |graph: &mut DiGraph<RoadNode, RoadEdge>, node: usize| {
        *node_ids[node].get_or_insert_with(|| {
            graph.add_node(RoadNode {
                geometry: Point::from(nodes.coords[node]),
                degree: 0,
            })
        })
    };

    for (edge, _) in plan.edges.into_iter().zip(kept).filter(|(_, keep)| **keep) {
        let work_line = &work_lines[edge.line];
        let line_id = *line_ids[edge.line].get_or_insert_with(|| {
            let (source, target) = nodes.endpoints[edge.line];
            degrees[source] += 1;
            degrees[target] += 1;
            lines.push(NetworkLine {
                source_row: work_line.source_row(),
                geometry: work_line.geometry.clone(),
                length: line_length(&work_line.geometry),
                class: plan.classes[edge.line].unwrap_or(DirectionClass::Both),
                edges: Vec::with_capacity(2),
            });
            lines.len() - 1
        });

        let source = node_id(&mut graph, edge.source);
        let target = node_id(&mut graph, edge.target);
        let geometry = match edge.direction {
            EdgeDirection::Forward => work_line.geometry.clone(),
            EdgeDirection::Backward => reversed(&work_line.geometry),
        };
        let length = lines[line_id].length;

        let index: EdgeIndex = graph.add_edge(
            source,
            target,
            RoadEdge {
                line: line_id,
                source_row: work_line.source_row(),
                direction: edge.direction,
                length,
                costs: edge.costs,
                geometry,
            },
        );
        lines[line_id].edges.push(index);
    }

    for (node, id) in node_ids.iter().enumerate() {
        if let Some(id) = id {
            graph[*id].degree = degrees[node];
        }
    }

    Network::from_parts(graph, lines, plan.cost_columns, directed)
}

fn reversed(line: &LineString<f64>) -> LineString<f64> {
    LineString::new(line.0.iter().rev().copied().collect())
}
