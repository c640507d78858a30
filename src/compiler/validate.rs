//! Validator (spec.md §4.5): defensive re-checks over the assembled graph,
//! plus the one genuinely new diagnostic (isolated nodes).

use crate::error::{Result, TopologyError};
use crate::graph::{AttributeValue, CompiledGraph, EdgeScope};
use crate::model::{Device, Infrastructure};
use std::collections::{HashMap, HashSet};

/// Re-validate the graph `compile` just assembled. Everything here should
/// already be impossible given how the Instance Materializer and
/// Infrastructure Wirer build the graph; it exists so a future bug in
/// either one fails loudly instead of shipping a silently-wrong graph.
pub fn validate(
    graph: &CompiledGraph,
    infra: &Infrastructure,
    devices: &HashMap<&str, &Device>,
) -> Result<()> {
    check_no_self_loops(graph)?;
    check_known_links(graph, infra, devices)?;
    check_intra_instance_edges_stay_within_instance(graph)?;
    warn_isolated_nodes(graph);
    Ok(())
}

fn check_no_self_loops(graph: &CompiledGraph) -> Result<()> {
    for id in graph.node_ids() {
        if graph.has_self_loop(id) {
            return Err(TopologyError::InvariantViolation(format!(
                "self-loop on node {id:?} survived compilation"
            )));
        }
    }
    Ok(())
}

fn check_known_links(
    graph: &CompiledGraph,
    infra: &Infrastructure,
    devices: &HashMap<&str, &Device>,
) -> Result<()> {
    let infra_links: HashSet<&str> = infra.links.iter().map(|l| l.name.as_str()).collect();
    let device_links: HashMap<&str, HashSet<&str>> = devices
        .iter()
        .map(|(name, device)| (*name, device.links.iter().map(|l| l.name.as_str()).collect()))
        .collect();

    for (from, to, link, scope) in graph.edges_with_provenance() {
        let known = match scope {
            EdgeScope::Infrastructure => &infra_links,
            EdgeScope::Device(name) => device_links.get(name.as_str()).ok_or_else(|| {
                TopologyError::InvariantViolation(format!(
                    "edge {from:?}<->{to:?} declared by unknown device {name:?}"
                ))
            })?,
        };
        if !known.contains(link) {
            return Err(TopologyError::InvariantViolation(format!(
                "edge {from:?}<->{to:?} references link {link:?} undeclared in its scope"
            )));
        }
    }
    Ok(())
}

/// Every edge not explicitly marked cross-instance by the Infrastructure
/// Wirer must connect two nodes sharing the same `(instance, instance_idx)`
/// pair — those are exactly the intra-device edges the Device Expander and
/// Instance Materializer produce.
fn check_intra_instance_edges_stay_within_instance(graph: &CompiledGraph) -> Result<()> {
    for (from, to, _link, scope) in graph.edges_with_provenance() {
        if *scope == EdgeScope::Infrastructure {
            continue;
        }
        let scope = |id: &str| -> Option<(String, i64)> {
            let attrs = graph.attributes(id)?;
            let instance = match attrs.get("instance")? {
                AttributeValue::Str(s) => s.clone(),
                AttributeValue::Int(i) => i.to_string(),
            };
            let instance_idx = match attrs.get("instance_idx")? {
                AttributeValue::Int(i) => *i,
                AttributeValue::Str(s) => s.parse().ok()?,
            };
            Some((instance, instance_idx))
        };
        if scope(from) != scope(to) {
            return Err(TopologyError::InvariantViolation(format!(
                "intra-device edge {from:?}<->{to:?} crosses an instance-replica boundary"
            )));
        }
    }
    Ok(())
}

fn warn_isolated_nodes(graph: &CompiledGraph) {
    for id in graph.node_ids() {
        match graph.degree(id) {
            Ok(0) => tracing::warn!(node = %id, "node has no edges after compilation"),
            Ok(_) => {}
            Err(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Device, Link};

    #[test]
    fn accepts_an_empty_graph() {
        let infra = Infrastructure::default();
        let devices = HashMap::new();
        let graph = CompiledGraph::new();
        validate(&graph, &infra, &devices).unwrap();
    }

    #[test]
    fn rejects_edge_with_undeclared_link() {
        let mut graph = CompiledGraph::new();
        graph.add_node("a".to_string(), HashMap::new()).unwrap();
        graph.add_node("b".to_string(), HashMap::new()).unwrap();
        graph.add_cross_instance_edge("a", "b", "ghost".to_string()).unwrap();

        let infra = Infrastructure {
            links: vec![Link {
                name: "real".to_string(),
                description: String::new(),
                physical: Default::default(),
            }],
            ..Default::default()
        };
        let devices = HashMap::new();
        let err = validate(&graph, &infra, &devices).unwrap_err();
        assert!(matches!(err, TopologyError::InvariantViolation(_)));
    }

    #[test]
    fn rejects_intra_device_edge_crossing_instances() {
        let mut graph = CompiledGraph::new();
        let mut attrs_a = HashMap::new();
        attrs_a.insert("instance".to_string(), AttributeValue::from("h"));
        attrs_a.insert("instance_idx".to_string(), AttributeValue::from(0i64));
        graph.add_node("h.0.cpu.0".to_string(), attrs_a).unwrap();

        let mut attrs_b = HashMap::new();
        attrs_b.insert("instance".to_string(), AttributeValue::from("h"));
        attrs_b.insert("instance_idx".to_string(), AttributeValue::from(1i64));
        graph.add_node("h.1.cpu.0".to_string(), attrs_b).unwrap();

        graph.add_edge("h.0.cpu.0", "h.1.cpu.0", "pcie".to_string(), "box").unwrap();

        let box_device = Device {
            name: "box".to_string(),
            description: String::new(),
            components: vec![],
            links: vec![Link {
                name: "pcie".to_string(),
                description: String::new(),
                physical: Default::default(),
            }],
            edges: vec![],
        };
        let infra = Infrastructure::default();
        let mut devices = HashMap::new();
        devices.insert("box", &box_device);
        let err = validate(&graph, &infra, &devices).unwrap_err();
        assert!(matches!(err, TopologyError::InvariantViolation(_)));
    }

    #[test]
    fn rejects_edge_declared_by_a_link_the_device_never_declares() {
        let mut graph = CompiledGraph::new();
        graph.add_node("a".to_string(), HashMap::new()).unwrap();
        graph.add_node("b".to_string(), HashMap::new()).unwrap();
        graph.add_edge("a", "b", "unrelated".to_string(), "box").unwrap();

        let box_device = Device {
            name: "box".to_string(),
            description: String::new(),
            components: vec![],
            links: vec![Link {
                name: "pcie".to_string(),
                description: String::new(),
                physical: Default::default(),
            }],
            edges: vec![],
        };
        let infra = Infrastructure {
            links: vec![Link {
                name: "unrelated".to_string(),
                description: String::new(),
                physical: Default::default(),
            }],
            ..Default::default()
        };
        let mut devices = HashMap::new();
        devices.insert("box", &box_device);
        let err = validate(&graph, &infra, &devices).unwrap_err();
        assert!(matches!(err, TopologyError::InvariantViolation(_)));
    }
}
