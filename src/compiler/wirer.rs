//! Infrastructure Wirer (spec.md §4.4): resolves cross-instance
//! `InfrastructureEdge`s into fully qualified graph edges.

use crate::compiler::path::expand_component_path;
use crate::error::{Result, TopologyError};
use crate::model::slice::{parse_segment, resolve_slice};
use crate::model::{Device, Infrastructure, InfrastructureEndpoint, Instance, Scheme};
use std::collections::HashMap;

/// Expand one `InfrastructureEndpoint` into every fully qualified node id
/// it denotes: `instance.idx` for each replica the instance-slice selects,
/// crossed with every component path the component-slice selects.
fn expand_infra_endpoint(
    ep: &InfrastructureEndpoint,
    instances: &HashMap<&str, &Instance>,
    devices: &HashMap<&str, &Device>,
) -> Result<Vec<String>> {
    let segment = parse_segment(&ep.instance)?;
    let instance = instances.get(segment.name).copied().ok_or_else(|| {
        TopologyError::UnknownName {
            name: segment.name.to_string(),
            reason: "no instance with this name".to_string(),
        }
    })?;
    let resolved = resolve_slice(&ep.instance, segment.slice, instance.count)?;

    let device = devices.get(instance.device.as_str()).copied().ok_or_else(|| {
        TopologyError::UnknownName {
            name: instance.device.clone(),
            reason: "instance references an undefined device".to_string(),
        }
    })?;
    let paths = expand_component_path(device, &ep.component, devices)?;

    let mut out = Vec::with_capacity(resolved.indices().count() * paths.len());
    for idx in resolved.indices() {
        for path in &paths {
            out.push(format!("{}.{idx}.{path}", instance.name));
        }
    }
    Ok(out)
}

/// Wire every `InfrastructureEdge` into `graph`.
pub fn wire(
    graph: &mut crate::graph::CompiledGraph,
    infra: &Infrastructure,
    devices: &HashMap<&str, &Device>,
) -> Result<()> {
    let links = infra.link_index();
    let instances: HashMap<&str, &Instance> = infra
        .instances
        .iter()
        .map(|i| (i.name.as_str(), i))
        .collect();

    for edge in &infra.edges {
        if !links.contains_key(edge.link.as_str()) {
            return Err(TopologyError::InvariantViolation(format!(
                "infrastructure edge references undefined link {:?}",
                edge.link
            )));
        }

        let l1 = expand_infra_endpoint(&edge.ep1, &instances, devices)?;
        let l2 = expand_infra_endpoint(&edge.ep2, &instances, devices)?;

        match edge.scheme {
            Scheme::One2One => {
                if !l1.is_empty() || !l2.is_empty() {
                    if l1.len() != l2.len() {
                        return Err(TopologyError::InvariantViolation(format!(
                            "infrastructure edge is ONE2ONE but endpoint cardinalities differ ({} vs {})",
                            l1.len(),
                            l2.len()
                        )));
                    }
                    for (from, to) in l1.iter().zip(l2.iter()) {
                        if from != to {
                            graph.add_cross_instance_edge(from, to, edge.link.clone())?;
                        }
                    }
                }
            }
            Scheme::Many2Many => {
                for from in &l1 {
                    for to in &l2 {
                        if from != to {
                            graph.add_cross_instance_edge(from, to, edge.link.clone())?;
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
