//! The topology compiler: turns an [`Infrastructure`](crate::model::Infrastructure)
//! declaration into a [`CompiledGraph`](crate::graph::CompiledGraph).
//!
//! Compilation happens in four ordered passes, mirroring spec.md §2:
//!
//! 1. [`device`] — expand each `Device`'s internal edges into a table of
//!    intra-device endpoint pairs.
//! 2. [`instance`] — materialize per-instance nodes and edges, inlining
//!    nested devices.
//! 3. [`wirer`] — expand top-level `Infrastructure` edges into
//!    inter-instance edges.
//! 4. [`validate`] — check structural invariants over the assembled graph.

pub mod device;
pub mod instance;
pub mod path;
pub mod validate;
pub mod wirer;

use crate::error::{Result, TopologyError};
use crate::graph::CompiledGraph;
use crate::model::Infrastructure;
use std::collections::{HashMap, HashSet};

/// Compile a declarative `Infrastructure` into a validated graph.
///
/// All-or-nothing: on any error, no partial graph is returned (spec.md §7).
pub fn compile(infra: &Infrastructure) -> Result<CompiledGraph> {
    let devices = infra.device_index();
    check_unique_names(infra, &devices)?;
    check_acyclic_containment(infra, &devices)?;

    let nested_device_names = nested_device_names(infra);

    let mut expanded_devices = HashMap::with_capacity(devices.len());
    for device in &infra.devices {
        let expanded = device::expand_device(device, &devices)?;
        expanded_devices.insert(device.name.as_str(), expanded);
    }

    let mut graph = CompiledGraph::new();
    for instance in &infra.instances {
        if nested_device_names.contains(instance.device.as_str()) {
            return Err(TopologyError::InvariantViolation(format!(
                "instance {:?} names device {:?}, which is nested as a component inside another device",
                instance.name, instance.device
            )));
        }
        let device = devices.get(instance.device.as_str()).ok_or_else(|| TopologyError::UnknownName {
            name: instance.device.clone(),
            reason: format!("instance {:?} references undefined device", instance.name),
        })?;
        instance::materialize(&mut graph, instance, device, &devices, &expanded_devices)?;
    }

    wirer::wire(&mut graph, infra, &devices)?;

    validate::validate(&graph, infra, &devices)?;

    Ok(graph)
}

fn check_unique_names(
    infra: &Infrastructure,
    devices: &HashMap<&str, &crate::model::Device>,
) -> Result<()> {
    if devices.len() != infra.devices.len() {
        return Err(TopologyError::InvariantViolation(
            "duplicate device name in Infrastructure.devices".to_string(),
        ));
    }
    let mut instance_names = HashSet::with_capacity(infra.instances.len());
    for instance in &infra.instances {
        if !instance_names.insert(instance.name.as_str()) {
            return Err(TopologyError::InvariantViolation(format!(
                "duplicate instance name {:?}",
                instance.name
            )));
        }
    }
    for device in &infra.devices {
        let mut seen = HashSet::with_capacity(device.components.len());
        for component in &device.components {
            if !seen.insert(component.name.as_str()) {
                return Err(TopologyError::InvariantViolation(format!(
                    "duplicate component name {:?} in device {:?}",
                    component.name, device.name
                )));
            }
            if component.count == 0 {
                return Err(TopologyError::InvariantViolation(format!(
                    "component {:?} in device {:?} has count 0",
                    component.name, device.name
                )));
            }
        }
    }
    Ok(())
}

/// Collect the names of Devices that appear as a `kind=device` Component
/// somewhere in the Infrastructure — these are never instantiated directly.
fn nested_device_names(infra: &Infrastructure) -> HashSet<&str> {
    infra
        .devices
        .iter()
        .flat_map(|d| d.components.iter())
        .filter(|c| c.kind == crate::model::ComponentKind::Device)
        .map(|c| c.name.as_str())
        .collect()
}

/// The containment graph over Devices (edges: device -> nested device) must
/// be a DAG. A topological sort (Kahn's algorithm) both proves acyclicity
/// and doubles as the dependency order the Device Expander could use, per
/// spec.md §9's "index table, not embedding the target Device inline".
fn check_acyclic_containment(
    infra: &Infrastructure,
    devices: &HashMap<&str, &crate::model::Device>,
) -> Result<()> {
    let mut in_degree: HashMap<&str, usize> = devices.keys().map(|&n| (n, 0)).collect();
    let mut edges: HashMap<&str, Vec<&str>> = HashMap::new();

    for device in &infra.devices {
        for component in &device.components {
            if component.kind != crate::model::ComponentKind::Device {
                continue;
            }
            if !devices.contains_key(component.name.as_str()) {
                return Err(TopologyError::UnknownName {
                    name: component.name.clone(),
                    reason: format!(
                        "component {:?} in device {:?} has kind=device but no device with that name is defined",
                        component.name, device.name
                    ),
                });
            }
            edges.entry(device.name.as_str()).or_default().push(component.name.as_str());
            *in_degree.entry(component.name.as_str()).or_insert(0) += 1;
        }
    }

    let mut queue: Vec<&str> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(&n, _)| n)
        .collect();
    let mut visited = 0usize;
    while let Some(node) = queue.pop() {
        visited += 1;
        if let Some(children) = edges.get(node) {
            for &child in children {
                let deg = in_degree.get_mut(child).unwrap();
                *deg -= 1;
                if *deg == 0 {
                    queue.push(child);
                }
            }
        }
    }

    if visited != devices.len() {
        return Err(TopologyError::InvariantViolation(
            "cyclic device composition: nested-device components form a cycle".to_string(),
        ));
    }

    Ok(())
}
