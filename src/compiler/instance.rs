//! Instance Materializer (spec.md §4.3): emits instance-qualified nodes
//! and edges for one `Instance`, recursively inlining nested Devices.

use crate::compiler::device::ExpandedDevice;
use crate::error::Result;
use crate::graph::{AttributeValue, CompiledGraph};
use crate::model::{Component, ComponentKind, Device, Instance};
use std::collections::HashMap;

fn kind_str(kind: ComponentKind) -> &'static str {
    match kind {
        ComponentKind::Cpu => "cpu",
        ComponentKind::Xpu => "xpu",
        ComponentKind::Nic => "nic",
        ComponentKind::Switch => "switch",
        ComponentKind::Port => "port",
        ComponentKind::Custom => "custom",
        ComponentKind::Device => "device",
    }
}

fn type_attr(component: &Component) -> AttributeValue {
    match component.kind {
        ComponentKind::Custom => {
            AttributeValue::from(component.custom_type.clone().unwrap_or_default())
        }
        other => AttributeValue::from(kind_str(other)),
    }
}

/// Materialize one `Instance` into `graph`: all replicas, all non-nested
/// component nodes, all nested-Device inlining, and every intra-device
/// edge re-qualified with the instance prefix.
pub fn materialize(
    graph: &mut CompiledGraph,
    instance: &Instance,
    device: &Device,
    devices: &HashMap<&str, &Device>,
    expanded_devices: &HashMap<&str, ExpandedDevice>,
) -> Result<()> {
    for idx in 0..instance.count {
        let prefix = format!("{}.{idx}", instance.name);
        materialize_device(
            graph,
            &prefix,
            device,
            devices,
            expanded_devices,
            &instance.name,
            idx,
        )?;
    }
    tracing::info!(
        instance = %instance.name,
        device = %instance.device,
        replicas = instance.count,
        "materialized instance"
    );
    Ok(())
}

/// Recursively emit nodes and edges for `device` rooted at `prefix`.
/// `prefix` is `instance.idx` for the top-level call and
/// `instance.idx.component.idx[...]` for each nested-Device recursion.
fn materialize_device(
    graph: &mut CompiledGraph,
    prefix: &str,
    device: &Device,
    devices: &HashMap<&str, &Device>,
    expanded_devices: &HashMap<&str, ExpandedDevice>,
    instance_name: &str,
    instance_idx: u32,
) -> Result<()> {
    for component in &device.components {
        for idx in 0..component.count {
            let node_prefix = format!("{prefix}.{}.{idx}", component.name);
            if component.kind == ComponentKind::Device {
                let nested = devices
                    .get(component.name.as_str())
                    .copied()
                    .expect("nested device existence already validated");
                materialize_device(
                    graph,
                    &node_prefix,
                    nested,
                    devices,
                    expanded_devices,
                    instance_name,
                    instance_idx,
                )?;
            } else {
                let mut attrs = HashMap::with_capacity(4);
                attrs.insert("type".to_string(), type_attr(component));
                attrs.insert("instance".to_string(), AttributeValue::from(instance_name));
                attrs.insert(
                    "instance_idx".to_string(),
                    AttributeValue::from(i64::from(instance_idx)),
                );
                attrs.insert("device".to_string(), AttributeValue::from(device.name.as_str()));
                graph.add_node(node_prefix, attrs)?;
            }
        }
    }

    let table = expanded_devices
        .get(device.name.as_str())
        .expect("device expansion table computed for every device up front");
    for edge in table {
        let from = format!("{prefix}.{}", edge.from);
        let to = format!("{prefix}.{}", edge.to);
        graph.add_edge(&from, &to, edge.link.clone(), &device.name)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::device::expand_device;
    use crate::model::{DeviceEdge, DeviceEndpoint, Link, Scheme};

    fn link(name: &str) -> Link {
        Link {
            name: name.to_string(),
            description: String::new(),
            physical: Default::default(),
        }
    }

    fn component(name: &str, count: u32, kind: ComponentKind) -> Component {
        Component {
            name: name.to_string(),
            description: String::new(),
            count,
            kind,
            custom_type: None,
            external: None,
        }
    }

    #[test]
    fn single_host_single_nic_single_port() {
        let nic_device = Device {
            name: "nic".to_string(),
            description: String::new(),
            components: vec![component("port", 1, ComponentKind::Port)],
            links: vec![],
            edges: vec![],
        };
        let server = Device {
            name: "server".to_string(),
            description: String::new(),
            components: vec![
                component("cpu", 1, ComponentKind::Cpu),
                component("nic", 1, ComponentKind::Device),
            ],
            links: vec![link("pcie")],
            edges: vec![DeviceEdge {
                scheme: Scheme::One2One,
                link: "pcie".to_string(),
                ep1: DeviceEndpoint { component: "cpu".to_string() },
                ep2: DeviceEndpoint { component: "nic.port".to_string() },
            }],
        };

        let mut devices = HashMap::new();
        devices.insert("nic", &nic_device);
        devices.insert("server", &server);

        let mut expanded = HashMap::new();
        expanded.insert("nic", expand_device(&nic_device, &devices).unwrap());
        expanded.insert("server", expand_device(&server, &devices).unwrap());

        let instance = Instance {
            name: "h".to_string(),
            device: "server".to_string(),
            count: 1,
        };

        let mut graph = CompiledGraph::new();
        materialize(&mut graph, &instance, &server, &devices, &expanded).unwrap();

        assert!(graph.contains_node("h.0.cpu.0"));
        assert!(graph.contains_node("h.0.nic.0.port.0"));
        assert_eq!(graph.node_count(), 2);
        assert_eq!(
            graph.neighbors("h.0.cpu.0").unwrap(),
            vec!["h.0.nic.0.port.0"]
        );
    }

    #[test]
    fn replication_does_not_cross_instance_edges() {
        let device = Device {
            name: "box".to_string(),
            description: String::new(),
            components: vec![
                component("a", 1, ComponentKind::Cpu),
                component("b", 1, ComponentKind::Nic),
            ],
            links: vec![link("l")],
            edges: vec![DeviceEdge {
                scheme: Scheme::One2One,
                link: "l".to_string(),
                ep1: DeviceEndpoint { component: "a".to_string() },
                ep2: DeviceEndpoint { component: "b".to_string() },
            }],
        };
        let mut devices = HashMap::new();
        devices.insert("box", &device);
        let mut expanded = HashMap::new();
        expanded.insert("box", expand_device(&device, &devices).unwrap());

        let instance = Instance {
            name: "i".to_string(),
            device: "box".to_string(),
            count: 3,
        };

        let mut graph = CompiledGraph::new();
        materialize(&mut graph, &instance, &device, &devices, &expanded).unwrap();

        assert_eq!(graph.node_count(), 6);
        assert_eq!(graph.edge_count(), 3);
        for idx in 0..3 {
            assert_eq!(
                graph.neighbors(&format!("i.{idx}.a.0")).unwrap(),
                vec![format!("i.{idx}.b.0")]
            );
        }
    }
}
