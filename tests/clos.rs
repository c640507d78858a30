//! Two-tier Clos fabric and annotate/query (spec.md §8, scenarios 5-6).
//!
//! Host NICs attach to a leaf switch node, and every leaf attaches to every
//! spine port, so the shortest path from a host NIC to a spine port is
//! always exactly three nodes, through that host's leaf.

use infragraph::{
    Annotation, Component, ComponentKind, Filter, FilterOp, Infrastructure, InfrastructureEdge,
    InfrastructureEndpoint, Instance, Link, LinkPhysical, Scheme, TopologyService,
};

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

fn link(name: &str) -> Link {
    Link {
        name: name.to_string(),
        description: String::new(),
        physical: LinkPhysical::default(),
    }
}

fn fabric() -> Infrastructure {
    use infragraph::Device;

    let host = Device {
        name: "host".to_string(),
        description: String::new(),
        components: vec![component("nic", 1, ComponentKind::Nic)],
        links: vec![],
        edges: vec![],
    };
    let leaf = Device {
        name: "leaf".to_string(),
        description: String::new(),
        components: vec![component("switch", 1, ComponentKind::Switch)],
        links: vec![],
        edges: vec![],
    };
    let spine = Device {
        name: "spine".to_string(),
        description: String::new(),
        components: vec![component("port", 4, ComponentKind::Port)],
        links: vec![],
        edges: vec![],
    };

    Infrastructure {
        name: "clos".to_string(),
        description: String::new(),
        devices: vec![host, leaf, spine],
        instances: vec![
            Instance { name: "host".to_string(), device: "host".to_string(), count: 4 },
            Instance { name: "leaf".to_string(), device: "leaf".to_string(), count: 4 },
            Instance { name: "spine".to_string(), device: "spine".to_string(), count: 2 },
        ],
        links: vec![link("access"), link("fabric0"), link("fabric1")],
        edges: vec![
            InfrastructureEdge {
                scheme: Scheme::One2One,
                link: "access".to_string(),
                ep1: InfrastructureEndpoint { instance: "host[:]".to_string(), component: "nic[:]".to_string() },
                ep2: InfrastructureEndpoint { instance: "leaf[:]".to_string(), component: "switch[:]".to_string() },
            },
            InfrastructureEdge {
                scheme: Scheme::One2One,
                link: "fabric0".to_string(),
                ep1: InfrastructureEndpoint { instance: "leaf[:]".to_string(), component: "switch[:]".to_string() },
                ep2: InfrastructureEndpoint { instance: "spine[0]".to_string(), component: "port[0:4]".to_string() },
            },
            InfrastructureEdge {
                scheme: Scheme::One2One,
                link: "fabric1".to_string(),
                ep1: InfrastructureEndpoint { instance: "leaf[:]".to_string(), component: "switch[:]".to_string() },
                ep2: InfrastructureEndpoint { instance: "spine[1]".to_string(), component: "port[0:4]".to_string() },
            },
        ],
        annotations: vec![],
    }
}

#[test]
fn every_host_nic_is_two_hops_from_every_spine_port_through_its_leaf() {
    let mut service = TopologyService::new();
    service.set_graph(fabric()).unwrap();

    let path = service.get_shortest_path("host.0.nic.0", "spine.0.port.0").unwrap();
    assert_eq!(path.len(), 3);
    assert_eq!(path[0], "host.0.nic.0");
    assert!(path[1].starts_with("leaf.0."));
    assert_eq!(path[2], "spine.0.port.0");
}

#[test]
fn annotate_and_query_nic_endpoints() {
    let mut service = TopologyService::new();
    service.set_graph(fabric()).unwrap();

    let nic_nodes: Vec<String> = service
        .get_endpoints("type", Some("nic"))
        .unwrap();
    assert_eq!(nic_nodes.len(), 4);

    let requests: Vec<Annotation> = nic_nodes
        .iter()
        .enumerate()
        .map(|(i, node_id)| Annotation {
            node_id: node_id.clone(),
            attribute: "ip_address".to_string(),
            value: format!("10.0.0.{i}"),
        })
        .collect();
    service.annotate_graph(&requests).unwrap();

    let mut tagged = service.get_endpoints("ip_address", None).unwrap();
    tagged.sort();
    let mut expected = nic_nodes.clone();
    expected.sort();
    assert_eq!(tagged, expected);

    let results = service
        .query_graph(&[
            Filter::Attribute { name: "type".to_string(), op: FilterOp::Eq, value: "nic".to_string() },
            Filter::Attribute { name: "instance".to_string(), op: FilterOp::Eq, value: "host".to_string() },
        ])
        .unwrap();
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|m| m.node_id.starts_with("host.")));
}
