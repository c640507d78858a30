//! Declarative data model: `Infrastructure` -> `Device` -> `Component` ->
//! `Link`/`Edge`, and `Infrastructure` -> `Instance` -> `Edge`.
//!
//! These types are the document the core compiles; an external schema
//! loader (YAML/JSON/whatever) is responsible for producing them, but
//! `serde` support is derived directly on them so that a minimal
//! convenience codec (see [`crate::io`]) can round-trip through JSON.

pub mod slice;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One of the four endpoint-generation algebras in spec.md (ONE2ONE,
/// MANY2MANY) applied between two endpoint lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scheme {
    /// Pair by positional zip; cardinalities must match.
    One2One,
    /// Full Cartesian product, self-pairs filtered.
    Many2Many,
}

/// The kind tag of a [`Component`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Cpu,
    Xpu,
    Nic,
    Switch,
    Port,
    Custom,
    /// A nested Device: `Component::name` must equal another `Device::name`.
    Device,
}

/// A typed sub-part of a [`Device`] with a replication count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub count: u32,
    pub kind: ComponentKind,
    /// Only meaningful when `kind == ComponentKind::Custom`.
    #[serde(default)]
    pub custom_type: Option<String>,
    #[serde(default)]
    pub external: Option<bool>,
}

/// A named label attached to edges; carries no topology of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub physical: LinkPhysical,
}

/// Physical/medium metadata carried by a [`Link`]. All fields optional:
/// the core never reasons about bandwidth, it only stores and serializes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkPhysical {
    #[serde(default)]
    pub bandwidth_gbps: Option<u32>,
    #[serde(default)]
    pub medium: Option<String>,
}

/// One endpoint side of a [`DeviceEdge`]: a dotted, slice-qualified
/// component path relative to the enclosing `Device`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEndpoint {
    /// Dotted path, e.g. `"nic[0:8:2].port[0]"`.
    pub component: String,
}

/// An edge between two component paths inside a single `Device`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEdge {
    pub scheme: Scheme,
    pub link: String,
    pub ep1: DeviceEndpoint,
    pub ep2: DeviceEndpoint,
}

/// A reusable template describing internal components and their wiring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub edges: Vec<DeviceEdge>,
}

/// A named replication of a `Device` in an `Infrastructure`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub name: String,
    pub device: String,
    pub count: u32,
}

/// One endpoint side of an [`InfrastructureEdge`]: targets `count`
/// replicas of an `Instance`, each further qualified by a component path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfrastructureEndpoint {
    /// `name[slice]`, e.g. `"leaf[0:4]"`.
    pub instance: String,
    /// Dotted component path relative to the instance's Device.
    pub component: String,
}

/// An edge between two instance/component selections at the
/// `Infrastructure` level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfrastructureEdge {
    pub scheme: Scheme,
    pub link: String,
    pub ep1: InfrastructureEndpoint,
    pub ep2: InfrastructureEndpoint,
}

/// A single `(node_id, attribute, value)` applied after compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub node_id: String,
    pub attribute: String,
    pub value: String,
}

/// The top-level declarative document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Infrastructure {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub instances: Vec<Instance>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub edges: Vec<InfrastructureEdge>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl Infrastructure {
    /// Index devices by name. Does not check for duplicates; the Validator
    /// does that as part of `set_graph`.
    pub(crate) fn device_index(&self) -> HashMap<&str, &Device> {
        self.devices.iter().map(|d| (d.name.as_str(), d)).collect()
    }

    /// Index top-level links by name.
    pub(crate) fn link_index(&self) -> HashMap<&str, &Link> {
        self.links.iter().map(|l| (l.name.as_str(), l)).collect()
    }
}

impl Device {
    /// Index this device's components by name.
    pub(crate) fn component_index(&self) -> HashMap<&str, &Component> {
        self.components
            .iter()
            .map(|c| (c.name.as_str(), c))
            .collect()
    }

    /// Index this device's links by name.
    pub(crate) fn link_index(&self) -> HashMap<&str, &Link> {
        self.links.iter().map(|l| (l.name.as_str(), l)).collect()
    }
}
