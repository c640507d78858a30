//! Device Expander (spec.md §4.2): translates each `DeviceEdge` into fully
//! qualified intra-device endpoint pairs.

use crate::compiler::path::expand_component_path;
use crate::error::{Result, TopologyError};
use crate::model::{Device, Scheme};
use std::collections::HashMap;

/// One intra-device edge, relative to the owning `Device`'s root, after
/// expansion. `from`/`to` never compare equal (self-pairs are filtered
/// during expansion).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedDeviceEdge {
    pub from: String,
    pub to: String,
    pub link: String,
}

/// The full set of intra-device edges for one `Device`, in declaration
/// order (stable output makes the compiler deterministic, which matters
/// for snapshot-style tests and for the round-trip property in spec.md §8).
pub type ExpandedDevice = Vec<ExpandedDeviceEdge>;

/// Expand every `DeviceEdge` of `device` into [`ExpandedDeviceEdge`]s.
///
/// `devices` is the whole-Infrastructure device index, needed to recurse
/// into nested-device components (spec.md §4.2 step 1).
pub fn expand_device(device: &Device, devices: &HashMap<&str, &Device>) -> Result<ExpandedDevice> {
    let links = device.link_index();
    let mut out = Vec::new();

    for edge in &device.edges {
        if !links.contains_key(edge.link.as_str()) {
            return Err(TopologyError::InvariantViolation(format!(
                "device {:?} edge references undefined link {:?}",
                device.name, edge.link
            )));
        }

        let l1 = expand_component_path(device, &edge.ep1.component, devices)?;
        let l2 = expand_component_path(device, &edge.ep2.component, devices)?;

        match edge.scheme {
            Scheme::One2One => {
                if !l1.is_empty() || !l2.is_empty() {
                    if l1.len() != l2.len() {
                        return Err(TopologyError::InvariantViolation(format!(
                            "device {:?} edge {:?}<->{:?} is ONE2ONE but endpoint cardinalities differ ({} vs {})",
                            device.name, edge.ep1.component, edge.ep2.component, l1.len(), l2.len()
                        )));
                    }
                    for (from, to) in l1.iter().zip(l2.iter()) {
                        if from != to {
                            out.push(ExpandedDeviceEdge {
                                from: from.clone(),
                                to: to.clone(),
                                link: edge.link.clone(),
                            });
                        }
                    }
                }
            }
            Scheme::Many2Many => {
                for from in &l1 {
                    for to in &l2 {
                        if from != to {
                            out.push(ExpandedDeviceEdge {
                                from: from.clone(),
                                to: to.clone(),
                                link: edge.link.clone(),
                            });
                        }
                    }
                }
            }
        }
    }

    Ok(out)
}
