//! Cartesian-prefix-product expansion of a dotted, slice-qualified
//! component path relative to a `Device`, shared by the Device Expander
//! (spec.md §4.2) and the Infrastructure Wirer (spec.md §4.4).

use crate::error::{Result, TopologyError};
use crate::model::slice::{parse_path, resolve_slice};
use crate::model::{ComponentKind, Device};
use std::collections::HashMap;

/// Expand `path` (e.g. `"nic[0:8:2].port[0]"`) against `device`, recursing
/// into nested devices as `kind=device` components are encountered.
///
/// Returns the fully qualified endpoint strings relative to `device`'s own
/// root, e.g. `["nic.0.port.0", "nic.2.port.0", ...]`.
pub fn expand_component_path(
    device: &Device,
    path: &str,
    devices: &HashMap<&str, &Device>,
) -> Result<Vec<String>> {
    let segments = parse_path(path)?;
    if segments.is_empty() {
        return Err(TopologyError::MalformedDocument(format!(
            "empty component path {path:?}"
        )));
    }

    let mut current = device;
    let mut prefixes: Vec<String> = vec![String::new()];

    for (i, segment) in segments.iter().enumerate() {
        let component = current.component_index().get(segment.name).copied().ok_or_else(|| {
            TopologyError::UnknownName {
                name: segment.name.to_string(),
                reason: format!(
                    "not a component of device {:?} (path {:?})",
                    current.name, path
                ),
            }
        })?;

        let segment_text = reconstruct_segment_text(path, i);
        let resolved = resolve_slice(&segment_text, segment.slice, component.count)?;

        let mut next_prefixes = Vec::with_capacity(prefixes.len());
        for prefix in &prefixes {
            for idx in resolved.indices() {
                let piece = if prefix.is_empty() {
                    format!("{}.{idx}", component.name)
                } else {
                    format!("{prefix}.{}.{idx}", component.name)
                };
                next_prefixes.push(piece);
            }
        }
        prefixes = next_prefixes;

        let is_last = i + 1 == segments.len();
        match (component.kind, is_last) {
            (ComponentKind::Device, true) => {
                return Err(TopologyError::InvariantViolation(format!(
                    "path {path:?} ends on nested-device component {:?}; an endpoint must name a leaf component",
                    component.name
                )));
            }
            (ComponentKind::Device, false) => {
                current = devices.get(component.name.as_str()).copied().ok_or_else(|| {
                    TopologyError::UnknownName {
                        name: component.name.clone(),
                        reason: format!("nested device {:?} is not defined", component.name),
                    }
                })?;
            }
            (_, true) => {}
            (_, false) => {
                return Err(TopologyError::InvariantViolation(format!(
                    "path {path:?} continues past non-device component {:?}",
                    component.name
                )));
            }
        }
    }

    Ok(prefixes)
}

/// Best-effort reconstruction of the original segment's source text, used
/// only for error messages (resolving indices can't fail in a way that
/// needs the exact text back, but the error types want something to show).
fn reconstruct_segment_text(path: &str, index: usize) -> String {
    path.split('.').nth(index).unwrap_or(path).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Component, ComponentKind};

    fn device_with_components(name: &str, components: Vec<Component>) -> Device {
        Device {
            name: name.to_string(),
            description: String::new(),
            components,
            links: vec![],
            edges: vec![],
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
    fn expands_simple_slice() {
        let device = device_with_components(
            "server",
            vec![component("cpu", 2, ComponentKind::Cpu)],
        );
        let devices = HashMap::new();
        let result = expand_component_path(&device, "cpu[0:2]", &devices).unwrap();
        assert_eq!(result, vec!["cpu.0", "cpu.1"]);
    }

    #[test]
    fn recurses_into_nested_device() {
        let nic = device_with_components("nic", vec![component("port", 2, ComponentKind::Port)]);
        let server = device_with_components("server", vec![component("nic", 1, ComponentKind::Device)]);
        let mut devices = HashMap::new();
        devices.insert("nic", &nic);
        let result = expand_component_path(&server, "nic[0].port[0:2]", &devices).unwrap();
        assert_eq!(result, vec!["nic.0.port.0", "nic.0.port.1"]);
    }

    #[test]
    fn rejects_path_ending_on_device_component() {
        let nic = device_with_components("nic", vec![component("port", 2, ComponentKind::Port)]);
        let server = device_with_components("server", vec![component("nic", 1, ComponentKind::Device)]);
        let mut devices = HashMap::new();
        devices.insert("nic", &nic);
        let err = expand_component_path(&server, "nic[0]", &devices).unwrap_err();
        assert!(matches!(err, TopologyError::InvariantViolation(_)));
    }

    #[test]
    fn rejects_unknown_component() {
        let device = device_with_components("server", vec![component("cpu", 1, ComponentKind::Cpu)]);
        let devices = HashMap::new();
        let err = expand_component_path(&device, "gpu[0]", &devices).unwrap_err();
        assert!(matches!(err, TopologyError::UnknownName { .. }));
    }
}
