//! The filter/query half of the Query/Annotate Engine (spec.md §4.6).

use crate::error::{Result, TopologyError};
use crate::graph::CompiledGraph;
use regex::Regex;

/// Comparison operator applied by a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Contains,
    /// Anchored at the start of the string (`match`, not `search`).
    Regex,
}

/// One conjunctive filter term. `query` returns nodes that pass every
/// filter in the list (spec.md §4.6: "evaluation is the intersection of
/// per-filter matches").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Filters on the node id itself.
    Id { op: FilterOp, value: String },
    /// Filters on a named attribute's (stringified) value. A node without
    /// the attribute never passes.
    Attribute {
        name: String,
        op: FilterOp,
        value: String,
    },
}

/// One query match: a node id plus its flattened, stringified attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub node_id: String,
    pub attributes: Vec<(String, String)>,
}

fn matches_op(op: FilterOp, candidate: &str, value: &str) -> Result<bool> {
    Ok(match op {
        FilterOp::Eq => candidate == value,
        FilterOp::Contains => candidate.contains(value),
        FilterOp::Regex => {
            let re = Regex::new(value).map_err(|e| TopologyError::InvalidFilter {
                pattern: value.to_string(),
                reason: e.to_string(),
            })?;
            re.find(candidate).is_some_and(|m| m.start() == 0)
        }
    })
}

fn passes(graph: &CompiledGraph, node_id: &str, filter: &Filter) -> Result<bool> {
    match filter {
        Filter::Id { op, value } => matches_op(*op, node_id, value),
        Filter::Attribute { name, op, value } => match graph
            .attributes(node_id)
            .and_then(|attrs| attrs.get(name.as_str()))
        {
            Some(attr) => matches_op(*op, &attr.as_display(), value),
            None => Ok(false),
        },
    }
}

/// Run a conjunctive filter list over every node in `graph`.
pub fn query(graph: &CompiledGraph, filters: &[Filter]) -> Result<Vec<Match>> {
    let mut out = Vec::new();
    for node_id in graph.node_ids() {
        let mut ok = true;
        for filter in filters {
            if !passes(graph, node_id, filter)? {
                ok = false;
                break;
            }
        }
        if ok {
            let mut attributes: Vec<(String, String)> = graph
                .attributes(node_id)
                .map(|attrs| {
                    attrs
                        .iter()
                        .map(|(k, v)| (k.clone(), v.as_display()))
                        .collect()
                })
                .unwrap_or_default();
            attributes.sort();
            out.push(Match {
                node_id: node_id.to_string(),
                attributes,
            });
        }
    }
    out.sort_by(|a, b| a.node_id.cmp(&b.node_id));
    Ok(out)
}
