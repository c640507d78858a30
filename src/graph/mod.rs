//! The compiled, undirected, attributed graph produced by [`crate::compiler::compile`],
//! plus the query/annotate engine that operates on it (spec.md §4.6, §9).

pub mod query;

use crate::error::{Result, TopologyError};
use petgraph::graphmap::UnGraphMap;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};

/// An attribute value attached to a node. Most are plain strings; the
/// reserved `instance_idx` attribute is numeric so ordering/arithmetic on
/// it stays meaningful, but it still stringifies cleanly for query output
/// (spec.md §4.6: "non-strings are stringified").
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Str(String),
    Int(i64),
}

impl AttributeValue {
    /// The string representation used by filters and query output.
    pub fn as_display(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::Int(i) => i.to_string(),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

/// The compiled graph: an undirected adjacency map keyed by node id
/// (string), with node attributes in a parallel map, per spec.md §9's
/// "Graph representation" design note. Edges are stored in a
/// `petgraph::graphmap::UnGraphMap`, which is itself a deduplicated
/// undirected adjacency structure — inserting `(a,b)` after `(b,a)` is a
/// no-op, satisfying spec.md §9's "treat edges as an unordered-pair set
/// and deduplicate" decision for free.
#[derive(Debug)]
pub struct CompiledGraph {
    graph: UnGraphMap<u32, String>,
    id_to_key: HashMap<String, u32>,
    key_to_id: Vec<String>,
    attributes: HashMap<String, HashMap<String, AttributeValue>>,
    /// Lazy `attribute_name -> {node_id}` reverse index, built on first
    /// filter use and invalidated on every annotation write.
    attribute_index: RefCell<Option<HashMap<String, HashSet<String>>>>,
    /// The scope each edge's `link` was declared in — a named `Device` for
    /// edges the Instance Materializer produces, or `Infrastructure` for
    /// edges the Infrastructure Wirer produces. Keyed by `(min(a,b),
    /// max(a,b))`. The Validator uses this to re-check both that an edge's
    /// link resolves in its *own* declaring scope (spec.md §4.5) and that
    /// intra-device edges never cross an instance-replica boundary.
    edge_scopes: HashMap<(u32, u32), EdgeScope>,
}

/// The scope that declared an edge's `link`, used to re-check link
/// resolution at the scope it was actually declared in rather than against
/// every link name visible anywhere in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EdgeScope {
    Device(String),
    Infrastructure,
}

impl CompiledGraph {
    pub fn new() -> Self {
        Self {
            graph: UnGraphMap::new(),
            id_to_key: HashMap::new(),
            key_to_id: Vec::new(),
            attributes: HashMap::new(),
            attribute_index: RefCell::new(None),
            edge_scopes: HashMap::new(),
        }
    }

    /// Add a node with its attributes. Errors if the node id was already
    /// added — every id produced by the Instance Materializer and
    /// Infrastructure Wirer is supposed to be unique by construction, so a
    /// collision here means an upstream bug, not user input to tolerate.
    pub(crate) fn add_node(
        &mut self,
        id: String,
        attrs: HashMap<String, AttributeValue>,
    ) -> Result<()> {
        if self.id_to_key.contains_key(&id) {
            return Err(TopologyError::InvariantViolation(format!(
                "duplicate node id {id:?} produced during compilation"
            )));
        }
        let key = self.key_to_id.len() as u32;
        self.key_to_id.push(id.clone());
        self.id_to_key.insert(id.clone(), key);
        self.graph.add_node(key);
        self.attributes.insert(id, attrs);
        Ok(())
    }

    /// Add an undirected edge between two already-added nodes, declared by
    /// `device`'s own `links` table. Self-loops are rejected here as well
    /// as by the Validator, since they can never be legitimate (spec.md
    /// §4.5).
    pub(crate) fn add_edge(&mut self, from: &str, to: &str, link: String, device: &str) -> Result<()> {
        self.add_edge_inner(from, to, link, EdgeScope::Device(device.to_string()))
    }

    /// Like [`Self::add_edge`], but declared at Infrastructure scope
    /// instead of a Device's (used by the Infrastructure Wirer, which wires
    /// distinct instance replicas together by design and checks its links
    /// against `Infrastructure::links`, not any one Device's).
    pub(crate) fn add_cross_instance_edge(&mut self, from: &str, to: &str, link: String) -> Result<()> {
        self.add_edge_inner(from, to, link, EdgeScope::Infrastructure)
    }

    fn add_edge_inner(&mut self, from: &str, to: &str, link: String, scope: EdgeScope) -> Result<()> {
        let from_key = self.key_for(from)?;
        let to_key = self.key_for(to)?;
        if from_key == to_key {
            return Err(TopologyError::InvariantViolation(format!(
                "self-loop on node {from:?}"
            )));
        }
        self.graph.add_edge(from_key, to_key, link);
        let canon = (from_key.min(to_key), from_key.max(to_key));
        self.edge_scopes.insert(canon, scope);
        Ok(())
    }

    /// Every undirected edge as `(from_id, to_id, link_name, declaring_scope)`,
    /// used by the Validator's defensive re-checks.
    pub(crate) fn edges_with_provenance(&self) -> Vec<(&str, &str, &str, &EdgeScope)> {
        self.graph
            .all_edges()
            .map(|(a, b, link)| {
                let canon = (a.min(b), a.max(b));
                let scope = self
                    .edge_scopes
                    .get(&canon)
                    .expect("every edge is inserted with a scope");
                (
                    self.key_to_id[a as usize].as_str(),
                    self.key_to_id[b as usize].as_str(),
                    link.as_str(),
                    scope,
                )
            })
            .collect()
    }

    fn key_for(&self, id: &str) -> Result<u32> {
        self.id_to_key.get(id).copied().ok_or_else(|| TopologyError::UnknownEndpoint(id.to_string()))
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.id_to_key.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.key_to_id.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.key_to_id.iter().map(String::as_str)
    }

    pub fn attributes(&self, id: &str) -> Option<&HashMap<String, AttributeValue>> {
        self.attributes.get(id)
    }

    pub fn degree(&self, id: &str) -> Result<usize> {
        let key = self.key_for(id)?;
        Ok(self.graph.neighbors(key).count())
    }

    pub(crate) fn has_self_loop(&self, id: &str) -> bool {
        self.id_to_key
            .get(id)
            .is_some_and(|&key| self.graph.contains_edge(key, key))
    }

    pub fn neighbors(&self, id: &str) -> Result<Vec<&str>> {
        let key = self.key_for(id)?;
        Ok(self
            .graph
            .neighbors(key)
            .map(|n| self.key_to_id[n as usize].as_str())
            .collect())
    }

    /// Set or overwrite a node attribute. Invalidates the lazy attribute
    /// reverse index.
    pub fn annotate_one(&mut self, node_id: &str, attribute: String, value: AttributeValue) -> Result<()> {
        let attrs = self
            .attributes
            .get_mut(node_id)
            .ok_or_else(|| TopologyError::UnknownEndpoint(node_id.to_string()))?;
        attrs.insert(attribute, value);
        *self.attribute_index.borrow_mut() = None;
        Ok(())
    }

    /// Undirected BFS shortest path between `src` and `dst`, inclusive of
    /// both endpoints.
    pub fn shortest_path(&self, src: &str, dst: &str) -> Result<Vec<String>> {
        let src_key = self.key_for(src)?;
        let dst_key = self.key_for(dst)?;

        if src_key == dst_key {
            return Ok(vec![self.key_to_id[src_key as usize].clone()]);
        }

        let mut visited: HashSet<u32> = HashSet::new();
        let mut parent: HashMap<u32, u32> = HashMap::new();
        let mut queue: VecDeque<u32> = VecDeque::new();
        visited.insert(src_key);
        queue.push_back(src_key);

        while let Some(node) = queue.pop_front() {
            if node == dst_key {
                break;
            }
            for neighbor in self.graph.neighbors(node) {
                if visited.insert(neighbor) {
                    parent.insert(neighbor, node);
                    queue.push_back(neighbor);
                }
            }
        }

        if !visited.contains(&dst_key) {
            return Err(TopologyError::NoPath {
                src: src.to_string(),
                dst: dst.to_string(),
            });
        }

        let mut path = vec![dst_key];
        let mut cur = dst_key;
        while cur != src_key {
            cur = parent[&cur];
            path.push(cur);
        }
        path.reverse();

        Ok(path.into_iter().map(|k| self.key_to_id[k as usize].clone()).collect())
    }

    fn ensure_attribute_index(&self) {
        if self.attribute_index.borrow().is_some() {
            return;
        }
        let mut index: HashMap<String, HashSet<String>> = HashMap::new();
        for (node_id, attrs) in &self.attributes {
            for name in attrs.keys() {
                index.entry(name.clone()).or_default().insert(node_id.clone());
            }
        }
        *self.attribute_index.borrow_mut() = Some(index);
    }

    /// All node ids that have `attr_name` set, optionally restricted to
    /// those whose value equals `attr_value`.
    pub fn get_endpoints(&self, attr_name: &str, attr_value: Option<&str>) -> Vec<String> {
        self.ensure_attribute_index();
        let index = self.attribute_index.borrow();
        let Some(candidates) = index.as_ref().and_then(|idx| idx.get(attr_name)) else {
            return Vec::new();
        };
        let mut out: Vec<String> = candidates
            .iter()
            .filter(|id| match attr_value {
                None => true,
                Some(v) => self.attributes[id.as_str()]
                    .get(attr_name)
                    .is_some_and(|av| av.as_display() == v),
            })
            .cloned()
            .collect();
        out.sort();
        out
    }

    /// Serialize the compiled graph as node-link data — the Rust analogue
    /// of the original's `networkx.json_graph.node_link_data` dump
    /// (spec.md §6 `get_graph()`). This is not a decompiler back to an
    /// `Infrastructure` document; it's a flat view of the nodes, their
    /// attributes, and the edges between them.
    pub fn node_link_view(&self) -> NodeLinkGraph {
        let nodes = self
            .key_to_id
            .iter()
            .map(|id| NodeDatum {
                id: id.clone(),
                attributes: self.attributes[id]
                    .iter()
                    .map(|(name, value)| (name.clone(), value.as_display()))
                    .collect(),
            })
            .collect();
        let edges = self
            .edges_with_provenance()
            .into_iter()
            .map(|(source, target, link, _)| EdgeDatum {
                source: source.to_string(),
                target: target.to_string(),
                link: link.to_string(),
            })
            .collect();
        NodeLinkGraph { nodes, edges }
    }
}

impl Default for CompiledGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// A single node in a [`NodeLinkGraph`], with its attributes stringified
/// (spec.md §4.6: "non-strings are stringified").
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeDatum {
    pub id: String,
    pub attributes: HashMap<String, String>,
}

/// A single undirected edge in a [`NodeLinkGraph`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeDatum {
    pub source: String,
    pub target: String,
    pub link: String,
}

/// Serializable node-link view of a [`CompiledGraph`], returned by
/// [`crate::service::TopologyService::get_graph`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeLinkGraph {
    pub nodes: Vec<NodeDatum>,
    pub edges: Vec<EdgeDatum>,
}
