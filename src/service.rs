//! Synchronous service facade over the compiler and the query/annotate
//! engine (spec.md §6). One `TopologyService` owns the source document and
//! its most recently compiled graph; nothing here is async or shared —
//! spec.md's model has one writer per service instance, so there's no
//! `Arc<RwLock<_>>` scaffolding to carry over from the network service this
//! crate started from.

use crate::compiler;
use crate::error::{Result, TopologyError};
use crate::graph::query::{self, Filter, Match};
use crate::graph::{AttributeValue, CompiledGraph, NodeLinkGraph};
use crate::model::{Annotation, Infrastructure};

/// Owns the current compiled graph and the document it came from.
#[derive(Debug, Default)]
pub struct TopologyService {
    graph: Option<CompiledGraph>,
    source: Option<Infrastructure>,
}

impl TopologyService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `infra` and replace the current graph. All-or-nothing: if
    /// compilation fails, the previously compiled graph (if any) is left
    /// untouched (spec.md §7).
    pub fn set_graph(&mut self, infra: Infrastructure) -> Result<()> {
        tracing::info!(
            infrastructure = %infra.name,
            devices = infra.devices.len(),
            instances = infra.instances.len(),
            "compiling infrastructure"
        );
        let mut graph = compiler::compile(&infra)?;
        for annotation in &infra.annotations {
            graph.annotate_one(
                &annotation.node_id,
                annotation.attribute.clone(),
                AttributeValue::Str(annotation.value.clone()),
            )?;
        }
        tracing::info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "compiled infrastructure"
        );
        self.graph = Some(graph);
        self.source = Some(infra);
        Ok(())
    }

    /// Borrow the current compiled graph.
    pub fn graph(&self) -> Result<&CompiledGraph> {
        self.graph.as_ref().ok_or(TopologyError::NotInitialized)
    }

    /// Borrow the source document the current graph was compiled from.
    pub fn source(&self) -> Result<&Infrastructure> {
        self.source.as_ref().ok_or(TopologyError::NotInitialized)
    }

    /// Serialize the current graph's nodes, edges, and attributes as
    /// node-link data (spec.md §6), the Rust analogue of the original's
    /// `yaml.dump(json_graph.node_link_data(...))`. This is not a
    /// decompiler back to an `Infrastructure` document (spec.md §5) — for
    /// programmatic traversal of the live graph, use [`Self::graph`].
    pub fn get_graph(&self) -> Result<NodeLinkGraph> {
        Ok(self.graph()?.node_link_view())
    }

    /// Apply a batch of annotations to an already-compiled graph. Per
    /// spec.md §7, annotation is all-or-nothing: if any `node_id` in
    /// `requests` is unknown, the whole batch aborts with no partial
    /// mutation (callers may pre-filter against `get_endpoints`/`query_graph`).
    pub fn annotate_graph(&mut self, requests: &[Annotation]) -> Result<()> {
        let graph = self.graph.as_mut().ok_or(TopologyError::NotInitialized)?;
        for request in requests {
            if !graph.contains_node(&request.node_id) {
                return Err(TopologyError::UnknownEndpoint(request.node_id.clone()));
            }
        }
        for request in requests {
            graph.annotate_one(
                &request.node_id,
                request.attribute.clone(),
                AttributeValue::Str(request.value.clone()),
            )?;
        }
        if let Some(source) = self.source.as_mut() {
            source.annotations.extend(requests.iter().cloned());
        }
        Ok(())
    }

    /// Run a conjunctive filter query over the current graph.
    pub fn query_graph(&self, filters: &[Filter]) -> Result<Vec<Match>> {
        query::query(self.graph()?, filters)
    }

    /// Shortest path (by edge count) between two node ids.
    pub fn get_shortest_path(&self, src: &str, dst: &str) -> Result<Vec<String>> {
        self.graph()?.shortest_path(src, dst)
    }

    /// Every node id carrying `attribute`, optionally filtered to a value.
    pub fn get_endpoints(&self, attribute: &str, value: Option<&str>) -> Result<Vec<String>> {
        Ok(self.graph()?.get_endpoints(attribute, value))
    }
}
