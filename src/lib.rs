//! # Topology Compiler
//!
//! Compiles a declarative description of infrastructure — reusable
//! `Device` templates, their internal wiring, and named `Instance`
//! replications wired together at the `Infrastructure` level — into a
//! validated, queryable, annotatable undirected graph.
//!
//! See [`model`] for the document types, [`compiler`] for the compilation
//! pipeline, [`graph`] for the compiled graph and its query engine, and
//! [`service`] for the stateful façade most callers should reach for first.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compiler;
pub mod error;
pub mod graph;
pub mod io;
pub mod model;
pub mod service;

pub use error::{SliceError, TopologyError};
pub use model::{
    Annotation, Component, ComponentKind, Device, DeviceEdge, DeviceEndpoint, Infrastructure,
    InfrastructureEdge, InfrastructureEndpoint, Instance, Link, LinkPhysical, Scheme,
};

pub use compiler::compile;
pub use graph::query::{Filter, FilterOp, Match};
pub use graph::{AttributeValue, CompiledGraph, EdgeDatum, NodeDatum, NodeLinkGraph};
pub use io::Codec;
#[cfg(feature = "json")]
pub use io::JsonCodec;
pub use service::TopologyService;
