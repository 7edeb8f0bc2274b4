//! Domain logic for the vision-on-edge operator console.
//!
//! Everything here is synchronous and I/O free: wizard form state
//! machines, the skill graph editor model, entity records with their
//! defensive normalization, list filtering and the route table. The
//! `voe-client` crate wires these to the REST backend.

pub mod entities;
pub mod error;
pub mod filter;
pub mod routes;
pub mod skill_graph;
pub mod tags;
pub mod types;
pub mod validation;
pub mod wizard;
