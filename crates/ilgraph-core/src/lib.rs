//! ilgraph core library: static analysis over managed assembly metadata.
//!
//! The crate loads assembly snapshots into an in-memory [`indexer::index::MetadataIndex`]
//! and answers usage, reference, call-graph, dependency and dead-code queries
//! over it. Results are plain serializable data; list results are paginated
//! with opaque cursors. With the `python` feature the crate also builds as a
//! Python extension module (`_ilgraph_core`) via PyO3.

pub mod config;
pub mod errors;
pub mod indexer;
pub mod models;
pub mod query;
pub mod store;

#[cfg(feature = "python")]
mod python;

#[cfg(feature = "python")]
use pyo3::prelude::*;

// ---------------------------------------------------------------------------
// Top-level Python module: _ilgraph_core
// ---------------------------------------------------------------------------

#[cfg(feature = "python")]
#[pymodule]
fn _ilgraph_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    python::register(m)
}
