//! Python bindings: a `Workspace` holding the loaded index.

use std::path::PathBuf;

use parking_lot::RwLock;
use pyo3::prelude::*;
use pyo3::wrap_pyfunction;
use serde_json::{json, Value};

use crate::config::AnalysisConfig;
use crate::errors::IlGraphResult;
use crate::indexer::index::{MetadataIndex, SymbolIndex};
use crate::indexer::loader::load_snapshot_dir;
use crate::query::commands::{self, SymbolQuery};
use crate::query::cursor;
use crate::query::guards;
use crate::store::database::SnapshotStore;

/// Hand a JSON value to Python as native objects.
fn to_py(py: Python<'_>, value: &Value) -> PyResult<PyObject> {
    let json_str = serde_json::to_string(value)
        .map_err(|e| pyo3::exceptions::PyRuntimeError::new_err(e.to_string()))?;
    let json_module = py.import("json")?;
    json_module
        .call_method1("loads", (json_str,))
        .map(|o| o.into())
}

fn query<'q>(name: &'q str, assembly: Option<&'q str>) -> SymbolQuery<'q> {
    SymbolQuery { name, assembly }
}

#[pyclass]
pub struct Workspace {
    index: RwLock<MetadataIndex>,
    config: AnalysisConfig,
}

impl Workspace {
    fn run<F>(&self, py: Python<'_>, command: F) -> PyResult<PyObject>
    where
        F: FnOnce(&dyn SymbolIndex, &AnalysisConfig) -> IlGraphResult<Value>,
    {
        let value = {
            let index = self.index.read();
            command(&*index, &self.config)?
        };
        to_py(py, &value)
    }
}

#[pymethods]
impl Workspace {
    #[new]
    fn new() -> Self {
        Self {
            index: RwLock::new(MetadataIndex::default()),
            config: AnalysisConfig::from_env(),
        }
    }

    /// Replace the index with every snapshot under `root`.
    #[pyo3(signature = (root, workers=4))]
    fn load_dir(&self, py: Python<'_>, root: PathBuf, workers: usize) -> PyResult<PyObject> {
        let report = load_snapshot_dir(&root, workers)?;
        let summary = json!({
            "assemblies": report.index.assembly_count(),
            "types": report.index.type_count(),
            "files": report.files,
            "diagnostics": report.diagnostics,
            "elapsed_ms": report.elapsed_ms as u64,
        });
        *self.index.write() = report.index;
        to_py(py, &summary)
    }

    /// Replace the index with the contents of a snapshot store.
    fn load_store(&self, path: PathBuf) -> PyResult<usize> {
        let store = SnapshotStore::open(&path)?;
        let index = store.load_index()?;
        let count = index.assembly_count();
        *self.index.write() = index;
        Ok(count)
    }

    /// Persist the current index; returns how many assemblies were written.
    fn save_store(&self, path: PathBuf) -> PyResult<usize> {
        let mut store = SnapshotStore::open(&path)?;
        let index = self.index.read();
        Ok(store.save_index(&*index)?)
    }

    fn assembly_names(&self) -> Vec<String> {
        self.index
            .read()
            .assemblies()
            .iter()
            .map(|a| a.name.clone())
            .collect()
    }

    #[pyo3(signature = (method, assembly=None, cursor=None))]
    fn find_callers(
        &self,
        py: Python<'_>,
        method: &str,
        assembly: Option<&str>,
        cursor: Option<&str>,
    ) -> PyResult<PyObject> {
        self.run(py, |index, config| {
            commands::find_callers(index, config, &query(method, assembly), cursor)
        })
    }

    #[pyo3(signature = (field, assembly=None, cursor=None))]
    fn find_field_readers(
        &self,
        py: Python<'_>,
        field: &str,
        assembly: Option<&str>,
        cursor: Option<&str>,
    ) -> PyResult<PyObject> {
        self.run(py, |index, config| {
            commands::find_field_readers(index, config, &query(field, assembly), cursor)
        })
    }

    #[pyo3(signature = (field, assembly=None, cursor=None))]
    fn find_field_writers(
        &self,
        py: Python<'_>,
        field: &str,
        assembly: Option<&str>,
        cursor: Option<&str>,
    ) -> PyResult<PyObject> {
        self.run(py, |index, config| {
            commands::find_field_writers(index, config, &query(field, assembly), cursor)
        })
    }

    #[pyo3(signature = (type_name, assembly=None, cursor=None))]
    fn find_type_references(
        &self,
        py: Python<'_>,
        type_name: &str,
        assembly: Option<&str>,
        cursor: Option<&str>,
    ) -> PyResult<PyObject> {
        self.run(py, |index, config| {
            commands::find_type_references(index, config, &query(type_name, assembly), cursor)
        })
    }

    #[pyo3(signature = (method, assembly=None, max_depth=None))]
    fn call_graph(
        &self,
        py: Python<'_>,
        method: &str,
        assembly: Option<&str>,
        max_depth: Option<i64>,
    ) -> PyResult<PyObject> {
        self.run(py, |index, config| {
            commands::call_graph(index, config, &query(method, assembly), max_depth)
        })
    }

    /// `assembly` scopes the source type; `target_assembly` scopes the target.
    #[pyo3(signature = (source, target, assembly=None, target_assembly=None, max_path_length=None, cursor=None))]
    #[allow(clippy::too_many_arguments)]
    fn dependency_paths(
        &self,
        py: Python<'_>,
        source: &str,
        target: &str,
        assembly: Option<&str>,
        target_assembly: Option<&str>,
        max_path_length: Option<i64>,
        cursor: Option<&str>,
    ) -> PyResult<PyObject> {
        self.run(py, |index, config| {
            commands::dependency_paths(
                index,
                config,
                &query(source, assembly),
                &query(target, target_assembly),
                max_path_length,
                cursor,
            )
        })
    }

    #[pyo3(signature = (assembly=None))]
    fn assembly_dependencies(&self, py: Python<'_>, assembly: Option<&str>) -> PyResult<PyObject> {
        self.run(py, |index, _| commands::assembly_dependencies(index, assembly))
    }

    #[pyo3(signature = (assembly, include_private=None, cursor=None))]
    fn dead_code(
        &self,
        py: Python<'_>,
        assembly: &str,
        include_private: Option<bool>,
        cursor: Option<&str>,
    ) -> PyResult<PyObject> {
        self.run(py, |index, config| {
            commands::dead_code(index, config, assembly, include_private, cursor)
        })
    }

    #[pyo3(signature = (type_name, assembly=None))]
    fn hierarchy(&self, py: Python<'_>, type_name: &str, assembly: Option<&str>) -> PyResult<PyObject> {
        self.run(py, |index, _| commands::hierarchy(index, &query(type_name, assembly)))
    }

    #[pyo3(signature = (pattern, kind=None, assembly=None, cursor=None))]
    fn search(
        &self,
        py: Python<'_>,
        pattern: &str,
        kind: Option<&str>,
        assembly: Option<&str>,
        cursor: Option<&str>,
    ) -> PyResult<PyObject> {
        self.run(py, |index, config| {
            commands::search(index, config, pattern, kind, assembly, cursor)
        })
    }
}

#[pyfunction]
fn encode_cursor(offset: usize, page_size: usize) -> String {
    cursor::encode_cursor(offset, page_size)
}

/// Returns `(offset, page_size)`.
#[pyfunction]
#[pyo3(signature = (token=None))]
fn decode_cursor(token: Option<&str>) -> PyResult<(usize, usize)> {
    let request = cursor::decode_cursor(token)?;
    Ok((request.offset, request.page_size))
}

pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Workspace>()?;

    m.add("DEFAULT_PAGE_SIZE", guards::DEFAULT_PAGE_SIZE)?;
    m.add("MAX_PAGE_SIZE", guards::MAX_PAGE_SIZE)?;
    m.add("DEFAULT_CALL_DEPTH", guards::DEFAULT_CALL_DEPTH)?;
    m.add("MAX_CALL_DEPTH", guards::MAX_CALL_DEPTH)?;
    m.add("DEFAULT_PATH_LENGTH", guards::DEFAULT_PATH_LENGTH)?;
    m.add("MAX_PATH_LENGTH", guards::MAX_PATH_LENGTH)?;

    m.add_function(wrap_pyfunction!(encode_cursor, m)?)?;
    m.add_function(wrap_pyfunction!(decode_cursor, m)?)?;
    Ok(())
}
