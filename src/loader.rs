use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::Flow;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read flow file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed flow file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("flow file {path} declares no nodes")]
    NoNodes { path: PathBuf },
    #[error("flow file {path} declares node '{id}' twice")]
    DuplicateNode { path: PathBuf, id: String },
    #[error("step {step} in {path} references unknown node '{id}'")]
    UnknownNode {
        path: PathBuf,
        step: usize,
        id: String,
    },
}

/// Reads and validates a flow file. Always hits the disk, so edits to the
/// file show up on the next selection.
pub fn load_flow(path: &Path) -> Result<Flow, LoadError> {
    let raw = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let flow = parse_flow(&raw, path)?;
    tracing::debug!(
        path = %path.display(),
        nodes = flow.nodes.len(),
        steps = flow.steps.len(),
        "flow loaded"
    );
    Ok(flow)
}

fn parse_flow(raw: &str, path: &Path) -> Result<Flow, LoadError> {
    let flow: Flow = serde_json::from_str(raw).map_err(|source| LoadError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;
    validate(&flow, path)?;
    Ok(flow)
}

fn validate(flow: &Flow, path: &Path) -> Result<(), LoadError> {
    if flow.nodes.is_empty() {
        return Err(LoadError::NoNodes {
            path: path.to_path_buf(),
        });
    }

    let mut ids = HashSet::with_capacity(flow.nodes.len());
    for node in &flow.nodes {
        if !ids.insert(node.id.as_str()) {
            return Err(LoadError::DuplicateNode {
                path: path.to_path_buf(),
                id: node.id.clone(),
            });
        }
    }

    for (i, step) in flow.steps.iter().enumerate() {
        for id in [&step.source, &step.target] {
            if !ids.contains(id.as_str()) {
                return Err(LoadError::UnknownNode {
                    path: path.to_path_buf(),
                    step: i + 1,
                    id: id.clone(),
                });
            }
        }
    }
    Ok(())
}
