//! Named flows the user can pick from.
//!
//! The catalog is a TOML document with one `[[flow]]` table per entry:
//!
//! ```toml
//! [[flow]]
//! name = "5G Registration"
//! path = "5G_Registration_Flow.json"
//! ```
//!
//! Relative paths resolve against the catalog file's directory.

use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use nucleo::{Config, Matcher, Utf32Str};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("catalog {path} lists no flows")]
    Empty { path: PathBuf },
    #[error("catalog lists flow '{0}' more than once")]
    DuplicateName(String),
    #[error("no flow named '{0}' in the catalog")]
    UnknownFlow(String),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "flow")]
    flows: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    name: String,
    path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let catalog = Self::parse(&raw, base, path)?;
        tracing::info!(path = %path.display(), flows = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    fn parse(raw: &str, base: &Path, origin: &Path) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(raw).map_err(|source| CatalogError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        if file.flows.is_empty() {
            return Err(CatalogError::Empty {
                path: origin.to_path_buf(),
            });
        }

        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(file.flows.len());
        for raw in file.flows {
            if !seen.insert(raw.name.clone()) {
                return Err(CatalogError::DuplicateName(raw.name));
            }
            let path = if raw.path.is_absolute() {
                raw.path
            } else {
                base.join(raw.path)
            };
            entries.push(CatalogEntry {
                name: raw.name,
                path,
            });
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, name: &str) -> Result<&CatalogEntry, CatalogError> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| CatalogError::UnknownFlow(name.to_string()))
    }

    /// The default selection. A loaded catalog is never empty.
    pub fn first(&self) -> &CatalogEntry {
        &self.entries[0]
    }

    /// Loads every entry, writing one `[OK]` or `[FAIL]` line per flow to
    /// `out`. Returns how many entries failed.
    pub fn check(&self, out: &mut impl Write) -> io::Result<usize> {
        let mut failed = 0;
        for entry in &self.entries {
            match crate::loader::load_flow(&entry.path) {
                Ok(flow) => writeln!(
                    out,
                    "[OK] {} ({} nodes, {} steps)",
                    entry.name,
                    flow.nodes.len(),
                    flow.steps.len()
                )?,
                Err(err) => {
                    failed += 1;
                    tracing::warn!(flow = %entry.name, error = %err, "catalog check failed");
                    writeln!(out, "[FAIL] {}: {err}", entry.name)?;
                }
            }
        }
        Ok(failed)
    }

    /// Indices of entries whose name fuzzy-matches `query`, best match first.
    /// An empty query keeps every entry in catalog order.
    pub fn filter(&self, query: &str) -> Vec<usize> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return (0..self.entries.len()).collect();
        }

        let mut matcher = Matcher::new(Config::DEFAULT);
        let mut needle_buf = Vec::new();
        let needle = Utf32Str::new(&query, &mut needle_buf);
        let mut haystack_buf = Vec::new();

        let mut scored: Vec<(usize, u16)> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| {
                let haystack = Utf32Str::new(&entry.name, &mut haystack_buf);
                matcher.fuzzy_match(haystack, needle).map(|score| (i, score))
            })
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.into_iter().map(|(i, _)| i).collect()
    }
}
