//! Table catalog
//!
//! Table names and their creation options, persisted as
//! `<home>/metadata/catalog.json`. Every table gets a numeric id used to name
//! its checkpoint image file. The catalog is rewritten (temp file, fsync,
//! rename) on every table creation.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::TableOptions;
use crate::sync::{read, write};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("table '{0}' already exists")]
    TableExists(String),

    #[error("catalog I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("catalog at {path} is unreadable: {message}")]
    Parse { path: PathBuf, message: String },
}

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    pub name: String,
    pub id: u32,
    pub options: TableOptions,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct CatalogFile {
    format_version: u8,
    tables: Vec<TableEntry>,
}

#[derive(Debug)]
pub struct Catalog {
    path: PathBuf,
    tables: RwLock<BTreeMap<String, TableEntry>>,
}

impl Catalog {
    /// Path of the catalog file inside a home directory.
    pub fn catalog_path(home: &Path) -> PathBuf {
        home.join("metadata").join("catalog.json")
    }

    /// Loads the catalog from `home`, empty if none was written yet.
    pub fn open(home: &Path) -> CatalogResult<Self> {
        let path = Self::catalog_path(home);
        let tables = match fs::read_to_string(&path) {
            Ok(json) => {
                let file: CatalogFile =
                    serde_json::from_str(&json).map_err(|e| CatalogError::Parse {
                        path: path.clone(),
                        message: e.to_string(),
                    })?;
                file.tables
                    .into_iter()
                    .map(|entry| (entry.name.clone(), entry))
                    .collect()
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(CatalogError::Io { path, source }),
        };

        Ok(Self {
            path,
            tables: RwLock::new(tables),
        })
    }

    /// Adds a table and persists the catalog before returning.
    pub fn create(&self, name: &str, options: TableOptions) -> CatalogResult<TableEntry> {
        let mut tables = write(&self.tables);
        if tables.contains_key(name) {
            return Err(CatalogError::TableExists(name.to_string()));
        }

        let id = tables.values().map(|t| t.id + 1).max().unwrap_or(1);
        let entry = TableEntry {
            name: name.to_string(),
            id,
            options,
        };

        let mut next = tables.clone();
        next.insert(name.to_string(), entry.clone());
        self.persist(&next)?;
        *tables = next;
        Ok(entry)
    }

    /// Looks up a table by name.
    pub fn get(&self, name: &str) -> Option<TableEntry> {
        read(&self.tables).get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        read(&self.tables).contains_key(name)
    }

    /// All tables in name order.
    pub fn entries(&self) -> Vec<TableEntry> {
        read(&self.tables).values().cloned().collect()
    }

    fn persist(&self, tables: &BTreeMap<String, TableEntry>) -> CatalogResult<()> {
        let io_err = |source| CatalogError::Io {
            path: self.path.clone(),
            source,
        };

        let file = CatalogFile {
            format_version: 1,
            tables: tables.values().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|e| CatalogError::Parse {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let mut out = File::create(&tmp).map_err(io_err)?;
        out.write_all(json.as_bytes()).map_err(io_err)?;
        out.sync_all().map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let catalog = Catalog::open(dir.path()).unwrap();
            catalog.create("a", TableOptions::default()).unwrap();
            let unlogged = TableOptions {
                log_enabled: false,
                ..TableOptions::default()
            };
            catalog.create("b", unlogged).unwrap();
        }

        let catalog = Catalog::open(dir.path()).unwrap();
        let names: Vec<String> = catalog.entries().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(!catalog.get("b").unwrap().options.log_enabled);
        assert_ne!(catalog.get("a").unwrap().id, catalog.get("b").unwrap().id);
    }

    #[test]
    fn test_duplicate_table_rejected() {
        let dir = TempDir::new().unwrap();
        let catalog = Catalog::open(dir.path()).unwrap();
        catalog.create("a", TableOptions::default()).unwrap();
        assert!(matches!(
            catalog.create("a", TableOptions::default()),
            Err(CatalogError::TableExists(_))
        ));
    }
}
