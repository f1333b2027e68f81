//! Style catalog provider.
//!
//! The catalog maps style identifiers to the references handed to the
//! formatter. It is loaded once per run and never mutated afterwards.

use crate::domain::{RegressError, StyleId, StyleRef};
use globset::Glob;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const STYLE_FILE_GLOB: &str = "*.csl";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleCatalog {
    styles: BTreeMap<StyleId, StyleRef>,
}

impl StyleCatalog {
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let styles = entries
            .into_iter()
            .map(|(identifier, reference)| (StyleId::new(identifier), StyleRef::new(reference)))
            .collect();
        Self { styles }
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    pub fn get(&self, identifier: &str) -> Option<(&StyleId, &StyleRef)> {
        self.styles.get_key_value(identifier)
    }

    /// The only style, when the catalog holds exactly one.
    pub fn single(&self) -> Option<(&StyleId, &StyleRef)> {
        if self.styles.len() == 1 {
            self.styles.iter().next()
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StyleId, &StyleRef)> {
        self.styles.iter()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("style catalog '{}' does not exist", .path.display())]
    Missing { path: PathBuf },
    #[error("failed to read style catalog '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse style catalog '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("style catalog '{}' must contain a JSON object", .path.display())]
    NotAnObject { path: PathBuf },
    #[error(
        "style catalog '{}' entry '{identifier}' must map to a string reference",
        .path.display()
    )]
    InvalidEntry { path: PathBuf, identifier: String },
    #[error("invalid style file pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

impl From<CatalogError> for RegressError {
    fn from(error: CatalogError) -> Self {
        let message = error.to_string();
        match error {
            CatalogError::Missing { .. } | CatalogError::Read { .. } => {
                RegressError::io_system("IO.STYLE_CATALOG", message)
            }
            CatalogError::Parse { .. }
            | CatalogError::NotAnObject { .. }
            | CatalogError::InvalidEntry { .. } => {
                RegressError::input_validation("INPUT.STYLE_CATALOG", message)
            }
            CatalogError::InvalidGlob { .. } => RegressError::internal("SYS.STYLE_GLOB", message),
        }
    }
}

/// Loads the catalog from a directory of `.csl` files or from a JSON object
/// mapping identifiers to references.
pub fn load_style_catalog(path: &Path) -> Result<StyleCatalog, CatalogError> {
    let catalog = if path.is_dir() {
        load_style_directory(path)?
    } else if path.is_file() {
        load_style_manifest(path)?
    } else {
        return Err(CatalogError::Missing {
            path: path.to_path_buf(),
        });
    };

    debug!(
        catalog = %path.display(),
        styles = catalog.len(),
        "loaded style catalog"
    );
    Ok(catalog)
}

fn load_style_directory(directory: &Path) -> Result<StyleCatalog, CatalogError> {
    let matcher = Glob::new(STYLE_FILE_GLOB)
        .map_err(|source| CatalogError::InvalidGlob {
            pattern: STYLE_FILE_GLOB.to_string(),
            source,
        })?
        .compile_matcher();

    let entries = fs::read_dir(directory).map_err(|source| CatalogError::Read {
        path: directory.to_path_buf(),
        source,
    })?;

    let mut styles = BTreeMap::new();
    for entry in entries {
        let entry = entry.map_err(|source| CatalogError::Read {
            path: directory.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() || !matcher.is_match(entry.file_name()) {
            continue;
        }

        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        styles.insert(
            StyleId::new(stem),
            StyleRef::new(path.to_string_lossy().into_owned()),
        );
    }

    Ok(StyleCatalog { styles })
}

fn load_style_manifest(path: &Path) -> Result<StyleCatalog, CatalogError> {
    let content = fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: Value = serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let Value::Object(entries) = parsed else {
        return Err(CatalogError::NotAnObject {
            path: path.to_path_buf(),
        });
    };

    let mut styles = BTreeMap::new();
    for (identifier, reference) in entries {
        let Value::String(reference) = reference else {
            return Err(CatalogError::InvalidEntry {
                path: path.to_path_buf(),
                identifier,
            });
        };
        styles.insert(StyleId::new(identifier), StyleRef::new(reference));
    }

    Ok(StyleCatalog { styles })
}
