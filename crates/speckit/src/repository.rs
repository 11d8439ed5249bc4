//! Spec repository - scans candidate directories for `.spec` documents

use crate::error::{LoadError, Result};
use crate::types::{Spec, SpecDocument};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File suffix (case-insensitive) identifying spec documents
pub const SPEC_SUFFIX: &str = ".spec";

/// Options controlling how documents are accepted
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Reject documents without a `NAME` instead of skipping them
    pub strict: bool,
}

/// All known specs, keyed by name.
///
/// Read-only after loading and safe to share between concurrent jobs.
#[derive(Debug, Clone, Default)]
pub struct SpecRepository {
    specs: BTreeMap<String, Spec>,
}

impl SpecRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `candidates` in order with default options
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Self::load_with(candidates, LoadOptions::default())
    }

    /// Scan `candidates` in order, failing on the first bad document
    pub fn load_with<P: AsRef<Path>>(candidates: &[P], options: LoadOptions) -> Result<Self> {
        match Self::load_partial(candidates, options) {
            (repository, None) => Ok(repository),
            (_, Some(err)) => Err(err),
        }
    }

    /// Scan `candidates` in order and return whatever was loaded.
    ///
    /// Scanning stops at the first error. Specs loaded before it are kept, so a
    /// `Some` error means the repository may be incomplete.
    pub fn load_partial<P: AsRef<Path>>(
        candidates: &[P],
        options: LoadOptions,
    ) -> (Self, Option<LoadError>) {
        let mut repository = Self::new();

        for dir in candidates {
            if let Err(err) = repository.scan_dir(dir.as_ref(), options) {
                return (repository, Some(err));
            }
        }

        (repository, None)
    }

    /// Recursively scan one directory
    fn scan_dir(&mut self, dir: &Path, options: LoadOptions) -> Result<()> {
        if !dir.is_dir() {
            debug!("Skipping missing spec directory {}", dir.display());
            return Ok(());
        }

        debug!("Scanning spec directory {}", dir.display());

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Skipping unreadable entry under {}: {err}", dir.display());
                    continue;
                }
            };

            if entry.file_type().is_file() && is_spec_file(entry.path()) {
                self.scan_file(entry.path(), options)?;
            }
        }

        Ok(())
    }

    /// Parse one document and add it when it declares a name
    fn scan_file(&mut self, path: &Path, options: LoadOptions) -> Result<()> {
        let content = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        match parse_spec(path, &content)? {
            Some(spec) => {
                self.insert(spec);
                Ok(())
            }
            None if options.strict => Err(LoadError::MissingName {
                path: path.to_path_buf(),
            }),
            None => {
                debug!("Ignoring {}: no NAME declared", path.display());
                Ok(())
            }
        }
    }

    /// Add a spec, replacing any spec with the same name (last one wins)
    pub fn insert(&mut self, spec: Spec) {
        if let Some(previous) = self.specs.get(&spec.name) {
            warn!(
                "Spec '{}' from {} overrides {}",
                spec.name,
                spec.spec_file.display(),
                previous.spec_file.display()
            );
        }
        self.specs.insert(spec.name.clone(), spec);
    }

    pub fn get(&self, name: &str) -> Option<&Spec> {
        self.specs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }

    /// Spec names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.specs.keys().map(String::as_str).collect()
    }

    /// Specs in name order
    pub fn iter(&self) -> impl Iterator<Item = &Spec> {
        self.specs.values()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl FromIterator<Spec> for SpecRepository {
    fn from_iter<I: IntoIterator<Item = Spec>>(iter: I) -> Self {
        let mut repository = Self::new();
        for spec in iter {
            repository.insert(spec);
        }
        repository
    }
}

/// Parse a spec document; `Ok(None)` when it declares no name
pub fn parse_spec(path: &Path, content: &str) -> Result<Option<Spec>> {
    let document: SpecDocument = toml::from_str(content).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(Spec::from_document(document, &absolute(path)))
}

fn is_spec_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().to_lowercase().ends_with(SPEC_SUFFIX))
        .unwrap_or(false)
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
