//! Spec data model and the on-disk document schema

use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

/// `CONTENT.source` tag marking content shipped next to the spec file
pub const SPEC_LOCAL_CONTENT: &str = "spec";

/// Directory (next to the spec file) holding config templates
pub const CONFIGS_DIR: &str = "configs";

/// Directory (next to the spec file) holding verbatim content
pub const CONTENT_DIR: &str = "content";

// ============================================================================
// Spec
// ============================================================================

/// One named unit of configuration.
///
/// Specs are immutable once loaded; the resolver only ever reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Spec {
    pub name: String,
    pub version: String,
    pub requires: Vec<String>,
    pub packages: Packages,
    pub configs: Configs,
    pub content: Content,
    pub commands: Commands,
    /// File the spec was loaded from
    pub spec_file: PathBuf,
    /// Directory containing `spec_file`; config and content roots hang off it
    pub spec_root: PathBuf,
}

impl Spec {
    /// Create an empty spec with the given name and no origin file
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: String::new(),
            requires: Vec::new(),
            packages: Packages::default(),
            configs: Configs::default(),
            content: Content::default(),
            commands: Commands::default(),
            spec_file: PathBuf::new(),
            spec_root: PathBuf::new(),
        }
    }

    /// Build a spec from a parsed document.
    ///
    /// Returns `None` when the document declares no (or an empty) `NAME`.
    pub fn from_document(document: SpecDocument, spec_file: &Path) -> Option<Self> {
        let name = document.name.filter(|n| !n.trim().is_empty())?;
        let spec_root = spec_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Some(Self {
            name,
            version: document.version,
            requires: document.requires,
            packages: document.packages,
            configs: document.configs,
            content: document.content,
            commands: document.commands,
            spec_file: spec_file.to_path_buf(),
            spec_root,
        })
    }

    /// Declared requirements with blank and `""` placeholder entries removed
    pub fn requirements(&self) -> impl Iterator<Item = &str> {
        self.requires
            .iter()
            .map(String::as_str)
            .filter(|r| !is_placeholder(r))
    }

    /// Source directory of config templates
    pub fn configs_dir(&self) -> PathBuf {
        self.spec_root.join(CONFIGS_DIR)
    }

    /// Source directory of spec-local content
    pub fn content_dir(&self) -> PathBuf {
        self.spec_root.join(CONTENT_DIR)
    }
}

/// Whether a `REQUIRES` entry is a blank or quoted-empty placeholder
pub fn is_placeholder(requirement: &str) -> bool {
    let trimmed = requirement.trim();
    trimmed.is_empty() || trimmed == "\"\""
}

// ============================================================================
// Sections
// ============================================================================

/// `[PACKAGES]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packages {
    #[serde(default, deserialize_with = "comma_list")]
    pub apt_get: Vec<String>,

    /// Suppress packages of this spec and everything it requires
    #[serde(default)]
    pub skip_packages: bool,
}

/// `[CONFIGS]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configs {
    /// Destination root for files under `configs/`; empty disables the mapping
    #[serde(default)]
    pub debian_root: String,

    #[serde(default)]
    pub skip_interpolate: bool,

    /// `chown` argument applied after install (e.g. "root:root")
    #[serde(default)]
    pub owner: Option<String>,

    /// `chmod` argument applied after install (e.g. "0644")
    #[serde(default)]
    pub mode: Option<String>,
}

/// `[CONTENT]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    /// Source kind; only [`SPEC_LOCAL_CONTENT`] is transferred
    #[serde(default)]
    pub source: String,

    #[serde(default)]
    pub debian_root: String,

    #[serde(default)]
    pub owner: Option<String>,

    #[serde(default)]
    pub mode: Option<String>,
}

impl Content {
    pub fn is_spec_local(&self) -> bool {
        self.source == SPEC_LOCAL_CONTENT
    }
}

/// `[COMMANDS]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commands {
    #[serde(default, deserialize_with = "one_or_many")]
    pub pre: Vec<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub post: Vec<String>,

    #[serde(default)]
    pub skip_pre: bool,

    #[serde(default)]
    pub skip_post: bool,

    /// Forward the output of successful pre commands to the reporter
    #[serde(default)]
    pub tail_pre: bool,

    /// Forward the output of successful post commands to the reporter
    #[serde(default)]
    pub tail_post: bool,
}

// ============================================================================
// Document Schema
// ============================================================================

/// Raw `.spec` document as written on disk.
///
/// Top-level keys are upper case (`NAME`, `VERSION`, `REQUIRES`) and must
/// precede the sections.
#[derive(Debug, Default, Deserialize)]
pub struct SpecDocument {
    #[serde(rename = "NAME", default)]
    pub name: Option<String>,

    #[serde(rename = "VERSION", default)]
    pub version: String,

    #[serde(rename = "REQUIRES", default, deserialize_with = "comma_list")]
    pub requires: Vec<String>,

    #[serde(rename = "PACKAGES", default)]
    pub packages: Packages,

    #[serde(rename = "CONFIGS", default)]
    pub configs: Configs,

    #[serde(rename = "CONTENT", default)]
    pub content: Content,

    #[serde(rename = "COMMANDS", default)]
    pub commands: Commands,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

/// Accept `["a", "b"]` or `"a, b"`
fn comma_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match StringOrList::deserialize(deserializer)? {
        StringOrList::One(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        StringOrList::Many(items) => items,
    })
}

/// Accept `["cmd a", "cmd b"]` or a single `"cmd"`; commands may contain commas
fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match StringOrList::deserialize(deserializer)? {
        StringOrList::One(s) if s.trim().is_empty() => Vec::new(),
        StringOrList::One(s) => vec![s],
        StringOrList::Many(items) => items,
    })
}

// ============================================================================
// File Transfers
// ============================================================================

/// A single file to install on the target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileTransfer {
    /// Absolute source path
    pub source: PathBuf,
    /// Absolute destination path
    pub destination: PathBuf,
    /// Parent directory of `destination`
    pub destination_folder: PathBuf,
    /// Run the file through the interpolator before installing
    pub interpolate: bool,
    pub owner: Option<String>,
    pub mode: Option<String>,
}

impl FileTransfer {
    pub fn new(source: PathBuf, destination: PathBuf, interpolate: bool) -> Self {
        let destination_folder = destination
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Self {
            source,
            destination,
            destination_folder,
            interpolate,
            owner: None,
            mode: None,
        }
    }

    pub fn with_permissions(mut self, owner: Option<String>, mode: Option<String>) -> Self {
        self.owner = owner;
        self.mode = mode;
        self
    }
}
