//! # speckit
//!
//! Declarative configuration specs and the dependency-aware aggregation
//! engine behind `cm`.
//!
//! - [`Spec`]: one named unit of configuration (packages, config/content
//!   roots, pre/post commands, requirements)
//! - [`SpecRepository`]: every spec found under a list of candidate
//!   directories, keyed by name
//! - [`Resolver`]: dependency-ordered, deduplicated package and command
//!   lists, file-transfer manifests and requirement trees
//!
//! ## Example
//!
//! ```no_run
//! use speckit::SpecRepository;
//!
//! let repository = SpecRepository::load(&["./specs"])?;
//! let resolver = repository.resolver();
//!
//! for command in resolver.pre_commands("web")? {
//!     println!("{command}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod dedup;
mod error;
mod repository;
mod resolver;
mod tree;
mod types;

pub use dedup::dedup_first;
pub use error::{LoadError, ResolveError, Result};
pub use repository::{parse_spec, LoadOptions, SpecRepository, SPEC_SUFFIX};
pub use resolver::{
    apt_get_commands, BuildPlan, CommandPhase, Resolver, DEFAULT_PRIVILEGE,
};
pub use tree::RequireNode;
pub use types::{
    is_placeholder, Commands, Configs, Content, FileTransfer, Packages, Spec, SpecDocument,
    CONFIGS_DIR, CONTENT_DIR, SPEC_LOCAL_CONTENT,
};
