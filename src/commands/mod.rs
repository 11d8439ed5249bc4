pub mod configure;
pub mod specs;

use crate::Context;
use anyhow::{Context as AnyhowContext, Result};
use speckit::{LoadOptions, SpecRepository};

/// Load every spec from the effective candidate directories
pub fn load_repository(ctx: &Context) -> Result<SpecRepository> {
    let dirs = ctx.spec_dirs();
    log::debug!("Loading specs from {dirs:?}");

    SpecRepository::load_with(&dirs, LoadOptions { strict: ctx.strict })
        .context("Error reading spec files")
}
