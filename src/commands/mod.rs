//! Entry points shared by the CLI and the install hooks.

use anyhow::Result;

use crate::application::{CreateAction, RemoveAction};
use crate::config::Config;
use crate::runtime::Runtime;

mod hooks;

pub use hooks::{SKIP_CREATE_ENV, SKIP_REMOVE_ENV, install_hook, uninstall_hook};

/// Resolve the environment and link every extension package.
///
/// Returns the number of links created or refreshed.
#[tracing::instrument(skip(runtime))]
pub fn create<R: Runtime>(runtime: R) -> Result<usize> {
    let config = Config::resolve(&runtime)?;
    run_create(&runtime, &config)
}

#[tracing::instrument(skip(runtime, config))]
pub fn run_create<R: Runtime>(runtime: &R, config: &Config) -> Result<usize> {
    let report = CreateAction::new(runtime, config).run()?;
    Ok(report.linked)
}

/// Resolve the environment and remove everything the record lists.
///
/// Returns the number of links and directories removed or already absent.
#[tracing::instrument(skip(runtime))]
pub fn remove<R: Runtime>(runtime: R) -> Result<usize> {
    let config = Config::resolve(&runtime)?;
    run_remove(&runtime, &config)
}

#[tracing::instrument(skip(runtime, config))]
pub fn run_remove<R: Runtime>(runtime: &R, config: &Config) -> Result<usize> {
    let report = RemoveAction::new(runtime, config).run()?;
    Ok(report.count())
}
