//! Locates the active environment's site-packages directory and checks the
//! namespace roots inside it.

use anyhow::Result;
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};

use crate::config::{Namespace, NamespaceRoots};
use crate::error::LinkError;
use crate::runtime::Runtime;

/// Explicit site-packages override.
pub const SITE_PACKAGES_ENV: &str = "ISAACSIM_LINKS_SITE_PACKAGES";

/// Interpreter used to query `site.getsitepackages()`, tried before `python3` and `python`.
pub const PYTHON_ENV: &str = "PYTHON";

const SITE_PACKAGES_MARKER: &str = "site-packages";

/// Prints `site.getsitepackages()` followed by `sys.path`, one entry per line.
const SITE_QUERY: &str = "import site, sys\n\
for p in getattr(site, 'getsitepackages', lambda: [])(): print(p)\n\
for p in sys.path: print(p)";

/// Find the first candidate that names a site-packages directory and exists on disk.
#[tracing::instrument(skip(runtime))]
pub fn find_site_packages<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    if let Some(explicit) = non_empty_var(runtime, SITE_PACKAGES_ENV) {
        let explicit = PathBuf::from(explicit);
        if is_site_packages(runtime, &explicit) {
            info!("Using site-packages from {}: {:?}", SITE_PACKAGES_ENV, explicit);
            return Ok(explicit);
        }
        warn!(
            "{} is set to {:?}, which is not an existing site-packages directory; ignoring it",
            SITE_PACKAGES_ENV, explicit
        );
    }

    let candidate = interpreter_candidates(runtime)
        .into_iter()
        .chain(prefix_candidates(runtime))
        .find(|p| is_site_packages(runtime, p));

    match candidate {
        Some(site_packages) => {
            info!("Using site-packages: {:?}", site_packages);
            Ok(site_packages)
        }
        None => Err(LinkError::SitePackagesNotFound.into()),
    }
}

fn is_site_packages<R: Runtime>(runtime: &R, path: &Path) -> bool {
    path.to_string_lossy().contains(SITE_PACKAGES_MARKER) && runtime.is_dir(path)
}

fn non_empty_var<R: Runtime>(runtime: &R, key: &str) -> Option<String> {
    runtime
        .env_var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Ask the first interpreter that runs for its site-packages and `sys.path`.
fn interpreter_candidates<R: Runtime>(runtime: &R) -> Vec<PathBuf> {
    let mut interpreters = Vec::new();
    if let Some(python) = non_empty_var(runtime, PYTHON_ENV) {
        interpreters.push(python);
    }
    interpreters.push("python3".to_string());
    interpreters.push("python".to_string());

    let args = ["-c".to_string(), SITE_QUERY.to_string()];
    for interpreter in interpreters {
        match runtime.command_stdout(&interpreter, &args) {
            Ok(stdout) => {
                debug!("{} reported site directories:\n{}", interpreter, stdout);
                return stdout
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(PathBuf::from)
                    .collect();
            }
            Err(e) => debug!("Could not query {}: {:#}", interpreter, e),
        }
    }
    Vec::new()
}

/// Conventional site-packages locations under an active virtualenv or conda prefix.
fn prefix_candidates<R: Runtime>(runtime: &R) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    for var in ["VIRTUAL_ENV", "CONDA_PREFIX"] {
        let Some(prefix) = non_empty_var(runtime, var) else {
            continue;
        };
        let escaped = glob::Pattern::escape(&prefix);
        for pattern in [
            format!("{}/lib/python*/site-packages", escaped),
            format!("{}/Lib/site-packages", escaped),
        ] {
            match glob::glob(&pattern) {
                Ok(paths) => {
                    let mut found: Vec<PathBuf> = paths.flatten().collect();
                    found.sort();
                    candidates.extend(found);
                }
                Err(e) => debug!("Invalid glob pattern {}: {}", pattern, e),
            }
        }
    }
    candidates
}

/// Check that the `isaacsim` and `omni` roots exist before anything is linked into them.
#[tracing::instrument(skip(runtime, roots))]
pub fn check_namespace_roots<R: Runtime>(runtime: &R, roots: &NamespaceRoots) -> Result<()> {
    for namespace in [Namespace::Isaacsim, Namespace::Omni] {
        let path = roots.get(namespace);
        if !runtime.is_dir(path) {
            error!("{} directory not found: {:?}", namespace, path);
            return Err(LinkError::NamespaceRootMissing {
                namespace,
                path: path.to_path_buf(),
            }
            .into());
        }
    }
    Ok(())
}

/// Create the `carb` root if it is missing.
///
/// Returns its path when this call created it, so the caller can record it as
/// tool-created. A creation failure is logged and yields `None`.
#[tracing::instrument(skip(runtime, roots))]
pub fn ensure_carb_root<R: Runtime>(runtime: &R, roots: &NamespaceRoots) -> Option<PathBuf> {
    if runtime.is_dir(&roots.carb) {
        return None;
    }

    warn!("carb directory not found: {:?}", roots.carb);
    match runtime.create_dir_all(&roots.carb) {
        Ok(()) => {
            info!("Created directory {:?}", roots.carb);
            Some(roots.carb.clone())
        }
        Err(e) => {
            error!("Failed to create carb directory {:?}: {:#}", roots.carb, e);
            None
        }
    }
}
