//! Package discovery inside a single extension directory.
//!
//! Layout: `<extension>/<namespace>/<path...>/__init__.py`. A directory holding
//! the marker is a package and a leaf: its own sub-packages are reached through
//! the link to it, so they are not reported separately.

use anyhow::Result;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::Namespace;
use crate::runtime::Runtime;

/// File whose presence makes a directory an importable package.
pub const PACKAGE_MARKER: &str = "__init__.py";

/// Directory levels below a namespace directory that are searched.
pub const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredPackage {
    /// Absolute directory containing the marker file.
    pub source: PathBuf,
    /// Path of `source` relative to the namespace directory it was found under.
    pub relative_path: PathBuf,
    pub namespace: Namespace,
}

/// Find every package below `<extension_dir>/<namespace>` for each allowed namespace.
///
/// Namespaces without a directory in the extension are skipped silently.
/// Results are grouped by namespace in the order given and sorted by path
/// within each namespace.
#[tracing::instrument(skip(runtime))]
pub fn find_packages<R: Runtime>(
    runtime: &R,
    extension_dir: &Path,
    namespaces: &[Namespace],
) -> Result<Vec<DiscoveredPackage>> {
    let mut packages = Vec::new();

    for &namespace in namespaces {
        let namespace_dir = extension_dir.join(namespace.dir_name());
        if !runtime.is_dir(&namespace_dir) {
            continue;
        }
        info!("Searching namespace directory {:?}", namespace_dir);
        packages.extend(walk_namespace(runtime, &namespace_dir, namespace)?);
    }

    Ok(packages)
}

fn walk_namespace<R: Runtime>(
    runtime: &R,
    namespace_dir: &Path,
    namespace: Namespace,
) -> Result<Vec<DiscoveredPackage>> {
    let mut found = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![(namespace_dir.to_path_buf(), 0usize)];

    while let Some((dir, depth)) = stack.pop() {
        // Symlinked directories may loop back onto an ancestor
        let key = runtime.canonicalize(&dir).unwrap_or_else(|_| dir.clone());
        if !visited.insert(key) {
            debug!("Already visited {:?}, skipping", dir);
            continue;
        }

        if is_package(runtime, &dir) {
            let Ok(relative_path) = dir.strip_prefix(namespace_dir) else {
                continue;
            };
            if relative_path.as_os_str().is_empty() {
                // Its link would be the namespace root itself
                warn!(
                    "Namespace directory {:?} is itself a package; nothing below it is linked",
                    dir
                );
            } else {
                info!("Found package {:?} -> {:?}", dir, relative_path);
                found.push(DiscoveredPackage {
                    source: dir.clone(),
                    relative_path: relative_path.to_path_buf(),
                    namespace,
                });
            }
            continue;
        }

        if depth >= MAX_DEPTH {
            warn!(
                "Stopping at {:?}: more than {} levels below {:?}",
                dir, MAX_DEPTH, namespace_dir
            );
            continue;
        }

        let mut children: Vec<PathBuf> = runtime
            .read_dir(&dir)?
            .into_iter()
            .filter(|child| runtime.is_dir(child))
            .collect();
        // Reverse order on the stack so children pop in ascending order
        children.sort();
        for child in children.into_iter().rev() {
            stack.push((child, depth + 1));
        }
    }

    found.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(found)
}

fn is_package<R: Runtime>(runtime: &R, dir: &Path) -> bool {
    let marker = dir.join(PACKAGE_MARKER);
    runtime.exists(&marker) && !runtime.is_dir(&marker)
}
