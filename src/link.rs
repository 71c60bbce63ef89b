//! Symlink primitives used by the create and remove actions.
//!
//! Nothing here deletes or overwrites a path unless the caller already knows
//! (through the record) that this tool created it.

use anyhow::Result;
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};

use crate::config::NamespaceRoots;
use crate::record::LinkRecord;
use crate::runtime::Runtime;

/// Hint logged next to symlink failures on Windows.
pub const WINDOWS_SYMLINK_HINT: &str =
    "On Windows, run as administrator or enable Developer Mode to create symlinks.";

/// Incidental entries an otherwise empty directory may still hold.
#[cfg(target_os = "macos")]
const IGNORED_ENTRIES: &[&str] = &[".DS_Store"];
#[cfg(windows)]
const IGNORED_ENTRIES: &[&str] = &["thumbs.db"];
#[cfg(not(any(target_os = "macos", windows)))]
const IGNORED_ENTRIES: &[&str] = &[];

/// What [`LinkManager::create_link_safely`] did with one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// A new link was created where nothing existed
    Created,
    /// A recorded link was replaced
    Refreshed,
    /// A recorded link already points at the source
    Unchanged,
    /// The source does not exist; no dangling link is created
    SourceMissing,
    /// Something this tool did not create occupies the target
    Occupied,
    /// Parent directory or link creation failed
    Failed,
}

impl LinkOutcome {
    /// True if this call put a new link in place.
    pub fn is_new(&self) -> bool {
        matches!(self, LinkOutcome::Created | LinkOutcome::Refreshed)
    }
}

/// What [`LinkManager::remove_recorded_link`] found at a recorded path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovedLink {
    /// Was a symlink and has been unlinked
    Removed,
    /// Nothing there anymore
    NotExists,
    /// Something other than a symlink; left untouched
    NotSymlink,
}

pub struct LinkManager<'a, R: Runtime> {
    runtime: &'a R,
    roots: &'a NamespaceRoots,
}

impl<'a, R: Runtime> LinkManager<'a, R> {
    pub fn new(runtime: &'a R, roots: &'a NamespaceRoots) -> Self {
        Self { runtime, roots }
    }

    /// Link `target` to `source` without ever clobbering a path this tool does not own.
    ///
    /// New links and any directories created to host them are added to `record`.
    /// Failures are logged and returned as an outcome, never as an error.
    #[tracing::instrument(skip(self, record))]
    pub fn create_link_safely(
        &self,
        source: &Path,
        target: &Path,
        record: &mut LinkRecord,
    ) -> LinkOutcome {
        if !self.runtime.exists(source) {
            warn!("Source {:?} does not exist, skipping", source);
            return LinkOutcome::SourceMissing;
        }

        let mut outcome = LinkOutcome::Created;
        if self.runtime.is_symlink(target) && record.links.contains(target) {
            if let Ok(current) = self.runtime.read_link(target)
                && current == source
            {
                debug!("Link {:?} already points to {:?}", target, source);
                return LinkOutcome::Unchanged;
            }

            info!("Refreshing recorded link {:?}", target);
            if let Err(e) = self.runtime.remove_symlink(target) {
                warn!(
                    "Failed to remove old link {:?}: {:#}; trying to create it anyway",
                    target, e
                );
            }
            outcome = LinkOutcome::Refreshed;
        } else if self.runtime.exists(target) || self.runtime.is_symlink(target) {
            warn!("Target {:?} already exists and was not created by this tool, skipping", target);
            return LinkOutcome::Occupied;
        }

        if let Some(parent) = target.parent()
            && !self.runtime.is_dir(parent)
        {
            let missing = self.missing_ancestors(parent);
            info!("Creating parent directory {:?}", parent);
            if let Err(e) = self.runtime.create_dir_all(parent) {
                error!("Failed to create parent directory {:?}: {:#}", parent, e);
                return LinkOutcome::Failed;
            }
            record.directories.extend(missing);
        }

        info!("Linking {:?} -> {:?}", target, source);
        match self.runtime.symlink(source, target) {
            Ok(()) => {
                record.links.insert(target.to_path_buf());
                outcome
            }
            Err(e) => {
                error!("Failed to create link {:?}: {:#}", target, e);
                if cfg!(windows) {
                    error!("{}", WINDOWS_SYMLINK_HINT);
                }
                LinkOutcome::Failed
            }
        }
    }

    /// Directories from `dir` upward that do not exist yet, deepest first.
    fn missing_ancestors(&self, dir: &Path) -> Vec<PathBuf> {
        dir.ancestors()
            .take_while(|p| !p.as_os_str().is_empty() && !self.runtime.exists(p))
            .map(Path::to_path_buf)
            .collect()
    }

    /// Unlink a recorded path if it is still a symlink.
    #[tracing::instrument(skip(self))]
    pub fn remove_recorded_link(&self, path: &Path) -> Result<RemovedLink> {
        if self.runtime.is_symlink(path) {
            self.runtime.remove_symlink(path)?;
            info!("Removed link {:?}", path);
            Ok(RemovedLink::Removed)
        } else if self.runtime.exists(path) {
            warn!("{:?} exists but is not a symlink; leaving it in place", path);
            Ok(RemovedLink::NotSymlink)
        } else {
            debug!("{:?} does not exist, nothing to remove", path);
            Ok(RemovedLink::NotExists)
        }
    }

    /// True if `dir` holds nothing but platform metadata files.
    ///
    /// A directory that cannot be listed counts as non-empty.
    pub fn is_directory_empty(&self, dir: &Path) -> bool {
        match self.runtime.read_dir(dir) {
            Ok(entries) => entries.iter().all(|entry| is_ignored_entry(entry)),
            Err(e) => {
                error!("Cannot list directory {:?}: {:#}", dir, e);
                false
            }
        }
    }

    /// Remove `start` and its ancestors while they are empty.
    ///
    /// Stops at a namespace root, at the filesystem root, outside every
    /// namespace root, at the first non-empty directory, or when a removal
    /// fails. Returns the removed directories, deepest first.
    #[tracing::instrument(skip(self))]
    pub fn prune_empty_parents(&self, start: &Path) -> Vec<PathBuf> {
        let mut removed = Vec::new();
        let mut current = start.to_path_buf();

        loop {
            if !self.runtime.is_dir(&current)
                || self.roots.is_root(&current)
                || !self.roots.contains(&current)
            {
                break;
            }
            let Some(parent) = current.parent().map(Path::to_path_buf) else {
                break;
            };
            if !self.is_directory_empty(&current) {
                debug!("{:?} is not empty, stopping", current);
                break;
            }
            if let Err(e) = self.runtime.remove_dir(&current) {
                error!("Failed to remove empty directory {:?}: {:#}", current, e);
                break;
            }
            info!("Removed empty directory {:?}", current);
            removed.push(current);
            current = parent;
        }

        removed
    }
}

fn is_ignored_entry(entry: &Path) -> bool {
    let Some(name) = entry.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    IGNORED_ENTRIES
        .iter()
        .any(|ignored| name.eq_ignore_ascii_case(ignored))
}
