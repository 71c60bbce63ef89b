//! Remove action - undoes create using nothing but the record.

use anyhow::Result;
use log::{debug, error, info, warn};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::link::{LinkManager, RemovedLink};
use crate::record::{LinkRecord, RecordStore};
use crate::runtime::{Runtime, path_depth};

/// Result of one remove run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoveReport {
    /// Recorded links unlinked or already gone
    pub links_removed: usize,
    /// Recorded directories removed or already gone
    pub directories_removed: usize,
    /// Recorded links occupied by something other than a symlink
    pub anomalies: Vec<PathBuf>,
    /// Recorded links kept in the record, anomalies included
    pub failed_links: Vec<PathBuf>,
    /// Recorded directories kept in the record
    pub failed_directories: Vec<PathBuf>,
}

impl RemoveReport {
    /// Links and directories removed or confirmed absent.
    pub fn count(&self) -> usize {
        self.links_removed + self.directories_removed
    }

    /// True if every recorded entry was handled.
    pub fn is_clean(&self) -> bool {
        self.failed_links.is_empty() && self.failed_directories.is_empty()
    }
}

pub struct RemoveAction<'a, R: Runtime> {
    runtime: &'a R,
    store: RecordStore<'a, R>,
    link_manager: LinkManager<'a, R>,
}

impl<'a, R: Runtime> RemoveAction<'a, R> {
    pub fn new(runtime: &'a R, config: &'a Config) -> Self {
        Self {
            runtime,
            store: RecordStore::new(runtime, config.record_path.clone()),
            link_manager: LinkManager::new(runtime, &config.roots),
        }
    }

    /// Remove every recorded link and directory.
    ///
    /// The record file is deleted when everything was handled. Otherwise it is
    /// rewritten with only the entries that are still there, so the next run
    /// retries exactly those.
    #[tracing::instrument(skip(self))]
    pub fn run(&self) -> Result<RemoveReport> {
        info!("Removing links recorded in {:?}", self.store.path());
        let record = self.store.load()?;

        if cfg!(windows) && !self.runtime.is_privileged() {
            warn!("Removing symlinks or directories on Windows may require administrator rights.");
        }

        let mut report = RemoveReport::default();
        if record.is_empty() {
            info!("Record is empty, nothing to remove");
            self.store.delete();
            return Ok(report);
        }

        for link in deepest_first(&record.links) {
            self.remove_link(link, &mut report);
        }
        for dir in deepest_first(&record.directories) {
            self.remove_directory(dir, &mut report);
        }

        info!(
            "Recorded links: {}, recorded directories: {}",
            record.links.len(),
            record.directories.len()
        );
        info!("Links removed or already absent: {}", report.links_removed);
        info!("Anomalies (exist but not a symlink): {}", report.anomalies.len());
        info!("Links kept in the record: {}", report.failed_links.len());
        info!("Directories removed or already absent: {}", report.directories_removed);
        info!("Directories kept in the record: {}", report.failed_directories.len());

        if report.is_clean() {
            info!("All recorded links and directories were handled");
            self.store.delete();
            return Ok(report);
        }

        let remaining = LinkRecord {
            links: report.failed_links.iter().cloned().collect(),
            directories: report.failed_directories.iter().cloned().collect(),
        };
        self.store.save(&remaining);
        for path in remaining.links.iter().chain(remaining.directories.iter()) {
            warn!("Kept in record, check manually: {:?}", path);
        }

        Ok(report)
    }

    fn remove_link(&self, link: &Path, report: &mut RemoveReport) {
        match self.link_manager.remove_recorded_link(link) {
            Ok(RemovedLink::NotSymlink) => {
                report.anomalies.push(link.to_path_buf());
                report.failed_links.push(link.to_path_buf());
            }
            Ok(RemovedLink::Removed | RemovedLink::NotExists) => {
                report.links_removed += 1;
                if let Some(parent) = link.parent() {
                    self.link_manager.prune_empty_parents(parent);
                }
            }
            Err(e) => {
                error!("Failed to remove link {:?}: {:#}", link, e);
                report.failed_links.push(link.to_path_buf());
            }
        }
    }

    fn remove_directory(&self, dir: &Path, report: &mut RemoveReport) {
        if !self.runtime.exists(dir) {
            debug!("Directory {:?} already gone", dir);
            report.directories_removed += 1;
            return;
        }
        if !self.runtime.is_dir(dir) {
            warn!("{:?} is not a directory, dropping it from the record", dir);
            report.directories_removed += 1;
            return;
        }
        if !self.link_manager.is_directory_empty(dir) {
            info!("Directory {:?} is not empty, keeping it", dir);
            report.failed_directories.push(dir.to_path_buf());
            return;
        }

        match self.runtime.remove_dir(dir) {
            Ok(()) => {
                info!("Removed directory {:?}", dir);
                report.directories_removed += 1;
            }
            Err(e) => {
                error!("Failed to remove directory {:?}: {:#}", dir, e);
                report.failed_directories.push(dir.to_path_buf());
            }
        }
    }
}

/// Order paths deepest first, then by path.
fn deepest_first(paths: &BTreeSet<PathBuf>) -> Vec<&Path> {
    let mut sorted: Vec<&Path> = paths.iter().map(PathBuf::as_path).collect();
    sorted.sort_by(|a, b| path_depth(b).cmp(&path_depth(a)).then_with(|| a.cmp(b)));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;

    #[test]
    fn test_deepest_first() {
        let paths: BTreeSet<PathBuf> = ["/sp/a", "/sp/b/c/d", "/sp/a/b", "/sp/z/y"]
            .into_iter()
            .map(PathBuf::from)
            .collect();
        let sorted: Vec<_> = deepest_first(&paths)
            .into_iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        assert_eq!(sorted, vec!["/sp/b/c/d", "/sp/a/b", "/sp/z/y", "/sp/a"]);
    }

    #[test]
    fn test_remove_empty_record_deletes_file() {
        let mut runtime = MockRuntime::new();
        let config = Config::for_site_packages(PathBuf::from("/sp"));
        let record_path = config.record_path.clone();
        runtime.expect_is_privileged().returning(|| true);

        runtime
            .expect_exists()
            .with(eq(record_path.clone()))
            .returning(|_| true);
        runtime
            .expect_read_to_string()
            .returning(|_| Ok(r#"{"links": [], "directories": []}"#.into()));
        runtime
            .expect_remove_file()
            .with(eq(record_path))
            .times(1)
            .returning(|_| Ok(()));
        runtime.expect_remove_symlink().never();
        runtime.expect_remove_dir().never();

        let report = RemoveAction::new(&runtime, &config).run().unwrap();
        assert_eq!(report, RemoveReport::default());
        assert_eq!(report.count(), 0);
    }

    #[test]
    fn test_remove_link_failure_is_kept() {
        let mut runtime = MockRuntime::new();
        let config = Config::for_site_packages(PathBuf::from("/sp"));
        let record_path = config.record_path.clone();
        runtime.expect_is_privileged().returning(|| true);
        let link = PathBuf::from("/sp/omni/kit");

        runtime.expect_exists().returning(|_| true);
        runtime
            .expect_read_to_string()
            .returning(|_| Ok(r#"{"links": ["/sp/omni/kit"], "directories": []}"#.into()));
        runtime.expect_is_symlink().returning(|_| true);
        runtime
            .expect_remove_symlink()
            .with(eq(link.clone()))
            .returning(|_| Err(anyhow::anyhow!("Access is denied")));
        runtime.expect_remove_file().never();
        runtime
            .expect_write()
            .withf(move |path, contents| {
                let value: serde_json::Value = serde_json::from_slice(contents).unwrap();
                path == record_path
                    && value == serde_json::json!({ "links": ["/sp/omni/kit"], "directories": [] })
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let report = RemoveAction::new(&runtime, &config).run().unwrap();
        assert_eq!(report.failed_links, vec![link]);
        assert!(report.anomalies.is_empty());
        assert_eq!(report.count(), 0);
    }
}
