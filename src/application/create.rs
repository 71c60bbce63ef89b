//! Create action - links every discovered package into its namespace root.

use anyhow::Result;
use log::{error, info, warn};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::config::{Config, ExtensionRoot};
use crate::discovery::find_packages;
use crate::link::LinkManager;
use crate::record::{LinkRecord, RecordStore};
use crate::resolver::{check_namespace_roots, ensure_carb_root};
use crate::runtime::Runtime;

/// Result of one create run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateReport {
    /// Links created or refreshed by this run
    pub linked: usize,
    /// Directories created by this run, the carb root included
    pub directories_created: usize,
    /// Extension roots that were missing or could not be read
    pub skipped_roots: Vec<String>,
}

pub struct CreateAction<'a, R: Runtime> {
    runtime: &'a R,
    config: &'a Config,
    store: RecordStore<'a, R>,
    link_manager: LinkManager<'a, R>,
}

impl<'a, R: Runtime> CreateAction<'a, R> {
    pub fn new(runtime: &'a R, config: &'a Config) -> Self {
        Self {
            runtime,
            config,
            store: RecordStore::new(runtime, config.record_path.clone()),
            link_manager: LinkManager::new(runtime, &config.roots),
        }
    }

    /// Link every package of every configured extension root.
    ///
    /// Only configuration problems and a malformed record are errors. The
    /// record is saved after each extension root, so an interrupted or partly
    /// failing run still leaves everything it created removable.
    #[tracing::instrument(skip(self))]
    pub fn run(&self) -> Result<CreateReport> {
        if cfg!(windows) && !self.runtime.is_privileged() {
            warn!("Creating symlinks on Windows usually requires administrator rights or Developer Mode.");
            warn!("Continuing anyway; individual links may fail.");
        }

        check_namespace_roots(self.runtime, &self.config.roots)?;

        // Links from earlier runs stay ours to refresh and stay recorded
        let mut record = self.store.load()?;
        let directories_before = record.directories.len();
        if let Some(carb) = ensure_carb_root(self.runtime, &self.config.roots) {
            record.directories.insert(carb);
            self.store.save(&record);
        }

        let mut report = CreateReport::default();
        let mut handled = HashSet::new();
        let mut processed = 0;
        for root in &self.config.extension_roots {
            if !self.runtime.is_dir(&root.exts_dir) {
                warn!("Extension directory {:?} not found, skipping {}", root.exts_dir, root.name);
                report.skipped_roots.push(root.name.clone());
                continue;
            }

            info!("Processing {} in {:?}", root.description, root.exts_dir);
            processed += 1;
            if let Err(e) =
                self.link_extension_root(root, &mut record, &mut handled, &mut report.linked)
            {
                error!("Error while processing {:?}: {:#}", root.exts_dir, e);
                report.skipped_roots.push(root.name.clone());
            }
            self.store.save(&record);
        }
        if processed == 0 {
            self.store.save(&record);
        }

        report.directories_created = record.directories.len().saturating_sub(directories_before);
        info!(
            "Done. Created or updated {} link(s), created {} director(ies).",
            report.linked, report.directories_created
        );
        info!("Restart your IDE or reload the Python language server to pick up the changes.");

        Ok(report)
    }

    /// Link the packages of every extension under one root.
    ///
    /// `linked` is bumped as links are made, so the count survives an error
    /// part way through the root. `handled` holds every target seen in this
    /// run; the first extension providing a target keeps it.
    fn link_extension_root(
        &self,
        root: &ExtensionRoot,
        record: &mut LinkRecord,
        handled: &mut HashSet<PathBuf>,
        linked: &mut usize,
    ) -> Result<()> {
        let mut extensions = self.runtime.read_dir(&root.exts_dir)?;
        extensions.sort();

        for extension in extensions {
            if !self.runtime.is_dir(&extension) {
                continue;
            }
            info!("Processing extension {:?}", extension);

            let packages = find_packages(self.runtime, &extension, &root.namespaces)?;
            if packages.is_empty() {
                warn!("No packages found in {:?}, skipping", extension);
                continue;
            }

            for package in packages {
                let target = self
                    .config
                    .roots
                    .get(package.namespace)
                    .join(&package.relative_path);
                info!(
                    "Package {} -> {:?} -> {:?}",
                    package.namespace, package.relative_path, package.source
                );
                if !handled.insert(target.clone()) {
                    warn!(
                        "Target {:?} is already provided by another extension in this run, skipping {:?}",
                        target, package.source
                    );
                    continue;
                }
                if self
                    .link_manager
                    .create_link_safely(&package.source, &target, record)
                    .is_new()
                {
                    *linked += 1;
                }
            }
        }

        Ok(())
    }
}
