//! Resolved configuration threaded through every operation.
//!
//! [`Config::resolve`] performs the environment probing once; everything
//! downstream only ever sees the resulting value.

use anyhow::Result;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::resolver::find_site_packages;
use crate::runtime::{Runtime, is_path_under};

/// File name of the record, stored under the primary (`isaacsim`) namespace root.
pub const RECORD_FILE_NAME: &str = "isaacsim_links_symlink_record.json";

/// One of the three top-level import namespaces links are created under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    Isaacsim,
    Omni,
    Carb,
}

impl Namespace {
    pub const ALL: [Namespace; 3] = [Namespace::Isaacsim, Namespace::Omni, Namespace::Carb];

    /// Directory name of the namespace, both inside extensions and in site-packages.
    pub fn dir_name(self) -> &'static str {
        match self {
            Namespace::Isaacsim => "isaacsim",
            Namespace::Omni => "omni",
            Namespace::Carb => "carb",
        }
    }

    /// Dotted prefix extension directories of this namespace start with, e.g. `omni.`
    pub fn prefix(self) -> &'static str {
        match self {
            Namespace::Isaacsim => "isaacsim.",
            Namespace::Omni => "omni.",
            Namespace::Carb => "carb.",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Absolute namespace root directories inside site-packages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceRoots {
    pub isaacsim: PathBuf,
    pub omni: PathBuf,
    pub carb: PathBuf,
}

impl NamespaceRoots {
    pub fn from_site_packages(site_packages: &Path) -> Self {
        Self {
            isaacsim: site_packages.join(Namespace::Isaacsim.dir_name()),
            omni: site_packages.join(Namespace::Omni.dir_name()),
            carb: site_packages.join(Namespace::Carb.dir_name()),
        }
    }

    pub fn get(&self, namespace: Namespace) -> &Path {
        match namespace {
            Namespace::Isaacsim => &self.isaacsim,
            Namespace::Omni => &self.omni,
            Namespace::Carb => &self.carb,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Namespace, &Path)> {
        Namespace::ALL.into_iter().map(move |ns| (ns, self.get(ns)))
    }

    /// True if `path` is exactly one of the namespace roots.
    pub fn is_root(&self, path: &Path) -> bool {
        self.iter().any(|(_, root)| root == path)
    }

    /// True if `path` is a namespace root or lies below one.
    pub fn contains(&self, path: &Path) -> bool {
        self.iter().any(|(_, root)| is_path_under(path, root))
    }
}

/// A directory holding one subdirectory per extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionRoot {
    pub name: String,
    pub exts_dir: PathBuf,
    /// Namespaces discovery looks for inside each extension.
    pub namespaces: Vec<Namespace>,
    pub description: String,
}

impl ExtensionRoot {
    /// Root `<namespace root>/<subdir>`, named `<namespace prefix><subdir>`.
    pub fn new(
        roots: &NamespaceRoots,
        home: Namespace,
        subdir: &str,
        namespaces: &[Namespace],
        description: &str,
    ) -> Self {
        Self {
            name: format!("{}{}", home.prefix(), subdir),
            exts_dir: roots.get(home).join(subdir),
            namespaces: namespaces.to_vec(),
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub site_packages: PathBuf,
    pub roots: NamespaceRoots,
    pub extension_roots: Vec<ExtensionRoot>,
    pub record_path: PathBuf,
}

impl Config {
    /// Locate the active environment's site-packages and derive the configuration from it.
    #[tracing::instrument(skip(runtime))]
    pub fn resolve<R: Runtime>(runtime: &R) -> Result<Self> {
        let site_packages = find_site_packages(runtime)?;
        Ok(Self::for_site_packages(site_packages))
    }

    /// Build the configuration for a known site-packages directory.
    pub fn for_site_packages(site_packages: PathBuf) -> Self {
        let roots = NamespaceRoots::from_site_packages(&site_packages);
        let extension_roots = default_extension_roots(&roots);
        let record_path = roots.isaacsim.join(RECORD_FILE_NAME);

        Self {
            site_packages,
            roots,
            extension_roots,
            record_path,
        }
    }
}

/// The extension directories shipped by an Isaac Sim pip installation, in processing order.
pub fn default_extension_roots(roots: &NamespaceRoots) -> Vec<ExtensionRoot> {
    use Namespace::{Isaacsim, Omni};

    vec![
        ExtensionRoot::new(
            roots,
            Isaacsim,
            "exts",
            &[Isaacsim],
            "Isaac Sim standard extensions",
        ),
        ExtensionRoot::new(
            roots,
            Isaacsim,
            "extsPhysics",
            &[Isaacsim, Omni],
            "Isaac Sim physics extensions",
        ),
        ExtensionRoot::new(roots, Omni, "extscore", &[Omni], "Omni core extensions"),
        ExtensionRoot::new(
            roots,
            Isaacsim,
            "extscache",
            &[Isaacsim],
            "Isaac Sim extension cache",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_names() {
        assert_eq!(Namespace::Omni.dir_name(), "omni");
        assert_eq!(Namespace::Carb.prefix(), "carb.");
        assert_eq!(Namespace::Isaacsim.to_string(), "isaacsim");
    }

    #[test]
    fn test_config_for_site_packages() {
        let sp = PathBuf::from("/env/lib/python3.10/site-packages");
        let config = Config::for_site_packages(sp.clone());

        assert_eq!(config.roots.isaacsim, sp.join("isaacsim"));
        assert_eq!(config.roots.omni, sp.join("omni"));
        assert_eq!(config.roots.carb, sp.join("carb"));
        assert_eq!(
            config.record_path,
            sp.join("isaacsim").join(RECORD_FILE_NAME)
        );

        let names: Vec<_> = config
            .extension_roots
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "isaacsim.exts",
                "isaacsim.extsPhysics",
                "omni.extscore",
                "isaacsim.extscache"
            ]
        );
        assert_eq!(
            config.extension_roots[1].namespaces,
            vec![Namespace::Isaacsim, Namespace::Omni]
        );
        assert_eq!(config.extension_roots[2].exts_dir, sp.join("omni/extscore"));
        assert_eq!(config.extension_roots[3].exts_dir, sp.join("isaacsim/extscache"));
    }

    #[cfg(unix)]
    #[test]
    fn test_namespace_roots_membership() {
        let roots = NamespaceRoots::from_site_packages(Path::new("/sp"));

        assert!(roots.is_root(Path::new("/sp/omni")));
        assert!(!roots.is_root(Path::new("/sp/omni/core")));
        assert!(!roots.is_root(Path::new("/sp")));

        assert!(roots.contains(Path::new("/sp/carb/events")));
        assert!(roots.contains(Path::new("/sp/isaacsim")));
        assert!(!roots.contains(Path::new("/sp")));
        assert!(!roots.contains(Path::new("/sp/numpy")));
    }
}
