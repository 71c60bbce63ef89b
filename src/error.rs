use std::path::PathBuf;
use thiserror::Error;

use crate::config::Namespace;

/// Conditions that stop the link manager outright.
///
/// Everything else (an unreadable extension root, an occupied link target,
/// a directory that could not be pruned) is logged and reported instead.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error(
        "Could not find a site-packages directory; set ISAACSIM_LINKS_SITE_PACKAGES to the environment's site-packages path"
    )]
    SitePackagesNotFound,

    #[error("{namespace} directory not found: {path}")]
    NamespaceRootMissing { namespace: Namespace, path: PathBuf },

    #[error("Unexpected record file format in {path}: {reason}")]
    InvalidRecord { path: PathBuf, reason: String },
}
