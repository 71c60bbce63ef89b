//! Hooks run by the package installer after install and before uninstall.
//!
//! Hooks never fail the surrounding installation: errors are printed with a
//! hint to rerun the command by hand and turned into an exit code.

use log::info;

use super::{create, remove};
use crate::runtime::Runtime;

/// Set to skip linking after installation.
pub const SKIP_CREATE_ENV: &str = "ISAACSIM_LINKS_SKIP_CREATE";

/// Set to skip removal before uninstallation.
pub const SKIP_REMOVE_ENV: &str = "ISAACSIM_LINKS_SKIP_REMOVE";

/// Create links after installation unless [`SKIP_CREATE_ENV`] is set.
pub fn install_hook<R: Runtime>(runtime: R) -> i32 {
    if is_opted_out(&runtime, SKIP_CREATE_ENV) {
        info!("{} is set, not creating links", SKIP_CREATE_ENV);
        return 0;
    }

    match create(runtime) {
        Ok(count) => {
            println!("isaacsim-links: created or updated {} link(s)", count);
            0
        }
        Err(e) => {
            eprintln!("isaacsim-links: failed to create links: {:#}", e);
            eprintln!("Run `isaacsim-links --create` manually once the problem is fixed.");
            1
        }
    }
}

/// Remove recorded links before uninstallation unless [`SKIP_REMOVE_ENV`] is set.
pub fn uninstall_hook<R: Runtime>(runtime: R) -> i32 {
    if is_opted_out(&runtime, SKIP_REMOVE_ENV) {
        info!("{} is set, not removing links", SKIP_REMOVE_ENV);
        return 0;
    }

    match remove(runtime) {
        Ok(count) => {
            println!("isaacsim-links: removed {} link(s) and director(ies)", count);
            0
        }
        Err(e) => {
            eprintln!("isaacsim-links: failed to remove links: {:#}", e);
            eprintln!("Run `isaacsim-links --remove` manually before uninstalling.");
            1
        }
    }
}

/// Any value except empty, `0`, `false` or `no` opts out.
fn is_opted_out<R: Runtime>(runtime: &R, key: &str) -> bool {
    match runtime.env_var(key) {
        Ok(value) => {
            let value = value.trim().to_ascii_lowercase();
            !matches!(value.as_str(), "" | "0" | "false" | "no")
        }
        Err(_) => false,
    }
}
