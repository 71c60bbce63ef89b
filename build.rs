use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

const CROSS_WINDOWS_TESTS_ENV: &str = "ISAACSIM_LINKS_RUN_CROSS_WINDOWS_TESTS";

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");
    println!("cargo:rerun-if-env-changed={}", CROSS_WINDOWS_TESTS_ENV);
    println!("cargo::rustc-check-cfg=cfg(skip_cross_windows_tests)");

    // Symlink tests need a real Windows host when the target is Windows
    let host = std::env::var("HOST").unwrap_or_default();
    let target = std::env::var("TARGET").unwrap_or_default();
    if target.contains("windows")
        && !host.contains("windows")
        && std::env::var(CROSS_WINDOWS_TESTS_ENV).is_err()
    {
        println!("cargo:rustc-cfg=skip_cross_windows_tests");
    }

    let version = git_version().unwrap_or_else(|| format!("0.0.0-unknown-{}", timestamp()));
    println!("cargo:rustc-env=ISAACSIM_LINKS_VERSION={}", version);
}

/// Version from `git describe`, without the leading `v`. Dirty trees get a timestamp suffix.
fn git_version() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()
        .filter(|o| o.status.success())?;

    let described = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let version = described.strip_prefix('v').unwrap_or(&described);

    if version.is_empty() || version.ends_with("-dirty") {
        Some(format!("{}-{}", version, timestamp()))
    } else {
        Some(version.to_string())
    }
}

fn timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
