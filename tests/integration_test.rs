use assert_cmd::Command;
use assert_cmd::cargo;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const SITE_PACKAGES_ENV: &str = "ISAACSIM_LINKS_SITE_PACKAGES";
const RECORD_FILE: &str = "isaacsim_links_symlink_record.json";

/// Create `site-packages/` with the `isaacsim` and `omni` roots.
fn site_packages(root: &Path) -> PathBuf {
    let sp = root.join("lib").join("python3.11").join("site-packages");
    std::fs::create_dir_all(sp.join("isaacsim")).unwrap();
    std::fs::create_dir_all(sp.join("omni")).unwrap();
    sp
}

/// Create `<sp>/<exts>/<extension>/<namespace>/<relative>/__init__.py`.
fn add_package(sp: &Path, exts: &str, extension: &str, namespace: &str, relative: &str) -> PathBuf {
    let source = sp.join(exts).join(extension).join(namespace).join(relative);
    std::fs::create_dir_all(&source).unwrap();
    std::fs::write(source.join("__init__.py"), "").unwrap();
    source
}

fn isaacsim_links(sp: &Path) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("isaacsim-links"));
    cmd.env(SITE_PACKAGES_ENV, sp).env("RUST_LOG", "info");
    cmd
}

#[test]
fn test_requires_an_action() {
    Command::new(cargo::cargo_bin!("isaacsim-links"))
        .assert()
        .failure()
        .stderr(predicates::str::contains("--create"));
}

#[test]
fn test_actions_are_mutually_exclusive() {
    Command::new(cargo::cargo_bin!("isaacsim-links"))
        .arg("--create")
        .arg("--remove")
        .assert()
        .failure()
        .stderr(predicates::str::contains("cannot be used with"));
}

#[test]
fn test_version() {
    Command::new(cargo::cargo_bin!("isaacsim-links"))
        .arg("--version")
        .assert()
        .success()
        .stdout(predicates::str::contains("isaacsim-links"));
}

#[test]
fn test_missing_omni_root_fails() {
    let dir = tempdir().unwrap();
    let sp = site_packages(dir.path());
    std::fs::remove_dir(sp.join("omni")).unwrap();

    isaacsim_links(&sp)
        .arg("--create")
        .assert()
        .failure()
        .stderr(predicates::str::contains("omni directory not found"));

    assert!(!sp.join("isaacsim").join(RECORD_FILE).exists());
}

#[test]
fn test_invalid_record_fails() {
    let dir = tempdir().unwrap();
    let sp = site_packages(dir.path());
    std::fs::write(sp.join("isaacsim").join(RECORD_FILE), r#"["/legacy/list"]"#).unwrap();

    isaacsim_links(&sp)
        .arg("--remove")
        .assert()
        .failure()
        .stderr(predicates::str::contains("Unexpected record file format"));
}

#[cfg(unix)]
#[test]
fn test_end_to_end_create_and_remove() {
    let dir = tempdir().unwrap();
    let sp = site_packages(dir.path());
    let prims = add_package(&sp, "isaacsim/exts", "isaacsim.core.prims", "isaacsim", "core/prims");
    let app = add_package(&sp, "omni/extscore", "omni.kit.app", "omni", "kit/app");
    let scripts = add_package(&sp, "isaacsim/extsPhysics", "omni.physx", "omni", "physx/scripts");

    isaacsim_links(&sp)
        .arg("--create")
        .assert()
        .success()
        .stdout(predicates::str::contains("Created or updated 3 link(s)."));

    assert_eq!(std::fs::read_link(sp.join("isaacsim/core/prims")).unwrap(), prims);
    assert_eq!(std::fs::read_link(sp.join("omni/kit/app")).unwrap(), app);
    assert_eq!(std::fs::read_link(sp.join("omni/physx/scripts")).unwrap(), scripts);
    assert!(sp.join("carb").is_dir());

    let record_path = sp.join("isaacsim").join(RECORD_FILE);
    let record: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&record_path).unwrap()).unwrap();
    assert_eq!(record["links"].as_array().unwrap().len(), 3);

    // Second run finds everything in place
    isaacsim_links(&sp)
        .arg("--create")
        .assert()
        .success()
        .stdout(predicates::str::contains("Created or updated 0 link(s)."));

    // three links plus isaacsim/core, omni/kit, omni/physx and carb
    isaacsim_links(&sp)
        .arg("--remove")
        .assert()
        .success()
        .stdout(predicates::str::contains("Removed 7 link(s) and director(ies)."));

    assert!(!sp.join("isaacsim/core").exists());
    assert!(!sp.join("omni/kit").exists());
    assert!(!sp.join("omni/physx").exists());
    assert!(!sp.join("carb").exists());
    assert!(!record_path.exists());
    assert!(prims.join("__init__.py").exists());
}

#[cfg(unix)]
#[test]
fn test_create_leaves_foreign_files_alone() {
    let dir = tempdir().unwrap();
    let sp = site_packages(dir.path());
    add_package(&sp, "omni/extscore", "omni.usd", "omni", "usd");
    std::fs::write(sp.join("omni/usd"), "not ours").unwrap();

    isaacsim_links(&sp)
        .arg("--create")
        .assert()
        .success()
        .stdout(predicates::str::contains("Created or updated 0 link(s)."))
        .stderr(predicates::str::contains("already exists"));

    isaacsim_links(&sp).arg("--remove").assert().success();

    assert_eq!(std::fs::read_to_string(sp.join("omni/usd")).unwrap(), "not ours");
}
