//! Workspace discovery
//!
//! Discovery runs once at startup and produces the fixed set of [`AppSpec`]s
//! the registry is built from. Two sources, in order:
//!
//! 1. A `devmux.json` manifest at the workspace root: a JSON array of app
//!    entries. Malformed files and invalid entries are skipped with a
//!    warning, never a hard failure.
//! 2. When no usable manifest exists, conventional fallback probing of
//!    `apps/bot` and `apps/dashboard` under the root, keeping the ones that
//!    exist on disk.
//!
//! Either way `discover` returns a (possibly empty) spec list; it is the
//! registry's job to reject duplicates, and the supervisor's to fail a
//! start when a command turns out to be unlaunchable.

use crate::{CoreError, Result};
use schema::AppSpec;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Manifest file name looked up at the workspace root
pub const CONFIG_FILE: &str = "devmux.json";

/// Conventional app directories probed when no manifest is usable
pub const FALLBACK_DIRS: [&str; 2] = ["apps/bot", "apps/dashboard"];

/// Discover the apps of the workspace rooted at `root`
///
/// Never fails: every problem downgrades to a warning and the fallback
/// probe, and a workspace with nothing to supervise yields an empty list.
pub fn discover(root: &Path) -> Vec<AppSpec> {
    let manifest = root.join(CONFIG_FILE);
    if manifest.is_file() {
        match load_manifest(&manifest, root) {
            Ok(specs) if !specs.is_empty() => {
                info!("Discovered {} app(s) from {}", specs.len(), manifest.display());
                return specs;
            }
            Ok(_) => {
                warn!("{} contains no valid app entries", manifest.display());
            }
            Err(e) => {
                warn!("Ignoring {}: {}", manifest.display(), e);
            }
        }
    } else {
        debug!("No {} at {}", CONFIG_FILE, root.display());
    }

    let specs = probe_fallback(root);
    info!("Discovered {} app(s) by fallback probing", specs.len());
    specs
}

/// Load and validate a manifest file, resolving paths against `root`
pub fn load_manifest(path: &Path, root: &Path) -> Result<Vec<AppSpec>> {
    let raw = std::fs::read_to_string(path)?;
    let entries: Vec<AppSpec> = serde_json::from_str(&raw)?;

    let mut specs = Vec::with_capacity(entries.len());
    for entry in entries {
        match validate(entry, root) {
            Ok(spec) => specs.push(spec),
            Err(e) => warn!("Skipping manifest entry: {}", e),
        }
    }
    Ok(specs)
}

/// Check one manifest entry and resolve its paths
fn validate(mut spec: AppSpec, root: &Path) -> Result<AppSpec> {
    if spec.name.trim().is_empty() {
        return Err(CoreError::ValidationError(
            "app entry has an empty name".to_string(),
        ));
    }
    if spec.path.as_os_str().is_empty() {
        return Err(CoreError::ValidationError(format!(
            "app '{}' has an empty path",
            spec.name
        )));
    }
    if let Some(cmd) = &spec.command {
        if cmd.trim().is_empty() {
            return Err(CoreError::ValidationError(format!(
                "app '{}' has an empty command",
                spec.name
            )));
        }
    }

    spec.path = resolve(root, &spec.path);
    spec.working_dir = match spec.working_dir.take() {
        Some(dir) => Some(resolve(root, &dir)),
        None => None,
    };
    Ok(spec)
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Probe the conventional app directories and keep the ones that exist
fn probe_fallback(root: &Path) -> Vec<AppSpec> {
    FALLBACK_DIRS
        .iter()
        .filter_map(|rel| {
            let path = root.join(rel);
            if !path.is_dir() {
                debug!("Fallback candidate {} not present", path.display());
                return None;
            }
            let name = path.file_name()?.to_str()?.to_string();
            Some(AppSpec {
                name,
                path,
                command: None,
                args: vec![],
                working_dir: None,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_manifest(root: &Path, content: &str) {
        fs::write(root.join(CONFIG_FILE), content).unwrap();
    }

    #[test]
    fn manifest_entries_are_loaded_and_resolved() {
        let dir = TempDir::new().unwrap();
        write_manifest(
            dir.path(),
            r#"[
                {"name": "bot", "path": "apps/bot", "command": "bun", "args": ["dev"]},
                {"name": "dashboard", "path": "apps/dashboard", "workingDir": "apps"}
            ]"#,
        );

        let specs = discover(dir.path());
        assert_eq!(specs.len(), 2);

        assert_eq!(specs[0].name, "bot");
        assert_eq!(specs[0].path, dir.path().join("apps/bot"));
        assert_eq!(specs[0].command.as_deref(), Some("bun"));

        assert_eq!(specs[1].name, "dashboard");
        assert_eq!(specs[1].command, None);
        assert_eq!(
            specs[1].working_dir.as_deref(),
            Some(dir.path().join("apps").as_path())
        );
    }

    #[test]
    fn absolute_manifest_paths_are_kept() {
        let dir = TempDir::new().unwrap();
        write_manifest(
            dir.path(),
            r#"[{"name": "bot", "path": "/srv/bot"}]"#,
        );

        let specs = discover(dir.path());
        assert_eq!(specs[0].path, PathBuf::from("/srv/bot"));
    }

    #[test]
    fn invalid_entries_are_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        write_manifest(
            dir.path(),
            r#"[
                {"name": "", "path": "apps/anon"},
                {"name": "blank-cmd", "path": "apps/x", "command": "  "},
                {"name": "ok", "path": "apps/ok"}
            ]"#,
        );

        let specs = discover(dir.path());
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name, "ok");
    }

    #[test]
    fn malformed_manifest_falls_back_to_probing() {
        let dir = TempDir::new().unwrap();
        write_manifest(dir.path(), "{ not json");
        fs::create_dir_all(dir.path().join("apps/bot")).unwrap();

        let specs = discover(dir.path());
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name, "bot");
        assert_eq!(specs[0].path, dir.path().join("apps/bot"));
    }

    #[test]
    fn fallback_probes_conventional_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("apps/bot")).unwrap();
        fs::create_dir_all(dir.path().join("apps/dashboard")).unwrap();

        let specs = discover(dir.path());
        let names: Vec<_> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["bot", "dashboard"]);
        assert!(specs.iter().all(|s| s.command.is_none()));
    }

    #[test]
    fn empty_workspace_yields_no_apps() {
        let dir = TempDir::new().unwrap();
        assert!(discover(dir.path()).is_empty());
    }

    #[test]
    fn empty_manifest_array_falls_back() {
        let dir = TempDir::new().unwrap();
        write_manifest(dir.path(), "[]");
        fs::create_dir_all(dir.path().join("apps/dashboard")).unwrap();

        let specs = discover(dir.path());
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name, "dashboard");
    }
}
