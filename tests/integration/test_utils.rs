//! Shared test utilities for integration tests
//!
//! Tree builders, mtime control, and serialized access to the environment
//! variables the configuration layer reads.

use hashdb::config::HashDbConfig;
use hashdb::workspace::Workspace;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use tempfile::TempDir;

/// Serializes tests that change process environment variables
static CONFIG_ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Environment variable state to restore after test
struct EnvState {
    vars: Vec<(String, Option<String>)>,
}

impl EnvState {
    fn capture(names: &[&str]) -> Self {
        Self {
            vars: names
                .iter()
                .map(|name| (name.to_string(), std::env::var(name).ok()))
                .collect(),
        }
    }

    fn restore(self) {
        for (name, value) in self.vars {
            match value {
                Some(orig) => std::env::set_var(&name, orig),
                None => std::env::remove_var(&name),
            }
        }
    }
}

/// Run `f` with an isolated XDG config home plus the given variables set
///
/// The previous environment is restored afterwards; a global mutex keeps
/// parallel tests from observing each other's variables.
pub fn with_config_env<F, R>(test_dir: &TempDir, vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = CONFIG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());

    let mut names: Vec<&str> = vec!["HOME", "XDG_CONFIG_HOME"];
    names.extend(vars.iter().map(|(name, _)| *name));
    let env_state = EnvState::capture(&names);

    let config_home = test_dir.path().join("xdg-config");
    let home = test_dir.path().join("home");
    fs::create_dir_all(&config_home).unwrap();
    fs::create_dir_all(&home).unwrap();
    std::env::set_var("HOME", &home);
    std::env::set_var("XDG_CONFIG_HOME", &config_home);
    for (name, value) in vars {
        std::env::set_var(name, value);
    }

    let result = f();

    env_state.restore();
    result
}

/// Write `content` at `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Set a file's modification time.
pub fn set_mtime(path: &Path, time: SystemTime) {
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

/// Open a workspace with default configuration (ignores any user config).
pub fn open_workspace(root: &Path) -> Workspace {
    Workspace::open(root, HashDbConfig::default()).unwrap()
}
