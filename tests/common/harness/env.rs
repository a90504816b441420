//! Isolated test environment with temp directory.

// Allow dead code since not every test crate uses every helper
#![allow(dead_code)]

use super::LorekeepCommand;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated test environment holding a copy of the fixture world.
///
/// Creates a temp directory that is automatically cleaned up on drop, with
/// the world under `world/` and an empty `out/` for archives.
pub struct TestEnv {
    /// The temporary directory (kept for lifetime management)
    _temp_dir: TempDir,
    root: PathBuf,
}

impl TestEnv {
    /// Creates a new environment seeded with `tests/fixtures/world`.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().to_path_buf();
        copy_dir(&crate::common::fixtures_dir().join("world"), &root.join("world"));
        std::fs::create_dir_all(root.join("out")).expect("Failed to create output dir");
        Self {
            _temp_dir: temp_dir,
            root,
        }
    }

    /// Path of the world file.
    pub fn world(&self) -> PathBuf {
        self.root.join("world").join("world.json")
    }

    /// Directory archives are written to.
    pub fn out_dir(&self) -> PathBuf {
        self.root.join("out")
    }

    /// Path of a config file inside the environment (it may not exist).
    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    /// Creates a command bound to this environment's config and output dir.
    pub fn cmd(&self) -> LorekeepCommand {
        LorekeepCommand::new().config(&self.config_path())
    }

    /// `export <world> -o <out>` for this environment.
    pub fn export(&self) -> LorekeepCommand {
        self.cmd().export(&self.world()).output(&self.out_dir())
    }

    /// Writes a file relative to the environment root and returns its path.
    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// Reads a written archive.
    pub fn archive(&self, filename: &str) -> Vec<u8> {
        let path = self.out_dir().join(filename);
        std::fs::read(&path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

fn copy_dir(from: &Path, to: &Path) {
    std::fs::create_dir_all(to).expect("Failed to create dir");
    for entry in std::fs::read_dir(from).expect("Failed to read fixture dir") {
        let entry = entry.expect("Failed to read fixture entry");
        let target = to.join(entry.file_name());
        if entry.path().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            std::fs::copy(entry.path(), &target).expect("Failed to copy fixture");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_copies_fixture_world() {
        let env = TestEnv::new();
        assert!(env.world().is_file(), "world file should be copied");
        assert!(env.out_dir().is_dir());
    }

    #[test]
    fn test_env_cleanup_on_drop() {
        let path = {
            let env = TestEnv::new();
            env.world()
        };
        assert!(!path.exists(), "temp directory should be cleaned up on drop");
    }
}
