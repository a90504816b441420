//! Fluent wrapper around assert_cmd::Command.

// Allow dead code since this is a test utility shared by several test crates
#![allow(dead_code)]

use assert_cmd::Command;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Fluent wrapper around `assert_cmd::Command` for the `lorekeep` binary.
///
/// Provides a builder-style API for constructing and executing CLI commands.
pub struct LorekeepCommand {
    args: Vec<String>,
}

impl LorekeepCommand {
    /// Creates a new command for the `lorekeep` binary.
    pub fn new() -> Self {
        Self { args: Vec::new() }
    }

    /// Sets the `--config` option so the user's config is never read.
    pub fn config(mut self, path: &Path) -> Self {
        self.args.push("--config".to_string());
        self.args.push(path.to_string_lossy().to_string());
        self
    }

    /// Adds arguments to the command.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// Returns the current arguments (for testing).
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Runs the command and returns an Assert for making assertions.
    #[allow(deprecated)]
    pub fn assert(self) -> assert_cmd::assert::Assert {
        let mut cmd = Command::cargo_bin("lorekeep").expect("Failed to find lorekeep binary");
        cmd.args(&self.args);
        cmd.env_remove("LOREKEEP_LOG");
        cmd.env_remove("RUST_LOG");
        cmd.assert()
    }

    /// Runs the command, expects success, and returns stdout as a string.
    pub fn output_success(self) -> String {
        let output = self.assert().success().get_output().stdout.clone();
        String::from_utf8(output).expect("Output was not valid UTF-8")
    }

    /// Runs the command, expects success, and parses stdout as JSON.
    pub fn output_json<T: DeserializeOwned>(self) -> T {
        let output = self.output_success();
        serde_json::from_str(&output).expect("Failed to parse output as JSON")
    }

    // ===========================================
    // Command Shortcuts
    // ===========================================

    /// Configures for the `export` command on a world file.
    pub fn export(self, world: &Path) -> Self {
        let world = world.to_string_lossy().to_string();
        self.args(["export".to_string(), world])
    }

    /// Adds `-o <dir>` to the command.
    pub fn output(self, dir: &Path) -> Self {
        let dir = dir.to_string_lossy().to_string();
        self.args(["-o".to_string(), dir])
    }

    /// Adds `--format json` to the command.
    pub fn format_json(self) -> Self {
        self.args(["--format", "json"])
    }
}

impl Default for LorekeepCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_runs_binary() {
        LorekeepCommand::new().args(["--help"]).assert().success();
    }

    #[test]
    fn test_command_output_success() {
        let output = LorekeepCommand::new().args(["--help"]).output_success();
        assert!(output.contains("lorekeep") || output.contains("Markdown"));
    }

    #[test]
    fn test_command_shortcuts() {
        let cmd = LorekeepCommand::new()
            .export(Path::new("world.json"))
            .format_json();
        let args = cmd.get_args();
        assert_eq!(args[0], "export");
        assert_eq!(args[1], "world.json");
        assert!(args.contains(&"json".to_string()));
    }
}
