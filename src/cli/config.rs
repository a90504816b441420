//! Configuration file support.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cli::ExportArgs;
use crate::export::ExportConfig;

/// Application configuration loaded from config file.
///
/// ```toml
/// data_dir = "/srv/foundry/Data"
///
/// [export]
/// dump_format = "YAML"
/// note_name_uses_id = false
///
/// [export.templates]
/// "Actor.character" = "templates/character.md"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Default directory asset paths are relative to
    pub data_dir: Option<PathBuf>,

    #[serde(default)]
    pub export: ExportConfig,
}

impl Config {
    /// Load configuration from `path`, or from the default location.
    ///
    /// Returns default config if the file doesn't exist. Relative template
    /// paths are resolved against the config file's directory.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read config file: {}", config_path.display()))?;

        let mut config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", config_path.display()))?;

        if let Some(base) = config_path.parent() {
            config.resolve_relative(base);
        }
        Ok(config)
    }

    /// Returns the path to the config file.
    ///
    /// Default: `~/.config/lorekeep/config.toml`
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lorekeep")
            .join("config.toml")
    }

    fn resolve_relative(&mut self, base: &Path) {
        for path in self.export.templates.values_mut() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        if let Some(dir) = &mut self.data_dir {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }

    /// Export settings with command-line flags applied on top.
    pub fn export_config(&self, args: &ExportArgs) -> ExportConfig {
        let mut config = self.export.clone();
        if let Some(format) = args.dump_format {
            config.dump_format = format.into();
        }
        if args.no_leaflet {
            config.leaflet_scenes = false;
        }
        if args.names {
            config.note_name_uses_id = false;
            config.journal_folder_uses_id = false;
        }
        if args.player {
            config.include_gm_only = false;
        }
        config
    }

    /// Resolve the asset directory.
    ///
    /// Precedence order:
    /// 1. CLI `--data-dir` argument
    /// 2. Config file `data_dir` setting
    /// 3. The world file's directory
    pub fn data_dir(&self, args: &ExportArgs) -> PathBuf {
        args.data_dir
            .clone()
            .or_else(|| self.data_dir.clone())
            .or_else(|| args.world.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command};
    use crate::export::DumpFormat;
    use clap::Parser;
    use tempfile::TempDir;

    fn export_args(extra: &[&str]) -> ExportArgs {
        let args = ["lorekeep", "export", "worlds/demo/world.json", "--folder", "f1"];
        let cli = Cli::parse_from(args.iter().chain(extra.iter()));
        let Command::Export(args) = cli.command;
        args
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(Some(&dir.path().join("none.toml"))).unwrap();
        assert!(config.data_dir.is_none());
        assert!(config.export.note_name_uses_id);
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "data_dir = \"data\"\n\n[export]\ndump_format = \"JSON\"\n\n\
             [export.templates]\nActor = \"actor.md\"\nItem = \"/abs/item.md\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.data_dir, Some(dir.path().join("data")));
        assert_eq!(config.export.dump_format, DumpFormat::Json);
        assert_eq!(config.export.templates["Actor"], dir.path().join("actor.md"));
        assert_eq!(config.export.templates["Item"], PathBuf::from("/abs/item.md"));
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "data_dir = [").unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse config file"));
    }

    #[test]
    fn flags_override_file_settings() {
        let config = Config::default();
        let export = config.export_config(&export_args(&["--names", "--player", "--no-leaflet"]));
        assert!(!export.note_name_uses_id);
        assert!(!export.journal_folder_uses_id);
        assert!(!export.include_gm_only);
        assert!(!export.leaflet_scenes);

        let untouched = config.export_config(&export_args(&[]));
        assert!(untouched.note_name_uses_id && untouched.include_gm_only);
    }

    #[test]
    fn data_dir_precedence() {
        let config = Config {
            data_dir: Some(PathBuf::from("/config/data")),
            ..Config::default()
        };
        assert_eq!(
            config.data_dir(&export_args(&["--data-dir", "/cli/data"])),
            PathBuf::from("/cli/data")
        );
        assert_eq!(config.data_dir(&export_args(&[])), PathBuf::from("/config/data"));
        assert_eq!(
            Config::default().data_dir(&export_args(&[])),
            PathBuf::from("worlds/demo")
        );
    }

    #[test]
    fn config_path_is_in_config_dir() {
        let path = Config::config_path();
        assert!(path.ends_with("lorekeep/config.toml"));
    }
}
