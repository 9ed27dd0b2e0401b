//! Site configuration management for `tinyssg.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── build      # [build]
//! │   └── serve      # [serve]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError
//! │   └── handle     # Global config handle
//! └── mod.rs         # SiteConfig, SitePaths (this file)
//! ```
//!
//! The config file is optional. Every field has a default, and command-line
//! flags override whatever the file says.

pub mod section;
pub mod types;

pub use section::{BuildConfig, ServeConfig};
pub use types::{ConfigError, cfg, init_config};

use crate::cli::{BuildArgs, Cli, Commands, ServeArgs};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing tinyssg.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Project root directory (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Source and output directories
    #[serde(default)]
    pub build: BuildConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

/// Absolute project directories, resolved once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePaths {
    pub root: PathBuf,
    pub pages: PathBuf,
    pub libs: PathBuf,
    pub static_dir: PathBuf,
    pub output: PathBuf,
}

impl SitePaths {
    /// Name of the static mirror inside the output root.
    pub fn static_name(&self) -> Option<&str> {
        self.static_dir.file_name().and_then(|n| n.to_str())
    }
}

impl SiteConfig {
    /// Load configuration for `cli`.
    ///
    /// The project root is `--curdir` (with `~` expanded) or the
    /// current directory; the config file is looked up relative to it.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = Self::resolve_root(cli)?;
        let config_path = crate::utils::path::normalize_path(&root.join(&cli.config));

        let mut config = if config_path.is_file() {
            Self::from_path(&config_path)?
        } else {
            crate::debug!("config"; "{} not found, using defaults", config_path.display());
            Self::default()
        };

        config.root = root;
        config.apply_command_options(cli);
        config.normalize_paths();
        config.validate()?;

        Ok(config)
    }

    fn resolve_root(cli: &Cli) -> Result<PathBuf> {
        let root = match &cli.curdir {
            Some(dir) => PathBuf::from(shellexpand::tilde(dir).as_ref()),
            None => std::env::current_dir().context("Failed to get current working directory")?,
        };
        if !root.is_dir() {
            bail!(ConfigError::Validation(format!(
                "project directory `{}` does not exist",
                root.display()
            )));
        }
        Ok(crate::utils::path::normalize_path(&root))
    }

    /// Load configuration from file path, warning about unknown fields.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::from)?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        crate::log!("warn"; "ignoring unknown fields in {}: {}", display_path, fields.join(", "));
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Absolute project directories.
    pub fn paths(&self) -> SitePaths {
        SitePaths {
            root: self.root.clone(),
            pages: self.build.pages.clone(),
            libs: self.build.libs.clone(),
            static_dir: self.build.static_dir.clone(),
            output: self.build.output.clone(),
        }
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    fn apply_command_options(&mut self, cli: &Cli) {
        match &cli.command {
            Commands::Gen { build_args } => self.apply_build_args(build_args),
            Commands::Dev {
                build_args,
                serve_args,
            } => {
                self.apply_build_args(build_args);
                self.apply_serve_args(serve_args);
            }
            Commands::Clean { output } => {
                Self::update_option(&mut self.build.output, output.as_ref());
            }
        }
    }

    fn apply_build_args(&mut self, args: &BuildArgs) {
        // Set verbose mode globally
        crate::logger::set_verbose(args.verbose);

        Self::update_option(&mut self.build.pages, args.pages.as_ref());
        Self::update_option(&mut self.build.libs, args.libs.as_ref());
        Self::update_option(&mut self.build.static_dir, args.static_dir.as_ref());
        Self::update_option(&mut self.build.output, args.output.as_ref());
    }

    fn apply_serve_args(&mut self, args: &ServeArgs) {
        Self::update_option(&mut self.serve.port, args.port.as_ref());
        Self::update_option(&mut self.serve.wait, args.wait.as_ref());
        // Flags can only switch features off
        self.serve.log &= !args.nolog;
        self.serve.reload &= !args.noreload;
        self.serve.open &= !args.noopen;
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // path normalization
    // ========================================================================

    /// Make every build directory absolute, relative to the root.
    fn normalize_paths(&mut self) {
        let root = self.root.clone();
        for dir in [
            &mut self.build.pages,
            &mut self.build.libs,
            &mut self.build.static_dir,
            &mut self.build.output,
        ] {
            *dir = crate::utils::path::normalize_path(&root.join(&*dir));
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Reject settings that would make a pass destroy its own inputs.
    pub fn validate(&self) -> Result<()> {
        let output = &self.build.output;
        let sources = [
            ("pages", &self.build.pages),
            ("libs", &self.build.libs),
            ("static", &self.build.static_dir),
        ];
        for (name, dir) in sources {
            if dir.starts_with(output) {
                bail!(ConfigError::Validation(format!(
                    "output directory `{}` contains the {} directory `{}`",
                    output.display(),
                    name,
                    dir.display()
                )));
            }
            // Nor may it sit inside one
            if output.starts_with(dir) {
                bail!(ConfigError::Validation(format!(
                    "output directory `{}` is inside the {} directory `{}`",
                    output.display(),
                    name,
                    dir.display()
                )));
            }
        }

        if output.file_name().is_none() {
            bail!(ConfigError::Validation(format!(
                "output directory `{}` must be a named directory",
                output.display()
            )));
        }

        if self.serve.wait == 0 {
            bail!(ConfigError::Validation(
                "serve.wait must be greater than 0".into()
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> SiteConfig {
    let (parsed, ignored) = SiteConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
