use anyhow::{Context, Result};
use serde::Deserialize;
use sheetmerge_core::ComposeOptions;
use std::path::{Path, PathBuf};

pub const DEFAULT_TEMPLATES_DIR: &str = "templates";

/// Contents of the optional `--config` YAML file.
///
/// ```yaml
/// templates_dir: ./templates
/// compose:
///   input_sheet: Input
///   output_sheet: Output
///   transplant_mode: skip-empty
///   normalize_text: true
///   view:
///     show_grid_lines: false
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub templates_dir: Option<PathBuf>,
    pub compose: ComposeOptions,
}

impl CliConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// `--templates-dir` wins over the file, which wins over the default.
    pub fn templates_dir(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.templates_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATES_DIR))
    }
}
