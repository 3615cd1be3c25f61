//! Load options for the CLI: an optional JSON file, then flag overrides.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use obograph_ontology::LoadOptions;

#[derive(Args, Debug, Clone, Default)]
pub struct LoadArgs {
    /// JSON file with load options (missing fields keep their defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Keep terms marked `is_obsolete: true`
    #[arg(long, global = true)]
    pub keep_obsolete: bool,

    /// Only build `is_a` edges (ignore `relationship:` lines)
    #[arg(long, global = true)]
    pub is_a_only: bool,

    /// Skip the load-time acyclicity check
    #[arg(long, global = true)]
    pub skip_cycle_check: bool,
}

impl LoadArgs {
    pub fn resolve(&self) -> Result<LoadOptions> {
        let mut options = match &self.config {
            Some(path) => read_config(path)?,
            None => LoadOptions::default(),
        };

        if self.keep_obsolete {
            options.parse.ignore_obsolete = false;
        }
        if self.is_a_only {
            options.parse.include_relationships = false;
        }
        if self.skip_cycle_check {
            options.check_acyclic = false;
        }
        Ok(options)
    }
}

fn read_config(path: &Path) -> Result<LoadOptions> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
}
