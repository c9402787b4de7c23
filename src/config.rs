// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Peter Carlton

use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use crate::align::AlignerTool;
use crate::errors::PhyloError;
use crate::seq::fasta::DEFAULT_LINE_WIDTH;

pub const CONFIG_FILENAME: &str = ".phylolabconfig";

// JSON, e.g.
//
// {
//   "tools": { "muscle_bin_dir": "/opt/muscle/bin", "default_aligner": "mafft" },
//   "fasta": { "line_width": 70 }
// }
//
// Every field is optional.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PhyloConfig {
    pub tools: ToolsConfig,
    pub fasta: FastaConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub muscle_bin_dir: Option<PathBuf>,
    pub mafft_bin_dir: Option<PathBuf>,
    pub default_aligner: Option<AlignerTool>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FastaConfig {
    pub line_width: usize,
}

impl Default for FastaConfig {
    fn default() -> Self {
        FastaConfig {
            line_width: DEFAULT_LINE_WIDTH,
        }
    }
}

impl PhyloConfig {
    pub fn from_file(path: &Path) -> Result<Self, PhyloError> {
        let text = std::fs::read_to_string(path)?;
        let config = PhyloConfig::from_json(&text)?;
        debug!("Read config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, PhyloError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn bin_dir(&self, tool: AlignerTool) -> Option<&Path> {
        match tool {
            AlignerTool::Muscle => self.tools.muscle_bin_dir.as_deref(),
            AlignerTool::Mafft => self.tools.mafft_bin_dir.as_deref(),
        }
    }
}

/// Looks for a config file in $HOME, then in the current directory.
pub fn find_config() -> Option<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        let path = PathBuf::from(home).join(CONFIG_FILENAME);
        if path.exists() {
            return Some(path);
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        let path = cwd.join(CONFIG_FILENAME);
        if path.exists() {
            return Some(path);
        }
    }
    None
}

/// An explicitly given path must exist; otherwise the default locations are tried, and their
/// absence just means the default configuration.
pub fn load_config(explicit: Option<&Path>) -> Result<PhyloConfig, PhyloError> {
    match explicit {
        Some(path) => PhyloConfig::from_file(path),
        None => match find_config() {
            Some(path) => PhyloConfig::from_file(&path),
            None => Ok(PhyloConfig::default()),
        },
    }
}
