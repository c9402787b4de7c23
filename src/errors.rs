// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier
// Modifications (c) 2026 Peter Carlton

use std::{fmt, io};

#[derive(Debug)]
pub enum PhyloError {
    Io(io::Error),
    Format(String),
    // Window end lies beyond the sequence of record `id`.
    Range { id: String, len: usize, end: usize },
    Tool(String),
    Regex(regex::Error),
    Json(serde_json::Error),
}

// These allow conversion to PhyloError, required for main() to return Result<()> and for '?' to
// work.

impl From<io::Error> for PhyloError {
    fn from(e: io::Error) -> Self {
        PhyloError::Io(e)
    }
}

impl From<String> for PhyloError {
    fn from(s: String) -> Self {
        PhyloError::Format(s)
    }
}

impl From<regex::Error> for PhyloError {
    fn from(e: regex::Error) -> Self {
        PhyloError::Regex(e)
    }
}

impl From<serde_json::Error> for PhyloError {
    fn from(e: serde_json::Error) -> Self {
        PhyloError::Json(e)
    }
}

impl fmt::Display for PhyloError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhyloError::Io(e) => write!(f, "I/O error: {}", e),
            PhyloError::Format(msg) => write!(f, "Format error: {}", msg),
            PhyloError::Range { id, len, end } => write!(
                f,
                "Range error: sequence '{}' has length {}, window ends at {}",
                id, len, end
            ),
            PhyloError::Tool(msg) => write!(f, "Tool error: {}", msg),
            PhyloError::Regex(e) => write!(f, "Regex error: {}", e),
            PhyloError::Json(e) => write!(f, "Config error: {}", e),
        }
    }
}

impl std::error::Error for PhyloError {}
