// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Peter Carlton

//! Genomic windows.
//!
//! A [`Region`] is a closed, 1-based interval `[start, end]`, the way genome coordinates are
//! usually quoted (e.g. the SARS-CoV-2 spike gene is `21563-25384`). [`extract`] cuts the same
//! window out of every record of a collection.

use std::{fmt, str::FromStr};

use log::{debug, info};

use crate::errors::PhyloError;
use crate::seq::collection::SeqCollection;
use crate::seq::record::SeqRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    start: usize,
    end: usize,
}

impl Region {
    pub fn new(start: usize, end: usize) -> Result<Self, PhyloError> {
        if start == 0 {
            return Err(PhyloError::Format(String::from(
                "Region start must be >= 1 (positions are 1-based)",
            )));
        }
        if start > end {
            return Err(PhyloError::Format(format!(
                "Region start ({}) is past its end ({})",
                start, end
            )));
        }
        Ok(Region { start, end })
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    // Never empty: start <= end is enforced by new().
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The window's part of `sequence`, or None if `sequence` is too short.
    pub fn slice<'a>(&self, sequence: &'a str) -> Option<&'a str> {
        sequence.get(self.start - 1..self.end)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

// Accepts "START-END" or "START..END".
impl FromStr for Region {
    type Err = PhyloError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once("..")
            .or_else(|| s.split_once('-'))
            .ok_or_else(|| {
                PhyloError::Format(format!("Expected START-END or START..END, got '{}'", s))
            })?;
        let parse = |v: &str| {
            v.trim()
                .parse::<usize>()
                .map_err(|e| PhyloError::Format(format!("Bad region bound '{}': {}", v, e)))
        };
        Region::new(parse(start)?, parse(end)?)
    }
}

/// Cuts `region` out of every record. Headers and order are kept. Fails on the first record
/// shorter than the region's end; the input is never modified.
pub fn extract(collection: &SeqCollection, region: Region) -> Result<SeqCollection, PhyloError> {
    info!(
        "Extracting region {} ({} nt) from {} records",
        region,
        region.len(),
        collection.len()
    );
    let mut result = SeqCollection::new();
    for record in collection {
        let window = region.slice(&record.sequence).ok_or_else(|| PhyloError::Range {
            id: record.id().to_string(),
            len: record.sequence.len(),
            end: region.end(),
        })?;
        debug!("{}: {} -> {} nt", record.id(), record.len(), window.len());
        result.push(SeqRecord {
            header: record.header.clone(),
            sequence: window.to_string(),
        })?;
    }
    Ok(result)
}

impl SeqCollection {
    pub fn extract(&self, region: Region) -> Result<SeqCollection, PhyloError> {
        extract(self, region)
    }
}
