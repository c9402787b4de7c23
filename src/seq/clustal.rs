// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier
// Modifications (c) 2026 Peter Carlton

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::errors::PhyloError;
use crate::seq::collection::SeqCollection;
use crate::seq::record::SeqRecord;

pub fn read_clustal_file<P: AsRef<Path>>(path: P) -> Result<SeqCollection, PhyloError> {
    let file = File::open(path)?;
    read_clustal(BufReader::new(file))
}

// Blocks of "name fragment" lines; a name's fragments are concatenated in block order. Header
// lines, comments and conservation lines (which start with whitespace) are skipped.
pub fn read_clustal<R: BufRead>(reader: R) -> Result<SeqCollection, PhyloError> {
    let mut order: Vec<String> = Vec::new();
    let mut sequences: HashMap<String, String> = HashMap::new();

    for line in reader.lines() {
        let l = line?;
        let trimmed = l.trim_end();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with("CLUSTAL") || trimmed.starts_with("MUSCLE") {
            continue;
        }
        if trimmed.starts_with('#') {
            continue;
        }
        if trimmed
            .chars()
            .next()
            .map(|c| c.is_whitespace())
            .unwrap_or(false)
        {
            continue;
        }
        let mut fields = trimmed.split_whitespace();
        let name = fields
            .next()
            .ok_or_else(|| PhyloError::Format(String::from("Missing sequence id")))?;
        let fragment = fields
            .next()
            .ok_or_else(|| PhyloError::Format(String::from("Missing sequence fragment")))?;
        let entry = sequences.entry(name.to_string()).or_insert_with(|| {
            order.push(name.to_string());
            String::new()
        });
        entry.push_str(fragment);
    }

    if order.is_empty() {
        return Err(PhyloError::Format(String::from("No sequences found")));
    }

    let mut result = SeqCollection::new();
    for name in order {
        let sequence = sequences.remove(&name).unwrap_or_default();
        result.push(SeqRecord {
            header: name,
            sequence,
        })?;
    }

    Ok(result)
}
