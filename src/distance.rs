// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Peter Carlton

use std::fmt;

use clap::ValueEnum;
use log::{debug, info};

use crate::errors::PhyloError;
use crate::seq::collection::SeqCollection;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum DistanceModel {
    /// Proportion of differing sites
    #[clap(name = "p")]
    PDistance,
    /// Jukes-Cantor (1969) correction
    #[clap(name = "jc")]
    JukesCantor,
}

impl fmt::Display for DistanceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DistanceModel::PDistance => "p",
            DistanceModel::JukesCantor => "jc",
        };
        write!(f, "{}", s)
    }
}

/// Square, symmetric matrix of pairwise distances, rows labelled by sequence identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    labels: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl DistanceMatrix {
    pub fn new(labels: Vec<String>, values: Vec<Vec<f64>>) -> Result<Self, PhyloError> {
        let n = labels.len();
        if values.len() != n || values.iter().any(|row| row.len() != n) {
            return Err(PhyloError::Format(format!(
                "Distance matrix for {} labels must be {}x{}",
                n, n, n
            )));
        }
        Ok(DistanceMatrix { labels, values })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i][j]
    }
}

// Unambiguous nucleotide, as an index 0..4 (U counts as T).
fn base_index(b: u8) -> Option<u8> {
    match b.to_ascii_uppercase() {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' | b'U' => Some(3),
        _ => None,
    }
}

/// Proportion of differing sites among those where both sequences have an unambiguous base.
/// None if there is no such site.
pub fn p_distance(s1: &str, s2: &str) -> Option<f64> {
    let mut compared = 0usize;
    let mut diffs = 0usize;
    for (a, b) in s1.bytes().zip(s2.bytes()) {
        if let (Some(x), Some(y)) = (base_index(a), base_index(b)) {
            compared += 1;
            if x != y {
                diffs += 1;
            }
        }
    }
    if compared == 0 {
        None
    } else {
        Some(diffs as f64 / compared as f64)
    }
}

/// d = -3/4 ln(1 - 4p/3); None when saturated (p >= 3/4).
pub fn jukes_cantor(p: f64) -> Option<f64> {
    let arg = 1.0 - 4.0 * p / 3.0;
    if arg <= 0.0 {
        None
    } else {
        let d = -0.75 * arg.ln();
        // no -0 for identical sequences
        Some(if d == 0.0 { 0.0 } else { d })
    }
}

pub fn distance_matrix(
    aligned: &SeqCollection,
    model: DistanceModel,
) -> Result<DistanceMatrix, PhyloError> {
    if aligned.len() < 2 {
        return Err(PhyloError::Format(String::from(
            "Need at least two sequences for a distance matrix",
        )));
    }
    if !aligned.is_aligned() {
        return Err(PhyloError::Format(String::from(
            "Sequences are not aligned (lengths differ)",
        )));
    }
    info!(
        "Computing {} distances between {} sequences",
        model,
        aligned.len()
    );
    let recs = aligned.records();
    let n = recs.len();
    let mut values = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let p = p_distance(&recs[i].sequence, &recs[j].sequence).ok_or_else(|| {
                PhyloError::Format(format!(
                    "No comparable sites between '{}' and '{}'",
                    recs[i].id(),
                    recs[j].id()
                ))
            })?;
            let d = match model {
                DistanceModel::PDistance => p,
                DistanceModel::JukesCantor => jukes_cantor(p).ok_or_else(|| {
                    PhyloError::Format(format!(
                        "Jukes-Cantor distance undefined between '{}' and '{}' (p = {})",
                        recs[i].id(),
                        recs[j].id(),
                        p
                    ))
                })?,
            };
            debug!("d({}, {}) = {}", recs[i].id(), recs[j].id(), d);
            values[i][j] = d;
            values[j][i] = d;
        }
    }
    let labels = recs.iter().map(|r| r.id().to_string()).collect();
    DistanceMatrix::new(labels, values)
}
