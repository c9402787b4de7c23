// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Peter Carlton

use std::{
    fmt,
    fs::File,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    sync::atomic::{AtomicUsize, Ordering},
};

use clap::ValueEnum;
use itertools::Itertools;
use log::{debug, info, warn};
use serde::Deserialize;

use crate::errors::PhyloError;
use crate::seq::collection::SeqCollection;
use crate::seq::fasta::{read_fasta_file, write_fasta_file};

/// Anything that turns a collection into an alignment: same records, gaps inserted so that all
/// sequences have the same length.
pub trait Aligner {
    fn align(&self, input: &SeqCollection) -> Result<SeqCollection, PhyloError>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignerTool {
    #[clap(name = "muscle")]
    Muscle,
    #[clap(name = "mafft")]
    Mafft,
}

impl AlignerTool {
    pub fn program_name(&self) -> &'static str {
        match self {
            AlignerTool::Muscle => "muscle",
            AlignerTool::Mafft => "mafft",
        }
    }
}

impl fmt::Display for AlignerTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program_name())
    }
}

/// Runs muscle or mafft as a child process, going through temporary FastA files.
#[derive(Debug, Clone)]
pub struct ExternalAligner {
    tool: AlignerTool,
    bin_dir: Option<PathBuf>,
}

static TMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

// Removes the temporary files when dropped, whether or not the tool succeeded.
struct TmpFiles(Vec<PathBuf>);

impl Drop for TmpFiles {
    fn drop(&mut self) {
        for path in &self.0 {
            std::fs::remove_file(path).ok();
        }
    }
}

fn tmp_path(tag: &str) -> PathBuf {
    let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut path = std::env::temp_dir();
    path.push(format!("phylolab-{}-{}.{}.fa", std::process::id(), n, tag));
    path
}

impl ExternalAligner {
    pub fn new(tool: AlignerTool, bin_dir: Option<PathBuf>) -> Self {
        ExternalAligner { tool, bin_dir }
    }

    pub fn tool(&self) -> AlignerTool {
        self.tool
    }

    /// Path to the executable; bare program name (looked up in PATH) if no bin dir is set.
    pub fn program(&self) -> PathBuf {
        match &self.bin_dir {
            Some(dir) => dir.join(self.tool.program_name()),
            None => PathBuf::from(self.tool.program_name()),
        }
    }

    fn run_tool(&self, input: &Path, output: &Path) -> Result<(), PhyloError> {
        let program = self.program();
        let mut cmd = Command::new(&program);
        match self.tool {
            AlignerTool::Muscle => {
                cmd.arg("-align")
                    .arg(input)
                    .arg("-output")
                    .arg(output)
                    .stdout(Stdio::null());
            }
            AlignerTool::Mafft => {
                cmd.arg("--auto")
                    .arg(input)
                    .stdout(Stdio::from(File::create(output)?));
            }
        }
        debug!("Running {:?}", cmd);
        let status = cmd
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| PhyloError::Tool(format!("Failed to run {}: {}", program.display(), e)))?;
        if !status.success() {
            return Err(PhyloError::Tool(format!("{} failed ({})", self.tool, status)));
        }
        Ok(())
    }
}

impl Aligner for ExternalAligner {
    fn align(&self, input: &SeqCollection) -> Result<SeqCollection, PhyloError> {
        if input.len() < 2 {
            return Err(PhyloError::Format(String::from(
                "Need at least two sequences to align",
            )));
        }
        let input_path = tmp_path("in");
        let output_path = tmp_path("out");
        let _cleanup = TmpFiles(vec![input_path.clone(), output_path.clone()]);

        write_fasta_file(input, &input_path, 0)?;
        info!("Aligning {} sequences with {}", input.len(), self.tool);
        self.run_tool(&input_path, &output_path)?;
        let aligned = read_fasta_file(&output_path)?;
        restore_order(input, aligned)
    }
}

// Checks that the aligner returned exactly the input's records, all of the same length, and
// puts them back in input order (aligners may reorder).
fn restore_order(
    input: &SeqCollection,
    aligned: SeqCollection,
) -> Result<SeqCollection, PhyloError> {
    if aligned.len() != input.len() {
        return Err(PhyloError::Format(format!(
            "Aligner returned {} sequences, expected {}",
            aligned.len(),
            input.len()
        )));
    }
    if !aligned.is_aligned() {
        return Err(PhyloError::Format(String::from(
            "Aligner output sequences differ in length",
        )));
    }
    let missing: Vec<&str> = input
        .ids()
        .into_iter()
        .filter(|id| aligned.get(id).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(PhyloError::Format(format!(
            "Missing from aligner output: {}",
            missing.iter().join(", ")
        )));
    }
    let mut result = SeqCollection::new();
    for id in input.ids() {
        if let Some(record) = aligned.get(id) {
            result.push(record.clone())?;
        }
    }
    if result.records().first().map(|r| r.len()).unwrap_or(0) == 0 {
        warn!("Aligner returned empty sequences");
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coll(hdrs: &[&str], seqs: &[&str]) -> SeqCollection {
        SeqCollection::from_vecs(
            hdrs.iter().map(|s| s.to_string()).collect(),
            seqs.iter().map(|s| s.to_string()).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_program_path() {
        let plain = ExternalAligner::new(AlignerTool::Muscle, None);
        assert_eq!(plain.program(), PathBuf::from("muscle"));
        let in_dir = ExternalAligner::new(AlignerTool::Mafft, Some(PathBuf::from("/opt/bin")));
        assert_eq!(in_dir.program(), PathBuf::from("/opt/bin/mafft"));
    }

    #[test]
    fn test_restore_order() {
        let input = coll(&["a", "b", "c"], &["ACGT", "AGT", "ACT"]);
        let aligned = coll(&["c", "a", "b"], &["AC-T", "ACGT", "A-GT"]);
        let result = restore_order(&input, aligned).unwrap();
        assert_eq!(result.ids(), vec!["a", "b", "c"]);
        assert_eq!(result.get("b").unwrap().sequence, "A-GT");
    }

    #[test]
    fn test_restore_order_unaligned() {
        let input = coll(&["a", "b"], &["ACGT", "AGT"]);
        let aligned = coll(&["a", "b"], &["ACGT", "AGT"]);
        assert!(matches!(
            restore_order(&input, aligned),
            Err(PhyloError::Format(_))
        ));
    }

    #[test]
    fn test_restore_order_missing() {
        let input = coll(&["a", "b"], &["ACGT", "AGT"]);
        let aligned = coll(&["a", "x"], &["ACGT", "A-GT"]);
        assert!(matches!(
            restore_order(&input, aligned),
            Err(PhyloError::Format(_))
        ));
    }

    #[test]
    fn test_align_needs_two() {
        let aligner = ExternalAligner::new(AlignerTool::Muscle, None);
        let res = aligner.align(&coll(&["a"], &["ACGT"]));
        assert!(matches!(res, Err(PhyloError::Format(_))));
    }

    #[test]
    fn test_align_missing_tool() {
        let aligner = ExternalAligner::new(
            AlignerTool::Muscle,
            Some(PathBuf::from("/nonexistent/phylolab/bin")),
        );
        let res = aligner.align(&coll(&["a", "b"], &["ACGT", "AGT"]));
        assert!(matches!(res, Err(PhyloError::Tool(_))));
    }
}
