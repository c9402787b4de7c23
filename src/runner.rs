// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier
// Modifications (c) 2026 Peter Carlton

use std::{
    fmt,
    fs::File,
    io::{stdout, BufWriter, Write},
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};
use regex::Regex;

use crate::align::{Aligner, AlignerTool, ExternalAligner};
use crate::config::{load_config, PhyloConfig};
use crate::distance::{distance_matrix, DistanceModel};
use crate::errors::PhyloError;
use crate::region::Region;
use crate::seq::clustal::read_clustal_file;
use crate::seq::collection::SeqCollection;
use crate::seq::fasta::{read_fasta_file, write_fasta, write_fasta_file};
use crate::tree::{leaf_summary, read_newick_file, render_tree, to_newick, write_newick_file};
use crate::upgma::{TreeBuilder, Upgma};

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.phylolabconfig, then ./.phylolabconfig)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show identifier and length of each sequence
    Info {
        /// Sequence file
        seq_fname: PathBuf,

        /// Sequence file format
        #[arg(short, long = "format", default_value_t = SeqFileFormat::FastA,
            help = "Sequence file format [fasta|clustal] (or just f|c); default: fasta",
            hide_default_value = true,
            hide_possible_values = true,
        )]
        format: SeqFileFormat,
    },

    /// Cut a window (1-based, inclusive) out of every sequence
    Extract {
        /// FastA file
        seq_fname: PathBuf,

        /// Window, as START-END or START..END
        #[arg(short, long)]
        region: Region,

        /// Only keep sequences whose header matches this regex
        #[arg(short, long)]
        select: Option<String>,

        /// Output FastA file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Sequence line width; 0 means no wrapping (default: from config, else 60)
        #[arg(short = 'w', long = "line-width")]
        line_width: Option<usize>,
    },

    /// Align sequences with an external aligner
    Align {
        /// FastA file
        seq_fname: PathBuf,

        /// Aligner (default: from config, else muscle)
        #[arg(short, long)]
        tool: Option<AlignerTool>,

        /// Output FastA file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Sequence line width; 0 means no wrapping (default: from config, else 60)
        #[arg(short = 'w', long = "line-width")]
        line_width: Option<usize>,
    },

    /// Build a UPGMA tree from aligned sequences
    Upgma {
        /// Aligned sequence file
        aln_fname: PathBuf,

        /// Sequence file format
        #[arg(short, long = "format", default_value_t = SeqFileFormat::FastA,
            help = "Sequence file format [fasta|clustal] (or just f|c); default: fasta",
            hide_default_value = true,
            hide_possible_values = true,
        )]
        format: SeqFileFormat,

        /// Distance model
        #[arg(short, long, default_value_t = DistanceModel::PDistance)]
        model: DistanceModel,

        /// Output Newick file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Draw a Newick tree
    Show {
        /// Newick file
        tree_fname: PathBuf,
    },

    /// extract, align and upgma in one go, keeping intermediate files in a work directory
    Pipeline {
        /// FastA file
        seq_fname: PathBuf,

        /// Window, as START-END or START..END
        #[arg(short, long)]
        region: Region,

        /// Only keep sequences whose header matches this regex
        #[arg(short, long)]
        select: Option<String>,

        /// Directory for region.fasta, aligned.fasta and upgma.nwk
        #[arg(short = 'd', long)]
        workdir: PathBuf,

        /// Aligner (default: from config, else muscle)
        #[arg(short, long)]
        tool: Option<AlignerTool>,

        /// Distance model
        #[arg(short, long, default_value_t = DistanceModel::PDistance)]
        model: DistanceModel,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SeqFileFormat {
    #[clap(name = "fasta")]
    #[clap(alias = "f")]
    FastA,
    #[clap(name = "clustal")]
    #[clap(alias = "c")]
    Clustal,
}

impl fmt::Display for SeqFileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SeqFileFormat::FastA => "fasta",
            SeqFileFormat::Clustal => "clustal",
        };
        write!(f, "{}", s)
    }
}

fn read_seq_file(path: &Path, format: SeqFileFormat) -> Result<SeqCollection, PhyloError> {
    match format {
        SeqFileFormat::FastA => read_fasta_file(path),
        SeqFileFormat::Clustal => read_clustal_file(path),
    }
}

// Writes to `output`, or to stdout if None.
fn output_writer(output: Option<&Path>) -> Result<Box<dyn Write>, PhyloError> {
    Ok(match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(stdout())),
    })
}

fn select_records(
    collection: SeqCollection,
    pattern: Option<&str>,
) -> Result<SeqCollection, PhyloError> {
    let Some(pattern) = pattern else {
        return Ok(collection);
    };
    let re = Regex::new(pattern)?;
    let selected = collection.select(&re);
    info!(
        "{} of {} sequences match /{}/",
        selected.len(),
        collection.len(),
        pattern
    );
    if selected.is_empty() {
        return Err(PhyloError::Format(format!(
            "No sequence header matches /{}/",
            pattern
        )));
    }
    Ok(selected)
}

fn make_aligner(tool: Option<AlignerTool>, config: &PhyloConfig) -> ExternalAligner {
    let tool = tool
        .or(config.tools.default_aligner)
        .unwrap_or(AlignerTool::Muscle);
    ExternalAligner::new(tool, config.bin_dir(tool).map(Path::to_path_buf))
}

pub fn output_info(collection: &SeqCollection, out: &mut dyn Write) -> Result<(), PhyloError> {
    let id_width = collection
        .iter()
        .map(|r| r.id().len())
        .max()
        .unwrap_or(0);
    for record in collection {
        writeln!(out, "{:<width$}  {}", record.id(), record.len(), width = id_width)?;
    }
    writeln!(
        out,
        "{} sequences, {}",
        collection.len(),
        if collection.is_aligned() {
            "aligned"
        } else {
            "not aligned"
        }
    )?;
    Ok(())
}

pub struct PipelineOutput {
    pub region_fasta: PathBuf,
    pub aligned_fasta: PathBuf,
    pub tree_newick: PathBuf,
}

/// Extracts `region` from `seq_fname`, aligns, and builds a UPGMA tree, writing each step's
/// result to `workdir`.
pub fn run_pipeline(
    seq_fname: &Path,
    region: Region,
    select: Option<&str>,
    workdir: &Path,
    aligner: &dyn Aligner,
    model: DistanceModel,
    line_width: usize,
) -> Result<PipelineOutput, PhyloError> {
    std::fs::create_dir_all(workdir)?;
    let out = PipelineOutput {
        region_fasta: workdir.join("region.fasta"),
        aligned_fasta: workdir.join("aligned.fasta"),
        tree_newick: workdir.join("upgma.nwk"),
    };

    let genomes = select_records(read_fasta_file(seq_fname)?, select)?;
    let windowed = genomes.extract(region)?;
    write_fasta_file(&windowed, &out.region_fasta, line_width)?;
    info!("Wrote {}", out.region_fasta.display());

    // Align what was written, as a separate step would.
    let to_align = read_fasta_file(&out.region_fasta)?;
    let aligned = aligner.align(&to_align)?;
    write_fasta_file(&aligned, &out.aligned_fasta, line_width)?;
    info!("Wrote {}", out.aligned_fasta.display());

    let matrix = distance_matrix(&aligned, model)?;
    let tree = Upgma.build(&matrix)?;
    write_newick_file(&tree, &out.tree_newick)?;
    info!(
        "Wrote {} (leaves: {})",
        out.tree_newick.display(),
        leaf_summary(&tree)
    );
    Ok(out)
}

pub fn run() -> Result<(), PhyloError> {
    env_logger::init();
    info!("Starting log");

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Info { seq_fname, format } => {
            let collection = read_seq_file(&seq_fname, format)?;
            let mut out = output_writer(None)?;
            output_info(&collection, &mut out)?;
            out.flush()?;
        }
        Command::Extract {
            seq_fname,
            region,
            select,
            output,
            line_width,
        } => {
            let genomes = select_records(read_fasta_file(&seq_fname)?, select.as_deref())?;
            let windowed = genomes.extract(region)?;
            let mut out = output_writer(output.as_deref())?;
            write_fasta(
                &windowed,
                &mut out,
                line_width.unwrap_or(config.fasta.line_width),
            )?;
            out.flush()?;
        }
        Command::Align {
            seq_fname,
            tool,
            output,
            line_width,
        } => {
            let collection = read_fasta_file(&seq_fname)?;
            if collection.is_aligned() {
                warn!("{} already looks aligned", seq_fname.display());
            }
            let aligned = make_aligner(tool, &config).align(&collection)?;
            let mut out = output_writer(output.as_deref())?;
            write_fasta(
                &aligned,
                &mut out,
                line_width.unwrap_or(config.fasta.line_width),
            )?;
            out.flush()?;
        }
        Command::Upgma {
            aln_fname,
            format,
            model,
            output,
        } => {
            let aligned = read_seq_file(&aln_fname, format)?;
            let matrix = distance_matrix(&aligned, model)?;
            let tree = Upgma.build(&matrix)?;
            match output {
                Some(path) => write_newick_file(&tree, &path)?,
                None => println!("{}", to_newick(&tree)),
            }
        }
        Command::Show { tree_fname } => {
            let tree = read_newick_file(&tree_fname)?;
            for line in render_tree(&tree)? {
                println!("{}", line);
            }
        }
        Command::Pipeline {
            seq_fname,
            region,
            select,
            workdir,
            tool,
            model,
        } => {
            let aligner = make_aligner(tool, &config);
            let out = run_pipeline(
                &seq_fname,
                region,
                select.as_deref(),
                &workdir,
                &aligner,
                model,
                config.fasta.line_width,
            )?;
            let tree = read_newick_file(&out.tree_newick)?;
            for line in render_tree(&tree)? {
                println!("{}", line);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_extract_args() {
        let cli = Cli::parse_from([
            "phylolab",
            "extract",
            "genomes.fas",
            "--region",
            "21563-25384",
            "-w",
            "0",
        ]);
        match cli.command {
            Command::Extract {
                region, line_width, ..
            } => {
                assert_eq!(region, Region::new(21563, 25384).unwrap());
                assert_eq!(line_width, Some(0));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_bad_region() {
        let res = Cli::try_parse_from(["phylolab", "extract", "g.fas", "--region", "9-3"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_make_aligner_defaults() {
        let config = PhyloConfig::default();
        assert_eq!(make_aligner(None, &config).tool(), AlignerTool::Muscle);
        let config = PhyloConfig::from_json(
            r#"{ "tools": { "default_aligner": "mafft", "mafft_bin_dir": "/opt/mafft" } }"#,
        )
        .unwrap();
        let aligner = make_aligner(None, &config);
        assert_eq!(aligner.tool(), AlignerTool::Mafft);
        assert_eq!(aligner.program(), PathBuf::from("/opt/mafft/mafft"));
        assert_eq!(
            make_aligner(Some(AlignerTool::Muscle), &config).tool(),
            AlignerTool::Muscle
        );
    }

    #[test]
    fn test_output_info() {
        let coll = read_fasta_file("data/genomes.fas").unwrap();
        let mut out: Vec<u8> = Vec::new();
        output_info(&coll, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "SARS-CoV-2  61");
        assert_eq!(lines[1], "RaTG13      65");
        assert_eq!(lines[4], "4 sequences, not aligned");
    }

    #[test]
    fn test_select_records() {
        let coll = read_fasta_file("data/genomes.fas").unwrap();
        let human = select_records(coll.clone(), Some("human")).unwrap();
        assert_eq!(human.ids(), vec!["SARS-CoV-2", "SARS-CoV"]);
        assert!(select_records(coll.clone(), Some("^$")).is_err());
        assert!(matches!(
            select_records(coll, Some("(")),
            Err(PhyloError::Regex(_))
        ));
    }
}
