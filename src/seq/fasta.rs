// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier
// Modifications (c) 2026 Peter Carlton

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::debug;

use crate::errors::PhyloError;
use crate::seq::collection::SeqCollection;
use crate::seq::record::SeqRecord;

pub const DEFAULT_LINE_WIDTH: usize = 60;

pub fn read_fasta_file<P: AsRef<Path>>(path: P) -> Result<SeqCollection, PhyloError> {
    let file = File::open(path.as_ref())?;
    debug!("Reading FastA from {}", path.as_ref().display());
    read_fasta(BufReader::new(file))
}

pub fn read_fasta<R: BufRead>(reader: R) -> Result<SeqCollection, PhyloError> {
    let mut result = SeqCollection::new();
    let mut current_record: Option<SeqRecord> = None;

    for (lineno, line) in reader.lines().enumerate() {
        let l = line?;
        let trimmed = l.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(hdr) = trimmed.strip_prefix('>') {
            if let Some(record) = current_record.take() {
                result.push(record)?;
            }
            current_record = Some(SeqRecord {
                header: hdr.trim().to_string(),
                sequence: String::new(),
            });
        } else {
            match current_record.as_mut() {
                // append line to current record's sequence
                Some(record) => record.sequence.push_str(trimmed),
                None => {
                    return Err(PhyloError::Format(format!(
                        "Sequence data before first header (line {})",
                        lineno + 1
                    )))
                }
            }
        }
    }
    if let Some(record) = current_record {
        result.push(record)?;
    }

    if result.is_empty() {
        return Err(PhyloError::Format(String::from("No sequences found")));
    }
    debug!("Read {} FastA records", result.len());
    Ok(result)
}

/// Writes `collection` as FastA, wrapping sequence lines at `line_width` characters (0: no
/// wrapping).
pub fn write_fasta<W: Write>(
    collection: &SeqCollection,
    writer: &mut W,
    line_width: usize,
) -> Result<(), PhyloError> {
    for record in collection {
        writeln!(writer, ">{}", record.header)?;
        if line_width == 0 || record.sequence.len() <= line_width {
            writeln!(writer, "{}", record.sequence)?;
            continue;
        }
        for chunk in record.sequence.as_bytes().chunks(line_width) {
            writer.write_all(chunk)?;
            writer.write_all(b"\n")?;
        }
    }
    Ok(())
}

pub fn write_fasta_file<P: AsRef<Path>>(
    collection: &SeqCollection,
    path: P,
    line_width: usize,
) -> Result<(), PhyloError> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    write_fasta(collection, &mut writer, line_width)?;
    writer.flush()?;
    debug!(
        "Wrote {} FastA records to {}",
        collection.len(),
        path.as_ref().display()
    );
    Ok(())
}
