// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier
// Modifications (c) 2026 Peter Carlton

use crate::errors::PhyloError;

// A record for sequences, consisting of a header line and a raw sequence. The header is kept
// verbatim (minus the leading '>') so that writing a record back out reproduces it; the
// identifier is the header's first whitespace-delimited word.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqRecord {
    pub header: String,
    pub sequence: String,
}

impl SeqRecord {
    pub fn new(header: &str, sequence: &str) -> Self {
        SeqRecord {
            header: header.to_string(),
            sequence: sequence.to_string(),
        }
    }

    pub fn id(&self) -> &str {
        self.header.split_whitespace().next().unwrap_or("")
    }

    /// Free-text description following the identifier, if any.
    pub fn description(&self) -> Option<&str> {
        let trimmed = self.header.trim_start();
        let rest = trimmed[self.id().len()..].trim();
        if rest.is_empty() {
            None
        } else {
            Some(rest)
        }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

// Residue letters plus the gap ('-', '.') and stop ('*') symbols. Positions are counted in these
// one-byte symbols, so nothing else may appear in a sequence.
fn is_sequence_symbol(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, '-' | '.' | '*')
}

/// `raw` with whitespace removed, or a format error naming `id` on the first symbol that is not
/// a letter, gap or stop.
pub fn clean_sequence(raw: &str, id: &str) -> Result<String, PhyloError> {
    let mut cleaned = String::with_capacity(raw.len());
    for (pos, c) in raw.chars().filter(|c| !c.is_whitespace()).enumerate() {
        if !is_sequence_symbol(c) {
            return Err(PhyloError::Format(format!(
                "Invalid symbol '{}' in sequence '{}' (position {})",
                c,
                id,
                pos + 1
            )));
        }
        cleaned.push(c);
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_and_description() {
        let rec = SeqRecord::new("MN908947.3 Severe acute respiratory syndrome", "ACGT");
        assert_eq!(rec.id(), "MN908947.3");
        assert_eq!(rec.description(), Some("Severe acute respiratory syndrome"));
    }

    #[test]
    fn test_bare_id() {
        let rec = SeqRecord::new("bat_RaTG13", "ACGT");
        assert_eq!(rec.id(), "bat_RaTG13");
        assert_eq!(rec.description(), None);
        assert_eq!(rec.len(), 4);
    }

    #[test]
    fn test_clean_sequence_strips_whitespace() {
        assert_eq!(clean_sequence("AC GT\tac-.*", "x").unwrap(), "ACGTac-.*");
    }

    #[test]
    fn test_clean_sequence_rejects_other_symbols() {
        for raw in ["ÅCGTACGT", "AC>GT", "ACG1T", "AC;GT"] {
            assert!(
                matches!(clean_sequence(raw, "x"), Err(PhyloError::Format(_))),
                "accepted {}",
                raw
            );
        }
    }
}
