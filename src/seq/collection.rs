// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier
// Modifications (c) 2026 Peter Carlton

use std::collections::HashMap;

use regex::Regex;

use crate::errors::PhyloError;
use crate::seq::record::{clean_sequence, SeqRecord};

// A sequence collection is an ordered list of records (file order) with unique identifiers. The
// index maps each identifier to its position in `records`.

#[derive(Debug, Clone, Default)]
pub struct SeqCollection {
    records: Vec<SeqRecord>,
    index: HashMap<String, usize>,
}

impl SeqCollection {
    pub fn new() -> Self {
        SeqCollection::default()
    }

    pub fn from_records(records: Vec<SeqRecord>) -> Result<Self, PhyloError> {
        let mut collection = SeqCollection::new();
        for record in records {
            collection.push(record)?;
        }
        Ok(collection)
    }

    pub fn from_vecs(headers: Vec<String>, sequences: Vec<String>) -> Result<Self, PhyloError> {
        if headers.len() != sequences.len() {
            return Err(PhyloError::Format(format!(
                "{} headers but {} sequences",
                headers.len(),
                sequences.len()
            )));
        }
        let records = headers
            .into_iter()
            .zip(sequences)
            .map(|(header, sequence)| SeqRecord { header, sequence })
            .collect();
        SeqCollection::from_records(records)
    }

    /// Appends a record, refusing identifiers already present, multi-line headers and sequence
    /// symbols other than letters, gaps and stops. Whitespace inside the sequence is dropped.
    pub fn push(&mut self, mut record: SeqRecord) -> Result<(), PhyloError> {
        let id = record.id().to_string();
        if id.is_empty() {
            return Err(PhyloError::Format(format!(
                "Empty identifier (record #{})",
                self.records.len() + 1
            )));
        }
        if self.index.contains_key(&id) {
            return Err(PhyloError::Format(format!("Duplicate identifier '{}'", id)));
        }
        if record.header.contains(['\n', '\r']) {
            return Err(PhyloError::Format(format!(
                "Line break in header of '{}'",
                id
            )));
        }
        record.sequence = clean_sequence(&record.sequence, &id)?;
        self.index.insert(id, self.records.len());
        self.records.push(record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&SeqRecord> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    pub fn records(&self) -> &[SeqRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SeqRecord> {
        self.records.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.id()).collect()
    }

    /// True IFF all sequences have the same length (vacuously true when empty).
    pub fn is_aligned(&self) -> bool {
        let mut iter = self.records.iter();
        let Some(first) = iter.next() else {
            return true;
        };
        let first_len = first.sequence.len();
        iter.all(|rec| rec.sequence.len() == first_len)
    }

    /// Keeps only the records whose header matches `re`, in their original order.
    pub fn select(&self, re: &Regex) -> SeqCollection {
        let mut result = SeqCollection::new();
        for record in self.records.iter().filter(|r| re.is_match(&r.header)) {
            // ids are already unique here
            result.index.insert(record.id().to_string(), result.records.len());
            result.records.push(record.clone());
        }
        result
    }
}

impl IntoIterator for SeqCollection {
    type Item = SeqRecord;
    type IntoIter = std::vec::IntoIter<SeqRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a SeqCollection {
    type Item = &'a SeqRecord;
    type IntoIter = std::slice::Iter<'a, SeqRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
