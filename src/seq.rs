// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier
// Modifications (c) 2026 Peter Carlton

pub mod clustal;
pub mod collection;
pub mod fasta;
pub mod record;
