// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier
// Modifications (c) 2026 Peter Carlton

use phylolab::errors::PhyloError;

fn main() -> Result<(), PhyloError> {
    phylolab::run()
}
