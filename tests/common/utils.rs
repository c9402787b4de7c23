// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Peter Carlton

#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
};

use tempfile::TempDir;

use phylolab::seq::collection::SeqCollection;

/// A fresh, empty scratch directory; it is removed when the guard is dropped.
pub fn scratch_dir() -> TempDir {
    tempfile::tempdir().expect("create scratch dir")
}

/// Writes an executable shell script called `name` into `dir`, standing in for an aligner.
#[cfg(unix)]
pub fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("write fake tool");
    let mut perms = fs::metadata(&path).expect("stat fake tool").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod fake tool");
    path
}

pub fn collection(hdrs: &[&str], seqs: &[&str]) -> SeqCollection {
    SeqCollection::from_vecs(
        hdrs.iter().map(|s| s.to_string()).collect(),
        seqs.iter().map(|s| s.to_string()).collect(),
    )
    .expect("unique ids")
}

pub fn pairs(coll: &SeqCollection) -> Vec<(String, String)> {
    coll.iter()
        .map(|r| (r.id().to_string(), r.sequence.clone()))
        .collect()
}
