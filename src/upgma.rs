// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Peter Carlton

use log::{debug, info};

use crate::distance::DistanceMatrix;
use crate::errors::PhyloError;
use crate::tree::TreeNode;

/// Anything that builds a rooted tree from pairwise distances.
pub trait TreeBuilder {
    fn build(&self, matrix: &DistanceMatrix) -> Result<TreeNode, PhyloError>;
}

/// Unweighted pair-group method with arithmetic mean (average linkage). Produces an
/// ultrametric tree: every leaf is at the same distance from the root.
#[derive(Debug, Default, Clone, Copy)]
pub struct Upgma;

struct Cluster {
    node: TreeNode,
    size: usize,
    height: f64,
}

impl TreeBuilder for Upgma {
    fn build(&self, matrix: &DistanceMatrix) -> Result<TreeNode, PhyloError> {
        if matrix.is_empty() {
            return Err(PhyloError::Format(String::from(
                "Cannot build a tree from an empty distance matrix",
            )));
        }
        info!("Building UPGMA tree for {} taxa", matrix.len());

        let n = matrix.len();
        let mut clusters: Vec<Cluster> = matrix
            .labels()
            .iter()
            .map(|label| Cluster {
                node: TreeNode::leaf(label, None),
                size: 1,
                height: 0.0,
            })
            .collect();
        let mut dist: Vec<Vec<f64>> = (0..n)
            .map(|i| (0..n).map(|j| matrix.get(i, j)).collect())
            .collect();

        while clusters.len() > 1 {
            // Closest pair; ties go to the first pair in row-major order.
            let mut best = (0, 1);
            for i in 0..clusters.len() {
                for j in (i + 1)..clusters.len() {
                    if dist[i][j] < dist[best.0][best.1] {
                        best = (i, j);
                    }
                }
            }
            let (i, j) = best;
            let d_ij = dist[i][j];
            let height = d_ij / 2.0;

            // Size-weighted mean distance to the merged cluster
            let (size_i, size_j) = (clusters[i].size as f64, clusters[j].size as f64);
            let mut merged_row: Vec<f64> = (0..clusters.len())
                .map(|k| (size_i * dist[i][k] + size_j * dist[j][k]) / (size_i + size_j))
                .collect();

            let right = clusters.remove(j);
            let left = clusters.remove(i);
            debug!(
                "Joining {} and {} at height {}",
                describe(&left.node),
                describe(&right.node),
                height
            );
            let mut left_node = left.node;
            let mut right_node = right.node;
            left_node.branch_length = Some(height - left.height);
            right_node.branch_length = Some(height - right.height);
            clusters.insert(
                i,
                Cluster {
                    node: TreeNode::internal(vec![left_node, right_node], None),
                    size: left.size + right.size,
                    height,
                },
            );

            dist.remove(j);
            for row in dist.iter_mut() {
                row.remove(j);
            }
            merged_row.remove(j);
            merged_row[i] = 0.0;
            for (k, &d) in merged_row.iter().enumerate() {
                dist[i][k] = d;
                dist[k][i] = d;
            }
        }

        // Only one cluster is left at this point.
        let root = clusters.remove(0);
        Ok(root.node)
    }
}

fn describe(node: &TreeNode) -> String {
    match &node.name {
        Some(name) => name.clone(),
        None => format!("<{} leaves>", node.num_leaves()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{leaf_names, to_newick};
    use approx::assert_relative_eq;

    fn matrix(labels: &[&str], values: Vec<Vec<f64>>) -> DistanceMatrix {
        DistanceMatrix::new(labels.iter().map(|s| s.to_string()).collect(), values).unwrap()
    }

    #[test]
    fn test_three_taxa() {
        let m = matrix(
            &["A", "B", "C"],
            vec![
                vec![0.0, 0.125, 0.5],
                vec![0.125, 0.0, 0.375],
                vec![0.5, 0.375, 0.0],
            ],
        );
        let tree = Upgma.build(&m).unwrap();
        insta::assert_snapshot!(to_newick(&tree), @"((A:0.0625,B:0.0625):0.15625,C:0.21875);");
    }

    #[test]
    fn test_four_taxa_ultrametric() {
        // Textbook example: ((A,B),(C,D))
        let m = matrix(
            &["A", "B", "C", "D"],
            vec![
                vec![0.0, 2.0, 6.0, 6.0],
                vec![2.0, 0.0, 6.0, 6.0],
                vec![6.0, 6.0, 0.0, 4.0],
                vec![6.0, 6.0, 4.0, 0.0],
            ],
        );
        let tree = Upgma.build(&m).unwrap();
        assert_eq!(leaf_names(&tree), vec!["A", "B", "C", "D"]);
        let ab = &tree.children[0];
        let cd = &tree.children[1];
        assert_eq!(leaf_names(ab), vec!["A", "B"]);
        assert_relative_eq!(ab.children[0].branch_length.unwrap(), 1.0);
        assert_relative_eq!(ab.branch_length.unwrap(), 2.0);
        assert_relative_eq!(cd.children[0].branch_length.unwrap(), 2.0);
        assert_relative_eq!(cd.branch_length.unwrap(), 1.0);
        // Root at height 3 everywhere
        for (parent, leaf) in [(ab, 0), (ab, 1), (cd, 0), (cd, 1)] {
            let total = parent.branch_length.unwrap()
                + parent.children[leaf].branch_length.unwrap();
            assert_relative_eq!(total, 3.0);
        }
    }

    #[test]
    fn test_merged_slot_takes_lower_index() {
        // B and C join first; the pair goes where B was.
        let m = matrix(
            &["A", "B", "C"],
            vec![
                vec![0.0, 4.0, 4.0],
                vec![4.0, 0.0, 2.0],
                vec![4.0, 2.0, 0.0],
            ],
        );
        let tree = Upgma.build(&m).unwrap();
        insta::assert_snapshot!(to_newick(&tree), @"(A:2,(B:1,C:1):1);");
    }

    #[test]
    fn test_single_taxon() {
        let m = matrix(&["A"], vec![vec![0.0]]);
        let tree = Upgma.build(&m).unwrap();
        assert_eq!(tree.name.as_deref(), Some("A"));
    }

    #[test]
    fn test_empty() {
        let m = matrix(&[], Vec::new());
        assert!(Upgma.build(&m).is_err());
    }
}
