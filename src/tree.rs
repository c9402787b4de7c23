// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Peter Carlton
// Modifications (c) 2026 Peter Carlton

//! Rooted trees: Newick reading and writing, and box-drawing rendering for the terminal.
//!
//! Unquoted numeric labels on internal nodes are taken to be support values (e.g. bootstrap
//! percentages), as most tree-building programs write them. A quoted label is always a name.
//!
//! Nesting is limited to [`MAX_NEWICK_DEPTH`] levels of parentheses.

use std::path::Path;

use itertools::Itertools;
use log::debug;

use crate::errors::PhyloError;

pub const MAX_NEWICK_DEPTH: usize = 512;

#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub name: Option<String>,
    pub branch_length: Option<f64>,
    pub support: Option<f64>,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn leaf(name: &str, branch_length: Option<f64>) -> Self {
        TreeNode {
            name: Some(name.to_string()),
            branch_length,
            support: None,
            children: Vec::new(),
        }
    }

    pub fn internal(children: Vec<TreeNode>, branch_length: Option<f64>) -> Self {
        TreeNode {
            name: None,
            branch_length,
            support: None,
            children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn num_leaves(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.children.iter().map(TreeNode::num_leaves).sum()
        }
    }

    fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.depth() + 1)
            .max()
            .unwrap_or(0)
    }
}

pub fn parse_newick(input: &str) -> Result<TreeNode, PhyloError> {
    let mut parser = Parser::new(input);
    let node = parser.parse_node()?;
    parser.skip_whitespace();
    if parser.peek() == Some(';') {
        parser.pos += 1;
    }
    parser.skip_whitespace();
    if parser.peek().is_some() {
        return Err(PhyloError::Format(format!(
            "Trailing characters after Newick tree (position {})",
            parser.pos
        )));
    }
    debug!("Parsed Newick tree with {} leaves", node.num_leaves());
    Ok(node)
}

pub fn read_newick_file<P: AsRef<Path>>(path: P) -> Result<TreeNode, PhyloError> {
    let text = std::fs::read_to_string(path)?;
    parse_newick(&text)
}

pub fn write_newick_file<P: AsRef<Path>>(tree: &TreeNode, path: P) -> Result<(), PhyloError> {
    std::fs::write(path, format!("{}\n", to_newick(tree)))?;
    Ok(())
}

/// Newick text for `tree`, terminated by ';'.
pub fn to_newick(tree: &TreeNode) -> String {
    let mut out = String::new();
    write_node(tree, &mut out);
    out.push(';');
    out
}

fn write_node(node: &TreeNode, out: &mut String) {
    if !node.is_leaf() {
        out.push('(');
        for (i, child) in node.children.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            write_node(child, out);
        }
        out.push(')');
    }
    match (node.support, &node.name) {
        (Some(support), _) if !node.is_leaf() => out.push_str(&support.to_string()),
        // a bare number here would come back as a support value
        (_, Some(name)) if !node.is_leaf() && name.parse::<f64>().is_ok() => {
            out.push_str(&format!("'{}'", name))
        }
        (_, Some(name)) => out.push_str(&quote_label(name)),
        _ => {}
    }
    if let Some(length) = node.branch_length {
        out.push(':');
        out.push_str(&length.to_string());
    }
}

fn needs_quotes(label: &str) -> bool {
    label.is_empty()
        || label
            .chars()
            .any(|c| c.is_whitespace() || "()[]':;,".contains(c))
}

fn quote_label(label: &str) -> String {
    if needs_quotes(label) {
        format!("'{}'", label.replace('\'', "''"))
    } else {
        label.to_string()
    }
}

pub fn leaf_names(root: &TreeNode) -> Vec<String> {
    fn walk(node: &TreeNode, out: &mut Vec<String>) {
        if node.is_leaf() {
            out.push(node.name.clone().unwrap_or_default());
        }
        for child in &node.children {
            walk(child, out);
        }
    }
    let mut names = Vec::new();
    walk(root, &mut names);
    names
}

/// Box-drawing lines (one per leaf, top to bottom) and the corresponding leaf names.
pub fn tree_lines_and_order(root: &TreeNode) -> Result<(Vec<String>, Vec<String>), PhyloError> {
    let root = collapse_unary(root.clone());
    let order = leaf_names(&root);
    if order.iter().any(|name| name.is_empty()) {
        return Err(PhyloError::Format(String::from("Missing leaf name")));
    }
    Ok((render_box_tree(&root), order))
}

/// Rendered tree with each leaf's name at the end of its line.
pub fn render_tree(root: &TreeNode) -> Result<Vec<String>, PhyloError> {
    let (lines, order) = tree_lines_and_order(root)?;
    Ok(lines
        .into_iter()
        .zip(order)
        .map(|(line, name)| format!("{} {}", line, name))
        .collect())
}

// Nodes with a single child are replaced by that child; branch lengths add up.
fn collapse_unary(mut node: TreeNode) -> TreeNode {
    while node.children.len() == 1 {
        let mut child = node.children.remove(0);
        if node.name.is_some() && child.name.is_none() {
            child.name = node.name.take();
        }
        child.branch_length = match (node.branch_length, child.branch_length) {
            (Some(a), Some(b)) => Some(a + b),
            (a, b) => a.or(b),
        };
        node = child;
    }
    if !node.children.is_empty() {
        node.children = node.children.into_iter().map(collapse_unary).collect();
    }
    node
}

// Each node at depth d sits at column 2d, with its connector one column to the right.
fn render_box_tree(root: &TreeNode) -> Vec<String> {
    let n_rows = root.num_leaves();
    let tree_width = root.depth() * 2 + 1;
    let mut grid: Vec<Vec<char>> = vec![vec![' '; tree_width]; n_rows];

    fn put(grid: &mut [Vec<char>], y: usize, x: usize, ch: char) {
        if y < grid.len() && x < grid[y].len() {
            grid[y][x] = ch;
        }
    }

    // Returns the row of `node`.
    fn draw(node: &TreeNode, depth: usize, next_row: &mut usize, grid: &mut [Vec<char>]) -> usize {
        if node.is_leaf() {
            let y = *next_row;
            *next_row += 1;
            return y;
        }
        let kid_rows: Vec<usize> = node
            .children
            .iter()
            .map(|kid| draw(kid, depth + 1, next_row, grid))
            .collect();
        let y_top = kid_rows.iter().copied().min().unwrap_or(0);
        let y_bottom = kid_rows.iter().copied().max().unwrap_or(0);
        let x_conn = depth * 2 + 1;

        for y in (y_top + 1)..y_bottom {
            put(grid, y, x_conn, '│');
        }
        for &y in &kid_rows {
            let jch = if y == y_top && y != y_bottom {
                '┌'
            } else if y == y_bottom && y != y_top {
                '└'
            } else {
                '├'
            };
            put(grid, y, x_conn, jch);
            put(grid, y, x_conn + 1, '─');
        }
        (y_top + y_bottom) / 2
    }

    let mut next_row = 0;
    draw(root, 0, &mut next_row, &mut grid);

    // Leaves: extend to the right edge
    for row in &mut grid {
        let start = row
            .iter()
            .rposition(|&c| c != ' ')
            .map(|l| l + 1)
            .unwrap_or(0);
        for cell in row.iter_mut().skip(start) {
            *cell = '─';
        }
    }

    // Junctions entered from the left
    for row in &mut grid {
        for x in 1..row.len() {
            if row[x - 1] == '─' {
                row[x] = match row[x] {
                    '│' => '┤',
                    '┌' => '┬',
                    '└' => '┴',
                    '├' => '┼',
                    other => other,
                };
            }
        }
    }

    grid.into_iter()
        .map(|row| row.into_iter().collect::<String>().trim_end().to_string())
        .collect()
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

// A label as read, and whether it was quoted.
struct Label {
    text: String,
    quoted: bool,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn error(&self, msg: &str) -> PhyloError {
        PhyloError::Format(format!("Malformed Newick tree: {} (position {})", msg, self.pos))
    }

    // Also skips [bracketed comments].
    fn skip_whitespace(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => self.pos += 1,
                Some('[') => {
                    while let Some(c) = self.peek() {
                        self.pos += 1;
                        if c == ']' {
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn parse_node(&mut self) -> Result<TreeNode, PhyloError> {
        self.skip_whitespace();
        if self.peek() == Some('(') {
            if self.depth == MAX_NEWICK_DEPTH {
                return Err(self.error(&format!(
                    "nesting deeper than {} levels",
                    MAX_NEWICK_DEPTH
                )));
            }
            self.pos += 1;
            self.depth += 1;
            let mut children = Vec::new();
            loop {
                let child = self.parse_node()?;
                children.push(child);
                self.skip_whitespace();
                match self.peek() {
                    Some(',') => {
                        self.pos += 1;
                    }
                    Some(')') => {
                        self.pos += 1;
                        break;
                    }
                    _ => return Err(self.error("expected ',' or ')'")),
                }
            }
            self.depth -= 1;
            let label = self.parse_label_opt()?;
            let branch_length = self.parse_branch_length()?;
            // An unquoted numeric label on an internal node is a support value.
            let (name, support) = match label {
                Some(l) if l.quoted => (Some(l.text), None),
                Some(l) => match l.text.parse::<f64>() {
                    Ok(v) => (None, Some(v)),
                    Err(_) => (Some(l.text), None),
                },
                None => (None, None),
            };
            Ok(TreeNode {
                name,
                branch_length,
                support,
                children,
            })
        } else {
            let name = self
                .parse_label_opt()?
                .ok_or_else(|| self.error("missing node name"))?
                .text;
            let branch_length = self.parse_branch_length()?;
            Ok(TreeNode {
                name: Some(name),
                branch_length,
                support: None,
                children: Vec::new(),
            })
        }
    }

    fn parse_label_opt(&mut self) -> Result<Option<Label>, PhyloError> {
        self.skip_whitespace();
        match self.peek() {
            Some(':' | ',' | ')' | ';' | '(') | None => Ok(None),
            Some('\'') => Ok(Some(Label {
                text: self.parse_quoted()?,
                quoted: true,
            })),
            _ => {
                let start = self.pos;
                while let Some(c) = self.peek() {
                    if matches!(c, ':' | ',' | ')' | '(' | ';' | '[') || c.is_whitespace() {
                        break;
                    }
                    self.pos += 1;
                }
                Ok(Some(Label {
                    text: self.chars[start..self.pos].iter().collect(),
                    quoted: false,
                }))
            }
        }
    }

    fn parse_quoted(&mut self) -> Result<String, PhyloError> {
        self.pos += 1;
        let mut label = String::new();
        loop {
            match self.peek() {
                Some('\'') if self.chars.get(self.pos + 1) == Some(&'\'') => {
                    label.push('\'');
                    self.pos += 2;
                }
                Some('\'') => {
                    self.pos += 1;
                    return Ok(label);
                }
                Some(c) => {
                    label.push(c);
                    self.pos += 1;
                }
                None => return Err(self.error("unterminated quoted label")),
            }
        }
    }

    fn parse_branch_length(&mut self) -> Result<Option<f64>, PhyloError> {
        self.skip_whitespace();
        if self.peek() != Some(':') {
            return Ok(None);
        }
        self.pos += 1;
        self.skip_whitespace();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, ',' | ')' | ';' | '[') || c.is_whitespace() {
                break;
            }
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<f64>()
            .map(Some)
            .map_err(|_| self.error(&format!("bad branch length '{}'", text)))
    }
}

/// Comma-separated leaf names, for log messages.
pub fn leaf_summary(root: &TreeNode) -> String {
    leaf_names(root).iter().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_newick_leaf_order() {
        let tree = parse_newick("(A,(B,C));").unwrap();
        let (_lines, order) = tree_lines_and_order(&tree).unwrap();
        assert_eq!(order, vec!["A", "B", "C"]);
    }

    #[test]
    fn parse_newick_lengths_and_support() {
        let tree = parse_newick("((A:0.1,B:0.2)95:0.05,C:0.3);").unwrap();
        let inner = &tree.children[0];
        assert_eq!(inner.support, Some(95.0));
        assert_eq!(inner.name, None);
        assert_eq!(inner.branch_length, Some(0.05));
        assert_eq!(inner.children[1].name.as_deref(), Some("B"));
        assert_eq!(inner.children[1].branch_length, Some(0.2));
        assert_eq!(tree.children[1].branch_length, Some(0.3));
    }

    #[test]
    fn parse_newick_named_internal_and_comments() {
        let tree = parse_newick("((A,B)sarbeco [clade],C)root;\n").unwrap();
        assert_eq!(tree.name.as_deref(), Some("root"));
        assert_eq!(tree.children[0].name.as_deref(), Some("sarbeco"));
        assert_eq!(tree.children[0].support, None);
    }

    #[test]
    fn parse_newick_quoted_labels() {
        let tree = parse_newick("('SARS-CoV-2 (Wuhan)','it''s',bat_RaTG13);").unwrap();
        assert_eq!(
            leaf_names(&tree),
            vec!["SARS-CoV-2 (Wuhan)", "it's", "bat_RaTG13"]
        );
    }

    #[test]
    fn parse_newick_errors() {
        assert!(parse_newick("(A,B").is_err());
        assert!(parse_newick("(A,B);x").is_err());
        assert!(parse_newick("(A:x,B);").is_err());
        assert!(parse_newick("('A,B);").is_err());
        assert!(parse_newick("(A,,B);").is_err());
    }

    #[test]
    fn to_newick_round_trip() {
        let text = "((A:0.0625,B:0.0625)87:0.15625,C:0.21875);";
        let tree = parse_newick(text).unwrap();
        insta::assert_snapshot!(to_newick(&tree), @"((A:0.0625,B:0.0625)87:0.15625,C:0.21875);");
        assert_eq!(parse_newick(&to_newick(&tree)).unwrap(), tree);
    }

    #[test]
    fn numeric_internal_names_stay_names() {
        let mut inner = TreeNode::internal(
            vec![TreeNode::leaf("A", None), TreeNode::leaf("B", None)],
            Some(0.5),
        );
        inner.name = Some(String::from("95"));
        let tree = TreeNode::internal(vec![inner, TreeNode::leaf("C", None)], None);
        insta::assert_snapshot!(to_newick(&tree), @"((A,B)'95':0.5,C);");
        assert_eq!(parse_newick(&to_newick(&tree)).unwrap(), tree);

        let quoted = parse_newick("((A,B)'95',C);").unwrap();
        assert_eq!(quoted.children[0].name.as_deref(), Some("95"));
        assert_eq!(quoted.children[0].support, None);
        // numeric leaf names need no quotes
        let leaves = parse_newick("(1,2);").unwrap();
        assert_eq!(to_newick(&leaves), "(1,2);");
    }

    #[test]
    fn parse_newick_depth_limit() {
        let deep = format!("{}A{};", "(".repeat(5000), ")".repeat(5000));
        assert!(matches!(parse_newick(&deep), Err(PhyloError::Format(_))));

        let ok = format!("{}A{};", "(".repeat(200), ")".repeat(200));
        let tree = parse_newick(&ok).unwrap();
        assert_eq!(leaf_names(&tree), vec!["A"]);

        let at_limit = format!(
            "{}A{};",
            "(".repeat(MAX_NEWICK_DEPTH),
            ")".repeat(MAX_NEWICK_DEPTH)
        );
        assert!(parse_newick(&at_limit).is_ok());
        let over = format!(
            "{}A{};",
            "(".repeat(MAX_NEWICK_DEPTH + 1),
            ")".repeat(MAX_NEWICK_DEPTH + 1)
        );
        assert!(parse_newick(&over).is_err());
    }

    #[test]
    fn to_newick_quotes() {
        let tree = TreeNode::internal(
            vec![
                TreeNode::leaf("SARS-CoV-2 Wuhan", None),
                TreeNode::leaf("it's", Some(1.0)),
            ],
            None,
        );
        insta::assert_snapshot!(to_newick(&tree), @"('SARS-CoV-2 Wuhan','it''s':1);");
    }

    #[test]
    fn render_small_tree() {
        let tree = parse_newick("(A,(B,C));").unwrap();
        let lines = render_tree(&tree).unwrap();
        assert_eq!(lines, vec![" ┌─── A", " └─┬─ B", "   └─ C"]);
    }

    #[test]
    fn render_multifurcation() {
        let tree = parse_newick("((A,B,C,D,E),F);").unwrap();
        let text = render_tree(&tree)
            .unwrap()
            .iter()
            .map(|line| format!("|{}", line))
            .join("\n");
        insta::assert_snapshot!(text, @r"
        |   ┌─ A
        |   ├─ B
        | ┌─┼─ C
        | │ ├─ D
        | │ └─ E
        | └─── F
        ");
    }

    #[test]
    fn render_collapses_unary() {
        let tree = parse_newick("((A:1):2,B:1);").unwrap();
        let collapsed = collapse_unary(tree);
        assert_eq!(collapsed.children[0].name.as_deref(), Some("A"));
        assert_eq!(collapsed.children[0].branch_length, Some(3.0));
    }

    #[test]
    fn render_missing_leaf_name() {
        let tree = TreeNode::internal(
            vec![TreeNode::leaf("A", None), TreeNode::internal(Vec::new(), None)],
            None,
        );
        assert!(tree_lines_and_order(&tree).is_err());
    }

    #[test]
    fn leaf_summary_joins() {
        let tree = parse_newick("(A,(B,C));").unwrap();
        assert_eq!(leaf_summary(&tree), "A, B, C");
    }
}
