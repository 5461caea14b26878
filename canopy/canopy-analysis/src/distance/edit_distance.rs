//! Exact ordered tree edit distance (Zhang–Shasha).
//!
//! Unit costs: inserting or deleting a node costs 1, relabelling costs 1
//! unless the labels are equal. The result is a metric over label-isomorphism
//! classes. Time is `O(|A| |B| min(depth, leaves)(A) min(depth, leaves)(B))`
//! and memory `O(|A| |B|)`, so this is meant for small candidate sets.

use crate::tree::{TreeNode, children, label};
use canopy_core::ast::GeneralAst;
use std::collections::HashMap;

const INSERT_COST: usize = 1;
const DELETE_COST: usize = 1;

fn update_cost(a: &str, b: &str) -> usize {
    if a == b { 0 } else { 1 }
}

/// A tree flattened into post-order with the tables Zhang–Shasha needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostorderTree {
    labels: Vec<String>,
    /// Post-order index of the leftmost leaf descendant of each node
    leftmost: Vec<usize>,
    /// Root plus every node that has a left sibling, ascending
    keyroots: Vec<usize>,
}

impl PostorderTree {
    pub fn build<N, C, L>(root: &N, children: C, label: L) -> Self
    where
        C: Fn(&N) -> Vec<N>,
        L: Fn(&N) -> String,
    {
        let mut tree = Self {
            labels: Vec::new(),
            leftmost: Vec::new(),
            keyroots: Vec::new(),
        };
        tree.visit(root, &children, &label);

        let mut last_with_leftmost: HashMap<usize, usize> = HashMap::new();
        for (index, &leftmost) in tree.leftmost.iter().enumerate() {
            last_with_leftmost.insert(leftmost, index);
        }
        tree.keyroots = last_with_leftmost.into_values().collect();
        tree.keyroots.sort_unstable();
        tree
    }

    pub fn from_ast(ast: &GeneralAst) -> Self {
        Self::build(&TreeNode::Ast(ast), children, label)
    }

    fn visit<N, C, L>(&mut self, node: &N, children: &C, label: &L) -> usize
    where
        C: Fn(&N) -> Vec<N>,
        L: Fn(&N) -> String,
    {
        let mut first_leaf = None;
        for child in children(node) {
            let child_index = self.visit(&child, children, label);
            first_leaf.get_or_insert(self.leftmost[child_index]);
        }

        let index = self.labels.len();
        self.labels.push(label(node));
        self.leftmost.push(first_leaf.unwrap_or(index));
        index
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Edit distance to `other`
    pub fn distance(&self, other: &Self) -> usize {
        let (n, m) = (self.len(), other.len());
        if n == 0 || m == 0 {
            return n * DELETE_COST + m * INSERT_COST;
        }

        // td[x * m + y]: distance between the subtrees rooted at x and y
        let mut td = vec![0usize; n * m];
        // fd[di * w + dj]: forest distance scratch buffer, reused per keyroot pair
        let w = m + 1;
        let mut fd = vec![0usize; (n + 1) * w];

        for &i in &self.keyroots {
            for &j in &other.keyroots {
                let li = self.leftmost[i];
                let lj = other.leftmost[j];
                let rows = i - li + 2;
                let cols = j - lj + 2;

                fd[0] = 0;
                for di in 1..rows {
                    fd[di * w] = fd[(di - 1) * w] + DELETE_COST;
                }
                for dj in 1..cols {
                    fd[dj] = fd[dj - 1] + INSERT_COST;
                }

                for di in 1..rows {
                    let x = li + di - 1;
                    for dj in 1..cols {
                        let y = lj + dj - 1;
                        let delete = fd[(di - 1) * w + dj] + DELETE_COST;
                        let insert = fd[di * w + dj - 1] + INSERT_COST;

                        if self.leftmost[x] == li && other.leftmost[y] == lj {
                            let relabel = fd[(di - 1) * w + dj - 1]
                                + update_cost(&self.labels[x], &other.labels[y]);
                            let best = delete.min(insert).min(relabel);
                            fd[di * w + dj] = best;
                            td[x * m + y] = best;
                        } else {
                            let p = self.leftmost[x] - li;
                            let q = other.leftmost[y] - lj;
                            let subtree = fd[p * w + q] + td[x * m + y];
                            fd[di * w + dj] = delete.min(insert).min(subtree);
                        }
                    }
                }
            }
        }

        td[(n - 1) * m + (m - 1)]
    }
}

/// Edit distance between two trees given by `children` / `label`
pub fn tree_edit_distance<N, C, L>(a: &N, b: &N, children: C, label: L) -> usize
where
    C: Fn(&N) -> Vec<N>,
    L: Fn(&N) -> String,
{
    PostorderTree::build(a, &children, &label).distance(&PostorderTree::build(b, &children, &label))
}

/// Edit distance between two programs
pub fn ast_edit_distance(a: &GeneralAst, b: &GeneralAst) -> usize {
    PostorderTree::from_ast(a).distance(&PostorderTree::from_ast(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Node {
        label: &'static str,
        children: Vec<Node>,
    }

    fn n(label: &'static str, children: Vec<Node>) -> Node {
        Node { label, children }
    }

    fn node_children<'a>(node: &&'a Node) -> Vec<&'a Node> {
        node.children.iter().collect()
    }

    fn node_label(node: &&Node) -> String {
        node.label.to_string()
    }

    fn leaf(label: &'static str) -> Node {
        n(label, vec![])
    }

    fn ted(a: &Node, b: &Node) -> usize {
        tree_edit_distance(&a, &b, node_children, node_label)
    }

    #[test]
    fn test_identity() {
        let t = n("f", vec![n("d", vec![leaf("a"), n("c", vec![leaf("b")])]), leaf("e")]);
        assert_eq!(ted(&t, &t.clone()), 0);
    }

    #[test]
    fn test_classic_example() {
        // f(d(a, c(b)), e)  vs  f(c(d(a, b)), e)
        let a = n("f", vec![n("d", vec![leaf("a"), n("c", vec![leaf("b")])]), leaf("e")]);
        let b = n("f", vec![n("c", vec![n("d", vec![leaf("a"), leaf("b")])]), leaf("e")]);
        assert_eq!(ted(&a, &b), 2);
        assert_eq!(ted(&b, &a), 2);
    }

    #[test]
    fn test_single_operations() {
        let base = n("a", vec![leaf("b"), leaf("c")]);

        assert_eq!(ted(&base, &n("a", vec![leaf("b"), leaf("x")])), 1);
        assert_eq!(ted(&base, &n("a", vec![leaf("b")])), 1);
        assert_eq!(ted(&base, &n("a", vec![leaf("b"), leaf("c"), leaf("d")])), 1);
        assert_eq!(ted(&leaf("a"), &leaf("b")), 1);
    }

    #[test]
    fn test_deleting_inner_node_promotes_children() {
        let a = n("r", vec![n("g", vec![leaf("x"), leaf("y")])]);
        let b = n("r", vec![leaf("x"), leaf("y")]);
        assert_eq!(ted(&a, &b), 1);
    }

    #[test]
    fn test_completely_different_trees() {
        let a = n("a", vec![leaf("b"), leaf("c")]);
        let b = leaf("z");
        // relabel the root, delete both leaves
        assert_eq!(ted(&a, &b), 3);
    }

    #[test]
    fn test_keyroots() {
        let t = PostorderTree::build(
            &&n("f", vec![n("d", vec![leaf("a"), n("c", vec![leaf("b")])]), leaf("e")]),
            node_children,
            node_label,
        );
        // post-order: a b c d e f
        assert_eq!(t.len(), 6);
        assert_eq!(t.keyroots, vec![2, 4, 5]);
    }
}
