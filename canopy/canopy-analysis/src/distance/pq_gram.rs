//! Approximate tree distance from pq-gram profiles.
//!
//! A pq-gram of a node is the label tuple made of `p` ancestor labels (the
//! node itself last) followed by `q` consecutive child labels, padded with a
//! null label where a node has fewer ancestors or children. A tree's profile
//! is the multiset of all its pq-grams; building it is linear in tree size.
//!
//! The distance between two profiles is their bag symmetric difference over
//! their bag union:
//!
//! ```text
//! d(P1, P2) = (|P1| + |P2| - 2 |P1 ∩ P2|) / (|P1| + |P2|)
//! ```
//!
//! which lies in `[0, 1]` and is 0 for label-identical isomorphic trees.

use crate::tree::{TreeNode, children, label};
use canopy_core::ast::GeneralAst;
use canopy_core::config::DistanceConfig;
use std::collections::HashMap;

/// A label tuple; `None` is the null padding label
pub type PqGram = Vec<Option<String>>;

/// Shape of a pq-gram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PqGramConfig {
    /// Ancestor labels per gram
    pub p: usize,
    /// Sibling labels per gram
    pub q: usize,
}

impl Default for PqGramConfig {
    fn default() -> Self {
        Self { p: 2, q: 3 }
    }
}

impl From<&DistanceConfig> for PqGramConfig {
    fn from(config: &DistanceConfig) -> Self {
        Self {
            p: config.pq_gram_p.max(1),
            q: config.pq_gram_q.max(1),
        }
    }
}

/// Shift a fixed-width register left and append `value`
fn shift(register: &mut Vec<Option<String>>, value: Option<String>) {
    if !register.is_empty() {
        register.remove(0);
    }
    register.push(value);
}

/// Multiset of pq-grams of one tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PqGramProfile {
    grams: HashMap<PqGram, usize>,
    size: usize,
}

struct ProfileBuilder<'f, N, C, L> {
    children: &'f C,
    label: &'f L,
    config: PqGramConfig,
    profile: PqGramProfile,
    _node: std::marker::PhantomData<N>,
}

impl<N, C, L> ProfileBuilder<'_, N, C, L>
where
    C: Fn(&N) -> Vec<N>,
    L: Fn(&N) -> String,
{
    fn visit(&mut self, node: &N, node_label: String, parent_stem: &[Option<String>]) {
        let mut stem = parent_stem.to_vec();
        shift(&mut stem, Some(node_label));

        let kids = (self.children)(node);
        let mut base: Vec<Option<String>> = vec![None; self.config.q];

        if kids.is_empty() {
            self.insert(&stem, &base);
            return;
        }

        for child in &kids {
            let child_label = (self.label)(child);
            shift(&mut base, Some(child_label.clone()));
            self.insert(&stem, &base);
            self.visit(child, child_label, &stem);
        }

        for _ in 1..self.config.q {
            shift(&mut base, None);
            self.insert(&stem, &base);
        }
    }

    fn insert(&mut self, stem: &[Option<String>], base: &[Option<String>]) {
        let gram: PqGram = stem.iter().chain(base.iter()).cloned().collect();
        *self.profile.grams.entry(gram).or_insert(0) += 1;
        self.profile.size += 1;
    }
}

impl PqGramProfile {
    /// Build the profile of the tree rooted at `root`
    pub fn build<N, C, L>(root: &N, children: C, label: L, config: PqGramConfig) -> Self
    where
        C: Fn(&N) -> Vec<N>,
        L: Fn(&N) -> String,
    {
        let config = PqGramConfig {
            p: config.p.max(1),
            q: config.q.max(1),
        };
        let root_label = label(root);
        let mut builder = ProfileBuilder {
            children: &children,
            label: &label,
            config,
            profile: PqGramProfile::default(),
            _node: std::marker::PhantomData,
        };
        builder.visit(root, root_label, &vec![None; config.p]);
        builder.profile
    }

    pub fn from_ast(ast: &GeneralAst, config: PqGramConfig) -> Self {
        Self::build(&TreeNode::Ast(ast), children, label, config)
    }

    /// Total number of grams, counting duplicates
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of occurrences of `gram`
    pub fn count(&self, gram: &[Option<String>]) -> usize {
        self.grams.get(gram).copied().unwrap_or(0)
    }

    /// Size of the bag intersection
    pub fn intersection_size(&self, other: &Self) -> usize {
        let (small, large) = if self.grams.len() <= other.grams.len() {
            (self, other)
        } else {
            (other, self)
        };
        small
            .grams
            .iter()
            .map(|(gram, &count)| count.min(large.grams.get(gram).copied().unwrap_or(0)))
            .sum()
    }

    /// Normalized distance in `[0, 1]`
    pub fn distance(&self, other: &Self) -> f64 {
        let union = self.size + other.size;
        if union == 0 {
            return 0.0;
        }
        let shared = self.intersection_size(other);
        (union - 2 * shared) as f64 / union as f64
    }
}

/// pq-gram distance between two programs
pub fn pq_gram_distance(a: &GeneralAst, b: &GeneralAst, config: PqGramConfig) -> f64 {
    PqGramProfile::from_ast(a, config).distance(&PqGramProfile::from_ast(b, config))
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

    fn profile(root: &Node, config: PqGramConfig) -> PqGramProfile {
        PqGramProfile::build(
            &root,
            node_children,
            node_label,
            config,
        )
    }

    fn gram(labels: &[Option<&str>]) -> PqGram {
        labels.iter().map(|l| l.map(str::to_string)).collect()
    }

    #[test]
    fn test_single_node_profile() {
        let p = profile(&n("a", vec![]), PqGramConfig::default());
        assert_eq!(p.len(), 1);
        assert_eq!(p.count(&gram(&[None, Some("a"), None, None, None])), 1);
    }

    #[test]
    fn test_profile_of_small_tree() {
        // a(b, c) with p=2, q=3: root contributes children + q-1 = 4 grams,
        // each leaf contributes one.
        let tree = n("a", vec![n("b", vec![]), n("c", vec![])]);
        let p = profile(&tree, PqGramConfig::default());

        assert_eq!(p.len(), 6);
        assert_eq!(p.count(&gram(&[None, Some("a"), None, None, Some("b")])), 1);
        assert_eq!(p.count(&gram(&[None, Some("a"), None, Some("b"), Some("c")])), 1);
        assert_eq!(p.count(&gram(&[None, Some("a"), Some("b"), Some("c"), None])), 1);
        assert_eq!(p.count(&gram(&[None, Some("a"), Some("c"), None, None])), 1);
        assert_eq!(p.count(&gram(&[Some("a"), Some("b"), None, None, None])), 1);
        assert_eq!(p.count(&gram(&[Some("a"), Some("c"), None, None, None])), 1);
    }

    #[test]
    fn test_identical_trees_zero_distance() {
        let tree = n("a", vec![n("b", vec![n("d", vec![])]), n("c", vec![])]);
        let config = PqGramConfig::default();
        assert_eq!(profile(&tree, config).distance(&profile(&tree.clone(), config)), 0.0);
    }

    #[test]
    fn test_relabelled_leaf_increases_distance() {
        let config = PqGramConfig::default();
        let base = n("a", vec![n("b", vec![]), n("c", vec![])]);
        let relabelled = n("a", vec![n("b", vec![]), n("x", vec![])]);

        let d = profile(&base, config).distance(&profile(&relabelled, config));
        assert!(d > 0.0);
        assert!(d <= 1.0);
    }

    #[test]
    fn test_disjoint_labels_distance_one() {
        let config = PqGramConfig::default();
        let a = profile(&n("a", vec![n("b", vec![])]), config);
        let b = profile(&n("x", vec![n("y", vec![])]), config);
        assert_eq!(a.distance(&b), 1.0);
        assert_eq!(a.intersection_size(&b), 0);
    }

    #[test]
    fn test_distance_symmetric() {
        let config = PqGramConfig { p: 1, q: 2 };
        let a = profile(&n("a", vec![n("b", vec![]), n("b", vec![])]), config);
        let b = profile(&n("a", vec![n("b", vec![])]), config);
        assert_eq!(a.distance(&b), b.distance(&a));
    }

    #[test]
    fn test_empty_profiles() {
        assert_eq!(PqGramProfile::default().distance(&PqGramProfile::default()), 0.0);
    }

    #[test]
    fn test_ast_profile() {
        use canopy_core::ast::{Actor, EventListener, Statement};

        let a = GeneralAst::new(vec![Actor::new().with_listener(EventListener::new(
            "start",
            vec![],
            Statement::call("move", vec![]),
        ))]);
        let b = GeneralAst::new(vec![Actor::new().with_listener(EventListener::new(
            "start",
            vec![],
            Statement::call("turn", vec![]),
        ))]);

        let config = PqGramConfig::default();
        assert_eq!(pq_gram_distance(&a, &a.clone(), config), 0.0);
        assert!(pq_gram_distance(&a, &b, config) > 0.0);
    }
}
