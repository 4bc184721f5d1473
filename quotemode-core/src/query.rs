//! Tree-query capability.
//!
//! The engine treats selectors as opaque strings and delegates their
//! evaluation, so alternate selector engines can be substituted behind
//! [`TreeQuery`]. [`PathQuery`] is the shipped evaluator and covers the
//! dialect used by the production rule files: child and descendant steps
//! with element name tests or `*`.

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::model::{DocumentTree, NodeId};

/// Evaluates a path expression against a document tree.
pub trait TreeQuery {
    /// Evaluate `xpath` from the document root, returning an ordered
    /// snapshot of matching nodes. The snapshot is computed before any
    /// mutation, so callers can safely mutate while iterating it.
    fn evaluate(&self, tree: &DocumentTree, xpath: &str) -> Result<Vec<NodeId>>;
}

/// Built-in path evaluator for plain child/descendant element paths:
/// `//p`, `/doc/article/texte`, `/doc//p`, `//texte/*`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NameTest {
    Any,
    Name(String),
}

#[derive(Debug)]
struct Step {
    axis: Axis,
    name: NameTest,
}

impl TreeQuery for PathQuery {
    fn evaluate(&self, tree: &DocumentTree, xpath: &str) -> Result<Vec<NodeId>> {
        let steps = parse_steps(xpath)?;
        let mut current = vec![tree.root()];
        for step in &steps {
            let mut next = Vec::new();
            let mut seen = HashSet::new();
            for &ctx in &current {
                match step.axis {
                    Axis::Child => {
                        for &child in tree.children(ctx) {
                            if matches_name(tree, child, &step.name) && seen.insert(child) {
                                next.push(child);
                            }
                        }
                    }
                    Axis::Descendant => {
                        for node in tree.descendants(ctx) {
                            if matches_name(tree, node, &step.name) && seen.insert(node) {
                                next.push(node);
                            }
                        }
                    }
                }
            }
            current = next;
        }
        Ok(current)
    }
}

fn matches_name(tree: &DocumentTree, id: NodeId, name: &NameTest) -> bool {
    match tree.tag(id) {
        Some(tag) => match name {
            NameTest::Any => true,
            NameTest::Name(n) => tag == n,
        },
        None => false,
    }
}

fn parse_steps(xpath: &str) -> Result<Vec<Step>> {
    let malformed = |reason: &str| Error::SelectorEvaluation {
        xpath: xpath.to_string(),
        reason: reason.to_string(),
    };

    let expr = xpath.trim();
    if expr.is_empty() {
        return Err(malformed("empty expression"));
    }

    let mut rest = expr;
    let mut steps = Vec::new();
    while !rest.is_empty() {
        let axis = if let Some(r) = rest.strip_prefix("//") {
            rest = r;
            Axis::Descendant
        } else if let Some(r) = rest.strip_prefix('/') {
            rest = r;
            Axis::Child
        } else if steps.is_empty() {
            // Relative expression: first step from the root context.
            Axis::Child
        } else {
            return Err(malformed("expected `/` between steps"));
        };

        let end = rest.find('/').unwrap_or(rest.len());
        let name = &rest[..end];
        rest = &rest[end..];

        if name.is_empty() {
            return Err(malformed("empty step"));
        }
        let test = if name == "*" {
            NameTest::Any
        } else if name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            NameTest::Name(name.to_string())
        } else {
            return Err(malformed("unsupported step syntax"));
        };
        steps.push(Step { axis, name: test });
    }

    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> DocumentTree {
        // <doc><article><texte><p>one</p><aside><p>two</p></aside></texte></article></doc>
        let mut tree = DocumentTree::new();
        let doc = tree.create_element("doc");
        let article = tree.create_element("article");
        let texte = tree.create_element("texte");
        let p1 = tree.create_element("p");
        let t1 = tree.create_text("one");
        let aside = tree.create_element("aside");
        let p2 = tree.create_element("p");
        let t2 = tree.create_text("two");

        let root = tree.root();
        tree.append_child(root, doc);
        tree.append_child(doc, article);
        tree.append_child(article, texte);
        tree.append_child(texte, p1);
        tree.append_child(p1, t1);
        tree.append_child(texte, aside);
        tree.append_child(aside, p2);
        tree.append_child(p2, t2);
        tree
    }

    #[test]
    fn test_descendant_step_finds_all_depths() {
        let tree = sample_tree();
        let nodes = PathQuery.evaluate(&tree, "//p").unwrap();
        assert_eq!(nodes.len(), 2);
        let texts: Vec<_> = nodes.iter().map(|&n| tree.text_content(n)).collect();
        assert_eq!(texts, vec!["one", "two"]);
    }

    #[test]
    fn test_absolute_child_path() {
        let tree = sample_tree();
        let nodes = PathQuery
            .evaluate(&tree, "/doc/article/texte")
            .unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(tree.tag(nodes[0]), Some("texte"));
    }

    #[test]
    fn test_mixed_descendant_and_child_steps() {
        let tree = sample_tree();
        let nodes = PathQuery.evaluate(&tree, "//texte/p").unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(tree.text_content(nodes[0]), "one");

        let nodes = PathQuery.evaluate(&tree, "/doc//p").unwrap();
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn test_wildcard_step() {
        let tree = sample_tree();
        let nodes = PathQuery.evaluate(&tree, "//texte/*").unwrap();
        let tags: Vec<_> = nodes.iter().filter_map(|&n| tree.tag(n)).collect();
        assert_eq!(tags, vec!["p", "aside"]);
    }

    #[test]
    fn test_no_match_returns_empty_snapshot() {
        let tree = sample_tree();
        let nodes = PathQuery.evaluate(&tree, "//figure").unwrap();
        assert!(nodes.is_empty());
    }

    #[test]
    fn test_malformed_expressions_fail() {
        let tree = sample_tree();
        for expr in ["", "  ", "/", "//p[1]", "//p/@class", "//p//"] {
            let err = PathQuery.evaluate(&tree, expr).unwrap_err();
            assert!(
                matches!(err, Error::SelectorEvaluation { .. }),
                "expected failure for {expr:?}"
            );
        }
    }
}
