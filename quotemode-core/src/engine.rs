//! Quote-wrapping engine.
//!
//! Walks the subtrees matched by each rule's selector and wraps guillemet
//! spans (`«…»`) in marker elements, skipping spans that already exactly
//! fill a wrapper. Traversal uses an explicit work list over arena ids so
//! tree mutation never invalidates the walk.

use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info};

use crate::error::Result;
use crate::model::{DocumentTree, NodeId, NodeKind, RuleSet};
use crate::query::TreeQuery;

/// Tag of the inserted wrapper element.
pub const WRAPPER_TAG: &str = "q";
/// Marker class identifying engine-produced wrappers.
pub const MARKER_CLASS: &str = "containsQuotes";

const FORMATTING_TAGS: [&str; 3] = ["b", "i", "u"];

/// Outcome of one full pass of the rules over a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrapResult {
    /// Number of wrapper elements inserted.
    pub wrapped_count: usize,
}

fn quote_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("«[^«]*?»").expect("quote pattern compiles"))
}

fn nested_quote_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("«[^«]*«.*»[^«]*?»").expect("nested pattern compiles"))
}

fn multiple_quotes_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new("«[^«»]*?»[^«»]*«[^«»]*?»").expect("multiple pattern compiles")
    })
}

fn formatted_quote_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new("«([^«]*)<(b|i|u)>([^«]*)</(b|i|u)>([^«]*)»")
            .expect("formatted pattern compiles")
    })
}

/// Apply the rules to the tree, in order.
///
/// Each rule's selector is evaluated once up front (snapshot semantics):
/// nodes inserted while processing a rule are never added to that rule's
/// iteration. A selector failure aborts the remaining rules; wraps from
/// earlier rules stay in the tree.
pub fn apply(
    tree: &mut DocumentTree,
    rules: &RuleSet,
    query: &dyn TreeQuery,
) -> Result<WrapResult> {
    let mut wrapped_count = 0;
    for rule in rules {
        info!(desc = %rule.desc, xpath = %rule.xpath, "applying rule");
        let nodes = query.evaluate(tree, &rule.xpath)?;
        debug!(matched = nodes.len(), "selector snapshot");
        for node in nodes {
            wrapped_count += deep_check(tree, node);
        }
    }
    Ok(WrapResult { wrapped_count })
}

/// Pre-order walk of `start`'s subtree, running the wrap step on every
/// text node.
fn deep_check(tree: &mut DocumentTree, start: NodeId) -> usize {
    let mut wrapped = 0;
    let mut stack = vec![start];
    while let Some(id) = stack.pop() {
        if tree.is_text(id) {
            wrapped += wrap_step(tree, id);
        } else {
            let children: Vec<NodeId> = tree.children(id).to_vec();
            for &child in children.iter().rev() {
                stack.push(child);
            }
        }
    }
    wrapped
}

/// Wrap the first guillemet span of a text node, then keep scanning past
/// the inserted wrapper while the original run held further spans.
///
/// The redundancy guard skips a span that already exactly fills a wrapper
/// element; a strict sub-span inside a wrapper is still wrapped. When a
/// wrap leaves no trailing text node there is nothing to resume on and
/// scanning stops.
fn wrap_step(tree: &mut DocumentTree, node: NodeId) -> usize {
    let mut wrapped = 0;
    let mut current = node;
    loop {
        let content = match tree.text(current) {
            Some(t) => t.to_string(),
            None => break,
        };
        let spans: Vec<(usize, usize)> = quote_re()
            .find_iter(&content)
            .map(|m| (m.start(), m.end()))
            .collect();
        let Some(&(start, end)) = spans.first() else {
            break;
        };

        let parent_is_wrapper = tree
            .parent(current)
            .and_then(|p| tree.tag(p))
            .map_or(false, |tag| tag == WRAPPER_TAG);
        if parent_is_wrapper && start == 0 && end == content.len() {
            break;
        }

        let before = &content[..start];
        let inside = &content[start..end];
        let after = &content[end..];

        let mut replacement = Vec::with_capacity(3);
        if !before.is_empty() {
            replacement.push(tree.create_text(before));
        }
        let wrapper = tree.create_element(WRAPPER_TAG);
        tree.set_attribute(wrapper, "class", MARKER_CLASS);
        let span_text = tree.create_text(inside);
        tree.append_child(wrapper, span_text);
        replacement.push(wrapper);
        let tail = if after.is_empty() {
            None
        } else {
            let t = tree.create_text(after);
            replacement.push(t);
            Some(t)
        };
        tree.replace_with(current, &replacement);
        wrapped += 1;
        debug!(span = inside, "wrapped quoted span");

        if spans.len() > 1 {
            if let Some(next) = tail {
                current = next;
                continue;
            }
        }
        break;
    }
    wrapped
}

/// Normalize formatting markup around quotes before rule application.
///
/// Paragraph by paragraph: a quote whose span crosses a single `b`/`i`/`u`
/// element is collapsed into one marker wrapper holding the flattened
/// text; otherwise formatting elements that hold exactly one full quote
/// are converted in place to marker wrappers. Paragraphs with nested
/// guillemets are left untouched. Returns the number of wrapper elements
/// inserted, so callers can fold it into the treatment's total.
pub fn normalize_formatting(tree: &mut DocumentTree, query: &dyn TreeQuery) -> Result<usize> {
    let mut inserted = 0;
    let paragraphs = query.evaluate(tree, "//p")?;
    for p in paragraphs {
        let content = inline_markup(tree, p);
        if nested_quote_re().is_match(&content) {
            continue;
        }
        if let Some((before, quote, after)) = collapse_candidate(&content) {
            tree.take_children(p);
            if !before.is_empty() {
                let t = tree.create_text(&before);
                tree.append_child(p, t);
            }
            let wrapper = tree.create_element(WRAPPER_TAG);
            tree.set_attribute(wrapper, "class", MARKER_CLASS);
            let span_text = tree.create_text(&quote);
            tree.append_child(wrapper, span_text);
            tree.append_child(p, wrapper);
            if !after.is_empty() {
                let t = tree.create_text(&after);
                tree.append_child(p, t);
            }
            inserted += 1;
            debug!(span = %quote, "collapsed formatted quote");
        } else {
            inserted += convert_formatting_elements(tree, p);
        }
    }
    Ok(inserted)
}

/// A quote crossing one formatting element, with markup-free
/// surroundings: returns (before, flattened quote, after).
fn collapse_candidate(content: &str) -> Option<(String, String, String)> {
    let caps = formatted_quote_re().captures(content)?;
    if caps[2] != caps[4] {
        return None;
    }
    let full = caps.get(0).expect("group 0 always present");
    let before = &content[..full.start()];
    let after = &content[full.end()..];
    // Only collapse when nothing else in the paragraph carries markup;
    // rebuilding the children would otherwise drop it.
    if [&caps[1], &caps[3], &caps[5], before, after]
        .iter()
        .any(|s| s.contains('<'))
    {
        return None;
    }
    let quote = format!("«{}{}{}»", &caps[1], &caps[3], &caps[5]);
    Some((before.to_string(), quote, after.to_string()))
}

/// Convert `b`/`i`/`u` children that hold exactly one full quote into
/// marker wrappers, keeping their children.
fn convert_formatting_elements(tree: &mut DocumentTree, p: NodeId) -> usize {
    let mut converted = 0;
    let children: Vec<NodeId> = tree.children(p).to_vec();
    for child in children {
        let Some(tag) = tree.tag(child).map(str::to_string) else {
            continue;
        };
        if !FORMATTING_TAGS.contains(&tag.as_str()) {
            continue;
        }
        let text = tree.text_content(child);
        let trimmed = text.trim();
        if trimmed.starts_with('«')
            && trimmed.ends_with('»')
            && !multiple_quotes_re().is_match(trimmed)
        {
            let wrapper = tree.create_element(WRAPPER_TAG);
            tree.set_attribute(wrapper, "class", MARKER_CLASS);
            for grandchild in tree.take_children(child) {
                tree.append_child(wrapper, grandchild);
            }
            tree.replace_with(child, &[wrapper]);
            converted += 1;
            debug!(from = %tag, "converted formatting element to wrapper");
        }
    }
    converted
}

/// Paragraph content with child tags inlined (`text <b>bold</b> text`),
/// attributes omitted.
fn inline_markup(tree: &DocumentTree, id: NodeId) -> String {
    let mut out = String::new();
    for &child in tree.children(id) {
        match tree.kind(child) {
            NodeKind::Text(t) => out.push_str(t),
            NodeKind::Element { tag, .. } => {
                out.push('<');
                out.push_str(tag);
                out.push('>');
                out.push_str(&inline_markup(tree, child));
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
            NodeKind::Document => {}
        }
    }
    out
}
