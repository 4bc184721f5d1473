use serde::{Deserialize, Serialize};

/// One selector rule: where to look for quotes, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Opaque path selector, evaluated by the tree-query capability.
    pub xpath: String,
    /// Human-readable description from the rule file.
    #[serde(default)]
    pub desc: String,
}

impl Rule {
    pub fn new(xpath: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            xpath: xpath.into(),
            desc: desc.into(),
        }
    }
}

/// Ordered set of rules, immutable after load. Order is significant:
/// later rules see text already wrapped by earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
