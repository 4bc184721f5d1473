//! Rule-file loader and normalizer.
//!
//! The rule file is a JSON object with a required array-valued `"all"`
//! key; each entry carries an `xpath` selector and a `desc` label.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{Rule, RuleSet};

#[derive(Debug, Deserialize)]
struct RuleFile {
    all: Option<Vec<RawRule>>,
}

#[derive(Debug, Deserialize)]
struct RawRule {
    xpath: Option<String>,
    #[serde(default)]
    desc: String,
}

/// Decode raw rule-file content into an ordered rule set.
///
/// Returns `Ok(None)` when the content decodes but has no `"all"` key:
/// that is an empty configuration, not a failure. Undecodable content and
/// an `"all"` key that is not an array both fail with [`Error::RuleLoad`].
/// Entries without an `xpath` are skipped with a warning, as the
/// production config loader does.
pub fn load_rules(raw: &str) -> Result<Option<RuleSet>> {
    let file: RuleFile =
        serde_json::from_str(raw).map_err(|e| Error::RuleLoad(e.to_string()))?;

    let Some(entries) = file.all else {
        debug!("rule file has no \"all\" key, nothing to apply");
        return Ok(None);
    };

    let mut rules = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry.xpath {
            Some(xpath) => rules.push(Rule::new(xpath, entry.desc)),
            None => warn!(desc = %entry.desc, "skipping rule without xpath"),
        }
    }
    debug!(count = rules.len(), "rules loaded");
    Ok(Some(RuleSet::new(rules)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_rules_success() {
        let raw = r#"{ "all": [{ "desc": "paragraphs", "xpath": "//p" }] }"#;
        let rules = load_rules(raw).unwrap().unwrap();
        assert_eq!(rules.len(), 1);
        let rule = rules.iter().next().unwrap();
        assert_eq!(rule.xpath, "//p");
        assert_eq!(rule.desc, "paragraphs");
    }

    #[test]
    fn test_load_rules_not_json() {
        let err = load_rules("not json at all").unwrap_err();
        assert!(matches!(err, Error::RuleLoad(_)));
    }

    #[test]
    fn test_load_rules_all_not_an_array() {
        let err = load_rules(r#"{ "all": "invalid" }"#).unwrap_err();
        assert!(matches!(err, Error::RuleLoad(_)));
    }

    #[test]
    fn test_load_rules_missing_all_key() {
        let result = load_rules(r#"{ "other": [] }"#).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_load_rules_skips_entry_without_xpath() {
        let raw = r#"{ "all": [{ "desc": "no selector" }, { "xpath": "//p" }] }"#;
        let rules = load_rules(raw).unwrap().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.iter().next().unwrap().desc, "");
    }

    #[test]
    fn test_load_rules_preserves_order() {
        let raw = r#"{ "all": [
            { "desc": "first", "xpath": "//texte" },
            { "desc": "second", "xpath": "//p" }
        ] }"#;
        let rules = load_rules(raw).unwrap().unwrap();
        let xpaths: Vec<_> = rules.iter().map(|r| r.xpath.as_str()).collect();
        assert_eq!(xpaths, vec!["//texte", "//p"]);
    }
}
