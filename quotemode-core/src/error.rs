//! Error taxonomy for the quote-mode treatment.

use thiserror::Error;

/// Result alias used throughout the core.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures the treatment can hit.
///
/// A missing `"all"` key in the rule file is not represented here: it is a
/// legitimate empty-configuration state and the loader reports it as
/// `Ok(None)`.
#[derive(Debug, Error)]
pub enum Error {
    /// The raw rule content could not be decoded into a rule list. Read
    /// failures from the rule source are reported the same way.
    #[error("invalid rule file: {0}")]
    RuleLoad(String),

    /// A rule selector is malformed or its evaluation failed. Aborts the
    /// remaining rules of the pass.
    #[error("selector evaluation failed for `{xpath}`: {reason}")]
    SelectorEvaluation { xpath: String, reason: String },

    /// The document content is not well-formed XML.
    #[error("malformed XML document: {0}")]
    XmlParse(String),

    /// The mutated tree could not be serialized back to text.
    #[error("XML serialization failed: {0}")]
    Serialization(String),

    /// The serialized document could not be written back to the store.
    #[error("document write-back failed")]
    WriteBack(#[source] std::io::Error),
}
