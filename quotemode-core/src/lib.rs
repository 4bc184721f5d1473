//! Quote-mode core - rule-driven citation markup for XML documents
//!
//! This crate provides the data structures and logic for the quote-mode
//! treatment: loading declarative selector rules, locating matching
//! subtrees, and wrapping guillemet-quoted spans (`«…»`) in marker
//! elements. It is host-agnostic: file storage, notifications, and
//! privileges stay behind the narrow traits in [`host`].

pub mod app;
pub mod engine;
pub mod error;
pub mod host;
pub mod model;
pub mod query;
pub mod rules;
pub mod xml;

pub use app::{Outcome, Treatment};
pub use engine::{apply, normalize_formatting, WrapResult, MARKER_CLASS, WRAPPER_TAG};
pub use error::{Error, Result};
pub use host::{DocumentStore, NotificationKind, NotificationSink, RuleSource};
pub use model::{DocumentTree, NodeId, NodeKind, Rule, RuleSet};
pub use query::{PathQuery, TreeQuery};
pub use rules::load_rules;
