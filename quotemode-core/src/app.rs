//! The quote-mode treatment: one complete, synchronous run.
//!
//! Wires the host collaborators together and owns the outermost error
//! boundary: every failure is converted into a user notification here and
//! nothing propagates out of [`Treatment::run`].

use tracing::{error, info};

use crate::engine;
use crate::error::{Error, Result};
use crate::host::{DocumentStore, NotificationKind, NotificationSink, RuleSource};
use crate::model::{DocumentTree, RuleSet};
use crate::query::TreeQuery;
use crate::rules::load_rules;
use crate::xml;

const MSG_RULES_READ_ERROR: &str =
    "Une erreur est survenue lors de la lecture des règles d'application du mode citation";
const MSG_NO_RULES: &str = "Aucune règle d'application du mode citation n'est disponible";
const MSG_NO_TEXT_BLOCK: &str = "Aucun bloc de texte n'a été trouvé.";
const MSG_INTERNAL_ERROR: &str =
    "Une erreur interne est survenue lors de l'application du mode citation";
const MSG_NOTHING_TO_DO: &str = "Aucune citation à modifier";

/// How a treatment run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Quotes were wrapped and the document was written back.
    Applied(usize),
    /// The document had nothing to wrap; it was left untouched.
    NothingToDo,
    /// The rule file holds no rule list; nothing was done.
    NoRules,
    /// A failure was reported to the notification sink.
    Failed,
}

/// One rule-load-and-apply operation over one document.
pub struct Treatment<'a> {
    rules: &'a dyn RuleSource,
    store: &'a dyn DocumentStore,
    notifier: &'a dyn NotificationSink,
    query: &'a dyn TreeQuery,
}

impl<'a> Treatment<'a> {
    pub fn new(
        rules: &'a dyn RuleSource,
        store: &'a dyn DocumentStore,
        notifier: &'a dyn NotificationSink,
        query: &'a dyn TreeQuery,
    ) -> Self {
        Self {
            rules,
            store,
            notifier,
            query,
        }
    }

    /// Run the treatment to completion. Never panics or returns an error:
    /// failures become error notifications and [`Outcome::Failed`].
    pub fn run(&self) -> Outcome {
        let raw = match self.rules.read() {
            Ok(raw) => raw,
            Err(e) => return self.fail(MSG_RULES_READ_ERROR, &e, 5000),
        };
        let rules = match load_rules(&raw) {
            Ok(Some(rules)) => rules,
            Ok(None) => {
                info!("no rules available, stopping cleanly");
                self.notifier
                    .notify(NotificationKind::Info, MSG_NO_RULES, "", 5000);
                return Outcome::NoRules;
            }
            Err(e) => return self.fail(MSG_RULES_READ_ERROR, &e, 5000),
        };

        let content = match self.store.load() {
            Ok(content) => content,
            Err(e) => return self.fail(MSG_NO_TEXT_BLOCK, &e, 3000),
        };
        let mut tree = match xml::parse(&content) {
            Ok(tree) => tree,
            Err(e) => return self.fail(MSG_INTERNAL_ERROR, &e, 4000),
        };

        let wrapped = match self.apply_rules(&mut tree, &rules) {
            Ok(wrapped) => wrapped,
            Err(e) => return self.fail(MSG_INTERNAL_ERROR, &e, 4000),
        };

        if wrapped == 0 {
            info!("no quotes to wrap");
            self.notifier
                .notify(NotificationKind::Success, MSG_NOTHING_TO_DO, "", 3000);
            return Outcome::NothingToDo;
        }

        // A failure past this point loses the in-memory wraps: the
        // document is only ever persisted fully treated.
        let serialized = match xml::serialize(&tree) {
            Ok(s) => s,
            Err(e) => return self.fail(MSG_INTERNAL_ERROR, &e, 4000),
        };
        if let Err(e) = self.store.store(&serialized) {
            return self.fail(MSG_INTERNAL_ERROR, &Error::WriteBack(e), 4000);
        }

        info!(wrapped, "quote mode applied");
        self.notifier.notify(
            NotificationKind::Success,
            &format!("le mode citation a été appliqué {wrapped} fois."),
            "",
            3000,
        );
        Outcome::Applied(wrapped)
    }

    /// Formatting pre-pass, then two rule passes with a text-node merge in
    /// between: the merge re-joins runs split across sibling text nodes so
    /// the second pass can catch quotes the first one could not see. The
    /// redundancy guard keeps the second pass from re-wrapping.
    fn apply_rules(&self, tree: &mut DocumentTree, rules: &RuleSet) -> Result<usize> {
        let converted = engine::normalize_formatting(tree, self.query)?;
        let first = engine::apply(tree, rules, self.query)?;
        tree.normalize();
        let second = engine::apply(tree, rules, self.query)?;
        Ok(converted + first.wrapped_count + second.wrapped_count)
    }

    fn fail(&self, message: &str, cause: &dyn std::fmt::Display, duration_ms: u32) -> Outcome {
        error!(error = %cause, "treatment failed");
        self.notifier.notify(
            NotificationKind::Error,
            message,
            &cause.to_string(),
            duration_ms,
        );
        Outcome::Failed
    }
}
