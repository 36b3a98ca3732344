//! Failure taxonomy shared by the registry, the evaluator, the execution
//! engine and the event runner.
//!
//! Every failure is local and synchronous; nothing here is retried.

/// Which table a name was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Attribute,
    Action,
    Entity,
    Event,
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TableKind::Attribute => "attribute",
            TableKind::Action => "action",
            TableKind::Entity => "entity",
            TableKind::Event => "event",
        };
        f.write_str(label)
    }
}

/// Errors raised while defining or executing a rule set.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleError {
    /// A definition with this name already exists in its table.
    #[error("{kind} named {name} already exists")]
    DuplicateName { kind: TableKind, name: String },

    /// `remove_*`/`modify_*` on a name that is not present.
    #[error("{kind} named {name} does not exist")]
    NotFound { kind: TableKind, name: String },

    #[error("attribute {attribute} is not defined on {owner}")]
    UnknownAttribute { attribute: String, owner: String },

    #[error("action {0} does not exist")]
    UnknownAction(String),

    #[error("entity {0} does not exist")]
    UnknownEntity(String),

    #[error("event {0} does not exist")]
    UnknownEvent(String),

    #[error("value type {0} is not supported")]
    UnsupportedKind(String),

    #[error("effect type {0} is not supported")]
    UnsupportedScope(String),

    #[error("modifier {0} is not supported")]
    UnsupportedModifier(String),

    #[error("comparison {0} is not supported")]
    UnsupportedComparator(String),

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// An action must carry at least one effect.
    #[error("action {0} has no effects")]
    EmptyAction(String),

    #[error("action {action} requires a target but none was given")]
    MissingTarget { action: String },

    #[error("action {action} is not part of {entity}'s action list")]
    ActionNotOwned { entity: String, action: String },

    #[error("event {0} is already running")]
    EventAlreadyRunning(String),

    /// The script ran out before the end condition was satisfied.
    #[error("event {event} ran out of script after {turns} turns")]
    ScriptExhausted { event: String, turns: usize },

    /// Finished events must be reset before they can run again.
    #[error("event {0} has already finished")]
    EventFinished(String),
}

impl RuleError {
    pub(crate) fn unknown_attribute(attribute: &str, owner: &str) -> Self {
        RuleError::UnknownAttribute {
            attribute: attribute.to_string(),
            owner: owner.to_string(),
        }
    }

    pub(crate) fn duplicate(kind: TableKind, name: &str) -> Self {
        RuleError::DuplicateName {
            kind,
            name: name.to_string(),
        }
    }

    pub(crate) fn not_found(kind: TableKind, name: &str) -> Self {
        RuleError::NotFound {
            kind,
            name: name.to_string(),
        }
    }
}
