pub mod action;
pub mod attributes;
pub mod entity;
pub mod error;
pub mod expression;
pub mod use_action;

pub use action::{Action, Effect, Modifier, Scope};
pub use attributes::{AttributeDef, AttributeValue, Value, ValueKind};
pub use entity::Entity;
pub use error::{RuleError, TableKind};
pub use expression::{
    evaluate_condition, resolve_value, Combine, Comparator, Condition, ConditionOwner,
    FlatChange, FlatSign, Owner, ValueContext, ValueExpr,
};
pub use use_action::{apply_action, can_use, ActionResult, AppliedChange};
