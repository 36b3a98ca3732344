use std::str::FromStr;

use crate::rules::error::RuleError;
use crate::rules::expression::{Condition, ValueExpr};

/// Which entities an effect touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    SelfTarget,
    SingleTarget,
    MultiTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Add,
    Multiply,
    Assign,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Effect {
    pub attribute: String,
    pub scope: Scope,
    pub modifier: Modifier,
    pub value: ValueExpr,
    pub condition: Option<Condition>,
}

impl Effect {
    pub fn new(
        attribute: impl Into<String>,
        scope: Scope,
        modifier: Modifier,
        value: ValueExpr,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            scope,
            modifier,
            value,
            condition: None,
        }
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }
}

/// A named, ordered bundle of effects. Later effects observe earlier ones.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub name: String,
    pub effects: Vec<Effect>,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::SelfTarget => "self",
            Scope::SingleTarget => "st",
            Scope::MultiTarget => "mt",
        }
    }
}

impl FromStr for Scope {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "self" => Ok(Scope::SelfTarget),
            "st" => Ok(Scope::SingleTarget),
            "mt" => Ok(Scope::MultiTarget),
            _ => Err(RuleError::UnsupportedScope(s.to_string())),
        }
    }
}

impl Modifier {
    pub fn as_str(self) -> &'static str {
        match self {
            Modifier::Add => "+",
            Modifier::Multiply => "*",
            Modifier::Assign => "=",
        }
    }
}

impl FromStr for Modifier {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Modifier::Add),
            "*" => Ok(Modifier::Multiply),
            "=" => Ok(Modifier::Assign),
            _ => Err(RuleError::UnsupportedModifier(s.to_string())),
        }
    }
}
