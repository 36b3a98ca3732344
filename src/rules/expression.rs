//! Condition and value-expression evaluation against live entity state.
//!
//! Both entry points are pure: they read entities and never mutate them.

use std::str::FromStr;

use crate::rules::attributes::Value;
use crate::rules::entity::Entity;
use crate::rules::error::RuleError;

/// Whose attribute an attribute-based value reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    User,
    Target,
}

/// Whose attribute a condition inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionOwner {
    SelfOwner,
    Target,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combine {
    Add,
    Multiply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlatSign {
    Plus,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatChange {
    pub sign: FlatSign,
    pub magnitude: f64,
}

impl FlatChange {
    pub fn signed(&self) -> f64 {
        match self.sign {
            FlatSign::Plus => self.magnitude,
            FlatSign::Minus => -self.magnitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValueExpr {
    Literal(Value),
    AttributeBased {
        source_attribute: String,
        owner: Owner,
        combine: Combine,
        operand: f64,
        flat: Option<FlatChange>,
    },
}

impl ValueExpr {
    pub fn literal(value: impl Into<Value>) -> Self {
        ValueExpr::Literal(value.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Comparator {
    pub fn as_str(self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::Ne => "!=",
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
            Comparator::Lt => "<",
            Comparator::Le => "<=",
        }
    }

    pub fn is_ordering(self) -> bool {
        !matches!(self, Comparator::Eq | Comparator::Ne)
    }

    /// Compare `lhs` (the live value) against `rhs` (the declared value).
    /// Equality is exact and defined for every kind; ordering only for numbers.
    pub fn compare(self, lhs: &Value, rhs: &Value) -> Result<bool, RuleError> {
        match self {
            Comparator::Eq => Ok(lhs == rhs),
            Comparator::Ne => Ok(lhs != rhs),
            _ => {
                let (Some(l), Some(r)) = (lhs.as_number(), rhs.as_number()) else {
                    return Err(RuleError::TypeMismatch(format!(
                        "comparison {} is not applicable between {} and {}",
                        self.as_str(),
                        lhs.type_name(),
                        rhs.type_name()
                    )));
                };
                Ok(match self {
                    Comparator::Gt => l > r,
                    Comparator::Ge => l >= r,
                    Comparator::Lt => l < r,
                    _ => l <= r,
                })
            }
        }
    }
}

impl FromStr for Comparator {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" => Ok(Comparator::Eq),
            "!=" => Ok(Comparator::Ne),
            ">" => Ok(Comparator::Gt),
            ">=" => Ok(Comparator::Ge),
            "<" => Ok(Comparator::Lt),
            "<=" => Ok(Comparator::Le),
            _ => Err(RuleError::UnsupportedComparator(s.to_string())),
        }
    }
}

impl Owner {
    pub fn as_str(self) -> &'static str {
        match self {
            Owner::User => "user",
            Owner::Target => "target",
        }
    }
}

impl FromStr for Owner {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Owner::User),
            "target" => Ok(Owner::Target),
            _ => Err(RuleError::UnsupportedScope(s.to_string())),
        }
    }
}

impl ConditionOwner {
    pub fn as_str(self) -> &'static str {
        match self {
            ConditionOwner::SelfOwner => "user",
            ConditionOwner::Target => "target",
        }
    }
}

impl FromStr for ConditionOwner {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" | "self" => Ok(ConditionOwner::SelfOwner),
            "target" => Ok(ConditionOwner::Target),
            _ => Err(RuleError::UnsupportedScope(s.to_string())),
        }
    }
}

impl Combine {
    pub fn as_str(self) -> &'static str {
        match self {
            Combine::Add => "+",
            Combine::Multiply => "*",
        }
    }
}

impl FromStr for Combine {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Combine::Add),
            "*" => Ok(Combine::Multiply),
            _ => Err(RuleError::UnsupportedModifier(s.to_string())),
        }
    }
}

impl FlatSign {
    pub fn as_str(self) -> &'static str {
        match self {
            FlatSign::Plus => "+",
            FlatSign::Minus => "-",
        }
    }
}

impl FromStr for FlatSign {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(FlatSign::Plus),
            "-" => Ok(FlatSign::Minus),
            _ => Err(RuleError::UnsupportedModifier(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub attribute: String,
    pub owner: ConditionOwner,
    pub comparator: Comparator,
    pub value: Value,
}

/// The entities a value expression may read from.
#[derive(Debug, Clone, Copy)]
pub struct ValueContext<'a> {
    pub user: &'a Entity,
    pub target: Option<&'a Entity>,
}

pub fn evaluate_condition(entity: &Entity, condition: &Condition) -> Result<bool, RuleError> {
    let current = entity
        .value(&condition.attribute)
        .ok_or_else(|| RuleError::unknown_attribute(&condition.attribute, &entity.name))?;
    condition.comparator.compare(current, &condition.value)
}

/// Resolve `expr` into a concrete value.
///
/// For attribute-based expressions the flat change is computed first and the
/// combined term is added to it: `flat + (v + operand)` or `flat + (v * operand)`.
pub fn resolve_value(ctx: &ValueContext<'_>, expr: &ValueExpr) -> Result<Value, RuleError> {
    match expr {
        ValueExpr::Literal(value) => Ok(value.clone()),
        ValueExpr::AttributeBased {
            source_attribute,
            owner,
            combine,
            operand,
            flat,
        } => {
            let source = match owner {
                Owner::User => ctx.user,
                Owner::Target => ctx.target.ok_or_else(|| RuleError::MissingTarget {
                    action: format!("value based on target attribute {}", source_attribute),
                })?,
            };
            let current = source
                .value(source_attribute)
                .ok_or_else(|| RuleError::unknown_attribute(source_attribute, &source.name))?;
            let Some(current) = current.as_number() else {
                return Err(RuleError::TypeMismatch(format!(
                    "attribute {} of {} is {}, expected number",
                    source_attribute,
                    source.name,
                    current.type_name()
                )));
            };

            let flat = flat.map(|f| f.signed()).unwrap_or(0.0);
            let combined = match combine {
                Combine::Add => current + operand,
                Combine::Multiply => current * operand,
            };
            let resolved = flat + combined;
            if !resolved.is_finite() {
                return Err(RuleError::TypeMismatch(format!(
                    "value based on {}.{} is not a finite number",
                    source.name, source_attribute
                )));
            }
            Ok(Value::Number(resolved))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::attributes::{AttributeValue, ValueKind};

    fn fighter(name: &str, hp: f64, strength: f64) -> Entity {
        Entity::new(
            name,
            vec![
                AttributeValue::new("HP", ValueKind::Number, hp),
                AttributeValue::new("STR", ValueKind::Number, strength),
                AttributeValue::new("Cond", ValueKind::Text, "OK"),
            ],
            Vec::new(),
        )
    }

    fn strength_expr(owner: Owner, combine: Combine, flat: Option<FlatChange>) -> ValueExpr {
        ValueExpr::AttributeBased {
            source_attribute: "STR".to_string(),
            owner,
            combine,
            operand: 2.0,
            flat,
        }
    }

    #[test]
    fn literal_resolves_unchanged() {
        let user = fighter("Keith", 30.0, 5.0);
        let ctx = ValueContext {
            user: &user,
            target: None,
        };
        let value = resolve_value(&ctx, &ValueExpr::literal("Bad")).unwrap();
        assert_eq!(value, Value::Text("Bad".into()));
    }

    #[test]
    fn flat_is_added_to_combined_term() {
        let user = fighter("Keith", 30.0, 5.0);
        let target = fighter("Logan", 30.0, 7.0);
        let ctx = ValueContext {
            user: &user,
            target: Some(&target),
        };
        let minus_three = Some(FlatChange {
            sign: FlatSign::Minus,
            magnitude: 3.0,
        });

        let add = resolve_value(&ctx, &strength_expr(Owner::User, Combine::Add, minus_three));
        assert_eq!(add.unwrap(), Value::Number(4.0));

        let mul = resolve_value(
            &ctx,
            &strength_expr(Owner::Target, Combine::Multiply, minus_three),
        );
        assert_eq!(mul.unwrap(), Value::Number(11.0));

        let plain = resolve_value(&ctx, &strength_expr(Owner::User, Combine::Multiply, None));
        assert_eq!(plain.unwrap(), Value::Number(10.0));
    }

    #[test]
    fn resolve_is_pure() {
        let user = fighter("Keith", 30.0, 5.0);
        let before = user.clone();
        let ctx = ValueContext {
            user: &user,
            target: None,
        };
        let expr = strength_expr(Owner::User, Combine::Add, None);
        let first = resolve_value(&ctx, &expr).unwrap();
        let second = resolve_value(&ctx, &expr).unwrap();
        assert_eq!(first, second);
        assert_eq!(user, before);
    }

    #[test]
    fn target_owner_without_target_fails() {
        let user = fighter("Keith", 30.0, 5.0);
        let ctx = ValueContext {
            user: &user,
            target: None,
        };
        let err = resolve_value(&ctx, &strength_expr(Owner::Target, Combine::Add, None));
        assert!(matches!(err, Err(RuleError::MissingTarget { .. })));
    }

    #[test]
    fn text_source_is_a_type_mismatch() {
        let user = fighter("Keith", 30.0, 5.0);
        let ctx = ValueContext {
            user: &user,
            target: None,
        };
        let expr = ValueExpr::AttributeBased {
            source_attribute: "Cond".to_string(),
            owner: Owner::User,
            combine: Combine::Add,
            operand: 1.0,
            flat: None,
        };
        assert!(matches!(
            resolve_value(&ctx, &expr),
            Err(RuleError::TypeMismatch(_))
        ));
    }

    #[test]
    fn non_finite_result_is_a_type_mismatch() {
        let user = fighter("Keith", 30.0, 1e308);
        let ctx = ValueContext {
            user: &user,
            target: None,
        };
        let err = resolve_value(&ctx, &strength_expr(Owner::User, Combine::Multiply, None));
        assert!(matches!(err, Err(RuleError::TypeMismatch(_))));
    }

    #[test]
    fn conditions_compare_live_values() {
        let keith = fighter("Keith", 30.0, 5.0);
        let above = Condition {
            attribute: "HP".to_string(),
            owner: ConditionOwner::SelfOwner,
            comparator: Comparator::Gt,
            value: Value::Number(10.0),
        };
        assert!(evaluate_condition(&keith, &above).unwrap());

        let ok = Condition {
            attribute: "Cond".to_string(),
            owner: ConditionOwner::SelfOwner,
            comparator: Comparator::Ne,
            value: Value::Text("OK".into()),
        };
        assert!(!evaluate_condition(&keith, &ok).unwrap());

        let ordered_text = Condition {
            comparator: Comparator::Lt,
            ..ok
        };
        assert!(matches!(
            evaluate_condition(&keith, &ordered_text),
            Err(RuleError::TypeMismatch(_))
        ));

        let missing = Condition {
            attribute: "MP".to_string(),
            ..above
        };
        assert!(matches!(
            evaluate_condition(&keith, &missing),
            Err(RuleError::UnknownAttribute { .. })
        ));
    }

    #[test]
    fn mixed_kinds_are_never_equal() {
        assert!(!Comparator::Eq
            .compare(&Value::Number(1.0), &Value::Boolean(true))
            .unwrap());
        assert!(Comparator::Ne
            .compare(&Value::Text("1".into()), &Value::Number(1.0))
            .unwrap());
    }
}
