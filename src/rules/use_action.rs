use bevy_utils::tracing::debug;

use crate::rules::action::{Action, Effect, Modifier, Scope};
use crate::rules::attributes::Value;
use crate::rules::entity::Entity;
use crate::rules::error::RuleError;
use crate::rules::expression::{evaluate_condition, resolve_value, ConditionOwner, ValueContext};

const USER: usize = 0;

/// A single attribute change made while applying an action.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedChange {
    pub entity: String,
    pub attribute: String,
    pub before: Value,
    pub after: Value,
}

/// Outcome of a successful application. `entities` holds the working copies
/// of every touched entity (user first) ready to be committed.
#[derive(Debug)]
pub struct ActionResult {
    pub entities: Vec<Entity>,
    pub applied: Vec<AppliedChange>,
    pub skipped: usize,
}

/// Copies of the user and every distinct target. The same entity named twice
/// (or the user targeting itself) shares one copy.
struct WorkingSet {
    entities: Vec<Entity>,
    targets: Vec<usize>,
}

impl WorkingSet {
    fn new(user: &Entity, targets: &[&Entity]) -> Self {
        let mut entities = vec![user.clone()];
        let mut indices = Vec::with_capacity(targets.len());
        for target in targets {
            let idx = match entities.iter().position(|e| e.name == target.name) {
                Some(idx) => idx,
                None => {
                    entities.push((*target).clone());
                    entities.len() - 1
                }
            };
            indices.push(idx);
        }
        Self {
            entities,
            targets: indices,
        }
    }
}

pub fn can_use(user: &Entity, action: &Action) -> Result<(), RuleError> {
    if !user.has_action(&action.name) {
        return Err(RuleError::ActionNotOwned {
            entity: user.name.clone(),
            action: action.name.clone(),
        });
    }
    Ok(())
}

/// Apply `action` on behalf of `user` against `targets`.
///
/// Nothing passed in is mutated: effects run against working copies which are
/// returned for the caller to commit. Any error discards them, so a failed
/// action never leaves an entity half-applied.
pub fn apply_action(
    action: &Action,
    user: &Entity,
    targets: &[&Entity],
) -> Result<ActionResult, RuleError> {
    let mut working = WorkingSet::new(user, targets);
    let mut applied = Vec::new();
    let mut skipped = 0;

    for effect in &action.effects {
        skipped += apply_effect(action, effect, &mut working, &mut applied)?;
    }

    Ok(ActionResult {
        entities: working.entities,
        applied,
        skipped,
    })
}

fn apply_effect(
    action: &Action,
    effect: &Effect,
    working: &mut WorkingSet,
    applied: &mut Vec<AppliedChange>,
) -> Result<usize, RuleError> {
    let missing_target = || RuleError::MissingTarget {
        action: action.name.clone(),
    };

    let touched: Vec<usize> = match effect.scope {
        Scope::SelfTarget => vec![USER],
        Scope::SingleTarget => vec![*working.targets.first().ok_or_else(missing_target)?],
        Scope::MultiTarget => {
            if working.targets.is_empty() {
                return Err(missing_target());
            }
            working.targets.clone()
        }
    };

    for &idx in &touched {
        let entity = &working.entities[idx];
        if entity.attribute(&effect.attribute).is_none() {
            return Err(RuleError::unknown_attribute(&effect.attribute, &entity.name));
        }
    }

    let mut skipped = 0;
    for idx in touched {
        // Self-scoped effects still see the first supplied target, if any.
        let target = match effect.scope {
            Scope::SelfTarget => working.targets.first().copied(),
            _ => Some(idx),
        };

        if let Some(condition) = &effect.condition {
            let subject = match condition.owner {
                ConditionOwner::SelfOwner => USER,
                ConditionOwner::Target => target.ok_or_else(missing_target)?,
            };
            if !evaluate_condition(&working.entities[subject], condition)? {
                debug!(
                    action = %action.name,
                    attribute = %effect.attribute,
                    entity = %working.entities[idx].name,
                    "condition not met, effect skipped"
                );
                skipped += 1;
                continue;
            }
        }

        let resolved = {
            let ctx = ValueContext {
                user: &working.entities[USER],
                target: target.map(|t| &working.entities[t]),
            };
            resolve_value(&ctx, &effect.value)?
        };

        let entity = &mut working.entities[idx];
        let Some(slot) = entity.attribute(&effect.attribute) else {
            return Err(RuleError::unknown_attribute(&effect.attribute, &entity.name));
        };
        let before = slot.value.clone();
        let after = modify(effect.modifier, slot.kind.accepts(&resolved), &before, resolved)
            .map_err(|reason| {
                RuleError::TypeMismatch(format!(
                    "{} of action {} on {}.{}",
                    reason, action.name, entity.name, effect.attribute
                ))
            })?;
        entity.replace_value(&effect.attribute, after.clone());

        debug!(
            action = %action.name,
            entity = %entity.name,
            attribute = %effect.attribute,
            %before,
            %after,
            "effect applied"
        );
        applied.push(AppliedChange {
            entity: entity.name.clone(),
            attribute: effect.attribute.clone(),
            before,
            after,
        });
    }

    Ok(skipped)
}

fn modify(
    modifier: Modifier,
    kind_accepts: bool,
    current: &Value,
    resolved: Value,
) -> Result<Value, String> {
    match modifier {
        Modifier::Assign if kind_accepts => Ok(resolved),
        Modifier::Assign => Err(format!("cannot assign {} value", resolved.type_name())),
        Modifier::Add | Modifier::Multiply => {
            let (Some(lhs), Some(rhs)) = (current.as_number(), resolved.as_number()) else {
                return Err(format!(
                    "operator {} is not applicable to {} and {}",
                    modifier.as_str(),
                    current.type_name(),
                    resolved.type_name()
                ));
            };
            let result = match modifier {
                Modifier::Add => lhs + rhs,
                _ => lhs * rhs,
            };
            if !result.is_finite() {
                return Err(format!(
                    "operator {} on {} and {} leaves the number range",
                    modifier.as_str(),
                    lhs,
                    rhs
                ));
            }
            Ok(Value::Number(result))
        }
    }
}
