//! Definition checks shared by the `define_*` and `modify_*` paths and by
//! snapshot loading.

use crate::core::table::Table;
use crate::rules::{
    Action, AttributeDef, AttributeValue, Condition, Effect, Entity, Modifier, RuleError, Value,
    ValueExpr,
};
use crate::simulation::event::{EndCondition, TurnUnit};

fn defined<'a>(
    attributes: &'a Table<AttributeDef>,
    name: &str,
) -> Result<&'a AttributeDef, RuleError> {
    attributes
        .get(name)
        .ok_or_else(|| RuleError::unknown_attribute(name, "this rule set"))
}

pub fn validate_effects(
    attributes: &Table<AttributeDef>,
    action: &str,
    effects: &[Effect],
) -> Result<(), RuleError> {
    if effects.is_empty() {
        return Err(RuleError::EmptyAction(action.to_string()));
    }
    for effect in effects {
        validate_effect(attributes, effect)?;
    }
    Ok(())
}

fn validate_effect(attributes: &Table<AttributeDef>, effect: &Effect) -> Result<(), RuleError> {
    let def = defined(attributes, &effect.attribute)?;

    if effect.modifier != Modifier::Assign && !def.kind.is_numeric() {
        return Err(RuleError::TypeMismatch(format!(
            "operator {} is not applicable on {} attribute {}",
            effect.modifier.as_str(),
            def.kind,
            def.name
        )));
    }

    match &effect.value {
        ValueExpr::Literal(value) => {
            finite(value)?;
            if effect.modifier != Modifier::Assign && value.as_number().is_none() {
                return Err(RuleError::TypeMismatch(format!(
                    "operator {} is not applicable on value of type {}",
                    effect.modifier.as_str(),
                    value.type_name()
                )));
            }
            if effect.modifier == Modifier::Assign && !def.kind.accepts(value) {
                return Err(RuleError::TypeMismatch(format!(
                    "{} value cannot be assigned to {} attribute {}",
                    value.type_name(),
                    def.kind,
                    def.name
                )));
            }
        }
        ValueExpr::AttributeBased {
            source_attribute, ..
        } => {
            let source = defined(attributes, source_attribute)?;
            if !source.kind.is_numeric() || !def.kind.is_numeric() {
                return Err(RuleError::TypeMismatch(format!(
                    "attribute-based values need numeric attributes ({} from {})",
                    def.name, source.name
                )));
            }
        }
    }

    if let Some(condition) = &effect.condition {
        validate_condition(attributes, condition)?;
    }
    Ok(())
}

pub fn validate_condition(
    attributes: &Table<AttributeDef>,
    condition: &Condition,
) -> Result<(), RuleError> {
    defined(attributes, &condition.attribute)?;
    ordering_needs_number(condition.comparator.is_ordering(), &condition.value)
}

fn ordering_needs_number(is_ordering: bool, value: &Value) -> Result<(), RuleError> {
    if is_ordering && value.as_number().is_none() {
        return Err(RuleError::TypeMismatch(format!(
            "ordering comparison is not applicable on value of type {}",
            value.type_name()
        )));
    }
    Ok(())
}

fn finite(value: &Value) -> Result<(), RuleError> {
    match value.as_number() {
        Some(n) if !n.is_finite() => Err(RuleError::TypeMismatch(format!(
            "{} is not a finite number",
            n
        ))),
        _ => Ok(()),
    }
}

/// Check an entity's attribute values and return owned copies carrying the
/// kind of the attribute definition.
pub fn validate_attribute_values(
    attributes: &Table<AttributeDef>,
    values: &[AttributeValue],
) -> Result<Vec<AttributeValue>, RuleError> {
    let mut out: Vec<AttributeValue> = Vec::with_capacity(values.len());
    for value in values {
        let def = defined(attributes, &value.attribute)?;
        if !def.kind.accepts(&value.value) {
            return Err(RuleError::TypeMismatch(format!(
                "value of type {} does not match attribute {} of type {}",
                value.value.type_name(),
                def.name,
                def.kind
            )));
        }
        if out.iter().any(|v| v.attribute == value.attribute) {
            return Err(RuleError::DuplicateName {
                kind: attributes.kind(),
                name: value.attribute.clone(),
            });
        }
        finite(&value.value)?;
        out.push(AttributeValue {
            attribute: value.attribute.clone(),
            kind: def.kind,
            value: value.value.clone(),
        });
    }
    Ok(out)
}

pub fn validate_action_names(
    actions: &Table<Action>,
    names: &[String],
) -> Result<(), RuleError> {
    for name in names {
        if !actions.contains(name) {
            return Err(RuleError::UnknownAction(name.clone()));
        }
    }
    Ok(())
}

pub fn validate_event(
    attributes: &Table<AttributeDef>,
    actions: &Table<Action>,
    entities: &Table<Entity>,
    participants: &[String],
    script: &[TurnUnit],
    end_condition: &EndCondition,
) -> Result<(), RuleError> {
    let entity = |name: &str| -> Result<(), RuleError> {
        if entities.contains(name) {
            Ok(())
        } else {
            Err(RuleError::UnknownEntity(name.to_string()))
        }
    };

    for participant in participants {
        entity(participant)?;
    }

    for turn in script {
        match turn {
            TurnUnit::Action {
                user,
                action,
                targets,
            } => {
                entity(user)?;
                if !actions.contains(action) {
                    return Err(RuleError::UnknownAction(action.clone()));
                }
                for target in targets {
                    entity(target)?;
                }
            }
            TurnUnit::Speech { speaker, .. } => entity(speaker)?,
        }
    }

    match end_condition {
        EndCondition::TurnCount { .. } => Ok(()),
        EndCondition::ParticipantAttribute {
            participant,
            attribute,
            comparator,
            value,
        } => {
            if !participants.iter().any(|p| p == participant) {
                return Err(RuleError::UnknownEntity(participant.clone()));
            }
            entity(participant)?;
            defined(attributes, attribute)?;
            ordering_needs_number(comparator.is_ordering(), value)
        }
    }
}
