//! Argument parsing for the authoring commands of the interactive console.
//!
//! Effects are written as `attribute:scope:modifier:value` (for example
//! `HP:st:+:-5`), entity values as `attribute=value` and granted actions as
//! `+Action`.

use crate::core::world::World;
use crate::rules::{AttributeValue, Effect, RuleError, TableKind, Value, ValueExpr, ValueKind};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConsoleError {
    #[error("malformed {what}: {input}")]
    Malformed { what: &'static str, input: String },

    #[error("unknown table {0}, expected attribute, action, entity or event")]
    UnknownTable(String),

    #[error(transparent)]
    Rules(#[from] RuleError),
}

fn malformed(what: &'static str, input: &str) -> ConsoleError {
    ConsoleError::Malformed {
        what,
        input: input.to_string(),
    }
}

/// `true`/`false` become booleans, anything numeric a number, the rest text.
pub fn parse_literal(token: &str) -> Value {
    match token {
        "true" => Value::Boolean(true),
        "false" => Value::Boolean(false),
        _ => token
            .parse::<f64>()
            .map(Value::Number)
            .unwrap_or_else(|_| Value::Text(token.to_string())),
    }
}

pub fn parse_table(token: &str) -> Result<TableKind, ConsoleError> {
    match token {
        "attribute" => Ok(TableKind::Attribute),
        "action" => Ok(TableKind::Action),
        "entity" => Ok(TableKind::Entity),
        "event" => Ok(TableKind::Event),
        _ => Err(ConsoleError::UnknownTable(token.to_string())),
    }
}

/// Parse one literal-valued effect.
pub fn parse_effect(token: &str) -> Result<Effect, ConsoleError> {
    let mut parts = token.splitn(4, ':');
    let (Some(attribute), Some(scope), Some(modifier), Some(value)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(malformed("effect", token));
    };
    if attribute.is_empty() {
        return Err(malformed("effect", token));
    }
    Ok(Effect::new(
        attribute,
        scope.parse()?,
        modifier.parse()?,
        ValueExpr::Literal(parse_literal(value)),
    ))
}

/// Split `entity` arguments into attribute values and action names. A value
/// takes the kind of its attribute when the rule set defines one.
pub fn parse_entity_args(
    world: &World,
    tokens: &[&str],
) -> Result<(Vec<AttributeValue>, Vec<String>), ConsoleError> {
    let mut values = Vec::new();
    let mut actions = Vec::new();
    for token in tokens {
        if let Some(action) = token.strip_prefix('+') {
            if action.is_empty() {
                return Err(malformed("action grant", token));
            }
            actions.push(action.to_string());
            continue;
        }
        let Some((attribute, raw)) = token.split_once('=') else {
            return Err(malformed("attribute value", token));
        };
        let value = parse_literal(raw);
        let kind = match world.attribute(attribute) {
            Some(def) => def.kind,
            None => match value {
                Value::Number(_) => ValueKind::Number,
                Value::Text(_) => ValueKind::Text,
                Value::Boolean(_) => ValueKind::Boolean,
            },
        };
        values.push(AttributeValue::new(attribute, kind, value));
    }
    Ok((values, actions))
}

/// Remove a definition from one of the four tables. Nothing that refers to
/// it is touched.
pub fn remove(world: &mut World, table: TableKind, name: &str) -> Result<(), ConsoleError> {
    match table {
        TableKind::Attribute => world.remove_attribute(name).map(drop)?,
        TableKind::Action => world.remove_action(name).map(drop)?,
        TableKind::Entity => world.remove_entity(name).map(drop)?,
        TableKind::Event => world.remove_event(name).map(drop)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Modifier, Scope};

    fn arena() -> World {
        let mut world = World::new("Arena");
        world.define_attribute("HP", ValueKind::Number).unwrap();
        world.define_attribute("Luck", ValueKind::Percent).unwrap();
        world
    }

    #[test]
    fn literals_pick_their_kind() {
        assert_eq!(parse_literal("true"), Value::Boolean(true));
        assert_eq!(parse_literal("-2.5"), Value::Number(-2.5));
        assert_eq!(parse_literal("Bad"), Value::Text("Bad".to_string()));
    }

    #[test]
    fn effects_are_read_from_colon_separated_tokens() {
        let effect = parse_effect("HP:st:+:-5").unwrap();
        assert_eq!(effect.attribute, "HP");
        assert_eq!(effect.scope, Scope::SingleTarget);
        assert_eq!(effect.modifier, Modifier::Add);
        assert_eq!(effect.value, ValueExpr::literal(-5));

        assert!(matches!(
            parse_effect("HP:st:+"),
            Err(ConsoleError::Malformed { .. })
        ));
        assert_eq!(
            parse_effect("HP:aoe:+:1").unwrap_err(),
            ConsoleError::Rules(RuleError::UnsupportedScope("aoe".to_string()))
        );
    }

    #[test]
    fn console_built_definitions_go_through_the_world() {
        let mut world = arena();
        world
            .define_action("Hit", vec![parse_effect("HP:st:+:-5").unwrap()])
            .unwrap();
        let (values, actions) =
            parse_entity_args(&world, &["HP=30", "Luck=0.5", "+Hit"]).unwrap();
        assert_eq!(values[1].kind, ValueKind::Percent);
        assert_eq!(actions, vec!["Hit".to_string()]);
        world.define_entity("Keith", &values, &actions).unwrap();
        world.define_entity("Logan", &values, &actions).unwrap();

        world.use_action("Keith", "Hit", &["Logan"]).unwrap();
        assert_eq!(
            world.entity("Logan").and_then(|e| e.value("HP")),
            Some(&Value::Number(25.0))
        );
        assert!(matches!(
            parse_entity_args(&world, &["HP"]),
            Err(ConsoleError::Malformed { .. })
        ));
    }

    #[test]
    fn remove_targets_the_named_table() {
        let mut world = arena();
        assert!(matches!(
            parse_table("spell"),
            Err(ConsoleError::UnknownTable(_))
        ));
        remove(&mut world, parse_table("attribute").unwrap(), "Luck").unwrap();
        assert!(world.attribute("Luck").is_none());
        assert_eq!(
            remove(&mut world, TableKind::Entity, "Keith").unwrap_err(),
            ConsoleError::Rules(RuleError::NotFound {
                kind: TableKind::Entity,
                name: "Keith".to_string()
            })
        );
    }
}
