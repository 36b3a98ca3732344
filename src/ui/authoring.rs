use crate::core::world::World;
use crate::rules::{Effect, Entity, Value, ValueExpr};
use crate::simulation::event::{EndCondition, Event, TurnUnit};

fn literal(value: &Value) -> String {
    match value {
        Value::Text(text) => format!("\"{}\"", text),
        other => other.to_string(),
    }
}

/// One-line description of an effect, e.g. `Cond (st) = "Bad"`.
pub fn describe_effect(effect: &Effect) -> String {
    let value = match &effect.value {
        ValueExpr::Literal(value) => literal(value),
        ValueExpr::AttributeBased {
            source_attribute,
            owner,
            combine,
            operand,
            flat,
        } => {
            let mut text = format!(
                "{}.{} {} {}",
                owner.as_str(),
                source_attribute,
                combine.as_str(),
                Value::Number(*operand)
            );
            if let Some(flat) = flat {
                text.push_str(&format!(
                    " {} {}",
                    flat.sign.as_str(),
                    Value::Number(flat.magnitude)
                ));
            }
            text
        }
    };
    let mut line = format!(
        "{} ({}) {} {}",
        effect.attribute,
        effect.scope.as_str(),
        effect.modifier.as_str(),
        value
    );
    if let Some(condition) = &effect.condition {
        line.push_str(&format!(
            " if {}.{} {} {}",
            condition.owner.as_str(),
            condition.attribute,
            condition.comparator.as_str(),
            literal(&condition.value)
        ));
    }
    line
}

pub fn describe_turn(turn: &TurnUnit) -> String {
    match turn {
        TurnUnit::Action {
            user,
            action,
            targets,
        } => format!("{} uses {} on [{}]", user, action, targets.join(", ")),
        TurnUnit::Speech { speaker, text } => format!("{} says '{}'", speaker, text),
    }
}

pub fn describe_end_condition(end: &EndCondition) -> String {
    match end {
        EndCondition::TurnCount { comparator, value } => {
            format!("turns {} {}", comparator.as_str(), value)
        }
        EndCondition::ParticipantAttribute {
            participant,
            attribute,
            comparator,
            value,
        } => format!(
            "{}.{} {} {}",
            participant,
            attribute,
            comparator.as_str(),
            literal(value)
        ),
    }
}

pub fn render_entity(entity: &Entity) -> String {
    let mut output = format!("{}\n", entity.name);
    for value in entity.attributes() {
        output.push_str(&format!(
            "  {} ({}): {}\n",
            value.attribute,
            value.kind,
            literal(&value.value)
        ));
    }
    if entity.actions().is_empty() {
        output.push_str("  Actions: none\n");
    } else {
        output.push_str(&format!("  Actions: {}\n", entity.actions().join(", ")));
    }
    output
}

pub fn render_event(event: &Event) -> String {
    let mut output = format!(
        "{} [{:?}, turn {}/{}]\n",
        event.name,
        event.status(),
        event.turn_index(),
        event.script.len()
    );
    output.push_str(&format!("  Participants: {}\n", event.participants.join(", ")));
    output.push_str(&format!(
        "  Ends when: {}\n",
        describe_end_condition(&event.end_condition)
    ));
    for (idx, turn) in event.script.iter().enumerate() {
        output.push_str(&format!("  {}. {}\n", idx + 1, describe_turn(turn)));
    }
    if let Some(failure) = event.failure() {
        output.push_str(&format!("  Failed: {}\n", failure));
    }
    output
}

/// Names that no longer resolve. Removals do not cascade, so these are
/// reported here rather than rejected earlier.
pub fn dangling_references(world: &World) -> Vec<String> {
    let mut issues = Vec::new();
    for action in world.actions() {
        for effect in &action.effects {
            if world.attribute(&effect.attribute).is_none() {
                issues.push(format!(
                    "action {} changes missing attribute {}",
                    action.name, effect.attribute
                ));
            }
        }
    }
    for entity in world.entities() {
        for value in entity.attributes() {
            if world.attribute(&value.attribute).is_none() {
                issues.push(format!(
                    "entity {} holds missing attribute {}",
                    entity.name, value.attribute
                ));
            }
        }
        for action in entity.actions() {
            if world.action(action).is_none() {
                issues.push(format!(
                    "entity {} lists missing action {}",
                    entity.name, action
                ));
            }
        }
    }
    for event in world.events() {
        for participant in &event.participants {
            if world.entity(participant).is_none() {
                issues.push(format!(
                    "event {} includes missing entity {}",
                    event.name, participant
                ));
            }
        }
    }
    issues
}

pub fn render_rule_set_summary(world: &World) -> String {
    let mut output = String::new();
    output.push_str(&format!("=== Rule Set: {} ===\n", world.name()));

    output.push_str(&format!("Attributes ({})\n", world.attributes().count()));
    for def in world.attributes() {
        output.push_str(&format!("  {}: {}\n", def.name, def.kind));
    }

    output.push_str(&format!("Actions ({})\n", world.actions().count()));
    for action in world.actions() {
        output.push_str(&format!("  {}\n", action.name));
        for effect in &action.effects {
            output.push_str(&format!("    - {}\n", describe_effect(effect)));
        }
    }

    output.push_str(&format!("Entities ({})\n", world.entities().count()));
    for entity in world.entities() {
        let stats: Vec<String> = entity
            .attributes()
            .iter()
            .map(|v| format!("{}={}", v.attribute, literal(&v.value)))
            .collect();
        output.push_str(&format!("  {}: {}\n", entity.name, stats.join(", ")));
    }

    output.push_str(&format!("Events ({})\n", world.events().count()));
    for event in world.events() {
        output.push_str(&format!(
            "  {} [{:?}] {} turns, ends when {}\n",
            event.name,
            event.status(),
            event.script.len(),
            describe_end_condition(&event.end_condition)
        ));
    }
    if let Some(running) = world.running_event() {
        output.push_str(&format!("Running: {}\n", running));
    }

    let issues = dangling_references(world);
    if !issues.is_empty() {
        output.push_str(&format!("Issues ({})\n", issues.len()));
        for issue in issues {
            output.push_str(&format!("  ! {}\n", issue));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{
        AttributeValue, Combine, Comparator, Condition, ConditionOwner, FlatChange, FlatSign,
        Modifier, Owner, Scope, ValueKind,
    };

    fn hello() -> World {
        let mut world = World::new("Hello");
        world.define_attribute("HP", ValueKind::Number).unwrap();
        world.define_attribute("Cond", ValueKind::Text).unwrap();
        world
            .define_action(
                "Boom",
                vec![Effect::new(
                    "Cond",
                    Scope::SingleTarget,
                    Modifier::Assign,
                    ValueExpr::literal("Bad"),
                )],
            )
            .unwrap();
        world
            .define_entity(
                "Keith",
                &[
                    AttributeValue::new("HP", ValueKind::Number, 30),
                    AttributeValue::new("Cond", ValueKind::Text, "OK"),
                ],
                &["Boom".to_string()],
            )
            .unwrap();
        world
    }

    #[test]
    fn summary_lists_every_table() {
        let summary = render_rule_set_summary(&hello());
        assert!(summary.contains("=== Rule Set: Hello ==="));
        assert!(summary.contains("  HP: num\n"));
        assert!(summary.contains("    - Cond (st) = \"Bad\"\n"));
        assert!(summary.contains("  Keith: HP=30, Cond=\"OK\"\n"));
        assert!(summary.contains("Events (0)"));
        assert!(!summary.contains("Issues"));
    }

    #[test]
    fn summary_flags_dangling_names() {
        let mut world = hello();
        world.remove_action("Boom").unwrap();
        let summary = render_rule_set_summary(&world);
        assert!(summary.contains("Issues (1)"));
        assert!(summary.contains("entity Keith lists missing action Boom"));
    }

    #[test]
    fn attribute_based_effects_read_naturally() {
        let effect = Effect::new(
            "HP",
            Scope::MultiTarget,
            Modifier::Add,
            ValueExpr::AttributeBased {
                source_attribute: "HP".to_string(),
                owner: Owner::User,
                combine: Combine::Multiply,
                operand: 0.5,
                flat: Some(FlatChange {
                    sign: FlatSign::Minus,
                    magnitude: 2.0,
                }),
            },
        )
        .when(Condition {
            attribute: "Alive".to_string(),
            owner: ConditionOwner::Target,
            comparator: Comparator::Eq,
            value: Value::Boolean(true),
        });
        assert_eq!(
            describe_effect(&effect),
            "HP (mt) + user.HP * 0.5 - 2 if target.Alive = true"
        );
    }

    #[test]
    fn entity_card_shows_kinds_and_actions() {
        let world = hello();
        let card = render_entity(world.entity("Keith").unwrap());
        assert_eq!(
            card,
            "Keith\n  HP (num): 30\n  Cond (alpha): \"OK\"\n  Actions: Boom\n"
        );
    }
}
