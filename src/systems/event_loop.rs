use bevy_utils::tracing::debug;

use crate::core::world::World;
use crate::rules::{RuleError, Value};
use crate::simulation::event::{EndCondition, Event, TurnUnit};

/// Whether the event's end condition holds against the current world.
pub fn end_condition_met(world: &World, event: &Event) -> Result<bool, RuleError> {
    match &event.end_condition {
        EndCondition::TurnCount { comparator, value } => comparator.compare(
            &Value::Number(event.turn_index as f64),
            &Value::Number(f64::from(*value)),
        ),
        EndCondition::ParticipantAttribute {
            participant,
            attribute,
            comparator,
            value,
        } => {
            let entity = world
                .entity(participant)
                .ok_or_else(|| RuleError::UnknownEntity(participant.clone()))?;
            let current = entity
                .value(attribute)
                .ok_or_else(|| RuleError::unknown_attribute(attribute, participant))?;
            comparator.compare(current, value)
        }
    }
}

/// Play scripted turns until the end condition holds.
///
/// The condition is checked before every turn, including the first, so an
/// event whose condition already holds plays no turns at all.
pub fn run_event(world: &mut World, event: &mut Event) -> Result<(), RuleError> {
    while !end_condition_met(world, event)? {
        let Some(turn) = event.script.get(event.turn_index).cloned() else {
            return Err(RuleError::ScriptExhausted {
                event: event.name.clone(),
                turns: event.script.len(),
            });
        };
        let number = event.turn_index + 1;
        let line = match turn {
            TurnUnit::Action {
                user,
                action,
                targets,
            } => {
                let names: Vec<&str> = targets.iter().map(String::as_str).collect();
                world.use_action(&user, &action, &names)?;
                format!("{number}| {user} used {action} on {}", target_list(&targets))
            }
            TurnUnit::Speech { speaker, text } => {
                if world.entity(&speaker).is_none() {
                    return Err(RuleError::UnknownEntity(speaker));
                }
                format!("{number}| {speaker} said '{text}'")
            }
        };
        debug!(event = %event.name, "{line}");
        event.log.push(line);
        event.turn_index += 1;
    }
    Ok(())
}

fn target_list(targets: &[String]) -> String {
    if targets.is_empty() {
        "no one".to_string()
    } else {
        targets.join(", ")
    }
}
