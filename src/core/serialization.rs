use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize, Serializer};

use crate::core::world::World;
use crate::library::LibraryError;
use crate::rules::{
    Action, AttributeValue, Combine, Comparator, Condition, ConditionOwner, Effect, Entity,
    FlatChange, FlatSign, Modifier, Owner, RuleError, Scope, Value, ValueExpr, ValueKind,
};
use crate::simulation::event::{EndCondition, Event, TurnUnit};

/// Persisted shape of a rule set. Enumerations travel as their wire strings
/// and are parsed (and validated) when the snapshot is built into a `World`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSetData {
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<AttributeData>,
    #[serde(default)]
    pub actions: Vec<ActionData>,
    #[serde(default)]
    pub entities: Vec<EntityData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<EventData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeData {
    pub name: String,
    #[serde(rename = "value type")]
    pub value_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionData {
    pub name: String,
    pub effects: Vec<EffectData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectData {
    pub attribute: String,
    #[serde(rename = "effect type")]
    pub effect_type: String,
    pub modifier: String,
    pub value: ValueData,
    #[serde(default)]
    pub condition: Option<ConditionData>,
}

/// Either a literal or an attribute-based object. The object form is tried
/// first; a bare number, string or bool falls through to `Literal`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueData {
    AttributeBased(AttributeBasedData),
    Literal(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeBasedData {
    pub attribute: String,
    #[serde(rename = "attribute owner")]
    pub owner: String,
    pub modifier: String,
    #[serde(serialize_with = "whole_number")]
    pub value: f64,
    #[serde(default)]
    pub flat: Option<FlatData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatData {
    pub modifier: String,
    #[serde(serialize_with = "whole_number")]
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionData {
    pub attribute: String,
    #[serde(rename = "attribute owner")]
    pub owner: String,
    pub comparison: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityData {
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<EntityAttributeData>,
    #[serde(default)]
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityAttributeData {
    pub name: String,
    #[serde(rename = "value type")]
    pub value_type: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    pub name: String,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub script: Vec<TurnData>,
    #[serde(rename = "end condition")]
    pub end_condition: EndConditionData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "turn", rename_all = "lowercase")]
pub enum TurnData {
    Action {
        user: String,
        action: String,
        #[serde(default)]
        targets: Vec<String>,
    },
    Speech {
        speaker: String,
        text: String,
    },
}

// The participant form carries a superset of the turn-count fields, so it
// must be tried first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EndConditionData {
    ParticipantAttribute(ParticipantConditionData),
    TurnCount(TurnCountData),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantConditionData {
    pub participant: String,
    pub attribute: String,
    pub comparison: String,
    pub value: Value,
}

// A participant condition with a field missing must not pass as a turn count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TurnCountData {
    pub comparison: String,
    pub value: u32,
}

fn whole_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    Value::Number(*value).serialize(serializer)
}

pub fn extract_snapshot(world: &World) -> RuleSetData {
    RuleSetData {
        name: world.name().to_string(),
        attributes: world
            .attributes()
            .map(|def| AttributeData {
                name: def.name.clone(),
                value_type: def.kind.as_str().to_string(),
            })
            .collect(),
        actions: world.actions().map(action_data).collect(),
        entities: world.entities().map(entity_data).collect(),
        events: world.events().map(event_data).collect(),
    }
}

fn action_data(action: &Action) -> ActionData {
    ActionData {
        name: action.name.clone(),
        effects: action.effects.iter().map(effect_data).collect(),
    }
}

fn effect_data(effect: &Effect) -> EffectData {
    let value = match &effect.value {
        ValueExpr::Literal(value) => ValueData::Literal(value.clone()),
        ValueExpr::AttributeBased {
            source_attribute,
            owner,
            combine,
            operand,
            flat,
        } => ValueData::AttributeBased(AttributeBasedData {
            attribute: source_attribute.clone(),
            owner: owner.as_str().to_string(),
            modifier: combine.as_str().to_string(),
            value: *operand,
            flat: flat.map(|flat| FlatData {
                modifier: flat.sign.as_str().to_string(),
                value: flat.magnitude,
            }),
        }),
    };
    EffectData {
        attribute: effect.attribute.clone(),
        effect_type: effect.scope.as_str().to_string(),
        modifier: effect.modifier.as_str().to_string(),
        value,
        condition: effect.condition.as_ref().map(|condition| ConditionData {
            attribute: condition.attribute.clone(),
            owner: condition.owner.as_str().to_string(),
            comparison: condition.comparator.as_str().to_string(),
            value: condition.value.clone(),
        }),
    }
}

fn entity_data(entity: &Entity) -> EntityData {
    EntityData {
        name: entity.name.clone(),
        attributes: entity
            .attributes()
            .iter()
            .map(|value| EntityAttributeData {
                name: value.attribute.clone(),
                value_type: value.kind.as_str().to_string(),
                value: value.value.clone(),
            })
            .collect(),
        actions: entity.actions().to_vec(),
    }
}

fn event_data(event: &Event) -> EventData {
    EventData {
        name: event.name.clone(),
        participants: event.participants.clone(),
        script: event
            .script
            .iter()
            .map(|turn| match turn {
                TurnUnit::Action {
                    user,
                    action,
                    targets,
                } => TurnData::Action {
                    user: user.clone(),
                    action: action.clone(),
                    targets: targets.clone(),
                },
                TurnUnit::Speech { speaker, text } => TurnData::Speech {
                    speaker: speaker.clone(),
                    text: text.clone(),
                },
            })
            .collect(),
        end_condition: match &event.end_condition {
            EndCondition::TurnCount { comparator, value } => {
                EndConditionData::TurnCount(TurnCountData {
                    comparison: comparator.as_str().to_string(),
                    value: *value,
                })
            }
            EndCondition::ParticipantAttribute {
                participant,
                attribute,
                comparator,
                value,
            } => EndConditionData::ParticipantAttribute(ParticipantConditionData {
                participant: participant.clone(),
                attribute: attribute.clone(),
                comparison: comparator.as_str().to_string(),
                value: value.clone(),
            }),
        },
    }
}

/// Build a fresh `World` from a snapshot, replaying every definition through
/// the validating `define_*` operations in dependency order.
pub fn build_world(data: &RuleSetData) -> Result<World, RuleError> {
    let mut world = World::new(data.name.clone());

    for attribute in &data.attributes {
        world.define_attribute(&attribute.name, attribute.value_type.parse()?)?;
    }
    for action in &data.actions {
        let effects = action
            .effects
            .iter()
            .map(parse_effect)
            .collect::<Result<Vec<_>, _>>()?;
        world.define_action(&action.name, effects)?;
    }
    for entity in &data.entities {
        let values = entity
            .attributes
            .iter()
            .map(|attr| {
                let kind: ValueKind = attr.value_type.parse()?;
                Ok(AttributeValue::new(attr.name.clone(), kind, attr.value.clone()))
            })
            .collect::<Result<Vec<_>, RuleError>>()?;
        world.define_entity(&entity.name, &values, &entity.actions)?;
    }
    for event in &data.events {
        let script = event.script.iter().map(parse_turn).collect();
        world.define_event(
            &event.name,
            event.participants.clone(),
            script,
            parse_end_condition(&event.end_condition)?,
        )?;
    }
    Ok(world)
}

fn parse_effect(data: &EffectData) -> Result<Effect, RuleError> {
    let scope: Scope = data.effect_type.parse()?;
    let modifier: Modifier = data.modifier.parse()?;
    let value = match &data.value {
        ValueData::Literal(value) => ValueExpr::Literal(value.clone()),
        ValueData::AttributeBased(expr) => ValueExpr::AttributeBased {
            source_attribute: expr.attribute.clone(),
            owner: expr.owner.parse::<Owner>()?,
            combine: expr.modifier.parse::<Combine>()?,
            operand: expr.value,
            flat: expr
                .flat
                .as_ref()
                .map(|flat| -> Result<FlatChange, RuleError> {
                    Ok(FlatChange {
                        sign: flat.modifier.parse::<FlatSign>()?,
                        magnitude: flat.value,
                    })
                })
                .transpose()?,
        },
    };
    let mut effect = Effect::new(data.attribute.clone(), scope, modifier, value);
    if let Some(condition) = &data.condition {
        effect = effect.when(Condition {
            attribute: condition.attribute.clone(),
            owner: condition.owner.parse::<ConditionOwner>()?,
            comparator: condition.comparison.parse::<Comparator>()?,
            value: condition.value.clone(),
        });
    }
    Ok(effect)
}

fn parse_turn(data: &TurnData) -> TurnUnit {
    match data {
        TurnData::Action {
            user,
            action,
            targets,
        } => TurnUnit::Action {
            user: user.clone(),
            action: action.clone(),
            targets: targets.clone(),
        },
        TurnData::Speech { speaker, text } => TurnUnit::Speech {
            speaker: speaker.clone(),
            text: text.clone(),
        },
    }
}

fn parse_end_condition(data: &EndConditionData) -> Result<EndCondition, RuleError> {
    Ok(match data {
        EndConditionData::TurnCount(turns) => EndCondition::TurnCount {
            comparator: turns.comparison.parse()?,
            value: turns.value,
        },
        EndConditionData::ParticipantAttribute(condition) => EndCondition::ParticipantAttribute {
            participant: condition.participant.clone(),
            attribute: condition.attribute.clone(),
            comparator: condition.comparison.parse()?,
            value: condition.value.clone(),
        },
    })
}

pub fn save_world_to_json(world: &World) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&world.to_snapshot())
}

pub fn parse_rule_set(data: &str) -> serde_json::Result<RuleSetData> {
    serde_json::from_str(data)
}

/// Write a rule set to `path` as pretty-printed JSON.
pub fn save_world_to_path<P: AsRef<Path>>(world: &World, path: P) -> Result<(), LibraryError> {
    let path = path.as_ref();
    let json = save_world_to_json(world).map_err(|source| LibraryError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| LibraryError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and validate a rule set stored at `path`.
pub fn load_world_from_path<P: AsRef<Path>>(path: P) -> Result<World, LibraryError> {
    let path = path.as_ref();
    let data = fs::read_to_string(path).map_err(|source| LibraryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let snapshot = parse_rule_set(&data).map_err(|source| LibraryError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(build_world(&snapshot)?)
}
