use std::path::Path;

use bevy_utils::tracing::{info, warn};

use crate::core::serialization::{
    build_world, extract_snapshot, load_world_from_path, save_world_to_path, RuleSetData,
};
use crate::core::table::Table;
use crate::core::validation::{
    validate_action_names, validate_attribute_values, validate_effects, validate_event,
};
use crate::library::LibraryError;
use crate::rules::{
    apply_action, can_use, Action, ActionResult, AttributeDef, AttributeValue, Effect, Entity,
    RuleError, TableKind, ValueKind,
};
use crate::simulation::event::{EndCondition, Event, EventStatus, TurnUnit};
use crate::systems::event_loop::run_event;

/// One rule set: the owning tables for attributes, actions, entities and
/// events, plus the single running-event slot.
///
/// Every mutation goes through a validating operation; callers never reach
/// into the tables directly.
#[derive(Debug, Clone)]
pub struct World {
    name: String,
    attributes: Table<AttributeDef>,
    actions: Table<Action>,
    entities: Table<Entity>,
    events: Table<Event>,
    running_event: Option<String>,
}

impl World {
    /// Create an empty rule set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Table::new(TableKind::Attribute),
            actions: Table::new(TableKind::Action),
            entities: Table::new(TableKind::Entity),
            events: Table::new(TableKind::Event),
            running_event: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDef> {
        self.attributes.get(name)
    }

    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }

    pub fn event(&self, name: &str) -> Option<&Event> {
        self.events.get(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &AttributeDef> {
        self.attributes.iter()
    }

    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// Name of the event currently being driven, if any.
    pub fn running_event(&self) -> Option<&str> {
        self.running_event.as_deref()
    }

    pub fn define_attribute(
        &mut self,
        name: &str,
        kind: ValueKind,
    ) -> Result<&AttributeDef, RuleError> {
        let def = self.attributes.insert(AttributeDef {
            name: name.to_string(),
            kind,
        })?;
        info!(attribute = %def.name, kind = %def.kind, "attribute defined");
        Ok(def)
    }

    pub fn define_action(&mut self, name: &str, effects: Vec<Effect>) -> Result<&Action, RuleError> {
        self.actions.ensure_vacant(name)?;
        validate_effects(&self.attributes, name, &effects)?;
        let action = self.actions.insert(Action {
            name: name.to_string(),
            effects,
        })?;
        info!(action = %action.name, effects = action.effects.len(), "action defined");
        Ok(action)
    }

    pub fn define_entity(
        &mut self,
        name: &str,
        attribute_values: &[AttributeValue],
        action_names: &[String],
    ) -> Result<&Entity, RuleError> {
        self.entities.ensure_vacant(name)?;
        let values = validate_attribute_values(&self.attributes, attribute_values)?;
        validate_action_names(&self.actions, action_names)?;
        let entity = self
            .entities
            .insert(Entity::new(name, values, action_names.to_vec()))?;
        info!(entity = %entity.name, "entity defined");
        Ok(entity)
    }

    pub fn define_event(
        &mut self,
        name: &str,
        participants: Vec<String>,
        script: Vec<TurnUnit>,
        end_condition: EndCondition,
    ) -> Result<&Event, RuleError> {
        self.events.ensure_vacant(name)?;
        validate_event(
            &self.attributes,
            &self.actions,
            &self.entities,
            &participants,
            &script,
            &end_condition,
        )?;
        let event = self
            .events
            .insert(Event::new(name, participants, script, end_condition))?;
        info!(event = %event.name, turns = event.script.len(), "event defined");
        Ok(event)
    }

    /// Rename and/or retype an attribute. Existing entity values are not
    /// re-validated and keep the old name.
    pub fn modify_attribute(
        &mut self,
        name: &str,
        new_name: Option<&str>,
        new_kind: Option<ValueKind>,
    ) -> Result<(), RuleError> {
        if !self.attributes.contains(name) {
            return Err(RuleError::not_found(TableKind::Attribute, name));
        }
        if let Some(new_name) = new_name.filter(|n| *n != name) {
            self.attributes.ensure_vacant(new_name)?;
        }
        let Some(def) = self.attributes.get_mut(name) else {
            return Err(RuleError::not_found(TableKind::Attribute, name));
        };
        if let Some(kind) = new_kind {
            def.kind = kind;
            // Values are not re-checked against the new kind; only the
            // recorded kind follows the definition.
            for entity in self.entities.iter_mut() {
                entity.relabel(name, kind);
            }
        }
        if let Some(new_name) = new_name {
            def.name = new_name.to_string();
        }
        Ok(())
    }

    pub fn modify_action(
        &mut self,
        name: &str,
        new_name: Option<&str>,
        new_effects: Option<Vec<Effect>>,
    ) -> Result<(), RuleError> {
        if !self.actions.contains(name) {
            return Err(RuleError::not_found(TableKind::Action, name));
        }
        if let Some(new_name) = new_name.filter(|n| *n != name) {
            self.actions.ensure_vacant(new_name)?;
        }
        if let Some(effects) = &new_effects {
            validate_effects(&self.attributes, new_name.unwrap_or(name), effects)?;
        }
        let Some(action) = self.actions.get_mut(name) else {
            return Err(RuleError::not_found(TableKind::Action, name));
        };
        if let Some(effects) = new_effects {
            action.effects = effects;
        }
        if let Some(new_name) = new_name {
            action.name = new_name.to_string();
        }
        Ok(())
    }

    pub fn modify_entity(
        &mut self,
        name: &str,
        new_name: Option<&str>,
        new_attribute_values: Option<&[AttributeValue]>,
        new_action_names: Option<&[String]>,
    ) -> Result<(), RuleError> {
        if !self.entities.contains(name) {
            return Err(RuleError::not_found(TableKind::Entity, name));
        }
        if let Some(new_name) = new_name.filter(|n| *n != name) {
            self.entities.ensure_vacant(new_name)?;
        }
        let values = new_attribute_values
            .map(|values| validate_attribute_values(&self.attributes, values))
            .transpose()?;
        if let Some(names) = new_action_names {
            validate_action_names(&self.actions, names)?;
        }
        let Some(entity) = self.entities.get_mut(name) else {
            return Err(RuleError::not_found(TableKind::Entity, name));
        };
        if let Some(values) = values {
            entity.set_attributes(values);
        }
        if let Some(names) = new_action_names {
            entity.set_actions(names.to_vec());
        }
        if let Some(new_name) = new_name {
            entity.name = new_name.to_string();
        }
        Ok(())
    }

    // Removal does not cascade: anything still referring to the removed name
    // fails with an Unknown* error when it is next used.

    pub fn remove_attribute(&mut self, name: &str) -> Result<AttributeDef, RuleError> {
        self.attributes.remove(name)
    }

    pub fn remove_action(&mut self, name: &str) -> Result<Action, RuleError> {
        self.actions.remove(name)
    }

    pub fn remove_entity(&mut self, name: &str) -> Result<Entity, RuleError> {
        self.entities.remove(name)
    }

    pub fn remove_event(&mut self, name: &str) -> Result<Event, RuleError> {
        self.events.remove(name)
    }

    /// Have `user_name` perform `action_name` on `target_names`.
    ///
    /// Either every effect lands or no entity changes.
    pub fn use_action(
        &mut self,
        user_name: &str,
        action_name: &str,
        target_names: &[&str],
    ) -> Result<ActionResult, RuleError> {
        let user = self
            .entities
            .get(user_name)
            .ok_or_else(|| RuleError::UnknownEntity(user_name.to_string()))?;
        let action = self
            .actions
            .get(action_name)
            .ok_or_else(|| RuleError::UnknownAction(action_name.to_string()))?;
        can_use(user, action)?;
        let targets = target_names
            .iter()
            .map(|name| {
                self.entities
                    .get(name)
                    .ok_or_else(|| RuleError::UnknownEntity(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let result = match apply_action(action, user, &targets) {
            Ok(result) => result,
            Err(err) => {
                warn!(user = user_name, action = action_name, %err, "action aborted");
                return Err(err);
            }
        };

        for entity in &result.entities {
            self.entities.replace(entity.clone())?;
        }
        info!(
            user = user_name,
            action = action_name,
            changes = result.applied.len(),
            skipped = result.skipped,
            "action committed"
        );
        Ok(result)
    }

    /// Run an event's script to its end condition and return the turn log.
    ///
    /// A failing turn aborts the run: the event is left `Finished` with the
    /// partial log and the error recorded, and the error is returned.
    pub fn start_event(&mut self, event_name: &str) -> Result<Vec<String>, RuleError> {
        let mut event = self
            .events
            .get(event_name)
            .cloned()
            .ok_or_else(|| RuleError::UnknownEvent(event_name.to_string()))?;
        if let Some(running) = &self.running_event {
            return Err(RuleError::EventAlreadyRunning(running.clone()));
        }
        if event.status == EventStatus::Finished {
            return Err(RuleError::EventFinished(event_name.to_string()));
        }

        self.running_event = Some(event.name.clone());
        event.status = EventStatus::Running;
        let outcome = run_event(self, &mut event);
        self.running_event = None;
        event.status = EventStatus::Finished;

        match &outcome {
            Ok(()) => info!(event = event_name, turns = event.turn_index, "event finished"),
            Err(err) => {
                warn!(event = event_name, turns = event.turn_index, %err, "event aborted");
                event.failure = Some(err.clone());
            }
        }
        let log = event.log.clone();
        self.events.replace(event)?;
        outcome.map(|()| log)
    }

    /// Return a finished event to `Idle` so it can be started again.
    pub fn reset_event(&mut self, event_name: &str) -> Result<(), RuleError> {
        let event = self
            .events
            .get_mut(event_name)
            .ok_or_else(|| RuleError::UnknownEvent(event_name.to_string()))?;
        event.reset();
        Ok(())
    }

    /// Extract the persisted shape of this rule set.
    pub fn to_snapshot(&self) -> RuleSetData {
        extract_snapshot(self)
    }

    /// Replace every table with the contents of `data`.
    ///
    /// The snapshot is validated exactly like the `define_*` operations; on
    /// error the current state is left untouched.
    pub fn from_snapshot(&mut self, data: &RuleSetData) -> Result<(), RuleError> {
        let world = build_world(data)?;
        info!(
            rule_set = %world.name,
            attributes = world.attributes.len(),
            actions = world.actions.len(),
            entities = world.entities.len(),
            events = world.events.len(),
            "rule set loaded"
        );
        *self = world;
        Ok(())
    }

    /// Save the rule set directly to a file path.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), LibraryError> {
        save_world_to_path(self, path)
    }

    /// Load a rule set directly from a file path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, LibraryError> {
        load_world_from_path(path)
    }
}
