use crate::rules::attributes::{AttributeValue, Value, ValueKind};

/// A participant in the rule set. Owns its attribute values; actions are
/// referenced by name into the world's action table.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub name: String,
    attributes: Vec<AttributeValue>,
    actions: Vec<String>,
}

impl Entity {
    pub fn new(
        name: impl Into<String>,
        attributes: Vec<AttributeValue>,
        actions: Vec<String>,
    ) -> Self {
        let mut entity = Self {
            name: name.into(),
            attributes: Vec::new(),
            actions: Vec::new(),
        };
        entity.set_attributes(attributes);
        entity.set_actions(actions);
        entity
    }

    pub fn attributes(&self) -> &[AttributeValue] {
        &self.attributes
    }

    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.iter().find(|a| a.attribute == name)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.attribute(name).map(|a| &a.value)
    }

    pub fn has_action(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a == action)
    }

    /// Overwrite the value of an existing attribute. Returns the previous
    /// value, or `None` when the entity has no such attribute.
    pub(crate) fn replace_value(&mut self, name: &str, value: Value) -> Option<Value> {
        let slot = self.attributes.iter_mut().find(|a| a.attribute == name)?;
        Some(std::mem::replace(&mut slot.value, value))
    }

    /// Update the kind recorded on this entity's value for `attribute`. The
    /// value itself is left as is.
    pub(crate) fn relabel(&mut self, attribute: &str, kind: ValueKind) {
        if let Some(slot) = self.attributes.iter_mut().find(|a| a.attribute == attribute) {
            slot.kind = kind;
        }
    }

    pub(crate) fn set_attributes(&mut self, attributes: Vec<AttributeValue>) {
        self.attributes = attributes;
    }

    /// Action names form a set; repeats keep their first position.
    pub(crate) fn set_actions(&mut self, actions: Vec<String>) {
        self.actions.clear();
        for action in actions {
            if !self.has_action(&action) {
                self.actions.push(action);
            }
        }
    }

    /// One-line `name attr: value` rendering used by the console.
    pub fn display(&self, attribute: &str) -> Option<String> {
        self.value(attribute)
            .map(|value| format!("{} {}: {}", self.name, attribute, value))
    }
}
