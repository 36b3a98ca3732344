use crate::rules::{Action, AttributeDef, Entity, RuleError, TableKind};
use crate::simulation::event::Event;

pub trait Named {
    fn name(&self) -> &str;
}

impl Named for AttributeDef {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Action {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Entity {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Event {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Insertion-ordered rows keyed by unique name.
#[derive(Debug, Clone)]
pub struct Table<T> {
    kind: TableKind,
    rows: Vec<T>,
}

impl<T: Named> Table<T> {
    pub fn new(kind: TableKind) -> Self {
        Self {
            kind,
            rows: Vec::new(),
        }
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.rows.iter().find(|row| row.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        self.rows.iter_mut().find(|row| row.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn ensure_vacant(&self, name: &str) -> Result<(), RuleError> {
        if self.contains(name) {
            return Err(RuleError::duplicate(self.kind, name));
        }
        Ok(())
    }

    pub fn insert(&mut self, row: T) -> Result<&T, RuleError> {
        self.ensure_vacant(row.name())?;
        self.rows.push(row);
        let last = self.rows.len() - 1;
        Ok(&self.rows[last])
    }

    /// Swap in a row with the same name, keeping its position.
    pub fn replace(&mut self, row: T) -> Result<(), RuleError> {
        let kind = self.kind;
        let slot = self
            .get_mut(row.name())
            .ok_or_else(|| RuleError::not_found(kind, row.name()))?;
        *slot = row;
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<T, RuleError> {
        let idx = self
            .rows
            .iter()
            .position(|row| row.name() == name)
            .ok_or_else(|| RuleError::not_found(self.kind, name))?;
        Ok(self.rows.remove(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.rows.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.rows.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
