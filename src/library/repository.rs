use crate::core::world::World;
use crate::library::LibraryError;

/// One stored rule set as reported by `list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSetEntry {
    pub name: String,
    /// Backend-specific location (a file path, or a row key).
    pub location: String,
}

pub trait RuleSetRepository {
    fn list(&self) -> Result<Vec<RuleSetEntry>, LibraryError>;
    fn load(&self, name: &str) -> Result<World, LibraryError>;
    fn save(&mut self, world: &World) -> Result<(), LibraryError>;
    fn delete(&mut self, name: &str) -> Result<(), LibraryError>;
}

/// Rule-set names double as file names, so they must be non-empty and free of
/// path separators.
pub(crate) fn check_name(name: &str) -> Result<(), LibraryError> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed != name
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
    {
        return Err(LibraryError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_must_be_plain() {
        assert!(check_name("Hello").is_ok());
        assert!(check_name("Keith vs Logan").is_ok());
        for bad in ["", "  ", "a/b", "a\\b", "..", " padded"] {
            assert!(
                matches!(check_name(bad), Err(LibraryError::InvalidName(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
