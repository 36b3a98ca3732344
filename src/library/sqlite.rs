use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use bevy_utils::tracing::info;
use rusqlite::{params, Connection, OptionalExtension};

use crate::core::serialization::{build_world, parse_rule_set, save_world_to_json};
use crate::core::world::World;
use crate::library::repository::{check_name, RuleSetEntry, RuleSetRepository};
use crate::library::LibraryError;

const LIBRARY_SCHEMA_VERSION: i64 = 1;

const LIBRARY_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS library_meta (
  id INTEGER PRIMARY KEY CHECK (id = 1),
  schema_version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS rule_sets (
  name TEXT PRIMARY KEY,
  document TEXT NOT NULL,
  updated_at INTEGER NOT NULL
);
"#;

/// Rule sets stored as JSON documents in a single SQLite file.
pub struct SqliteLibrary {
    conn: Connection,
    path: PathBuf,
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or(0)
}

impl SqliteLibrary {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LibraryError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)?;
        let mut library = Self { conn, path };
        library.conn.execute_batch(LIBRARY_SCHEMA)?;
        library.ensure_library_meta()?;
        info!(path = %library.path.display(), "sqlite library opened");
        Ok(library)
    }

    fn ensure_library_meta(&mut self) -> Result<(), LibraryError> {
        let version = self
            .conn
            .query_row(
                "SELECT schema_version FROM library_meta WHERE id = 1",
                [],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;

        match version {
            Some(LIBRARY_SCHEMA_VERSION) => {}
            Some(other) => {
                return Err(LibraryError::InvalidData(format!(
                    "library_meta version mismatch (found {}, expected {})",
                    other, LIBRARY_SCHEMA_VERSION
                )));
            }
            None => {
                self.conn.execute(
                    "INSERT INTO library_meta (id, schema_version) VALUES (1, ?1)",
                    params![LIBRARY_SCHEMA_VERSION],
                )?;
            }
        }
        Ok(())
    }

    fn load_document(&self, name: &str) -> Result<Option<String>, LibraryError> {
        Ok(self
            .conn
            .query_row(
                "SELECT document FROM rule_sets WHERE name = ?1",
                params![name],
                |row| row.get::<_, String>(0),
            )
            .optional()?)
    }
}

impl RuleSetRepository for SqliteLibrary {
    fn list(&self) -> Result<Vec<RuleSetEntry>, LibraryError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM rule_sets ORDER BY name")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut entries = Vec::new();
        for row in rows {
            let name = row?;
            entries.push(RuleSetEntry {
                location: format!("{}#{}", self.path.display(), name),
                name,
            });
        }
        Ok(entries)
    }

    fn load(&self, name: &str) -> Result<World, LibraryError> {
        check_name(name)?;
        let document = self
            .load_document(name)?
            .ok_or_else(|| LibraryError::NotFound(name.to_string()))?;
        let snapshot = parse_rule_set(&document).map_err(|source| LibraryError::Json {
            path: self.path.clone(),
            source,
        })?;
        let world = build_world(&snapshot)?;
        info!(rule_set = name, "rule set loaded from sqlite");
        Ok(world)
    }

    fn save(&mut self, world: &World) -> Result<(), LibraryError> {
        check_name(world.name())?;
        let document = save_world_to_json(world).map_err(|source| LibraryError::Json {
            path: self.path.clone(),
            source,
        })?;
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO rule_sets (name, document, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET document = excluded.document, updated_at = excluded.updated_at",
            params![world.name(), document, unix_now()],
        )?;
        tx.commit()?;
        info!(rule_set = world.name(), "rule set saved to sqlite");
        Ok(())
    }

    fn delete(&mut self, name: &str) -> Result<(), LibraryError> {
        check_name(name)?;
        let removed = self
            .conn
            .execute("DELETE FROM rule_sets WHERE name = ?1", params![name])?;
        if removed == 0 {
            return Err(LibraryError::NotFound(name.to_string()));
        }
        info!(rule_set = name, "rule set deleted from sqlite");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{AttributeValue, Effect, Modifier, Scope, ValueExpr, ValueKind};

    fn sample(name: &str, hp: i32) -> World {
        let mut world = World::new(name);
        world.define_attribute("HP", ValueKind::Number).unwrap();
        world
            .define_action(
                "Heal",
                vec![Effect::new("HP", Scope::SelfTarget, Modifier::Add, ValueExpr::literal(5))],
            )
            .unwrap();
        world
            .define_entity(
                "Keith",
                &[AttributeValue::new("HP", ValueKind::Number, hp)],
                &["Heal".to_string()],
            )
            .unwrap();
        world
    }

    #[test]
    fn save_overwrites_and_load_validates() {
        let dir = tempfile::tempdir().unwrap();
        let mut library = SqliteLibrary::open(dir.path().join("library.db")).unwrap();
        library.save(&sample("Hello", 30)).unwrap();
        library.save(&sample("Hello", 12)).unwrap();

        assert_eq!(library.list().unwrap().len(), 1);
        let loaded = library.load("Hello").unwrap();
        assert_eq!(loaded.to_snapshot(), sample("Hello", 12).to_snapshot());
    }

    #[test]
    fn reopening_keeps_rule_sets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.db");
        {
            let mut library = SqliteLibrary::open(&path).unwrap();
            library.save(&sample("B", 1)).unwrap();
            library.save(&sample("A", 2)).unwrap();
        }
        let library = SqliteLibrary::open(&path).unwrap();
        let names: Vec<String> = library.list().unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn missing_rule_sets_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut library = SqliteLibrary::open(dir.path().join("library.db")).unwrap();
        assert!(matches!(
            library.load("Nope"),
            Err(LibraryError::NotFound(_))
        ));
        assert!(matches!(
            library.delete("Nope"),
            Err(LibraryError::NotFound(_))
        ));
        library.save(&sample("Gone", 1)).unwrap();
        library.delete("Gone").unwrap();
        assert!(library.list().unwrap().is_empty());
    }
}
