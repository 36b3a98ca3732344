use std::fs;
use std::path::{Path, PathBuf};

use bevy_utils::tracing::{debug, info};
use serde::{Deserialize, Serialize};

use crate::core::serialization::{
    build_world, load_world_from_path, parse_rule_set, save_world_to_path,
};
use crate::core::world::World;
use crate::library::repository::{check_name, RuleSetEntry, RuleSetRepository};
use crate::library::LibraryError;

const GAMES_DIR: &str = "games";
const INDEX_FILE: &str = "global.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LibraryIndex {
    #[serde(default)]
    games: Vec<IndexEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    name: String,
    path: String,
}

/// A directory of rule-set documents: `games/<name>.json` plus a
/// `global.json` index of everything stored.
#[derive(Debug, Clone)]
pub struct JsonLibrary {
    root: PathBuf,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> LibraryError + '_ {
    move |source| LibraryError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl JsonLibrary {
    /// Open (creating if needed) a library rooted at `root`. The index is
    /// rebuilt from the games directory so it never lists stale files.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, LibraryError> {
        let library = Self {
            root: root.as_ref().to_path_buf(),
        };
        let games = library.games_dir();
        fs::create_dir_all(&games).map_err(io_error(&games))?;
        library.rebuild_index()?;
        info!(root = %library.root.display(), "json library opened");
        Ok(library)
    }

    fn games_dir(&self) -> PathBuf {
        self.root.join(GAMES_DIR)
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    fn game_path(&self, name: &str) -> PathBuf {
        self.games_dir().join(format!("{name}.json"))
    }

    fn scan(&self) -> Result<Vec<IndexEntry>, LibraryError> {
        let games = self.games_dir();
        let mut entries = Vec::new();
        for entry in fs::read_dir(&games).map_err(io_error(&games))? {
            let path = entry.map_err(io_error(&games))?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            entries.push(IndexEntry {
                name: name.to_string(),
                path: format!("{GAMES_DIR}/{name}.json"),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn rebuild_index(&self) -> Result<(), LibraryError> {
        let index = LibraryIndex {
            games: self.scan()?,
        };
        let path = self.index_path();
        let json = serde_json::to_string_pretty(&index).map_err(|source| LibraryError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(io_error(&path))?;
        debug!(games = index.games.len(), "library index rebuilt");
        Ok(())
    }

    fn read_index(&self) -> Result<LibraryIndex, LibraryError> {
        let path = self.index_path();
        let data = fs::read_to_string(&path).map_err(io_error(&path))?;
        serde_json::from_str(&data).map_err(|source| LibraryError::Json { path, source })
    }

    /// Import a rule-set document from anywhere on disk into the library.
    pub fn import(&mut self, path: impl AsRef<Path>) -> Result<World, LibraryError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(io_error(path))?;
        let snapshot = parse_rule_set(&data).map_err(|source| LibraryError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        let world = build_world(&snapshot)?;
        self.save(&world)?;
        Ok(world)
    }
}

impl RuleSetRepository for JsonLibrary {
    fn list(&self) -> Result<Vec<RuleSetEntry>, LibraryError> {
        Ok(self
            .read_index()?
            .games
            .into_iter()
            .map(|entry| RuleSetEntry {
                name: entry.name,
                location: entry.path,
            })
            .collect())
    }

    fn load(&self, name: &str) -> Result<World, LibraryError> {
        check_name(name)?;
        let path = self.game_path(name);
        if !path.exists() {
            return Err(LibraryError::NotFound(name.to_string()));
        }
        let world = load_world_from_path(&path)?;
        info!(rule_set = name, path = %path.display(), "rule set loaded");
        Ok(world)
    }

    fn save(&mut self, world: &World) -> Result<(), LibraryError> {
        check_name(world.name())?;
        let path = self.game_path(world.name());
        save_world_to_path(world, &path)?;
        self.rebuild_index()?;
        info!(rule_set = world.name(), path = %path.display(), "rule set saved");
        Ok(())
    }

    fn delete(&mut self, name: &str) -> Result<(), LibraryError> {
        check_name(name)?;
        let path = self.game_path(name);
        if !path.exists() {
            return Err(LibraryError::NotFound(name.to_string()));
        }
        fs::remove_file(&path).map_err(io_error(&path))?;
        self.rebuild_index()?;
        info!(rule_set = name, "rule set deleted");
        Ok(())
    }
}
