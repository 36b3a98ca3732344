use std::env;
use std::io::{self, Write};
use std::process;

use tracing_subscriber::EnvFilter;

use tabletop_rules::config::AppConfig;
use tabletop_rules::core::serialization::load_world_from_path;
use tabletop_rules::library::{JsonLibrary, LibraryError, RuleSetRepository, SqliteLibrary};
use tabletop_rules::rules::ValueKind;
use tabletop_rules::ui::authoring::{render_entity, render_event, render_rule_set_summary};
use tabletop_rules::ui::console::{parse_effect, parse_entity_args, parse_table, remove};
use tabletop_rules::World;

const COMMANDS: &str = "Commands: list | new <name> | open <name> | import <path> | save | delete <name> | rename <name> | summary | show <entity> | attr <entity> <attribute> | define <attribute> <num|alpha|bool|percent> | action <name> <attribute:scope:modifier:value>... | entity <name> [attribute=value...] [+action...] | remove <attribute|action|entity|event> <name> | use <user> <action> [targets...] | event <start|show|reset> <name> | quit";

fn open_library(config: &AppConfig) -> Result<Box<dyn RuleSetRepository>, LibraryError> {
    Ok(match &config.sqlite {
        Some(path) => Box::new(SqliteLibrary::open(path)?),
        None => Box::new(JsonLibrary::open(&config.data_dir)?),
    })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = match AppConfig::from_args(env::args().skip(1)) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}. Usage: [--data <dir>] [--sqlite <file>] [--open <name>]", err);
            process::exit(2);
        }
    };
    let mut library = match open_library(&config) {
        Ok(library) => library,
        Err(err) => {
            eprintln!("Failed to open rule-set library: {}", err);
            process::exit(1);
        }
    };

    println!("Tabletop rules console");
    let mut world = match &config.open {
        Some(name) => match library.load(name) {
            Ok(world) => {
                println!("Opened {}", world.name());
                world
            }
            Err(err) => {
                println!("Could not open {}: {}", name, err);
                World::new("Untitled")
            }
        },
        None => World::new("Untitled"),
    };

    println!("{}", COMMANDS);
    loop {
        print!("{}> ", world.name());
        if io::stdout().flush().is_err() {
            break;
        }

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let cmd = parts.next().unwrap_or("").to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" => break,
            "help" => println!("{}", COMMANDS),
            "list" => match library.list() {
                Ok(entries) if entries.is_empty() => println!("No saved rule sets."),
                Ok(entries) => {
                    for entry in entries {
                        println!("  {} ({})", entry.name, entry.location);
                    }
                }
                Err(err) => println!("List failed: {}", err),
            },
            "new" => match parts.next() {
                Some(name) => {
                    world = World::new(name);
                    println!("Started empty rule set {}", name);
                }
                None => println!("Usage: new <name>"),
            },
            "open" => match parts.next() {
                Some(name) => match library.load(name) {
                    Ok(loaded) => {
                        world = loaded;
                        println!("Opened {}", world.name());
                    }
                    Err(err) => println!("Open failed: {}", err),
                },
                None => println!("Usage: open <name>"),
            },
            "import" => match parts.next() {
                Some(path) => match load_world_from_path(path) {
                    Ok(loaded) => match library.save(&loaded) {
                        Ok(()) => {
                            world = loaded;
                            println!("Imported {}", world.name());
                        }
                        Err(err) => println!("Import failed: {}", err),
                    },
                    Err(err) => println!("Import failed: {}", err),
                },
                None => println!("Usage: import <path>"),
            },
            "save" => match library.save(&world) {
                Ok(()) => println!("Saved {}", world.name()),
                Err(err) => println!("Save failed: {}", err),
            },
            "delete" => match parts.next() {
                Some(name) => match library.delete(name) {
                    Ok(()) => println!("Deleted {}", name),
                    Err(err) => println!("Delete failed: {}", err),
                },
                None => println!("Usage: delete <name>"),
            },
            "rename" => match parts.next() {
                Some(name) => {
                    world.rename(name);
                    println!("Rule set renamed to {}", name);
                }
                None => println!("Usage: rename <name>"),
            },
            "summary" => print!("{}", render_rule_set_summary(&world)),
            "show" => match parts.next().and_then(|name| world.entity(name)) {
                Some(entity) => print!("{}", render_entity(entity)),
                None => println!("Usage: show <entity>"),
            },
            "attr" => match (parts.next(), parts.next()) {
                (Some(entity), Some(attribute)) => {
                    match world.entity(entity).and_then(|e| e.display(attribute)) {
                        Some(line) => println!("{}", line),
                        None => println!("{} has no attribute {}", entity, attribute),
                    }
                }
                _ => println!("Usage: attr <entity> <attribute>"),
            },
            "define" => match (parts.next(), parts.next()) {
                (Some(name), Some(kind)) => match kind.parse::<ValueKind>() {
                    Ok(kind) => match world.define_attribute(name, kind) {
                        Ok(def) => println!("Defined {}: {}", def.name, def.kind),
                        Err(err) => println!("Define failed: {}", err),
                    },
                    Err(err) => println!("{}", err),
                },
                _ => println!("Usage: define <attribute> <num|alpha|bool|percent>"),
            },
            "action" => match parts.next() {
                Some(name) => {
                    let effects: Result<Vec<_>, _> = parts.map(parse_effect).collect();
                    match effects {
                        Ok(effects) => match world.define_action(name, effects) {
                            Ok(action) => {
                                println!("Defined {} ({} effect(s))", action.name, action.effects.len())
                            }
                            Err(err) => println!("Define failed: {}", err),
                        },
                        Err(err) => println!("{}", err),
                    }
                }
                None => println!("Usage: action <name> <attribute:scope:modifier:value>..."),
            },
            "entity" => match parts.next() {
                Some(name) => {
                    let tokens: Vec<&str> = parts.collect();
                    match parse_entity_args(&world, &tokens) {
                        Ok((values, actions)) => match world.define_entity(name, &values, &actions) {
                            Ok(entity) => print!("{}", render_entity(entity)),
                            Err(err) => println!("Define failed: {}", err),
                        },
                        Err(err) => println!("{}", err),
                    }
                }
                None => println!("Usage: entity <name> [attribute=value...] [+action...]"),
            },
            "remove" => match (parts.next(), parts.next()) {
                (Some(table), Some(name)) => {
                    match parse_table(table).and_then(|table| remove(&mut world, table, name)) {
                        Ok(()) => println!("Removed {} {}", table, name),
                        Err(err) => println!("Remove failed: {}", err),
                    }
                }
                _ => println!("Usage: remove <attribute|action|entity|event> <name>"),
            },
            "use" => match (parts.next(), parts.next()) {
                (Some(user), Some(action)) => {
                    let targets: Vec<&str> = parts.collect();
                    match world.use_action(user, action, &targets) {
                        Ok(result) => {
                            for change in &result.applied {
                                println!(
                                    "  {} {}: {} -> {}",
                                    change.entity, change.attribute, change.before, change.after
                                );
                            }
                            if result.skipped > 0 {
                                println!("  ({} effect(s) skipped by conditions)", result.skipped);
                            }
                        }
                        Err(err) => println!("Action failed: {}", err),
                    }
                }
                _ => println!("Usage: use <user> <action> [targets...]"),
            },
            "event" => match (parts.next(), parts.next()) {
                (Some("start"), Some(name)) => match world.start_event(name) {
                    Ok(log) => {
                        for line in log {
                            println!("{}", line);
                        }
                        println!("Event {} finished", name);
                    }
                    Err(err) => {
                        if let Some(event) = world.event(name) {
                            for line in event.log() {
                                println!("{}", line);
                            }
                        }
                        println!("Event failed: {}", err);
                    }
                },
                (Some("show"), Some(name)) => match world.event(name) {
                    Some(event) => {
                        print!("{}", render_event(event));
                        for line in event.log() {
                            println!("    {}", line);
                        }
                    }
                    None => println!("No event named {}", name),
                },
                (Some("reset"), Some(name)) => match world.reset_event(name) {
                    Ok(()) => println!("Event {} reset", name),
                    Err(err) => println!("Reset failed: {}", err),
                },
                _ => println!("Usage: event <start|show|reset> <name>"),
            },
            _ => println!("Unknown command. Type 'help' for commands."),
        }
    }
}
