use tabletop_rules::library::{JsonLibrary, RuleSetRepository, SqliteLibrary};
use tabletop_rules::rules::{
    AttributeValue, Combine, Comparator, Condition, ConditionOwner, Effect, Modifier, Owner,
    Scope, Value, ValueExpr, ValueKind,
};
use tabletop_rules::{EndCondition, EventStatus, RuleError, TurnUnit, World};

fn skirmish() -> World {
    let mut world = World::new("Skirmish");
    world.define_attribute("HP", ValueKind::Number).unwrap();
    world.define_attribute("Power", ValueKind::Number).unwrap();
    world.define_attribute("Cond", ValueKind::Text).unwrap();

    world
        .define_action(
            "Strike",
            vec![Effect::new(
                "HP",
                Scope::SingleTarget,
                Modifier::Add,
                ValueExpr::AttributeBased {
                    source_attribute: "Power".to_string(),
                    owner: Owner::User,
                    combine: Combine::Multiply,
                    operand: -1.0,
                    flat: None,
                },
            )],
        )
        .unwrap();
    world
        .define_action(
            "Rally",
            vec![
                Effect::new("Power", Scope::MultiTarget, Modifier::Multiply, ValueExpr::literal(2))
                    .when(Condition {
                        attribute: "Cond".to_string(),
                        owner: ConditionOwner::Target,
                        comparator: Comparator::Eq,
                        value: Value::Text("OK".to_string()),
                    }),
            ],
        )
        .unwrap();

    for (name, hp, power, cond) in [("Keith", 30, 5, "OK"), ("Logan", 25, 10, "OK"), ("Mara", 20, 3, "Bad")] {
        world
            .define_entity(
                name,
                &[
                    AttributeValue::new("HP", ValueKind::Number, hp),
                    AttributeValue::new("Power", ValueKind::Number, power),
                    AttributeValue::new("Cond", ValueKind::Text, cond),
                ],
                &["Strike".to_string(), "Rally".to_string()],
            )
            .unwrap();
    }
    world
}

fn number(world: &World, entity: &str, attribute: &str) -> f64 {
    world
        .entity(entity)
        .and_then(|e| e.value(attribute))
        .and_then(Value::as_number)
        .unwrap()
}

#[test]
fn multi_target_condition_is_checked_per_target() {
    let mut world = skirmish();
    let result = world.use_action("Keith", "Rally", &["Logan", "Mara"]).unwrap();

    assert_eq!(result.skipped, 1);
    assert_eq!(number(&world, "Logan", "Power"), 20.0);
    assert_eq!(number(&world, "Mara", "Power"), 3.0);
    assert_eq!(number(&world, "Keith", "Power"), 5.0);
}

#[test]
fn attribute_based_damage_reads_the_user() {
    let mut world = skirmish();
    world.use_action("Logan", "Strike", &["Keith"]).unwrap();
    assert_eq!(number(&world, "Keith", "HP"), 20.0);
}

#[test]
fn missing_target_changes_nothing() {
    let mut world = skirmish();
    let before = world.to_snapshot();
    assert_eq!(
        world.use_action("Keith", "Strike", &[]).unwrap_err(),
        RuleError::MissingTarget {
            action: "Strike".to_string()
        }
    );
    assert_eq!(world.to_snapshot(), before);
}

#[test]
fn duel_runs_until_a_participant_falls() {
    let mut world = skirmish();
    world
        .define_event(
            "Duel",
            vec!["Keith".to_string(), "Logan".to_string()],
            vec![
                TurnUnit::Speech {
                    speaker: "Logan".to_string(),
                    text: "En garde".to_string(),
                },
                TurnUnit::Action {
                    user: "Logan".to_string(),
                    action: "Strike".to_string(),
                    targets: vec!["Keith".to_string()],
                },
                TurnUnit::Action {
                    user: "Logan".to_string(),
                    action: "Strike".to_string(),
                    targets: vec!["Keith".to_string()],
                },
                TurnUnit::Action {
                    user: "Logan".to_string(),
                    action: "Strike".to_string(),
                    targets: vec!["Keith".to_string()],
                },
                TurnUnit::Speech {
                    speaker: "Keith".to_string(),
                    text: "never reached".to_string(),
                },
            ],
            EndCondition::ParticipantAttribute {
                participant: "Keith".to_string(),
                attribute: "HP".to_string(),
                comparator: Comparator::Le,
                value: Value::Number(0.0),
            },
        )
        .unwrap();

    let log = world.start_event("Duel").unwrap();
    assert_eq!(log.len(), 4);
    assert_eq!(log[0], "1| Logan said 'En garde'");
    assert_eq!(log[3], "4| Logan used Strike on Keith");
    assert_eq!(number(&world, "Keith", "HP"), 0.0);

    let event = world.event("Duel").unwrap();
    assert_eq!(event.status(), EventStatus::Finished);
    assert!(event.failure().is_none());
}

#[test]
fn played_rule_set_survives_both_libraries() {
    let mut world = skirmish();
    world.use_action("Logan", "Strike", &["Keith"]).unwrap();
    let expected = world.to_snapshot();

    let dir = tempfile::tempdir().unwrap();
    let mut json = JsonLibrary::open(dir.path().join("data")).unwrap();
    json.save(&world).unwrap();
    assert_eq!(json.load("Skirmish").unwrap().to_snapshot(), expected);

    let mut sqlite = SqliteLibrary::open(dir.path().join("library.db")).unwrap();
    sqlite.save(&world).unwrap();
    assert_eq!(sqlite.load("Skirmish").unwrap().to_snapshot(), expected);
    assert_eq!(number(&sqlite.load("Skirmish").unwrap(), "Keith", "HP"), 20.0);
}

#[test]
fn hand_written_document_loads() {
    let document = r#"{
        "name": "Hello",
        "attributes": [
            {"name": "HP", "value type": "num"},
            {"name": "Cond", "value type": "alpha"}
        ],
        "actions": [
            {"name": "Boom", "effects": [
                {"attribute": "Cond", "effect type": "st", "modifier": "=", "value": "Bad", "condition": null}
            ]}
        ],
        "entities": [
            {"name": "Keith", "attributes": [
                {"name": "HP", "value type": "num", "value": 30},
                {"name": "Cond", "value type": "alpha", "value": "OK"}
            ], "actions": ["Boom"]},
            {"name": "Logan", "attributes": [
                {"name": "HP", "value type": "num", "value": 30},
                {"name": "Cond", "value type": "alpha", "value": "OK"}
            ], "actions": ["Boom"]}
        ]
    }"#;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hello.json");
    std::fs::write(&path, document).unwrap();

    let mut world = World::load_from_path(&path).unwrap();
    world.use_action("Keith", "Boom", &["Logan"]).unwrap();
    assert_eq!(
        world.entity("Logan").and_then(|e| e.display("Cond")),
        Some("Logan Cond: Bad".to_string())
    );
    assert_eq!(
        world.entity("Keith").and_then(|e| e.display("Cond")),
        Some("Keith Cond: OK".to_string())
    );
}
