// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn order_machine() -> StateMachineDefinition {
    StateMachineDefinition::new("order", ["placed", "paid", "shipped", "cancelled"])
        .with_entry_states(["placed"])
        .with_default_state("placed")
        .with_transition("placed", "paid")
        .with_transition("paid", "shipped")
        .with_transition("placed", "cancelled")
}

#[test]
fn well_formed_definition_validates() {
    assert_eq!(order_machine().validate(), Ok(()));
}

#[test]
fn key_uses_default_kind_unless_set() {
    assert_eq!(order_machine().key(), MachineKey::new("order", None));
    assert_eq!(
        order_machine().with_kind("wholesale").key(),
        MachineKey::new("order", Some("wholesale"))
    );
    assert_eq!(MachineKey::new("order", None).to_string(), "order/default");
}

#[test]
fn missing_entry_states_allow_any_defined_state() {
    let machine = StateMachineDefinition::new("ticket", ["open", "closed"]);
    assert!(machine.is_entry_state("closed"));
    assert!(!machine.is_entry_state("archived"));
}

#[test]
fn missing_transitions_allow_any_move_between_states() {
    let machine = StateMachineDefinition::new("ticket", ["open", "closed"]);
    assert!(machine.permits("open", "closed"));
    assert!(machine.permits("closed", "open"));
    assert!(!machine.permits("open", "archived"));
}

#[test]
fn explicit_transitions_are_directional() {
    let machine = order_machine();
    assert!(machine.permits("placed", "paid"));
    assert!(!machine.permits("paid", "placed"));
    assert!(!machine.permits("placed", "shipped"));
}

#[parameterized(
    no_states = { StateMachineDefinition::new("x", Vec::<String>::new()), DefinitionError::NoStates },
    empty_state = { StateMachineDefinition::new("x", ["a", ""]), DefinitionError::EmptyState },
    duplicate_state = {
        StateMachineDefinition::new("x", ["a", "a"]),
        DefinitionError::DuplicateState("a".to_string())
    },
    empty_entity = { StateMachineDefinition::new("", ["a"]), DefinitionError::EmptyEntity },
    unknown_from = {
        StateMachineDefinition::new("x", ["a", "b"]).with_transition("z", "b"),
        DefinitionError::UnknownMovementState { field: "from", state: "z".to_string() }
    },
    unknown_to = {
        StateMachineDefinition::new("x", ["a", "b"]).with_transition("a", "z"),
        DefinitionError::UnknownMovementState { field: "to", state: "z".to_string() }
    },
    empty_from = {
        StateMachineDefinition::new("x", ["a", "b"]).with_transition("", "b"),
        DefinitionError::EmptyMovement { field: "from" }
    },
    unknown_entry = {
        StateMachineDefinition::new("x", ["a", "b"]).with_entry_states(["c"]),
        DefinitionError::UnknownEntryState("c".to_string())
    },
    unknown_default = {
        StateMachineDefinition::new("x", ["a", "b"]).with_default_state("c"),
        DefinitionError::UnknownDefaultState("c".to_string())
    },
    default_outside_entry = {
        StateMachineDefinition::new("x", ["a", "b"])
            .with_entry_states(["a"])
            .with_default_state("b"),
        DefinitionError::DefaultNotEntry("b".to_string())
    },
)]
fn malformed_definitions_are_rejected(machine: StateMachineDefinition, expected: DefinitionError) {
    assert_eq!(machine.validate(), Err(expected));
}

#[test]
fn definition_deserializes_from_json_with_default_kind() {
    let json = r#"{
        "entity": "order",
        "states": ["placed", "paid"],
        "entry_states": ["placed"],
        "transitions": [{"from": "placed", "to": "paid"}]
    }"#;

    let machine: StateMachineDefinition = serde_json::from_str(json).unwrap();

    assert_eq!(machine.kind, DEFAULT_KIND);
    assert_eq!(machine.default_state, None);
    assert_eq!(machine.transitions, Some(vec![Movement::new("placed", "paid")]));
    assert_eq!(machine.validate(), Ok(()));
}
