// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stateful entity guard
//!
//! Wraps row inserts and updates for entity types that run a state machine.
//! The stored state is read, the proposed state validated, and the row
//! written together with its state-log entry in one store transaction, so a
//! rejected mutation writes nothing and two racing updates cannot both pass
//! against the same previous state.

use crate::cache::DefinitionCache;
use crate::error::GuardError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use stately_core::{
    check_kind, to_fields, validate_transition, Actor, Clock, MachineKey, NewRow,
    NewStateLogEntry, Row, RowUpdate, StateChange, StateMachineDefinition, Stateful, Transition,
    TransitionError,
};
use stately_storage::{RowDraft, Store, Transaction};

/// Outcome of an accepted mutation
#[derive(Debug, Clone, PartialEq)]
pub struct Committed {
    pub row: Row,
    pub transition: Transition,
    /// Id of the state-log entry, when the mutation changed state
    pub log_id: Option<u64>,
}

pub struct StatefulGuard<S: Store, C: Clock> {
    store: S,
    definitions: DefinitionCache<S, C>,
    clock: C,
}

impl<S: Store, C: Clock> Clone for StatefulGuard<S, C> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            definitions: self.definitions.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<S: Store, C: Clock> StatefulGuard<S, C> {
    pub fn new(store: S, definitions: DefinitionCache<S, C>, clock: C) -> Self {
        Self {
            store,
            definitions,
            clock,
        }
    }

    pub fn definitions(&self) -> &DefinitionCache<S, C> {
        &self.definitions
    }

    /// Create a row, assigning the definition's default state when none is given
    pub fn insert(
        &self,
        entity_type: &str,
        new: NewRow,
        actor: Actor,
    ) -> Result<Committed, GuardError> {
        let key = MachineKey::new(entity_type, new.kind.as_deref());
        let span = tracing::info_span!("guard.insert", entity_type, kind = %key.kind);
        let _guard = span.enter();

        let now = self.clock.utc_now();
        let result: Result<Committed, GuardError> = self.store.transact(|tx| {
            let definition = self.definition(tx, &key)?;
            let proposed = new.state.or_else(|| definition.default_state.clone());
            let transition = validate_transition(&definition, None, proposed.as_deref())?;

            let row = tx.insert_row(
                entity_type,
                RowDraft {
                    kind: key.kind.clone(),
                    stated_at: proposed.as_ref().map(|_| now),
                    machine_state: proposed,
                    fields: new.fields,
                    created_at: now,
                },
            );
            let log_id = record(tx, entity_type, row.id, &transition, actor, now);
            Ok(Committed {
                row,
                transition,
                log_id,
            })
        });

        report(&result);
        result
    }

    /// Update a row, validating any state change against the stored state
    pub fn update(
        &self,
        entity_type: &str,
        id: u64,
        update: RowUpdate,
        actor: Actor,
    ) -> Result<Committed, GuardError> {
        let span = tracing::info_span!("guard.update", entity_type, id);
        let _guard = span.enter();

        let now = self.clock.utc_now();
        let result: Result<Committed, GuardError> = self.store.transact(|tx| {
            let mut row = tx
                .row(entity_type, id)
                .ok_or_else(|| GuardError::RowNotFound {
                    entity_type: entity_type.to_string(),
                    id,
                })?;
            check_kind(&row.kind, update.kind.as_deref())?;

            let key = MachineKey::new(entity_type, Some(&row.kind));
            let definition = self.definition(tx, &key)?;
            let proposed = match update.state {
                StateChange::Keep => row.machine_state.clone(),
                StateChange::Set(state) => Some(state),
                StateChange::Clear => None,
            };
            let transition =
                validate_transition(&definition, row.machine_state.as_deref(), proposed.as_deref())?;

            if transition.is_recorded() {
                row.machine_state = proposed;
                row.stated_at = Some(now);
            }
            row.fields.extend(update.fields);
            row.updated_at = now;
            tx.update_row(entity_type, row.clone())?;

            let log_id = record(tx, entity_type, id, &transition, actor, now);
            Ok(Committed {
                row,
                transition,
                log_id,
            })
        });

        report(&result);
        result
    }

    /// Insert a typed entity, storing its serialized fields
    pub fn insert_entity<T: Stateful + Serialize>(
        &self,
        entity: &T,
        state: Option<&str>,
        actor: Actor,
    ) -> Result<Committed, GuardError> {
        let new = NewRow {
            kind: entity.machine_kind().map(str::to_string),
            state: state.map(str::to_string),
            fields: to_fields(entity)?,
        };
        self.insert(T::ENTITY_TYPE, new, actor)
    }

    /// Move a typed entity to `state`, refreshing its stored fields
    pub fn transition_entity<T: Stateful + Serialize>(
        &self,
        id: u64,
        entity: &T,
        state: &str,
        actor: Actor,
    ) -> Result<Committed, GuardError> {
        let update = RowUpdate {
            kind: entity.machine_kind().map(str::to_string),
            state: StateChange::Set(state.to_string()),
            fields: to_fields(entity)?,
        };
        self.update(T::ENTITY_TYPE, id, update, actor)
    }

    fn definition(
        &self,
        tx: &dyn Transaction,
        key: &MachineKey,
    ) -> Result<StateMachineDefinition, GuardError> {
        self.definitions
            .get_with(key, |key| Ok(tx.definition(key)))?
            .ok_or_else(|| TransitionError::MissingDefinition(key.clone()).into())
    }
}

/// Append the log entry for a recorded transition
fn record(
    tx: &mut dyn Transaction,
    entity_type: &str,
    entity_id: u64,
    transition: &Transition,
    actor: Actor,
    now: DateTime<Utc>,
) -> Option<u64> {
    let (old_state, new_state) = match transition {
        Transition::Enter { to } => (None, to.clone()),
        Transition::Move { from, to } => (Some(from.clone()), to.clone()),
        Transition::Unstated | Transition::Stay { .. } => return None,
    };
    Some(tx.append_log(NewStateLogEntry {
        entity_type: entity_type.to_string(),
        entity_id,
        old_state,
        new_state,
        actor,
        created_at: now,
    }))
}

fn report(result: &Result<Committed, GuardError>) {
    match result {
        Ok(committed) => tracing::info!(
            id = committed.row.id,
            state = committed.row.machine_state.as_deref().unwrap_or("-"),
            log_id = ?committed.log_id,
            "committed"
        ),
        Err(GuardError::Rejected(e)) => tracing::info!(code = e.code(), error = %e, "rejected"),
        Err(e) => tracing::error!(error = %e, "mutation failed"),
    }
}

#[cfg(test)]
#[path = "guard_tests.rs"]
mod tests;
