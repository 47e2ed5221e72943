use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::GenerationError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationState {
    #[default]
    Idle,
    Generating,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationEvent {
    Requested,
    Completed,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("cannot apply {event:?} while {from:?}")]
pub struct SessionTransitionError {
    pub from: GenerationState,
    pub event: GenerationEvent,
}

pub fn transition(
    current: GenerationState,
    event: GenerationEvent,
) -> Result<GenerationState, SessionTransitionError> {
    match (current, event) {
        (GenerationState::Idle, GenerationEvent::Requested) => Ok(GenerationState::Generating),
        (GenerationState::Generating, GenerationEvent::Completed) => Ok(GenerationState::Idle),
        (from, event) => Err(SessionTransitionError { from, event }),
    }
}

/// Single-flight guard for one editing session.
#[derive(Debug, Default)]
pub struct GenerationGate {
    state: Mutex<GenerationState>,
}

impl GenerationGate {
    pub fn state(&self) -> GenerationState {
        match self.state.lock() {
            Ok(state) => *state,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Moves Idle -> Generating. The returned ticket moves the gate back to
    /// Idle when dropped, whatever the outcome of the generation.
    pub fn try_begin(&self) -> Result<GenerationTicket<'_>, GenerationError> {
        self.apply(GenerationEvent::Requested)
            .map(|_| GenerationTicket { gate: self })
            .map_err(|_| GenerationError::AlreadyGenerating)
    }

    fn apply(&self, event: GenerationEvent) -> Result<GenerationState, SessionTransitionError> {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        let next = transition(*state, event)?;
        *state = next;
        Ok(next)
    }
}

#[derive(Debug)]
pub struct GenerationTicket<'a> {
    gate: &'a GenerationGate,
}

impl Drop for GenerationTicket<'_> {
    fn drop(&mut self) {
        let _ = self.gate.apply(GenerationEvent::Completed);
    }
}

#[cfg(test)]
mod tests {
    use super::{transition, GenerationEvent, GenerationGate, GenerationState};
    use crate::errors::GenerationError;

    #[test]
    fn transitions_follow_idle_generating_cycle() {
        assert_eq!(
            transition(GenerationState::Idle, GenerationEvent::Requested),
            Ok(GenerationState::Generating)
        );
        assert_eq!(
            transition(GenerationState::Generating, GenerationEvent::Completed),
            Ok(GenerationState::Idle)
        );
        assert!(transition(GenerationState::Generating, GenerationEvent::Requested).is_err());
        assert!(transition(GenerationState::Idle, GenerationEvent::Completed).is_err());
    }

    #[test]
    fn second_request_is_rejected_while_generating() {
        let gate = GenerationGate::default();
        let ticket = gate.try_begin().expect("idle gate accepts a request");
        assert_eq!(gate.state(), GenerationState::Generating);

        let second = gate.try_begin();
        assert!(matches!(second, Err(GenerationError::AlreadyGenerating)));

        drop(ticket);
        assert_eq!(gate.state(), GenerationState::Idle);
        assert!(gate.try_begin().is_ok());
    }

    #[test]
    fn ticket_returns_gate_to_idle_on_early_exit() {
        let gate = GenerationGate::default();

        let attempt = || -> Result<(), GenerationError> {
            let _ticket = gate.try_begin()?;
            Err(GenerationError::EmptyResponse)
        };
        assert!(attempt().is_err());

        assert_eq!(gate.state(), GenerationState::Idle);
    }
}
