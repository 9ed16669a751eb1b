//! Lifecycle tag shared by every handle-typed object.
//!
//! ```text
//! Uncreated ──create/build──▶ Live ──destroy──▶ Destroyed
//! ```
//!
//! `Destroyed` is terminal. Any operation other than create/build on a
//! non-live handle fails with [`AmgError::InvalidState`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AmgError, AmgResult};

/// Lifecycle phase of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Not yet created or built.
    Uncreated,
    /// Usable.
    Live,
    /// Released; terminal.
    Destroyed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Uncreated => "uncreated",
            Phase::Live => "live",
            Phase::Destroyed => "destroyed",
        })
    }
}

/// Single-owner slot holding a handle's resource while it is live.
///
/// Dropping the slot drops the resource, so release happens on every
/// exit path even when `destroy` is never called.
#[derive(Debug)]
pub enum HandleState<T> {
    /// No resource yet.
    Uncreated,
    /// Resource acquired.
    Live(T),
    /// Resource released.
    Destroyed,
}

impl<T> Default for HandleState<T> {
    fn default() -> Self {
        Self::Uncreated
    }
}

impl<T> HandleState<T> {
    /// Current phase.
    pub fn phase(&self) -> Phase {
        match self {
            Self::Uncreated => Phase::Uncreated,
            Self::Live(_) => Phase::Live,
            Self::Destroyed => Phase::Destroyed,
        }
    }

    /// Returns true while the resource is held.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live(_))
    }

    /// Borrows the live resource or reports the phase it is in.
    pub fn live(&self, object: &'static str, operation: &'static str) -> AmgResult<&T> {
        match self {
            Self::Live(value) => Ok(value),
            other => Err(AmgError::InvalidState {
                object,
                operation,
                phase: other.phase(),
            }),
        }
    }

    /// Mutable counterpart of [`HandleState::live`].
    pub fn live_mut(
        &mut self,
        object: &'static str,
        operation: &'static str,
    ) -> AmgResult<&mut T> {
        let phase = self.phase();
        match self {
            Self::Live(value) => Ok(value),
            _ => Err(AmgError::InvalidState {
                object,
                operation,
                phase,
            }),
        }
    }

    /// Checks that the slot can accept a resource. Only `Uncreated` can.
    pub fn ensure_uncreated(&self, object: &'static str, operation: &'static str) -> AmgResult<()> {
        match self {
            Self::Uncreated => Ok(()),
            other => Err(AmgError::InvalidState {
                object,
                operation,
                phase: other.phase(),
            }),
        }
    }

    /// Moves `Uncreated → Live`.
    pub fn activate(
        &mut self,
        value: T,
        object: &'static str,
        operation: &'static str,
    ) -> AmgResult<()> {
        self.ensure_uncreated(object, operation)?;
        *self = Self::Live(value);
        Ok(())
    }

    /// Moves `Live → Destroyed`, handing the resource back so the caller
    /// controls when it is dropped.
    pub fn take_for_destroy(&mut self, object: &'static str) -> AmgResult<T> {
        match std::mem::replace(self, Self::Destroyed) {
            Self::Live(value) => Ok(value),
            previous => {
                let phase = previous.phase();
                *self = previous;
                Err(AmgError::InvalidState {
                    object,
                    operation: "destroy",
                    phase,
                })
            }
        }
    }
}
