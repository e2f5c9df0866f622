//! # Managed Link State Machine
//!
//! Lifecycle of the managed bus client/session/sender triple. A failed send
//! always passes through `Reconnecting`: the triple is torn down and rebuilt
//! before anything else is sent on it.
//!
//! ```text
//!            SendStarted              SendFailed
//! Connected ────────────► Sending ──────────────► Reconnecting
//!     ▲                      │                     │        │
//!     └──── SendSucceeded ───┘                     │        │ RebuildFailed
//!     ▲                                            │        ▼
//!     └─────────────────── Rebuilt ────────────────┘      Failed
//!                                                           │
//!                       Reconnecting ◄── ReconnectStarted ──┘
//! ```

use std::fmt;

use super::BusError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkPhase {
    /// Triple is up and idle
    Connected,
    /// A send is in flight
    Sending,
    /// Old triple torn down, new one being built
    Reconnecting,
    /// No triple exists
    Failed,
}

impl fmt::Display for LinkPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => write!(f, "connected"),
            Self::Sending => write!(f, "sending"),
            Self::Reconnecting => write!(f, "reconnecting"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    SendStarted,
    SendSucceeded,
    SendFailed,
    /// Rebuild requested while no triple exists
    ReconnectStarted,
    Rebuilt,
    RebuildFailed,
    /// Publisher shut down
    Closed,
}

impl LinkEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SendStarted => "send_started",
            Self::SendSucceeded => "send_succeeded",
            Self::SendFailed => "send_failed",
            Self::ReconnectStarted => "reconnect_started",
            Self::Rebuilt => "rebuilt",
            Self::RebuildFailed => "rebuild_failed",
            Self::Closed => "closed",
        }
    }
}

/// Target phase for `event` in `phase`
pub fn transition(phase: LinkPhase, event: LinkEvent) -> Result<LinkPhase, BusError> {
    let target = match (phase, event) {
        (LinkPhase::Connected, LinkEvent::SendStarted) => LinkPhase::Sending,
        (LinkPhase::Sending, LinkEvent::SendSucceeded) => LinkPhase::Connected,
        (LinkPhase::Sending, LinkEvent::SendFailed) => LinkPhase::Reconnecting,
        (LinkPhase::Failed, LinkEvent::ReconnectStarted) => LinkPhase::Reconnecting,
        (LinkPhase::Reconnecting, LinkEvent::Rebuilt) => LinkPhase::Connected,
        (LinkPhase::Reconnecting, LinkEvent::RebuildFailed) => LinkPhase::Failed,
        (LinkPhase::Connected, LinkEvent::Closed) => LinkPhase::Failed,
        (from, event) => {
            return Err(BusError::InvalidTransition {
                from: from.to_string(),
                event: event.event_type().to_string(),
            })
        }
    };
    Ok(target)
}

/// Tracks the current phase and how many rebuilds have started
#[derive(Debug, Clone)]
pub struct ManagedLinkMachine {
    phase: LinkPhase,
    reconnects: u64,
}

impl ManagedLinkMachine {
    pub fn new(phase: LinkPhase) -> Self {
        Self {
            phase,
            reconnects: 0,
        }
    }

    pub fn phase(&self) -> LinkPhase {
        self.phase
    }

    /// Teardown and rebuild cycles entered so far
    pub fn reconnects(&self) -> u64 {
        self.reconnects
    }

    pub fn apply(&mut self, event: LinkEvent) -> Result<LinkPhase, BusError> {
        let target = transition(self.phase, event)?;
        if target == LinkPhase::Reconnecting {
            self.reconnects += 1;
        }
        self.phase = target;
        Ok(target)
    }
}
