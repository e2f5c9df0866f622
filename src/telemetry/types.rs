//! Telemetry record types.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::events;

/// A named business event with string properties
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessEvent {
    pub name: String,
    pub properties: BTreeMap<String, String>,
}

impl BusinessEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Event marking one step of an order's trip through the service
    ///
    /// `sequence` orders the steps: `0` received, `1` stored, `2` published.
    pub fn order_step(
        name: impl Into<String>,
        team: &str,
        sequence: &str,
        kind: &str,
        order_id: &str,
    ) -> Self {
        Self::new(name)
            .with_property(events::PROP_TEAM, team)
            .with_property(events::PROP_SEQUENCE, sequence)
            .with_property(events::PROP_TYPE, kind)
            .with_property(events::PROP_SERVICE, events::SERVICE_NAME)
            .with_property(events::PROP_ORDER_ID, order_id)
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// Describes a remote call before it is made
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyCall {
    /// Target system, e.g. `MongoDB` or `ServiceBus`
    pub name: String,
    /// Call kind, e.g. `MongoDB` or `AMQP`
    pub kind: String,
    /// Redacted connection target
    pub target: String,
    /// Operation, e.g. `Insert order`
    pub data: String,
}

impl DependencyCall {
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        target: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            target: target.into(),
            data: data.into(),
        }
    }

    /// Complete the call into a record; `error` is `None` on success
    pub fn finish(
        &self,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        error: Option<String>,
    ) -> DependencyRecord {
        DependencyRecord {
            name: self.name.clone(),
            kind: self.kind.clone(),
            target: self.target.clone(),
            data: self.data.clone(),
            success: error.is_none(),
            result_code: error,
            started_at,
            ended_at,
        }
    }
}

/// One outbound call, with timing and outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyRecord {
    pub name: String,
    pub kind: String,
    pub target: String,
    pub data: String,
    pub success: bool,
    /// Error text when the call failed
    pub result_code: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl DependencyRecord {
    pub fn duration(&self) -> Duration {
        (self.ended_at - self.started_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}
