//! # Order Model
//!
//! The unit of work accepted by the capture service.
//!
//! ## Ownership of fields
//!
//! - `id` and `partition` are assigned by the document store client at insert
//!   time and are empty until then.
//! - `status` is forced to `"Open"` at insert time regardless of caller input.
//! - `source` is defaulted from the process environment when blank or when it
//!   holds the API explorer placeholder `"string"`.
//!
//! ## Document Mapping
//!
//! Persisted field names are lower-cased (`orderid`, `emailaddress`, ...) to
//! stay compatible with records written by earlier capture services. Inbound
//! JSON may use either those names or their PascalCase forms.

use serde::{Deserialize, Serialize};

use crate::constants;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Store-generated identifier, empty until persisted
    #[serde(rename = "orderid", alias = "OrderID", alias = "orderId", default)]
    pub id: String,

    #[serde(rename = "emailaddress", alias = "EmailAddress", alias = "email", default)]
    pub email: String,

    #[serde(
        rename = "preferredlanguage",
        alias = "PreferredLanguage",
        alias = "preferredLanguage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub preferred_language: Option<String>,

    #[serde(
        rename = "product",
        alias = "Product",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub product: Option<String>,

    /// Shard key, `partition-<k>`; never supplied by the caller
    #[serde(rename = "partition", alias = "Partition", default)]
    pub partition: String,

    #[serde(
        rename = "total",
        alias = "Total",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub total: Option<f64>,

    #[serde(
        rename = "source",
        alias = "Source",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub source: Option<String>,

    #[serde(rename = "status", alias = "Status", default)]
    pub status: String,
}

impl Order {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Default::default()
        }
    }

    pub fn with_product(mut self, product: impl Into<String>) -> Self {
        self.product = Some(product.into());
        self
    }

    pub fn with_total(mut self, total: f64) -> Self {
        self.total = Some(total);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Whether the store has assigned an id and a partition
    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty() && !self.partition.is_empty()
    }

    /// True when `source` should be replaced by the process default
    pub fn needs_default_source(&self) -> bool {
        match self.source.as_deref() {
            None => true,
            Some(source) => {
                source.trim().is_empty() || source == constants::order::SOURCE_PLACEHOLDER
            }
        }
    }

    /// Build the bus payload for this order
    pub fn envelope(&self, team: &str) -> OrderEnvelope {
        OrderEnvelope {
            order: self.id.clone(),
            source: team.to_string(),
        }
    }
}

/// Minimal payload published to the bus
///
/// Wire shape: `{"order": "<id>", "source": "<team-tag>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEnvelope {
    pub order: String,
    pub source: String,
}

impl OrderEnvelope {
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
