use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::config::ALERTS_ENDPOINT;
use crate::errors::{BigPandaError, Result};
use crate::types::AlertStatus;

const DEFAULT_PRIMARY_ATTR: &str = "host";
const DEFAULT_SECONDARY_ATTR: &str = "check";

/// BigPanda alert
///
/// An alert is keyed by two identity attributes, `host` and `check` by
/// default. Their values may come from the subject map, from
/// [`with_check`](Alert::with_check) for the secondary attribute, or from
/// extra attributes.
///
/// # Example
///
/// ```rust
/// use bigpanda_api::{Alert, AlertStatus};
/// use serde_json::Map;
///
/// let alert = Alert::new(AlertStatus::Critical, Map::new())
///     .with_attr("host", "web1")
///     .with_check("disk")
///     .with_description("Disk usage above 95%");
///
/// let payload = alert.build_payload().unwrap();
/// assert_eq!(payload["host"], "web1");
/// assert_eq!(payload["check"], "disk");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub status: AlertStatus,

    /// Identity fields describing what the alert concerns
    pub subject: Map<String, Value>,

    pub check: Option<String>,
    pub description: Option<String>,
    pub cluster: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,

    /// Name of the field identifying the alerted entity
    pub primary_attr: String,

    /// Name of the field identifying what was checked on it
    pub secondary_attr: String,

    /// Additional fields merged into the payload last
    pub extra: Map<String, Value>,
}

impl Alert {
    pub fn new(status: impl Into<AlertStatus>, subject: Map<String, Value>) -> Self {
        Self {
            status: status.into(),
            subject,
            check: None,
            description: None,
            cluster: None,
            timestamp: None,
            primary_attr: DEFAULT_PRIMARY_ATTR.to_string(),
            secondary_attr: DEFAULT_SECONDARY_ATTR.to_string(),
            extra: Map::new(),
        }
    }

    /// Set the check; it is sent under the secondary attribute's name
    pub fn with_check(mut self, check: impl Into<String>) -> Self {
        self.check = Some(check.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.cluster = Some(cluster.into());
        self
    }

    /// Set the event time, sent as unix seconds
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_primary_attr(mut self, name: impl Into<String>) -> Self {
        self.primary_attr = name.into();
        self
    }

    pub fn with_secondary_attr(mut self, name: impl Into<String>) -> Self {
        self.secondary_attr = name.into();
        self
    }

    /// Add an arbitrary field to the payload
    ///
    /// Extra fields override subject and optional fields of the same name.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Ingestion path for alerts
    pub fn endpoint(&self) -> &'static str {
        ALERTS_ENDPOINT
    }

    /// Render the alert into the BigPanda payload shape
    ///
    /// Absent optional fields are omitted rather than sent as null.
    ///
    /// # Errors
    ///
    /// Returns [`BigPandaError::MissingIdentity`] if either identity
    /// attribute ends up without a value.
    pub fn build_payload(&self) -> Result<Map<String, Value>> {
        let mut payload = self.subject.clone();

        if let Some(check) = &self.check {
            payload.insert(self.secondary_attr.clone(), Value::from(check.as_str()));
        }
        if let Some(description) = &self.description {
            payload.insert("description".to_string(), Value::from(description.as_str()));
        }
        if let Some(cluster) = &self.cluster {
            payload.insert("cluster".to_string(), Value::from(cluster.as_str()));
        }
        if let Some(timestamp) = &self.timestamp {
            payload.insert("timestamp".to_string(), Value::from(timestamp.timestamp()));
        }

        payload.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        payload.retain(|_, v| !v.is_null());

        payload.insert("status".to_string(), Value::from(self.status.as_str()));

        // The service assumes host/check unless told otherwise
        if self.primary_attr != DEFAULT_PRIMARY_ATTR
            || self.secondary_attr != DEFAULT_SECONDARY_ATTR
        {
            payload.insert(
                "primary_property".to_string(),
                Value::from(self.primary_attr.as_str()),
            );
            payload.insert(
                "secondary_property".to_string(),
                Value::from(self.secondary_attr.as_str()),
            );
        }

        for attr in [&self.primary_attr, &self.secondary_attr] {
            if !payload.contains_key(attr.as_str()) {
                return Err(BigPandaError::MissingIdentity { attr: attr.clone() });
            }
        }

        Ok(payload)
    }
}
