use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};

use crate::alert::Alert;
use crate::deployment::Deployment;
use crate::errors::Result;

/// Alert status
///
/// BigPanda understands the four named states. Any other string is passed
/// through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AlertStatus {
    Critical,
    Warning,
    Ok,
    Acknowledged,
    Other(String),
}

impl AlertStatus {
    pub fn as_str(&self) -> &str {
        match self {
            AlertStatus::Critical => "critical",
            AlertStatus::Warning => "warning",
            AlertStatus::Ok => "ok",
            AlertStatus::Acknowledged => "acknowledged",
            AlertStatus::Other(s) => s,
        }
    }
}

impl From<&str> for AlertStatus {
    fn from(s: &str) -> Self {
        match s {
            "critical" => AlertStatus::Critical,
            "warning" => AlertStatus::Warning,
            "ok" => AlertStatus::Ok,
            "acknowledged" => AlertStatus::Acknowledged,
            other => AlertStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for AlertStatus {
    fn from(s: String) -> Self {
        AlertStatus::from(s.as_str())
    }
}

impl Display for AlertStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AlertStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Deployment lifecycle status
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum DeploymentStatus {
    #[default]
    Start,
    End,
    Success,
    Failure,
    Other(String),
}

impl DeploymentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            DeploymentStatus::Start => "start",
            DeploymentStatus::End => "end",
            DeploymentStatus::Success => "success",
            DeploymentStatus::Failure => "failure",
            DeploymentStatus::Other(s) => s,
        }
    }
}

impl From<&str> for DeploymentStatus {
    fn from(s: &str) -> Self {
        match s {
            "start" => DeploymentStatus::Start,
            "end" => DeploymentStatus::End,
            "success" => DeploymentStatus::Success,
            "failure" => DeploymentStatus::Failure,
            other => DeploymentStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for DeploymentStatus {
    fn from(s: String) -> Self {
        DeploymentStatus::from(s.as_str())
    }
}

impl Display for DeploymentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DeploymentStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A single event the client knows how to deliver
#[derive(Debug, Clone)]
pub enum Event {
    Alert(Alert),
    Deployment(Deployment),
}

impl Event {
    /// Ingestion path for this kind of event
    pub fn endpoint(&self) -> &'static str {
        match self {
            Event::Alert(alert) => alert.endpoint(),
            Event::Deployment(deployment) => deployment.endpoint(),
        }
    }

    /// Render the event into its wire payload
    pub fn build_payload(&self) -> Result<Map<String, Value>> {
        match self {
            Event::Alert(alert) => alert.build_payload(),
            Event::Deployment(deployment) => deployment.build_payload(),
        }
    }

    pub fn is_alert(&self) -> bool {
        matches!(self, Event::Alert(_))
    }
}

impl From<Alert> for Event {
    fn from(alert: Alert) -> Self {
        Event::Alert(alert)
    }
}

impl From<Deployment> for Event {
    fn from(deployment: Deployment) -> Self {
        Event::Deployment(deployment)
    }
}

/// What a single `send` call delivers: one event, or a batch in one request
#[derive(Debug, Clone)]
pub enum Outbound {
    Single(Event),
    Batch(Vec<Event>),
}

impl From<Event> for Outbound {
    fn from(event: Event) -> Self {
        Outbound::Single(event)
    }
}

impl From<Alert> for Outbound {
    fn from(alert: Alert) -> Self {
        Outbound::Single(Event::Alert(alert))
    }
}

impl From<Deployment> for Outbound {
    fn from(deployment: Deployment) -> Self {
        Outbound::Single(Event::Deployment(deployment))
    }
}

impl From<Vec<Alert>> for Outbound {
    fn from(alerts: Vec<Alert>) -> Self {
        Outbound::Batch(alerts.into_iter().map(Event::Alert).collect())
    }
}

impl From<Vec<Event>> for Outbound {
    fn from(events: Vec<Event>) -> Self {
        Outbound::Batch(events)
    }
}
