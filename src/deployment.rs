use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::DEPLOYMENTS_ENDPOINT;
use crate::errors::{BigPandaError, Result};
use crate::types::DeploymentStatus;

/// BigPanda deployment event
///
/// Deployments are not attributed to an integration, so they never carry
/// an app key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deployment {
    pub component: String,
    pub version: String,
    pub hosts: Vec<String>,
    pub status: DeploymentStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Tool that performed the deployment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_system: Option<String>,
}

impl Deployment {
    /// Create a deployment with status `start`
    pub fn new(component: impl Into<String>, version: impl Into<String>, hosts: Vec<String>) -> Self {
        Self {
            component: component.into(),
            version: version.into(),
            hosts,
            status: DeploymentStatus::default(),
            owner: None,
            env: None,
            description: None,
            source_system: None,
        }
    }

    pub fn with_status(mut self, status: impl Into<DeploymentStatus>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_source_system(mut self, source_system: impl Into<String>) -> Self {
        self.source_system = Some(source_system.into());
        self
    }

    /// Ingestion path for deployments
    pub fn endpoint(&self) -> &'static str {
        DEPLOYMENTS_ENDPOINT
    }

    /// Render the deployment into the BigPanda payload shape
    pub fn build_payload(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self).map_err(BigPandaError::Serialize)? {
            Value::Object(map) => Ok(map),
            other => Err(BigPandaError::Serialize(serde::ser::Error::custom(format!(
                "expected a JSON object, got {other}"
            )))),
        }
    }
}
