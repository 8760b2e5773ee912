pub mod retry;

use std::any::Any;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Descriptor of one addressable external target (process host, file
/// system, repository, management API).
///
/// Owned by the embedding configuration layer; the engine only reads
/// it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub plugin_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_id_ref: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl Resource {
    pub fn new(id: &str, plugin_id: &str) -> Self {
        Self {
            id: id.to_string(),
            plugin_id: plugin_id.to_string(),
            credential_id_ref: None,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// Authentication material for one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub id: String,
    pub user: String,
    pub password: String,
}

impl Credential {
    pub fn new(id: &str, user: &str, password: &str) -> Self {
        Self {
            id: id.to_string(),
            user: user.to_string(),
            password: password.to_string(),
        }
    }

    /// Anonymous credential for resources without authentication.
    pub fn anonymous() -> Self {
        Self::new("anonymous", "", "")
    }
}

/// Live connection to one external resource, built from a resource
/// descriptor and a credential.
///
/// Concrete backends implement the connection lifecycle against their
/// own protocol; the engine only drives connect/disconnect and hands
/// the session to operations. `as_any`/`as_any_mut` let an operation
/// require its declared backend type.
pub trait Session: Any {
    /// Connect to the resource. Fails with [`crate::Error::SessionConnect`].
    fn connect(&mut self, resource: &Resource, credential: &Credential) -> Result<()>;

    /// Disconnect. Fails with [`crate::Error::SessionDisconnect`].
    fn disconnect(&mut self) -> Result<()>;

    /// Resource this session is connected to, if connected.
    fn resource(&self) -> Option<&Resource>;

    /// Credential this session connected with, if connected.
    fn credential(&self) -> Option<&Credential>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_round_trips_camel_case_json() {
        let resource = Resource::new("node-1", "process-execution")
            .with_property("working-directory", "/opt/app");

        let json = serde_json::to_string(&resource).unwrap();
        assert!(json.contains("\"pluginId\":\"process-execution\""));

        let parsed: Resource = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, resource);
        assert_eq!(parsed.property("working-directory"), Some("/opt/app"));
    }

    #[test]
    fn missing_property_is_none() {
        let resource = Resource::new("node-1", "process-execution");
        assert_eq!(resource.property("working-directory"), None);
    }

    #[test]
    fn anonymous_credential_has_empty_user() {
        let credential = Credential::anonymous();
        assert_eq!(credential.id, "anonymous");
        assert!(credential.user.is_empty());
    }
}
