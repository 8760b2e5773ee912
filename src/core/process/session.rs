//! Session for executing processes on the local host.

use std::any::Any;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::session::{Credential, Resource, Session};
use crate::utils::validation;

/// Resource property naming the directory processes run in. Optional;
/// supports `~` expansion.
pub const WORKING_DIRECTORY_PROPERTY: &str = "working-directory";

/// Local process-execution session.
///
/// Connect validates the resource (the configured working directory
/// must exist); there is no remote endpoint to reach. Commands read the
/// resolved working directory for the lifetime of the connection.
#[derive(Default)]
pub struct ProcessSession {
    resource: Option<Resource>,
    credential: Option<Credential>,
    working_dir: Option<PathBuf>,
}

impl ProcessSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolved working directory of the connected session, if any.
    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.resource.is_some()
    }
}

impl Session for ProcessSession {
    fn connect(&mut self, resource: &Resource, credential: &Credential) -> Result<()> {
        validation::require_non_empty(&resource.id, "resource", "id must not be empty")
            .map_err(|error| Error::session_connect(error.to_string()))?;

        let working_dir = match resource.property(WORKING_DIRECTORY_PROPERTY) {
            Some(raw) if !raw.trim().is_empty() => {
                let expanded = shellexpand::tilde(raw).to_string();
                let path = PathBuf::from(expanded);
                if !path.is_dir() {
                    return Err(Error::session_connect(format!(
                        "working directory [{}] for resource [{}] does not exist",
                        path.display(),
                        resource.id
                    )));
                }
                Some(path)
            }
            _ => None,
        };

        self.resource = Some(resource.clone());
        self.credential = Some(credential.clone());
        self.working_dir = working_dir;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::SessionDisconnect(
                "session is not connected".to_string(),
            ));
        }

        self.resource = None;
        self.credential = None;
        self.working_dir = None;
        Ok(())
    }

    fn resource(&self) -> Option<&Resource> {
        self.resource.as_ref()
    }

    fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
