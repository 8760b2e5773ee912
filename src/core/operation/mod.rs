//! Plugin entry point contract and input validation helpers.

use std::any::Any;

use crate::error::{Error, Result};
use crate::execution::result::{ExecutionResultTree, ResultHandle};
use crate::messages::MessageProvider;
use crate::session::Session;

/// One domain-specific automation action executed against a session,
/// producing a subtree of execution results under `result`.
///
/// Implementations validate their inputs with [`require_content`] and
/// [`require_session`], translate the model into ordered steps, consult
/// the continuation policy before each step, and complete `result` as
/// computed after the loop. Only input validation errors escape
/// `execute`; everything that happens while processing steps is
/// recorded in the tree.
pub trait Operation {
    fn name(&self) -> &'static str;

    fn execute(
        &mut self,
        content: &dyn Any,
        session: &mut dyn Session,
        tree: &mut ExecutionResultTree,
        result: ResultHandle,
        provider: &dyn MessageProvider,
    ) -> Result<()>;
}

/// Downcast `content` to the operation's declared model type.
///
/// Fails with [`Error::InvalidArgument`] naming the expected type; a
/// mismatch is a caller bug and is never retried.
pub fn require_content<T: Any>(content: &dyn Any) -> Result<&T> {
    content.downcast_ref::<T>().ok_or_else(|| {
        Error::InvalidArgument(format!(
            "content is not of expected type [{}]",
            std::any::type_name::<T>()
        ))
    })
}

/// Downcast `session` to the operation's declared backend type.
///
/// Fails with [`Error::InvalidArgument`] naming the expected type; a
/// mismatch is a caller bug and is never retried.
pub fn require_session<S: Session>(session: &mut dyn Session) -> Result<&mut S> {
    match session.as_any_mut().downcast_mut::<S>() {
        Some(typed) => Ok(typed),
        None => Err(Error::InvalidArgument(format!(
            "session is not of expected type [{}]",
            std::any::type_name::<S>()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Credential, Resource};

    #[derive(Debug, PartialEq)]
    struct DeployModel {
        artifact: String,
    }

    #[derive(Debug, Default)]
    struct StubSession {
        resource: Option<Resource>,
        credential: Option<Credential>,
    }

    impl Session for StubSession {
        fn connect(&mut self, resource: &Resource, credential: &Credential) -> Result<()> {
            self.resource = Some(resource.clone());
            self.credential = Some(credential.clone());
            Ok(())
        }

        fn disconnect(&mut self) -> Result<()> {
            self.resource = None;
            self.credential = None;
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

    struct OtherSession;

    impl Session for OtherSession {
        fn connect(&mut self, _resource: &Resource, _credential: &Credential) -> Result<()> {
            Ok(())
        }

        fn disconnect(&mut self) -> Result<()> {
            Ok(())
        }

        fn resource(&self) -> Option<&Resource> {
            None
        }

        fn credential(&self) -> Option<&Credential> {
            None
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn require_content_accepts_declared_type() {
        let model = DeployModel {
            artifact: "app.war".to_string(),
        };
        let content: &dyn Any = &model;

        let typed = require_content::<DeployModel>(content).unwrap();
        assert_eq!(typed.artifact, "app.war");
    }

    #[test]
    fn require_content_rejects_other_types() {
        let content: &dyn Any = &"just a string";

        let err = require_content::<DeployModel>(content).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(err.to_string().contains("DeployModel"));
    }

    #[test]
    fn require_session_accepts_declared_backend() {
        let mut session = StubSession::default();
        let dynamic: &mut dyn Session = &mut session;

        assert!(require_session::<StubSession>(dynamic).is_ok());
    }

    #[test]
    fn require_session_rejects_other_backends() {
        let mut session = OtherSession;
        let dynamic: &mut dyn Session = &mut session;

        let err = require_session::<StubSession>(dynamic).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(err.to_string().contains("StubSession"));
    }
}
