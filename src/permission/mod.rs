use anyhow::Result;
use log::{debug, warn};
use std::fmt::Display;

/// Authorisation state for microphone capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    /// Access would be requested on first use.
    Prompt,
}

impl Display for PermissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionState::Granted => write!(f, "granted"),
            PermissionState::Denied => write!(f, "denied"),
            PermissionState::Prompt => write!(f, "prompt"),
        }
    }
}

/// Asks the host whether the microphone may be used.
pub trait PermissionQuery: Send {
    fn query(&self) -> Result<PermissionState>;
}

/// Caches the last known microphone permission.
///
/// `None` means the host could not be asked; callers treat it as "try and
/// see" rather than as a refusal.
pub struct MicrophonePermissionService {
    query: Box<dyn PermissionQuery>,
    state: Option<PermissionState>,
}

impl MicrophonePermissionService {
    pub fn new(query: Box<dyn PermissionQuery>) -> Self {
        let state = Self::query_state(query.as_ref());
        Self { query, state }
    }

    pub const fn state(&self) -> Option<PermissionState> {
        self.state
    }

    pub fn refresh(&mut self) {
        self.state = Self::query_state(self.query.as_ref());
    }

    fn query_state(query: &dyn PermissionQuery) -> Option<PermissionState> {
        match query.query() {
            Ok(state) => {
                debug!("Microphone permission: {state}");
                Some(state)
            }
            Err(e) => {
                warn!("Unable to query microphone permission: {e:#}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Scripted(RefCell<Vec<Result<PermissionState>>>);

    impl PermissionQuery for Scripted {
        fn query(&self) -> Result<PermissionState> {
            self.0.borrow_mut().remove(0)
        }
    }

    fn service(answers: Vec<Result<PermissionState>>) -> MicrophonePermissionService {
        MicrophonePermissionService::new(Box::new(Scripted(RefCell::new(answers))))
    }

    #[test]
    fn test_query_failure_is_indeterminate() {
        let service = service(vec![Err(anyhow::anyhow!("no permission facility"))]);
        assert_eq!(service.state(), None);
    }

    #[test]
    fn test_refresh_overwrites_state() {
        let mut service = service(vec![
            Ok(PermissionState::Prompt),
            Ok(PermissionState::Granted),
            Err(anyhow::anyhow!("gone")),
        ]);
        assert_eq!(service.state(), Some(PermissionState::Prompt));

        service.refresh();
        assert_eq!(service.state(), Some(PermissionState::Granted));

        service.refresh();
        assert_eq!(service.state(), None);
    }

    #[test]
    fn test_denied_is_reported() {
        let service = service(vec![Ok(PermissionState::Denied)]);
        assert_eq!(service.state(), Some(PermissionState::Denied));
    }
}
