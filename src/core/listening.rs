//! Shared listening state.
//!
//! A single [`ListeningState`] lives inside the [`SessionHub`](super::SessionHub)
//! for the whole process lifetime. It only changes through
//! [`ListeningState::apply_toggle`], which keeps `is_listening` and
//! `current_listener_id` consistent: a listener id is present if and only if
//! a listening session is active.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::session_error::{SessionError, SessionResult};

/// Status string that marks an active listening session on the wire.
pub const LISTENING_STATUS: &str = "Listening...";

/// Opaque listener identifier.
///
/// Kept as the JSON value the client sent, so a numeric `userId` is echoed
/// back as a number. Only `null` means "no listener".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListenerId(Value);

impl ListenerId {
    /// The id when the client sent a JSON string.
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<&str> for ListenerId {
    fn from(id: &str) -> Self {
        Self(Value::String(id.to_owned()))
    }
}

impl From<Value> for ListenerId {
    fn from(id: Value) -> Self {
        Self(id)
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(id) => f.write_str(id),
            other => write!(f, "{other}"),
        }
    }
}

/// Process-wide record of whether someone is listening, and who.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListeningState {
    is_listening: bool,
    current_listener_id: Option<ListenerId>,
}

impl ListeningState {
    pub fn is_listening(&self) -> bool {
        self.is_listening
    }

    pub fn current_listener_id(&self) -> Option<&ListenerId> {
        self.current_listener_id.as_ref()
    }

    /// Wire status for the current state: `"Listening..."` or empty.
    pub fn status(&self) -> &'static str {
        if self.is_listening {
            LISTENING_STATUS
        } else {
            ""
        }
    }

    /// Apply a `toggle-listen` request.
    ///
    /// Any status other than `"Listening..."` stops listening and clears the
    /// listener. Starting to listen without a user id is rejected and leaves
    /// the state untouched.
    pub fn apply_toggle(
        &mut self,
        status: &str,
        user_id: Option<&ListenerId>,
    ) -> SessionResult<()> {
        let listening = status == LISTENING_STATUS;

        if listening {
            let Some(user_id) = user_id else {
                return Err(SessionError::MissingListenerId);
            };
            self.is_listening = true;
            self.current_listener_id = Some(user_id.clone());
        } else {
            self.is_listening = false;
            self.current_listener_id = None;
        }

        Ok(())
    }

    /// Snapshot pushed to a client when it connects.
    pub fn to_push(&self) -> StatePush {
        StatePush {
            status: self.status().to_string(),
            user_id: self.current_listener_id.clone(),
        }
    }
}

/// Server → client state push, sent on connect and on every toggle.
///
/// ```json
/// {"status": "Listening...", "userId": "user-42"}
/// {"status": "", "userId": null}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatePush {
    pub status: String,
    #[serde(rename = "userId")]
    pub user_id: Option<ListenerId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id(raw: &str) -> ListenerId {
        ListenerId::from(raw)
    }

    fn assert_invariant(state: &ListeningState) {
        assert_eq!(state.is_listening(), state.current_listener_id().is_some());
    }

    #[test]
    fn test_default_state_is_idle() {
        let state = ListeningState::default();
        assert!(!state.is_listening());
        assert_eq!(state.current_listener_id(), None);
        assert_eq!(state.status(), "");
        assert_invariant(&state);
    }

    #[test]
    fn test_toggle_on_sets_listener() {
        let mut state = ListeningState::default();
        state.apply_toggle(LISTENING_STATUS, Some(&id("user-1"))).unwrap();

        assert!(state.is_listening());
        assert_eq!(state.current_listener_id(), Some(&id("user-1")));
        assert_eq!(state.status(), LISTENING_STATUS);
        assert_invariant(&state);
    }

    #[test]
    fn test_toggle_off_clears_listener_even_with_user_id() {
        let mut state = ListeningState::default();
        state.apply_toggle(LISTENING_STATUS, Some(&id("user-1"))).unwrap();
        state.apply_toggle("", Some(&id("user-1"))).unwrap();

        assert!(!state.is_listening());
        assert_eq!(state.current_listener_id(), None);
        assert_invariant(&state);
    }

    #[test]
    fn test_unrecognised_status_stops_listening() {
        let mut state = ListeningState::default();
        state.apply_toggle(LISTENING_STATUS, Some(&id("user-1"))).unwrap();
        state.apply_toggle("Paused", Some(&id("user-2"))).unwrap();

        assert!(!state.is_listening());
        assert_invariant(&state);
    }

    #[test]
    fn test_last_toggle_wins() {
        let mut state = ListeningState::default();
        state.apply_toggle(LISTENING_STATUS, Some(&id("user-1"))).unwrap();
        state.apply_toggle(LISTENING_STATUS, Some(&id("user-2"))).unwrap();

        assert_eq!(state.current_listener_id(), Some(&id("user-2")));
    }

    #[test]
    fn test_listening_without_user_id_is_rejected() {
        let mut state = ListeningState::default();
        state.apply_toggle(LISTENING_STATUS, Some(&id("user-1"))).unwrap();

        let result = state.apply_toggle(LISTENING_STATUS, None);
        assert!(matches!(result, Err(SessionError::MissingListenerId)));
        assert_eq!(state.current_listener_id(), Some(&id("user-1")));
        assert_invariant(&state);
    }

    #[test]
    fn test_push_serializes_null_user_id() {
        let push = ListeningState::default().to_push();
        let json = serde_json::to_value(&push).unwrap();
        assert_eq!(json, serde_json::json!({"status": "", "userId": null}));
    }

    #[test]
    fn test_push_serializes_listener() {
        let mut state = ListeningState::default();
        state.apply_toggle(LISTENING_STATUS, Some(&id("abc"))).unwrap();
        let json = serde_json::to_string(&state.to_push()).unwrap();
        assert_eq!(json, r#"{"status":"Listening...","userId":"abc"}"#);
    }

    #[test]
    fn test_non_string_listener_id_is_kept_verbatim() {
        let mut state = ListeningState::default();
        let numeric = ListenerId::from(json!(42));
        state.apply_toggle(LISTENING_STATUS, Some(&numeric)).unwrap();

        assert!(state.is_listening());
        assert_eq!(state.current_listener_id(), Some(&numeric));
        assert_eq!(numeric.as_str(), None);
        assert_eq!(numeric.to_string(), "42");
        assert_eq!(
            serde_json::to_value(state.to_push()).unwrap(),
            json!({"status": "Listening...", "userId": 42})
        );
        assert_invariant(&state);
    }
}
