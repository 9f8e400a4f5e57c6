//! Error and outcome types for the authentication bridge.

use thiserror::Error;

/// Result type alias for the authentication bridge.
pub type Result<T, E = BridgeError> = std::result::Result<T, E>;

/// Main error type for the authentication bridge.
///
/// These are caller-facing hard failures: rejected construction input,
/// undecodable persisted data, bad configuration. Attempt-level failures
/// (missing credentials, missing contexts) are not errors but terminal
/// [`AuthnEvent`]s returned to the host.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A key/value assertion could not be built from the given input
    #[error("Invalid assertion: {message}")]
    InvalidAssertion { message: String },

    /// Persisted assertion text was not a parseable structured object
    #[error("Decoding error: {message}")]
    Decode { message: String },

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Create a configuration error with a message.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an invalid-assertion error with a message.
    pub fn invalid_assertion(message: impl Into<String>) -> Self {
        Self::InvalidAssertion {
            message: message.into(),
        }
    }

    /// Create a decoding error with a message.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

/// Terminal failure event produced by a pipeline stage.
///
/// Every stage either completes (the host proceeds) or stops the attempt
/// with exactly one of these events. The host owns recovery; the bridge
/// never retries internally.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthnEvent {
    /// No usable request, identity record or username was available.
    #[error("NoCredentials")]
    NoCredentials,

    /// No authentication context store was attached to the attempt.
    #[error("InvalidAuthnContext")]
    InvalidAuthnContext,

    /// The relying party could not be resolved or had an empty identifier.
    #[error("InvalidRelyingParty")]
    InvalidRelyingParty,

    /// The inbound authentication request object could not be resolved.
    #[error("InvalidProfileContext")]
    InvalidProfileContext,
}

/// Host-facing outcome token for one pipeline stage.
///
/// [`Outcome::Proceed`] is the only value that signals the host to continue
/// its own flow; all other values are terminal for the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Stage completed; the host continues its flow.
    Proceed,
    /// See [`AuthnEvent::NoCredentials`].
    NoCredentials,
    /// See [`AuthnEvent::InvalidAuthnContext`].
    InvalidAuthnContext,
    /// See [`AuthnEvent::InvalidRelyingParty`].
    InvalidRelyingParty,
    /// See [`AuthnEvent::InvalidProfileContext`].
    InvalidProfileContext,
}

impl From<AuthnEvent> for Outcome {
    fn from(event: AuthnEvent) -> Self {
        match event {
            AuthnEvent::NoCredentials => Outcome::NoCredentials,
            AuthnEvent::InvalidAuthnContext => Outcome::InvalidAuthnContext,
            AuthnEvent::InvalidRelyingParty => Outcome::InvalidRelyingParty,
            AuthnEvent::InvalidProfileContext => Outcome::InvalidProfileContext,
        }
    }
}

impl Outcome {
    /// Collapse a stage result into its outcome token.
    pub fn of<T>(result: &Result<T, AuthnEvent>) -> Self {
        match result {
            Ok(_) => Outcome::Proceed,
            Err(event) => Outcome::from(*event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_maps_to_outcome() {
        assert_eq!(
            Outcome::from(AuthnEvent::NoCredentials),
            Outcome::NoCredentials
        );
        assert_eq!(
            Outcome::from(AuthnEvent::InvalidRelyingParty),
            Outcome::InvalidRelyingParty
        );
    }

    #[test]
    fn test_outcome_of_result() {
        let ok: Result<(), AuthnEvent> = Ok(());
        assert_eq!(Outcome::of(&ok), Outcome::Proceed);

        let err: Result<(), AuthnEvent> = Err(AuthnEvent::InvalidProfileContext);
        assert_eq!(Outcome::of(&err), Outcome::InvalidProfileContext);
    }
}
