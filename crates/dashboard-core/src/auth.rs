//! ============================================================================
//! Credential Gate
//! ============================================================================
//! One static credential pair from the environment guards the dashboard.
//! Missing configuration fails closed, and a mismatch never says which
//! field was wrong.
//! ============================================================================

use tracing::{info, warn};

use crate::config::DashboardConfig;
use crate::session::Session;
use crate::types::DashboardError;

/// Checks login attempts against the configured credential pair
#[derive(Debug, Clone)]
pub struct CredentialGate {
    expected_user: Option<String>,
    expected_pass: Option<String>,
}

impl CredentialGate {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            expected_user: config.login_user.as_deref().map(|u| u.trim().to_string()),
            expected_pass: config.login_pass.as_deref().map(|p| p.trim().to_string()),
        }
    }

    #[cfg(test)]
    fn with_credentials(user: &str, pass: &str) -> Self {
        Self {
            expected_user: Some(user.trim().to_string()),
            expected_pass: Some(pass.trim().to_string()),
        }
    }

    /// Validate a login attempt. The username comparison is
    /// case-insensitive, the password comparison exact; both sides are
    /// trimmed. On success the session keeps the entered casing.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Session, DashboardError> {
        let username = username.trim();
        let password = password.trim();

        if username.is_empty() {
            return Err(DashboardError::Validation("Nama wajib diisi".into()));
        }

        let (expected_user, expected_pass) = match (&self.expected_user, &self.expected_pass) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => (u, p),
            _ => {
                warn!("Login attempted but credentials are not configured");
                return Err(DashboardError::ConfigurationMissing);
            }
        };

        if username.to_lowercase() != expected_user.to_lowercase() || password != expected_pass {
            warn!("Failed login attempt for '{}'", username);
            return Err(DashboardError::InvalidCredentials);
        }

        info!("Login accepted for '{}'", username);
        Ok(Session::new(username))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> CredentialGate {
        CredentialGate::with_credentials("Supervisor", "rahasia123")
    }

    #[test]
    fn accepts_exact_credentials() {
        let session = gate().authenticate("Supervisor", "rahasia123").unwrap();
        assert_eq!(session.user, "Supervisor");
        assert!(session.login_at_ms > 0);
    }

    #[test]
    fn username_is_case_insensitive_but_casing_is_kept() {
        let session = gate().authenticate("sUpErVisor", "rahasia123").unwrap();
        assert_eq!(session.user, "sUpErVisor");
    }

    #[test]
    fn inputs_are_trimmed() {
        let session = gate().authenticate("  supervisor  ", "  rahasia123  ").unwrap();
        assert_eq!(session.user, "supervisor");
    }

    #[test]
    fn password_is_case_sensitive() {
        let err = gate().authenticate("supervisor", "RAHASIA123").unwrap_err();
        assert!(matches!(err, DashboardError::InvalidCredentials));
    }

    #[test]
    fn wrong_user_and_wrong_password_look_identical() {
        let wrong_user = gate().authenticate("intruder", "rahasia123").unwrap_err();
        let wrong_pass = gate().authenticate("supervisor", "nope").unwrap_err();
        assert_eq!(wrong_user.to_string(), wrong_pass.to_string());
    }

    #[test]
    fn blank_username_is_rejected_before_config() {
        let gate = CredentialGate { expected_user: None, expected_pass: None };
        let err = gate.authenticate("   ", "whatever").unwrap_err();
        assert!(matches!(err, DashboardError::Validation(_)));
    }

    #[test]
    fn missing_config_fails_closed() {
        let gate = CredentialGate { expected_user: None, expected_pass: None };
        let err = gate.authenticate("supervisor", "rahasia123").unwrap_err();
        assert!(matches!(err, DashboardError::ConfigurationMissing));
    }

    #[test]
    fn empty_configured_values_fail_closed() {
        let gate = CredentialGate {
            expected_user: Some(String::new()),
            expected_pass: Some("x".into()),
        };
        let err = gate.authenticate("supervisor", "x").unwrap_err();
        assert!(matches!(err, DashboardError::ConfigurationMissing));
    }
}
