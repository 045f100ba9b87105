//! Invitation-code gate for the matching endpoints.

use tracing::warn;

use crate::errors::AppError;

/// Checks `code` against the configured invitation codes.
///
/// With no codes configured every request is denied; the service never
/// falls open.
pub fn verify_invitation(configured: &[String], code: Option<&str>) -> Result<(), AppError> {
    if configured.is_empty() {
        warn!("Invitation check rejected: no codes configured");
        return Err(AppError::AccessNotConfigured);
    }

    let code = code.map(str::trim).unwrap_or_default();
    if !code.is_empty() && configured.iter().any(|c| c == code) {
        Ok(())
    } else {
        Err(AppError::Forbidden("Invalid invitation code".to_string()))
    }
}
