// Maps Google API failures onto the sync error kinds.

use crate::core::headaches::{CredentialError, SyncError};
use reqwest::{Response, StatusCode};

/// Longest slice of a Google error body kept in the error message.
pub const MAX_ERROR_BODY_CHARS: usize = 300;

fn body_excerpt(body: &str) -> String {
    let body = body.trim();
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        return body.to_string();
    }
    let excerpt: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    format!("{}...", excerpt)
}

/// Turns a non-success response into a `SyncError`.
pub async fn status_error(response: Response, what: &str) -> SyncError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    error_for_status(status, &body, what)
}

pub fn error_for_status(status: StatusCode, body: &str, what: &str) -> SyncError {
    let body = body_excerpt(body);
    match status {
        StatusCode::NOT_FOUND => SyncError::NotFound(format!("{} ({})", what, status)),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            SyncError::Credential(CredentialError::Rejected(format!(
                "{} ({}). Make sure the folder is shared with the service account: {}",
                what, status, body
            )))
        }
        _ => SyncError::Upstream(format!("{} ({}): {}", what, status, body)),
    }
}

pub fn request_error(err: reqwest::Error, what: &str) -> SyncError {
    if err.is_timeout() {
        SyncError::Upstream(format!("{}: request timed out", what))
    } else {
        SyncError::Upstream(format!("{}: {}", what, err))
    }
}

/// A token failure during a refresh. Network trouble is an upstream problem,
/// everything else is about the credential.
pub fn token_error(err: CredentialError) -> SyncError {
    match err {
        CredentialError::Unreachable(message) => SyncError::Upstream(message),
        other => SyncError::Credential(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            error_for_status(StatusCode::NOT_FOUND, "", "listing folder"),
            SyncError::NotFound(_)
        ));
        assert!(matches!(
            error_for_status(StatusCode::FORBIDDEN, "", "listing folder"),
            SyncError::Credential(CredentialError::Rejected(_))
        ));
        assert!(matches!(
            error_for_status(StatusCode::INTERNAL_SERVER_ERROR, "", "listing folder"),
            SyncError::Upstream(_)
        ));
    }

    #[test]
    fn test_long_bodies_are_cut_short() {
        let body = "x".repeat(1500);
        for status in [StatusCode::FORBIDDEN, StatusCode::BAD_GATEWAY] {
            let message = error_for_status(status, &body, "listing Drive folder").to_string();
            assert!(message.len() < 600, "message was {} chars", message.len());
            assert!(message.contains("..."));
        }

        let short = error_for_status(StatusCode::BAD_GATEWAY, "upstream hiccup", "x").to_string();
        assert!(short.ends_with("upstream hiccup"));
    }

    #[test]
    fn test_unreachable_token_is_upstream() {
        assert!(matches!(
            token_error(CredentialError::Unreachable("dns".to_string())),
            SyncError::Upstream(_)
        ));
        assert!(matches!(
            token_error(CredentialError::Rejected("invalid_grant".to_string())),
            SyncError::Credential(_)
        ));
    }
}
