// src/services/webhook.rs

//! Messenger webhook subscription handshake.

/// Outcome of a subscription check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Mode and token match; echo the challenge back with 200
    Verified(String),
    /// Token or mode mismatch; answer 403
    Rejected,
    /// Not a subscription request
    Ignored,
}

/// Check a `hub.mode` / `hub.verify_token` / `hub.challenge` triple.
///
/// An empty expected token never verifies.
pub fn verify(
    mode: Option<&str>,
    token: Option<&str>,
    challenge: Option<&str>,
    expected_token: &str,
) -> Verification {
    let (Some(mode), Some(token)) = (mode, token) else {
        return Verification::Ignored;
    };

    if mode == "subscribe" && !expected_token.is_empty() && token == expected_token {
        log::info!("Webhook verified");
        Verification::Verified(challenge.unwrap_or_default().to_string())
    } else {
        log::warn!("Webhook not verified: invalid token");
        Verification::Rejected
    }
}
