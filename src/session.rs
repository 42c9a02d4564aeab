//! Session view of the stored access token.
//!
//! Decoding is a pure function over the token string: the payload
//! segment is base64url-decoded and parsed, with no signature
//! verification (the token came from the server we are talking to).
//! Nothing here is cached; callers re-decode on every read.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

/// Default grace period for [`is_expired`], in seconds.
pub const DEFAULT_GRACE_SECONDS: i64 = 30;

/// Raw claims carried in the access token payload.
///
/// `sub` may arrive as a string or a number depending on the issuer, so
/// it is held loosely and coerced on read.
#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    exp: Option<i64>,
    #[serde(default)]
    sub: Option<serde_json::Value>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    roles: Option<Vec<serde_json::Value>>,
}

/// Decoded view of the current access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Subject identifier: `sub`, falling back to `username`, then
    /// `email`, then a literal `"user"` placeholder.
    pub subject: String,
    /// Role claims coerced to strings; empty when absent.
    pub roles: Vec<String>,
    /// Expiry instant, when the token carries one.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Decode an access token into a [`Session`]. Any malformed token
/// yields `None`; this is safe to call speculatively.
pub fn decode(token: &str) -> Option<Session> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;

    let subject = claims
        .sub
        .and_then(coerce_to_string)
        .or(claims.username)
        .or(claims.email)
        .unwrap_or_else(|| "user".to_string());

    let roles = claims
        .roles
        .unwrap_or_default()
        .into_iter()
        .filter_map(coerce_to_string)
        .collect();

    let expires_at = claims
        .exp
        .and_then(|exp| Utc.timestamp_opt(exp, 0).single());

    Some(Session {
        subject,
        roles,
        expires_at,
    })
}

/// Whether the given access token should be considered expired under a
/// grace period: true when there is no token, the token does not
/// decode, it carries no expiry, or the expiry is at or before
/// `now + grace`.
pub fn is_expired(token: Option<&str>, grace_seconds: i64) -> bool {
    let Some(token) = token else {
        return true;
    };
    let Some(session) = decode(token) else {
        return true;
    };
    let Some(expires_at) = session.expires_at else {
        return true;
    };
    expires_at <= Utc::now() + chrono::Duration::seconds(grace_seconds)
}

fn coerce_to_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::utils::test_helpers::make_token;
    use serde_json::json;

    mod unit {
        use super::*;

        #[test]
        fn decodes_subject_and_roles() {
            let token = make_token(json!({
                "sub": 42,
                "username": "mgarcia",
                "roles": ["RRHH", "Supervisor"],
                "exp": 4_102_444_800i64,
            }));
            let session = decode(&token).unwrap();
            assert_eq!(session.subject, "42");
            assert_eq!(session.roles, vec!["RRHH", "Supervisor"]);
            assert!(session.expires_at.is_some());
        }

        #[test]
        fn subject_falls_back_through_username_and_email() {
            let token = make_token(json!({ "username": "mgarcia", "exp": 4_102_444_800i64 }));
            assert_eq!(decode(&token).unwrap().subject, "mgarcia");

            let token = make_token(json!({ "email": "m@acme.mx", "exp": 4_102_444_800i64 }));
            assert_eq!(decode(&token).unwrap().subject, "m@acme.mx");

            let token = make_token(json!({ "exp": 4_102_444_800i64 }));
            assert_eq!(decode(&token).unwrap().subject, "user");
        }

        #[test]
        fn missing_roles_claim_is_empty_list() {
            let token = make_token(json!({ "sub": "s", "exp": 4_102_444_800i64 }));
            assert!(decode(&token).unwrap().roles.is_empty());
        }

        #[test]
        fn malformed_token_yields_none() {
            assert!(decode("").is_none());
            assert!(decode("not-a-jwt").is_none());
            assert!(decode("a.!!!not-base64!!!.c").is_none());
            // Valid base64, invalid JSON payload.
            assert!(decode("a.bm90LWpzb24.c").is_none());
        }

        #[test]
        fn expiry_check_with_grace() {
            let now = Utc::now().timestamp();

            let soon = make_token(json!({ "sub": "s", "exp": now + 10 }));
            assert!(is_expired(Some(&soon), DEFAULT_GRACE_SECONDS));

            let later = make_token(json!({ "sub": "s", "exp": now + 3600 }));
            assert!(!is_expired(Some(&later), DEFAULT_GRACE_SECONDS));
        }

        #[test]
        fn expiry_check_edge_cases() {
            assert!(is_expired(None, DEFAULT_GRACE_SECONDS));
            assert!(is_expired(Some("garbage"), DEFAULT_GRACE_SECONDS));

            // No exp claim counts as expired.
            let token = make_token(json!({ "sub": "s" }));
            assert!(is_expired(Some(&token), DEFAULT_GRACE_SECONDS));
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn decode_never_panics(s in "\\PC*") {
                let _ = decode(&s);
            }

            #[test]
            fn decode_is_deterministic(s in "\\PC*") {
                prop_assert_eq!(decode(&s), decode(&s));
            }

            #[test]
            fn far_future_expiry_is_not_expired(offset in 3600i64..1_000_000) {
                let token = make_token(serde_json::json!({
                    "sub": "s",
                    "exp": Utc::now().timestamp() + offset,
                }));
                prop_assert!(!is_expired(Some(&token), DEFAULT_GRACE_SECONDS));
            }
        }
    }
}
