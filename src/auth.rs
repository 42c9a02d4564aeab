//! Authentication operations: login, logout, session status.
//!
//! Token responses arrive under either `{access, refresh}` or
//! `{access_token, refresh_token}` naming depending on the backend
//! flavor; [`TokenPair::from_wire`] canonicalizes that here so the
//! ambiguity never travels past this boundary.

use reqwest::Method;
use serde_json::json;
use tracing::debug;

use crate::client::{Gateway, Transport};
use crate::error::{KardexError, Result};
use crate::session::{Session, DEFAULT_GRACE_SECONDS};
use crate::version::CURRENT_VERSION;

/// Canonical token pair. `refresh` stays `None` when the backend did
/// not rotate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access: String,
    pub refresh: Option<String>,
}

impl TokenPair {
    /// Normalize a raw token response. Returns `None` when no access
    /// token is present under either accepted key.
    pub fn from_wire(value: &serde_json::Value) -> Option<Self> {
        let access = string_field(value, &["access", "access_token"])?;
        let refresh = string_field(value, &["refresh", "refresh_token"]);
        Some(Self { access, refresh })
    }
}

fn string_field(value: &serde_json::Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| value.get(*k).and_then(|v| v.as_str()))
        .map(String::from)
}

/// Session status summary shown by `kardex status`.
#[derive(Debug)]
pub struct StatusInfo {
    pub version: String,
    pub authenticated: bool,
    pub expired: bool,
    pub session: Option<Session>,
    pub endpoint: String,
}

/// Login, logout and status on top of the gateway.
pub struct AuthService<'a, T: Transport> {
    gateway: &'a Gateway<T>,
}

impl<'a, T: Transport> AuthService<'a, T> {
    pub fn new(gateway: &'a Gateway<T>) -> Self {
        Self { gateway }
    }

    /// Exchange credentials for a token pair and persist it. Returns
    /// the decoded session when the access token decodes.
    pub async fn login(&self, username: &str, password: &str) -> Result<Option<Session>> {
        let login_path = self.gateway.config().login_path.clone();
        debug!(url = %self.gateway.config().login_url(), "exchanging credentials");
        let reply = self
            .gateway
            .execute_unauthenticated(
                Method::POST,
                &login_path,
                Some(json!({ "username": username, "password": password })),
            )
            .await?;

        if !reply.is_success() {
            if reply.is_unauthorized() {
                return Err(KardexError::invalid_credentials(reply.error_detail()));
            }
            return Err(reply.into_api_error());
        }

        let value: serde_json::Value = reply.json()?;
        let pair = TokenPair::from_wire(&value)
            .ok_or_else(|| KardexError::authentication("server returned no usable tokens"))?;
        let refresh = pair.refresh.ok_or_else(|| {
            KardexError::authentication("server returned no refresh token on login")
        })?;

        self.gateway.set_tokens(pair.access.clone(), Some(refresh))?;
        Ok(crate::session::decode(&pair.access))
    }

    /// Purely local: drop both tokens. No network call is made.
    pub fn logout(&self) -> Result<()> {
        self.gateway.clear_tokens()
    }

    pub fn status(&self) -> StatusInfo {
        let session = self.gateway.session();
        StatusInfo {
            version: CURRENT_VERSION.to_string(),
            authenticated: session.is_some(),
            expired: self.gateway.is_expired(DEFAULT_GRACE_SECONDS),
            session,
            endpoint: self.gateway.config().base_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ApiReply;
    use crate::config::ClientConfig;
    use crate::store::TokenStore;
    use crate::tests::mocks::MockTransport;
    use crate::tests::utils::test_helpers::make_token;

    fn gateway(transport: MockTransport) -> Gateway<MockTransport> {
        let config = ClientConfig {
            base_url: "https://rh.example.com/api".to_string(),
            ..ClientConfig::default()
        };
        Gateway::with_transport(transport, config, TokenStore::in_memory())
    }

    mod unit {
        use super::*;

        #[test]
        fn wire_pair_accepts_both_namings() {
            let short = serde_json::json!({"access": "a1", "refresh": "r1"});
            assert_eq!(
                TokenPair::from_wire(&short).unwrap(),
                TokenPair {
                    access: "a1".into(),
                    refresh: Some("r1".into())
                }
            );

            let long = serde_json::json!({"access_token": "a1", "refresh_token": "r1"});
            assert_eq!(
                TokenPair::from_wire(&long).unwrap(),
                TokenPair {
                    access: "a1".into(),
                    refresh: Some("r1".into())
                }
            );
        }

        #[test]
        fn wire_pair_requires_access() {
            assert!(TokenPair::from_wire(&serde_json::json!({"refresh": "r1"})).is_none());
            assert!(TokenPair::from_wire(&serde_json::json!({})).is_none());

            let access_only = TokenPair::from_wire(&serde_json::json!({"access": "a1"})).unwrap();
            assert_eq!(access_only.refresh, None);
        }

        // Login stores the pair and exposes the decoded session from
        // the access token.
        #[tokio::test]
        async fn login_persists_pair_and_decodes_session() {
            let access = make_token(serde_json::json!({
                "sub": "mgarcia",
                "roles": ["RRHH", "Supervisor"],
                "exp": 4_102_444_800i64,
            }));
            let body =
                serde_json::json!({"access": access.clone(), "refresh": "r1"}).to_string();
            let transport = MockTransport::scripted(move |req| {
                assert!(req.url.ends_with("/token/"));
                assert!(req.bearer.is_none());
                ApiReply {
                    status: 200,
                    body: body.clone(),
                }
            });
            let gateway = gateway(transport);

            let session = AuthService::new(&gateway)
                .login("mgarcia", "s3cret")
                .await
                .unwrap()
                .unwrap();

            assert_eq!(session.subject, "mgarcia");
            assert_eq!(session.roles, vec!["RRHH", "Supervisor"]);
            assert!(gateway.is_authenticated());
        }

        #[tokio::test]
        async fn login_rejects_bad_credentials() {
            let transport = MockTransport::scripted(|_| ApiReply {
                status: 401,
                body: serde_json::json!({"detail": "invalid credentials"}).to_string(),
            });
            let gateway = gateway(transport);

            let err = AuthService::new(&gateway)
                .login("mgarcia", "wrong")
                .await
                .unwrap_err();
            assert!(matches!(err, KardexError::Auth { .. }));
            assert!(!gateway.is_authenticated());
        }

        #[tokio::test]
        async fn login_without_tokens_is_an_error() {
            let transport = MockTransport::scripted(|_| ApiReply {
                status: 200,
                body: serde_json::json!({"ok": true}).to_string(),
            });
            let gateway = gateway(transport);

            let err = AuthService::new(&gateway)
                .login("mgarcia", "s3cret")
                .await
                .unwrap_err();
            assert!(matches!(err, KardexError::Auth { .. }));
        }

        #[tokio::test]
        async fn logout_clears_locally_without_network() {
            let transport = MockTransport::scripted(|_| ApiReply {
                status: 500,
                body: String::new(),
            });
            let gateway = gateway(transport);
            gateway
                .set_tokens("a1".to_string(), Some("r1".to_string()))
                .unwrap();

            AuthService::new(&gateway).logout().unwrap();
            assert!(!gateway.is_authenticated());
            assert!(gateway.transport_ref().calls().is_empty());
        }

        #[test]
        fn status_reports_unauthenticated_without_tokens() {
            let transport = MockTransport::scripted(|_| ApiReply {
                status: 200,
                body: String::new(),
            });
            let gateway = gateway(transport);

            let status = AuthService::new(&gateway).status();
            assert!(!status.authenticated);
            assert!(status.expired);
            assert!(status.session.is_none());
        }
    }
}
