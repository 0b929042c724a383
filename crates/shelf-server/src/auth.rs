use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use shelf_policy::Principal;
use shelf_types::UserId;
use uuid::Uuid;

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
    Anonymous,
}

impl Credentials {
    /// Read the `Authorization` header. A missing header is anonymous;
    /// anything other than a non-empty bearer token is rejected.
    pub fn from_headers(headers: &HeaderMap) -> ServerResult<Self> {
        let Some(value) = headers.get(AUTHORIZATION) else {
            return Ok(Self::Anonymous);
        };
        let value = value
            .to_str()
            .map_err(|_| ServerError::AuthFailed("malformed authorization header".into()))?;
        match value.split_once(' ') {
            Some((scheme, token))
                if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() =>
            {
                Ok(Self::Bearer(token.trim().to_string()))
            }
            _ => Err(ServerError::AuthFailed(
                "expected a bearer token".into(),
            )),
        }
    }
}

/// Resolves request credentials to the principal acting on the catalog.
///
/// Anonymous credentials resolve to `None`; credentials that name no known
/// session are an error rather than silently anonymous.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Option<Principal>>;
}

/// In-process bearer sessions created by `POST /v1/login`.
#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: RwLock<HashMap<String, Principal>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session for `principal` and return its token.
    pub fn issue(&self, principal: Principal) -> String {
        let token = Uuid::now_v7().simple().to_string();
        tracing::debug!(user = principal.user_id.get(), "session issued");
        self.sessions
            .write()
            .expect("lock poisoned")
            .insert(token.clone(), principal);
        token
    }

    pub fn lookup(&self, token: &str) -> Option<Principal> {
        self.sessions
            .read()
            .expect("lock poisoned")
            .get(token)
            .cloned()
    }

    /// End a session. Returns whether the token was live.
    pub fn revoke(&self, token: &str) -> bool {
        self.sessions
            .write()
            .expect("lock poisoned")
            .remove(token)
            .is_some()
    }

    /// End every session held by `user_id`. Returns how many were live.
    pub fn revoke_user(&self, user_id: UserId) -> usize {
        let mut sessions = self.sessions.write().expect("lock poisoned");
        let before = sessions.len();
        sessions.retain(|_, principal| principal.user_id != user_id);
        let revoked = before - sessions.len();
        if revoked > 0 {
            tracing::info!(user = user_id.get(), revoked, "sessions revoked");
        }
        revoked
    }

    pub fn len(&self) -> usize {
        self.sessions.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuthProvider for SessionTable {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Option<Principal>> {
        match credentials {
            Credentials::Anonymous => Ok(None),
            Credentials::Bearer(token) => self
                .lookup(token)
                .map(Some)
                .ok_or_else(|| ServerError::AuthFailed("unknown or expired session".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn credentials_from_headers() {
        assert_eq!(
            Credentials::from_headers(&HeaderMap::new()).unwrap(),
            Credentials::Anonymous
        );
        assert_eq!(
            Credentials::from_headers(&headers("Bearer abc123")).unwrap(),
            Credentials::Bearer("abc123".into())
        );
        assert_eq!(
            Credentials::from_headers(&headers("bearer abc123")).unwrap(),
            Credentials::Bearer("abc123".into())
        );
        assert!(Credentials::from_headers(&headers("Basic dXNlcjpwYXNz")).is_err());
        assert!(Credentials::from_headers(&headers("Bearer ")).is_err());
    }

    #[test]
    fn tokens_are_unique() {
        let table = SessionTable::new();
        let a = table.issue(Principal::new(UserId::new(1), "Reader"));
        let b = table.issue(Principal::new(UserId::new(1), "Reader"));
        assert_ne!(a, b);
        assert_eq!(table.len(), 2);
    }

    #[tokio::test]
    async fn session_lifecycle() {
        let table = SessionTable::new();
        let principal = Principal::new(UserId::new(7), "Moderator");
        let token = table.issue(principal.clone());

        let resolved = table
            .authenticate(&Credentials::Bearer(token.clone()))
            .await
            .unwrap();
        assert_eq!(resolved, Some(principal));

        assert!(table.revoke(&token));
        assert!(!table.revoke(&token));
        assert!(matches!(
            table.authenticate(&Credentials::Bearer(token)).await,
            Err(ServerError::AuthFailed(_))
        ));
    }

    #[test]
    fn revoke_user_ends_only_that_users_sessions() {
        let table = SessionTable::new();
        let gone = UserId::new(3);
        let first = table.issue(Principal::new(gone, "Reader"));
        let second = table.issue(Principal::new(gone, "Reader"));
        let kept = table.issue(Principal::new(UserId::new(4), "Reader"));

        assert_eq!(table.revoke_user(gone), 2);
        assert!(table.lookup(&first).is_none());
        assert!(table.lookup(&second).is_none());
        assert!(table.lookup(&kept).is_some());
        assert_eq!(table.revoke_user(gone), 0);
    }

    #[tokio::test]
    async fn anonymous_is_no_principal() {
        let table = SessionTable::new();
        assert_eq!(table.authenticate(&Credentials::Anonymous).await.unwrap(), None);
        assert!(table.is_empty());
    }
}
