use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use shelf_policy::Principal;
use shelf_sdk::{Library, LibraryError};
use tokio::sync::Mutex;

use crate::auth::{AuthProvider, Credentials, SessionTable};
use crate::error::{ServerError, ServerResult};

/// Shared by every request. Catalog operations run one at a time.
#[derive(Clone)]
pub struct AppState {
    pub library: Arc<Mutex<Library>>,
    pub sessions: Arc<SessionTable>,
}

impl AppState {
    pub fn new(library: Library) -> Self {
        Self {
            library: Arc::new(Mutex::new(library)),
            sessions: Arc::new(SessionTable::new()),
        }
    }

    /// Run `f` with exclusive access to the library on the blocking pool.
    ///
    /// SQLite queries and password hashing are synchronous and must not
    /// occupy an async worker.
    pub async fn with_library<T, F>(&self, f: F) -> ServerResult<T>
    where
        F: FnOnce(&mut Library) -> T + Send + 'static,
        T: Send + 'static,
    {
        let library = Arc::clone(&self.library);
        tokio::task::spawn_blocking(move || f(&mut *library.blocking_lock()))
            .await
            .map_err(|e| ServerError::Internal(format!("library task failed: {e}")))
    }
}

/// The principal behind a request, `None` when it carried no credentials.
///
/// A session whose account has since been deleted is revoked and rejected.
/// The role is re-read from the account, so role changes apply to live
/// sessions.
#[derive(Clone, Debug)]
pub struct Caller(pub Option<Principal>);

impl Caller {
    pub fn principal(&self) -> Option<&Principal> {
        self.0.as_ref()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let credentials = Credentials::from_headers(&parts.headers)?;
        let Some(session) = state.sessions.authenticate(&credentials).await? else {
            return Ok(Self(None));
        };
        let user_id = session.user_id;
        match state.with_library(move |lib| lib.get_user(user_id)).await? {
            Ok(user) => Ok(Self(Some(Principal::new(user.id, user.role_name)))),
            Err(LibraryError::NotFound { .. }) => {
                state.sessions.revoke_user(user_id);
                Err(ServerError::AuthFailed("the account no longer exists".into()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
