use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use tokio::sync::RwLock;
use tracing::warn;

use crate::{
    cookie::{COOKIE_NAME, encode_store, expired_cookie, load_store, set_cookie},
    error::AppError,
    state::{State, Storage},
    store::{StoreError, TodoStore},
};

/// Per-request view of whichever store the server is configured with.
pub enum StoreHandle {
    Shared(Arc<RwLock<TodoStore>>),
    Client {
        store: TodoStore,
        dirty: bool,
        /// The request's cookie was refused and should be expired.
        discarded: bool,
    },
}

impl StoreHandle {
    fn client(store: TodoStore, discarded: bool) -> Self {
        StoreHandle::Client {
            store,
            dirty: false,
            discarded,
        }
    }

    pub async fn read<T>(&self, f: impl FnOnce(&TodoStore) -> T) -> T {
        match self {
            StoreHandle::Shared(lock) => f(&*lock.read().await),
            StoreHandle::Client { store, .. } => f(store),
        }
    }

    pub async fn write<T>(
        &mut self,
        f: impl FnOnce(&mut TodoStore) -> Result<T, StoreError>,
    ) -> Result<T, AppError> {
        let result = match self {
            StoreHandle::Shared(lock) => f(&mut *lock.write().await),
            StoreHandle::Client { store, dirty, .. } => {
                let result = f(store);
                *dirty |= result.is_ok();
                result
            }
        };

        Ok(result?)
    }

    /// Finishes the request, writing the client's list back when it changed and
    /// expiring a refused cookie otherwise.
    pub fn respond(self, response: impl IntoResponse) -> Result<Response, AppError> {
        let mut response = response.into_response();

        match self {
            StoreHandle::Client {
                store, dirty: true, ..
            } => set_cookie(response.headers_mut(), encode_store(&store)?),
            StoreHandle::Client {
                discarded: true, ..
            } => set_cookie(response.headers_mut(), expired_cookie()),
            _ => {}
        }

        Ok(response)
    }
}

impl FromRequestParts<Arc<State>> for StoreHandle {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<State>,
    ) -> Result<Self, Self::Rejection> {
        Ok(match &state.storage {
            Storage::Memory(lock) => StoreHandle::Shared(lock.clone()),
            Storage::Cookie => match load_store(&parts.headers) {
                Ok(store) => StoreHandle::client(store, false),
                Err(e) => {
                    warn!("Discarding {COOKIE_NAME} cookie: {e}");
                    StoreHandle::client(TodoStore::new(), true)
                }
            },
        })
    }
}

/// Path id that turns a non-integer segment into a 422.
pub struct TodoId(pub u64);

impl<S> FromRequestParts<S> for TodoId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<u64>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::InvalidId)?;

        Ok(TodoId(id))
    }
}
