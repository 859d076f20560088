//! # Cookie Storage
//!
//! The client owns its todo list. The server keeps nothing between requests.
//!
//! ## Format
//! - Cookie `todos`, value is the JSON array of records, percent-encoded
//! - Attributes: `Path=/; HttpOnly; SameSite=Lax`
//! - Browsers cap a cookie at roughly 4 KB, so anything past [`MAX_COOKIE_BYTES`] is refused
//!
//! ## Trust
//! Whatever comes back from the browser is untrusted. It goes through
//! [`TodoStore::from_records`] which rejects bad ids and sanitizes text. A cookie that
//! fails any of that is dropped, the client starts over with an empty list, and the
//! response expires the bad cookie so it is not sent again.
use axum::http::{
    HeaderMap, HeaderValue,
    header::{COOKIE, SET_COOKIE},
};
use percent_encoding::{NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use tracing::warn;

use crate::{
    error::AppError,
    models::Todo,
    store::{RecordError, TodoStore},
};

pub const COOKIE_NAME: &str = "todos";
pub const MAX_COOKIE_BYTES: usize = 4000;

/// Raw value of the `todos` cookie, if the request carries one.
pub fn read_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == COOKIE_NAME)
        .map(|(_, value)| value)
}

pub fn decode_store(raw: &str) -> Result<TodoStore, RecordError> {
    let json = percent_decode_str(raw)
        .decode_utf8()
        .map_err(|e| RecordError(e.to_string()))?;

    #[cfg(feature = "verbose")]
    tracing::info!("Decoded todos cookie: {json}");

    let records: Vec<Todo> =
        serde_json::from_str(&json).map_err(|e| RecordError(e.to_string()))?;

    TodoStore::from_records(records)
}

/// Store for this request. No cookie means an empty list.
pub fn load_store(headers: &HeaderMap) -> Result<TodoStore, RecordError> {
    match read_cookie(headers) {
        Some(raw) => decode_store(raw),
        None => Ok(TodoStore::new()),
    }
}

pub fn expired_cookie() -> HeaderValue {
    HeaderValue::from_static("todos=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}

pub fn encode_store(store: &TodoStore) -> Result<HeaderValue, AppError> {
    let json = serde_json::to_string(store.list()).map_err(|e| AppError::InternalError(e.into()))?;
    let encoded = utf8_percent_encode(&json, NON_ALPHANUMERIC).to_string();

    if encoded.len() > MAX_COOKIE_BYTES {
        warn!(
            "Refusing {} byte {COOKIE_NAME} cookie for {} todos",
            encoded.len(),
            store.len()
        );
        return Err(AppError::CookieTooLarge);
    }

    HeaderValue::from_str(&format!(
        "{COOKIE_NAME}={encoded}; Path=/; HttpOnly; SameSite=Lax"
    ))
    .map_err(|e| AppError::InternalError(e.into()))
}

pub fn set_cookie(headers: &mut HeaderMap, value: HeaderValue) {
    headers.append(SET_COOKIE, value);
}
