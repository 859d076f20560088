//! Documentation of a small to-do list service.
//!
//!
//!
//! # General Infrastructure
//! - One axum server, HTML pages and a JSON API over the same list
//! - Pages read the store directly, there is no self-call through the JSON API
//! - Store is injected through router state, never a global
//!
//!
//!
//! # Storage Modes
//!
//! **Memory** (`TODO_STORAGE=memory`, default)
//! - One list shared by every client, gone when the process exits
//! - Single `RwLock`, so id generation and mutations never race
//!
//! **Cookie** (`TODO_STORAGE=cookie`)
//! - Each client keeps its own list in the `todos` cookie
//! - Server rebuilds the list from the cookie on every request and holds nothing afterwards
//! - Cookie content is validated and sanitized, broken cookies mean an empty list
//!
//!
//!
//! # Routes
//!
//! | Method | Path | Result |
//! |---|---|---|
//! | GET | `/` | list page |
//! | GET/POST | `/create` | form / 303 to `/` |
//! | GET/POST | `/edit/{id}` | form / 303 to `/`, 404 if missing |
//! | GET | `/toggle/{id}` | 303 to `/`, 404 if missing |
//! | GET | `/delete/{id}` | 303 to `/`, 404 if missing |
//! | GET/POST | `/todos` | JSON list / 201 new todo |
//! | GET/PATCH/DELETE | `/todos/{id}` | JSON todo / merged todo / 204 |
//! | GET | `/health` | liveness |
//!
//! Non-integer ids are answered with 422 before any store logic runs.
//!
//!
//!
//! # Setup
//!
//! Run with logs.
//! ```sh
//! RUST_LOG=info cargo run
//! ```
//!
//! Cookie mode on another port.
//! ```sh
//! TODO_STORAGE=cookie TODO_PORT=8000 cargo run
//! ```
use std::{sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::get,
};

use signal::ctrl_c;
#[cfg(unix)]
use signal::unix::{SignalKind, signal};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod cookie;
pub mod error;
pub mod handle;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;
pub mod views;

use config::Config;
use routes::{
    create_handler, create_page_handler, create_todo_handler, delete_handler,
    delete_todo_handler, edit_handler, edit_page_handler, get_todo_handler, health_handler,
    index_handler, list_todos_handler, toggle_handler, update_todo_handler,
};
use state::State;

pub fn app(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/", get(index_handler))
        .route("/create", get(create_page_handler).post(create_handler))
        .route("/edit/{id}", get(edit_page_handler).post(edit_handler))
        .route("/toggle/{id}", get(toggle_handler))
        .route("/delete/{id}", get(delete_handler))
        .route("/todos", get(list_todos_handler).post(create_todo_handler))
        .route(
            "/todos/{id}",
            get(get_todo_handler)
                .patch(update_todo_handler)
                .delete(delete_todo_handler),
        )
        .route("/health", get(health_handler))
        .nest_service("/static", ServeDir::new(&state.config.static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn serve(listener: TcpListener, state: Arc<State>) -> anyhow::Result<()> {
    let address = listener.local_addr().context("Listener has no local address")?;
    info!("Server running on {address} with {:?} storage", state.config.storage);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");

    Ok(())
}

pub async fn start_server() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;
    let state = State::new(config);

    let address = state.config.address();
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;

    serve(listener, state).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{
            Request, StatusCode,
            header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        },
        response::Response,
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::config::StorageMode;

    fn make_app(storage: StorageMode) -> Router {
        app(State::new(Config {
            storage,
            ..Config::default()
        }))
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn form_req(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn json_req(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: &Router, req: Request<Body>) -> Response {
        app.clone().oneshot(req).await.unwrap()
    }

    async fn body_text(resp: Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), 100_000)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(resp: Response) -> Value {
        serde_json::from_str(&body_text(resp).await).unwrap()
    }

    fn assert_redirect_home(resp: &Response) {
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[LOCATION], "/");
    }

    fn ids(value: &Value) -> Vec<u64> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|todo| todo["id"].as_u64().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn index_page_loads() {
        let app = make_app(StorageMode::Memory);

        let resp = send(&app, get_req("/")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("Todo List"));
    }

    #[tokio::test]
    async fn create_page_loads() {
        let app = make_app(StorageMode::Memory);

        let resp = send(&app, get_req("/create")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("Create new entry"));
    }

    #[tokio::test]
    async fn create_redirects_and_lists() {
        let app = make_app(StorageMode::Memory);

        let resp = send(
            &app,
            form_req("/create", "title=Test+Todo&description=This+is+a+test"),
        )
        .await;
        assert_redirect_home(&resp);

        let page = body_text(send(&app, get_req("/")).await).await;
        assert!(page.contains("Test Todo"));

        let todos = body_json(send(&app, get_req("/todos")).await).await;
        assert_eq!(todos[0]["description"], "This is a test");
        assert_eq!(todos[0]["completed"], false);
    }

    #[tokio::test]
    async fn create_without_description() {
        let app = make_app(StorageMode::Memory);

        let resp = send(&app, form_req("/create", "title=Bare")).await;
        assert_redirect_home(&resp);

        let todo = body_json(send(&app, get_req("/todos/1")).await).await;
        assert_eq!(todo["description"], "");
    }

    #[tokio::test]
    async fn create_rejects_blank_title() {
        let app = make_app(StorageMode::Memory);

        let resp = send(&app, form_req("/create", "title=++&description=x")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let todos = body_json(send(&app, get_req("/todos")).await).await;
        assert_eq!(todos, json!([]));
    }

    #[tokio::test]
    async fn edit_page_loads_and_404s() {
        let app = make_app(StorageMode::Memory);
        send(&app, form_req("/create", "title=Existing+Todo&description=Pre")).await;

        let resp = send(&app, get_req("/edit/1")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let page = body_text(resp).await;
        assert!(page.contains("Edit entry"));
        assert!(page.contains("Existing Todo"));

        let resp = send(&app, get_req("/edit/999")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn edit_merges_and_keeps_completed() {
        let app = make_app(StorageMode::Memory);
        send(&app, form_req("/create", "title=Old&description=Old")).await;
        send(&app, get_req("/toggle/1")).await;

        let resp = send(
            &app,
            form_req("/edit/1", "title=Updated+Title&description=Updated"),
        )
        .await;
        assert_redirect_home(&resp);

        let todo = body_json(send(&app, get_req("/todos/1")).await).await;
        assert_eq!(
            todo,
            json!({"id": 1, "title": "Updated Title", "description": "Updated", "completed": true})
        );

        let resp = send(&app, form_req("/edit/5", "title=x&description=y")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn toggle_twice_restores() {
        let app = make_app(StorageMode::Memory);
        send(&app, form_req("/create", "title=Buy+milk")).await;
        send(&app, form_req("/create", "title=Walk+dog")).await;

        assert_redirect_home(&send(&app, get_req("/toggle/2")).await);
        let todo = body_json(send(&app, get_req("/todos/2")).await).await;
        assert_eq!(todo["completed"], true);

        send(&app, get_req("/toggle/2")).await;
        let todo = body_json(send(&app, get_req("/todos/2")).await).await;
        assert_eq!(todo["completed"], false);

        let resp = send(&app, get_req("/toggle/42")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_does_not_reuse_ids() {
        let app = make_app(StorageMode::Memory);
        send(&app, form_req("/create", "title=Buy+milk")).await;
        send(&app, form_req("/create", "title=Walk+dog")).await;

        assert_redirect_home(&send(&app, get_req("/delete/1")).await);
        send(&app, form_req("/create", "title=Read+book")).await;

        let todos = body_json(send(&app, get_req("/todos")).await).await;
        assert_eq!(ids(&todos), vec![2, 3]);

        let resp = send(&app, get_req("/todos/1")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = send(&app, get_req("/delete/1")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn get_todo_not_found_payload() {
        let app = make_app(StorageMode::Memory);

        let resp = send(&app, get_req("/todos/999")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = body_json(resp).await;
        assert!(body["error"].as_str().unwrap().to_lowercase().contains("not found"));
    }

    #[tokio::test]
    async fn invalid_id_is_unprocessable() {
        let app = make_app(StorageMode::Memory);

        for uri in ["/todos/abc", "/edit/abc", "/toggle/-1", "/delete/1.5"] {
            let resp = send(&app, get_req(uri)).await;
            assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
        }
    }

    #[tokio::test]
    async fn json_api_crud() {
        let app = make_app(StorageMode::Memory);

        let resp = send(
            &app,
            json_req("POST", "/todos", json!({"title": "Write report"})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created = body_json(resp).await;
        assert_eq!(
            created,
            json!({"id": 1, "title": "Write report", "description": "", "completed": false})
        );

        let resp = send(
            &app,
            json_req("PATCH", "/todos/1", json!({"completed": true})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let patched = body_json(resp).await;
        assert_eq!(patched["title"], "Write report");
        assert_eq!(patched["completed"], true);

        let resp = send(
            &app,
            json_req("PATCH", "/todos/1", json!({"title": "   "})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = send(
            &app,
            Request::builder()
                .method("DELETE")
                .uri("/todos/1")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = send(&app, json_req("PATCH", "/todos/1", json!({}))).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_check() {
        let app = make_app(StorageMode::Memory);

        let body = body_json(send(&app, get_req("/health")).await).await;
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn cookie_mode_round_trips_through_client() {
        let app = make_app(StorageMode::Cookie);

        let resp = send(&app, form_req("/create", "title=Buy+milk")).await;
        assert_redirect_home(&resp);
        let cookie = resp.headers()[SET_COOKIE]
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string();

        let with_cookie = |uri: &str| {
            Request::builder()
                .uri(uri)
                .header(COOKIE, cookie.as_str())
                .body(Body::empty())
                .unwrap()
        };

        let todos = body_json(send(&app, with_cookie("/todos")).await).await;
        assert_eq!(ids(&todos), vec![1]);

        let resp = send(&app, with_cookie("/toggle/1")).await;
        assert_redirect_home(&resp);
        assert!(resp.headers()[SET_COOKIE].to_str().unwrap().starts_with("todos="));

        // Reads never rewrite the cookie.
        let resp = send(&app, with_cookie("/todos/1")).await;
        assert!(resp.headers().get(SET_COOKIE).is_none());

        // Another client without the cookie sees nothing.
        let todos = body_json(send(&app, get_req("/todos")).await).await;
        assert_eq!(todos, json!([]));
    }

    #[tokio::test]
    async fn cookie_mode_ignores_tampered_cookie() {
        let app = make_app(StorageMode::Cookie);

        let req = Request::builder()
            .uri("/todos")
            .header(COOKIE, "todos=%5B%7B%22id%22%3A0%2C%22title%22%3A%22x%22%7D%5D")
            .body(Body::empty())
            .unwrap();

        let resp = send(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let expired = resp.headers()[SET_COOKIE].to_str().unwrap().to_string();
        assert!(expired.starts_with("todos=;"));
        assert!(expired.contains("Max-Age=0"));
        assert_eq!(body_json(resp).await, json!([]));
    }

    fn form_req_with_cookie(uri: &str, body: &str, records: &str) -> Request<Body> {
        let encoded = percent_encoding::utf8_percent_encode(
            records,
            percent_encoding::NON_ALPHANUMERIC,
        );
        let mut req = form_req(uri, body);
        req.headers_mut()
            .insert(COOKIE, format!("todos={encoded}").parse().unwrap());
        req
    }

    #[tokio::test]
    async fn cookie_mode_out_of_range_id_starts_over() {
        let app = make_app(StorageMode::Cookie);

        let req = form_req_with_cookie(
            "/create",
            "title=after",
            r#"[{"id":18446744073709551615,"title":"x"}]"#,
        );
        let resp = send(&app, req).await;
        assert_redirect_home(&resp);

        let cookies: Vec<_> = resp.headers().get_all(SET_COOKIE).iter().collect();
        assert_eq!(cookies.len(), 1);
        let cookie = cookies[0].to_str().unwrap();
        assert!(!cookie.contains("Max-Age=0"));

        let json = percent_encoding::percent_decode_str(
            cookie.split(';').next().unwrap().trim_start_matches("todos="),
        )
        .decode_utf8()
        .unwrap()
        .to_string();
        let todos: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(ids(&todos), vec![1]);
    }

    #[tokio::test]
    async fn cookie_mode_create_at_last_id_conflicts() {
        let app = make_app(StorageMode::Cookie);

        let req = form_req_with_cookie(
            "/create",
            "title=one+more",
            &format!(r#"[{{"id":{},"title":"x"}}]"#, store::MAX_ID),
        );
        let resp = send(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert!(resp.headers().get(SET_COOKIE).is_none());
        assert_eq!(
            body_json(resp).await["error"],
            "No todo ids left to assign"
        );
    }

    #[tokio::test]
    async fn serves_stylesheet() {
        let app = make_app(StorageMode::Memory);

        let resp = send(&app, get_req("/static/style.css")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("ul.todos"));
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let app = make_app(StorageMode::Memory);

        let resp = send(&app, get_req("/nonexistent")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
