use axum::{
    Form, Json,
    http::StatusCode,
    response::{Html, Redirect, Response},
};
use tracing::info;

use crate::{
    error::AppError,
    handle::{StoreHandle, TodoId},
    models::{Health, Todo, TodoCreate, TodoForm, TodoUpdate},
    utils::{clean_update, require_title, sanitize_description},
    views,
};

pub async fn health_handler() -> Json<Health> {
    Json(Health {
        status: "healthy",
        message: "Todo app is running",
    })
}

pub async fn index_handler(store: StoreHandle) -> Result<Response, AppError> {
    let todos = store.read(|store| store.list().to_vec()).await;

    store.respond(Html(views::index(&todos)))
}

pub async fn create_page_handler() -> Html<String> {
    Html(views::create_form())
}

pub async fn create_handler(
    mut store: StoreHandle,
    Form(form): Form<TodoForm>,
) -> Result<Response, AppError> {
    let title = require_title(&form.title)?;
    let description = sanitize_description(&form.description);

    let todo = store
        .write(|store| store.create(title, description))
        .await?;
    info!("Created todo {}", todo.id);

    store.respond(Redirect::to("/"))
}

pub async fn edit_page_handler(
    store: StoreHandle,
    TodoId(id): TodoId,
) -> Result<Response, AppError> {
    let todo = store
        .read(|store| store.find_by_id(id).cloned())
        .await
        .ok_or(AppError::NotFound(id))?;

    store.respond(Html(views::edit_form(&todo)))
}

pub async fn edit_handler(
    mut store: StoreHandle,
    TodoId(id): TodoId,
    Form(form): Form<TodoForm>,
) -> Result<Response, AppError> {
    let update = clean_update(TodoUpdate::from(form))?;

    store.write(|store| store.update_by_id(id, update)).await?;
    info!("Updated todo {id}");

    store.respond(Redirect::to("/"))
}

pub async fn toggle_handler(
    mut store: StoreHandle,
    TodoId(id): TodoId,
) -> Result<Response, AppError> {
    let todo = store.write(|store| store.toggle_by_id(id)).await?;
    info!("Todo {id} completed: {}", todo.completed);

    store.respond(Redirect::to("/"))
}

pub async fn delete_handler(
    mut store: StoreHandle,
    TodoId(id): TodoId,
) -> Result<Response, AppError> {
    store.write(|store| store.delete_by_id(id)).await?;
    info!("Deleted todo {id}");

    store.respond(Redirect::to("/"))
}

pub async fn list_todos_handler(store: StoreHandle) -> Result<Response, AppError> {
    let todos: Vec<Todo> = store.read(|store| store.list().to_vec()).await;

    store.respond(Json(todos))
}

pub async fn get_todo_handler(
    store: StoreHandle,
    TodoId(id): TodoId,
) -> Result<Response, AppError> {
    let todo = store
        .read(|store| store.find_by_id(id).cloned())
        .await
        .ok_or(AppError::NotFound(id))?;

    store.respond(Json(todo))
}

pub async fn create_todo_handler(
    mut store: StoreHandle,
    Json(payload): Json<TodoCreate>,
) -> Result<Response, AppError> {
    let title = require_title(&payload.title)?;
    let description = sanitize_description(&payload.description);

    let todo = store
        .write(|store| store.create(title, description))
        .await?;
    info!("Created todo {} via API", todo.id);

    store.respond((StatusCode::CREATED, Json(todo)))
}

pub async fn update_todo_handler(
    mut store: StoreHandle,
    TodoId(id): TodoId,
    Json(payload): Json<TodoUpdate>,
) -> Result<Response, AppError> {
    let update = clean_update(payload)?;

    let todo = store.write(|store| store.update_by_id(id, update)).await?;
    info!("Updated todo {id} via API");

    store.respond(Json(todo))
}

pub async fn delete_todo_handler(
    mut store: StoreHandle,
    TodoId(id): TodoId,
) -> Result<Response, AppError> {
    store.write(|store| store.delete_by_id(id)).await?;
    info!("Deleted todo {id} via API");

    store.respond(StatusCode::NO_CONTENT)
}
