//! # Todo Store
//!
//! Ordered, in-process collection of todos.
//!
//! ## Ids
//! - First id handed out by a fresh store is 1
//! - Every later id is one past the larger of the biggest live id and the biggest id ever issued
//! - Deleting the newest todo therefore never frees its id for reuse
//! - Ids stop at [`MAX_ID`] so they stay exact as JSON numbers, past that creates fail
//!
//! ## Ownership
//! The store itself does no locking. In memory mode it lives behind the `RwLock` in
//! [`crate::state::Storage`], so id generation and every mutation run under one writer.
//! In cookie mode a fresh store is rebuilt from the client's cookie for each request.
use std::collections::HashSet;

use thiserror::Error;

use crate::{
    models::{Todo, TodoUpdate},
    utils::{sanitize_description, sanitize_title},
};

/// Largest id the store hands out, 2^53 - 1.
pub const MAX_ID: u64 = (1 << 53) - 1;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("Todo {0} not found")]
    NotFound(u64),

    #[error("No todo ids left to assign")]
    IdsExhausted,
}

/// Why a list of records from outside the server was refused.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("Invalid todo record: {0}")]
pub struct RecordError(pub String);

#[derive(Debug, Default, Clone)]
pub struct TodoStore {
    todos: Vec<Todo>,
    last_issued: u64,
}

impl TodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from records nobody on the server vouched for.
    pub fn from_records(records: Vec<Todo>) -> Result<Self, RecordError> {
        let mut seen = HashSet::with_capacity(records.len());
        let mut todos = Vec::with_capacity(records.len());

        for record in records {
            if record.id == 0 || record.id > MAX_ID {
                return Err(RecordError(format!("id {} out of range", record.id)));
            }

            if !seen.insert(record.id) {
                return Err(RecordError(format!(
                    "duplicate id {}",
                    record.id
                )));
            }

            let title = sanitize_title(&record.title);
            if title.is_empty() {
                return Err(RecordError(format!(
                    "todo {} has an empty title",
                    record.id
                )));
            }

            todos.push(Todo {
                id: record.id,
                title,
                description: sanitize_description(&record.description),
                completed: record.completed,
            });
        }

        let last_issued = todos.iter().map(|todo| todo.id).max().unwrap_or(0);

        Ok(Self { todos, last_issued })
    }

    pub fn list(&self) -> &[Todo] {
        &self.todos
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    pub fn generate_id(&self) -> Result<u64, StoreError> {
        let max_live = self.todos.iter().map(|todo| todo.id).max().unwrap_or(0);

        max_live
            .max(self.last_issued)
            .checked_add(1)
            .filter(|id| *id <= MAX_ID)
            .ok_or(StoreError::IdsExhausted)
    }

    pub fn create(&mut self, title: String, description: String) -> Result<Todo, StoreError> {
        let todo = Todo {
            id: self.generate_id()?,
            title,
            description,
            completed: false,
        };

        self.last_issued = todo.id;
        self.todos.push(todo.clone());

        Ok(todo)
    }

    pub fn find_by_id(&self, id: u64) -> Option<&Todo> {
        self.todos.iter().find(|todo| todo.id == id)
    }

    /// Merges the supplied fields into the record, leaving the rest untouched.
    pub fn update_by_id(&mut self, id: u64, update: TodoUpdate) -> Result<Todo, StoreError> {
        let todo = self.find_mut(id)?;

        if let Some(title) = update.title {
            todo.title = title;
        }
        if let Some(description) = update.description {
            todo.description = description;
        }
        if let Some(completed) = update.completed {
            todo.completed = completed;
        }

        Ok(todo.clone())
    }

    pub fn toggle_by_id(&mut self, id: u64) -> Result<Todo, StoreError> {
        let todo = self.find_mut(id)?;
        todo.completed = !todo.completed;

        Ok(todo.clone())
    }

    pub fn delete_by_id(&mut self, id: u64) -> Result<Todo, StoreError> {
        let index = self
            .todos
            .iter()
            .position(|todo| todo.id == id)
            .ok_or(StoreError::NotFound(id))?;

        Ok(self.todos.remove(index))
    }

    fn find_mut(&mut self, id: u64) -> Result<&mut Todo, StoreError> {
        self.todos
            .iter_mut()
            .find(|todo| todo.id == id)
            .ok_or(StoreError::NotFound(id))
    }
}
