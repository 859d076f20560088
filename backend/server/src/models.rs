use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

/// Body of the HTML create/edit forms.
#[derive(Deserialize, Debug)]
pub struct TodoForm {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize, Debug)]
pub struct TodoCreate {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Merge patch: fields left as `None` keep their current value.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct TodoUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl From<TodoForm> for TodoUpdate {
    fn from(form: TodoForm) -> Self {
        Self {
            title: Some(form.title),
            description: Some(form.description),
            completed: None,
        }
    }
}

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub message: &'static str,
}
