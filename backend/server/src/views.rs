//! Server-rendered pages. Every piece of user text passes through [`escape`].
use crate::models::Todo;

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" href="/static/style.css">
</head>
<body>
<main>
{body}
</main>
</body>
</html>
"#
    )
}

pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());

    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }

    out
}

pub fn index(todos: &[Todo]) -> String {
    let mut body = String::from("<h1>Todo List</h1>\n<p><a href=\"/create\">Create new entry</a></p>\n");

    if todos.is_empty() {
        body.push_str("<p class=\"empty\">Nothing to do.</p>\n");
        return page("Todo List", &body);
    }

    body.push_str("<ul class=\"todos\">\n");
    for todo in todos {
        let (class, label) = if todo.completed {
            ("done", "Undo")
        } else {
            ("open", "Done")
        };

        body.push_str(&format!(
            r#"<li class="{class}">
<h2>{title}</h2>
<p>{description}</p>
<a href="/toggle/{id}">{label}</a>
<a href="/edit/{id}">Edit</a>
<a href="/delete/{id}">Delete</a>
</li>
"#,
            id = todo.id,
            title = escape(&todo.title),
            description = escape(&todo.description),
        ));
    }
    body.push_str("</ul>\n");

    page("Todo List", &body)
}

fn form(heading: &str, action: &str, title: &str, description: &str, submit: &str) -> String {
    let body = format!(
        r#"<h1>{heading}</h1>
<form method="post" action="{action}">
<label for="title">Title</label>
<input type="text" id="title" name="title" value="{title}" required>
<label for="description">Description</label>
<textarea id="description" name="description">{description}</textarea>
<button type="submit">{submit}</button>
</form>
<p><a href="/">Back</a></p>
"#,
        title = escape(title),
        description = escape(description),
    );

    page(heading, &body)
}

pub fn create_form() -> String {
    form("Create new entry", "/create", "", "", "Create")
}

pub fn edit_form(todo: &Todo) -> String {
    form(
        "Edit entry",
        &format!("/edit/{}", todo.id),
        &todo.title,
        &todo.description,
        "Save",
    )
}
