//! Guestbook demo for formshield
//!
//! Run with: cargo run -p guestbook
//!
//! Then visit: http://127.0.0.1:8080
//!
//! CSRF settings come from `FORMSHIELD_CSRF_*` variables (or a `.env` file).
//! Without `FORMSHIELD_CSRF_SECRET_KEY` the demo falls back to a fixed key.

use axum::extract::State;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Extension, Router};
use formshield::prelude::*;
use std::sync::{Arc, PoisonError, RwLock};
use tracing_subscriber::EnvFilter;

struct SignForm;

impl FormFields for SignForm {
    fn fields() -> Vec<Field> {
        vec![
            Field::string("name", "Name")
                .validator(DataRequired::new())
                .validator(Length::max(40)),
            Field::string("email", "Email (optional)")
                .validator(Optional::new())
                .validator(Email::new()),
            Field::text_area("message", "Message")
                .validator(DataRequired::new())
                .validator(Length::new(2, 200)),
            Field::submit("submit", "Sign"),
        ]
    }
}

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    message: String,
}

#[derive(Clone, Default)]
struct AppState {
    entries: Arc<RwLock<Vec<Entry>>>,
}

impl AppState {
    fn record(&self, entry: Entry) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    fn entries(&self) -> Vec<Entry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn text(form: &ShieldForm, name: &str) -> String {
    form.field(name)
        .and_then(|field| field.data().as_text())
        .unwrap_or_default()
        .to_string()
}

fn render_page(entries: &[Entry], form: &ShieldForm) -> String {
    let mut html = String::from("<h1>Guestbook</h1>\n<ul>\n");
    for entry in entries {
        html.push_str(&format!(
            "<li><b>{}</b>: {}</li>\n",
            html_escape::encode_text(&entry.name),
            html_escape::encode_text(&entry.message)
        ));
    }
    html.push_str("</ul>\n<form action=\"/\" method=\"POST\">\n");
    if let Some(token) = form.hidden_tag() {
        html.push_str(&format!("{token}\n"));
    }
    for field in form.iter().filter(|f| f.kind() != FieldKind::CsrfToken) {
        if field.kind() != FieldKind::Submit {
            html.push_str(&format!("{}\n", field.label()));
        }
        html.push_str(&format!("{field}\n"));
        for error in field.errors() {
            html.push_str(&format!(
                "<span class=\"error\">{}</span>\n",
                html_escape::encode_text(&error.message)
            ));
        }
    }
    html.push_str("</form>\n");
    html
}

async fn index(State(state): State<AppState>, mut form: Shielded<SignForm>) -> Response {
    if form.validate_on_submit() {
        let entry = Entry {
            name: text(&form, "name"),
            message: text(&form, "message"),
        };
        tracing::info!(name = %entry.name, "new guestbook entry");
        state.record(entry);
        return Redirect::to("/").into_response();
    }

    if form.is_submitted() {
        tracing::debug!(errors = form.errors().len(), "rejected guestbook submission");
    }

    let entries = state.entries();
    Html(render_page(&entries, &form)).into_response()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = CsrfConfig::from_env()?;
    if config.secret_key.is_none() {
        tracing::warn!("FORMSHIELD_CSRF_SECRET_KEY not set, using the demo key");
        config = config.secret_key("guestbook demo key");
    }

    let shield = FormShield::new(config);
    let routes = Router::new()
        .route("/", get(index).post(index))
        .with_state(AppState::default());

    // One session for the whole process; a real app would use its session layer.
    let app = shield.init_app(routes)?.layer(Extension(Session::new()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
    tracing::info!("guestbook listening on http://127.0.0.1:8080");
    axum::serve(listener, app).await?;
    Ok(())
}
