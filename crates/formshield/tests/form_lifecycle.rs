//! End-to-end tests driving forms through an axum application.

use axum::body::Body;
use axum::response::Html;
use axum::routing::get;
use axum::{Extension, Router};
use formshield::prelude::*;
use http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use regex::Regex;
use tower::ServiceExt;

struct NoteForm;

impl FormFields for NoteForm {
    fn fields() -> Vec<Field> {
        vec![
            Field::string("msg", "Note")
                .validator(DataRequired::new())
                .validator(Length::max(10)),
            Field::submit("submit", "Submit"),
        ]
    }
}

fn render_form(form: &ShieldForm) -> String {
    let fields: String = form.iter().map(|field| field.to_string()).collect();
    format!(
        r#"
    <form action="" method="POST">
    {fields}
    </form>"#
    )
}

async fn index(method: Method, mut form: Shielded<NoteForm>) -> Html<String> {
    if method == Method::POST && form.validate() {
        return Html("validated".to_string());
    }
    Html(render_form(&form))
}

fn routes() -> Router {
    Router::new().route("/", get(index).post(index))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

async fn get_page(app: &Router) -> (StatusCode, String) {
    send(app, Request::get("/").body(Body::empty()).unwrap()).await
}

async fn post_form(app: &Router, payload: &[(&str, &str)]) -> (StatusCode, String) {
    let body = serde_urlencoded::to_string(payload).unwrap();
    let request = Request::post("/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

/// The token is the only rendered value 40 or more characters long.
fn scrape_token(html: &str) -> String {
    let pattern = Regex::new(r#"value="([0-9a-f#]{40,})""#).unwrap();
    pattern
        .captures(html)
        .map(|captures| captures[1].to_string())
        .expect("no CSRF token in page")
}

#[tokio::test]
async fn form_validation_without_csrf() {
    let shield = FormShield::new(CsrfConfig::new());
    let app = shield.init_app(routes()).unwrap();
    shield.configure(|config| config.enabled = false);

    let (status, page) = get_page(&app).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!page.contains("csrf_token"));

    // longer than 10 characters
    let (status, page) = post_form(&app, &[("msg", "love is beautiful")]).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!page.contains("validated"));

    let (status, page) = post_form(&app, &[("msg", "happy")]).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("validated"));
}

#[tokio::test]
async fn form_csrf_validation() {
    let session = Session::new();
    let shared = session.clone();
    let shield = FormShield::new(CsrfConfig::new().secret_key("top secret !!!"))
        .with_csrf_context(move |_| Some(shared.clone()));
    let app = shield.init_app(routes()).unwrap();

    let (status, page) = get_page(&app).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("csrf_token"));
    let token = scrape_token(&page);

    let (status, page) = post_form(&app, &[("msg", "happy"), ("csrf_token", &token)]).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("validated"));

    // no CSRF token in payload
    let (status, page) = post_form(&app, &[("msg", "happy")]).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!page.contains("validated"));

    // a forged token
    let forged = format!("{}0", &token[..token.len() - 1]);
    let forged = if forged == token {
        format!("{}1", &token[..token.len() - 1])
    } else {
        forged
    };
    let (_, page) = post_form(&app, &[("msg", "happy"), ("csrf_token", &forged)]).await;
    assert!(!page.contains("validated"));

    assert!(session.contains_key(formshield::csrf::SESSION_KEY));
}

#[tokio::test]
async fn valid_token_does_not_excuse_field_errors() {
    let session = Session::new();
    let shield = FormShield::new(CsrfConfig::new().secret_key("top secret !!!"));
    let app = shield
        .init_app(routes())
        .unwrap()
        .layer(Extension(session));

    let token = scrape_token(&get_page(&app).await.1);
    let (_, page) = post_form(
        &app,
        &[("msg", "love is beautiful"), ("csrf_token", &token)],
    )
    .await;
    assert!(!page.contains("validated"));
    // the page is rendered again with a fresh token
    assert!(page.contains("csrf_token"));
}

#[tokio::test]
async fn session_from_request_extensions() {
    let shield = FormShield::new(CsrfConfig::new().secret_key("top secret !!!"));
    let app = shield
        .init_app(routes())
        .unwrap()
        .layer(Extension(Session::new()));

    let token = scrape_token(&get_page(&app).await.1);
    let (_, page) = post_form(&app, &[("msg", "happy"), ("csrf_token", &token)]).await;
    assert!(page.contains("validated"));
}

#[tokio::test]
async fn missing_session_is_a_server_error() {
    let shield = FormShield::new(CsrfConfig::new().secret_key("top secret !!!"));
    let app = shield.init_app(routes()).unwrap();

    let (status, body) = get_page(&app).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"]["type"], "missing_csrf_context");
}

#[tokio::test]
async fn uninitialized_form() {
    let shield = FormShield::new(CsrfConfig::new());

    let (parts, _) = Request::get("/").body(()).unwrap().into_parts();
    let err = shield.form::<NoteForm>(&parts, &FormData::new()).unwrap_err();
    assert!(matches!(err, ShieldError::NotInitialized));

    // the extractor on an app the extension was never attached to
    let (status, body) = get_page(&routes()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"]["type"], "not_initialized");
}

#[test]
fn forbid_init_app_more_than_once() {
    let (shield, app) = FormShield::with_app(routes(), CsrfConfig::new()).unwrap();
    assert!(matches!(
        shield.init_app(app),
        Err(ShieldError::AlreadyInitialized)
    ));

    let shield = FormShield::new(CsrfConfig::new());
    let app = shield.init_app(routes()).unwrap();
    assert!(matches!(
        shield.init_app(app),
        Err(ShieldError::AlreadyInitialized)
    ));
}

#[tokio::test]
async fn property_hidden_tag() {
    async fn hidden_tag(form: Shielded<NoteForm>) -> &'static str {
        assert!(form.hidden_tag().is_some());
        assert_eq!(form.hidden_tag(), form.csrf_token());
        ""
    }

    let session = Session::new();
    let shield = FormShield::new(
        CsrfConfig::new()
            .secret_key("top secret !!!")
            .field_name("csrf_token"),
    )
    .with_csrf_context(move |_| Some(session.clone()));
    let app = shield
        .init_app(Router::new().route("/", get(hidden_tag)))
        .unwrap();

    let (status, _) = get_page(&app).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn custom_field_name() {
    let session = Session::new();
    let shield = FormShield::new(
        CsrfConfig::new()
            .secret_key("top secret !!!")
            .field_name("_csrf"),
    )
    .with_csrf_context(move |_| Some(session.clone()));
    let app = shield.init_app(routes()).unwrap();

    let page = get_page(&app).await.1;
    assert!(page.contains(r#"name="_csrf""#));
    let token = scrape_token(&page);

    let (_, page) = post_form(&app, &[("msg", "happy"), ("csrf_token", &token)]).await;
    assert!(!page.contains("validated"));
    let (_, page) = post_form(&app, &[("msg", "happy"), ("_csrf", &token)]).await;
    assert!(page.contains("validated"));
}

#[test]
fn to_bytes_returns_bytes() {
    assert!(to_bytes(bytes::Bytes::new()).is_empty());
    assert!(to_bytes(Vec::<u8>::new()).is_empty());
    assert!(to_bytes(String::new()).is_empty());
    assert_eq!(to_bytes("csrf"), bytes::Bytes::from_static(b"csrf"));
}

async fn reject(mut form: Shielded<NoteForm>) -> Result<&'static str, ShieldError> {
    form.validate_or_reject()?;
    Ok("validated")
}

fn unprotected(router: Router) -> Router {
    let shield = FormShield::new(CsrfConfig::new().enabled(false));
    shield.init_app(router).unwrap()
}

#[tokio::test]
async fn error_messages_are_rendered_for_display() {
    async fn messages(mut form: Shielded<NoteForm>) -> String {
        form.validate();
        let errors = form.errors();
        errors.get("msg").unwrap()[0].message.clone()
    }

    let app = unprotected(Router::new().route("/", get(messages).post(messages)));
    let (status, message) = post_form(&app, &[("msg", "love is beautiful")]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(message, "Field cannot be longer than 10 characters.");
}

#[tokio::test]
async fn rejected_form_is_a_422_field_list() {
    let app = unprotected(Router::new().route("/", get(reject).post(reject)));

    let (status, body) = post_form(&app, &[("msg", "love is beautiful")]).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"]["type"], "validation_error");
    assert_eq!(json["error"]["fields"][0]["field"], "msg");
    assert_eq!(
        json["error"]["fields"][0]["message"],
        "Field cannot be longer than 10 characters."
    );

    let (status, body) = post_form(&app, &[("msg", "happy")]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "validated");
}

#[tokio::test]
async fn oversized_body_is_413() {
    let app = unprotected(routes());
    let mut body = b"msg=".to_vec();
    body.resize(formshield::DEFAULT_BODY_LIMIT + 1, b'a');
    let request = Request::post("/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"]["type"], "payload_too_large");
}

#[tokio::test]
async fn content_type_is_case_insensitive() {
    let app = unprotected(routes());
    let request = Request::post("/")
        .header(header::CONTENT_TYPE, "Application/X-WWW-Form-Urlencoded; charset=UTF-8")
        .body(Body::from("msg=happy"))
        .unwrap();

    let (status, page) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("validated"));
}
