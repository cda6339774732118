//! In-memory emulation of the vault's local REST API.
//!
//! Serves the same paths, headers and status codes as the real plugin over a
//! `MockVault` held in memory, so clients can be exercised end-to-end without
//! the desktop application.

pub mod markdown;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, RawQuery, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};

use crate::markdown::{insert_under_heading, tags, Position};

pub const DATAVIEW_CONTENT_TYPE: &str = "application/vnd.olrapi.dataview.dql+txt";
pub const JSON_LOGIC_CONTENT_TYPE: &str = "application/vnd.olrapi.jsonlogic+json";
pub const NOTE_JSON_CONTENT_TYPE: &str = "application/vnd.olrapi.note+json";

const PERIODS: [&str; 5] = ["daily", "weekly", "monthly", "quarterly", "yearly"];

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Command {
    pub id: String,
    pub name: String,
}

/// Everything the mock server knows about its vault.
#[derive(Debug, Default)]
pub struct MockVault {
    pub files: BTreeMap<String, String>,
    /// Path of the file focused in the application, if any.
    pub active: Option<String>,
    pub periodic: HashMap<String, String>,
    pub commands: Vec<Command>,
    /// Command ids executed, in order.
    pub executed: Vec<String>,
    /// Files opened through `/open/`, with their `newLeaf` flag.
    pub opened: Vec<(String, bool)>,
}

impl MockVault {
    pub fn with_default_commands() -> Self {
        Self {
            commands: vec![
                Command {
                    id: "app:reload".to_string(),
                    name: "Reload app without saving".to_string(),
                },
                Command {
                    id: "editor:toggle-bold".to_string(),
                    name: "Toggle bold".to_string(),
                },
            ],
            ..Self::default()
        }
    }
}

pub type Db = Arc<RwLock<MockVault>>;

#[derive(Clone)]
pub struct AppState {
    token: Arc<str>,
    db: Db,
}

pub fn app(token: &str) -> Router {
    app_with_vault(token, Arc::new(RwLock::new(MockVault::with_default_commands())))
}

/// Router over a caller-owned vault, so tests can inspect server-side state.
pub fn app_with_vault(token: &str, db: Db) -> Router {
    let state = AppState {
        token: Arc::from(token),
        db,
    };

    let protected = Router::new()
        .route(
            "/active/",
            get(get_active)
                .post(append_active)
                .put(put_active)
                .patch(patch_active)
                .delete(delete_active),
        )
        .route("/vault/", get(list_root))
        .route(
            "/vault/{*path}",
            get(get_file)
                .put(put_file)
                .post(append_file)
                .patch(patch_file)
                .delete(delete_file),
        )
        .route("/commands/", get(list_commands))
        .route("/commands/{id}/", post(run_command))
        .route("/search/", post(search))
        .route("/search/simple/", post(simple_search))
        .route("/search/gui/", post(gui_search))
        .route("/open/{*path}", post(open_file))
        .route(
            "/periodic/{period}/",
            get(get_periodic)
                .put(put_periodic)
                .post(append_periodic)
                .patch(patch_periodic)
                .delete(delete_periodic),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    Router::new()
        .route("/", get(status))
        .merge(protected)
        .with_state(state)
}

pub async fn run(listener: TcpListener, token: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(token)).await
}

pub async fn run_with_vault(listener: TcpListener, token: &str, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_vault(token, db)).await
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn failure(status: StatusCode, message: &str) -> Response {
    let code = u32::from(status.as_u16()) * 100;
    (status, Json(json!({ "errorCode": code, "message": message }))).into_response()
}

fn authorized(state: &AppState, headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token == &*state.token)
}

async fn require_token(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if !authorized(&state, request.headers()) {
        return failure(StatusCode::UNAUTHORIZED, "Authorization required");
    }
    next.run(request).await
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn wants(headers: &HeaderMap, media_type: &str) -> bool {
    header_str(headers, header::ACCEPT.as_str()).is_some_and(|accept| accept.contains(media_type))
}

fn markdown(body: String) -> Response {
    ([(header::CONTENT_TYPE, "text/markdown; charset=utf-8")], body).into_response()
}

fn note_json(path: &str, content: &str) -> Response {
    Json(json!({
        "content": content,
        "frontmatter": {},
        "path": path,
        "stat": { "ctime": 0, "mtime": 0, "size": content.len() },
        "tags": tags(content),
    }))
    .into_response()
}

fn append(existing: &mut String, content: &str) {
    if !existing.is_empty() && !existing.ends_with('\n') {
        existing.push('\n');
    }
    existing.push_str(content);
}

/// Apply a `PATCH` body using the `Heading*` headers.
fn patch_document(document: &str, headers: &HeaderMap, body: &str) -> Result<String, Response> {
    let heading = header_str(headers, "Heading")
        .ok_or_else(|| failure(StatusCode::BAD_REQUEST, "Heading header is required"))?;
    let heading = urlencoding::decode(heading)
        .map_err(|_| failure(StatusCode::BAD_REQUEST, "Heading is not valid UTF-8"))?;
    let position = match header_str(headers, "Content-Insertion-Position").unwrap_or("end") {
        "end" => Position::End,
        "beginning" => Position::Beginning,
        _ => {
            return Err(failure(
                StatusCode::BAD_REQUEST,
                "Content-Insertion-Position must be 'end' or 'beginning'",
            ))
        }
    };
    let boundary = header_str(headers, "Heading-Boundary").unwrap_or("::");
    let path: Vec<&str> = heading.split(boundary).collect();

    insert_under_heading(document, &path, body, position)
        .ok_or_else(|| failure(StatusCode::BAD_REQUEST, "Heading not found"))
}

fn valid_period(period: &str) -> Result<(), Response> {
    if PERIODS.contains(&period) {
        Ok(())
    } else {
        Err(failure(StatusCode::BAD_REQUEST, "Unknown period"))
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

async fn status(State(state): State<AppState>, headers: HeaderMap) -> Json<serde_json::Value> {
    Json(json!({
        "status": "OK",
        "service": "Obsidian Local REST API",
        "authenticated": authorized(&state, &headers),
        "versions": { "obsidian": "mock", "self": env!("CARGO_PKG_VERSION") },
    }))
}

// ---------------------------------------------------------------------------
// Active file
// ---------------------------------------------------------------------------

async fn get_active(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let db = state.db.read().await;
    let Some(path) = db.active.as_ref() else {
        return failure(StatusCode::NOT_FOUND, "No active file");
    };
    let content = db.files.get(path).cloned().unwrap_or_default();
    if wants(&headers, NOTE_JSON_CONTENT_TYPE) {
        note_json(path, &content)
    } else {
        markdown(content)
    }
}

async fn append_active(State(state): State<AppState>, body: String) -> Response {
    let mut db = state.db.write().await;
    let Some(path) = db.active.clone() else {
        return failure(StatusCode::NOT_FOUND, "No active file");
    };
    append(db.files.entry(path).or_default(), &body);
    StatusCode::OK.into_response()
}

async fn put_active(State(state): State<AppState>, body: String) -> Response {
    let mut db = state.db.write().await;
    let Some(path) = db.active.clone() else {
        return failure(StatusCode::NOT_FOUND, "No active file");
    };
    db.files.insert(path, body);
    StatusCode::OK.into_response()
}

async fn patch_active(State(state): State<AppState>, headers: HeaderMap, body: String) -> Response {
    let mut db = state.db.write().await;
    let Some(path) = db.active.clone() else {
        return failure(StatusCode::NOT_FOUND, "No active file");
    };
    let current = db.files.get(&path).cloned().unwrap_or_default();
    match patch_document(&current, &headers, &body) {
        Ok(updated) => {
            db.files.insert(path, updated.clone());
            markdown(updated)
        }
        Err(response) => response,
    }
}

async fn delete_active(State(state): State<AppState>) -> Response {
    let mut db = state.db.write().await;
    let Some(path) = db.active.take() else {
        return failure(StatusCode::NOT_FOUND, "No active file");
    };
    db.files.remove(&path);
    StatusCode::NO_CONTENT.into_response()
}

// ---------------------------------------------------------------------------
// Vault files
// ---------------------------------------------------------------------------

fn list_entries(files: &BTreeMap<String, String>, prefix: &str) -> Vec<String> {
    let entries: BTreeSet<String> = files
        .keys()
        .filter_map(|key| key.strip_prefix(prefix))
        .map(|rest| match rest.split_once('/') {
            Some((dir, _)) => format!("{dir}/"),
            None => rest.to_string(),
        })
        .collect();
    entries.into_iter().collect()
}

async fn list_root(State(state): State<AppState>) -> Json<serde_json::Value> {
    let db = state.db.read().await;
    Json(json!({ "files": list_entries(&db.files, "") }))
}

async fn get_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Response {
    let db = state.db.read().await;
    if path.ends_with('/') {
        let entries = list_entries(&db.files, &path);
        if entries.is_empty() {
            return failure(StatusCode::NOT_FOUND, "Not Found");
        }
        return Json(json!({ "files": entries })).into_response();
    }
    let Some(content) = db.files.get(&path) else {
        return failure(StatusCode::NOT_FOUND, "Not Found");
    };
    if wants(&headers, NOTE_JSON_CONTENT_TYPE) {
        note_json(&path, content)
    } else {
        markdown(content.clone())
    }
}

async fn put_file(State(state): State<AppState>, Path(path): Path<String>, body: String) -> Response {
    if path.ends_with('/') {
        return failure(StatusCode::METHOD_NOT_ALLOWED, "Cannot write to a directory");
    }
    state.db.write().await.files.insert(path, body);
    StatusCode::NO_CONTENT.into_response()
}

async fn append_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
    body: String,
) -> Response {
    if path.ends_with('/') {
        return failure(StatusCode::METHOD_NOT_ALLOWED, "Cannot write to a directory");
    }
    let mut db = state.db.write().await;
    append(db.files.entry(path).or_default(), &body);
    StatusCode::OK.into_response()
}

async fn patch_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let mut db = state.db.write().await;
    let Some(current) = db.files.get(&path).cloned() else {
        return failure(StatusCode::NOT_FOUND, "Not Found");
    };
    match patch_document(&current, &headers, &body) {
        Ok(updated) => {
            db.files.insert(path, updated.clone());
            markdown(updated)
        }
        Err(response) => response,
    }
}

async fn delete_file(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    let mut db = state.db.write().await;
    if db.files.remove(&path).is_none() {
        return failure(StatusCode::NOT_FOUND, "Not Found");
    }
    if db.active.as_deref() == Some(path.as_str()) {
        db.active = None;
    }
    StatusCode::NO_CONTENT.into_response()
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn list_commands(State(state): State<AppState>) -> Json<serde_json::Value> {
    let db = state.db.read().await;
    Json(json!({ "commands": db.commands }))
}

async fn run_command(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let mut db = state.db.write().await;
    if !db.commands.iter().any(|command| command.id == id) {
        return failure(StatusCode::NOT_FOUND, "The command you specified does not exist");
    }
    db.executed.push(id);
    StatusCode::NO_CONTENT.into_response()
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

async fn search(State(state): State<AppState>, headers: HeaderMap, body: String) -> Response {
    let db = state.db.read().await;
    let content_type = header_str(&headers, header::CONTENT_TYPE.as_str()).unwrap_or_default();

    if content_type.starts_with(DATAVIEW_CONTENT_TYPE) {
        let query = body.trim_start().to_ascii_uppercase();
        if !(query.starts_with("TABLE") || query.starts_with("LIST")) {
            return failure(StatusCode::BAD_REQUEST, "Only TABLE and LIST queries are supported");
        }
        let results: Vec<_> = db
            .files
            .keys()
            .map(|filename| json!({ "filename": filename, "result": {} }))
            .collect();
        return Json(results).into_response();
    }

    if content_type.starts_with(JSON_LOGIC_CONTENT_TYPE) {
        let Ok(rule) = serde_json::from_str::<serde_json::Value>(&body) else {
            return failure(StatusCode::BAD_REQUEST, "Invalid JsonLogic");
        };
        // Supports {"in": [needle, {"var": "content"}]} only.
        let needle = rule
            .get("in")
            .and_then(|args| args.get(0))
            .and_then(|needle| needle.as_str());
        let Some(needle) = needle else {
            return failure(StatusCode::BAD_REQUEST, "Unsupported JsonLogic rule");
        };
        let results: Vec<_> = db
            .files
            .iter()
            .filter(|(_, content)| content.contains(needle))
            .map(|(filename, _)| json!({ "filename": filename, "result": true }))
            .collect();
        return Json(results).into_response();
    }

    failure(StatusCode::BAD_REQUEST, "Unsupported Content-Type")
}

#[derive(Deserialize)]
struct SimpleSearchParams {
    query: String,
    #[serde(rename = "contextLength", default = "default_context_length")]
    context_length: usize,
}

fn default_context_length() -> usize {
    100
}

fn text_matches(
    files: &BTreeMap<String, String>,
    query: &str,
    context_length: usize,
) -> Vec<serde_json::Value> {
    let needle: String = query.chars().flat_map(char::to_lowercase).collect();
    if needle.is_empty() {
        return Vec::new();
    }
    files
        .iter()
        .filter_map(|(filename, content)| {
            let (haystack, spans) = lowercase_with_spans(content);
            let matches: Vec<_> = haystack
                .match_indices(&needle)
                .map(|(at, matched)| {
                    let start = spans[at].0;
                    let end = spans[at + matched.len() - 1].1;
                    json!({
                        "match": { "start": start, "end": end },
                        "context": context_window(content, start, end, context_length),
                    })
                })
                .collect();
            (!matches.is_empty()).then(|| {
                json!({ "filename": filename, "score": -(matches.len() as f64), "matches": matches })
            })
        })
        .collect()
}

/// Lowercase `text`, recording for each output byte the byte range of the
/// source character it came from. Offsets found in the lowered text map back
/// through these ranges even when lowercasing changes a character's length.
fn lowercase_with_spans(text: &str) -> (String, Vec<(usize, usize)>) {
    let mut lowered = String::with_capacity(text.len());
    let mut spans = Vec::with_capacity(text.len());
    for (start, c) in text.char_indices() {
        let end = start + c.len_utf8();
        for lower in c.to_lowercase() {
            lowered.push(lower);
            spans.extend(std::iter::repeat((start, end)).take(lower.len_utf8()));
        }
    }
    (lowered, spans)
}

/// Up to `context_length` characters either side of `text[start..end]`.
fn context_window(text: &str, start: usize, end: usize, context_length: usize) -> &str {
    let from = text[..start]
        .char_indices()
        .rev()
        .take(context_length)
        .last()
        .map_or(start, |(i, _)| i);
    let to = text[end..]
        .char_indices()
        .nth(context_length)
        .map_or(text.len(), |(i, _)| end + i);
    &text[from..to]
}

async fn simple_search(
    State(state): State<AppState>,
    Query(params): Query<SimpleSearchParams>,
) -> Json<Vec<serde_json::Value>> {
    let db = state.db.read().await;
    Json(text_matches(&db.files, &params.query, params.context_length))
}

async fn gui_search(State(state): State<AppState>, RawQuery(raw): RawQuery) -> Response {
    let raw = raw.unwrap_or_default();
    let mut query = None;
    let mut context_length = default_context_length();
    for part in raw.split('&') {
        match part.strip_prefix("contextLength=") {
            Some(value) => match value.parse() {
                Ok(value) => context_length = value,
                Err(_) => return failure(StatusCode::BAD_REQUEST, "Invalid contextLength"),
            },
            None if query.is_none() && !part.is_empty() => {
                query = Some(part.strip_prefix("query=").unwrap_or(part));
            }
            None => {}
        }
    }
    let Some(query) = query else {
        return failure(StatusCode::BAD_REQUEST, "A query is required");
    };
    let Ok(query) = urlencoding::decode(query) else {
        return failure(StatusCode::BAD_REQUEST, "Query is not valid UTF-8");
    };
    let db = state.db.read().await;
    Json(text_matches(&db.files, &query, context_length)).into_response()
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct OpenParams {
    #[serde(rename = "newLeaf", default)]
    new_leaf: bool,
}

async fn open_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(params): Query<OpenParams>,
) -> Response {
    let mut db = state.db.write().await;
    if !db.files.contains_key(&path) {
        return failure(StatusCode::NOT_FOUND, "Not Found");
    }
    db.active = Some(path.clone());
    db.opened.push((path, params.new_leaf));
    Json(json!({})).into_response()
}

// ---------------------------------------------------------------------------
// Periodic notes
// ---------------------------------------------------------------------------

async fn get_periodic(State(state): State<AppState>, Path(period): Path<String>) -> Response {
    if let Err(response) = valid_period(&period) {
        return response;
    }
    let db = state.db.read().await;
    match db.periodic.get(&period) {
        Some(content) => markdown(content.clone()),
        None => failure(StatusCode::NOT_FOUND, "Periodic note does not exist"),
    }
}

async fn put_periodic(
    State(state): State<AppState>,
    Path(period): Path<String>,
    body: String,
) -> Response {
    if let Err(response) = valid_period(&period) {
        return response;
    }
    state.db.write().await.periodic.insert(period, body);
    StatusCode::NO_CONTENT.into_response()
}

async fn append_periodic(
    State(state): State<AppState>,
    Path(period): Path<String>,
    body: String,
) -> Response {
    if let Err(response) = valid_period(&period) {
        return response;
    }
    let mut db = state.db.write().await;
    append(db.periodic.entry(period).or_default(), &body);
    StatusCode::NO_CONTENT.into_response()
}

async fn patch_periodic(
    State(state): State<AppState>,
    Path(period): Path<String>,
    headers: HeaderMap,
    body: String,
) -> Response {
    if let Err(response) = valid_period(&period) {
        return response;
    }
    let mut db = state.db.write().await;
    let Some(current) = db.periodic.get(&period).cloned() else {
        return failure(StatusCode::NOT_FOUND, "Periodic note does not exist");
    };
    match patch_document(&current, &headers, &body) {
        Ok(updated) => {
            db.periodic.insert(period, updated.clone());
            markdown(updated)
        }
        Err(response) => response,
    }
}

async fn delete_periodic(State(state): State<AppState>, Path(period): Path<String>) -> Response {
    if let Err(response) = valid_period(&period) {
        return response;
    }
    if state.db.write().await.periodic.remove(&period).is_none() {
        return failure(StatusCode::NOT_FOUND, "Periodic note does not exist");
    }
    StatusCode::NO_CONTENT.into_response()
}
