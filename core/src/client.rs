//! Stateless request builder and response decoder for the vault REST API.
//!
//! # Design
//! `VaultClient` holds only the base URL and bearer token and carries no
//! mutable state between calls. Each endpoint method returns an
//! [`Operation`]: the `HttpRequest` to send, the status codes that mean
//! success for that endpoint, and the decoder for the body. The caller (or
//! [`Vault`](crate::Vault)) executes the round-trip and hands the response to
//! `Operation::parse`.
//!
//! Headers are assembled per request: `Authorization` and `Accept` defaults
//! first, then the operation's overrides replace them by name.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::content::decode_note_body;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    Command, Insertion, NoteJson, Period, SearchQuery, SearchResult, ServerStatus,
    SimpleSearchResult, NOTE_JSON_CONTENT_TYPE,
};

const OK: &[u16] = &[200];
const NO_CONTENT: &[u16] = &[204];
const OK_OR_NO_CONTENT: &[u16] = &[200, 204];

const MARKDOWN: &str = "text/markdown";
const JSON: &str = "application/json";
const ANY: &str = "*/*";

/// Heading delimiter applied to periodic-note insertions that set none.
pub const PERIODIC_HEADING_BOUNDARY: &str = "::";

/// Context length the server uses when a search does not ask for one.
pub const DEFAULT_CONTEXT_LENGTH: usize = 100;

/// One endpoint call: request, accepted statuses and body decoder.
#[derive(Debug, Clone)]
pub struct Operation<T> {
    name: &'static str,
    request: HttpRequest,
    accepted: &'static [u16],
    decode: fn(HttpResponse) -> Result<T, ApiError>,
}

impl<T> Operation<T> {
    /// Short endpoint name used in log events, e.g. `list_directory`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    pub fn accepted(&self) -> &'static [u16] {
        self.accepted
    }

    /// Check the status against the accepted set, then decode the body.
    pub fn parse(&self, response: HttpResponse) -> Result<T, ApiError> {
        check_status(&response, self.accepted)?;
        (self.decode)(response)
    }
}

/// Synchronous, stateless client for the vault REST API.
#[derive(Debug, Clone)]
pub struct VaultClient {
    base_url: String,
    token: String,
}

impl VaultClient {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -----------------------------------------------------------------------
    // Active file
    // -----------------------------------------------------------------------

    pub fn get_active_file(&self) -> Operation<String> {
        self.request(HttpMethod::Get, "/active/")
            .accept(MARKDOWN)
            .operation("get_active_file", OK, decode_text)
    }

    pub fn append_to_active_file(&self, content: &str) -> Operation<()> {
        self.request(HttpMethod::Post, "/active/")
            .accept(ANY)
            .markdown(content)
            .operation("append_to_active_file", OK, decode_unit)
    }

    pub fn update_active_file(&self, content: &str) -> Operation<()> {
        self.request(HttpMethod::Put, "/active/")
            .accept(ANY)
            .markdown(content)
            .operation("update_active_file", OK, decode_unit)
    }

    pub fn delete_active_file(&self) -> Operation<()> {
        self.request(HttpMethod::Delete, "/active/")
            .accept(ANY)
            .operation("delete_active_file", NO_CONTENT, decode_unit)
    }

    pub fn insert_into_active_file(&self, content: &str, insertion: &Insertion) -> Operation<()> {
        self.request(HttpMethod::Patch, "/active/")
            .accept(ANY)
            .insertion(insertion)
            .markdown(content)
            .operation("insert_into_active_file", OK, decode_unit)
    }

    // -----------------------------------------------------------------------
    // Vault files
    // -----------------------------------------------------------------------

    pub fn get_file(&self, filename: &str) -> Operation<String> {
        self.request(HttpMethod::Get, &vault_path(filename))
            .accept(MARKDOWN)
            .operation("get_file", OK, decode_text)
    }

    /// Fetch a note together with its frontmatter, tags and file stats.
    pub fn get_note(&self, filename: &str) -> Operation<NoteJson> {
        self.request(HttpMethod::Get, &vault_path(filename))
            .accept(NOTE_JSON_CONTENT_TYPE)
            .operation("get_note", OK, decode_json::<NoteJson>)
    }

    pub fn create_or_update_file(&self, filename: &str, content: &str) -> Operation<()> {
        self.request(HttpMethod::Put, &vault_path(filename))
            .accept(ANY)
            .markdown(content)
            .operation("create_or_update_file", OK_OR_NO_CONTENT, decode_unit)
    }

    pub fn append_to_file(&self, filename: &str, content: &str) -> Operation<()> {
        self.request(HttpMethod::Post, &vault_path(filename))
            .accept(ANY)
            .markdown(content)
            .operation("append_to_file", OK, decode_unit)
    }

    pub fn delete_file(&self, filename: &str) -> Operation<()> {
        self.request(HttpMethod::Delete, &vault_path(filename))
            .accept(ANY)
            .operation("delete_file", OK_OR_NO_CONTENT, decode_unit)
    }

    pub fn insert_into_file(
        &self,
        filename: &str,
        content: &str,
        insertion: &Insertion,
    ) -> Operation<()> {
        self.request(HttpMethod::Patch, &vault_path(filename))
            .accept(ANY)
            .insertion(insertion)
            .markdown(content)
            .operation("insert_into_file", OK, decode_unit)
    }

    /// List the entries at the vault root. Directories end with `/`.
    pub fn list_vault(&self) -> Operation<Vec<String>> {
        self.request(HttpMethod::Get, "/vault/")
            .accept(JSON)
            .operation("list_vault", OK, decode_file_list)
    }

    pub fn list_directory(&self, directory: &str) -> Operation<Vec<String>> {
        let directory = directory.trim_matches('/');
        let path = if directory.is_empty() {
            "/vault/".to_string()
        } else {
            format!("/vault/{}/", encode_path(directory))
        };
        self.request(HttpMethod::Get, &path)
            .accept(JSON)
            .operation("list_directory", OK, decode_file_list)
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    pub fn list_commands(&self) -> Operation<Vec<Command>> {
        self.request(HttpMethod::Get, "/commands/")
            .accept(JSON)
            .operation("list_commands", OK, decode_commands)
    }

    pub fn run_command(&self, command_id: &str) -> Operation<()> {
        let path = format!("/commands/{}/", urlencoding::encode(command_id));
        self.request(HttpMethod::Post, &path)
            .accept(ANY)
            .operation("run_command", OK_OR_NO_CONTENT, decode_unit)
    }

    // -----------------------------------------------------------------------
    // Search
    // -----------------------------------------------------------------------

    /// Run a Dataview (string) or JsonLogic (structured) query.
    pub fn search(&self, query: &SearchQuery) -> Operation<Vec<SearchResult>> {
        self.request(HttpMethod::Post, "/search/")
            .accept(JSON)
            .body(query.content_type(), query.to_body())
            .operation("search", OK, decode_json::<Vec<SearchResult>>)
    }

    pub fn simple_search(
        &self,
        query: &str,
        context_length: usize,
    ) -> Operation<Vec<SimpleSearchResult>> {
        let path = format!(
            "/search/simple/?query={}&contextLength={context_length}",
            urlencoding::encode(query)
        );
        self.request(HttpMethod::Post, &path)
            .accept(JSON)
            .operation("simple_search", OK, decode_json::<Vec<SimpleSearchResult>>)
    }

    /// Trigger a search through the application's own search pane.
    ///
    /// `query` is either bare search text or a `key=value` pair such as
    /// `query=todo`; only the text or the value is percent-encoded.
    pub fn gui_search(&self, query: &str, context_length: usize) -> Operation<Vec<serde_json::Value>> {
        let path = format!(
            "/search/gui/?{}&contextLength={context_length}",
            encode_gui_query(query)
        );
        self.request(HttpMethod::Post, &path)
            .accept(JSON)
            .operation("gui_search", OK, decode_json::<Vec<serde_json::Value>>)
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    pub fn open_file(&self, filename: &str, new_leaf: bool) -> Operation<()> {
        let path = format!("/open/{}?newLeaf={new_leaf}", encode_path(filename));
        self.request(HttpMethod::Post, &path)
            .accept(JSON)
            .operation("open_file", OK, decode_unit)
    }

    // -----------------------------------------------------------------------
    // Periodic notes
    // -----------------------------------------------------------------------

    pub fn get_periodic_note(&self, period: Period) -> Operation<String> {
        self.request(HttpMethod::Get, &periodic_path(period))
            .accept(MARKDOWN)
            .operation("get_periodic_note", OK, decode_text)
    }

    pub fn update_periodic_note(&self, period: Period, content: &str) -> Operation<()> {
        self.request(HttpMethod::Put, &periodic_path(period))
            .accept(ANY)
            .markdown(content)
            .operation("update_periodic_note", NO_CONTENT, decode_unit)
    }

    pub fn append_to_periodic_note(&self, period: Period, content: &str) -> Operation<()> {
        self.request(HttpMethod::Post, &periodic_path(period))
            .accept(ANY)
            .markdown(content)
            .operation("append_to_periodic_note", NO_CONTENT, decode_unit)
    }

    pub fn delete_periodic_note(&self, period: Period) -> Operation<()> {
        self.request(HttpMethod::Delete, &periodic_path(period))
            .accept(ANY)
            .operation("delete_periodic_note", NO_CONTENT, decode_unit)
    }

    /// Insert relative to a heading; the boundary defaults to `::`.
    pub fn insert_into_periodic_note(
        &self,
        period: Period,
        content: &str,
        insertion: &Insertion,
    ) -> Operation<()> {
        let mut insertion = insertion.clone();
        if insertion.heading_boundary.as_deref().unwrap_or_default().is_empty() {
            insertion.heading_boundary = Some(PERIODIC_HEADING_BOUNDARY.to_string());
        }
        self.request(HttpMethod::Patch, &periodic_path(period))
            .accept(ANY)
            .insertion(&insertion)
            .markdown(content)
            .operation("insert_into_periodic_note", OK, decode_unit)
    }

    // -----------------------------------------------------------------------
    // Server
    // -----------------------------------------------------------------------

    /// `GET /`, the only endpoint that does not need the bearer token.
    pub fn server_status(&self) -> Operation<ServerStatus> {
        self.request(HttpMethod::Get, "/")
            .unauthenticated()
            .accept(JSON)
            .operation("server_status", OK, decode_json::<ServerStatus>)
    }

    fn request(&self, method: HttpMethod, path: &str) -> RequestBuilder {
        RequestBuilder {
            method,
            url: format!("{}{path}", self.base_url),
            headers: vec![
                ("Authorization".to_string(), format!("Bearer {}", self.token)),
                ("Accept".to_string(), MARKDOWN.to_string()),
            ],
            body: None,
        }
    }
}

/// Per-call header set: defaults from the client, overridden by name.
struct RequestBuilder {
    method: HttpMethod,
    url: String,
    headers: Vec<(String, String)>,
    body: Option<String>,
}

impl RequestBuilder {
    fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    fn accept(self, media_type: &str) -> Self {
        self.header("Accept", media_type)
    }

    fn unauthenticated(mut self) -> Self {
        self.headers
            .retain(|(key, _)| !key.eq_ignore_ascii_case("Authorization"));
        self
    }

    fn body(mut self, content_type: &str, body: String) -> Self {
        self.body = Some(body);
        self.header("Content-Type", content_type)
    }

    fn markdown(self, content: &str) -> Self {
        self.body(MARKDOWN, content.to_string())
    }

    fn insertion(self, insertion: &Insertion) -> Self {
        // Header values must be ASCII; the server URL-decodes the heading.
        let heading = if insertion.heading.is_ascii() {
            insertion.heading.clone()
        } else {
            urlencoding::encode(&insertion.heading).into_owned()
        };
        let builder = self
            .header("Heading", &heading)
            .header("Content-Insertion-Position", insertion.position.as_str());
        match insertion.heading_boundary.as_deref() {
            Some(boundary) if !boundary.is_empty() => builder.header("Heading-Boundary", boundary),
            _ => builder,
        }
    }

    fn operation<T>(
        self,
        name: &'static str,
        accepted: &'static [u16],
        decode: fn(HttpResponse) -> Result<T, ApiError>,
    ) -> Operation<T> {
        Operation {
            name,
            request: HttpRequest {
                method: self.method,
                url: self.url,
                headers: self.headers,
                body: self.body,
            },
            accepted,
            decode,
        }
    }
}

/// Percent-encode each segment of a vault path, keeping the slashes.
fn encode_path(path: &str) -> String {
    path.trim_start_matches('/')
        .split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

fn vault_path(filename: &str) -> String {
    format!("/vault/{}", encode_path(filename))
}

fn periodic_path(period: Period) -> String {
    format!("/periodic/{}/", period.as_str())
}

fn encode_gui_query(query: &str) -> String {
    match query.split_once('=') {
        Some((key, value))
            if !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') =>
        {
            format!("{key}={}", urlencoding::encode(value))
        }
        _ => urlencoding::encode(query).into_owned(),
    }
}

/// Map statuses outside the accepted set to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, accepted: &[u16]) -> Result<(), ApiError> {
    if accepted.contains(&response.status) {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound {
            body: response.body.clone(),
        });
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}

fn decode_unit(_response: HttpResponse) -> Result<(), ApiError> {
    Ok(())
}

fn decode_text(response: HttpResponse) -> Result<String, ApiError> {
    decode_note_body(&response.body)
}

fn decode_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
}

fn decode_file_list(response: HttpResponse) -> Result<Vec<String>, ApiError> {
    #[derive(Deserialize)]
    struct Listing {
        files: Vec<String>,
    }
    decode_json::<Listing>(response).map(|listing| listing.files)
}

fn decode_commands(response: HttpResponse) -> Result<Vec<Command>, ApiError> {
    #[derive(Deserialize)]
    struct Commands {
        commands: Vec<Command>,
    }
    decode_json::<Commands>(response).map(|listing| listing.commands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InsertPosition, DATAVIEW_CONTENT_TYPE, JSON_LOGIC_CONTENT_TYPE};
    use serde_json::json;

    const BASE: &str = "http://localhost:27123";

    fn client() -> VaultClient {
        VaultClient::new(BASE, "secret")
    }

    fn ok(body: &str) -> HttpResponse {
        HttpResponse::new(200, body)
    }

    #[test]
    fn every_request_carries_bearer_token() {
        let req = client().get_active_file().request().clone();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:27123/active/");
        assert_eq!(req.header("Authorization"), Some("Bearer secret"));
        assert_eq!(req.header("Accept"), Some("text/markdown"));
        assert!(req.body.is_none());
        assert_eq!(req.header("Content-Type"), None);
    }

    #[test]
    fn overrides_replace_defaults_instead_of_duplicating() {
        let op = client().list_vault();
        let accepts = op
            .request()
            .headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("accept"))
            .count();
        assert_eq!(accepts, 1);
        assert_eq!(op.request().header("accept"), Some("application/json"));
    }

    #[test]
    fn calls_do_not_leak_headers_into_each_other() {
        let c = client();
        let insert = c.insert_into_active_file("x", &Insertion::new("Tasks"));
        assert_eq!(insert.request().header("Heading"), Some("Tasks"));

        let get = c.get_active_file();
        assert_eq!(get.request().header("Heading"), None);
        assert_eq!(get.request().header("Accept"), Some("text/markdown"));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let c = VaultClient::new("http://localhost:27123/", "t");
        assert_eq!(c.list_vault().request().url, "http://localhost:27123/vault/");
    }

    #[test]
    fn write_requests_send_markdown() {
        let op = client().append_to_active_file("- item");
        let req = op.request();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.header("Content-Type"), Some("text/markdown"));
        assert_eq!(req.header("Accept"), Some("*/*"));
        assert_eq!(req.body.as_deref(), Some("- item"));

        let op = client().update_active_file("new");
        assert_eq!(op.request().method, HttpMethod::Put);
    }

    #[test]
    fn insertion_sets_heading_headers() {
        let insertion = Insertion::new("Log").at(InsertPosition::Beginning);
        let op = client().insert_into_file("notes/today.md", "text", &insertion);
        let req = op.request();
        assert_eq!(req.method, HttpMethod::Patch);
        assert_eq!(req.url, "http://localhost:27123/vault/notes/today.md");
        assert_eq!(req.header("Heading"), Some("Log"));
        assert_eq!(req.header("Content-Insertion-Position"), Some("beginning"));
        assert_eq!(req.header("Heading-Boundary"), None);
    }

    #[test]
    fn non_ascii_headings_are_percent_encoded() {
        let op = client().insert_into_active_file("x", &Insertion::new("Café"));
        assert_eq!(op.request().header("Heading"), Some("Caf%C3%A9"));
    }

    #[test]
    fn periodic_insertion_defaults_heading_boundary() {
        let op = client().insert_into_periodic_note(Period::Daily, "x", &Insertion::new("A::B"));
        assert_eq!(op.request().url, "http://localhost:27123/periodic/daily/");
        assert_eq!(op.request().header("Heading-Boundary"), Some("::"));

        let custom = Insertion::new("A/B").with_boundary("/");
        let op = client().insert_into_periodic_note(Period::Weekly, "x", &custom);
        assert_eq!(op.request().header("Heading-Boundary"), Some("/"));
    }

    #[test]
    fn file_paths_are_encoded_per_segment() {
        let op = client().get_file("My Notes/a b.md");
        assert_eq!(op.request().url, "http://localhost:27123/vault/My%20Notes/a%20b.md");
    }

    #[test]
    fn get_note_asks_for_note_json() {
        let op = client().get_note("a.md");
        assert_eq!(op.request().header("Accept"), Some(NOTE_JSON_CONTENT_TYPE));
        let note = op
            .parse(ok(r#"{"content":"hi","path":"a.md","tags":["x"],"frontmatter":{"k":1},"stat":{"ctime":1,"mtime":2,"size":2}}"#))
            .unwrap();
        assert_eq!(note.tags, vec!["x".to_string()]);
        assert_eq!(note.stat.mtime, 2);
    }

    #[test]
    fn list_directory_scenario() {
        let op = client().list_directory("notes");
        let req = op.request();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:27123/vault/notes/");
        assert_eq!(req.header("Accept"), Some("application/json"));

        let files = op.parse(ok(r#"{"files": ["a.md","b.md"]}"#)).unwrap();
        assert_eq!(files, vec!["a.md".to_string(), "b.md".to_string()]);

        let err = op.parse(HttpResponse::new(404, "")).unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));
    }

    #[test]
    fn empty_directory_lists_root() {
        assert_eq!(
            client().list_directory("/").request().url,
            "http://localhost:27123/vault/"
        );
    }

    #[test]
    fn listing_without_files_key_is_decode_error() {
        let err = client().list_vault().parse(ok(r#"{"items": []}"#)).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));

        let err = client().list_vault().parse(ok("<html>")).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn command_ids_are_percent_encoded() {
        let id = "editor:toggle bold/italic";
        let op = client().run_command(id);
        assert_eq!(
            op.request().url,
            "http://localhost:27123/commands/editor%3Atoggle%20bold%2Fitalic/"
        );

        let encoded = op
            .request()
            .url
            .trim_start_matches("http://localhost:27123/commands/")
            .trim_end_matches('/');
        assert_eq!(urlencoding::decode(encoded).unwrap(), id);
    }

    #[test]
    fn list_commands_unwraps_envelope() {
        let commands = client()
            .list_commands()
            .parse(ok(r#"{"commands":[{"id":"app:reload","name":"Reload app"}]}"#))
            .unwrap();
        assert_eq!(commands[0].id, "app:reload");
        assert_eq!(commands[0].name, "Reload app");
    }

    #[test]
    fn string_search_uses_dataview_content_type() {
        let op = client().search(&SearchQuery::from("TABLE file.name FROM #tag"));
        let req = op.request();
        assert_eq!(req.url, "http://localhost:27123/search/");
        assert_eq!(req.header("Content-Type"), Some(DATAVIEW_CONTENT_TYPE));
        assert_eq!(req.body.as_deref(), Some("TABLE file.name FROM #tag"));
    }

    #[test]
    fn structured_search_uses_json_logic_content_type() {
        let rule = json!({"in": ["project", {"var": "tags"}]});
        let op = client().search(&SearchQuery::from(rule.clone()));
        let req = op.request();
        assert_eq!(req.header("Content-Type"), Some(JSON_LOGIC_CONTENT_TYPE));
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, rule);

        let results = op
            .parse(ok(r#"[{"filename":"a.md","result":true}]"#))
            .unwrap();
        assert_eq!(results[0].filename, "a.md");
        assert_eq!(results[0].result, json!(true));
    }

    #[test]
    fn simple_search_encodes_query() {
        let op = client().simple_search("hello world&more", 50);
        assert_eq!(op.request().method, HttpMethod::Post);
        assert_eq!(
            op.request().url,
            "http://localhost:27123/search/simple/?query=hello%20world%26more&contextLength=50"
        );
        assert!(op.request().body.is_none());
    }

    #[test]
    fn gui_search_places_query_first() {
        let op = client().gui_search("todo", DEFAULT_CONTEXT_LENGTH);
        assert_eq!(
            op.request().url,
            "http://localhost:27123/search/gui/?todo&contextLength=100"
        );
    }

    #[test]
    fn gui_search_keeps_query_key_and_encodes_value() {
        let op = client().gui_search("query=two words", 5);
        assert_eq!(
            op.request().url,
            "http://localhost:27123/search/gui/?query=two%20words&contextLength=5"
        );

        let op = client().gui_search("a=b c", 5);
        assert!(op.request().url.contains("?a=b%20c&"));

        let op = client().gui_search("x == y", 5);
        assert!(op.request().url.contains("?x%20%3D%3D%20y&"));
    }

    #[test]
    fn open_file_formats_new_leaf_flag() {
        let op = client().open_file("daily/2024-01-01.md", true);
        assert_eq!(
            op.request().url,
            "http://localhost:27123/open/daily/2024-01-01.md?newLeaf=true"
        );
        assert!(client().open_file("a.md", false).request().url.ends_with("?newLeaf=false"));
    }

    #[test]
    fn server_status_is_unauthenticated() {
        let op = client().server_status();
        assert_eq!(op.request().url, "http://localhost:27123/");
        assert_eq!(op.request().header("Authorization"), None);
        let status = op
            .parse(ok(r#"{"status":"OK","service":"Obsidian Local REST API","authenticated":false,"versions":{"obsidian":"1.5.3","self":"3.0.1"}}"#))
            .unwrap();
        assert_eq!(status.status, "OK");
    }

    #[test]
    fn content_endpoints_decode_byte_buffers() {
        let c = client();
        let buffer = r#"{"type":"Buffer","data":[72,105]}"#;
        assert_eq!(c.get_active_file().parse(ok(buffer)).unwrap(), "Hi");
        assert_eq!(c.get_file("a.md").parse(ok(buffer)).unwrap(), "Hi");
        assert_eq!(c.get_periodic_note(Period::Monthly).parse(ok(buffer)).unwrap(), "Hi");
    }

    #[test]
    fn appends_and_active_updates_require_ok() {
        let c = client();
        for op in [
            c.append_to_active_file("x"),
            c.update_active_file("x"),
            c.append_to_file("a.md", "x"),
        ] {
            assert!(op.parse(HttpResponse::new(200, "")).is_ok(), "{}", op.name());
            let err = op.parse(HttpResponse::new(204, "")).unwrap_err();
            assert!(matches!(err, ApiError::Http { status: 204, .. }), "{}", op.name());
        }
    }

    #[test]
    fn unit_endpoints_accept_exactly_their_status_set() {
        let c = client();
        let insertion = Insertion::new("H");
        let cases: Vec<(Operation<()>, Vec<u16>)> = vec![
            (c.append_to_active_file("x"), vec![200]),
            (c.update_active_file("x"), vec![200]),
            (c.delete_active_file(), vec![204]),
            (c.insert_into_active_file("x", &insertion), vec![200]),
            (c.create_or_update_file("a.md", "x"), vec![200, 204]),
            (c.append_to_file("a.md", "x"), vec![200]),
            (c.delete_file("a.md"), vec![200, 204]),
            (c.insert_into_file("a.md", "x", &insertion), vec![200]),
            (c.run_command("app:reload"), vec![200, 204]),
            (c.open_file("a.md", false), vec![200]),
            (c.update_periodic_note(Period::Daily, "x"), vec![204]),
            (c.append_to_periodic_note(Period::Daily, "x"), vec![204]),
            (c.delete_periodic_note(Period::Daily), vec![204]),
            (c.insert_into_periodic_note(Period::Daily, "x", &insertion), vec![200]),
        ];

        for (op, accepted) in cases {
            for status in [200, 201, 204, 400, 401, 404, 405, 500] {
                let result = op.parse(HttpResponse::new(status, "{}"));
                assert_eq!(
                    result.is_ok(),
                    accepted.contains(&status),
                    "{} with status {status}",
                    op.name()
                );
                if let Err(err) = result {
                    assert_eq!(err.status(), Some(status), "{}", op.name());
                }
            }
        }
    }

    #[test]
    fn rejected_status_keeps_body() {
        let err = client()
            .delete_active_file()
            .parse(HttpResponse::new(405, r#"{"message":"No active file"}"#))
            .unwrap_err();
        match err {
            ApiError::Http { status, body } => {
                assert_eq!(status, 405);
                assert!(body.contains("No active file"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
