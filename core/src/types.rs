//! Payload types for the vault API.
//!
//! # Design
//! Response types are deliberately lenient: optional or unknown fields
//! default instead of failing, since the server adds fields between
//! releases. Request-side types (`Insertion`, `SearchQuery`, `Period`) carry
//! the header and content-type values the wire format expects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Content type announcing a Dataview DQL query body.
pub const DATAVIEW_CONTENT_TYPE: &str = "application/vnd.olrapi.dataview.dql+txt";
/// Content type announcing a JsonLogic rule body.
pub const JSON_LOGIC_CONTENT_TYPE: &str = "application/vnd.olrapi.jsonlogic+json";
/// Accept type that asks for a note as JSON with metadata.
pub const NOTE_JSON_CONTENT_TYPE: &str = "application/vnd.olrapi.note+json";

/// Recurring period a periodic note is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Period {
    pub const ALL: [Period; 5] = [
        Period::Daily,
        Period::Weekly,
        Period::Monthly,
        Period::Quarterly,
        Period::Yearly,
    ];

    /// Path segment used under `/periodic/`.
    pub fn as_str(self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
            Period::Quarterly => "quarterly",
            Period::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown value {value:?}, expected one of: {expected}")]
pub struct ParseEnumError {
    value: String,
    expected: &'static str,
}

impl FromStr for Period {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::ALL
            .into_iter()
            .find(|period| period.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseEnumError {
                value: s.to_string(),
                expected: "daily, weekly, monthly, quarterly, yearly",
            })
    }
}

/// Where inserted content lands relative to the target heading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InsertPosition {
    #[default]
    End,
    Beginning,
}

impl InsertPosition {
    /// Value of the `Content-Insertion-Position` header.
    pub fn as_str(self) -> &'static str {
        match self {
            InsertPosition::End => "end",
            InsertPosition::Beginning => "beginning",
        }
    }
}

impl FromStr for InsertPosition {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "end" => Ok(InsertPosition::End),
            "beginning" => Ok(InsertPosition::Beginning),
            _ => Err(ParseEnumError {
                value: s.to_string(),
                expected: "end, beginning",
            }),
        }
    }
}

/// Target of a heading-relative insertion (`PATCH` requests).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    pub heading: String,
    pub position: InsertPosition,
    /// Delimiter between nested heading names, e.g. `Day::Tasks` with `::`.
    pub heading_boundary: Option<String>,
}

impl Insertion {
    pub fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            position: InsertPosition::End,
            heading_boundary: None,
        }
    }

    pub fn at(mut self, position: InsertPosition) -> Self {
        self.position = position;
        self
    }

    pub fn with_boundary(mut self, boundary: impl Into<String>) -> Self {
        self.heading_boundary = Some(boundary.into());
        self
    }
}

/// Body of a `POST /search/` request.
///
/// Plain strings are Dataview DQL; structured values are JsonLogic rules.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchQuery {
    Dataview(String),
    JsonLogic(serde_json::Value),
}

impl SearchQuery {
    pub fn content_type(&self) -> &'static str {
        match self {
            SearchQuery::Dataview(_) => DATAVIEW_CONTENT_TYPE,
            SearchQuery::JsonLogic(_) => JSON_LOGIC_CONTENT_TYPE,
        }
    }

    pub fn to_body(&self) -> String {
        match self {
            SearchQuery::Dataview(query) => query.clone(),
            SearchQuery::JsonLogic(rule) => rule.to_string(),
        }
    }
}

impl From<&str> for SearchQuery {
    fn from(query: &str) -> Self {
        SearchQuery::Dataview(query.to_string())
    }
}

impl From<String> for SearchQuery {
    fn from(query: String) -> Self {
        SearchQuery::Dataview(query)
    }
}

impl From<serde_json::Value> for SearchQuery {
    fn from(rule: serde_json::Value) -> Self {
        match rule {
            serde_json::Value::String(query) => SearchQuery::Dataview(query),
            other => SearchQuery::JsonLogic(other),
        }
    }
}

/// A note returned with `Accept: application/vnd.olrapi.note+json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteJson {
    pub content: String,
    pub frontmatter: serde_json::Map<String, serde_json::Value>,
    pub path: String,
    pub stat: NoteStat,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteStat {
    pub ctime: i64,
    pub mtime: i64,
    pub size: u64,
}

/// A command registered in the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// One hit of a Dataview or JsonLogic search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub filename: String,
    #[serde(default)]
    pub result: serde_json::Value,
}

/// One file matched by a simple text search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleSearchResult {
    pub filename: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub matches: Vec<SearchMatch>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMatch {
    #[serde(rename = "match")]
    pub span: MatchSpan,
    #[serde(default)]
    pub context: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
}

/// Response of the unauthenticated `GET /`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerStatus {
    pub status: String,
    pub service: String,
    pub authenticated: bool,
    pub versions: Versions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Versions {
    pub obsidian: String,
    #[serde(rename = "self")]
    pub api: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn period_parses_case_insensitively() {
        assert_eq!("Weekly".parse::<Period>().unwrap(), Period::Weekly);
        assert_eq!("yearly".parse::<Period>().unwrap(), Period::Yearly);
        let err = "hourly".parse::<Period>().unwrap_err();
        assert!(err.to_string().contains("hourly"));
    }

    #[test]
    fn string_queries_are_dataview() {
        let query = SearchQuery::from("TABLE file.mtime FROM #todo");
        assert_eq!(query.content_type(), DATAVIEW_CONTENT_TYPE);
        assert_eq!(query.to_body(), "TABLE file.mtime FROM #todo");
    }

    #[test]
    fn structured_queries_are_json_logic() {
        let rule = json!({"glob": ["*.md", {"var": "path"}]});
        let query = SearchQuery::from(rule.clone());
        assert_eq!(query.content_type(), JSON_LOGIC_CONTENT_TYPE);
        let body: serde_json::Value = serde_json::from_str(&query.to_body()).unwrap();
        assert_eq!(body, rule);
    }

    #[test]
    fn json_string_values_stay_dataview() {
        let query = SearchQuery::from(json!("LIST FROM \"daily\""));
        assert_eq!(query, SearchQuery::Dataview("LIST FROM \"daily\"".to_string()));
    }

    #[test]
    fn insertion_defaults_to_end_without_boundary() {
        let insertion = Insertion::new("Tasks");
        assert_eq!(insertion.position, InsertPosition::End);
        assert!(insertion.heading_boundary.is_none());

        let insertion = Insertion::new("Day::Tasks")
            .at(InsertPosition::Beginning)
            .with_boundary("::");
        assert_eq!(insertion.position.as_str(), "beginning");
        assert_eq!(insertion.heading_boundary.as_deref(), Some("::"));
    }

    #[test]
    fn note_json_tolerates_missing_fields() {
        let note: NoteJson = serde_json::from_str(r##"{"content":"# Hi","path":"a.md"}"##).unwrap();
        assert_eq!(note.content, "# Hi");
        assert!(note.tags.is_empty());
        assert_eq!(note.stat.size, 0);
    }

    #[test]
    fn simple_search_result_reads_match_spans() {
        let raw = r#"[{"filename":"a.md","score":-0.5,"matches":[{"match":{"start":3,"end":8},"context":"so hello there"}]}]"#;
        let results: Vec<SimpleSearchResult> = serde_json::from_str(raw).unwrap();
        assert_eq!(results[0].matches[0].span, MatchSpan { start: 3, end: 8 });
    }

    #[test]
    fn server_status_reads_self_version() {
        let raw = r#"{"status":"OK","service":"Obsidian Local REST API","authenticated":false,"versions":{"obsidian":"1.5.3","self":"3.0.1"}}"#;
        let status: ServerStatus = serde_json::from_str(raw).unwrap();
        assert_eq!(status.versions.api, "3.0.1");
        assert!(!status.authenticated);
    }
}
