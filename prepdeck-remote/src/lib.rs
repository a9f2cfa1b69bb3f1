//! Hosted backend access: a PostgREST-style record store and the HTTP
//! text generator used for answer and interview evaluation.

use async_trait::async_trait;
use prepdeck_core::ai::TextGenerator;
use prepdeck_core::repo::{Filter, Query, RecordStore, Table};
use prepdeck_core::CoreError;
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("prepdeck/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

fn build_client() -> Result<Client, CoreError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(network)
}

fn network(e: reqwest::Error) -> CoreError {
    CoreError::Remote {
        status: e.status().map(|s| s.as_u16()).unwrap_or(0),
        message: e.to_string(),
    }
}

/// The generator endpoint is always reached over TLS.
pub fn enforce_https(url: &str) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    }
}

fn render_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Query-string pairs in the PostgREST filter dialect.
pub fn render_params(query: &Query) -> Vec<(String, String)> {
    let mut out = Vec::with_capacity(query.filters.len() + 2);
    for f in &query.filters {
        let (col, op, v) = match f {
            Filter::Eq(c, v) => (c, "eq", v),
            Filter::Gte(c, v) => (c, "gte", v),
        };
        out.push((col.clone(), format!("{op}.{}", render_value(v))));
    }
    if let Some(o) = &query.order {
        let dir = if o.ascending { "asc" } else { "desc" };
        out.push(("order".into(), format!("{}.{dir}", o.column)));
    }
    if let Some(n) = query.limit {
        out.push(("limit".into(), n.to_string()));
    }
    out
}

/// Total from a `Content-Range` header such as `0-24/573` or `*/0`.
pub fn parse_content_range(value: &str) -> Option<usize> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

pub struct RestStore {
    http: Client,
    base_url: String,
    api_key: String,
}

impl RestStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, CoreError> {
        Ok(Self {
            http: build_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn request(&self, method: Method, table: Table) -> RequestBuilder {
        let url = format!("{}/rest/v1/{}", self.base_url, table.as_str());
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send(&self, req: RequestBuilder, table: Table) -> Result<Response, CoreError> {
        let resp = req.send().await.map_err(network)?;
        let status = resp.status();
        debug!(%table, status = status.as_u16(), "rest response");
        if status.is_success() {
            return Ok(resp);
        }
        if status == StatusCode::CONFLICT {
            return Err(CoreError::Conflict("row id already exists"));
        }
        let message = resp.text().await.unwrap_or_default();
        Err(CoreError::Remote {
            status: status.as_u16(),
            message,
        })
    }

    async fn rows(resp: Response) -> Result<Vec<Value>, CoreError> {
        resp.json::<Vec<Value>>().await.map_err(network)
    }

    async fn write_one(&self, table: Table, row: Value, prefer: &str) -> Result<Value, CoreError> {
        let req = self
            .request(Method::POST, table)
            .header("Prefer", prefer)
            .json(&row);
        let resp = self.send(req, table).await?;
        Ok(Self::rows(resp).await?.into_iter().next().unwrap_or(row))
    }
}

#[async_trait]
impl RecordStore for RestStore {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>, CoreError> {
        let req = self
            .request(Method::GET, table)
            .query(&[("select", "*")])
            .query(&render_params(query));
        let resp = self.send(req, table).await?;
        Self::rows(resp).await
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value, CoreError> {
        self.write_one(table, row, "return=representation").await
    }

    async fn upsert(&self, table: Table, row: Value) -> Result<Value, CoreError> {
        self.write_one(table, row, "resolution=merge-duplicates,return=representation")
            .await
    }

    async fn update(&self, table: Table, query: &Query, patch: Value) -> Result<Vec<Value>, CoreError> {
        let req = self
            .request(Method::PATCH, table)
            .query(&render_params(query))
            .header("Prefer", "return=representation")
            .json(&patch);
        let resp = self.send(req, table).await?;
        Self::rows(resp).await
    }

    async fn delete(&self, table: Table, query: &Query) -> Result<usize, CoreError> {
        let req = self
            .request(Method::DELETE, table)
            .query(&render_params(query))
            .header("Prefer", "return=representation");
        let resp = self.send(req, table).await?;
        Ok(Self::rows(resp).await?.len())
    }

    async fn count(&self, table: Table, query: &Query) -> Result<usize, CoreError> {
        let req = self
            .request(Method::HEAD, table)
            .query(&[("select", "id")])
            .query(&render_params(query))
            .header("Prefer", "count=exact");
        let resp = self.send(req, table).await?;
        resp.headers()
            .get(header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or(CoreError::Remote {
                status: resp.status().as_u16(),
                message: "missing Content-Range".into(),
            })
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    text: String,
}

/// Text generation over HTTP: `POST {url}` with `{"prompt"}`, reply `{"text"}`.
pub struct HttpGenerator {
    http: Client,
    url: String,
    api_key: Option<String>,
}

impl HttpGenerator {
    pub fn new(url: &str, api_key: Option<String>) -> Result<Self, CoreError> {
        Ok(Self {
            http: build_client()?,
            url: enforce_https(url),
            api_key,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl TextGenerator for HttpGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, CoreError> {
        let mut req = self.http.post(&self.url).json(&GenerateRequest { prompt });
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        debug!(url = %self.url, chars = prompt.len(), "generate");
        let resp = req.send().await.map_err(network)?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(CoreError::Remote {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp.json::<GenerateResponse>().await.map_err(network)?.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_renders_postgrest_filters() {
        let q = Query::all()
            .eq("status", "Pending")
            .gte("last_active", "2024-05-01T00:00:00Z")
            .eq("mastered", false)
            .order_by("created_at", false)
            .limit(20);
        let got = render_params(&q);
        let want: Vec<(String, String)> = [
            ("status", "eq.Pending"),
            ("last_active", "gte.2024-05-01T00:00:00Z"),
            ("mastered", "eq.false"),
            ("order", "created_at.desc"),
            ("limit", "20"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(got, want);
        assert!(render_params(&Query::all()).is_empty());
    }

    #[test]
    fn content_range_total() {
        assert_eq!(parse_content_range("0-24/573"), Some(573));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range("0-1/*"), None);
    }

    #[test]
    fn plain_http_is_upgraded() {
        assert_eq!(enforce_https("http://ai.example/v1"), "https://ai.example/v1");
        assert_eq!(enforce_https("https://ai.example/v1"), "https://ai.example/v1");
        let g = HttpGenerator::new("http://ai.example/gen", None).unwrap();
        assert_eq!(g.url(), "https://ai.example/gen");
    }
}
