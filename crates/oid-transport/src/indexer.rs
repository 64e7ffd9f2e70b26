//! Indexing-service client.
//!
//! Issues type-filtered (optionally owner-filtered) object queries against
//! the GraphQL-style indexing service, following its Relay-flavored
//! cursor-pagination protocol: each page carries `edges` plus a `pageInfo`
//! with `hasNextPage`/`endCursor`. Pagination is strictly sequential - one
//! page in flight at a time, terminating when the service reports no next
//! page or omits the cursor.
//!
//! Error semantics are strict: non-2xx HTTP, a populated `errors` array, or
//! a response missing `data.objects.edges` are all fatal. Zero edges is not
//! an error; it comes back as an empty vector.

use serde_json::{json, Value};
use tracing::debug;

use oid_types::OidError;

use crate::default_agent;

/// Maximum items requested per page (the service's own limit).
const MAX_PAGE_SIZE: usize = 50;

/// Relay-style pagination info from an indexing-service response.
#[derive(Debug, Clone, Default)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

impl PageInfo {
    pub fn from_value(value: Option<&Value>) -> Self {
        let Some(v) = value else {
            return Self::default();
        };
        Self {
            has_next_page: v
                .get("hasNextPage")
                .and_then(|x| x.as_bool())
                .unwrap_or(false),
            end_cursor: v
                .get("endCursor")
                .and_then(|x| x.as_str())
                .map(String::from),
        }
    }
}

/// One matching on-chain object, as returned by the indexing service.
#[derive(Debug, Clone)]
pub struct ObjectEdge {
    pub cursor: Option<String>,
    pub address: String,
    pub version: Option<u64>,
    /// Exact struct type of the object (`type { repr }`).
    pub type_repr: Option<String>,
    /// Decoded Move field contents.
    pub data: Option<Value>,
}

/// The indexing-service capability the core depends on. Implemented by the
/// HTTP client below and by in-memory mocks in tests.
pub trait Indexer: Send + Sync {
    /// Fetch one page of objects matching `object_type` (exact match),
    /// optionally restricted to an owner, starting after `after`.
    fn query_objects_page(
        &self,
        object_type: &str,
        owner: Option<&str>,
        after: Option<&str>,
    ) -> Result<(Vec<ObjectEdge>, PageInfo), OidError>;

    /// Collect up to `limit` matching objects, paginating sequentially.
    fn query_objects(
        &self,
        object_type: &str,
        owner: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ObjectEdge>, OidError> {
        let mut all = Vec::new();
        let mut cursor: Option<String> = None;
        while all.len() < limit {
            let (edges, page_info) =
                self.query_objects_page(object_type, owner, cursor.as_deref())?;
            if edges.is_empty() {
                break;
            }
            all.extend(edges);
            match (page_info.has_next_page, page_info.end_cursor) {
                (true, Some(next)) => cursor = Some(next),
                // No next page, or the service omitted the cursor: stop.
                _ => break,
            }
        }
        all.truncate(limit);
        Ok(all)
    }
}

/// HTTP implementation of [`Indexer`].
#[derive(Clone)]
pub struct IndexerClient {
    endpoint: String,
    agent: ureq::Agent,
}

const OBJECTS_QUERY: &str = r#"
    query Objects($type: String!, $after: String, $owner: IotaAddress, $first: Int) {
        objects(filter: { type: $type, owner: $owner }, after: $after, first: $first) {
            edges {
                cursor
                node {
                    address
                    version
                    asMoveObject {
                        contents {
                            type { repr }
                            data
                        }
                    }
                }
            }
            pageInfo {
                hasNextPage
                endCursor
            }
        }
    }
"#;

impl IndexerClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            agent: default_agent(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Execute one query; returns the `data` payload.
    fn query(&self, query: &str, variables: Value) -> Result<Value, OidError> {
        let body = json!({ "query": query, "variables": variables });

        let response = match self.agent.post(&self.endpoint).send_json(&body) {
            Ok(resp) => resp,
            Err(ureq::Error::Status(status, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                return Err(OidError::RemoteService { status, body });
            }
            Err(e) => {
                return Err(OidError::RemoteService {
                    status: 0,
                    body: format!("indexer request failed: {e}"),
                })
            }
        };

        let payload: Value = response
            .into_json()
            .map_err(|e| OidError::Rpc(format!("failed to parse indexer response: {e}")))?;

        extract_data(payload)
    }
}

/// Dissect a raw indexer response body: a populated `errors` array or a
/// missing `data` field is fatal, even on a 2xx response.
fn extract_data(payload: Value) -> Result<Value, OidError> {
    if let Some(errors) = payload.get("errors").and_then(|e| e.as_array()) {
        if !errors.is_empty() {
            let msg = errors[0]
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error");
            return Err(OidError::RemoteService {
                status: 200,
                body: format!("indexer error: {msg}"),
            });
        }
    }

    payload
        .get("data")
        .cloned()
        .ok_or_else(|| OidError::Rpc("no data in indexer response".to_string()))
}

/// Parse the `data` payload of an objects query into one page.
///
/// Absent `objects.edges` is a malformed reply and fatal, distinct from the
/// zero-edges case (an empty array), which is an empty page.
fn parse_objects_page(data: &Value) -> Result<(Vec<ObjectEdge>, PageInfo), OidError> {
    let edges_value = data
        .get("objects")
        .and_then(|o| o.get("edges"))
        .and_then(|e| e.as_array())
        .ok_or_else(|| OidError::Rpc("indexer response missing objects.edges".to_string()))?;

    let edges = edges_value.iter().filter_map(parse_edge).collect();
    let page_info = PageInfo::from_value(data.get("objects").and_then(|o| o.get("pageInfo")));
    Ok((edges, page_info))
}

impl Indexer for IndexerClient {
    fn query_objects_page(
        &self,
        object_type: &str,
        owner: Option<&str>,
        after: Option<&str>,
    ) -> Result<(Vec<ObjectEdge>, PageInfo), OidError> {
        debug!(object_type, owner, after, "indexer object query");

        let variables = json!({
            "type": object_type,
            "after": after,
            "owner": owner,
            "first": MAX_PAGE_SIZE,
        });

        let data = self.query(OBJECTS_QUERY, variables)?;
        parse_objects_page(&data)
    }
}

fn parse_edge(edge: &Value) -> Option<ObjectEdge> {
    let node = edge.get("node")?;
    let address = node.get("address")?.as_str()?.to_string();
    let contents = node.get("asMoveObject").and_then(|m| m.get("contents"));
    Some(ObjectEdge {
        cursor: edge.get("cursor").and_then(|c| c.as_str()).map(String::from),
        address,
        version: node.get("version").and_then(|v| v.as_u64()),
        type_repr: contents
            .and_then(|c| c.get("type"))
            .and_then(|t| t.get("repr"))
            .and_then(|r| r.as_str())
            .map(String::from),
        data: contents.and_then(|c| c.get("data")).cloned(),
    })
}
