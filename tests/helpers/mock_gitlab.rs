//! Mock GitLab server using wiremock for integration testing.
//!
//! Provides a configurable mock server that simulates the protected-branch
//! and approval endpoints with various response scenarios (success, errors,
//! rate limiting). The branch and approval mocks keep per-server state so a
//! test can run a whole create/read/replace/delete conversation against one
//! instance.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use gitlab_policy_connector::client::GitlabClient;
use gitlab_policy_connector::config::GitlabAuth;

/// A mock GitLab server that tracks protected branches and approval flags.
pub struct MockGitlab {
    server: MockServer,
    /// Protected branches keyed by branch name.
    protections: Arc<Mutex<HashMap<String, Value>>>,
    /// The project's single approval configuration record.
    approvals: Arc<Mutex<Value>>,
    /// Counter for generating protected-branch record ids.
    id_counter: Arc<Mutex<u64>>,
}

impl MockGitlab {
    /// Create a new mock GitLab server.
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
            protections: Arc::new(Mutex::new(HashMap::new())),
            approvals: Arc::new(Mutex::new(Value::Null)),
            id_counter: Arc::new(Mutex::new(100)),
        }
    }

    /// Get the base URI of the mock server.
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Create a GitlabClient configured to talk to this mock server.
    pub fn client(&self) -> GitlabClient {
        GitlabClient::with_http_client(
            self.uri(),
            GitlabAuth::private_token("test-token-123"),
            reqwest::Client::new(),
        )
    }

    /// Create a GitlabClient with a specific private token.
    pub fn client_with_token(&self, token: &str) -> GitlabClient {
        GitlabClient::with_http_client(
            self.uri(),
            GitlabAuth::private_token(token),
            reqwest::Client::new(),
        )
    }

    /// Create a GitlabClient authenticating with an OAuth bearer token.
    pub fn client_with_bearer(&self, token: &str) -> GitlabClient {
        GitlabClient::with_http_client(
            self.uri(),
            GitlabAuth::bearer(token),
            reqwest::Client::new(),
        )
    }

    // =========================================================================
    // Protected branch mocks (stateful)
    // =========================================================================

    /// Mount the full protected-branch endpoint set for one project.
    ///
    /// POST rejects an already-protected name with 409, like GitLab does;
    /// DELETE of an unknown name returns 404. State is shared across the
    /// mounted mocks, so protect/list/fetch/unprotect compose.
    pub async fn mock_protected_branches(&self, project: &str) {
        let encoded = escape_path_segment(project);
        let collection = format!("/projects/{encoded}/protected_branches");
        let member_pattern = format!("^/projects/{}/protected_branches/[^/]+$", regex_quote(&encoded));

        // POST /projects/:project/protected_branches
        let protections = self.protections.clone();
        let id_counter = self.id_counter.clone();
        Mock::given(method("POST"))
            .and(path(collection.clone()))
            .respond_with(move |req: &Request| {
                let body: Value = serde_json::from_slice(&req.body).unwrap_or(json!({}));
                let name = body
                    .get("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown")
                    .to_string();
                let push_code = body
                    .get("push_access_level")
                    .and_then(Value::as_u64)
                    .unwrap_or(40) as u32;
                let merge_code = body
                    .get("merge_access_level")
                    .and_then(Value::as_u64)
                    .unwrap_or(40) as u32;

                let mut store = protections.lock().unwrap();
                if store.contains_key(&name) {
                    return ResponseTemplate::new(409).set_body_json(json!({
                        "message": format!("Protected branch '{name}' already exists")
                    }));
                }

                let record_id = {
                    let mut counter = id_counter.lock().unwrap();
                    *counter += 1;
                    *counter
                };
                let record = protected_branch_response(record_id, &name, push_code, merge_code);
                store.insert(name, record.clone());
                ResponseTemplate::new(201).set_body_json(record)
            })
            .mount(&self.server)
            .await;

        // GET /projects/:project/protected_branches
        let protections = self.protections.clone();
        Mock::given(method("GET"))
            .and(path(collection))
            .respond_with(move |_req: &Request| {
                let store = protections.lock().unwrap();
                let records: Vec<Value> = store.values().cloned().collect();
                ResponseTemplate::new(200).set_body_json(records)
            })
            .mount(&self.server)
            .await;

        // GET /projects/:project/protected_branches/:branch
        let protections = self.protections.clone();
        Mock::given(method("GET"))
            .and(path_regex(member_pattern.clone()))
            .respond_with(move |req: &Request| {
                let branch = last_segment_decoded(req);
                let store = protections.lock().unwrap();
                match store.get(&branch) {
                    Some(record) => ResponseTemplate::new(200).set_body_json(record.clone()),
                    None => ResponseTemplate::new(404).set_body_json(json!({
                        "message": "404 Protected Branch Not Found"
                    })),
                }
            })
            .mount(&self.server)
            .await;

        // DELETE /projects/:project/protected_branches/:branch
        let protections = self.protections.clone();
        Mock::given(method("DELETE"))
            .and(path_regex(member_pattern))
            .respond_with(move |req: &Request| {
                let branch = last_segment_decoded(req);
                let mut store = protections.lock().unwrap();
                match store.remove(&branch) {
                    Some(_) => ResponseTemplate::new(204),
                    None => ResponseTemplate::new(404).set_body_json(json!({
                        "message": "404 Protected Branch Not Found"
                    })),
                }
            })
            .mount(&self.server)
            .await;
    }

    /// Seed a protected branch directly into the server state.
    pub fn seed_protected_branch(&self, name: &str, push_code: u32, merge_code: u32) {
        let record_id = {
            let mut counter = self.id_counter.lock().unwrap();
            *counter += 1;
            *counter
        };
        let record = protected_branch_response(record_id, name, push_code, merge_code);
        self.protections
            .lock()
            .unwrap()
            .insert(name.to_string(), record);
    }

    /// Mount a protect mock that always returns 409 Conflict.
    pub async fn mock_protect_conflict(&self, project: &str, branch: &str) {
        let encoded = escape_path_segment(project);
        Mock::given(method("POST"))
            .and(path(format!("/projects/{encoded}/protected_branches")))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "message": format!("Protected branch '{branch}' already exists")
            })))
            .mount(&self.server)
            .await;
    }

    // =========================================================================
    // Approval configuration mocks (stateful)
    // =========================================================================

    /// Mount the approval endpoints for one project.
    ///
    /// The record starts with GitLab's defaults (all flags false) under the
    /// given record id; POST replaces the flags and echoes the record back.
    pub async fn mock_approvals(&self, project: &str, record_id: u64) {
        let encoded = escape_path_segment(project);
        let endpoint = format!("/projects/{encoded}/approvals");

        *self.approvals.lock().unwrap() = approvals_response(record_id, false, false, false);

        // GET /projects/:project/approvals
        let approvals = self.approvals.clone();
        Mock::given(method("GET"))
            .and(path(endpoint.clone()))
            .respond_with(move |_req: &Request| {
                let record = approvals.lock().unwrap().clone();
                ResponseTemplate::new(200).set_body_json(record)
            })
            .mount(&self.server)
            .await;

        // POST /projects/:project/approvals
        let approvals = self.approvals.clone();
        Mock::given(method("POST"))
            .and(path(endpoint))
            .respond_with(move |req: &Request| {
                let body: Value = serde_json::from_slice(&req.body).unwrap_or(json!({}));
                let mut record = approvals.lock().unwrap();
                for flag in [
                    "reset_approvals_on_push",
                    "disable_overriding_approvers_per_merge_request",
                    "merge_requests_author_approval",
                ] {
                    if let Some(value) = body.get(flag) {
                        record[flag] = value.clone();
                    }
                }
                ResponseTemplate::new(200).set_body_json(record.clone())
            })
            .mount(&self.server)
            .await;
    }

    /// Number of approval-changing POST requests the server has received.
    pub async fn approval_change_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.method.as_str() == "POST" && r.url.path().ends_with("/approvals"))
            .count()
    }

    // =========================================================================
    // Error response mocks
    // =========================================================================

    /// Mount a mock that returns 401 Unauthorized for all requests.
    pub async fn mock_unauthorized(&self) {
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "message": "401 Unauthorized"
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock that returns 403 Forbidden for all requests.
    pub async fn mock_forbidden(&self) {
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "message": "403 Forbidden"
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock that returns 429 Too Many Requests with Retry-After.
    pub async fn mock_rate_limited(&self, retry_after_secs: u64) {
        Mock::given(wiremock::matchers::any())
            .respond_with(
                ResponseTemplate::new(429)
                    .append_header("Retry-After", retry_after_secs.to_string())
                    .set_body_json(json!({
                        "message": "Rate limit exceeded"
                    })),
            )
            .mount(&self.server)
            .await;
    }

    /// Mount a mock that returns 500 Internal Server Error.
    pub async fn mock_server_error(&self) {
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "message": "500 Internal Server Error"
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock that returns 502 Bad Gateway with a plain-text body.
    pub async fn mock_bad_gateway(&self) {
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&self.server)
            .await;
    }
}

/// Build a GitLab protected-branch response JSON.
pub fn protected_branch_response(id: u64, name: &str, push_code: u32, merge_code: u32) -> Value {
    json!({
        "id": id,
        "name": name,
        "push_access_levels": [{
            "access_level": push_code,
            "access_level_description": level_description(push_code)
        }],
        "merge_access_levels": [{
            "access_level": merge_code,
            "access_level_description": level_description(merge_code)
        }],
        "allow_force_push": false,
        "code_owner_approval_required": false
    })
}

/// Build a GitLab approval-configuration response JSON.
pub fn approvals_response(id: u64, reset: bool, disable: bool, author: bool) -> Value {
    json!({
        "id": id,
        "approvers": [],
        "approver_groups": [],
        "approvals_before_merge": 0,
        "reset_approvals_on_push": reset,
        "disable_overriding_approvers_per_merge_request": disable,
        "merge_requests_author_approval": author
    })
}

fn level_description(code: u32) -> &'static str {
    match code {
        0 => "No one",
        30 => "Developers + Maintainers",
        40 => "Maintainers",
        60 => "Admins",
        _ => "Unknown",
    }
}

/// Percent-encode one path segment the way the client does, so mock paths
/// line up with the still-encoded paths wiremock matches against.
fn escape_path_segment(segment: &str) -> String {
    let mut escaped = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                escaped.push(byte as char);
            }
            _ => escaped.push_str(&format!("%{byte:02X}")),
        }
    }
    escaped
}

/// Escape regex metacharacters so an encoded path can sit inside a pattern.
fn regex_quote(segment: &str) -> String {
    let mut quoted = String::with_capacity(segment.len());
    for c in segment.chars() {
        if c.is_ascii_alphanumeric() || c == '%' || c == '_' || c == '-' || c == '~' {
            quoted.push(c);
        } else {
            quoted.push('\\');
            quoted.push(c);
        }
    }
    quoted
}

/// Extract and percent-decode the final path segment of a request URL.
fn last_segment_decoded(req: &Request) -> String {
    let segment = req.url.path().rsplit('/').next().unwrap_or_default();
    let bytes = segment.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if let Some(hex) = segment.get(i + 1..i + 3) {
                if let Ok(byte) = u8::from_str_radix(hex, 16) {
                    decoded.push(byte);
                    i += 3;
                    continue;
                }
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}
