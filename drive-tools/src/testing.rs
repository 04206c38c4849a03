//! In-process fakes shared by the unit tests.

use crate::api::{Category, DriveClient, Entry, EntryKind, RateLimiter, Transport};
use crate::crawl::DirectoryLister;
use crate::utils::{ApiError, Result};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const FAKE_TOKEN: &str = "test-token";
pub const FAKE_DRIVE_ID: u64 = 77;

pub fn dir(id: u64, parent_id: u64, name: &str) -> Entry {
    entry(id, parent_id, name, EntryKind::Dir, 0)
}

pub fn file(id: u64, parent_id: u64, name: &str, size: u64) -> Entry {
    entry(id, parent_id, name, EntryKind::File, size)
}

fn entry(id: u64, parent_id: u64, name: &str, kind: EntryKind, size: u64) -> Entry {
    Entry {
        id,
        parent_id,
        kind,
        name: name.to_string(),
        size,
        depth: 0,
        last_modified_at: 1_700_000_000,
        created_at: 1_600_000_000,
        added_at: 1_600_000_000,
        updated_at: 1_700_000_000,
        drive_id: FAKE_DRIVE_ID,
        status: None,
        visibility: None,
        color: None,
    }
}

/// Serve `router` on an ephemeral local port and return its base URL
pub async fn spawn_router(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

#[derive(Default)]
struct ScriptState {
    statuses: VecDeque<u16>,
    calls: usize,
    last_auth: Option<String>,
    bodies: Vec<String>,
}

/// `/scripted` endpoint answering with a fixed sequence of statuses, then 200
#[derive(Clone, Default)]
pub struct StatusScript {
    state: Arc<Mutex<ScriptState>>,
}

impl StatusScript {
    pub fn new(statuses: Vec<u16>) -> Self {
        let script = Self::default();
        script.state.lock().unwrap().statuses = statuses.into();
        script
    }

    pub fn router(&self) -> Router {
        Router::new().route("/scripted", any(scripted)).with_state(self.clone())
    }

    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    pub fn last_auth(&self) -> Option<String> {
        self.state.lock().unwrap().last_auth.clone()
    }

    pub fn bodies(&self) -> Vec<String> {
        self.state.lock().unwrap().bodies.clone()
    }
}

async fn scripted(State(script): State<StatusScript>, headers: HeaderMap, body: Bytes) -> Response {
    let mut state = script.state.lock().unwrap();
    state.calls += 1;
    state.last_auth = header(&headers, "authorization");
    if !body.is_empty() {
        state.bodies.push(String::from_utf8_lossy(&body).into_owned());
    }

    match state.statuses.pop_front() {
        Some(code) if code != 200 => {
            let status = StatusCode::from_u16(code).unwrap();
            (status, r#"{"result":"error"}"#).into_response()
        }
        _ => (StatusCode::OK, r#"{"result":"success"}"#).into_response(),
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
}

#[derive(Default)]
struct DriveState {
    entries: HashMap<u64, Entry>,
    children: HashMap<u64, Vec<Entry>>,
    page_size: Option<usize>,
    failing_dirs: HashSet<u64>,
    failing_pages: HashSet<(u64, usize)>,
    drop_cursors: bool,
    categories: Vec<Category>,
    tags: HashMap<u64, BTreeSet<u64>>,
    list_calls: HashMap<u64, usize>,
}

/// Fake drive API server backed by an in-memory tree
#[derive(Clone, Default)]
pub struct FakeDrive {
    state: Arc<Mutex<DriveState>>,
}

impl FakeDrive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `children` as the listing of `parent`
    pub fn with_children(self, parent: u64, children: Vec<Entry>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            for child in &children {
                state.entries.insert(child.id, child.clone());
            }
            state.children.insert(parent, children);
        }
        self
    }

    /// Make `entry` reachable by id without listing it anywhere
    pub fn with_entry(self, entry: Entry) -> Self {
        self.state.lock().unwrap().entries.insert(entry.id, entry);
        self
    }

    /// Split listings into pages of `size`; cursors are offsets
    pub fn with_page_size(self, size: usize) -> Self {
        self.state.lock().unwrap().page_size = Some(size.max(1));
        self
    }

    pub fn fail_dir(self, dir_id: u64) -> Self {
        self.state.lock().unwrap().failing_dirs.insert(dir_id);
        self
    }

    /// Fail the zero-based `page` of the listing of `dir_id`
    pub fn fail_page(self, dir_id: u64, page: usize) -> Self {
        self.state.lock().unwrap().failing_pages.insert((dir_id, page));
        self
    }

    /// Report `has_more` without handing out a cursor
    pub fn drop_cursors(self) -> Self {
        self.state.lock().unwrap().drop_cursors = true;
        self
    }

    pub fn with_category(self, category: Category) -> Self {
        self.state.lock().unwrap().categories.push(category);
        self
    }

    /// Ids currently carrying `category_id`, sorted
    pub fn tagged(&self, category_id: u64) -> Vec<u64> {
        let state = self.state.lock().unwrap();
        state
            .tags
            .get(&category_id)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of listing requests (pages) served for `dir_id`
    pub fn list_calls(&self, dir_id: u64) -> usize {
        self.state.lock().unwrap().list_calls.get(&dir_id).copied().unwrap_or(0)
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/3/drive/{drive}/files/{id}", get(get_file))
            .route("/3/drive/{drive}/files/{id}/files", get(list_files))
            .route("/2/drive/{drive}/categories", get(list_categories))
            .route(
                "/2/drive/{drive}/files/categories/{category}",
                post(add_category).delete(remove_category),
            )
            .with_state(self.clone())
    }

    pub async fn spawn_client(&self) -> DriveClient {
        self.spawn_client_with_cancel(CancellationToken::new()).await
    }

    pub async fn spawn_client_with_cancel(&self, cancel: CancellationToken) -> DriveClient {
        let base = spawn_router(self.router()).await;
        let transport = Transport::new(
            base,
            FAKE_TOKEN,
            RateLimiter::new(1000, 1000),
            Duration::from_secs(5),
            cancel,
        )
        .unwrap();
        DriveClient::from_transport(transport, FAKE_DRIVE_ID)
    }
}

#[derive(Deserialize)]
struct CursorQuery {
    cursor: Option<String>,
}

#[derive(Deserialize)]
struct FileIds {
    file_ids: Vec<u64>,
}

fn reject(headers: &HeaderMap, drive: u64) -> Option<Response> {
    let expected = format!("Bearer {FAKE_TOKEN}");
    if header(headers, "authorization").as_deref() != Some(expected.as_str()) {
        return Some(error_response(StatusCode::UNAUTHORIZED, "not_authorized"));
    }
    if drive != FAKE_DRIVE_ID {
        return Some(error_response(StatusCode::NOT_FOUND, "drive_not_found"));
    }
    None
}

fn error_response(status: StatusCode, code: &str) -> Response {
    (status, Json(json!({ "result": "error", "error": { "code": code } }))).into_response()
}

fn success<T: serde::Serialize>(data: T) -> Response {
    Json(json!({ "result": "success", "data": data })).into_response()
}

async fn get_file(
    State(drive): State<FakeDrive>,
    Path((drive_id, id)): Path<(u64, u64)>,
    headers: HeaderMap,
) -> Response {
    if let Some(rejection) = reject(&headers, drive_id) {
        return rejection;
    }
    let state = drive.state.lock().unwrap();
    match state.entries.get(&id) {
        Some(entry) => success(entry),
        None => error_response(StatusCode::NOT_FOUND, "object_not_found"),
    }
}

async fn list_files(
    State(drive): State<FakeDrive>,
    Path((drive_id, id)): Path<(u64, u64)>,
    Query(query): Query<CursorQuery>,
    headers: HeaderMap,
) -> Response {
    if let Some(rejection) = reject(&headers, drive_id) {
        return rejection;
    }
    let mut state = drive.state.lock().unwrap();
    *state.list_calls.entry(id).or_default() += 1;

    if state.failing_dirs.contains(&id) {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal_error");
    }

    let children = state.children.get(&id).cloned().unwrap_or_default();
    let page_size = state.page_size.unwrap_or(children.len().max(1));
    let offset: usize = match query.cursor.as_deref().map(str::parse) {
        None => 0,
        Some(Ok(offset)) => offset,
        Some(Err(_)) => return error_response(StatusCode::BAD_REQUEST, "invalid_cursor"),
    };

    if state.failing_pages.contains(&(id, offset / page_size)) {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal_error");
    }

    let end = (offset + page_size).min(children.len());
    let has_more = end < children.len();
    let cursor = (has_more && !state.drop_cursors).then(|| end.to_string());
    let page = children[offset.min(end)..end].to_vec();
    Json(json!({
        "result": "success",
        "data": page,
        "cursor": cursor,
        "has_more": has_more,
        "response_at": 1_700_000_000,
    }))
    .into_response()
}

async fn list_categories(
    State(drive): State<FakeDrive>,
    Path(drive_id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    if let Some(rejection) = reject(&headers, drive_id) {
        return rejection;
    }
    let state = drive.state.lock().unwrap();
    success(&state.categories)
}

async fn add_category(
    State(drive): State<FakeDrive>,
    Path((drive_id, category)): Path<(u64, u64)>,
    headers: HeaderMap,
    Json(body): Json<FileIds>,
) -> Response {
    if let Some(rejection) = reject(&headers, drive_id) {
        return rejection;
    }
    let mut state = drive.state.lock().unwrap();
    let tagged = state.tags.entry(category).or_default();
    let results: Vec<_> = body
        .file_ids
        .iter()
        .map(|id| json!({ "id": id, "result": tagged.insert(*id) }))
        .collect();
    success(results)
}

async fn remove_category(
    State(drive): State<FakeDrive>,
    Path((drive_id, category)): Path<(u64, u64)>,
    headers: HeaderMap,
    Json(body): Json<FileIds>,
) -> Response {
    if let Some(rejection) = reject(&headers, drive_id) {
        return rejection;
    }
    let mut state = drive.state.lock().unwrap();
    let tagged = state.tags.entry(category).or_default();
    let results: Vec<_> = body
        .file_ids
        .iter()
        .map(|id| json!({ "id": id, "result": tagged.remove(id) }))
        .collect();
    success(results)
}

/// In-memory lister with failure injection and call accounting
#[derive(Default)]
pub struct MemoryTree {
    children: HashMap<u64, Vec<Entry>>,
    failing: HashSet<u64>,
    only_ok: Option<HashSet<u64>>,
    delay: Option<Duration>,
    dir_delays: HashMap<u64, Duration>,
    panics_on: Option<u64>,
    cancel_after: Option<(usize, CancellationToken)>,
    calls: AtomicUsize,
    listed: Mutex<Vec<u64>>,
}

impl MemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_children(mut self, parent: u64, children: Vec<Entry>) -> Self {
        self.children.insert(parent, children);
        self
    }

    pub fn fail_dir(mut self, dir_id: u64) -> Self {
        self.failing.insert(dir_id);
        self
    }

    /// Fail every listing except the given directories
    pub fn fail_all_except(mut self, ok: &[u64]) -> Self {
        self.only_ok = Some(ok.iter().copied().collect());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Delay only the listing of `dir_id`, overriding `with_delay`
    pub fn with_dir_delay(mut self, dir_id: u64, delay: Duration) -> Self {
        self.dir_delays.insert(dir_id, delay);
        self
    }

    /// Panic inside the listing of `dir_id`
    pub fn panic_on(mut self, dir_id: u64) -> Self {
        self.panics_on = Some(dir_id);
        self
    }

    /// Fire `token` when the `calls`-th listing starts
    pub fn cancel_after(mut self, calls: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((calls, token));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Directory ids in the order their listing started
    pub fn listed_ids(&self) -> Vec<u64> {
        self.listed.lock().unwrap().clone()
    }

    fn fails(&self, dir_id: u64) -> bool {
        self.failing.contains(&dir_id)
            || self.only_ok.as_ref().is_some_and(|ok| !ok.contains(&dir_id))
    }
}

impl DirectoryLister for MemoryTree {
    fn list_children(&self, directory_id: u64) -> impl Future<Output = Result<Vec<Entry>>> + Send {
        async move {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.listed.lock().unwrap().push(directory_id);
            if let Some((limit, token)) = &self.cancel_after {
                if n >= *limit {
                    token.cancel();
                }
            }

            if let Some(delay) = self.dir_delays.get(&directory_id).copied().or(self.delay) {
                tokio::time::sleep(delay).await;
            }
            if self.panics_on == Some(directory_id) {
                panic!("lister blew up on {directory_id}");
            }

            if self.fails(directory_id) {
                return Err(ApiError::Api {
                    status: 500,
                    body: format!("listing of {directory_id} failed"),
                });
            }
            Ok(self.children.get(&directory_id).cloned().unwrap_or_default())
        }
    }
}

/// Tree where every directory down to `depth` has `fanout` subdirectories
/// and each directory holds `files` files. The root has id 1.
pub fn balanced_tree(depth: u32, fanout: u64, files: u64) -> MemoryTree {
    let mut tree = MemoryTree::new();
    let mut next_id = 2u64;
    let mut level = vec![1u64];

    for current in 0..=depth {
        let mut next_level = Vec::new();
        for &parent in &level {
            let mut children = Vec::new();
            if current < depth {
                for _ in 0..fanout {
                    children.push(dir(next_id, parent, &format!("d{next_id}")));
                    next_level.push(next_id);
                    next_id += 1;
                }
            }
            for _ in 0..files {
                children.push(file(next_id, parent, &format!("f{next_id}"), next_id * 10));
                next_id += 1;
            }
            tree = tree.with_children(parent, children);
        }
        level = next_level;
    }

    tree
}
