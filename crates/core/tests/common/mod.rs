//! In-process fake tracker serving both the FileList and HDBits endpoints.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Multipart, Path as UrlPath, Query, Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use uploadarr_core::config::{Config, FileListConfig, HdbConfig, HttpConfig};
use uploadarr_core::context::cookie_path;

pub const USERNAME: &str = "alice";
pub const PASSWORD: &str = "secret";
pub const PASSKEY: &str = "pk-123";
pub const REMOTE_ID: u64 = 77;

const VALIDATOR: &str = "v-42";
const SESSION_COOKIE: &str = "pass=s3ss10n";

/// A multipart submission as the fake site received it.
#[derive(Debug, Clone, Default)]
pub struct ReceivedUpload {
    pub fields: Vec<(String, String)>,
    pub torrent_name: Option<String>,
    pub torrent_len: usize,
}

impl ReceivedUpload {
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct FakeState {
    requests: usize,
    logins: usize,
    reject_uploads: bool,
    search_delay: Option<Duration>,
    existing: Vec<String>,
    uploads: Vec<ReceivedUpload>,
    downloads: Vec<String>,
}

type Shared = Arc<Mutex<FakeState>>;

#[derive(Clone)]
pub struct FakeTracker {
    pub base: String,
    state: Shared,
}

impl FakeTracker {
    pub async fn start() -> Self {
        let state: Shared = Arc::default();
        let app = Router::new()
            // FileList
            .route("/login.php", get(login_page))
            .route("/takelogin.php", post(take_login))
            .route("/index.php", get(fl_index))
            .route("/browse.php", get(browse))
            .route("/takeupload.php", post(take_upload))
            .route("/details.php", get(details))
            .route("/download.php", get(fl_download))
            // HDBits
            .route("/", get(hdb_index))
            .route("/api/test", post(api_test))
            .route("/api/torrents", post(api_torrents))
            .route("/upload/upload", post(take_upload))
            .route("/download.php/{file}", get(hdb_download))
            .layer(middleware::from_fn_with_state(state.clone(), count_requests))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake tracker");
        let addr = listener.local_addr().expect("Failed to read local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            base: format!("http://{addr}"),
            state,
        }
    }

    pub async fn requests(&self) -> usize {
        self.state.lock().await.requests
    }

    pub async fn logins(&self) -> usize {
        self.state.lock().await.logins
    }

    pub async fn uploads(&self) -> Vec<ReceivedUpload> {
        self.state.lock().await.uploads.clone()
    }

    pub async fn downloads(&self) -> Vec<String> {
        self.state.lock().await.downloads.clone()
    }

    pub async fn reject_uploads(&self) {
        self.state.lock().await.reject_uploads = true;
    }

    pub async fn set_search_delay(&self, delay: Duration) {
        self.state.lock().await.search_delay = Some(delay);
    }

    pub async fn set_existing(&self, names: &[&str]) {
        self.state.lock().await.existing = names.iter().map(|n| n.to_string()).collect();
    }

    pub fn filelist_config(&self) -> FileListConfig {
        FileListConfig {
            username: USERNAME.into(),
            password: PASSWORD.into(),
            announce_url: format!("{}/announce.php", self.base),
            url: self.base.clone(),
            uploader_name: None,
            anon: true,
            description_service: None,
            signature: None,
        }
    }

    pub fn hdb_config(&self) -> HdbConfig {
        HdbConfig {
            username: USERNAME.into(),
            passkey: PASSKEY.into(),
            announce_url: format!("{}/announce.php", self.base),
            url: self.base.clone(),
            image_url: self.base.clone(),
            img_rehost: false,
            internal_groups: Vec::new(),
            signature: None,
        }
    }
}

/// Shared settings rooted at `base_dir` with short timeouts.
pub fn config(base_dir: &Path) -> Config {
    Config {
        base_dir: base_dir.to_path_buf(),
        unattended: true,
        check_duplicates: false,
        http: HttpConfig {
            search_timeout_secs: 1,
            validate_timeout_secs: 2,
            ..HttpConfig::default()
        },
        ..Config::default()
    }
}

/// Store the session cookie the way a user exports it for HDBits.
pub async fn write_hdb_cookies(base_dir: &Path) {
    let path = cookie_path(base_dir, "HDB");
    tokio::fs::create_dir_all(path.parent().expect("cookie dir"))
        .await
        .expect("Failed to create cookie dir");
    tokio::fs::write(&path, format!("{SESSION_COOKIE}\n"))
        .await
        .expect("Failed to write cookies");
}

async fn count_requests(State(state): State<Shared>, request: Request, next: Next) -> Response {
    state.lock().await.requests += 1;
    next.run(request).await
}

fn has_session(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|c| c.contains(SESSION_COOKIE))
}

async fn login_page() -> Html<String> {
    Html(format!(
        r#"<form action="takelogin.php" method="post">
            <input type="hidden" name="validator" value="{VALIDATOR}" />
        </form>"#
    ))
}

#[derive(Deserialize)]
struct LoginForm {
    validator: String,
    username: String,
    password: String,
}

async fn take_login(State(state): State<Shared>, Form(form): Form<LoginForm>) -> Response {
    state.lock().await.logins += 1;
    if form.validator == VALIDATOR && form.username == USERNAME && form.password == PASSWORD {
        (
            [(header::SET_COOKIE, format!("{SESSION_COOKIE}; Path=/"))],
            Html("Welcome"),
        )
            .into_response()
    } else {
        Html("Login failed").into_response()
    }
}

async fn fl_index(headers: HeaderMap) -> Html<&'static str> {
    if has_session(&headers) {
        Html(r#"<a href="logout.php">Logout</a>"#)
    } else {
        Html(r#"<a href="login.php">Login</a>"#)
    }
}

async fn hdb_index(headers: HeaderMap) -> Html<&'static str> {
    if has_session(&headers) {
        Html(r#"<a href="/logout.php">Logout</a>"#)
    } else {
        Html(r#"<a href="/login">Login</a>"#)
    }
}

async fn browse(State(state): State<Shared>) -> Html<String> {
    let (delay, existing) = {
        let state = state.lock().await;
        (state.search_delay, state.existing.clone())
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    let rows: String = existing
        .iter()
        .enumerate()
        .map(|(i, name)| {
            format!(
                r#"<a href="details.php?id={i}" title="{name}">{name}</a>
                   <a href="details.php?id={i}&hit=1">comments</a>"#
            )
        })
        .collect();
    Html(format!("<table>{rows}</table>"))
}

async fn take_upload(
    State(state): State<Shared>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let mut upload = ReceivedUpload::default();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let bytes = field.bytes().await.unwrap_or_default();
                upload.torrent_name = Some(file_name);
                upload.torrent_len = bytes.len();
            }
            None => {
                let text = field.text().await.unwrap_or_default();
                upload.fields.push((name, text));
            }
        }
    }

    let mut state = state.lock().await;
    state.uploads.push(upload);
    if !has_session(&headers) {
        return Html("Not logged in").into_response();
    }
    if state.reject_uploads {
        return Html("<p>Upload failed: torrent already uploaded</p>").into_response();
    }
    Redirect::to(&format!("/details.php?id={REMOTE_ID}&uploaded=1")).into_response()
}

async fn details() -> Html<&'static str> {
    Html("<h1>Details</h1>")
}

async fn fl_download(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Vec<u8> {
    let id = params.get("id").cloned().unwrap_or_default();
    state.lock().await.downloads.push(id);
    b"d8:announce4:site4:infod4:name1:xee".to_vec()
}

async fn hdb_download(
    State(state): State<Shared>,
    UrlPath(file): UrlPath<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Vec<u8> {
    let id = params.get("id").cloned().unwrap_or_default();
    state.lock().await.downloads.push(format!("{file}#{id}"));
    b"d8:announce4:site4:infod4:name1:xee".to_vec()
}

async fn api_test(Json(body): Json<Value>) -> Json<Value> {
    let status = if body["passkey"] == PASSKEY { 0 } else { 5 };
    Json(json!({ "status": status }))
}

async fn api_torrents(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    if let Some(id) = body["id"].as_u64() {
        return Json(json!({
            "status": 0,
            "data": [{ "id": id, "name": "Movie", "filename": "Movie 2020.torrent", "hash": "AB" }]
        }));
    }
    let existing = state.lock().await.existing.clone();
    let data: Vec<Value> = existing
        .iter()
        .enumerate()
        .map(|(i, name)| json!({ "id": i, "name": name, "filename": "x.torrent", "hash": "CD" }))
        .collect();
    Json(json!({ "status": 0, "data": data }))
}
