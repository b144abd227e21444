//! Shared test harness for integration tests.
//!
//! [`TestHarness`] owns a temporary pending-media root, an in-memory
//! database, and a full [`AppContext`] built on top of them.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use mediasort::config::Config;
use mediasort::server::{create_router, AppContext};
use mediasort_common::paths::encode_path;
use mediasort_db::pool::init_memory_pool;
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestHarness {
    pub ctx: AppContext,
    /// Canonical pending root inside `_dir`.
    pub root: PathBuf,
    _dir: TempDir,
}

impl TestHarness {
    pub fn new() -> Self {
        let mut config = Config::default();
        // Never pick up a real ffmpeg from PATH in tests.
        config.transcode.ffmpeg_path = Some(PathBuf::from("/nonexistent/ffmpeg"));
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = dir.path().join("pending");
        std::fs::create_dir_all(&root).unwrap();
        let root = std::fs::canonicalize(&root).unwrap();

        let pool = init_memory_pool().expect("failed to create in-memory pool");
        let ctx = AppContext::new(config, root.clone(), pool);

        Self {
            ctx,
            root,
            _dir: dir,
        }
    }

    pub fn router(&self) -> Router {
        create_router(self.ctx.clone(), None)
    }

    /// Write `contents` at `relative` under the pending root.
    pub fn write_file(&self, relative: &str, contents: &[u8]) -> PathBuf {
        let path = self.root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Directory that is a sibling of the pending root, outside it.
    pub fn outside_dir(&self) -> PathBuf {
        let dir = self.root.parent().unwrap().join("outside");
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router().oneshot(request).await.unwrap()
    }

    pub async fn send_json(&self, method: &str, uri: &str, body: serde_json::Value) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }
}

/// Stream URL for an absolute path.
pub fn stream_uri(path: &Path) -> String {
    format!("/api/stream/{}", encode_path(path.to_string_lossy()))
}

pub fn fixture_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
