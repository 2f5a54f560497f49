//! Common test utilities for integration tests

use async_trait::async_trait;
use dump_fetch::config::ResolvedConfig;
use dump_fetch::downloader::Downloader;
use dump_fetch::errors::{AppError, AppResult};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// A batch submission seen by [`FakeDownloader`].
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct BatchCall {
    pub urls: Vec<String>,
    pub url_list: PathBuf,
    pub dest_dir: PathBuf,
    pub concurrency: usize,
}

/// How the fake behaves when the batch is submitted.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
pub enum BatchBehavior {
    Succeed,
    Fail(i32),
    Hang,
}

/// In-memory downloader that serves a canned manifest and records calls.
pub struct FakeDownloader {
    manifest: Option<String>,
    batch: BatchBehavior,
    pub fetched: Mutex<Vec<String>>,
    pub batches: Mutex<Vec<BatchCall>>,
}

#[allow(dead_code)]
impl FakeDownloader {
    pub fn serving(manifest: &str) -> Self {
        Self {
            manifest: Some(manifest.to_string()),
            batch: BatchBehavior::Succeed,
            fetched: Mutex::new(Vec::new()),
            batches: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_manifest() -> Self {
        Self {
            manifest: None,
            ..Self::serving("")
        }
    }

    pub fn with_batch(mut self, batch: BatchBehavior) -> Self {
        self.batch = batch;
        self
    }

    pub fn fetched_urls(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn batch_calls(&self) -> Vec<BatchCall> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl Downloader for FakeDownloader {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn fetch_file(&self, url: &str, dest_dir: &Path, file_name: &str) -> AppResult<PathBuf> {
        self.fetched.lock().unwrap().push(url.to_string());
        match &self.manifest {
            Some(content) => {
                let path = dest_dir.join(file_name);
                std::fs::write(&path, content)?;
                Ok(path)
            }
            None => Err(AppError::ManifestFetch {
                message: format!("404 for {url}"),
                exit_code: Some(3),
            }),
        }
    }

    async fn fetch_batch(&self, url_list: &Path, dest_dir: &Path, concurrency: usize) -> AppResult<()> {
        let urls = std::fs::read_to_string(url_list)?
            .lines()
            .map(str::to_string)
            .collect();
        self.batches.lock().unwrap().push(BatchCall {
            urls,
            url_list: url_list.to_path_buf(),
            dest_dir: dest_dir.to_path_buf(),
            concurrency,
        });
        match self.batch {
            BatchBehavior::Succeed => Ok(()),
            BatchBehavior::Fail(code) => Err(AppError::Download {
                message: format!("exited with {code}"),
                exit_code: Some(code),
            }),
            BatchBehavior::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }
}

/// Temp directories for output and scratch space plus a config pointing at them.
pub struct TestEnv {
    pub root: TempDir,
    pub config: ResolvedConfig,
}

#[allow(dead_code)]
impl TestEnv {
    pub fn new() -> Self {
        let root = TempDir::new().unwrap();
        let config = ResolvedConfig {
            host: "https://host".to_string(),
            output_base: root.path().join("dumps"),
            scratch_dir: Some(root.path().join("scratch")),
            ..ResolvedConfig::default()
        };
        Self { root, config }
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.root.path().join("scratch")
    }

    /// Number of workspaces still present under the scratch directory.
    pub fn leftover_workspaces(&self) -> usize {
        match std::fs::read_dir(self.scratch_dir()) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }
}

/// Manifest in the layout served by the dump archive (`hash  filename`).
#[allow(dead_code)]
pub const SAMPLE_MANIFEST: &str = "\
0b1c  samplewiki-20200101-pages-meta-history1.xml-p1p1000.bz2
2d3e  samplewiki-20200101-pages-articles.xml.bz2
4f5a  samplewiki-20200101-pages-meta-history2.xml-p1001p2000.bz2
6b7c  samplewiki-20200101-abstract.xml.gz
";
