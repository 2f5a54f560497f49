use crate::constants::{FILTERED_MANIFEST_FILE, URL_LIST_FILE, WORKSPACE_PREFIX};
use crate::errors::AppResult;
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempDir};
use tracing::debug;

/// Per-run scratch directory holding the intermediate artifacts.
///
/// The directory is removed by [`Workspace::release`]. If a workspace is
/// dropped without being released (for example while unwinding) the
/// underlying [`TempDir`] removes it instead, so it never outlives the run.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Creates a uniquely named directory under `root`, or under the system
    /// temp directory when `root` is `None`.
    pub fn acquire(root: Option<&Path>) -> AppResult<Self> {
        let mut builder = Builder::new();
        builder.prefix(WORKSPACE_PREFIX);
        let dir = match root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        debug!(workspace = %dir.path().display(), "Workspace acquired");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Location of the filtered manifest artifact.
    pub fn filtered_manifest_path(&self) -> PathBuf {
        self.dir.path().join(FILTERED_MANIFEST_FILE)
    }

    /// Location of the URL list handed to the downloader.
    pub fn url_list_path(&self) -> PathBuf {
        self.dir.path().join(URL_LIST_FILE)
    }

    /// Removes the directory and everything in it.
    pub fn release(self) -> AppResult<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        debug!(workspace = %path.display(), "Workspace released");
        Ok(())
    }
}
