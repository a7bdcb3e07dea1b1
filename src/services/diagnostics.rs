//! Diagnostic artifacts: rendered markup saved when a page yields nothing.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

const MAX_NAME_ATTEMPTS: u32 = 100;

/// Writes `debug_{kind}_{timestamp}.html` files. Best-effort: write errors
/// are logged and otherwise ignored.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticSink {
    dir: Option<PathBuf>,
}

impl DiagnosticSink {
    /// Sink writing into `dir`, or a no-op sink for `None`.
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    pub fn disabled() -> Self {
        Self { dir: None }
    }

    pub fn dir(&self) -> Option<&PathBuf> {
        self.dir.as_ref()
    }

    /// Save `html` rendered from `url`. Returns the file written, if any.
    pub async fn persist(&self, kind: &str, url: &str, html: &str) -> Option<PathBuf> {
        let dir = self.dir.as_ref()?;
        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            warn!("Cannot create diagnostics dir {}: {}", dir.display(), e);
            return None;
        }

        let timestamp = Utc::now().format("%Y%m%d_%H%M%S_%3f").to_string();
        let contents = format!("<!-- {} -->\n{}", url.replace("--", "%2D%2D"), html);

        // Same-millisecond saves get a numeric suffix instead of overwriting.
        for n in 0..MAX_NAME_ATTEMPTS {
            let name = match n {
                0 => format!("debug_{}_{}.html", kind, timestamp),
                n => format!("debug_{}_{}_{}.html", kind, timestamp, n),
            };
            let path = dir.join(name);
            match write_new(&path, contents.as_bytes()).await {
                Ok(()) => {
                    info!("Saved page source to {}", path.display());
                    return Some(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    warn!("Failed to save page source to {}: {}", path.display(), e);
                    return None;
                }
            }
        }
        warn!("No free diagnostics file name for {} at {}", kind, timestamp);
        None
    }
}

async fn write_new(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(contents).await?;
    file.flush().await
}
