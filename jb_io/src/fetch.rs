use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use jb_core::{Error, UserAgent};

use crate::progress::{DownloadProgress, ProgressCallback, log_line};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const READ_TIMEOUT: Duration = Duration::from_secs(10);
const REPORT_INTERVAL: Duration = Duration::from_secs(1);
/// Destination writes are capped at this size so the transferred counter
/// advances at a steady granularity.
const WRITE_CHUNK: usize = 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchState {
    Ready,
    Downloading,
    Finished,
    Failed,
}

/// One download session: resolves a URL to a destination file, streams the
/// response body to disk, and runs a background progress reporter.
///
/// A session never overwrites an existing destination file, and
/// [`Fetcher::download`] is callable exactly once.
pub struct Fetcher {
    url: reqwest::Url,
    file_name: String,
    dest_path: PathBuf,
    out: Option<File>,
    client: Option<reqwest::Client>,
    state: FetchState,
    transferred: Arc<AtomicU64>,
    total: Option<u64>,
    content_type: Option<String>,
    progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("url", &self.url)
            .field("file_name", &self.file_name)
            .field("dest_path", &self.dest_path)
            .field("state", &self.state)
            .field("transferred", &self.transferred)
            .field("total", &self.total)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

impl Fetcher {
    /// Validate the URL, refuse an existing destination, create parent
    /// directories, and open the destination for writing. No network I/O
    /// happens here.
    pub async fn new(url: &str, dest_dir: &Path) -> Result<Self, Error> {
        let parsed = reqwest::Url::parse(url).map_err(|e| Error::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let file_name = parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| Error::InvalidUrl {
                url: url.to_string(),
                message: "URL path has no file name".to_string(),
            })?
            .to_string();

        let dest_path = dest_dir.join(&file_name);
        if dest_path.exists() {
            return Err(Error::AlreadyExists { path: dest_path });
        }

        let fail = |message: String| Error::DownloadFailed {
            url: url.to_string(),
            message,
        };

        ensure_parent_dirs(&dest_path).map_err(|e| fail(e.to_string()))?;
        let out = File::create(&dest_path).await.map_err(|e| fail(e.to_string()))?;

        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .user_agent(user_agent().to_string())
            .build()
            .map_err(|e| fail(e.to_string()))?;

        Ok(Self {
            url: parsed,
            file_name,
            dest_path,
            out: Some(out),
            client: Some(client),
            state: FetchState::Ready,
            transferred: Arc::new(AtomicU64::new(0)),
            total: None,
            content_type: None,
            progress: None,
        })
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn dest_path(&self) -> &Path {
        &self.dest_path
    }

    pub fn state(&self) -> FetchState {
        self.state
    }

    pub fn transferred(&self) -> u64 {
        self.transferred.load(Ordering::Relaxed)
    }

    /// Content-Length announced by the server, if any.
    pub fn total_bytes(&self) -> Option<u64> {
        self.total
    }

    /// Sniffed (preferred) or server-declared content type.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Perform the transfer. Callable exactly once; later calls fail with
    /// [`Error::AlreadyDownloaded`]. On any mid-transfer failure the session
    /// moves to `Failed`, the destination handle is closed, and the partial
    /// file is left on disk.
    pub async fn download(&mut self) -> Result<PathBuf, Error> {
        // Taking the handles doubles as the once-only guard: a finished or
        // failed session has neither a connection nor an open file.
        let (client, mut out) = match (self.state, self.client.take(), self.out.take()) {
            (FetchState::Ready, Some(client), Some(out)) => (client, out),
            _ => {
                return Err(Error::AlreadyDownloaded {
                    name: self.file_name.clone(),
                });
            }
        };
        self.state = FetchState::Downloading;

        let result = self.transfer(client, &mut out).await;

        if let Err(e) = out.flush().await {
            eprintln!(
                "    Warning: failed to flush '{}': {}",
                self.dest_path.display(),
                e
            );
        }
        drop(out);

        match result {
            Ok(()) => {
                self.state = FetchState::Finished;
                Ok(self.dest_path.clone())
            }
            Err(e) => {
                self.state = FetchState::Failed;
                Err(e)
            }
        }
    }

    async fn transfer(&mut self, client: reqwest::Client, out: &mut File) -> Result<(), Error> {
        let fail = |message: String| Error::DownloadFailed {
            url: self.url.to_string(),
            message,
        };

        let response = client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| self.failed(fail(e.to_string())))?;

        if !response.status().is_success() {
            return Err(self.failed(fail(format!("HTTP {}", response.status()))));
        }

        self.total = response.content_length();
        let header_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        self.emit(DownloadProgress::Started {
            name: self.file_name.clone(),
            total_bytes: self.total,
        });

        let done = Arc::new(AtomicBool::new(false));
        let reporter = tokio::spawn(report_loop(
            self.file_name.clone(),
            Arc::clone(&self.transferred),
            self.total,
            Arc::clone(&done),
            self.progress.clone(),
        ));

        let mut stream = response.bytes_stream();
        let mut sniffed = false;
        let mut result = Ok(());

        while let Some(next) = stream.next().await {
            let chunk = match next {
                Ok(chunk) => chunk,
                Err(e) => {
                    result = Err(fail(e.to_string()));
                    break;
                }
            };
            if !sniffed && !chunk.is_empty() {
                self.content_type = sniff_content_type(&chunk)
                    .map(str::to_string)
                    .or_else(|| header_type.clone());
                sniffed = true;
            }
            for piece in chunk.chunks(WRITE_CHUNK) {
                if let Err(e) = out.write_all(piece).await {
                    result = Err(fail(e.to_string()));
                    break;
                }
                self.transferred.fetch_add(piece.len() as u64, Ordering::Relaxed);
            }
            if result.is_err() {
                break;
            }
        }
        if !sniffed {
            self.content_type = header_type;
        }

        // The reporter is joined before the session settles.
        done.store(true, Ordering::Relaxed);
        let _ = reporter.await;

        match result {
            Ok(()) => {
                let event = DownloadProgress::Completed {
                    name: self.file_name.clone(),
                    transferred: self.transferred(),
                };
                match &self.progress {
                    Some(callback) => callback(event),
                    None => {
                        if let Some(line) = log_line(&event) {
                            println!("{}", line);
                        }
                    }
                }
                Ok(())
            }
            Err(e) => Err(self.failed(e)),
        }
    }

    fn failed(&self, error: Error) -> Error {
        self.emit(DownloadProgress::Failed {
            name: self.file_name.clone(),
            message: error.to_string(),
        });
        error
    }

    fn emit(&self, event: DownloadProgress) {
        if let Some(callback) = &self.progress {
            callback(event);
        }
    }
}

/// Once-per-second reporter. Reads the transferred counter without locking;
/// a stale read only delays one progress line.
async fn report_loop(
    name: String,
    transferred: Arc<AtomicU64>,
    total: Option<u64>,
    done: Arc<AtomicBool>,
    progress: Option<ProgressCallback>,
) {
    let mut interval = tokio::time::interval(REPORT_INTERVAL);
    // The first tick of a tokio interval completes immediately.
    interval.tick().await;
    loop {
        interval.tick().await;
        if done.load(Ordering::Relaxed) {
            break;
        }
        let so_far = transferred.load(Ordering::Relaxed);
        if let Some(total) = total
            && so_far >= total
        {
            break;
        }
        let event = DownloadProgress::Transferred {
            name: name.clone(),
            transferred: so_far,
            total_bytes: total,
        };
        match &progress {
            Some(callback) => callback(event),
            None => {
                if let Some(line) = log_line(&event) {
                    println!("{}", line);
                }
            }
        }
    }
}

/// Classify a body by its leading bytes, preferring the stream over the
/// server-declared header.
fn sniff_content_type(head: &[u8]) -> Option<&'static str> {
    match head {
        [0x50, 0x4b, ..] => Some("application/zip"),
        [0x1f, 0x8b, ..] => Some("application/gzip"),
        [0xfd, b'7', b'z', b'X', b'Z', 0x00, ..] => Some("application/x-xz"),
        [b'%', b'P', b'D', b'F', ..] => Some("application/pdf"),
        _ => None,
    }
}

/// Create missing ancestors of `path` one directory at a time so each newly
/// created dot-directory can pick up the hidden attribute on Windows.
fn ensure_parent_dirs(path: &Path) -> std::io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };

    let mut missing = Vec::new();
    let mut current = parent;
    while !current.exists() {
        missing.push(current.to_path_buf());
        match current.parent() {
            Some(next) => current = next,
            None => break,
        }
    }

    for dir in missing.iter().rev() {
        std::fs::create_dir(dir)?;
        hide_if_dot_dir(dir);
    }
    Ok(())
}

/// Unix-style hidden names need the attribute set explicitly on Windows.
#[cfg(windows)]
fn hide_if_dot_dir(dir: &Path) {
    let is_dot = dir
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false);
    if is_dot {
        let _ = std::process::Command::new("attrib")
            .arg("+H")
            .arg(dir)
            .status();
    }
}

#[cfg(not(windows))]
fn hide_if_dot_dir(_dir: &Path) {}

fn user_agent() -> UserAgent {
    UserAgent::new(
        "jbuild",
        env!("CARGO_PKG_VERSION"),
        &sysinfo::System::name().unwrap_or_else(|| std::env::consts::OS.to_string()),
        &sysinfo::System::os_version().unwrap_or_else(|| "unknown".to_string()),
        std::env::consts::ARCH,
        "rust",
        option_env!("CARGO_PKG_RUST_VERSION").unwrap_or("unknown"),
    )
}

/// Outcome of a batch fetch. One failed or duplicate session never aborts
/// the rest of the batch.
#[derive(Debug, Default)]
pub struct FetchSummary {
    pub fetched: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<String>,
}

/// Fetch every URL into `dest_dir`, independently. Files already present
/// are skipped as benign; other failures are reported and the batch
/// continues.
pub async fn fetch_all(
    urls: &[String],
    dest_dir: &Path,
    progress: Option<ProgressCallback>,
) -> FetchSummary {
    let mut summary = FetchSummary::default();

    for url in urls {
        let fetcher = match Fetcher::new(url, dest_dir).await {
            Ok(fetcher) => fetcher,
            Err(Error::AlreadyExists { path }) => {
                summary.skipped.push(path);
                continue;
            }
            Err(e) => {
                eprintln!("    Warning: {}", e);
                summary.failed.push(url.clone());
                continue;
            }
        };

        let mut fetcher = match &progress {
            Some(callback) => fetcher.with_progress(Arc::clone(callback)),
            None => fetcher,
        };

        match fetcher.download().await {
            Ok(path) => summary.fetched.push(path),
            Err(e) => {
                eprintln!("    Warning: {}", e);
                summary.failed.push(url.clone());
            }
        }
    }

    summary
}
