use std::sync::Arc;

/// Events emitted by a download session and its background reporter.
#[derive(Clone, Debug)]
pub enum DownloadProgress {
    Started {
        name: String,
        total_bytes: Option<u64>,
    },
    /// Emitted roughly once per second while the transfer is in flight.
    Transferred {
        name: String,
        transferred: u64,
        total_bytes: Option<u64>,
    },
    Completed {
        name: String,
        transferred: u64,
    },
    Failed {
        name: String,
        message: String,
    },
}

pub type ProgressCallback = Arc<dyn Fn(DownloadProgress) + Send + Sync>;

/// Render a progress event as a `transferred/total (percent%)` log line.
/// Used when no callback is installed; degrades to bytes-so-far when the
/// server did not announce a total.
pub fn log_line(event: &DownloadProgress) -> Option<String> {
    match event {
        DownloadProgress::Transferred {
            name,
            transferred,
            total_bytes: Some(total),
        } if *total > 0 => Some(format!(
            "    {}: {}/{} ({}%)",
            name,
            transferred,
            total,
            transferred * 100 / total
        )),
        DownloadProgress::Transferred {
            name, transferred, ..
        } => Some(format!("    {}: {} bytes", name, transferred)),
        DownloadProgress::Completed { name, transferred } => {
            Some(format!("    {}: downloaded ({} bytes)", name, transferred))
        }
        _ => None,
    }
}
