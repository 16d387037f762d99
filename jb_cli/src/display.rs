//! Display utilities for download progress bars.

use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use jb_io::{DownloadProgress, ProgressCallback};

/// Progress styles used while staging remote libraries.
pub struct ProgressStyles {
    pub download: ProgressStyle,
    pub spinner: ProgressStyle,
    pub done: ProgressStyle,
}

impl Default for ProgressStyles {
    fn default() -> Self {
        Self {
            download: ProgressStyle::default_bar()
                .template(
                    "    {prefix:<24} {bar:25.cyan/dim} {bytes:>10}/{total_bytes:<10} {eta:>6}",
                )
                .unwrap()
                .progress_chars("━━╸"),
            spinner: ProgressStyle::default_spinner()
                .template("    {prefix:<24} {spinner:.cyan} {msg}")
                .unwrap()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
            done: ProgressStyle::default_spinner()
                .template("    {prefix:<24} {msg}")
                .unwrap(),
        }
    }
}

/// Create a progress callback that renders one bar per library download.
pub fn create_download_callback(
    multi: MultiProgress,
    styles: ProgressStyles,
) -> (ProgressCallback, Arc<Mutex<HashMap<String, ProgressBar>>>) {
    let bars: Arc<Mutex<HashMap<String, ProgressBar>>> = Arc::new(Mutex::new(HashMap::new()));

    let bars_clone = bars.clone();
    let download_style = styles.download;
    let spinner_style = styles.spinner;
    let done_style = styles.done;

    let callback: ProgressCallback = Arc::new(move |event| {
        let mut bars = bars_clone.lock().unwrap();
        match event {
            DownloadProgress::Started { name, total_bytes } => {
                let pb = if let Some(total) = total_bytes {
                    let pb = multi.add(ProgressBar::new(total));
                    pb.set_style(download_style.clone());
                    pb
                } else {
                    let pb = multi.add(ProgressBar::new_spinner());
                    pb.set_style(spinner_style.clone());
                    pb.set_message("downloading...");
                    pb.enable_steady_tick(std::time::Duration::from_millis(80));
                    pb
                };
                pb.set_prefix(name.clone());
                bars.insert(name, pb);
            }
            DownloadProgress::Transferred {
                name,
                transferred,
                total_bytes,
            } => {
                if let Some(pb) = bars.get(&name)
                    && total_bytes.is_some()
                {
                    pb.set_position(transferred);
                }
            }
            DownloadProgress::Completed { name, transferred } => {
                if let Some(pb) = bars.get(&name) {
                    if transferred > 0 {
                        pb.set_position(transferred);
                    }
                    pb.set_style(done_style.clone());
                    pb.set_message(format!("{} downloaded", style("✓").green()));
                    pb.finish();
                }
            }
            DownloadProgress::Failed { name, message } => {
                if let Some(pb) = bars.get(&name) {
                    pb.set_style(done_style.clone());
                    pb.set_message(format!("{} {}", style("✗").red(), message));
                    pb.finish();
                }
            }
        }
    });

    (callback, bars)
}

/// Finish any bar still spinning (a failed session that never reported).
pub fn finish_download_bars(bars: &Arc<Mutex<HashMap<String, ProgressBar>>>) {
    let bars = bars.lock().unwrap();
    for pb in bars.values() {
        if !pb.is_finished() {
            pb.finish();
        }
    }
}
