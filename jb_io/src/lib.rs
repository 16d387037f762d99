pub mod archive;
pub mod fetch;
pub mod paths;
pub mod pipeline;
pub mod process;
pub mod progress;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use archive::is_archive;
pub use fetch::{FetchState, FetchSummary, Fetcher, fetch_all};
pub use paths::{collect_library_path, collect_sources};
pub use pipeline::{BuildPipeline, clean};
pub use progress::{DownloadProgress, ProgressCallback};
