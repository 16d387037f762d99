pub mod classpath;
pub mod config;
pub mod errors;
pub mod host;

pub use classpath::Classpath;
pub use config::BuildConfig;
pub use errors::Error;
pub use host::UserAgent;
