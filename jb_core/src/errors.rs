use std::fmt;
use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    Launch {
        program: String,
        message: String,
    },
    CompileFailed {
        code: i32,
    },
    PackageFailed {
        code: i32,
    },
    AlreadyExists {
        path: PathBuf,
    },
    AlreadyDownloaded {
        name: String,
    },
    DownloadFailed {
        url: String,
        message: String,
    },
    InvalidUrl {
        url: String,
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Launch { program, message } => {
                write!(f, "failed to launch '{}': {}", program, message)?;
                write!(
                    f,
                    "\n  hint: make sure '{}' is installed and on your PATH",
                    program
                )
            }
            Error::CompileFailed { code } => {
                write!(f, "compiler exited with status {}", code)
            }
            Error::PackageFailed { code } => {
                write!(f, "packager exited with status {}", code)
            }
            Error::AlreadyExists { path } => {
                write!(
                    f,
                    "file '{}' already exists\n  hint: delete it to download a fresh copy",
                    path.to_string_lossy()
                )
            }
            Error::AlreadyDownloaded { name } => {
                write!(f, "file '{}' has already been downloaded", name)
            }
            Error::DownloadFailed { url, message } => {
                write!(
                    f,
                    "download of '{}' failed: {}\n  hint: check your internet connection and try again",
                    url, message
                )
            }
            Error::InvalidUrl { url, message } => {
                write!(f, "invalid URL '{}': {}", url, message)
            }
        }
    }
}

impl std::error::Error for Error {}
