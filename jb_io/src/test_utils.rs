//! Shared fixtures for exercising builds against a throwaway project tree
//! and a local mock HTTP server. Enable with the `test-utils` feature.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use jb_core::BuildConfig;

pub struct TestContext {
    tmp: TempDir,
    pub server: MockServer,
}

impl TestContext {
    pub async fn new() -> Self {
        let tmp = TempDir::new().expect("create tempdir");
        let server = MockServer::start().await;
        let ctx = Self { tmp, server };
        fs::create_dir_all(ctx.work_dir().join("src/java")).expect("create source tree");
        fs::create_dir_all(ctx.lib_dir()).expect("create lib dir");
        ctx
    }

    /// Root of the throwaway project.
    pub fn work_dir(&self) -> PathBuf {
        self.tmp.path().join("project")
    }

    /// Stand-in for `<home>/.sessx/lib`.
    pub fn lib_dir(&self) -> PathBuf {
        self.tmp.path().join("home/.sessx/lib")
    }

    /// Default configuration rooted in the throwaway project.
    pub fn config(&self) -> BuildConfig {
        let work = self.work_dir();
        BuildConfig::new(
            work.join("build/build.jar"),
            work.join("manifest"),
            work.clone(),
            work.join("build"),
            work.join("src/java"),
            vec![],
            vec![],
            vec![],
        )
    }

    pub fn write_source(&self, relative: &str, body: &str) {
        let path = self.work_dir().join("src/java").join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create source subdir");
        }
        fs::write(path, body).expect("write source file");
    }

    /// Serve `body` at `/libs/<name>` on the mock server.
    pub async fn mount_library(&self, name: &str, body: &[u8]) {
        Mock::given(method("GET"))
            .and(path(format!("/libs/{name}")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
            .mount(&self.server)
            .await;
    }

    pub fn library_url(&self, name: &str) -> String {
        format!("{}/libs/{name}", self.server.uri())
    }

    /// Write an executable shell script standing in for an external tool.
    #[cfg(unix)]
    pub fn stub_tool(&self, name: &str, script: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let dir = self.tmp.path().join("bin");
        fs::create_dir_all(&dir).expect("create stub bin dir");
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{script}\n")).expect("write stub tool");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod stub tool");
        path.to_string_lossy().into_owned()
    }

    pub fn path(&self) -> &Path {
        self.tmp.path()
    }
}
