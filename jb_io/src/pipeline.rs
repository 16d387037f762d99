use std::path::{Path, PathBuf};
use std::time::Instant;

use jb_core::{BuildConfig, Classpath, Error};

use crate::paths::{collect_library_path, collect_sources};
use crate::process;

const DEFAULT_COMPILER: &str = "javac";
const DEFAULT_PACKAGER: &str = "jar";

/// Sequential compile -> copy-resources -> package pipeline. Components run
/// strictly one after another; remote libraries must already be staged in
/// the global library directory before [`BuildPipeline::run`] scans it.
pub struct BuildPipeline {
    config: BuildConfig,
    global_lib_dir: PathBuf,
    compiler: String,
    packager: String,
}

impl BuildPipeline {
    pub fn new(config: BuildConfig, global_lib_dir: PathBuf) -> Self {
        Self {
            config,
            global_lib_dir,
            compiler: DEFAULT_COMPILER.to_string(),
            packager: DEFAULT_PACKAGER.to_string(),
        }
    }

    /// Override the compiler executable (tests use a stub).
    pub fn with_compiler(mut self, compiler: &str) -> Self {
        self.compiler = compiler.to_string();
        self
    }

    /// Override the packager executable (tests use a stub).
    pub fn with_packager(mut self, packager: &str) -> Self {
        self.packager = packager.to_string();
        self
    }

    pub async fn run(&self) -> Result<(), Error> {
        let started = Instant::now();

        let compile_code = self.compile().await?;
        if compile_code != 0 {
            print_rule();
            println!("Failed! ({}ms)", started.elapsed().as_millis());
            return Err(Error::CompileFailed { code: compile_code });
        }

        self.copy_into_build(&self.config.resources);
        self.copy_into_build(&self.config.extra_files);

        let package_code = self.package().await?;
        print_rule();
        if package_code != 0 {
            println!("Failed! ({}ms)", started.elapsed().as_millis());
            return Err(Error::PackageFailed { code: package_code });
        }

        println!("Done! ({}ms)", started.elapsed().as_millis());
        Ok(())
    }

    async fn compile(&self) -> Result<i32, Error> {
        let sources = collect_sources(&self.config.source_root);
        let classpath = collect_library_path(
            &self.config.work_dir,
            &self.config.source_root,
            &self.config.build_dir,
            &self.global_lib_dir,
        );
        let argv = self.compiler_argv(&sources, &classpath);

        print_rule();
        println!(
            "==> {} ({} source files, {} classpath entries)",
            self.compiler,
            sources.len(),
            classpath.len()
        );
        print_rule();

        process::run(&argv, &self.config.work_dir).await
    }

    /// Fixed diagnostic flags + encoding + output directory + source root,
    /// then the discovered sources, then the classpath.
    fn compiler_argv(&self, sources: &[PathBuf], classpath: &Classpath) -> Vec<String> {
        let mut argv = vec![
            self.compiler.clone(),
            "-encoding".to_string(),
            "UTF-8".to_string(),
            "-Xlint:deprecation".to_string(),
            "-XDignore.symbol.file".to_string(),
            "-Xdiags:verbose".to_string(),
            "-d".to_string(),
            self.config.build_dir.to_string_lossy().into_owned(),
            "-sourcepath".to_string(),
            self.config.source_root.to_string_lossy().into_owned(),
        ];
        argv.extend(sources.iter().map(|p| p.to_string_lossy().into_owned()));
        argv.push("-cp".to_string());
        argv.push(classpath.join());
        argv
    }

    /// Copy each configured file into the build directory by file name.
    /// Name collisions resolve last-writer-wins; unreadable entries (for
    /// example a configured resource directory that does not exist) are
    /// logged and skipped.
    fn copy_into_build(&self, files: &[PathBuf]) {
        if files.is_empty() {
            return;
        }
        if let Err(e) = std::fs::create_dir_all(&self.config.build_dir) {
            eprintln!(
                "    Warning: could not create '{}': {}",
                self.config.build_dir.display(),
                e
            );
            return;
        }

        for file in files {
            let Some(name) = file.file_name() else {
                continue;
            };
            if let Err(e) = std::fs::copy(file, self.config.build_dir.join(name)) {
                eprintln!("    Warning: failed to copy '{}': {}", file.display(), e);
            }
        }
    }

    async fn package(&self) -> Result<i32, Error> {
        // A stale archive from an earlier run would otherwise be updated in
        // place by the packager.
        let _ = std::fs::remove_file(&self.config.jar_path);

        let jar = self.config.jar_path.to_string_lossy().into_owned();
        let build = self.config.build_dir.to_string_lossy().into_owned();

        let argv: Vec<String> = if self.config.manifest_path.is_file() {
            vec![
                self.packager.clone(),
                "-cvfm".to_string(),
                jar.clone(),
                self.config.manifest_path.to_string_lossy().into_owned(),
                "-C".to_string(),
                build,
                ".".to_string(),
            ]
        } else {
            vec![
                self.packager.clone(),
                "-cvf".to_string(),
                jar.clone(),
                "-C".to_string(),
                build,
                ".".to_string(),
            ]
        };

        print_rule();
        println!("==> {} {}", self.packager, jar);
        print_rule();

        process::run(&argv, &self.config.work_dir).await
    }
}

/// Remove a file or directory tree. Uses an explicit worklist so the stack
/// depth stays bounded on arbitrarily deep trees. A missing path is a no-op.
pub fn clean(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        return Ok(());
    }
    if !path.is_dir() {
        return std::fs::remove_file(path);
    }

    let mut pending = vec![path.to_path_buf()];
    // Discovery order is parent-before-child, so reversed removal is safe.
    let mut discovered = Vec::new();

    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                pending.push(entry.path());
            } else {
                std::fs::remove_file(entry.path())?;
            }
        }
        discovered.push(dir);
    }

    for dir in discovered.iter().rev() {
        std::fs::remove_dir(dir)?;
    }
    Ok(())
}

fn print_rule() {
    println!("{}", "=".repeat(48));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_in(work: &Path) -> BuildConfig {
        BuildConfig::new(
            work.join("build/build.jar"),
            work.join("manifest"),
            work.to_path_buf(),
            work.join("build"),
            work.join("src/java"),
            vec![],
            vec![],
            vec![],
        )
    }

    #[cfg(unix)]
    fn stub_tool(dir: &Path, name: &str, script: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn compiler_argv_has_flags_sources_then_classpath() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(tmp.path());
        let pipeline = BuildPipeline::new(config, tmp.path().join("home/.sessx/lib"));

        let sources = vec![PathBuf::from("/abs/Main.java")];
        let mut classpath = Classpath::new();
        classpath.push(tmp.path().to_path_buf());

        let argv = pipeline.compiler_argv(&sources, &classpath);

        assert_eq!(argv[0], "javac");
        assert!(argv.contains(&"-encoding".to_string()));
        assert!(argv.contains(&"UTF-8".to_string()));
        assert!(argv.contains(&"-Xlint:deprecation".to_string()));
        assert!(argv.contains(&"/abs/Main.java".to_string()));

        // The classpath is the very last argument, preceded by -cp.
        assert_eq!(argv[argv.len() - 2], "-cp");
        assert_eq!(argv[argv.len() - 1], classpath.join());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_compile_packages_the_archive() {
        let tmp = TempDir::new().unwrap();
        let work = tmp.path().join("project");
        fs::create_dir_all(work.join("src/java")).unwrap();
        for name in ["A.java", "B.java", "C.java"] {
            fs::write(work.join("src/java").join(name), "class X {}").unwrap();
        }

        let compiler = stub_tool(tmp.path(), "javac-ok", "exit 0");
        let packager = stub_tool(
            tmp.path(),
            "jar-stub",
            r#"prev=""
for a in "$@"; do
  case "$prev" in -cvf|-cvfm) : > "$a"; exit 0;; esac
  prev="$a"
done
exit 1"#,
        );

        let config = config_in(&work);
        let jar_path = config.jar_path.clone();
        let pipeline = BuildPipeline::new(config, tmp.path().join("home/.sessx/lib"))
            .with_compiler(&compiler)
            .with_packager(&packager);

        pipeline.run().await.unwrap();
        assert!(jar_path.is_file());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_compile_never_packages() {
        let tmp = TempDir::new().unwrap();
        let work = tmp.path().join("project");
        fs::create_dir_all(work.join("src/java")).unwrap();
        fs::write(work.join("src/java/Broken.java"), "nope").unwrap();

        let marker = tmp.path().join("packager-ran");
        let compiler = stub_tool(tmp.path(), "javac-bad", "exit 1");
        let packager = stub_tool(
            tmp.path(),
            "jar-marker",
            &format!("touch '{}'", marker.display()),
        );

        let pipeline = BuildPipeline::new(config_in(&work), tmp.path().join("home/.sessx/lib"))
            .with_compiler(&compiler)
            .with_packager(&packager);

        let err = pipeline.run().await.unwrap_err();

        assert!(matches!(err, Error::CompileFailed { code: 1 }));
        assert!(!marker.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn resources_are_copied_into_the_build_dir() {
        let tmp = TempDir::new().unwrap();
        let work = tmp.path().join("project");
        fs::create_dir_all(work.join("src/java")).unwrap();
        fs::write(work.join("src/java/A.java"), "class A {}").unwrap();

        let resource = tmp.path().join("logo.png");
        fs::write(&resource, b"\x89PNG").unwrap();

        let compiler = stub_tool(tmp.path(), "javac-ok", "exit 0");
        let packager = stub_tool(tmp.path(), "jar-ok", "exit 0");

        let mut config = config_in(&work);
        config.resources = vec![resource];
        let build_dir = config.build_dir.clone();

        BuildPipeline::new(config, tmp.path().join("home/.sessx/lib"))
            .with_compiler(&compiler)
            .with_packager(&packager)
            .run()
            .await
            .unwrap();

        assert_eq!(fs::read(build_dir.join("logo.png")).unwrap(), b"\x89PNG");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn manifest_is_passed_only_when_present() {
        let tmp = TempDir::new().unwrap();
        let work = tmp.path().join("project");
        fs::create_dir_all(work.join("src/java")).unwrap();
        fs::write(work.join("src/java/A.java"), "class A {}").unwrap();
        fs::write(work.join("manifest"), "Main-Class: A\n").unwrap();

        let flag_log = tmp.path().join("jar-flag");
        let compiler = stub_tool(tmp.path(), "javac-ok", "exit 0");
        let packager = stub_tool(
            tmp.path(),
            "jar-log",
            &format!("echo \"$1\" > '{}'", flag_log.display()),
        );

        BuildPipeline::new(config_in(&work), tmp.path().join("home/.sessx/lib"))
            .with_compiler(&compiler)
            .with_packager(&packager)
            .run()
            .await
            .unwrap();

        assert_eq!(fs::read_to_string(&flag_log).unwrap().trim(), "-cvfm");
    }

    #[test]
    fn clean_removes_a_deep_tree() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("build");
        fs::create_dir_all(root.join("a/b/c")).unwrap();
        fs::write(root.join("top.class"), b"x").unwrap();
        fs::write(root.join("a/b/c/deep.class"), b"y").unwrap();

        clean(&root).unwrap();
        assert!(!root.exists());
    }

    #[test]
    fn clean_of_missing_path_is_a_noop() {
        let tmp = TempDir::new().unwrap();
        clean(&tmp.path().join("never-existed")).unwrap();
    }

    #[test]
    fn clean_removes_a_single_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("stray.jar");
        fs::write(&file, b"PK").unwrap();

        clean(&file).unwrap();
        assert!(!file.exists());
    }
}
