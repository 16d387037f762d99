//! jbuild CLI - a small build front end for javac and jar.

use clap::Parser;
use console::style;
use indicatif::MultiProgress;
use std::path::PathBuf;

use jb_core::{BuildConfig, Error};
use jb_io::{BuildPipeline, clean, fetch_all};

mod display;

use display::{ProgressStyles, create_download_callback, finish_download_bars};

#[derive(Parser)]
#[command(name = "jb")]
#[command(about = "jbuild - compile, stage libraries, and package Java projects")]
#[command(version)]
struct Cli {
    /// Path of the output archive
    #[arg(long, default_value = "./build/build.jar")]
    jar: PathBuf,

    /// Manifest embedded in the archive (skipped when absent)
    #[arg(long, default_value = "./manifest")]
    manifest: PathBuf,

    /// Working directory for tool invocations (defaults to the current directory)
    #[arg(long)]
    pwd: Option<PathBuf>,

    /// Directory receiving compiled output
    #[arg(long = "build-directory", default_value = "./build")]
    build_directory: PathBuf,

    /// Root of the source tree
    #[arg(long, default_value = "./src/java")]
    sourcepath: PathBuf,

    /// Files copied into the build directory before packaging
    #[arg(long, value_delimiter = ',', default_value = "./src/resources")]
    resources: Vec<PathBuf>,

    /// Library URLs downloaded into the global library directory
    #[arg(long = "remote-lib", value_delimiter = ',')]
    remote_lib: Vec<String>,

    /// Additional files packed into the archive
    #[arg(long = "extra-packin", value_delimiter = ',')]
    extra_packin: Vec<PathBuf>,

    /// Remove the build directory and exit
    #[arg(long)]
    clear: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", style("error:").red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Error> {
    let work_dir = match cli.pwd {
        Some(dir) => dir,
        None => std::env::current_dir().map_err(|e| Error::Launch {
            program: "jb".to_string(),
            message: format!("could not determine the current directory: {}", e),
        })?,
    };

    let config = BuildConfig::new(
        cli.jar,
        cli.manifest,
        work_dir,
        cli.build_directory,
        cli.sourcepath,
        cli.resources,
        cli.remote_lib,
        cli.extra_packin,
    );

    if cli.clear {
        clean(&config.build_dir).map_err(|e| Error::Launch {
            program: "jb".to_string(),
            message: format!(
                "could not remove '{}': {}",
                config.build_dir.display(),
                e
            ),
        })?;
        println!(
            "{} Removed {}",
            style("==>").cyan(),
            config.build_dir.display()
        );
        return Ok(());
    }

    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    let global_lib_dir = config.global_lib_dir(&home);

    if !config.remote_libs.is_empty() {
        println!(
            "{} Staging {} remote libraries...",
            style("==>").cyan(),
            config.remote_libs.len()
        );

        let multi = MultiProgress::new();
        let (callback, bars) = create_download_callback(multi, ProgressStyles::default());
        let summary = fetch_all(&config.remote_libs, &global_lib_dir, Some(callback)).await;
        finish_download_bars(&bars);

        for skipped in &summary.skipped {
            println!(
                "    {} already present, skipping",
                skipped
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| skipped.display().to_string())
            );
        }
        if !summary.failed.is_empty() {
            for url in &summary.failed {
                eprintln!("    Warning: failed to fetch '{}'", url);
            }
        }
    }

    BuildPipeline::new(config, global_lib_dir).run().await
}
