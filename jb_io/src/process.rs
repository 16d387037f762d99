use std::path::Path;
use std::process::Stdio;

use tokio::io::{self, AsyncWriteExt};
use tokio::process::Command;

use jb_core::Error;

/// Launch `argv` with `work_dir` as its working directory, creating the
/// directory tree first if absent. All three stdio channels are piped and
/// forwarded live by one task per stream; the call returns only after the
/// child has exited and its stdout/stderr are fully drained.
///
/// A non-zero exit status is logged and returned, never treated as an error
/// here; the caller decides its significance.
pub async fn run(argv: &[String], work_dir: &Path) -> Result<i32, Error> {
    let Some((program, args)) = argv.split_first() else {
        return Err(Error::Launch {
            program: String::new(),
            message: "empty command".to_string(),
        });
    };

    std::fs::create_dir_all(work_dir).map_err(|e| Error::Launch {
        program: program.clone(),
        message: format!(
            "could not create working directory '{}': {}",
            work_dir.display(),
            e
        ),
    })?;

    let mut child = Command::new(program)
        .args(args)
        .current_dir(work_dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::Launch {
            program: program.clone(),
            message: e.to_string(),
        })?;

    // One forwarding task per stream, bounded by the child's lifetime.
    let stdin_task = child.stdin.take().map(|mut sink| {
        tokio::spawn(async move {
            let mut source = io::stdin();
            let _ = io::copy(&mut source, &mut sink).await;
        })
    });
    let stdout_task = child.stdout.take().map(|mut stream| {
        tokio::spawn(async move {
            let mut sink = io::stdout();
            let _ = io::copy(&mut stream, &mut sink).await;
            let _ = sink.flush().await;
        })
    });
    let stderr_task = child.stderr.take().map(|mut stream| {
        tokio::spawn(async move {
            let mut sink = io::stderr();
            let _ = io::copy(&mut stream, &mut sink).await;
            let _ = sink.flush().await;
        })
    });

    let status = child.wait().await.map_err(|e| Error::Launch {
        program: program.clone(),
        message: format!("wait failed: {}", e),
    })?;

    if let Some(task) = stdout_task {
        let _ = task.await;
    }
    if let Some(task) = stderr_task {
        let _ = task.await;
    }
    // Our stdin may never reach EOF; the child is gone, so stop feeding it.
    if let Some(task) = stdin_task {
        task.abort();
    }

    let code = status.code().unwrap_or(-1);
    if code != 0 {
        eprintln!("    Warning: '{}' exited with status {}", program, code);
    }
    Ok(code)
}
