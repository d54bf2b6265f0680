use anyhow::{Context, Result};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

pub(crate) fn copy_to_stdout(log: &mut impl Read) -> Result<()> {
    let mut stdout = io::stdout().lock();
    forward(log, &mut stdout).context("Failed to stream log to stdout")
}

/// Resolves `program` the way a shell would: as given if it contains a path
/// separator, otherwise through `PATH`.
pub(crate) fn find_program(program: &str) -> Option<PathBuf> {
    if program.is_empty() {
        return None;
    }
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|p| is_executable(p))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

pub(crate) fn pipe_to_viewer(log: &mut impl Read, program: &Path) -> Result<()> {
    let program_name = program.display();
    let mut child = Command::new(program)
        .stdin(Stdio::piped())
        .spawn()
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => anyhow::anyhow!("{program_name} is not installed"),
            _ => anyhow::Error::new(e).context(format!("Failed to start {program_name}")),
        })?;

    let streamed = match child.stdin.take() {
        Some(mut stdin) => forward(log, &mut stdin),
        None => Ok(()),
    };

    // stdin is closed by now, so the viewer sees EOF and can be waited on
    let status = child
        .wait()
        .with_context(|| format!("Failed to wait for {program_name}"))?;
    streamed.with_context(|| format!("Failed to stream log to {program_name}"))?;

    if !status.success() {
        anyhow::bail!("{program_name} exited with {status}");
    }
    Ok(())
}

/// Copies until the log ends. A reader that goes away early is not an error.
fn forward(log: &mut impl Read, out: &mut impl Write) -> io::Result<()> {
    match io::copy(log, out).and_then(|_| out.flush()) {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            tracing::debug!("output closed before the log ended");
            Ok(())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_forward_copies_everything() {
        let mut out = vec![];
        forward(&mut &b"line 1\nline 2\n"[..], &mut out).unwrap();
        assert_eq!(out, b"line 1\nline 2\n");
    }

    #[test]
    fn test_forward_tolerates_broken_pipe() {
        assert!(forward(&mut &b"abc"[..], &mut ClosedPipe).is_ok());
    }

    #[test]
    fn test_missing_viewer() {
        let err = pipe_to_viewer(&mut &b"abc"[..], Path::new("jwatch-no-such-viewer")).unwrap_err();
        assert_eq!(err.to_string(), "jwatch-no-such-viewer is not installed");
    }

    #[test]
    fn test_find_program_misses() {
        assert!(find_program("").is_none());
        assert!(find_program("jwatch-no-such-viewer").is_none());
        assert!(find_program("/nonexistent/dir/lnav").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_find_program_on_path_and_by_path() {
        let cat = find_program("cat").unwrap();
        assert!(cat.is_absolute());
        assert!(cat.ends_with("cat"));
        assert_eq!(find_program(cat.to_str().unwrap()), Some(cat.clone()));
    }

    #[cfg(unix)]
    #[test]
    fn test_find_program_skips_non_executables() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("viewer");
        std::fs::write(&script, "#!/bin/sh\n").unwrap();
        assert!(find_program(script.to_str().unwrap()).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_viewer_receives_log() {
        pipe_to_viewer(&mut &b"abc"[..], Path::new("cat")).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_viewer_failure_is_reported() {
        let err = pipe_to_viewer(&mut &b""[..], Path::new("false")).unwrap_err();
        assert!(err.to_string().starts_with("false exited with"));
    }
}
