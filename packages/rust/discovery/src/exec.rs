//! Executability checks and generator subprocess execution.

use std::fs::Metadata;
use std::path::Path;
use std::process::Stdio;

use autocat_shared::{CatError, Result};
use tokio::process::Command;
use tracing::{debug, info};

/// Extensions treated as executable where POSIX permission bits don't exist.
#[cfg_attr(unix, allow(dead_code))]
const EXECUTABLE_EXTENSIONS: &[&str] = &["exe", "cmd", "bat", "ps1"];

/// `true` when `path` looks runnable.
///
/// POSIX: any of the owner/group/other execute bits. Elsewhere: the file
/// extension is on [`EXECUTABLE_EXTENSIONS`] (case-insensitive).
#[cfg(unix)]
pub(crate) fn is_executable(_path: &Path, meta: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
pub(crate) fn is_executable(path: &Path, _meta: &Metadata) -> bool {
    has_executable_extension(path)
}

#[cfg_attr(unix, allow(dead_code))]
fn has_executable_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|ext| EXECUTABLE_EXTENSIONS.contains(&ext.as_str()))
}

/// Run `path` with no stdin and return its decoded stdout.
///
/// A non-zero exit fails with the path and trimmed stderr. The child is
/// killed if the returned future is dropped before it completes.
pub(crate) async fn run_capture_stdout(path: &Path) -> Result<String> {
    info!(path = %path.display(), "running generator");

    let output = Command::new(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| CatError::Spawn {
            path: path.to_path_buf(),
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();
        return Err(CatError::Subprocess {
            path: path.to_path_buf(),
            code: output.status.code(),
            stderr,
        });
    }

    debug!(
        path = %path.display(),
        bytes = output.stdout.len(),
        "generator finished"
    );
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_allow_list_is_case_insensitive() {
        assert!(has_executable_extension(Path::new("gen.EXE")));
        assert!(has_executable_extension(Path::new("tools/gen.ps1")));
        assert!(has_executable_extension(Path::new("gen.Cmd")));
        assert!(!has_executable_extension(Path::new("gen.sh")));
        assert!(!has_executable_extension(Path::new("gen")));
    }

    #[cfg(unix)]
    #[test]
    fn execute_bits_decide_on_unix() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gen.sh");
        std::fs::write(&path, "#!/bin/sh\n").unwrap();

        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        assert!(!is_executable(&path, &std::fs::metadata(&path).unwrap()));

        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o654)).unwrap();
        assert!(is_executable(&path, &std::fs::metadata(&path).unwrap()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_stdout_and_reports_failures() {
        use crate::test_support::{SCRIPTS, script};

        let _scripts = SCRIPTS.lock().await;
        let dir = tempfile::tempdir().unwrap();
        let ok = script(
            dir.path(),
            "ok.sh",
            "echo 'select 1;'\necho noise >&2",
            0o755,
        );
        assert_eq!(run_capture_stdout(&ok).await.unwrap(), "select 1;\n");

        let bad = script(dir.path(), "bad.sh", "echo boom >&2\nexit 3", 0o755);
        match run_capture_stdout(&bad).await.unwrap_err() {
            CatError::Subprocess { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
