//! Executable generator discovery.
//!
//! Given a list of [`AutoCompileSpec`]s, finds candidate files, keeps the
//! executable ones, runs each with no stdin, and yields its captured stdout as
//! an [`AutoCompiled`] result. Results come back as a pull-based stream: a
//! candidate is only stat'd and executed when the consumer asks for the next
//! item, so stopping early never runs the remaining generators.

mod candidates;
mod exec;

use std::collections::VecDeque;
use std::path::PathBuf;

use autocat_shared::{AutoCompileSpec, AutoCompiled, CatError, Result, SourceResolver};
use futures::stream::{self, BoxStream, StreamExt};
use tracing::{debug, instrument};

/// Stream of discovery results. Ends after the first error.
pub type AutoCompileStream = BoxStream<'static, Result<AutoCompiled>>;

/// Discover and run generators for `specs`, in spec order and, within a spec,
/// in candidate order (`file` first, then glob matches by pattern).
///
/// Relative file specs, spec `cwd`s, and glob roots resolve through
/// `resolver`; result labels are `<labelPrefix>:<path relative to its cwd>`.
/// Missing, non-regular, and non-executable candidates are skipped. A
/// generator exiting non-zero aborts the stream with
/// [`CatError::Subprocess`](autocat_shared::CatError::Subprocess).
pub fn discover(
    specs: impl IntoIterator<Item = AutoCompileSpec>,
    resolver: SourceResolver,
) -> AutoCompileStream {
    let cursor = Cursor {
        specs: specs.into_iter().collect(),
        pending: VecDeque::new(),
        label_prefix: String::new(),
        resolver,
    };
    stream::try_unfold(cursor, Cursor::advance).boxed()
}

// ---------------------------------------------------------------------------
// Cursor
// ---------------------------------------------------------------------------

/// Position within the discovery run: remaining specs plus the unvisited
/// candidates of the current one.
struct Cursor {
    specs: VecDeque<AutoCompileSpec>,
    pending: VecDeque<PathBuf>,
    label_prefix: String,
    resolver: SourceResolver,
}

impl Cursor {
    async fn advance(mut self) -> Result<Option<(AutoCompiled, Self)>> {
        loop {
            let Some(path) = self.pending.pop_front() else {
                let Some(spec) = self.specs.pop_front() else {
                    return Ok(None);
                };
                self.enter(spec).await?;
                continue;
            };

            if let Some(item) = self.visit(path).await? {
                return Ok(Some((item, self)));
            }
        }
    }

    #[instrument(skip_all, fields(file = ?spec.file, globs = spec.patterns().len()))]
    async fn enter(&mut self, spec: AutoCompileSpec) -> Result<()> {
        self.label_prefix = spec.label_prefix().to_string();

        let resolver = self.resolver.clone();
        let paths = tokio::task::spawn_blocking(move || candidates::expand(&spec, &resolver))
            .await
            .map_err(|e| CatError::io(self.resolver.cwd(), std::io::Error::other(e)))??;
        if paths.is_empty() {
            debug!("spec matched no candidates");
        }
        self.pending = paths.into();
        Ok(())
    }

    async fn visit(&self, path: PathBuf) -> Result<Option<AutoCompiled>> {
        let meta = match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => {
                debug!(path = %path.display(), "not a regular file, skipping");
                return Ok(None);
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "candidate not found, skipping");
                return Ok(None);
            }
        };

        if !exec::is_executable(&path, &meta) {
            debug!(path = %path.display(), "not executable, skipping");
            return Ok(None);
        }

        let text = exec::run_capture_stdout(&path).await?;
        let label = format!("{}:{}", self.label_prefix, self.resolver.label_for(&path));

        Ok(Some(AutoCompiled {
            executable_path: path,
            label,
            text,
        }))
    }
}

#[cfg(all(test, unix))]
pub(crate) mod test_support {
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    /// Held by every test that writes a script and then executes one, so no
    /// other test thread forks while a script file is still open for writing
    /// (which makes exec fail with ETXTBSY).
    pub(crate) static SCRIPTS: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

    pub(crate) fn script(root: &Path, rel: &str, body: &str, mode: u32) -> PathBuf {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .unwrap();
        file.write_all(format!("#!/bin/sh\n{body}\n").as_bytes()).unwrap();
        file.sync_all().unwrap();
        drop(file);
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).unwrap();
        path
    }
}
