//! Output routing based on where the caller was loaded from.
//!
//! A caller at a remote location previews its output on stdout. A caller at a
//! local `file:` location materializes a sibling file next to itself and
//! prints only that file's path.

use std::io::Write;
use std::path::{Path, PathBuf};

use autocat_shared::{CatError, Result, SourceResolver};
use tracing::{info, instrument};
use url::Url;

use crate::concat::{Cat, emit};

/// Where routed output ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    /// The text itself was written to the output stream.
    Stdout,
    /// The text was written to this file; only its path went to the stream.
    File(PathBuf),
}

/// Route `text` according to `caller`.
///
/// Non-`file:` callers get `text` written to `out`. For `file:` callers,
/// `path_fn` maps the caller's own path to the output path, `text` is written
/// there, and the path plus a newline goes to `out`.
///
/// Uses blocking I/O for both the file and `out`.
#[instrument(skip_all, fields(caller = %caller, bytes = text.len()))]
pub fn route<F>(text: &str, caller: &Url, path_fn: F, out: &mut impl Write) -> Result<Routed>
where
    F: FnOnce(&Path) -> PathBuf,
{
    if caller.scheme() != "file" {
        emit(out, text.as_bytes())?;
        info!("routed output to stdout");
        return Ok(Routed::Stdout);
    }

    let module = caller
        .to_file_path()
        .map_err(|()| CatError::validation(format!("not a local file URL: {caller}")))?;
    let target = path_fn(&module);
    if target == module {
        return Err(CatError::validation(format!(
            "output path for {} would overwrite the caller itself",
            module.display()
        )));
    }

    std::fs::write(&target, text).map_err(|e| CatError::io(&target, e))?;
    emit(out, format!("{}\n", target.display()).as_bytes())?;
    info!(path = %target.display(), "materialized output");
    Ok(Routed::File(target))
}

/// Concatenate `cat` and route the result according to `caller`.
pub async fn write_auto_compile_output<F>(
    cat: &Cat,
    caller: &Url,
    path_fn: F,
    out: &mut impl Write,
) -> Result<Routed>
where
    F: FnOnce(&Path) -> PathBuf,
{
    let text = cat.concat().await?;
    route(&text, caller, path_fn, out)
}

/// A `path_fn` that swaps a trailing `from` for `to`.
///
/// Paths without the suffix are returned unchanged, which [`route`] rejects.
pub fn replace_suffix(from: &str, to: &str) -> impl Fn(&Path) -> PathBuf {
    let (from, to) = (from.to_string(), to.to_string());
    move |path: &Path| {
        let raw = path.to_string_lossy();
        match raw.strip_suffix(from.as_str()) {
            Some(stem) if !from.is_empty() => PathBuf::from(format!("{stem}{to}")),
            _ => path.to_path_buf(),
        }
    }
}

/// Parse a caller location given as a URL or a (possibly relative) path.
pub fn parse_location(input: &str, resolver: &SourceResolver) -> Result<Url> {
    if let Ok(url) = Url::parse(input) {
        if url.scheme().len() > 1 {
            return Ok(url);
        }
    }
    let path = resolver.absolutize(Path::new(input));
    Url::from_file_path(&path).map_err(|()| {
        CatError::validation(format!("cannot express {} as a file URL", path.display()))
    })
}
