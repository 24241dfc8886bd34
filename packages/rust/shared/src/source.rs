//! Source classification and deterministic labels.
//!
//! Every raw input handed to the concatenator is classified as remote, file, or
//! inline and given a label that depends only on the input and the working
//! directory, so marker lines stay byte-identical across machines.

use std::path::{Component, Path, PathBuf};

use tracing::trace;
use url::Url;

use crate::error::{CatError, Result};
use crate::types::INLINE_LABEL;

// ---------------------------------------------------------------------------
// ResolvedSource
// ---------------------------------------------------------------------------

/// One unit of text to be concatenated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSource {
    /// An `http(s):` document; `label` is the URL path.
    Remote { original: String, label: String },
    /// A local file; `label` is the path relative to the working directory.
    File { original: PathBuf, label: String },
    /// Literal text supplied by the caller.
    Inline { original: String, label: String },
}

impl ResolvedSource {
    /// Inline text with an optional label (empty or missing falls back to `inline`).
    pub fn inline(text: impl Into<String>, label: Option<&str>) -> Self {
        let label = match label {
            Some(l) if !l.is_empty() => l.to_string(),
            _ => INLINE_LABEL.to_string(),
        };
        Self::Inline {
            original: text.into(),
            label,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Remote { label, .. } | Self::File { label, .. } | Self::Inline { label, .. } => {
                label
            }
        }
    }

    /// Short kind name, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Remote { .. } => "remote",
            Self::File { .. } => "file",
            Self::Inline { .. } => "inline",
        }
    }
}

// ---------------------------------------------------------------------------
// SourceResolver
// ---------------------------------------------------------------------------

/// Classifies raw inputs against a working directory and a base location.
///
/// The working directory anchors labels. The base location is what relative
/// inputs are joined onto; it defaults to the working directory but may be any
/// URL (an `https:` base turns relative inputs into remote sources).
#[derive(Debug, Clone)]
pub struct SourceResolver {
    cwd: PathBuf,
    base: Url,
}

impl SourceResolver {
    /// Resolver anchored at an absolute working directory.
    pub fn new(cwd: impl Into<PathBuf>) -> Result<Self> {
        let cwd = cwd.into();
        let base = Url::from_directory_path(&cwd).map_err(|()| {
            CatError::validation(format!(
                "working directory must be absolute: {}",
                cwd.display()
            ))
        })?;
        Ok(Self { cwd, base })
    }

    /// Resolver anchored at the process working directory.
    pub fn from_env() -> Result<Self> {
        let cwd = std::env::current_dir().map_err(|e| CatError::io(".", e))?;
        Self::new(cwd)
    }

    /// Replace the base location relative inputs are resolved against.
    pub fn with_base(mut self, base: Url) -> Self {
        self.base = base;
        self
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Make `path` absolute against the working directory, without `.`/`..`.
    pub fn absolutize(&self, path: &Path) -> PathBuf {
        normalize(&self.cwd.join(path))
    }

    /// Label for a local path, relative to the working directory.
    pub fn label_for(&self, path: &Path) -> String {
        relative_label(path, &self.cwd)
    }

    /// Classify a raw input.
    ///
    /// In order: absolute `http(s):` URL, absolute `file:` URL, absolute
    /// filesystem path, then anything else joined onto the base location.
    pub fn resolve(&self, input: &str) -> Result<ResolvedSource> {
        if let Ok(parsed) = Url::parse(input) {
            match parsed.scheme() {
                "http" | "https" => return Ok(remote(parsed)),
                "file" => return self.file_from_url(&parsed),
                _ => {}
            }
        }

        if Path::new(input).is_absolute() {
            return Ok(self.file(PathBuf::from(input)));
        }

        let joined = self.base.join(input).map_err(|e| {
            CatError::validation(format!("cannot resolve {input:?} against {}: {e}", self.base))
        })?;
        trace!(input, resolved = %joined, "resolved relative source");

        if joined.scheme() == "file" {
            self.file_from_url(&joined)
        } else {
            Ok(remote(joined))
        }
    }

    /// Resolve a discovery file spec to an absolute local path.
    ///
    /// `cwd`, when given, replaces the base location for relative inputs.
    /// Anything that lands on a non-`file:` location is rejected.
    pub fn resolve_file_spec(&self, input: &str, cwd: Option<&Path>) -> Result<PathBuf> {
        let parsed = Url::parse(input).ok();
        if let Some(url) = parsed.as_ref().filter(|u| u.scheme() == "file") {
            return file_path(url);
        }
        if Path::new(input).is_absolute() {
            return Ok(normalize(Path::new(input)));
        }
        if let Some(url) = parsed {
            return Err(CatError::validation(format!("expected local file, got {url}")));
        }
        if let Some(cwd) = cwd {
            return Ok(normalize(&self.absolutize(cwd).join(input)));
        }

        let joined = self.base.join(input).map_err(|e| {
            CatError::validation(format!("cannot resolve {input:?} against {}: {e}", self.base))
        })?;
        if joined.scheme() != "file" {
            return Err(CatError::validation(format!(
                "expected local file, got {joined}"
            )));
        }
        file_path(&joined)
    }

    fn file(&self, path: PathBuf) -> ResolvedSource {
        let path = normalize(&path);
        let label = self.label_for(&path);
        ResolvedSource::File {
            original: path,
            label,
        }
    }

    fn file_from_url(&self, url: &Url) -> Result<ResolvedSource> {
        Ok(self.file(file_path(url)?))
    }
}

fn remote(url: Url) -> ResolvedSource {
    ResolvedSource::Remote {
        label: url.path().to_string(),
        original: url.into(),
    }
}

fn file_path(url: &Url) -> Result<PathBuf> {
    url.to_file_path()
        .map_err(|()| CatError::validation(format!("not a local file URL: {url}")))
}

/// Lexically drop `.` and resolve `..` components. `..` above the root is
/// discarded; leading `..` of a relative path is kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out.iter().collect()
}

/// Path of `path` relative to `cwd`, with `/` separators.
///
/// Paths outside `cwd`, or equal to it, are returned unchanged.
pub fn relative_label(path: &Path, cwd: &Path) -> String {
    match path.strip_prefix(cwd) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        _ => path.to_string_lossy().into_owned(),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn resolver() -> SourceResolver {
        SourceResolver::new("/work/project").unwrap()
    }

    #[test]
    fn absolute_path_under_cwd_is_relative() {
        let src = resolver().resolve("/work/project/sql/core.sql").unwrap();
        assert_eq!(
            src,
            ResolvedSource::File {
                original: "/work/project/sql/core.sql".into(),
                label: "sql/core.sql".into(),
            }
        );
    }

    #[test]
    fn absolute_path_outside_cwd_is_unchanged() {
        let src = resolver().resolve("/elsewhere/core.sql").unwrap();
        assert_eq!(src.label(), "/elsewhere/core.sql");
        assert_eq!(src.kind(), "file");
    }

    #[test]
    fn cwd_itself_falls_back_to_raw_path() {
        let src = resolver().resolve("/work/project").unwrap();
        assert_eq!(src.label(), "/work/project");
    }

    #[test]
    fn file_url_is_file() {
        let src = resolver().resolve("file:///work/project/b.sql").unwrap();
        assert_eq!(
            src,
            ResolvedSource::File {
                original: "/work/project/b.sql".into(),
                label: "b.sql".into(),
            }
        );
    }

    #[test]
    fn http_url_label_drops_query_and_fragment() {
        let src = resolver()
            .resolve("https://example.com/x/y.sql?rev=2#top")
            .unwrap();
        assert_eq!(
            src,
            ResolvedSource::Remote {
                original: "https://example.com/x/y.sql?rev=2#top".into(),
                label: "/x/y.sql".into(),
            }
        );
    }

    #[test]
    fn bare_host_url_has_root_label() {
        let src = resolver().resolve("http://example.com").unwrap();
        assert_eq!(src.label(), "/");
    }

    #[test]
    fn relative_path_joins_base() {
        let src = resolver().resolve("sql/a.sql").unwrap();
        assert_eq!(
            src,
            ResolvedSource::File {
                original: "/work/project/sql/a.sql".into(),
                label: "sql/a.sql".into(),
            }
        );

        let up = resolver().resolve("../shared/a.sql").unwrap();
        assert_eq!(up.label(), "/work/shared/a.sql");
    }

    #[test]
    fn relative_path_against_remote_base_is_remote() {
        let base = Url::parse("https://cdn.example.com/lib/cat.ts").unwrap();
        let src = resolver().with_base(base).resolve("../src/a.sql").unwrap();
        assert_eq!(
            src,
            ResolvedSource::Remote {
                original: "https://cdn.example.com/src/a.sql".into(),
                label: "/src/a.sql".into(),
            }
        );
    }

    #[test]
    fn relative_path_against_module_base() {
        let base = Url::parse("file:///work/project/lib/info.cat.ts").unwrap();
        let src = resolver().with_base(base).resolve("../src/ddl.sql").unwrap();
        assert_eq!(src.label(), "src/ddl.sql");
    }

    #[test]
    fn dot_segments_are_collapsed_before_labelling() {
        let src = resolver().resolve("/work/project/sql/../a.sql").unwrap();
        assert_eq!(
            src,
            ResolvedSource::File {
                original: "/work/project/a.sql".into(),
                label: "a.sql".into(),
            }
        );

        let src = resolver().resolve("/work/project/./sql/./b.sql").unwrap();
        assert_eq!(src.label(), "sql/b.sql");
    }

    #[test]
    fn escaping_cwd_through_parent_keeps_raw_path() {
        let src = resolver().resolve("/work/project/../other/x.sql").unwrap();
        assert_eq!(
            src,
            ResolvedSource::File {
                original: "/work/other/x.sql".into(),
                label: "/work/other/x.sql".into(),
            }
        );
    }

    #[test]
    fn file_url_with_remote_host_is_rejected() {
        let err = resolver().resolve("file://host/x.sql").unwrap_err();
        assert!(matches!(err, CatError::Validation { .. }));
    }

    #[test]
    fn normalize_handles_edges() {
        assert_eq!(normalize(Path::new("/../a/./b/..")), PathBuf::from("/a"));
        assert_eq!(normalize(Path::new("../a/../../b")), PathBuf::from("../../b"));
        assert_eq!(normalize(Path::new("a/..")), PathBuf::new());
    }

    #[test]
    fn inline_label_defaults() {
        assert_eq!(ResolvedSource::inline("x", None).label(), "inline");
        assert_eq!(ResolvedSource::inline("x", Some("")).label(), "inline");
        assert_eq!(ResolvedSource::inline("x", Some("gen")).label(), "gen");
    }

    #[test]
    fn file_spec_resolution() {
        let r = resolver();
        assert_eq!(
            r.resolve_file_spec("gen.sh", None).unwrap(),
            PathBuf::from("/work/project/gen.sh")
        );
        assert_eq!(
            r.resolve_file_spec("gen.sh", Some(Path::new("tools"))).unwrap(),
            PathBuf::from("/work/project/tools/gen.sh")
        );
        assert_eq!(
            r.resolve_file_spec("gen.sh", Some(Path::new("/opt/gen"))).unwrap(),
            PathBuf::from("/opt/gen/gen.sh")
        );
        assert_eq!(
            r.resolve_file_spec("file:///opt/gen.sh", None).unwrap(),
            PathBuf::from("/opt/gen.sh")
        );
        assert_eq!(
            r.resolve_file_spec("../gen.sh", Some(Path::new("tools"))).unwrap(),
            PathBuf::from("/work/project/gen.sh")
        );
        assert_eq!(
            r.resolve_file_spec("/work/project/tools/../gen.sh", None).unwrap(),
            PathBuf::from("/work/project/gen.sh")
        );
    }

    #[test]
    fn file_spec_rejects_remote() {
        let err = resolver()
            .resolve_file_spec("https://example.com/gen.sh", None)
            .unwrap_err();
        assert!(matches!(err, CatError::Validation { .. }));

        let base = Url::parse("https://cdn.example.com/lib/").unwrap();
        let err = resolver()
            .with_base(base)
            .resolve_file_spec("gen.sh", None)
            .unwrap_err();
        assert!(err.to_string().contains("expected local file"));
    }

    #[test]
    fn relative_working_directory_is_rejected() {
        assert!(SourceResolver::new("relative/dir").is_err());
    }

    #[test]
    fn labels_are_deterministic() {
        let a = resolver().resolve("/work/project/a/b/c.sql").unwrap();
        let b = resolver().resolve("/work/project/a/b/c.sql").unwrap();
        assert_eq!(a, b);
        assert_eq!(
            relative_label(Path::new("/work/project/a/b/c.sql"), Path::new("/work/project")),
            "a/b/c.sql"
        );
    }
}
