//! Candidate path expansion for a single discovery spec.

use std::path::{Path, PathBuf};

use autocat_shared::{AutoCompileSpec, CatError, Result, SourceResolver, normalize};
use tracing::{debug, trace};

/// Build the candidate list for `spec`: its `file` first, then every glob
/// match in pattern order. Directories are never yielded by glob expansion.
///
/// Walks the filesystem synchronously; async callers run it on the blocking pool.
pub(crate) fn expand(spec: &AutoCompileSpec, resolver: &SourceResolver) -> Result<Vec<PathBuf>> {
    let cwd = spec.cwd.as_deref().map(|dir| resolver.absolutize(dir));
    let mut paths = Vec::new();

    if let Some(file) = &spec.file {
        paths.push(resolver.resolve_file_spec(file, cwd.as_deref())?);
    }

    let root = cwd.as_deref().unwrap_or(resolver.cwd());
    for pattern in spec.patterns() {
        let before = paths.len();
        expand_pattern(pattern, root, &mut paths)?;
        debug!(%pattern, root = %root.display(), matches = paths.len() - before, "expanded glob");
    }

    Ok(paths)
}

fn expand_pattern(pattern: &str, root: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let rooted = if Path::new(pattern).is_absolute() {
        pattern.to_string()
    } else {
        let escaped_root = glob::Pattern::escape(&root.to_string_lossy());
        format!("{}/{pattern}", escaped_root.trim_end_matches('/'))
    };

    let entries = glob::glob(&rooted)
        .map_err(|e| CatError::validation(format!("invalid glob pattern {pattern:?}: {e}")))?;

    for entry in entries {
        match entry {
            Ok(path) if path.is_dir() => trace!(path = %path.display(), "skipping directory"),
            Ok(path) => out.push(normalize(&path)),
            Err(e) => debug!(error = %e, "unreadable glob entry, skipping"),
        }
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, "").unwrap();
    }

    #[test]
    fn file_comes_before_glob_matches() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("gen/a.sh"));
        touch(&dir.path().join("first.sh"));

        let resolver = SourceResolver::new(dir.path()).unwrap();
        let spec = AutoCompileSpec {
            file: Some("first.sh".into()),
            glob: Some("gen/*.sh".into()),
            ..AutoCompileSpec::default()
        };

        let paths = expand(&spec, &resolver).unwrap();
        assert_eq!(paths, vec![dir.path().join("first.sh"), dir.path().join("gen/a.sh")]);
    }

    #[test]
    fn glob_excludes_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("gen/sub.sh")).unwrap();
        touch(&dir.path().join("gen/real.sh"));

        let resolver = SourceResolver::new(dir.path()).unwrap();
        let paths = expand(&AutoCompileSpec::glob("gen/*.sh"), &resolver).unwrap();
        assert_eq!(paths, vec![dir.path().join("gen/real.sh")]);
    }

    #[test]
    fn glob_is_rooted_at_spec_cwd() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("tools/x.sh"));
        touch(&dir.path().join("x.sh"));

        let resolver = SourceResolver::new(dir.path()).unwrap();
        let spec = AutoCompileSpec::glob("*.sh").with_cwd("tools");
        let paths = expand(&spec, &resolver).unwrap();
        assert_eq!(paths, vec![dir.path().join("tools/x.sh")]);
    }

    #[test]
    fn parent_segments_are_collapsed() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("gen.sh"));
        touch(&dir.path().join("tools/keep"));

        let resolver = SourceResolver::new(dir.path()).unwrap();
        let spec = AutoCompileSpec {
            file: Some("../gen.sh".into()),
            glob: Some("../*.sh".into()),
            cwd: Some("tools".into()),
            label_prefix: None,
        };
        let paths = expand(&spec, &resolver).unwrap();
        assert_eq!(paths, vec![dir.path().join("gen.sh"), dir.path().join("gen.sh")]);
    }

    #[test]
    fn missing_file_is_still_a_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = SourceResolver::new(dir.path()).unwrap();
        let paths = expand(&AutoCompileSpec::file("nope.sh"), &resolver).unwrap();
        assert_eq!(paths, vec![dir.path().join("nope.sh")]);
    }

    #[test]
    fn no_matches_yields_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = SourceResolver::new(dir.path()).unwrap();
        let paths = expand(&AutoCompileSpec::glob("**/*.cat.*"), &resolver).unwrap();
        assert!(paths.is_empty());
    }

    #[test]
    fn invalid_pattern_is_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = SourceResolver::new(dir.path()).unwrap();
        let err = expand(&AutoCompileSpec::glob("a/***/b"), &resolver).unwrap_err();
        assert!(matches!(err, CatError::Validation { .. }));
    }
}
