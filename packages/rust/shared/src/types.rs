//! Core domain types for executable discovery.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Label prefix applied to discovery results when a spec does not set one.
pub const DEFAULT_LABEL_PREFIX: &str = "autoCompile";

/// Label given to inline text when the caller does not supply one.
pub const INLINE_LABEL: &str = "inline";

// ---------------------------------------------------------------------------
// AutoCompileSpec
// ---------------------------------------------------------------------------

/// One or more glob patterns. Accepts a bare string or a list in config files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GlobPatterns {
    One(String),
    Many(Vec<String>),
}

impl GlobPatterns {
    /// Patterns in declaration order.
    pub fn as_slice(&self) -> &[String] {
        match self {
            Self::One(pattern) => std::slice::from_ref(pattern),
            Self::Many(patterns) => patterns,
        }
    }
}

impl From<&str> for GlobPatterns {
    fn from(pattern: &str) -> Self {
        Self::One(pattern.to_string())
    }
}

impl From<Vec<String>> for GlobPatterns {
    fn from(patterns: Vec<String>) -> Self {
        Self::Many(patterns)
    }
}

/// Where to look for executable generator scripts.
///
/// At least one of `file` / `glob` should be set for the spec to yield anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoCompileSpec {
    /// A single candidate path (or `file:` URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Glob pattern(s), matched against files only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glob: Option<GlobPatterns>,

    /// Directory that `file` and `glob` are evaluated against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,

    /// Prefix for result labels (defaults to [`DEFAULT_LABEL_PREFIX`]).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_prefix: Option<String>,
}

impl AutoCompileSpec {
    /// Spec for a single candidate file.
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            file: Some(path.into()),
            ..Self::default()
        }
    }

    /// Spec for a single glob pattern.
    pub fn glob(pattern: impl Into<String>) -> Self {
        Self {
            glob: Some(GlobPatterns::One(pattern.into())),
            ..Self::default()
        }
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_label_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.label_prefix = Some(prefix.into());
        self
    }

    /// Glob patterns of this spec, empty when none are set.
    pub fn patterns(&self) -> &[String] {
        self.glob.as_ref().map(GlobPatterns::as_slice).unwrap_or(&[])
    }

    /// The effective label prefix.
    pub fn label_prefix(&self) -> &str {
        self.label_prefix.as_deref().unwrap_or(DEFAULT_LABEL_PREFIX)
    }
}

// ---------------------------------------------------------------------------
// AutoCompiled
// ---------------------------------------------------------------------------

/// Captured result of running one discovered executable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoCompiled {
    /// Absolute path of the executable that ran.
    pub executable_path: PathBuf,
    /// `<labelPrefix>:<relative path>`.
    pub label: String,
    /// Decoded standard output.
    pub text: String,
}
