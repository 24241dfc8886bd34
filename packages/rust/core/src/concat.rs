//! The concatenation session.
//!
//! A [`Cat`] collects sources in call order, reads them all (concurrently),
//! and joins their trimmed text with a separator, optionally bracketing each
//! one in `BEGIN <label>` / `END <label>` lines. For fixed inputs, working
//! directory, and marker setting the output is byte-identical across runs.

use std::io::Write;

use autocat_discovery::{AutoCompileStream, discover};
use autocat_shared::{
    AppConfig, AutoCompileSpec, CatError, HttpConfig, ResolvedSource, Result, SourceResolver,
};
use futures::TryStreamExt;
use futures::future::try_join_all;
use tracing::{debug, info, instrument};

use crate::reader::SourceReader;

/// Default separator between sources.
pub const DEFAULT_SEPARATOR: &str = "\n\n";

/// A programmable `cat`: an ordered list of sources plus output settings.
#[derive(Debug, Clone)]
pub struct Cat {
    sources: Vec<ResolvedSource>,
    separator: String,
    markers: bool,
    resolver: SourceResolver,
    reader: SourceReader,
}

impl Cat {
    /// Session anchored at the process working directory, with defaults.
    pub fn new() -> Result<Self> {
        Self::with_resolver(SourceResolver::from_env()?, &HttpConfig::default())
    }

    /// Session using an explicit resolver and HTTP settings.
    pub fn with_resolver(resolver: SourceResolver, http: &HttpConfig) -> Result<Self> {
        Ok(Self {
            sources: Vec::new(),
            separator: DEFAULT_SEPARATOR.to_string(),
            markers: false,
            resolver,
            reader: SourceReader::new(http)?,
        })
    }

    /// Session configured from the `[defaults]` and `[http]` config sections.
    pub fn from_config(resolver: SourceResolver, config: &AppConfig) -> Result<Self> {
        let mut cat = Self::with_resolver(resolver, &config.http)?;
        cat.separator(config.defaults.separator.as_str())
            .markers(config.defaults.markers);
        Ok(cat)
    }

    /// Append paths or URLs, resolved now and read later.
    ///
    /// All-or-nothing: if any input fails to resolve, none are appended.
    pub fn add<I, S>(&mut self, sources: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let resolved = sources
            .into_iter()
            .map(|source| self.resolver.resolve(source.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        for src in &resolved {
            debug!(kind = src.kind(), label = src.label(), "added source");
        }
        self.sources.extend(resolved);
        Ok(self)
    }

    /// Append literal text. A missing or empty label becomes `inline`.
    pub fn add_text(&mut self, text: impl Into<String>, label: Option<&str>) -> &mut Self {
        self.sources.push(ResolvedSource::inline(text, label));
        self
    }

    pub fn separator(&mut self, value: impl Into<String>) -> &mut Self {
        self.separator = value.into();
        self
    }

    /// Enable or disable BEGIN/END markers (off by default).
    pub fn markers(&mut self, enabled: bool) -> &mut Self {
        self.markers = enabled;
        self
    }

    /// Sources in append order.
    pub fn sources(&self) -> &[ResolvedSource] {
        &self.sources
    }

    pub fn resolver(&self) -> &SourceResolver {
        &self.resolver
    }

    /// Lazily discover and run generators, resolved against this session.
    pub fn auto_compile(
        &self,
        specs: impl IntoIterator<Item = AutoCompileSpec>,
    ) -> AutoCompileStream {
        discover(specs, self.resolver.clone())
    }

    /// Run every generator `specs` discovers and append each output as inline
    /// text labelled with its discovery label. Returns how many were added.
    #[instrument(skip_all)]
    pub async fn add_auto_compiled(
        &mut self,
        specs: impl IntoIterator<Item = AutoCompileSpec>,
    ) -> Result<usize> {
        let mut stream = self.auto_compile(specs);
        let mut added = 0;
        while let Some(generated) = stream.try_next().await? {
            self.add_text(generated.text, Some(&generated.label));
            added += 1;
        }
        info!(added, "generator outputs appended");
        Ok(added)
    }

    /// Read every source and assemble the final text.
    #[instrument(skip_all, fields(sources = self.sources.len(), markers = self.markers))]
    pub async fn concat(&self) -> Result<String> {
        let texts = try_join_all(self.sources.iter().map(|src| self.reader.read(src))).await?;

        let chunks: Vec<String> = self
            .sources
            .iter()
            .zip(&texts)
            .map(|(src, text)| self.chunk(src.label(), text))
            .collect();

        let mut out = chunks.join(self.separator.as_str());
        out.push('\n');
        Ok(out)
    }

    /// Write the concatenation to `out`.
    pub async fn write_to(&self, out: &mut impl Write) -> Result<()> {
        let text = self.concat().await?;
        emit(out, text.as_bytes())
    }

    /// Write the concatenation to standard output.
    pub async fn write_to_stdout(&self) -> Result<()> {
        let text = self.concat().await?;
        emit(&mut std::io::stdout().lock(), text.as_bytes())
    }

    fn chunk(&self, label: &str, text: &str) -> String {
        let body = text.trim_end();
        if self.markers {
            format!("BEGIN {label}\n{body}\nEND {label}")
        } else {
            body.to_string()
        }
    }
}

/// Concatenate `sources` (resolved against the working directory) to stdout.
pub async fn cat_to_stdout<I, S>(sources: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cat = Cat::new()?;
    cat.add(sources)?;
    cat.write_to_stdout().await
}

/// Write `bytes` to `out` and flush.
pub(crate) fn emit(out: &mut impl Write, bytes: &[u8]) -> Result<()> {
    out.write_all(bytes)
        .and_then(|()| out.flush())
        .map_err(|e| CatError::io("<stdout>", e))
}
