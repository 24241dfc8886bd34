//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use futures::TryStreamExt;
use tracing::info;

use autocat_core::{Cat, parse_location, replace_suffix, write_auto_compile_output};
use autocat_shared::{
    AppConfig, AutoCompileSpec, AutoCompiled, GlobPatterns, SourceResolver, init_config,
    load_config, load_config_from,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// autocat — concatenate files, URLs, inline text, and generator output.
#[derive(Parser)]
#[command(
    name = "autocat",
    version,
    about = "Concatenate text sources and executable generator output into one deterministic stream.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json. Logs always go to stderr.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ./autocat.toml, then ~/.autocat/autocat.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run discovered generators and concatenate their output to stdout.
    Compile {
        #[command(flatten)]
        discover: DiscoverArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Run discovered generators and list what they produced.
    List {
        #[command(flatten)]
        discover: DiscoverArgs,

        /// Print results as JSON instead of `label<TAB>bytes` lines.
        #[arg(long)]
        json: bool,
    },

    /// Concatenate paths, URLs, and inline text to stdout.
    Cat {
        #[command(flatten)]
        sources: SourceArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Concatenate sources relative to a module and route the result.
    ///
    /// A remote module location prints the text; a local one writes a sibling
    /// file (module path with `--suffix` replaced by `--replace`) and prints
    /// its path.
    Emit {
        /// Location of the invoking module (URL or path).
        #[arg(long)]
        module: String,

        /// Suffix of the module path to replace.
        #[arg(long)]
        suffix: String,

        /// Replacement suffix for the materialized file.
        #[arg(long)]
        replace: String,

        #[command(flatten)]
        sources: SourceArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Where to look for generator scripts.
#[derive(Args, Debug, Default)]
pub(crate) struct DiscoverArgs {
    /// Candidate generator files (each becomes its own discovery spec).
    pub files: Vec<String>,

    /// Glob pattern(s) matched against files (repeatable).
    #[arg(long = "glob")]
    pub globs: Vec<String>,

    /// Directory files and globs are evaluated against.
    #[arg(long)]
    pub cwd: Option<PathBuf>,

    /// Prefix for result labels.
    #[arg(long)]
    pub label_prefix: Option<String>,
}

/// Sources for plain concatenation.
#[derive(Args, Debug, Default)]
pub(crate) struct SourceArgs {
    /// Paths, `file:` URLs, or `http(s):` URLs.
    pub sources: Vec<String>,

    /// Inline text appended after the sources (repeatable).
    #[arg(long = "text")]
    pub texts: Vec<String>,
}

/// Output shaping shared by the concatenating commands.
#[derive(Args, Debug, Default)]
pub(crate) struct OutputArgs {
    /// Wrap each source in BEGIN/END marker lines.
    #[arg(long)]
    pub markers: bool,

    /// Separator between sources (defaults to a blank line).
    #[arg(long)]
    pub separator: Option<String>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize the user config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Stdout carries data, so logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "autocat=warn",
        1 => "autocat=info",
        2 => "autocat=debug",
        _ => "autocat=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().wrap_err("cannot determine working directory")?;
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config(&cwd)?,
    };
    let resolver = SourceResolver::new(&cwd)?;

    match cli.command {
        Command::Compile { discover, output } => {
            cmd_compile(&config, resolver, &discover, &output).await
        }
        Command::List { discover, json } => cmd_list(&config, resolver, &discover, json).await,
        Command::Cat { sources, output } => cmd_cat(&config, resolver, &sources, &output).await,
        Command::Emit {
            module,
            suffix,
            replace,
            sources,
            output,
        } => {
            cmd_emit(
                &config, resolver, &module, &suffix, &replace, &sources, &output,
            )
            .await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

/// Discovery specs for `args`, falling back to the config's `[[discover]]`
/// specs and then to its default glob.
fn build_specs(args: &DiscoverArgs, config: &AppConfig) -> Vec<AutoCompileSpec> {
    let prefix = args
        .label_prefix
        .clone()
        .unwrap_or_else(|| config.defaults.label_prefix.clone());

    let scoped = |spec: AutoCompileSpec| AutoCompileSpec {
        cwd: args.cwd.clone(),
        label_prefix: Some(prefix.clone()),
        ..spec
    };

    let mut specs: Vec<_> = args
        .files
        .iter()
        .map(|file| scoped(AutoCompileSpec::file(file.as_str())))
        .collect();

    if !args.globs.is_empty() {
        specs.push(scoped(AutoCompileSpec {
            glob: Some(GlobPatterns::Many(args.globs.clone())),
            ..AutoCompileSpec::default()
        }));
    }

    if specs.is_empty() {
        if config.discover.is_empty() {
            specs.push(scoped(AutoCompileSpec::glob(
                config.defaults.default_glob.as_str(),
            )));
        } else {
            specs = config
                .discover
                .iter()
                .cloned()
                .map(|mut spec| {
                    spec.label_prefix.get_or_insert_with(|| prefix.clone());
                    spec
                })
                .collect();
        }
    }

    specs
}

fn session(config: &AppConfig, resolver: SourceResolver, output: &OutputArgs) -> Result<Cat> {
    let mut cat = Cat::from_config(resolver, config)?;
    if output.markers {
        cat.markers(true);
    }
    if let Some(separator) = &output.separator {
        cat.separator(separator.as_str());
    }
    Ok(cat)
}

fn add_sources(cat: &mut Cat, args: &SourceArgs) -> Result<()> {
    cat.add(&args.sources)?;
    for text in &args.texts {
        cat.add_text(text.as_str(), None);
    }
    Ok(())
}

async fn cmd_compile(
    config: &AppConfig,
    resolver: SourceResolver,
    args: &DiscoverArgs,
    output: &OutputArgs,
) -> Result<()> {
    let specs = build_specs(args, config);
    info!(specs = specs.len(), "compiling generator output");

    let mut cat = session(config, resolver, output)?;
    cat.add_auto_compiled(specs).await?;
    cat.write_to_stdout().await?;
    Ok(())
}

async fn cmd_list(
    config: &AppConfig,
    resolver: SourceResolver,
    args: &DiscoverArgs,
    json: bool,
) -> Result<()> {
    let cat = session(config, resolver, &OutputArgs::default())?;
    let results: Vec<AutoCompiled> = cat.auto_compile(build_specs(args, config)).try_collect().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for result in &results {
            println!("{}\t{}", result.label, result.text.len());
        }
    }
    Ok(())
}

async fn cmd_cat(
    config: &AppConfig,
    resolver: SourceResolver,
    sources: &SourceArgs,
    output: &OutputArgs,
) -> Result<()> {
    let mut cat = session(config, resolver, output)?;
    add_sources(&mut cat, sources)?;
    cat.write_to_stdout().await?;
    Ok(())
}

async fn cmd_emit(
    config: &AppConfig,
    resolver: SourceResolver,
    module: &str,
    suffix: &str,
    replace: &str,
    sources: &SourceArgs,
    output: &OutputArgs,
) -> Result<()> {
    let caller = parse_location(module, &resolver)?;
    info!(%caller, "emitting relative to module");

    // Sources resolve next to the module, labels stay relative to the cwd.
    let mut cat = session(config, resolver.with_base(caller.clone()), output)?;
    add_sources(&mut cat, sources)?;

    let mut stdout = std::io::stdout();
    write_auto_compile_output(&cat, &caller, replace_suffix(suffix, replace), &mut stdout).await?;
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}
