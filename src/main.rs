use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use depscope::analysis::{discover_entries, DependencyGraphBuilder, TreeSitterExtractor};
use depscope::cache::DependencyCache;
use depscope::config::Config;
use depscope::export::{export, ExportFormat, Report};
use depscope::ignore::{IgnoreEngine, RuleSource};
use depscope::paths;
use depscope::progress::ProgressReporter;

#[derive(Parser)]
#[command(name = "depscope")]
#[command(author = "Zachary Woods <143150513+zach-fau@users.noreply.github.com>")]
#[command(version)]
#[command(about = "Resolve the files reachable from JavaScript/TypeScript entry points", long_about = None)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the dependency graph of the entries and list reachable files
    Analyze {
        /// Entry files or directories to expand into entry files
        #[arg(required = true)]
        entries: Vec<PathBuf>,

        /// Project root (defaults to current directory)
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// Stop expanding imports this many hops from an entry
        #[arg(short = 'd', long)]
        max_depth: Option<usize>,

        /// Output format: json or markdown
        #[arg(short, long, default_value = "json")]
        format: ExportFormat,

        /// Do not read or write the result cache
        #[arg(long)]
        no_cache: bool,

        /// Keep ignored and vendor files in the graph
        #[arg(long)]
        include_ignored: bool,

        /// Extra ignore pattern, evaluated after the ignore files
        #[arg(long = "ignore", value_name = "PATTERN")]
        ignore: Vec<String>,

        /// Allowed file extension (repeatable, replaces the configured list)
        #[arg(long = "ext", value_name = "EXT")]
        extensions: Vec<String>,

        /// Config file (defaults to depscope.toml in the root)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Show version information
    Version,
}

struct AnalyzeArgs {
    entries: Vec<PathBuf>,
    root: PathBuf,
    max_depth: Option<usize>,
    format: ExportFormat,
    no_cache: bool,
    include_ignored: bool,
    ignore: Vec<String>,
    extensions: Vec<String>,
    config: Option<PathBuf>,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Analyze {
            entries,
            root,
            max_depth,
            format,
            no_cache,
            include_ignored,
            ignore,
            extensions,
            config,
        }) => {
            run_analyze(AnalyzeArgs {
                entries,
                root,
                max_depth,
                format,
                no_cache,
                include_ignored,
                ignore,
                extensions,
                config,
            })
            .await
        }
        Some(Commands::Version) => {
            println!("depscope v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        None => {
            println!("depscope - dependency scope resolver");
            println!("Run 'depscope analyze <ENTRY>...' to resolve reachable files");
            println!("Run 'depscope --help' for more information");
            Ok(())
        }
    }
}

/// Expands directories into their source files and resolves files against
/// the working directory.
fn collect_entries(raw: &[PathBuf], cwd: &Path, ignore: &IgnoreEngine, extensions: &[String]) -> Vec<PathBuf> {
    let mut entries = Vec::new();
    for entry in raw {
        let absolute = paths::absolutize(cwd, entry);
        let absolute = absolute.canonicalize().unwrap_or(absolute);
        if absolute.is_dir() {
            entries.extend(discover_entries(&absolute, ignore, extensions));
        } else {
            entries.push(absolute);
        }
    }
    entries
}

async fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let root = args
        .root
        .canonicalize()
        .with_context(|| format!("Invalid project root: {}", args.root.display()))?;

    let mut config = Config::load(&root, args.config.as_deref())?;
    if !args.extensions.is_empty() {
        config.extensions = args.extensions;
    }
    if args.no_cache {
        config.use_cache = false;
    }
    if args.include_ignored {
        config.include_ignored = true;
    }
    let max_depth = args.max_depth.or(config.max_depth);

    let mut ignore = IgnoreEngine::load(&root).context("Failed to load ignore rules")?;
    ignore
        .add_patterns(config.ignore.iter().chain(args.ignore.iter()), RuleSource::AdHoc)
        .context("Invalid ignore pattern")?;
    debug!(rules = ignore.len(), "ignore rules loaded");

    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let entries = collect_entries(&args.entries, &cwd, &ignore, &config.extensions);

    let mut cache = DependencyCache::new(config.cache_config());
    cache.initialize();

    let (reporter, mut events) = ProgressReporter::channel();
    let drain = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            debug!(?event, "progress");
        }
    });

    let mut builder = DependencyGraphBuilder::new(Arc::new(TreeSitterExtractor::new()), ignore)
        .with_cache(cache)
        .with_progress(reporter);

    let options = config.to_analyze_options(&root);
    let result = match builder.analyze(&entries, &root, &options).await {
        Ok(result) => result,
        Err(err) => {
            let phase = err.phase();
            return Err(anyhow::Error::new(err).context(format!("Analysis failed during {}", phase)));
        }
    };

    for warning in &result.warnings {
        warn!("{}", warning);
    }

    let files = builder.gather(&result.graph, &result.entry_files, max_depth);
    builder.shutdown();
    drop(builder);
    let _ = drain.await;

    let report = Report::new(root, result, files, max_depth);
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    export(args.format, &report, &mut handle).context("Failed to write report")?;

    Ok(())
}
