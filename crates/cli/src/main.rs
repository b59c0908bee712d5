// tagcalc CLI - evaluate token formulas, query suggestions, edit interactively

mod exit_codes;
mod repl;
mod words;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use log::debug;
use tagcalc_config::Settings;
use tagcalc_engine::{evaluate, evaluate_display, FormulaEditor, Suggestion, TokenSequence};
use tagcalc_suggest::{HttpSuggestionSource, StaticSource, SuggestError, SuggestionFetcher, SuggestionSource};
use tracing_subscriber::filter::LevelFilter;

use exit_codes::{EXIT_EVAL_ERROR, EXIT_IO, EXIT_SUCCESS, EXIT_SUGGEST, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "tagcalc")]
#[command(about = "Compose and evaluate tag-based formulas")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Settings file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log more to stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a formula given as token words
    #[command(after_help = "\
Token words:
  200        number            50%   percentage of the next operand
  5~         growth number     @x    variable (also @x% / @x~)
  fn:SUM     function          + - * /  operators

Examples:
  tagcalc eval 2 '*' 3 + 4
  tagcalc eval 50% 200
  tagcalc eval --json 10 / 0")]
    Eval {
        /// Print tokens and result as JSON
        #[arg(long)]
        json: bool,

        /// Token words, in order
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        tokens: Vec<String>,
    },

    /// Look up autocomplete suggestions for a query
    Suggest {
        query: String,

        #[command(flatten)]
        source: SourceArgs,

        /// Print suggestions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive editing session on stdin/stdout
    Repl {
        #[command(flatten)]
        source: SourceArgs,

        /// Run without any suggestion source
        #[arg(long, conflicts_with_all = ["endpoint", "records"])]
        offline: bool,
    },

    /// Inspect settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Args)]
struct SourceArgs {
    /// Autocomplete endpoint (overrides settings)
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// Read suggestion records from a JSON file instead of the network
    #[arg(long, value_name = "FILE", conflicts_with = "endpoint")]
    records: Option<PathBuf>,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the settings file path
    Path,
    /// Print the effective settings as JSON
    Show,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  tagcalc-engine ", env!("CARGO_PKG_VERSION"),
    )
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.config.as_deref();
    let result = match cli.command {
        None => {
            eprintln!("Usage: tagcalc <command> [options]");
            eprintln!("       tagcalc --help for more information");
            Ok(())
        }
        Some(Commands::Eval { json, tokens }) => cmd_eval(&tokens, json),
        Some(Commands::Suggest { query, source, json }) => cmd_suggest(config, &query, source, json),
        Some(Commands::Repl { source, offline }) => cmd_repl(config, source, offline),
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Path => cmd_config_path(config),
            ConfigCommands::Show => cmd_config_show(config),
        },
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    /// Evaluation errors are already on stdout; exit code only.
    pub fn eval() -> Self {
        Self { code: EXIT_EVAL_ERROR, message: String::new(), hint: None }
    }

    pub fn suggest(err: SuggestError) -> Self {
        let hint = match &err {
            SuggestError::Network(_) => Some("check suggest.endpoint or pass --records FILE".to_string()),
            _ => None,
        };
        let code = if matches!(err, SuggestError::Io(_)) { EXIT_IO } else { EXIT_SUGGEST };
        Self { code, message: err.to_string(), hint }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

fn load_settings(config: Option<&Path>) -> Settings {
    match config {
        Some(path) => Settings::load_from(path).with_env_overrides(),
        None => Settings::load(),
    }
}

/// The two kinds of suggestion source the CLI can be pointed at.
enum AnySource {
    Http(HttpSuggestionSource),
    Static(StaticSource),
}

impl SuggestionSource for AnySource {
    fn fetch(&self, query: &str) -> Result<Vec<Suggestion>, SuggestError> {
        match self {
            AnySource::Http(source) => source.fetch(query),
            AnySource::Static(source) => source.fetch(query),
        }
    }
}

fn build_source(settings: &Settings, args: SourceArgs) -> Result<AnySource, CliError> {
    if let Some(path) = args.records {
        return StaticSource::from_json_file(&path)
            .map(AnySource::Static)
            .map_err(CliError::suggest);
    }
    let endpoint = args.endpoint.unwrap_or_else(|| settings.suggest_endpoint.clone());
    debug!("suggestion endpoint: {}", endpoint);
    HttpSuggestionSource::new(endpoint, settings.timeout())
        .map(AnySource::Http)
        .map_err(CliError::suggest)
}

// ============================================================================
// eval
// ============================================================================

fn cmd_eval(words: &[String], json: bool) -> Result<(), CliError> {
    let tokens = words::parse_words(words)
        .map_err(|e| CliError::args(e).with_hint("see `tagcalc eval --help` for token words"))?;

    let mut sequence = TokenSequence::new();
    for token in tokens {
        sequence.insert(token);
    }

    let outcome = evaluate(sequence.tokens());
    let display = evaluate_display(sequence.tokens());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        let body = serde_json::json!({
            "tokens": sequence.tokens(),
            "result": display,
            "value": outcome.as_ref().ok(),
            "error": outcome.as_ref().err().map(|e| e.to_string()),
        });
        writeln!(out, "{}", body).map_err(|e| CliError::io(e.to_string()))?;
    } else {
        writeln!(out, "{}", display).map_err(|e| CliError::io(e.to_string()))?;
    }

    match outcome {
        Ok(_) => Ok(()),
        Err(_) => Err(CliError::eval()),
    }
}

// ============================================================================
// suggest
// ============================================================================

fn cmd_suggest(config: Option<&Path>, query: &str, args: SourceArgs, json: bool) -> Result<(), CliError> {
    let settings = load_settings(config);
    let source = build_source(&settings, args)?;
    let suggestions = source.fetch(query).map_err(CliError::suggest)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        let body = serde_json::to_string(&suggestions).map_err(|e| CliError::io(e.to_string()))?;
        writeln!(out, "{}", body).map_err(|e| CliError::io(e.to_string()))?;
    } else {
        for s in &suggestions {
            writeln!(out, "{}", s.name).map_err(|e| CliError::io(e.to_string()))?;
        }
    }
    Ok(())
}

// ============================================================================
// repl
// ============================================================================

fn cmd_repl(config: Option<&Path>, args: SourceArgs, offline: bool) -> Result<(), CliError> {
    let settings = load_settings(config);
    let fetcher = if offline {
        None
    } else {
        let source = build_source(&settings, args)?;
        Some(SuggestionFetcher::new(source, settings.stale_time()))
    };

    let editor = FormulaEditor::new(settings.editor_options());
    let mut session = repl::Repl::new(editor, fetcher, settings.timeout());

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    session
        .run(stdin.lock(), &mut out)
        .map_err(|e| CliError::io(e.to_string()))
}

// ============================================================================
// config
// ============================================================================

fn cmd_config_path(config: Option<&Path>) -> Result<(), CliError> {
    let path = config.map(Path::to_path_buf).unwrap_or_else(Settings::config_path);
    println!("{}", path.display());
    Ok(())
}

fn cmd_config_show(config: Option<&Path>) -> Result<(), CliError> {
    let settings = load_settings(config);
    let json = serde_json::to_string_pretty(&settings).map_err(|e| CliError::io(e.to_string()))?;
    println!("{}", json);
    Ok(())
}
