use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use depcon_cli::check::{check_path, render_report};
use depcon_cli::refactor_apply::{emit, FileSnapshot, OutputMode};
use depcon_config::DepconConfig;
use depcon_refactor::{
    code_actions, convert_class_method, convert_method, resolve_class_dependencies,
    resolve_unassigned_dependencies, CancellationToken, MethodMode, RefactorError, TextEdit,
    WorkspaceEdit,
};
use depcon_syntax::{parse_source, Member, ParsedClass, SourceFile};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "depcon",
    version,
    about = "Constructor injection and sync/async refactorings for C# classes"
)]
struct Cli {
    /// Config file (defaults to `depcon.toml` or `.depcon.toml` in the current directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate or extend the constructor that injects a class's read-only fields
    Ctor(CtorArgs),
    /// Convert a method between synchronous and asynchronous form
    Convert(ConvertArgs),
    /// List the refactorings available at a position
    Actions(ActionsArgs),
    /// Report classes whose read-only fields are not injected (exit code 1 if any)
    Check(CheckArgs),
}

#[derive(Args)]
struct PositionArgs {
    /// Cursor as a byte offset into the file
    #[arg(long, conflicts_with_all = ["line", "column"])]
    offset: Option<usize>,
    /// Cursor line (1-based)
    #[arg(long, requires = "column")]
    line: Option<usize>,
    /// Cursor column in characters (1-based)
    #[arg(long, requires = "line")]
    column: Option<usize>,
}

#[derive(Args)]
struct OutputArgs {
    /// Rewrite the file on disk instead of printing it
    #[arg(long, conflicts_with_all = ["diff", "json"])]
    in_place: bool,
    /// Print a unified diff instead of the rewritten file
    #[arg(long, conflicts_with = "json")]
    diff: bool,
    /// Emit the refactoring preview as JSON
    #[arg(long)]
    json: bool,
}

impl OutputArgs {
    fn mode(&self) -> OutputMode {
        if self.in_place {
            OutputMode::InPlace
        } else if self.diff {
            OutputMode::Diff
        } else if self.json {
            OutputMode::Json
        } else {
            OutputMode::Print
        }
    }
}

#[derive(Args)]
struct CtorArgs {
    /// Source file to rewrite
    file: PathBuf,
    /// Class to rewrite (defaults to every class in the file that needs it)
    #[arg(long, conflicts_with_all = ["offset", "line"])]
    class: Option<String>,
    #[command(flatten)]
    position: PositionArgs,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct ConvertArgs {
    /// Source file to rewrite
    file: PathBuf,
    /// Target mode: `sync` or `async`
    #[arg(long)]
    to: MethodMode,
    /// Method to convert (alternative to a cursor position)
    #[arg(long, conflicts_with_all = ["offset", "line"])]
    method: Option<String>,
    /// Restrict `--method` lookup to this class
    #[arg(long, requires = "method")]
    class: Option<String>,
    #[command(flatten)]
    position: PositionArgs,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct ActionsArgs {
    /// Source file
    file: PathBuf,
    #[command(flatten)]
    position: PositionArgs,
    /// Emit JSON suitable for editors and CI
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct CheckArgs {
    /// File or directory to check
    #[arg(default_value = ".")]
    path: PathBuf,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    let config = load_config(cli.config.as_deref())?;
    depcon_config::init_tracing(&config.logging);

    match cli.command {
        Command::Ctor(args) => run_ctor(&args, &config),
        Command::Convert(args) => run_convert(&args, &config),
        Command::Actions(args) => run_actions(&args),
        Command::Check(args) => {
            let report = check_path(&args.path, &config.check)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", render_report(&report));
            }
            Ok(if report.is_clean() { 0 } else { 1 })
        }
    }
}

fn load_config(explicit: Option<&Path>) -> Result<DepconConfig> {
    if let Some(path) = explicit {
        return DepconConfig::load_from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()));
    }
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let (config, _) = depcon_config::load_for_workspace(&cwd)?;
    Ok(config)
}

fn cursor(snapshot: &FileSnapshot, position: &PositionArgs) -> Result<Option<usize>> {
    snapshot.cursor(position.offset, position.line, position.column)
}

fn run_ctor(args: &CtorArgs, config: &DepconConfig) -> Result<i32> {
    let snapshot = FileSnapshot::read(&args.file)?;
    let cancel = CancellationToken::new();
    let file = snapshot.id.as_str();

    let result = if let Some(name) = &args.class {
        let parsed = parse_source(&snapshot.text);
        let class = parsed
            .class_named(name)
            .with_context(|| format!("no class named `{name}` in {}", args.file.display()))?;
        resolve_class_dependencies(file, &snapshot.text, class, &cancel)
    } else if let Some(offset) = cursor(&snapshot, &args.position)? {
        resolve_unassigned_dependencies(file, &snapshot.text, offset, &cancel)
    } else {
        resolve_every_class(file, &snapshot.text, &cancel)
    };
    finish(&snapshot, result, args.output.mode(), config)
}

/// Resolves every class that needs it; nested classes edit disjoint ranges.
fn resolve_every_class(
    file: &str,
    source: &str,
    cancel: &CancellationToken,
) -> Result<WorkspaceEdit, RefactorError> {
    let parsed = parse_source(source);
    let mut edits: Vec<TextEdit> = Vec::new();
    for class in &parsed.classes {
        match resolve_class_dependencies(file, source, class, cancel) {
            Ok(edit) => edits.extend(edit.edits),
            Err(RefactorError::NotApplicable) => {}
            Err(err) => return Err(err),
        }
    }
    if edits.is_empty() {
        return Err(RefactorError::NotApplicable);
    }
    let mut edit = WorkspaceEdit::new(edits);
    edit.normalize()?;
    Ok(edit)
}

fn run_convert(args: &ConvertArgs, config: &DepconConfig) -> Result<i32> {
    let snapshot = FileSnapshot::read(&args.file)?;
    let cancel = CancellationToken::new();
    let file = snapshot.id.as_str();

    let result = if let Some(name) = &args.method {
        let parsed = parse_source(&snapshot.text);
        let (class, index) = find_method(&parsed, args.class.as_deref(), name)?;
        convert_class_method(file, &snapshot.text, class, index, args.to, &cancel)
    } else {
        let offset = cursor(&snapshot, &args.position)?.context(
            "pass --method NAME or a cursor position (--offset, or --line with --column)",
        )?;
        convert_method(file, &snapshot.text, offset, args.to, &cancel)
    };
    finish(&snapshot, result, args.output.mode(), config)
}

fn find_method<'a>(
    parsed: &'a SourceFile,
    class_name: Option<&str>,
    method_name: &str,
) -> Result<(&'a ParsedClass, usize)> {
    let matches: Vec<(&ParsedClass, usize)> = parsed
        .classes
        .iter()
        .filter(|class| class_name.map_or(true, |name| class.node.name == name))
        .flat_map(|class| {
            class
                .node
                .members
                .iter()
                .enumerate()
                .filter(|(_, member)| {
                    matches!(member, Member::Method(method) if method.name == method_name)
                })
                .map(move |(index, _)| (class, index))
        })
        .collect();

    match matches.as_slice() {
        [] => anyhow::bail!("no method named `{method_name}` found"),
        [single] => Ok(*single),
        many => anyhow::bail!(
            "method name `{method_name}` is ambiguous ({} matches); pass --class or a cursor position",
            many.len()
        ),
    }
}

fn finish(
    snapshot: &FileSnapshot,
    result: Result<WorkspaceEdit, RefactorError>,
    mode: OutputMode,
    config: &DepconConfig,
) -> Result<i32> {
    match result {
        Ok(edit) => {
            emit(snapshot, &edit, mode, config.preview.context_radius)?;
            Ok(0)
        }
        Err(RefactorError::NotApplicable) => {
            eprintln!("{}: nothing to change", snapshot.path.display());
            if mode == OutputMode::Print {
                print!("{}", snapshot.text);
            }
            Ok(0)
        }
        Err(err) => Err(err).with_context(|| snapshot.path.display().to_string()),
    }
}

fn run_actions(args: &ActionsArgs) -> Result<i32> {
    let snapshot = FileSnapshot::read(&args.file)?;
    let offset = cursor(&snapshot, &args.position)?
        .context("a cursor position is required (--offset, or --line with --column)")?;
    let actions = code_actions(&snapshot.text, offset, &CancellationToken::new());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&actions)?);
    } else if actions.is_empty() {
        eprintln!("no refactorings available at this position");
    } else {
        for action in &actions {
            println!("{}: {}", action.title, action.target);
        }
    }
    Ok(0)
}
