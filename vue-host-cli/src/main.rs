use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;
use vue_host::{ComponentInstance, Dialect, ParseKind, Program, ServiceHost, TextDocument};

#[derive(Parser)]
#[command(author, version, about = "Inspect single-file components through the virtual project host")]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Open files as editor documents and report how the host sees them.
  Inspect(InspectArgs),
}

#[derive(Args)]
struct InspectArgs {
  /// Files to open, in order. The last one stays current.
  #[arg(required = true)]
  files: Vec<PathBuf>,

  /// Directory whose tsconfig.json or jsconfig.json governs the project.
  #[arg(long, default_value = ".")]
  workspace: PathBuf,

  /// Emit a JSON report.
  #[arg(long)]
  json: bool,

  /// Emit tracing spans as JSON on stderr.
  #[arg(long)]
  trace: bool,
}

#[derive(Serialize)]
struct ImportReport {
  specifier: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  resolved: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  dialect: Option<Dialect>,
}

#[derive(Serialize)]
struct FileReport {
  path: String,
  version: u64,
  dialect: Dialect,
  parse_kind: ParseKind,
  patched: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  syntax_error: Option<String>,
  imports: Vec<ImportReport>,
}

#[derive(Serialize)]
struct JsonReport {
  program: Program,
  files: Vec<FileReport>,
  components: Vec<ComponentInstance>,
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  let result = match cli.command {
    Commands::Inspect(args) => run_inspect(args),
  };
  match result {
    Ok(code) => code,
    Err(err) => {
      eprintln!("error: {err:#}");
      ExitCode::from(2)
    }
  }
}

fn run_inspect(args: InspectArgs) -> Result<ExitCode> {
  init_tracing(args.trace);

  let mut host = ServiceHost::open(&args.workspace)
    .with_context(|| format!("failed to load project for {}", args.workspace.display()))?;

  let mut opened = Vec::new();
  for file in &args.files {
    let path = file
      .canonicalize()
      .with_context(|| format!("failed to read {}", file.display()))?;
    let text = fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let path = path.to_string_lossy().into_owned();
    let update = host.update_current_document(&TextDocument::new(path.clone(), 1, text));
    info!(path = %update.path, version = update.version, dialect = %update.dialect, "document opened");
    opened.push(update.path);
  }

  let program = host.program();
  let mut files = Vec::new();
  let mut components = Vec::new();
  for path in &opened {
    if let Some(file) = host.source_file(path) {
      files.push(FileReport {
        path: file.path.clone(),
        version: file.version,
        dialect: file.dialect,
        parse_kind: file.parse_kind,
        patched: file.patched,
        syntax_error: file.tree.as_ref().err().map(|err| err.to_string()),
        imports: file
          .imports
          .iter()
          .map(|import| ImportReport {
            specifier: import.specifier.clone(),
            resolved: import.resolved.as_ref().map(|r| r.resolved_file_name.clone()),
            dialect: import.resolved.as_ref().map(|r| r.dialect),
          })
          .collect(),
      });
    }
    if let Some(instance) = host.component_instance(path) {
      components.push(ComponentInstance::clone(&instance));
    }
  }

  let failed = files.iter().any(|file| file.syntax_error.is_some());
  if args.json {
    let report = JsonReport {
      program,
      files,
      components,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
  } else {
    print_report(&program, &files, &components);
  }

  Ok(if failed {
    ExitCode::FAILURE
  } else {
    ExitCode::SUCCESS
  })
}

fn print_report(program: &Program, files: &[FileReport], components: &[ComponentInstance]) {
  println!(
    "program: {} roots, {} files, {} missing",
    program.root_files.len(),
    program.files.len(),
    program.missing.len()
  );
  for missing in &program.missing {
    println!("  missing {missing}");
  }
  for file in files {
    println!(
      "{} v{} {} parse={} patched={}",
      file.path,
      file.version,
      file.dialect,
      match file.parse_kind {
        ParseKind::Full => "full",
        ParseKind::Incremental => "incremental",
      },
      file.patched
    );
    if let Some(err) = &file.syntax_error {
      println!("  syntax error: {err}");
    }
    for import in &file.imports {
      match (&import.resolved, import.dialect) {
        (Some(resolved), Some(dialect)) => println!("  import {} -> {resolved} ({dialect})", import.specifier),
        _ => println!("  import {} unresolved", import.specifier),
      }
    }
  }
  for component in components {
    println!(
      "component {} ({})",
      component.name.as_deref().unwrap_or("<anonymous>"),
      component.path
    );
    print_names("props", &component.props);
    print_names("data", &component.data);
    print_names("computed", &component.computed);
    print_names("methods", &component.methods);
    for child in &component.components {
      match (&child.source, child.dialect) {
        (Some(source), Some(dialect)) => println!("  child {} -> {source} ({dialect})", child.name),
        _ => println!("  child {} unresolved", child.name),
      }
    }
  }
}

fn print_names(label: &str, names: &[String]) {
  if !names.is_empty() {
    println!("  {label}: {}", names.join(", "));
  }
}

fn init_tracing(enabled: bool) {
  if enabled {
    let _ = tracing_subscriber::fmt()
      .with_span_events(FmtSpan::CLOSE)
      .with_max_level(Level::DEBUG)
      .json()
      .with_ansi(false)
      .with_writer(std::io::stderr)
      .try_init();
    return;
  }
  if let Ok(filter) = EnvFilter::try_from_default_env() {
    let _ = tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_writer(std::io::stderr)
      .try_init();
  }
}
