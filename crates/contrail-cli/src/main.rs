use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use contrail_config::{
    init_tracing, json_schema, load_for_path_with_diagnostics, ConfigDiagnostics, ContrailConfig,
    LoggingConfig,
};
use contrail_flow::{
    check_declared_contract, format_contracts, method_contracts, parse_contracts, ContractSource,
    MethodContract,
};
use contrail_hir::Method;
use contrail_syntax::ParseError;
use contrail_types::{Diagnostic, Severity};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "contrail",
    version,
    about = "Contrail CLI (method contract inference for Java)"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Infer contracts for the methods in a Java file or a JSON method dump
    Infer(InferArgs),
    /// Check `@Contract` annotations against the methods they annotate
    Check(CheckArgs),
    /// Parse a contract string and print it in normal form
    Contract(ContractArgs),
    /// Print the JSON schema for `contrail.toml`
    ConfigSchema,
}

#[derive(Args)]
struct InferArgs {
    /// A `.java` file, or a `.json` file holding a method or a list of methods
    path: PathBuf,
    /// Only report methods with this name
    #[arg(long)]
    method: Option<String>,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
    /// Config file to use instead of the discovered `contrail.toml`
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct CheckArgs {
    /// A `.java` file, or a `.json` file holding a method or a list of methods
    path: PathBuf,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
    /// Config file to use instead of the discovered `contrail.toml`
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct ContractArgs {
    /// Contract text, e.g. `null -> fail; !null -> !null`
    text: String,
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
    match cli.command {
        Command::Infer(args) => infer(args),
        Command::Check(args) => check(args),
        Command::Contract(args) => {
            init_tracing(&LoggingConfig::default());
            match parse_contracts(&args.text) {
                Ok(contracts) => {
                    if args.json {
                        print_json(&contracts)?;
                    } else {
                        println!("{}", format_contracts(&contracts));
                    }
                    Ok(0)
                }
                Err(err) => {
                    if args.json {
                        print_json(&serde_json::json!({ "error": err.to_string() }))?;
                    } else {
                        eprintln!("error: {err}");
                    }
                    Ok(1)
                }
            }
        }
        Command::ConfigSchema => {
            print_json(&json_schema())?;
            Ok(0)
        }
    }
}

#[derive(Serialize)]
struct InferReport {
    method: String,
    source: &'static str,
    text: String,
    contracts: Vec<MethodContract>,
}

fn infer(args: InferArgs) -> Result<i32> {
    let config = load_config(&args.path, args.config.as_deref())?;
    let input = load_input(&args.path)?;
    for err in &input.parse_errors {
        tracing::warn!(
            target: "contrail.cli",
            path = %args.path.display(),
            offset = err.range.start,
            "{err}"
        );
    }

    let methods: Vec<&Method> = input
        .methods
        .iter()
        .filter(|method| {
            args.method
                .as_deref()
                .map_or(true, |name| method.name == name)
        })
        .collect();
    if let Some(name) = &args.method {
        if methods.is_empty() {
            bail!("no method named `{name}` in {}", args.path.display());
        }
    }

    let contract_config = config.contract_config();
    let reports: Vec<InferReport> = methods
        .into_iter()
        .map(|method| {
            let (source, contracts) = method_contracts(method, &contract_config);
            InferReport {
                method: method.signature(),
                source: match source {
                    ContractSource::Declared => "declared",
                    ContractSource::Inferred => "inferred",
                },
                text: format_contracts(&contracts),
                contracts,
            }
        })
        .collect();

    if args.json {
        print_json(&reports)?;
        return Ok(0);
    }
    for report in &reports {
        let text = if report.text.is_empty() {
            "(none)"
        } else {
            report.text.as_str()
        };
        if report.source == "declared" {
            println!("{}: {text} (declared)", report.method);
        } else {
            println!("{}: {text}", report.method);
        }
    }
    Ok(0)
}

#[derive(Serialize)]
struct CheckEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    method: Option<String>,
    #[serde(flatten)]
    diagnostic: Diagnostic,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    column: Option<usize>,
}

impl CheckEntry {
    fn new(method: Option<String>, diagnostic: Diagnostic, text: Option<&str>) -> Self {
        let position = text
            .zip(diagnostic.span)
            .map(|(text, span)| line_col(text, span.start));
        Self {
            method,
            diagnostic,
            line: position.map(|(line, _)| line),
            column: position.map(|(_, column)| column),
        }
    }
}

#[derive(Serialize, Clone, Copy)]
struct CheckSummary {
    errors: usize,
    warnings: usize,
}

#[derive(Serialize)]
struct CheckReport {
    diagnostics: Vec<CheckEntry>,
    summary: CheckSummary,
}

fn check(args: CheckArgs) -> Result<i32> {
    load_config(&args.path, args.config.as_deref())?;
    let input = load_input(&args.path)?;
    let text = input.text.as_deref();

    let mut diagnostics: Vec<CheckEntry> = input
        .parse_errors
        .iter()
        .map(|err| {
            CheckEntry::new(
                None,
                Diagnostic::error("SYNTAX", err.message.clone(), Some(err.range)),
                text,
            )
        })
        .collect();
    for method in &input.methods {
        diagnostics.extend(
            check_declared_contract(method)
                .into_iter()
                .map(|diagnostic| CheckEntry::new(Some(method.signature()), diagnostic, text)),
        );
    }

    let summary = CheckSummary {
        errors: diagnostics
            .iter()
            .filter(|entry| entry.diagnostic.is_error())
            .count(),
        warnings: diagnostics
            .iter()
            .filter(|entry| entry.diagnostic.severity == Severity::Warning)
            .count(),
    };
    let exit = if summary.errors > 0 { 1 } else { 0 };

    if args.json {
        print_json(&CheckReport {
            diagnostics,
            summary,
        })?;
        return Ok(exit);
    }
    for entry in &diagnostics {
        let d = &entry.diagnostic;
        match (entry.line, entry.column) {
            (Some(line), Some(column)) => println!(
                "{}:{line}:{column}: {}[{}] {}",
                args.path.display(),
                d.severity,
                d.code,
                d.message
            ),
            _ => println!(
                "{}: {}[{}] {}",
                args.path.display(),
                d.severity,
                d.code,
                d.message
            ),
        }
    }
    println!(
        "summary: {} errors, {} warnings",
        summary.errors, summary.warnings
    );
    Ok(exit)
}

fn load_config(input: &Path, explicit: Option<&Path>) -> Result<ContrailConfig> {
    let (config, origin, diagnostics) = match explicit {
        Some(path) => {
            let (config, diagnostics) = ContrailConfig::load_from_path_with_diagnostics(path)
                .with_context(|| format!("failed to load config {}", path.display()))?;
            (config, Some(path.to_path_buf()), diagnostics)
        }
        None => load_for_path_with_diagnostics(input).context("failed to load contrail.toml")?,
    };
    init_tracing(&config.logging);
    report_config_diagnostics(origin.as_deref(), &diagnostics)?;
    Ok(config)
}

fn report_config_diagnostics(origin: Option<&Path>, diagnostics: &ConfigDiagnostics) -> Result<()> {
    let origin = origin.map(|path| path.display().to_string()).unwrap_or_default();
    for key in &diagnostics.unknown_keys {
        tracing::warn!(target: "contrail.cli", config = %origin, key = %key, "unknown config key");
    }
    for warning in &diagnostics.warnings {
        tracing::warn!(target: "contrail.cli", config = %origin, "{warning}");
    }
    if !diagnostics.is_ok() {
        let messages: Vec<String> = diagnostics.errors.iter().map(ToString::to_string).collect();
        bail!("invalid config {origin}: {}", messages.join("; "));
    }
    Ok(())
}

struct Input {
    /// Source text for Java input, used to turn spans into positions.
    text: Option<String>,
    methods: Vec<Method>,
    parse_errors: Vec<ParseError>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MethodsJson {
    Many(Vec<Method>),
    One(Box<Method>),
}

fn load_input(path: &Path) -> Result<Input> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    if path.extension().is_some_and(|ext| ext == "json") {
        let parsed: MethodsJson = serde_json::from_str(&text).with_context(|| {
            format!("{} is not a serialized method or method list", path.display())
        })?;
        let methods = match parsed {
            MethodsJson::Many(methods) => methods,
            MethodsJson::One(method) => vec![*method],
        };
        for method in &methods {
            if let Some(body) = &method.body {
                body.validate()
                    .with_context(|| format!("invalid body for `{}`", method.signature()))?;
            }
        }
        return Ok(Input {
            text: None,
            methods,
            parse_errors: Vec::new(),
        });
    }

    let (unit, parse_errors) = contrail_syntax::parse(&text).into_parts();
    let methods = contrail_hir::lower_compilation_unit(&unit);
    tracing::debug!(
        target: "contrail.cli",
        path = %path.display(),
        methods = methods.len(),
        errors = parse_errors.len(),
        "parsed source"
    );
    Ok(Input {
        text: Some(text),
        methods,
        parse_errors,
    })
}

/// 1-based line and column (in chars) of a byte offset.
fn line_col(text: &str, offset: usize) -> (usize, usize) {
    let before = text.get(..offset.min(text.len())).unwrap_or(text);
    let line = before.matches('\n').count() + 1;
    let column = before
        .rsplit('\n')
        .next()
        .map_or(0, |last| last.chars().count())
        + 1;
    (line, column)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{out}");
    Ok(())
}
