//! CAIRS example-runner CLI (§6 "External interfaces" — a thin layer over
//! the `cairs` crate: load JSON, build registries, call in, render the
//! result).

mod examples;
mod inputs;

use anyhow::Result;
use cairs::{run_validated, validate_for_layer, RunOptions};
use cairs_ir::ValueEnv;
use cairs_ops::{domains, EffectRegistry};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

/// Run or inspect a CAIRS document.
///
/// Usage: `cairs <path>` to evaluate an example, `cairs list` to enumerate
/// the bundled demos, `cairs validate <path>` to check structure only,
/// `cairs help` for this message. `list`/`validate`/`help` are also
/// reachable as `-l`/`--validate`/`-h` flags on the positional form, since
/// the external contract names both shapes without picking one.
#[derive(Parser, Debug)]
#[command(name = "cairs", version, about)]
struct Cli {
    /// An example path (with or without extension), or one of: list, validate, help.
    target: Option<String>,

    /// A second path, used only by `cairs validate <path>`.
    extra: Option<String>,

    #[arg(short, long)]
    verbose: bool,

    #[arg(short, long)]
    list: bool,

    /// Validate `target` instead of running it.
    #[arg(long)]
    validate: bool,

    /// Render the result value as a small synthesized expression instead of
    /// its raw JSON-ish debug form.
    #[arg(long)]
    synth: bool,

    #[arg(long)]
    inputs: Option<String>,

    #[arg(long)]
    inputs_file: Option<PathBuf>,
}

enum Mode {
    Help,
    List,
    Validate(String),
    Run(String),
}

fn resolve_mode(cli: &Cli) -> Mode {
    match cli.target.as_deref() {
        None => Mode::Help,
        Some("help") => Mode::Help,
        Some("list") => Mode::List,
        Some("validate") => match &cli.extra {
            Some(path) => Mode::Validate(path.clone()),
            None => Mode::Help,
        },
        Some(path) => {
            if cli.list {
                Mode::List
            } else if cli.validate {
                Mode::Validate(path.to_string())
            } else {
                Mode::Run(path.to_string())
            }
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.verbose {
        install_tracing();
    }
    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

fn install_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// `Ok(true)` / `Ok(false)` carry the process's success/failure exit code;
/// `Err` is reserved for host-side failures (bad JSON, missing file) that
/// have nothing to do with the document's own evaluation outcome.
fn run(cli: &Cli) -> Result<bool> {
    match resolve_mode(cli) {
        Mode::Help => {
            print_help();
            Ok(true)
        }
        Mode::List => {
            for name in examples::list()? {
                println!("{name}");
            }
            Ok(true)
        }
        Mode::Validate(path) => {
            let resolved = examples::resolve(&path)?;
            let doc = examples::load(&resolved)?;
            let report = validate_for_layer(&doc);
            if report.valid() {
                println!("valid");
                Ok(true)
            } else {
                for issue in &report.issues {
                    println!("{issue}");
                }
                Ok(false)
            }
        }
        Mode::Run(path) => run_example(cli, &path),
    }
}

fn run_example(cli: &Cli, path: &str) -> Result<bool> {
    let resolved = examples::resolve(path)?;
    let doc = examples::load(&resolved)?;

    let input_env = build_input_env(cli)?;
    let operators = domains::standard();
    let effects = EffectRegistry::standard();
    let options = RunOptions { trace: cli.verbose, ..RunOptions::default() };

    match run_validated(&doc, &operators, &effects, input_env, options) {
        Ok((value, effects_record)) => {
            render_value(&value, cli.synth);
            if cli.verbose && !effects_record.is_empty() {
                eprintln!("({} effect(s) logged)", effects_record.len());
            }
            Ok(!value.is_error())
        }
        Err(e) => {
            eprintln!("{e}");
            Ok(false)
        }
    }
}

fn build_input_env(cli: &Cli) -> Result<Option<ValueEnv>> {
    let parsed = match (&cli.inputs, &cli.inputs_file) {
        (Some(_), Some(_)) => anyhow::bail!("--inputs and --inputs-file are mutually exclusive"),
        (Some(raw), None) => {
            let values = inputs::parse_inputs_arg(raw)?;
            inputs::require_nonempty(&values, "--inputs")?;
            Some(values)
        }
        (None, Some(path)) => {
            let values = inputs::parse_inputs_file(path)?;
            inputs::require_nonempty(&values, "--inputs-file")?;
            Some(values)
        }
        (None, None) => None,
    };
    Ok(parsed.map(|values| ValueEnv::empty().extend("inputs", cairs_ir::Value::list(values))))
}

/// `--synth` is a stand-in for the out-of-scope code synthesizer (§1): it
/// renders the result as a small expression instead of `Value`'s raw
/// `Debug` form, but it does not synthesize Python.
fn render_value(value: &cairs_ir::Value, synth: bool) {
    if synth {
        println!("{}", synth_literal(value));
    } else {
        println!("{value:?}");
    }
}

fn synth_literal(value: &cairs_ir::Value) -> String {
    use cairs_ir::Value;
    match value {
        Value::Bool(b) => b.to_string(),
        Value::Int(n) => n.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Str(s) => format!("{s:?}"),
        Value::Void => "void".to_string(),
        Value::None => "none".to_string(),
        Value::Some(inner) => format!("some({})", synth_literal(inner)),
        Value::List(items) => format!("[{}]", items.iter().map(synth_literal).collect::<Vec<_>>().join(", ")),
        Value::Error(e) => format!("error({:?}{})", e.code, e.message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()),
        other => format!("<{}>", other.kind_name()),
    }
}

fn print_help() {
    println!("cairs - run and validate CAIRS documents\n");
    println!("USAGE:");
    println!("    cairs <path>                 evaluate an example document");
    println!("    cairs list                   list the bundled demo documents");
    println!("    cairs validate <path>        check a document's structure only");
    println!("    cairs help                   show this message\n");
    println!("FLAGS:");
    println!("    -v, --verbose                enable tracing output and effect-count summary");
    println!("    -l, --list                   same as \"cairs list\"");
    println!("        --validate               same as \"cairs validate <path>\", combined with a path");
    println!("        --synth                  render the result as a synthesized expression");
    println!("        --inputs <v>             comma-separated scalars or a JSON array, bound to \"inputs\"");
    println!("        --inputs-file <path>     read a JSON array of inputs from disk");
}
