//! slate-drv - Driver for the Slate interpreter.
//!
//! The driver orchestrates the pipeline (read source, lex, parse,
//! evaluate), renders diagnostics, and owns the two front doors:
//!
//! - `slate <file>` runs a program and exits 0 on success, 1 on any
//!   lexical, syntactic or runtime error;
//! - `slate` with no file starts the interactive shell, which keeps one
//!   environment across inputs and ends on `exit`.
//!
//! `--emit-tokens` and `--emit-ast` stop the pipeline after the named
//! phase and dump its output, which is handy when a program parses in a
//! surprising way.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::debug;

use slate_eval::{Evaluator, Value};
use slate_lex::tokenize;
use slate_par::parse;
use slate_util::Diagnostic;

/// Command-line interface of the `slate` binary.
#[derive(Debug, Parser)]
#[command(
    name = "slate",
    version,
    about = "Interpreter for the Slate pseudocode language"
)]
pub struct Cli {
    /// Source file to run; omit to start the interactive shell.
    pub file: Option<PathBuf>,

    /// Dump the token stream and stop.
    #[arg(long)]
    pub emit_tokens: bool,

    /// Dump the parsed AST and stop.
    #[arg(long)]
    pub emit_ast: bool,

    /// Enable debug logging of the pipeline phases.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Entry point for the `slate` binary.
pub fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    simple_logger::SimpleLogger::new()
        .with_level(level)
        .init()
        .context("failed to initialise logging")?;

    let exit_code = match &cli.file {
        Some(path) => run_file(path, &cli)?,
        None => repl()?,
    };

    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}

/// Runs a source file through the pipeline; returns the process exit code.
fn run_file(path: &Path, cli: &Cli) -> Result<i32> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("could not read file '{}'", path.display()))?;
    let origin = path.display().to_string();

    if cli.emit_tokens || cli.emit_ast {
        return emit(&source, &origin, cli);
    }

    let mut session = Session::new();
    match session.run(&source, &origin) {
        Ok(_) => Ok(0),
        Err(message) => {
            eprintln!("{}", message);
            Ok(1)
        }
    }
}

/// Handles `--emit-tokens` / `--emit-ast`.
fn emit(source: &str, origin: &str, cli: &Cli) -> Result<i32> {
    let tokens = match tokenize(source) {
        Ok(tokens) => tokens,
        Err(e) => {
            eprintln!("{}", Diagnostic::error(e.to_string(), e.span()).render(source, origin));
            return Ok(1);
        }
    };

    if cli.emit_tokens {
        for token in &tokens {
            println!("{:?}", token);
        }
        return Ok(0);
    }

    match parse(tokens) {
        Ok(program) => {
            println!("{:#?}", program);
            Ok(0)
        }
        Err(e) => {
            eprintln!("{}", Diagnostic::error(e.to_string(), e.span()).render(source, origin));
            Ok(1)
        }
    }
}

/// The interactive shell: one [`Session`] shared across inputs.
///
/// Errors are printed and the environment survives them; non-null
/// results of expression lines are echoed.
fn repl() -> Result<i32> {
    let mut session = Session::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();

    loop {
        write!(stdout, ">>> ")?;
        stdout.flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input == "exit" {
            break;
        }
        if input.is_empty() {
            continue;
        }

        match session.run(input, "<repl>") {
            Ok(Value::Null) => {}
            Ok(value) => println!("{}", value),
            Err(message) => eprintln!("{}", message),
        }
    }

    Ok(0)
}

/// A pipeline session: the evaluator plus the plumbing to run source
/// text through lexing, parsing and evaluation with rendered errors.
pub struct Session {
    evaluator: Evaluator,
}

impl Session {
    /// Creates a session evaluating against the process's stdin/stdout.
    pub fn new() -> Self {
        Self {
            evaluator: Evaluator::new(),
        }
    }

    /// Runs one source text to completion.
    ///
    /// On failure the returned string is the fully rendered diagnostic:
    /// lex and parse errors point into the source, runtime errors are
    /// reported by message alone (the evaluator works on the tree, not
    /// on source positions).
    pub fn run(&mut self, source: &str, origin: &str) -> Result<Value, String> {
        let tokens = tokenize(source)
            .map_err(|e| Diagnostic::error(e.to_string(), e.span()).render(source, origin))?;
        debug!("lexed {} token(s)", tokens.len());

        let program = parse(tokens)
            .map_err(|e| Diagnostic::error(e.to_string(), e.span()).render(source, origin))?;
        debug!("parsed {} top-level statement(s)", program.body.len());

        let value = self
            .evaluator
            .eval_program(&program)
            .map_err(|e| e.to_string())?;
        debug!("program finished with {}", value);
        Ok(value)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
