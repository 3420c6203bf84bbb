//! # Kestrel
//!
//! Front end and IR lowering core for a small, statically-typed imperative language: lexer,
//! recursive-descent parser, scope builder / type checker, and a reference IR backend.

pub mod ast;
pub mod errors;
pub mod ir;
pub mod lexer;
pub mod operators;
pub mod parser;
pub mod scope;
pub mod sema;
pub mod types;

use std::{path::PathBuf, process::ExitCode};

use clap::Parser as _;
use colored::Colorize as _;

/// Compiles a single source file down to the reference IR and prints it to stdout.
#[derive(clap::Parser)]
#[command(version, about)]
struct Cli {
	/// Path to the source file to compile.
	path: PathBuf,

	/// Print scope/type-check diagnostics as they're produced; repeat (`-vv`) to also print the
	/// token stream.
	#[arg(short = 'v', long, action = clap::ArgAction::Count)]
	verbose: u8,
}

fn main() -> ExitCode {
	let cli = Cli::parse();
	match run(&cli) {
		Ok(rendered) => {
			print!("{rendered}");
			ExitCode::SUCCESS
		}
		Err(report) => {
			eprintln!("{report}");
			ExitCode::FAILURE
		}
	}
}

/// Runs the whole pipeline against `cli.path`, returning the rendered module on success or a
/// fully-formatted diagnostic on failure. File IO failures render as `anyhow`'s default chain;
/// every compile error - lexing included - renders with [`errors::CompileError::render`].
fn run(cli: &Cli) -> anyhow::Result<String> {
	let source = std::fs::read_to_string(&cli.path).map_err(|error| anyhow::anyhow!("could not read '{}': {error}", cli.path.display()))?;
	// Leaked once per process: every `Location` in the tree needs a `&'static str` file name to
	// stay cheap to copy, and this driver only ever compiles the one file passed on the CLI.
	let file_name: &'static str = Box::leak(cli.path.display().to_string().into_boxed_str());

	let tokens = match lexer::tokenize(file_name, &source) {
		Ok(tokens) => tokens,
		Err(error) => anyhow::bail!(error.render(&source)),
	};
	if cli.verbose >= 2 {
		eprintln!("{}", "tokens:".bold().dimmed());
		for token in &tokens {
			eprintln!("  {token:?}");
		}
	}

	let mut tokens = tokens;
	let mut context = parser::Context::new();
	let mut program = match parser::parse(&mut tokens, &mut context) {
		Ok(program) => program,
		Err(error) => anyhow::bail!(error.render(&source)),
	};

	let mut arena = scope::DeclContextArena::new();
	sema::builtins::install(&mut arena, &mut context.types);
	if let Err(error) = sema::check_program(&mut program, &mut arena, &mut context.types) {
		anyhow::bail!(error.render(&source));
	}
	if cli.verbose >= 1 {
		eprintln!("{}", "scope and type checking succeeded".bold().green());
	}

	let backend = match ir::lower_program(&program, &context.types) {
		Ok(backend) => backend,
		Err(error) => anyhow::bail!(error.render(&source)),
	};

	Ok(backend.module.to_string())
}
