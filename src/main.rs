use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser as ClapParser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use finch::error::{Diagnostics, ExecutionError};
use finch::treewalk;
use finch::treewalk::stmt::print_program;
use finch::Interpreter;

const EXIT_STATIC_ERROR: u8 = 65;
const EXIT_RUNTIME_ERROR: u8 = 70;
const EXIT_IO_ERROR: u8 = 74;

#[derive(ClapParser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Config {
    #[clap(help = "Script to run; starts the interactive prompt when omitted")]
    pub script: Option<PathBuf>,

    #[clap(long, help = "Print the parsed program instead of running it")]
    pub ast: bool,

    #[clap(short, long, help = "Print verbose log output")]
    pub verbose: bool,
}

fn main() -> ExitCode {
    let config = Config::parse();
    init_tracing(config.verbose);

    match &config.script {
        Some(path) => run_file(path, config.ast),
        None => run_prompt(config.ast),
    }
}

// Logs go to stderr so they never interleave with program output.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        return;
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(true).with_level(true))
        .with(filter)
        .init();
}

fn run_file(path: &Path, print_ast: bool) -> ExitCode {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(error) => {
            eprintln!("Cannot read file {}: {error}", path.display());
            return ExitCode::from(EXIT_IO_ERROR);
        }
    };

    if print_ast {
        return dump_ast(&contents);
    }

    let mut output_writer = io::stdout().lock();
    let mut interpreter = Interpreter::new(&mut output_writer);
    match treewalk::execute(&contents, &mut interpreter) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            display_error(&error);
            match error {
                ExecutionError::Static(_) => ExitCode::from(EXIT_STATIC_ERROR),
                ExecutionError::Runtime(_) => ExitCode::from(EXIT_RUNTIME_ERROR),
            }
        }
    }
}

fn run_prompt(print_ast: bool) -> ExitCode {
    let stdin = io::stdin();
    let mut output_writer = io::stdout();
    let mut interpreter = Interpreter::new(&mut output_writer);
    let mut buffer = String::new();

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            return ExitCode::from(EXIT_IO_ERROR);
        }

        buffer.clear();
        match stdin.lock().read_line(&mut buffer) {
            Ok(0) => return ExitCode::SUCCESS,
            Ok(_) => {}
            Err(_) => return ExitCode::from(EXIT_IO_ERROR),
        }

        if print_ast {
            dump_ast(&buffer);
        } else if let Err(error) = treewalk::execute(&buffer, &mut interpreter) {
            display_error(&error);
        }
    }
}

fn dump_ast(code: &str) -> ExitCode {
    let mut diagnostics = Diagnostics::new();
    let statements = treewalk::parse_source(code, &mut diagnostics);
    for error in diagnostics.errors() {
        eprintln!("{error}");
    }
    println!("{}", print_program(&statements));

    if diagnostics.had_error() {
        ExitCode::from(EXIT_STATIC_ERROR)
    } else {
        ExitCode::SUCCESS
    }
}

fn display_error(error: &ExecutionError) {
    eprintln!("{error}");
}
