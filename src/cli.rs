use std::{env, fs, path::Path, process};

use walkdir::WalkDir;

use plume_lang::builtins::Builtins;
use plume_lang::error::LangError;
use plume_lang::interpreter::{Environment, Interpreter, Value};
use plume_lang::lexer::Lexer;
use plume_lang::parser::Parser;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = &args[1];
    let result = match command.as_str() {
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        "version" | "--version" | "-v" => {
            print_version();
            Ok(())
        }
        "run" => {
            if args.len() < 3 {
                eprintln!("Error: 'run' command requires a file argument");
                eprintln!("Usage: plume run <file.plm>");
                process::exit(1);
            }
            run_command(&args[2])
        }
        "tokens" => {
            if args.len() < 3 {
                eprintln!("Error: 'tokens' command requires a file argument");
                eprintln!("Usage: plume tokens <file.plm>");
                process::exit(1);
            }
            tokens_command(&args[2])
        }
        "check" => {
            if args.len() < 3 {
                eprintln!("Error: 'check' command requires a path argument");
                eprintln!("Usage: plume check <file-or-directory>");
                process::exit(1);
            }
            check_command(&args[2])
        }
        _ => {
            eprintln!("Error: Unknown command '{}'", command);
            print_usage();
            process::exit(1);
        }
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

fn print_usage() {
    eprintln!("plume language tool");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  plume run <file.plm>     Run a plume program");
    eprintln!("  plume tokens <file.plm>  Dump the token stream");
    eprintln!("  plume check <path>       Parse-check every .plm file under a path");
    eprintln!("  plume help               Show this help message");
    eprintln!("  plume version            Show version information");
}

fn print_version() {
    println!("plume {}", env!("CARGO_PKG_VERSION"));
}

fn run_command(file: &str) -> Result<(), LangError> {
    let source_path = Path::new(file);
    let source = fs::read_to_string(source_path)?;

    let tokens = Lexer::new(&source).tokenize();
    let mut parser = Parser::new(tokens);
    let program = parser.parse_program();
    let parse_errors = parser.take_errors();
    for err in &parse_errors {
        eprintln!("{}: {}", file, err);
    }

    // Host-provided bindings available to the script.
    let globals = Environment::new(None);
    globals.define(
        "__file__".to_string(),
        Value::str_from(&source_path.display().to_string()),
    );
    let dir = source_path
        .parent()
        .map(|parent| parent.display().to_string())
        .unwrap_or_default();
    globals.define("__dir__".to_string(), Value::str_from(&dir));

    let interpreter = Interpreter::with_globals(Builtins::core(), globals);
    interpreter.run(&program)?;

    // Valid statements already ran; a parse diagnostic still fails the
    // invocation.
    if !parse_errors.is_empty() {
        process::exit(1);
    }
    Ok(())
}

fn tokens_command(file: &str) -> Result<(), LangError> {
    let source = fs::read_to_string(file)?;
    for token in Lexer::new(&source).tokenize() {
        println!(
            "{}:{}\t{:?}\t{:?}",
            token.line, token.column, token.kind, token.lexeme
        );
    }
    Ok(())
}

fn check_command(path: &str) -> Result<(), LangError> {
    let root = Path::new(path);
    let mut checked = 0usize;
    let mut failures = 0usize;

    let files: Vec<_> = if root.is_dir() {
        WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry.file_type().is_file()
                    && entry.path().extension().map(|ext| ext == "plm").unwrap_or(false)
            })
            .map(|entry| entry.into_path())
            .collect()
    } else {
        vec![root.to_path_buf()]
    };

    for file in files {
        let source = fs::read_to_string(&file)?;
        let tokens = Lexer::new(&source).tokenize();
        let mut parser = Parser::new(tokens);
        let _ = parser.parse_program();
        checked += 1;
        for err in parser.errors() {
            eprintln!("{}: {}", file.display(), err);
        }
        if !parser.errors().is_empty() {
            failures += 1;
        }
    }

    println!("checked {} file(s), {} with errors", checked, failures);
    if failures > 0 {
        process::exit(1);
    }
    Ok(())
}
