use std::{env, fs, path::Path, process};

use plume_lang::builtins::Builtins;
use plume_lang::error::LangError;
use plume_lang::interpreter::{Environment, Interpreter, Value};
use plume_lang::lexer::Lexer;
use plume_lang::parser::Parser;

fn main() {
    if let Err(err) = run() {
        eprintln!("{}", err);
        process::exit(1);
    }
}

fn run() -> Result<(), LangError> {
    let path = match env::args().nth(1) {
        Some(arg) => arg,
        None => {
            eprintln!("Usage: plume_lang <source-file>");
            process::exit(1);
        }
    };

    let source_path = Path::new(&path);
    let source = fs::read_to_string(source_path)?;

    let tokens = Lexer::new(&source).tokenize();
    let mut parser = Parser::new(tokens);
    let program = parser.parse_program();
    let had_parse_errors = !parser.errors().is_empty();
    for err in parser.errors() {
        eprintln!("{}: {}", path, err);
    }

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

    if had_parse_errors {
        process::exit(1);
    }
    Ok(())
}
