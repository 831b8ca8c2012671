use encoding_rs_io::DecodeReaderBytesBuilder;
use log::debug;
use std::fs::File;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::interpreter::Interpreter;
use crate::lexer::Scanner;
use crate::parser::Parser;

pub static HAD_ERROR: AtomicBool = AtomicBool::new(false);
pub static HAD_RUNTIMES: AtomicBool = AtomicBool::new(false);

pub fn run_file(path: &str) {
    let file = File::open(path).expect("Failed to open file");
    // scripts are decoded through a BOM-sniffing reader; malformed byte
    // sequences degrade to replacement characters instead of aborting
    let mut decoder = DecodeReaderBytesBuilder::new()
        .encoding(Some(encoding_rs::UTF_8))
        .build(file);
    let mut source = String::new();
    decoder
        .read_to_string(&mut source)
        .expect("Failed to decode file");

    let mut interpreter = Interpreter::new();
    run(&source, &mut interpreter);

    if HAD_ERROR.load(Ordering::Relaxed) {
        std::process::exit(65);
    }

    if HAD_RUNTIMES.load(Ordering::Relaxed) {
        std::process::exit(70);
    }
}

pub fn run_prompt() {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    // one interpreter for the whole session; its global scope carries
    // bindings from line to line
    let mut interpreter = Interpreter::new();

    loop {
        print!("> ");
        stdout.flush().unwrap();

        let mut line = String::new();
        let bytes_read = stdin.read_line(&mut line).unwrap();

        if bytes_read == 0 {
            break; // EOF or Control-D
        }

        run(&line, &mut interpreter);
        HAD_ERROR.store(false, Ordering::Relaxed);
        HAD_RUNTIMES.store(false, Ordering::Relaxed);
    }
}

fn run(source: &str, interpreter: &mut Interpreter) {
    let mut scanner = Scanner::new(source.to_string());
    let tokens = scanner.scan_tokens();
    debug!("scanned {} tokens", tokens.len());

    let mut parser = Parser::new(tokens.clone());
    let program = parser.parse();
    debug!(
        "parsed {} statements with {} errors",
        program.statements.len(),
        program.errors.len()
    );

    for error in &program.errors {
        eprintln!("{}", error);
        HAD_ERROR.store(true, Ordering::Relaxed);
    }

    // the statements that did parse still run after a parse error
    interpreter.interpret(&program);
}
