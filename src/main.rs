use std::env;

use log::LevelFilter;
use monkey_interpreter::runner::{run_file, run_prompt};
use simple_logger::SimpleLogger;

pub fn main() -> std::io::Result<()> {
    SimpleLogger::new()
        .with_level(LevelFilter::Warn)
        .env()
        .init()
        .expect("Failed to initialize logging");

    let args: Vec<String> = env::args().collect();
    // args always includes the program name in args[0]
    match args.len() {
        1 => {
            run_prompt();
        }
        2 => {
            run_file(&args[1]);
        }
        _ => {
            println!("Usage: monkey [script]");
            std::process::exit(64);
        }
    }
    Ok(())
}
