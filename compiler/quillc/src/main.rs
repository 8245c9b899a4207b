//! Quill CLI
//!
//! Inspect how the incremental lexer and parser see an Inform 7 source file.

use quillc::commands::{highlight, lex, parse, replay};
use quillc::options::Options;
use quillc::script::parse_script;
use quillc::{init_tracing, CliError};

fn main() {
    init_tracing();
    let args: Vec<String> = std::env::args().collect();

    let Some(command) = args.get(1) else {
        print_usage();
        return;
    };

    match command.as_str() {
        "help" | "--help" | "-h" => print_usage(),
        "version" | "--version" | "-v" => {
            println!("Quill {}", env!("CARGO_PKG_VERSION"));
        }
        _ => {
            if let Err(error) = run(command, &args[2..]) {
                eprintln!("error: {error}");
                if matches!(error, CliError::Usage(_) | CliError::UnknownOption(_)) {
                    eprintln!();
                    print_usage();
                }
                std::process::exit(1);
            }
        }
    }
}

fn run(command: &str, args: &[String]) -> Result<(), CliError> {
    let options = Options::parse(args)?;
    let source = |index: usize, name: &str| -> Result<String, CliError> {
        let path = options.positional(index, name)?;
        std::fs::read_to_string(path).map_err(|error| CliError::read(path, error))
    };

    let lines = match command {
        "lex" => lex(&source(0, "file")?, options.config)?,
        "highlight" => highlight(&source(0, "file")?, options.config)?,
        "parse" => parse(&source(0, "file")?, options.config)?,
        "replay" => {
            let steps = parse_script(&source(1, "edit script")?)?;
            replay(&source(0, "file")?, &steps, options.config)?
        }
        _ => return Err(CliError::Usage(format!("unknown command: {command}"))),
    };
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

fn print_usage() {
    println!("Quill (incremental Inform 7 lexing and parsing)");
    println!();
    println!("Usage: quill <command> [options]");
    println!();
    println!("Commands:");
    println!("  lex <file>              Dump tokens with their lexical states");
    println!("  highlight <file>        Dump highlight runs");
    println!("  parse <file>            Dump complete matches under the core grammar");
    println!("  replay <file> <script>  Apply an edit script and print what changed");
    println!("  help                    Show this help message");
    println!("  version                 Show version information");
    println!();
    println!("Options:");
    println!("  --highlights=<level>    Highlight codes to report: all (default), basic");
    println!("  --stats                 Report derivation statistics");
    println!();
    println!("Edit scripts hold one edit per line:");
    println!("  +<index> <text>         Insert text before a codepoint");
    println!("  -<lo> <hi>              Remove codepoints lo..hi");
    println!();
    println!("Environment:");
    println!("  RUST_LOG, QUILL_LOG     Tracing filter, e.g. quill_parse=debug");
    println!("  QUILL_LOG_TREE=1        Show nested spans as a tree");
}
