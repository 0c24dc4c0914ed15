use clap::{Arg, ArgAction, ArgMatches, Command};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::path::Path;
use tracing::{debug, Level};

use tinymoe::formatting::{render, Identity, Terminal};
use tinymoe::lowering;
use tinymoe::parsing::{self, Program};
use tinymoe::problem::{
    concise_loading_error, concise_lowering_error, concise_parsing_error, full_parsing_error,
};

fn main() {
    const VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

    let filename = || {
        Arg::new("filename")
            .required(true)
            .help("The file containing the Tinymoe program.")
    };

    let matches = Command::new("tinymoe")
        .version(VERSION)
        .propagate_version(true)
        .about("The Tinymoe grammar engine.")
        .disable_help_subcommand(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log what the parser is doing."),
        )
        .arg(
            Arg::new("trace")
                .long("trace")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log every grammar symbol the parser tries to match."),
        )
        .subcommand(
            Command::new("check")
                .about("Parse the given program and report any problems")
                .arg(
                    Arg::new("concise")
                        .long("concise")
                        .action(ArgAction::SetTrue)
                        .help("Report each problem on a single line."),
                )
                .arg(filename()),
        )
        .subcommand(
            Command::new("dump")
                .about("Print each statement of the given program as it was parsed")
                .arg(
                    Arg::new("code")
                        .long("code")
                        .action(ArgAction::SetTrue)
                        .help("Print statements as source code rather than as expression trees."),
                )
                .arg(
                    Arg::new("raw-control-chars")
                        .short('R')
                        .long("raw-control-chars")
                        .action(ArgAction::SetTrue)
                        .help("Emit ANSI escape codes for syntax highlighting even if output is redirected to a pipe or file."),
                )
                .arg(filename()),
        )
        .subcommand(
            Command::new("lower")
                .about("Translate the given program into continuation passing form")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the lowered declaration as JSON."),
                )
                .arg(filename()),
        )
        .get_matches();

    let level = if matches.get_flag("trace") {
        Level::TRACE
    } else if matches.get_flag("verbose") {
        Level::DEBUG
    } else {
        Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let code = match matches.subcommand() {
        Some(("check", submatches)) => check(submatches),
        Some(("dump", submatches)) => dump(submatches),
        Some(("lower", submatches)) => lower(submatches),
        Some(_) => {
            println!("No valid subcommand was used");
            1
        }
        None => {
            println!("usage: tinymoe [COMMAND] ...");
            println!("Try '--help' for more information.");
            0
        }
    };

    std::process::exit(code);
}

/// Load and parse the named file, reporting any problems on stderr.
fn read(submatches: &ArgMatches, concise: bool) -> Result<Program, i32> {
    let filename = match submatches.get_one::<String>("filename") {
        Some(filename) => Path::new(filename),
        None => return Err(1),
    };
    debug!(?filename);

    let content = match parsing::load(filename) {
        Ok(content) => content,
        Err(error) => {
            eprintln!("{}", concise_loading_error(&error));
            return Err(1);
        }
    };

    match parsing::parse(filename, &content) {
        Ok(program) => Ok(program),
        Err(errors) => {
            let renderer = Terminal;
            for error in &errors {
                if concise {
                    eprintln!(
                        "{}",
                        concise_parsing_error(error, filename, &content, &renderer)
                    );
                } else {
                    eprintln!(
                        "{}\n",
                        full_parsing_error(error, filename, &content, &renderer)
                    );
                }
            }
            Err(1)
        }
    }
}

fn check(submatches: &ArgMatches) -> i32 {
    let concise = submatches.get_flag("concise");
    match read(submatches, concise) {
        Ok(program) => {
            let count = program
                .statements
                .len();
            println!(
                "{} {} statement{}",
                "ok".bright_green(),
                count,
                if count == 1 { "" } else { "s" }
            );
            0
        }
        Err(code) => code,
    }
}

fn dump(submatches: &ArgMatches) -> i32 {
    let program = match read(submatches, true) {
        Ok(program) => program,
        Err(code) => return code,
    };

    let raw = submatches.get_flag("raw-control-chars");
    let colour = raw || std::io::stdout().is_terminal();

    for statement in &program.statements {
        let text = if !submatches.get_flag("code") {
            statement
                .expression
                .to_log()
        } else if colour {
            render(&Terminal, &statement.expression)
        } else {
            render(&Identity, &statement.expression)
        };
        println!("{:4}  {}", statement.row + 1, text);
    }
    0
}

fn lower(submatches: &ArgMatches) -> i32 {
    let program = match read(submatches, true) {
        Ok(program) => program,
        Err(code) => return code,
    };

    let declaration = match lowering::lower(&program) {
        Ok(declaration) => declaration,
        Err(error) => {
            let filename = submatches
                .get_one::<String>("filename")
                .map(String::as_str)
                .unwrap_or("-");
            eprintln!("{}", concise_lowering_error(&error, Path::new(filename)));
            return 1;
        }
    };

    if submatches.get_flag("json") {
        match serde_json::to_string_pretty(&declaration) {
            Ok(json) => println!("{}", json),
            Err(error) => {
                eprintln!("{}: {}", "error".bright_red(), error);
                return 1;
            }
        }
    } else {
        println!("{}", declaration);
    }
    0
}
