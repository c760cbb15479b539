use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use treelox::ast_printer::AstPrinter;
use treelox::error::{LoxError, ResolveError};
use treelox::scanner::Scanner;
use treelox::session::{self, Session};

#[derive(ClapParser, Debug)]
#[command(version, about = "Tree-walking Lox interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize { filename: PathBuf },

    /// Parses a program from a file and prints its syntax tree
    Parse {
        filename: PathBuf,

        /// Print the tree as JSON instead of S-expressions
        #[arg(long)]
        json: bool,
    },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: PathBuf },

    /// Runs input from a file as a Lox program
    Run { filename: PathBuf },

    /// Reads and runs programs line by line; `:reset` clears all globals
    Repl,
}

/// Reads the contents of a file into a Vec<u8>
fn read_file(filename: PathBuf) -> Result<Vec<u8>> {
    info!("Reading file: {:?}", filename);
    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("treelox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

/// Prints `err` and exits with its status code.
fn fail(err: LoxError) -> ! {
    debug!("Exiting after error: {}", err);
    eprintln!("{}", err);
    std::process::exit(err.exit_code());
}

fn report_warnings(warnings: &[ResolveError]) {
    for warning in warnings {
        eprintln!("{}", warning);
    }
}

fn repl() -> Result<()> {
    let mut session = Session::new();
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush stdout")?;

        line.clear();
        if stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?
            == 0
        {
            println!();
            break;
        }

        match line.trim() {
            "" => continue,
            ":reset" => {
                session.reset();
                continue;
            }
            _ => {}
        }

        match session.run(line.as_bytes()) {
            Ok(warnings) => report_warnings(&warnings),
            Err(e) => eprintln!("{}", e),
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename } => {
            info!("Running Tokenize subcommand");
            let buf = read_file(filename)?;
            let mut tokenized = true;

            for token in Scanner::new(&buf) {
                match token {
                    Ok(token) => println!("{}", token),
                    Err(e) => {
                        tokenized = false;
                        eprintln!("{}", e);
                    }
                }
            }

            if !tokenized {
                debug!("Tokenization failed, exiting with code 65");
                std::process::exit(65);
            }
        }

        Commands::Parse { filename, json } => {
            info!("Running Parse subcommand");
            let buf = read_file(filename)?;
            let statements = session::parse_program(&buf).unwrap_or_else(|e| fail(e));

            if json {
                let out = serde_json::to_string_pretty(&statements)
                    .context("Failed to serialize syntax tree")?;
                println!("{}", out);
            } else {
                for stmt in &statements {
                    println!("{}", AstPrinter::print_stmt(stmt));
                }
            }
        }

        Commands::Evaluate { filename } => {
            info!("Running Evaluate subcommand");
            let buf = read_file(filename)?;
            let mut session = Session::new();

            match session.evaluate(&buf) {
                Ok(value) => println!("{}", value),
                Err(e) => fail(e),
            }
        }

        Commands::Run { filename } => {
            info!("Running Run subcommand");
            let buf = read_file(filename)?;
            let mut session = Session::new();

            match session.run(&buf) {
                Ok(warnings) => {
                    report_warnings(&warnings);
                    info!("Program executed successfully");
                }
                Err(e) => fail(e),
            }
        }

        Commands::Repl => {
            info!("Starting REPL");
            repl()?;
        }
    }

    Ok(())
}
