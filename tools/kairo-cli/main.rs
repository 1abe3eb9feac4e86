use clap::{Parser, ValueEnum};
use kairo::prelude::*;
use std::fs;
use std::io::{self, Write};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyCli {
    Paths,
    Dominators,
}

/// Compiles visual-script graphs into C#-style source
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the script JSON file
    script_path: Option<String>,
    /// Optional path to a compiler options JSON file
    #[arg(short, long)]
    options: Option<String>,

    /// Reachability analysis used for value dependencies (overrides the options file)
    #[arg(short, long, value_enum)]
    strategy: Option<StrategyCli>,

    /// Write the generated source to this file instead of stdout
    #[arg(long)]
    out: Option<String>,

    /// Save the compiled script as a binary artifact
    #[arg(long)]
    artifact: Option<String>,

    /// Run in interactive mode to be prompted for inputs
    #[arg(short = 'i', long, help = "Run in interactive 'human' mode")]
    human: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let mut cli = Cli::parse();
    if cli.human {
        prompt_missing(&mut cli);
    }
    run(cli);
}

fn run(cli: Cli) {
    let total_start = Instant::now();

    let script_path = cli
        .script_path
        .unwrap_or_else(|| exit_with_error("A script path is required."));
    let script_json = fs::read_to_string(&script_path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to read script file '{}': {}", script_path, e))
    });
    let script = Script::from_json(&script_json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse script JSON: {}", e)));

    let mut options = match &cli.options {
        Some(path) => {
            let json = fs::read_to_string(path).unwrap_or_else(|e| {
                exit_with_error(&format!("Failed to read options file '{}': {}", path, e))
            });
            CompilerOptions::from_json(&json)
                .unwrap_or_else(|e| exit_with_error(&format!("Invalid options JSON: {}", e)))
        }
        None => CompilerOptions::default(),
    };
    if let Some(strategy) = cli.strategy {
        options.reachability = match strategy {
            StrategyCli::Paths => ReachabilityStrategy::Paths,
            StrategyCli::Dominators => ReachabilityStrategy::Dominators,
        };
    }

    let compile_start = Instant::now();
    let compiler = Compiler::builder(script).with_options(options).build();
    let compiled = compiler.compile();
    let compile_duration = compile_start.elapsed();

    let source = compiled.source(&compiler.printer());
    match &cli.out {
        Some(path) => fs::write(path, &source).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to write source to '{}': {}", path, e))
        }),
        None => println!("{}", source),
    }

    if let Some(path) = &cli.artifact {
        compiled
            .save(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to save artifact: {}", e)));
    }

    eprintln!("\n--- Diagnostics ---");
    for report in &compiled.reports {
        if let Some(error) = &report.error {
            eprintln!("{}: fatal: {}", report.method, error);
        }
        for diagnostic in report.diagnostics.entries() {
            eprintln!("{}: {}", report.method, diagnostic);
        }
    }
    eprintln!(
        "{} error(s), {} warning(s) in {} method(s)",
        compiled.count(Severity::Error),
        compiled.count(Severity::Warning),
        compiled.reports.len()
    );

    eprintln!("\n--- Performance Summary ---");
    eprintln!("Compilation:          {:?}", compile_duration);
    eprintln!("Total Execution:      {:?}", total_start.elapsed());

    if !compiled.is_clean() {
        std::process::exit(2);
    }
}

/// Fills in whatever the command line left out by asking the user.
fn prompt_missing(cli: &mut Cli) {
    println!("--- Kairo Interactive Mode ---");
    if cli.script_path.is_none() {
        cli.script_path = Some(prompt_for_input("Enter script path", Some("script.json")));
    }
    if cli.options.is_none() {
        let path = prompt_for_input("Enter options path (optional)", None);
        cli.options = Some(path).filter(|p| !p.is_empty());
    }
    if cli.strategy.is_none() {
        cli.strategy = loop {
            println!("\nPlease select a reachability analysis:");
            println!("  1: Paths (enumerates every path)");
            println!("  2: Dominators (scales to large graphs)");
            match prompt_for_input("Enter choice", Some("1")).trim() {
                "1" => break Some(StrategyCli::Paths),
                "2" => break Some(StrategyCli::Dominators),
                _ => println!("Invalid choice. Please enter 1 or 2."),
            }
        };
    }
}

fn prompt_for_input(prompt_text: &str, default: Option<&str>) -> String {
    let mut line = String::new();
    let default_prompt = default.map_or("".to_string(), |d| format!(" [default: {}]", d));

    print!("> {}{}: ", prompt_text, default_prompt);
    io::stdout()
        .flush()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to flush stdout: {}", e)));

    io::stdin()
        .read_line(&mut line)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read line: {}", e)));
    let trimmed = line.trim().to_string();

    if trimmed.is_empty() {
        default.unwrap_or("").to_string()
    } else {
        trimmed
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
