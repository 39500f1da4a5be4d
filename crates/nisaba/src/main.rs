//! Nisaba - A CSS linter
//!
//! Usage: nisaba [OPTIONS] <FILE>...

use std::env;
use std::fs;
use std::process::ExitCode;

use log::debug;

use nisaba_lint::{Engine, Severity};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// What the command line asked for
enum Command {
    Help,
    Version,
    ListRules,
    Lint(LintOptions),
}

struct LintOptions {
    format: String,
    rules: Option<Vec<String>>,
    quiet: bool,
    files: Vec<String>,
}

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("nisaba");

    let command = match parse_args(&args[1.min(args.len())..]) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage(program);
            return ExitCode::FAILURE;
        }
    };

    let engine = Engine::with_defaults();

    match command {
        Command::Help => {
            print_usage(program);
            ExitCode::SUCCESS
        }
        Command::Version => {
            println!("Nisaba {}", VERSION);
            ExitCode::SUCCESS
        }
        Command::ListRules => {
            for rule in engine.rules() {
                println!("{}: {}", rule.id(), rule.meta().desc);
            }
            ExitCode::SUCCESS
        }
        Command::Lint(options) => match run_lint(&engine, &options) {
            Ok(true) => ExitCode::SUCCESS,
            Ok(false) => ExitCode::FAILURE,
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    let mut options = LintOptions {
        format: "text".to_string(),
        rules: None,
        quiet: false,
        files: Vec::new(),
    };

    for arg in args {
        match arg.as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--version" | "-V" => return Ok(Command::Version),
            "--list-rules" => return Ok(Command::ListRules),
            "--quiet" | "-q" => options.quiet = true,
            flag if flag.starts_with("--format=") => {
                options.format = flag["--format=".len()..].to_string();
            }
            flag if flag.starts_with("--rules=") => {
                let ids = flag["--rules=".len()..]
                    .split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(String::from)
                    .collect();
                options.rules = Some(ids);
            }
            flag if flag.starts_with('-') && flag.len() > 1 => {
                return Err(format!("unknown option '{}'", flag));
            }
            file => options.files.push(file.to_string()),
        }
    }

    if options.files.is_empty() {
        return Err("no input files".to_string());
    }
    Ok(Command::Lint(options))
}

/// Lint every file and print the report. Returns whether all files were
/// read and free of errors.
fn run_lint(engine: &Engine, options: &LintOptions) -> Result<bool, String> {
    let formatter = engine
        .get_formatter(&options.format)
        .ok_or_else(|| format!("unknown format '{}'", options.format))?;

    let selection: Option<Vec<&str>> =
        options.rules.as_ref().map(|ids| ids.iter().map(String::as_str).collect());
    if let Some(ids) = &selection {
        engine.check_selection(ids).map_err(|e| e.to_string())?;
    }

    let mut clean = true;
    print!("{}", formatter.start_format());

    for file in &options.files {
        let text = match fs::read_to_string(file) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("nisaba: could not read {}: {}", file, e);
                clean = false;
                continue;
            }
        };

        let result = engine.verify(&text, selection.as_deref());
        debug!(
            "{}: {} errors, {} warnings",
            file,
            result.count(Severity::Error),
            result.count(Severity::Warning)
        );
        if result.has_errors() {
            clean = false;
        }
        if options.quiet && result.messages.is_empty() {
            continue;
        }

        let output = formatter
            .format_results(&result, file)
            .map_err(|e| e.to_string())?;
        print!("{}", output);
    }

    println!("{}", formatter.end_format());
    Ok(clean)
}

fn print_usage(program: &str) {
    println!(
        r#"Nisaba {} - A CSS linter

USAGE:
    {} [OPTIONS] <FILE>...

OPTIONS:
    -h, --help           Print this help message
    -V, --version        Print version information
    --format=<ID>        Output format: text, compact, lint-xml, csslint-xml,
                         checkstyle-xml or json (default: text)
    --rules=<ID,...>     Only run the given rules (parse errors are always reported)
    --list-rules         List the available rules
    -q, --quiet          Only print files that have messages

EXAMPLES:
    {} style.css
    {} --format=compact --rules=ids,important css/*.css
"#,
        VERSION, program, program, program
    );
}
