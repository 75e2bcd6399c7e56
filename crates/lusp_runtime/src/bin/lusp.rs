//! lusp CLI entry point.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use lusp_language::{InterpreterBackend, Vm};
use lusp_runtime::{Repl, logging};
use tracing::info;

/// CLI configuration parsed from arguments.
#[derive(Default)]
struct CliConfig {
    files: Vec<PathBuf>,
    eval: Vec<String>,
    batch_mode: bool,
    show_help: bool,
    show_version: bool,
    dump: bool,
    trace_vm: bool,
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError: {e}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<CliConfig, Box<dyn std::error::Error>> {
    let mut config = CliConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => config.show_help = true,
            "-V" | "--version" => config.show_version = true,
            "-b" | "--batch" => config.batch_mode = true,
            "--dump" => config.dump = true,
            "--trace-vm" => config.trace_vm = true,
            "-e" | "--eval" => {
                i += 1;
                if i >= args.len() {
                    return Err("--eval requires a source argument".into());
                }
                config.eval.push(args[i].clone());
            }
            arg if arg.starts_with('-') => {
                return Err(format!("unknown option: {arg}").into());
            }
            path => config.files.push(PathBuf::from(path)),
        }
        i += 1;
    }

    Ok(config)
}

fn run(args: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = parse_args(args)?;

    if config.show_help {
        print_help();
        return Ok(());
    }

    if config.show_version {
        println!("lusp {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    logging::init(config.trace_vm)?;

    let vm = if config.trace_vm {
        info!("VM instruction tracing enabled");
        Vm::with_backend(Rc::new(InterpreterBackend::tracing()))
    } else {
        Vm::new()
    };
    let mut repl = Repl::new()?.with_vm(vm);

    for file in &config.files {
        if config.dump {
            print!("{}", repl.dump_file(file)?);
        } else {
            repl.eval_file(file)?;
        }
    }

    for source in &config.eval {
        if config.dump {
            print!("{}", repl.dump(source)?);
        } else {
            let value = repl.eval(source)?;
            if !value.is_null() {
                println!("{value}");
            }
        }
    }

    // Files, -e sources and --dump are all non-interactive unless asked.
    if config.batch_mode || config.dump || !config.eval.is_empty() {
        return Ok(());
    }

    if !config.files.is_empty() {
        repl = repl.without_banner();
    }

    repl.run()?;
    Ok(())
}

fn print_help() {
    println!(
        "\x1b[1mlusp\x1b[0m - embeddable Scheme-family scripting language

\x1b[1mUSAGE:\x1b[0m
    lusp [OPTIONS] [FILES...]

\x1b[1mARGUMENTS:\x1b[0m
    [FILES...]    Files to evaluate before starting the REPL

\x1b[1mOPTIONS:\x1b[0m
    -h, --help         Print help information
    -V, --version      Print version information
    -e, --eval SRC     Evaluate SRC and print its value (repeatable)
    -b, --batch        Evaluate files and exit (no REPL)
    --dump             Print bytecode listings instead of running
    --trace-vm         Log every dispatched instruction (trace level)

\x1b[1mENVIRONMENT:\x1b[0m
    LUSP_LOG           Log filter, e.g. debug or lusp_language=trace (default: warn)

\x1b[1mEXAMPLES:\x1b[0m
    lusp                          Start interactive REPL
    lusp counter.lsp              Evaluate counter.lsp, then start REPL
    lusp -b test.lsp              Evaluate test.lsp and exit
    lusp -e '1 + 2 * 3'           Print 9
    lusp --dump -e '|a| a + 1'    Show the compiled bytecode

\x1b[1mREPL COMMANDS:\x1b[0m
    :dump SRC            Disassemble SRC
    :quit                Exit REPL
    Ctrl+D               Exit REPL
    Ctrl+C               Cancel current input"
    );
}
