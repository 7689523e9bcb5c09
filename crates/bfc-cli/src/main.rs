use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{IsTerminal, Read, Write};
use std::path::{Path, PathBuf};

use bfc::diagnostics::Level;
use bfc::{Backend, CompileOptions, Diagnostic, EofPolicy, Interpreter, Program};

#[derive(Parser)]
#[command(name = "bfc")]
#[command(about = "Optimizing compiler for Brainfuck programs")]
struct Cli {
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto, help = "Color diagnostics")]
    color: ColorChoice,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Color when stderr is a terminal and `NO_COLOR` is unset.
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    /// Configure `colored` and report whether diagnostics should be styled.
    fn apply(self) -> bool {
        let enabled = match self {
            ColorChoice::Auto => {
                std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
            }
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        };
        colored::control::set_override(enabled);
        enabled
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize a program and emit LLVM IR.
    Compile {
        #[arg(help = "Input program")]
        input: PathBuf,

        #[arg(short, long, help = "Output file (defaults to <name>.ll)")]
        output: Option<PathBuf>,

        #[arg(long, help = "Print the optimized IR to stdout")]
        dump_ir: bool,

        #[command(flatten)]
        tape: TapeArgs,
    },
    /// Optimize a program and interpret it, reading stdin and writing stdout.
    Run {
        #[arg(help = "Input program")]
        input: PathBuf,

        #[arg(long, help = "Read program input from this file instead of stdin")]
        input_file: Option<PathBuf>,

        #[command(flatten)]
        tape: TapeArgs,
    },
}

#[derive(Args)]
struct TapeArgs {
    #[arg(long, default_value_t = bfc::config::DEFAULT_TAPE_SIZE, help = "Number of tape cells")]
    tape_size: usize,

    #[arg(
        long,
        default_value_t = EofPolicy::Unchanged,
        value_parser = parse_eof,
        help = "What ',' stores at end of input: unchanged, zero or max"
    )]
    eof: EofPolicy,
}

impl TapeArgs {
    fn options(&self) -> CompileOptions {
        CompileOptions {
            tape_size: self.tape_size,
            eof: self.eof,
            ..CompileOptions::default()
        }
    }
}

fn parse_eof(s: &str) -> std::result::Result<EofPolicy, String> {
    s.parse().map_err(|e: bfc::Error| e.to_string())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let color = cli.color.apply();

    match cli.command {
        Commands::Compile {
            input,
            output,
            dump_ir,
            tape,
        } => {
            let options = tape.options();
            let program = load_program(&input, &options, color)?;
            if dump_ir {
                print!("{program}");
            }

            let output = output.unwrap_or_else(|| PathBuf::from(output_name(&input)));
            let ir = lower_to_llvm(program, &options, &input)?;
            fs::write(&output, &ir)
                .with_context(|| format!("Failed to write output to {}", output.display()))?;
            eprintln!("Compiled {} -> {}", input.display(), output.display());
        }
        Commands::Run {
            input,
            input_file,
            tape,
        } => {
            let options = tape.options();
            let program = load_program(&input, &options, color)?;

            let stdin_bytes = match input_file {
                Some(path) => {
                    fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?
                }
                None => {
                    let mut buf = Vec::new();
                    std::io::stdin()
                        .read_to_end(&mut buf)
                        .context("Failed to read stdin")?;
                    buf
                }
            };

            let execution = Interpreter::new(options)
                .lower(program)?
                .run(&stdin_bytes)?;
            tracing::debug!(steps = execution.steps, "program finished");

            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(&execution.output)
                .and_then(|()| stdout.flush())
                .context("Failed to write program output")?;
        }
    }

    Ok(())
}

/// Read, parse and optimize a source file, rendering syntax errors against it.
fn load_program(path: &Path, options: &CompileOptions, color: bool) -> Result<Program> {
    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path.display().to_string();

    match bfc::compile(&source, options) {
        Ok(program) => {
            if program.is_empty() {
                let warning = Diagnostic {
                    level: Level::Warning,
                    filename,
                    message: "program has no effect".into(),
                    span: None,
                    source: None,
                    color,
                };
                eprintln!("{warning}");
            }
            Ok(program)
        }
        Err(bfc::Error::Syntax(error)) => {
            eprintln!(
                "{}",
                Diagnostic::from_syntax_error(&error, &filename, &source).with_color(color)
            );
            anyhow::bail!("Compilation failed")
        }
        Err(e) => Err(e).context("Compilation failed"),
    }
}

#[cfg(feature = "llvm")]
fn lower_to_llvm(program: Program, options: &CompileOptions, input: &Path) -> Result<String> {
    let module_name = input
        .file_stem()
        .map_or_else(|| "program".into(), |s| s.to_string_lossy().into_owned());
    bfc::codegen::LlvmBackend::new(options.clone(), module_name)
        .lower(program)
        .context("LLVM lowering failed")
}

#[cfg(not(feature = "llvm"))]
fn lower_to_llvm(_program: Program, _options: &CompileOptions, _input: &Path) -> Result<String> {
    anyhow::bail!("bfc was built without the `llvm` feature; rebuild with `--features llvm`")
}

/// `../foo/bar/baz.bf` -> `baz.ll`; a trailing `.b` or `.bf` is dropped.
fn output_name(input: &Path) -> String {
    let file_name = input
        .file_name()
        .map_or_else(String::new, |f| f.to_string_lossy().into_owned());
    let stem = file_name
        .strip_suffix(".bf")
        .or_else(|| file_name.strip_suffix(".b"))
        .unwrap_or(&file_name);
    format!("{stem}.ll")
}
