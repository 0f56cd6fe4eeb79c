use clap::Parser;
use color_print::cprintln;
use std::{fs::File, io::Write, process::ExitCode};
use tracing_subscriber::EnvFilter;

use lcasm::{
    emit::{listing, write_hex, SymbolMap},
    preprocess::to_text,
    Error,
};

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {author}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

#[derive(Debug, Parser)]
#[clap(author, version, about, help_template = HELP_TEMPLATE)]
struct Args {
    /// Input file
    #[clap(default_value = "main.s")]
    input: String,

    /// Output file [default: <input>.bin]
    #[clap(short, long)]
    output: Option<String>,

    /// Also write the preprocessed program to <input>.pre
    #[clap(short, long)]
    pre: bool,

    /// Write the resolved symbol map as YAML
    #[clap(short, long, value_name = "PATH")]
    symbols: Option<String>,

    /// Dump assembled code
    #[clap(short, long)]
    dump: bool,

    /// Debug logging (RUST_LOG overrides)
    #[clap(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            err.print_fatal();
            ExitCode::FAILURE
        }
    }
}

/// Returns false when the source had errors and nothing was written.
fn run(args: &Args) -> Result<bool, Error> {
    println!("LC2200 Assembler");
    println!("----------------------------------------------------");

    println!("1. Read File");
    println!("  < {}", args.input);
    let source = std::fs::read_to_string(&args.input).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
            Error::FileOpen(args.input.clone(), e)
        }
        _ => Error::FileRead(args.input.clone(), e),
    })?;

    println!("2. Preprocess, Collect Symbols & Resolve Addresses");
    let asm = lcasm::assemble(&source);
    println!("  - {} instructions", asm.tokens.len());
    println!("  - found #{} symbols", asm.symbols.len());

    for diag in &asm.diags {
        diag.print(&args.input);
    }

    if args.dump {
        println!("{}", listing(&asm.tokens, &asm.image));
    }

    if asm.has_error() {
        let count = asm.diags.iter().filter(|d| d.is_error()).count();
        cprintln!("<red,bold>error</>: aborting due to {} previous error(s)", count);
        return Ok(false);
    }

    println!("3. Output");
    if args.pre {
        let path = format!("{}.pre", args.input);
        println!("  > {}", path);
        write_file(&path, to_text(&asm.pre).as_bytes())?;
    }

    if let Some(path) = &args.symbols {
        println!("  > {}", path);
        let yaml = SymbolMap::generate(&asm.symbols).to_yaml()?;
        write_file(path, yaml.as_bytes())?;
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| format!("{}.bin", args.input));
    println!("  > {}", output);
    let mut file = File::create(&output).map_err(|e| Error::FileCreate(output.clone(), e))?;
    write_hex(&mut file, &asm.image).map_err(|e| Error::FileWrite(output.clone(), e))?;

    println!("----------------------------------------------------");
    println!("{} words written", asm.image.len());
    Ok(true)
}

fn write_file(path: &str, contents: &[u8]) -> Result<(), Error> {
    let mut file = File::create(path).map_err(|e| Error::FileCreate(path.to_string(), e))?;
    file.write_all(contents)
        .map_err(|e| Error::FileWrite(path.to_string(), e))
}
