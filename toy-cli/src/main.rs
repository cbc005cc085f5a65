use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs;
use std::path::PathBuf;
use toy_compiler::{compile, parse, printer, CompileOptions, RedeclarationPolicy};

#[derive(Parser)]
#[command(name = "toyc")]
#[command(about = "Compiles Toy source to SSA IR")]
struct Args {
    /// Path to the source file to compile
    file: Option<PathBuf>,

    /// Pretty-print the parsed program
    #[arg(long)]
    ast: bool,

    /// Print the generated IR (the default when --ast is not given)
    #[arg(long)]
    ir: bool,

    /// Name of the emitted module
    #[arg(long, default_value = "Toy")]
    module_name: String,

    /// Rebind a redeclared name to fresh storage instead of failing
    #[arg(long)]
    allow_redeclaration: bool,
}

const DEFAULT_SAMPLE: &str = r#"
int x;
int y;
x = 5;
y = 6;
if (x > 7) {
    y = 6 * x + y;
} else {
    y = y - 1;
}
while (x < 10) {
    x = x + 1;
}
"#;

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Compilation error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let src = match &args.file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading '{}'", path.display()))?,
        None => DEFAULT_SAMPLE.to_string(),
    };

    let options = CompileOptions {
        module_name: args.module_name,
        redeclaration: if args.allow_redeclaration {
            RedeclarationPolicy::Overwrite
        } else {
            RedeclarationPolicy::Reject
        },
    };

    let unit = parse(&src)?;
    info!("parsed {} top-level statements", unit.statements.len());

    if args.ast {
        print!("{}", printer::print_node(&unit));
    }

    if args.ir || !args.ast {
        let module = compile(&unit, &options)?;
        for line in module.to_lines() {
            println!("{line}");
        }
    }
    Ok(())
}
