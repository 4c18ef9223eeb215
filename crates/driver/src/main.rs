use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser};

use backend::emit_assembly;
use parse::parse_program;
use sema::analyze;

/// Compiler for a small Pascal-like language, emitting x86-64 assembly on
/// stdout. Exactly one mode flag may be given; the default is to compile.
#[derive(Parser, Debug)]
#[command(
    name = "minipc",
    about = "Mini Pascal-like compiler (x86-64) — emits GNU assembler text",
    version,
    disable_help_flag = true
)]
struct Cli {
    /// Print the AST
    #[arg(short = 'p', group = "mode")]
    print_ast: bool,

    /// Print the AST as a graph (DOT/graphviz)
    #[arg(short = 'g', group = "mode")]
    print_graph: bool,

    /// Print symbol table information
    #[arg(short = 's', group = "mode")]
    print_symtab: bool,

    /// Print the high-level instruction translation
    #[arg(short = 'h', group = "mode")]
    print_hir: bool,

    /// Perform optimization on the emitted assembly
    #[arg(short = 'o', group = "mode")]
    optimize: bool,

    /// Print help (-h prints the HIR, so help is long-form only)
    #[arg(long = "help", action = ArgAction::Help)]
    help: Option<bool>,

    /// Input source file
    input: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("{e}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let filename = cli.input.display().to_string();
    let src = fs::read_to_string(&cli.input)
        .map_err(|_| anyhow!("Could not open input file \"{filename}\""))?;

    let program = parse_program(&filename, &src)?;

    if cli.print_ast {
        print!("{}", parse::print_tree(&program));
        return Ok(());
    }
    if cli.print_graph {
        print!("{}", parse::print_graph(&program));
        return Ok(());
    }

    let tab = analyze(&filename, &program)?;
    if cli.print_symtab {
        print!("{}", tab.render());
        return Ok(());
    }

    let prog = hir::generate(&tab, &program)?;
    if cli.print_hir {
        print!("{}", prog.code);
        return Ok(());
    }

    // -o accepts the flag for compatibility; there is no optimizer pass,
    // so it emits the same assembly as the default mode
    let asm = emit_assembly(&prog)?;
    print!("{asm}");
    Ok(())
}
