//! glyphc - the Glyph compiler CLI.

use std::path::PathBuf;

use clap::Parser;
use glyphc_drv::Config;
use glyphc_gen::TargetKind;
use tracing_subscriber::EnvFilter;

/// Glyph compiler: compiles one source file to a native executable or a
/// wasm32 object linked with wasm-ld.
#[derive(Parser, Debug)]
#[command(name = "glyphc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compiler for the Glyph language", long_about = None)]
struct Cli {
    /// Input source file (.gly, or .gsx for the S-expression surface)
    input: PathBuf,

    /// Output path (default: a.out, or out.wasm with --wasm)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Optimization level
    #[arg(short = 'O', default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=3))]
    opt_level: u8,

    /// Target wasm32-unknown-unknown instead of the native host
    #[arg(long)]
    wasm: bool,

    /// Dump the verified LLVM IR to stderr
    #[arg(long)]
    emit_ir: bool,

    /// Do not auto-load the std prelude
    #[arg(long)]
    no_std: bool,

    /// Print the macro-expanded source and exit
    #[arg(long)]
    dump_expanded: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config {
        input: cli.input,
        output: cli.output,
        opt_level: cli.opt_level,
        target: if cli.wasm {
            TargetKind::Wasm32
        } else {
            TargetKind::Native
        },
        emit_ir: cli.emit_ir,
        no_std_prelude: cli.no_std,
        dump_expanded: cli.dump_expanded,
    };

    if let Err(err) = glyphc_drv::compile(&config) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
