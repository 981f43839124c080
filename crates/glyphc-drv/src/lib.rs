//! glyphc-drv - compilation pipeline orchestration.
//!
//! One input file at a time: read, preprocess, parse (the parser is picked
//! by file extension), lower to an object file, link, and delete the
//! temporary object. The first error anywhere aborts the pipeline.

use std::path::{Path, PathBuf};

use glyphc_gen::{CodegenOptions, Linker, TargetKind};
use glyphc_par::{ParseConfig, Parser};
use glyphc_util::Diagnostic;
use thiserror::Error;
use tracing::debug;

/// File extension selecting the S-expression front-end.
const SEXPR_EXT: &str = "gsx";

/// One compiler invocation.
#[derive(Clone, Debug)]
pub struct Config {
    /// Input source file.
    pub input: PathBuf,
    /// Output path; defaults to `a.out` (native) or `out.wasm` (wasm).
    pub output: Option<PathBuf>,
    /// Optimization level 0-3.
    pub opt_level: u8,
    pub target: TargetKind,
    /// Dump the verified module IR to stderr.
    pub emit_ir: bool,
    /// Skip the automatic std prelude.
    pub no_std_prelude: bool,
    /// Print the preprocessed source and stop.
    pub dump_expanded: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: None,
            opt_level: 0,
            target: TargetKind::Native,
            emit_ir: false,
            no_std_prelude: false,
            dump_expanded: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("{0}")]
    Diagnostic(#[from] Diagnostic),

    #[error("error: {0}")]
    CodeGen(#[from] glyphc_gen::CodeGenError),

    #[error("error: cannot read '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, DriverError>;

impl Config {
    fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => match self.target {
                TargetKind::Native => PathBuf::from("a.out"),
                TargetKind::Wasm32 => PathBuf::from("out.wasm"),
            },
        }
    }
}

/// Run the whole pipeline for one input file.
pub fn compile(config: &Config) -> Result<()> {
    let raw = std::fs::read_to_string(&config.input).map_err(|e| DriverError::Io {
        path: config.input.clone(),
        source: e,
    })?;

    debug!(input = %config.input.display(), "preprocessing");
    let src = glyphc_pp::preprocess(&raw);

    if config.dump_expanded {
        print!("{}", src);
        return Ok(());
    }

    // the wasm target is freestanding: the libc prelude does not apply
    let parse_config = ParseConfig {
        no_std_prelude: config.no_std_prelude || config.target == TargetKind::Wasm32,
    };

    debug!("parsing");
    let file_name = config.input.display().to_string();
    let program = if has_extension(&config.input, SEXPR_EXT) {
        glyphc_par::sexpr::parse(&src, &file_name, &parse_config)?
    } else {
        let mut parser = Parser::new(&src, &file_name, parse_config)?;
        parser.parse()?
    };

    let output = config.output_path();
    let obj_path = PathBuf::from(format!("{}.o", output.display()));

    debug!(obj = %obj_path.display(), "lowering to object");
    glyphc_gen::emit_object(
        &program,
        &CodegenOptions {
            module_name: file_name,
            obj_path: obj_path.clone(),
            opt_level: config.opt_level,
            target: config.target,
            emit_ir: config.emit_ir,
        },
    )?;

    debug!(output = %output.display(), "linking");
    let linker = Linker::new(config.target);
    let link_result = linker.link(&obj_path, &output);

    // the object is a temporary; keep it only when the link failed
    if link_result.is_ok() {
        let _ = std::fs::remove_file(&obj_path);
    }
    link_result?;

    Ok(())
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(ext)
}
