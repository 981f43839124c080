//! External linker invocation.
//!
//! The emitted object is handed to the system C compiler (native) or
//! `wasm-ld` (wasm32). The wasm link is freestanding: no entry point, all
//! exports kept, undefined externs become imports, 1 MiB initial / 16 MiB
//! max memory.

use std::path::Path;
use std::process::Command;

use crate::error::{CodeGenError, Result};
use crate::TargetKind;

pub struct Linker {
    target: TargetKind,
}

impl Linker {
    pub fn new(target: TargetKind) -> Self {
        Self { target }
    }

    /// Link `object` into `output`. The object file is left in place; the
    /// caller removes it once the link succeeds.
    pub fn link(&self, object: &Path, output: &Path) -> Result<()> {
        let mut cmd = match self.target {
            TargetKind::Native => {
                let mut cmd = Command::new("cc");
                cmd.arg(object).arg("-o").arg(output).arg("-lc").arg("-lm");
                cmd
            },
            TargetKind::Wasm32 => {
                let mut cmd = Command::new("wasm-ld");
                cmd.arg(object)
                    .arg("-o")
                    .arg(output)
                    .arg("--no-entry")
                    .arg("--export-all")
                    .arg("--allow-undefined")
                    .arg("--initial-memory=1048576")
                    .arg("--max-memory=16777216");
                cmd
            },
        };

        let status = cmd
            .status()
            .map_err(|e| CodeGenError::Link(format!("cannot run linker: {}", e)))?;
        if !status.success() {
            return Err(CodeGenError::Link(format!(
                "linker exited with {}",
                status.code().unwrap_or(-1)
            )));
        }
        Ok(())
    }
}
