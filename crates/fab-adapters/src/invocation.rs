//! Helper compartido de invocación.
//!
//! Los steps no heredan lógica de setup: componen estas funciones. El comando
//! base queda anclado al sandbox con el timeout de la configuración; los
//! artefactos publicados se verifican y se les calcula checksum (sha256) para
//! trazabilidad en métricas.

use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

use fab_core::{StepContext, StepError, ToolCommand, Variable, VariableType};

/// Comando base de una herramienta, anclado al sandbox del step y con el
/// presupuesto de tiempo de la configuración.
pub fn tool_command(ctx: &StepContext, program: &str) -> ToolCommand {
    ToolCommand::new(program, ctx.step_dir()).timeout(ctx.tool_timeout())
}

/// Descriptor compartido del binario de OpenROAD (idéntico en cada step que
/// lo usa, de modo que el esquema agregado lo trate como variable compartida).
pub fn openroad_bin_variable() -> Variable {
    Variable::new("OPENROAD_BIN", VariableType::String).with_default("openroad")
                                                       .describe("OpenROAD executable to invoke")
}

/// Descriptor compartido del binario de magic.
pub fn magic_bin_variable() -> Variable {
    Variable::new("MAGIC_BIN", VariableType::String).with_default("magic")
                                                    .describe("Magic executable to invoke")
}

/// Verifica que la herramienta haya producido el artefacto prometido.
pub fn expect_artifact(step: &str, path: &Path) -> Result<(), StepError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(StepError::Io { step: step.to_string(),
                            detail: format!("tool did not produce expected artifact {}", path.display()) })
    }
}

/// Checksum sha256 (hex) de un artefacto publicado.
pub fn checksum_artifact(step: &str, path: &Path) -> Result<String, StepError> {
    let mut file = std::fs::File::open(path).map_err(|e| StepError::io(step, e))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf).map_err(|e| StepError::io(step, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_is_stable_for_identical_content() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a.gds");
        let b = tmp.path().join("b.gds");
        std::fs::write(&a, b"stream").unwrap();
        std::fs::write(&b, b"stream").unwrap();
        assert_eq!(checksum_artifact("t", &a).unwrap(), checksum_artifact("t", &b).unwrap());
    }

    #[test]
    fn missing_artifact_is_reported_with_its_path() {
        let tmp = tempfile::tempdir().unwrap();
        let err = expect_artifact("routing", &tmp.path().join("spm.def")).unwrap_err();
        assert!(matches!(err, StepError::Io { .. }));
        assert!(err.to_string().contains("spm.def"));
    }
}
