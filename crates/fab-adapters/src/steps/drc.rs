//! Verificación DRC con magic.
//!
//! Step de chequeo: no publica vistas, sólo métricas. El veredicto queda en
//! `drc__violation_count`; decidir si eso detiene un tapeout es política de
//! quien orquesta, no de este step.

use serde_json::json;

use fab_core::{write_script, DesignState, Step, StepContext, StepError, StepOutcome, Variable};
use fab_domain::DesignFormat;

use crate::invocation::{magic_bin_variable, tool_command};
use crate::metrics::count_drc_violations;

#[derive(Debug, Clone, Copy)]
pub struct DrcStep;

impl Step for DrcStep {
    fn id(&self) -> &str {
        "drc"
    }

    fn inputs(&self) -> &[DesignFormat] {
        &[DesignFormat::Gds]
    }

    fn outputs(&self) -> &[DesignFormat] {
        &[]
    }

    fn variables(&self) -> Vec<Variable> {
        vec![magic_bin_variable()]
    }

    fn run(&self, ctx: &StepContext, input: &DesignState) -> Result<StepOutcome, StepError> {
        let cfg = ctx.config();
        let gds = input.path_of(DesignFormat::Gds)
                       .ok_or(StepError::MissingInput { step: self.id().to_string(),
                                                        format: DesignFormat::Gds })?;

        let report = ctx.step_dir().join("drc.rpt");
        let script = format!("gds read {}\nselect top cell\ndrc euclidean on\ndrc check\n\
                              drc catchup\ndrc count\nset f [open {} w]\nputs $f [drc listall why]\n\
                              close $f\nquit -noprompt\n",
                             gds.display(),
                             report.display());
        let script_path = write_script(ctx.step_dir(), "drc.tcl", &script)
            .map_err(|e| StepError::from_exec(self.id(), e))?;

        let bin = cfg.str("MAGIC_BIN").unwrap_or("magic");
        tool_command(ctx, bin).arg("-dnull")
                              .arg("-noconsole")
                              .arg(script_path.display().to_string())
                              .log_stem("magic-drc")
                              .run()
                              .map_err(|e| StepError::from_exec(self.id(), e))?;

        let report_text = std::fs::read_to_string(&report).unwrap_or_default();
        let violations = count_drc_violations(&report_text);
        if violations > 0 {
            log::warn!("drc reported {violations} violation(s); see {}", report.display());
        }

        Ok(StepOutcome::new().with_metric("drc__violation_count", json!(violations)))
    }
}
