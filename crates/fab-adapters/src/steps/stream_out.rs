//! Stream-out GDSII con magic.

use serde_json::json;

use fab_core::{write_script, DesignState, Step, StepContext, StepError, StepOutcome, Variable};
use fab_domain::DesignFormat;

use crate::invocation::{checksum_artifact, expect_artifact, magic_bin_variable, tool_command};

#[derive(Debug, Clone, Copy)]
pub struct StreamOutStep;

impl Step for StreamOutStep {
    fn id(&self) -> &str {
        "stream_out"
    }

    fn inputs(&self) -> &[DesignFormat] {
        &[DesignFormat::Def]
    }

    fn outputs(&self) -> &[DesignFormat] {
        &[DesignFormat::Gds]
    }

    fn variables(&self) -> Vec<Variable> {
        vec![magic_bin_variable()]
    }

    fn run(&self, ctx: &StepContext, input: &DesignState) -> Result<StepOutcome, StepError> {
        let cfg = ctx.config();
        let design = cfg.str("DESIGN_NAME").unwrap_or("design").to_string();
        let def = input.path_of(DesignFormat::Def)
                       .ok_or(StepError::MissingInput { step: self.id().to_string(),
                                                        format: DesignFormat::Def })?;

        let gds = ctx.step_dir().join(format!("{design}.gds"));
        let script = format!("drc off\ndef read {}\nselect top cell\ngds write {}\nquit -noprompt\n",
                             def.display(),
                             gds.display());
        let script_path = write_script(ctx.step_dir(), "stream_out.tcl", &script)
            .map_err(|e| StepError::from_exec(self.id(), e))?;

        let bin = cfg.str("MAGIC_BIN").unwrap_or("magic");
        tool_command(ctx, bin).arg("-dnull")
                              .arg("-noconsole")
                              .arg(script_path.display().to_string())
                              .log_stem("magic-stream-out")
                              .run()
                              .map_err(|e| StepError::from_exec(self.id(), e))?;

        expect_artifact(self.id(), &gds)?;
        let digest = checksum_artifact(self.id(), &gds)?;

        Ok(StepOutcome::new().with_view(DesignFormat::Gds, gds)
                             .with_metric("stream_out__gds_sha256", json!(digest)))
    }
}
