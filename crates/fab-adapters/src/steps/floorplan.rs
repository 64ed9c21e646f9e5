//! Inicialización de floorplan con OpenROAD.

use serde_json::json;

use fab_core::{write_script, DesignState, Step, StepContext, StepError, StepOutcome, Variable, VariableType};
use fab_domain::DesignFormat;

use crate::invocation::{checksum_artifact, expect_artifact, openroad_bin_variable, tool_command};

#[derive(Debug, Clone, Copy)]
pub struct FloorplanStep;

impl Step for FloorplanStep {
    fn id(&self) -> &str {
        "floorplan"
    }

    fn inputs(&self) -> &[DesignFormat] {
        &[DesignFormat::Netlist]
    }

    fn outputs(&self) -> &[DesignFormat] {
        &[DesignFormat::Def, DesignFormat::Odb]
    }

    fn variables(&self) -> Vec<Variable> {
        vec![Variable::new("FP_CORE_UTIL", VariableType::Number).with_default(50.0)
                                                                .describe("Core utilization percentage"),
             Variable::new("FP_ASPECT_RATIO", VariableType::Number).with_default(1.0)
                                                                   .describe("Core height / width ratio"),
             openroad_bin_variable()]
    }

    fn run(&self, ctx: &StepContext, input: &DesignState) -> Result<StepOutcome, StepError> {
        let cfg = ctx.config();
        let design = cfg.str("DESIGN_NAME").unwrap_or("design").to_string();
        let netlist = input.path_of(DesignFormat::Netlist)
                           .ok_or(StepError::MissingInput { step: self.id().to_string(),
                                                            format: DesignFormat::Netlist })?;
        let util = cfg.number("FP_CORE_UTIL").unwrap_or(50.0);
        let aspect = cfg.number("FP_ASPECT_RATIO").unwrap_or(1.0);

        let def = ctx.step_dir().join(format!("{design}.def"));
        let odb = ctx.step_dir().join(format!("{design}.odb"));
        let script = format!("read_verilog {}\nlink_design {design}\n\
                              initialize_floorplan -utilization {util} -aspect_ratio {aspect}\n\
                              write_def {}\nwrite_db {}\n",
                             netlist.display(),
                             def.display(),
                             odb.display());
        let script_path = write_script(ctx.step_dir(), "floorplan.tcl", &script)
            .map_err(|e| StepError::from_exec(self.id(), e))?;

        let bin = cfg.str("OPENROAD_BIN").unwrap_or("openroad");
        tool_command(ctx, bin).arg("-exit")
                              .arg(script_path.display().to_string())
                              .log_stem("openroad-floorplan")
                              .run()
                              .map_err(|e| StepError::from_exec(self.id(), e))?;

        expect_artifact(self.id(), &def)?;
        expect_artifact(self.id(), &odb)?;
        let digest = checksum_artifact(self.id(), &def)?;

        Ok(StepOutcome::new().with_view(DesignFormat::Def, def)
                             .with_view(DesignFormat::Odb, odb)
                             .with_metric("floorplan__core_util", json!(util))
                             .with_metric("floorplan__def_sha256", json!(digest)))
    }
}
