//! Placement global con OpenROAD.
//!
//! La semilla del placer se fija por configuración: misma configuración y
//! mismo estado de entrada deben reproducir el mismo placement.

use serde_json::json;

use fab_core::{write_script, DesignState, Step, StepContext, StepError, StepOutcome, Variable, VariableType};
use fab_domain::DesignFormat;

use crate::invocation::{checksum_artifact, expect_artifact, openroad_bin_variable, tool_command};

#[derive(Debug, Clone, Copy)]
pub struct PlacementStep;

impl Step for PlacementStep {
    fn id(&self) -> &str {
        "global_placement"
    }

    fn inputs(&self) -> &[DesignFormat] {
        &[DesignFormat::Odb]
    }

    fn outputs(&self) -> &[DesignFormat] {
        &[DesignFormat::Def, DesignFormat::Odb]
    }

    fn variables(&self) -> Vec<Variable> {
        vec![Variable::new("PL_TARGET_DENSITY", VariableType::Number)
                 .with_default(0.55)
                 .describe("Target placement density, 0..1"),
             Variable::new("PL_SEED", VariableType::Number).with_default(42.0)
                                                           .describe("Placer PRNG seed, pinned for determinism"),
             openroad_bin_variable()]
    }

    fn run(&self, ctx: &StepContext, input: &DesignState) -> Result<StepOutcome, StepError> {
        let cfg = ctx.config();
        let design = cfg.str("DESIGN_NAME").unwrap_or("design").to_string();
        let odb_in = input.path_of(DesignFormat::Odb)
                          .ok_or(StepError::MissingInput { step: self.id().to_string(),
                                                           format: DesignFormat::Odb })?;
        let density = cfg.number("PL_TARGET_DENSITY").unwrap_or(0.55);
        let seed = cfg.get("PL_SEED").and_then(fab_domain::Value::as_usize).unwrap_or(42);

        let def = ctx.step_dir().join(format!("{design}.def"));
        let odb = ctx.step_dir().join(format!("{design}.odb"));
        let script = format!("read_db {}\n\
                              global_placement -density {density} -random_seed {seed}\n\
                              write_def {}\nwrite_db {}\n",
                             odb_in.display(),
                             def.display(),
                             odb.display());
        let script_path = write_script(ctx.step_dir(), "placement.tcl", &script)
            .map_err(|e| StepError::from_exec(self.id(), e))?;

        let bin = cfg.str("OPENROAD_BIN").unwrap_or("openroad");
        tool_command(ctx, bin).arg("-exit")
                              .arg(script_path.display().to_string())
                              .log_stem("openroad-placement")
                              .run()
                              .map_err(|e| StepError::from_exec(self.id(), e))?;

        expect_artifact(self.id(), &def)?;
        expect_artifact(self.id(), &odb)?;
        let digest = checksum_artifact(self.id(), &def)?;

        Ok(StepOutcome::new().with_view(DesignFormat::Def, def)
                             .with_view(DesignFormat::Odb, odb)
                             .with_metric("place__target_density", json!(density))
                             .with_metric("place__def_sha256", json!(digest)))
    }
}
