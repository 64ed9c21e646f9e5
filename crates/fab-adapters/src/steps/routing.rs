//! Ruteo global y detallado con OpenROAD.
//!
//! `DRT_THREADS` sólo parametriza el paralelismo interno de la herramienta;
//! para el motor ese paralelismo es opaco (observa exit status y archivos).

use serde_json::json;

use fab_core::{write_script, DesignState, Step, StepContext, StepError, StepOutcome, Variable, VariableType};
use fab_domain::DesignFormat;

use crate::invocation::{checksum_artifact, expect_artifact, openroad_bin_variable, tool_command};
use crate::metrics::parse_routing_wirelength;

#[derive(Debug, Clone, Copy)]
pub struct RoutingStep;

impl Step for RoutingStep {
    fn id(&self) -> &str {
        "routing"
    }

    fn inputs(&self) -> &[DesignFormat] {
        &[DesignFormat::Odb]
    }

    fn outputs(&self) -> &[DesignFormat] {
        &[DesignFormat::Def, DesignFormat::Odb]
    }

    fn variables(&self) -> Vec<Variable> {
        vec![Variable::new("GRT_ALLOW_CONGESTION", VariableType::Bool)
                 .with_default(false)
                 .describe("Let global routing finish despite congestion"),
             Variable::new("DRT_THREADS", VariableType::Number)
                 .with_default(0.0)
                 .describe("Detailed router threads; 0 lets the tool decide"),
             openroad_bin_variable()]
    }

    fn run(&self, ctx: &StepContext, input: &DesignState) -> Result<StepOutcome, StepError> {
        let cfg = ctx.config();
        let design = cfg.str("DESIGN_NAME").unwrap_or("design").to_string();
        let odb_in = input.path_of(DesignFormat::Odb)
                          .ok_or(StepError::MissingInput { step: self.id().to_string(),
                                                           format: DesignFormat::Odb })?;
        let allow = cfg.bool("GRT_ALLOW_CONGESTION").unwrap_or(false);
        let threads = cfg.get("DRT_THREADS").and_then(fab_domain::Value::as_usize).unwrap_or(0);

        let def = ctx.step_dir().join(format!("{design}.def"));
        let odb = ctx.step_dir().join(format!("{design}.odb"));
        let grt = if allow { "global_route -allow_congestion\n" } else { "global_route\n" };
        let drt = if threads > 0 {
            format!("detailed_route -num_threads {threads}\n")
        } else {
            "detailed_route\n".to_string()
        };
        let script = format!("read_db {}\n{grt}{drt}write_def {}\nwrite_db {}\n",
                             odb_in.display(),
                             def.display(),
                             odb.display());
        let script_path = write_script(ctx.step_dir(), "routing.tcl", &script)
            .map_err(|e| StepError::from_exec(self.id(), e))?;

        let bin = cfg.str("OPENROAD_BIN").unwrap_or("openroad");
        let output = tool_command(ctx, bin).arg("-exit")
                                           .arg(script_path.display().to_string())
                                           .log_stem("openroad-routing")
                                           .run()
                                           .map_err(|e| StepError::from_exec(self.id(), e))?;

        expect_artifact(self.id(), &def)?;
        expect_artifact(self.id(), &odb)?;
        let digest = checksum_artifact(self.id(), &def)?;

        let mut outcome = StepOutcome::new().with_view(DesignFormat::Def, def)
                                            .with_view(DesignFormat::Odb, odb)
                                            .with_metric("route__def_sha256", json!(digest));
        let log_text = std::fs::read_to_string(&output.stdout_log).unwrap_or_default();
        if let Some(wirelength) = parse_routing_wirelength(&log_text) {
            outcome = outcome.with_metric("route__wirelength_um", json!(wirelength));
        }
        Ok(outcome)
    }
}
