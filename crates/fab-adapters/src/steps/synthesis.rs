//! Síntesis lógica con yosys.
//!
//! Genera un script `.ys` en el sandbox, invoca yosys y publica el netlist.
//! Las métricas salen del bloque `stat -json` capturado en el log.

use serde_json::json;

use fab_core::{write_script, DesignState, Step, StepContext, StepError, StepOutcome, Variable, VariableType};
use fab_domain::DesignFormat;

use crate::invocation::{checksum_artifact, expect_artifact, tool_command};
use crate::metrics::parse_yosys_stats;

#[derive(Debug, Clone, Copy)]
pub struct SynthesisStep;

impl SynthesisStep {
    fn script(&self, ctx: &StepContext, netlist: &std::path::Path) -> Result<String, StepError> {
        let cfg = ctx.config();
        let design = cfg.str("DESIGN_NAME").unwrap_or("design");
        let files = cfg.paths("VERILOG_FILES").unwrap_or_default();
        if files.is_empty() {
            return Err(StepError::InvalidInput { step: self.id().to_string(),
                                                 format: DesignFormat::Rtl,
                                                 detail: "VERILOG_FILES resolved to an empty list".to_string() });
        }
        let mut script = String::new();
        for file in files {
            script.push_str(&format!("read_verilog {}\n", file.display()));
        }
        script.push_str(&format!("synth -top {design}\n"));
        script.push_str(&format!("write_verilog -noattr {}\n", netlist.display()));
        script.push_str("stat -json\n");
        Ok(script)
    }
}

impl Step for SynthesisStep {
    fn id(&self) -> &str {
        "synthesis"
    }

    fn inputs(&self) -> &[DesignFormat] {
        &[]
    }

    fn outputs(&self) -> &[DesignFormat] {
        &[DesignFormat::Netlist]
    }

    fn variables(&self) -> Vec<Variable> {
        vec![Variable::new("VERILOG_FILES", VariableType::List(Box::new(VariableType::Path)))
                 .required()
                 .describe("RTL sources, usually a glob:: over the design directory"),
             Variable::new("CLOCK_PERIOD", VariableType::Number).required()
                                                                .describe("Target clock period in ns"),
             Variable::new("SYNTH_STRATEGY", VariableType::Enum(vec!["AREA 0".to_string(),
                                                                    "AREA 1".to_string(),
                                                                    "DELAY 0".to_string(),
                                                                    "DELAY 1".to_string()]))
                 .with_default("AREA 0")
                 .with_alias("STRATEGY")
                 .describe("Optimization bias passed to the synthesis recipe"),
             Variable::new("SYNTH_BIN", VariableType::String).with_default("yosys")
                                                             .describe("Yosys executable to invoke")]
    }

    fn run(&self, ctx: &StepContext, _input: &DesignState) -> Result<StepOutcome, StepError> {
        let cfg = ctx.config();
        let design = cfg.str("DESIGN_NAME").unwrap_or("design").to_string();
        let netlist = ctx.step_dir().join(format!("{design}.{}", DesignFormat::Netlist.extension()));

        let script = self.script(ctx, &netlist)?;
        let script_path = write_script(ctx.step_dir(), "synth.ys", &script)
            .map_err(|e| StepError::from_exec(self.id(), e))?;

        let bin = cfg.str("SYNTH_BIN").unwrap_or("yosys");
        let period = cfg.number("CLOCK_PERIOD").unwrap_or(10.0);
        let strategy = cfg.str("SYNTH_STRATEGY").unwrap_or("AREA 0");
        let output = tool_command(ctx, bin).arg("-s")
                                           .arg(script_path.display().to_string())
                                           .env("CLOCK_PERIOD", period.to_string())
                                           .env("SYNTH_STRATEGY", strategy)
                                           .log_stem("yosys")
                                           .run()
                                           .map_err(|e| StepError::from_exec(self.id(), e))?;

        expect_artifact(self.id(), &netlist)?;
        let digest = checksum_artifact(self.id(), &netlist)?;

        let log_text = std::fs::read_to_string(&output.stdout_log).map_err(|e| StepError::io(self.id(), e))?;
        let mut outcome = StepOutcome::new().with_view(DesignFormat::Netlist, netlist)
                                            .with_metric("synthesis__netlist_sha256", json!(digest))
                                            .with_metric("synthesis__runtime_secs",
                                                         json!(output.duration.as_secs_f64()));
        for (name, value) in parse_yosys_stats(&log_text) {
            outcome = outcome.with_metric(name, value);
        }
        Ok(outcome)
    }
}
