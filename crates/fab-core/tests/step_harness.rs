//! Pruebas del wrapper fijo de ejecución: contrato de entrada, sandbox,
//! persistencia y contrato de salida.

use serde_json::json;
use std::path::Path;
use std::sync::Arc;

use fab_core::{execute_step, BuildContext, Config, ConfigBuilder, ConfigSchema, DesignState, RawConfig,
               Step, StepContext, StepError, StepOutcome, Variable, VariableType};
use fab_domain::DesignFormat;

fn test_config() -> Arc<Config> {
    let mut schema = ConfigSchema::new();
    schema.extend("test", vec![Variable::new("CLOCK_PERIOD", VariableType::Number).required()])
          .unwrap();
    let builder = ConfigBuilder::new(schema, BuildContext::new("/designs/spm", "sky130A", "sky130_fd_sc_hd"));
    let raw = RawConfig::from_value(json!({"CLOCK_PERIOD": 10}), Path::new("<test>")).unwrap();
    builder.build(raw).unwrap().into_shared()
}

/// Step de juguete: escribe su netlist en el sandbox y reporta una métrica.
#[derive(Debug)]
struct EmitNetlist {
    declared_outputs: Vec<DesignFormat>,
    emit: DesignFormat,
}

impl EmitNetlist {
    fn well_behaved() -> Self {
        Self { declared_outputs: vec![DesignFormat::Netlist], emit: DesignFormat::Netlist }
    }

    fn contract_breaker() -> Self {
        Self { declared_outputs: vec![DesignFormat::Netlist], emit: DesignFormat::Def }
    }
}

impl Step for EmitNetlist {
    fn id(&self) -> &str {
        "synthesis"
    }

    fn inputs(&self) -> &[DesignFormat] {
        &[]
    }

    fn outputs(&self) -> &[DesignFormat] {
        &self.declared_outputs
    }

    fn variables(&self) -> Vec<Variable> {
        vec![Variable::new("CLOCK_PERIOD", VariableType::Number).required()]
    }

    fn run(&self, ctx: &StepContext, _input: &DesignState) -> Result<StepOutcome, StepError> {
        let path = ctx.step_dir().join("spm.nl.v");
        std::fs::write(&path, "module spm; endmodule\n").map_err(|e| StepError::io(self.id(), e))?;
        Ok(StepOutcome::new().with_view(self.emit, path)
                             .with_metric("synthesis__cell_count", json!(412)))
    }
}

/// Step que exige un netlist de entrada.
#[derive(Debug)]
struct NeedsNetlist;

impl Step for NeedsNetlist {
    fn id(&self) -> &str {
        "floorplan"
    }

    fn inputs(&self) -> &[DesignFormat] {
        &[DesignFormat::Netlist]
    }

    fn outputs(&self) -> &[DesignFormat] {
        &[DesignFormat::Def]
    }

    fn run(&self, ctx: &StepContext, _input: &DesignState) -> Result<StepOutcome, StepError> {
        let path = ctx.step_dir().join("spm.def");
        std::fs::write(&path, "DESIGN spm ;\n").map_err(|e| StepError::io(self.id(), e))?;
        Ok(StepOutcome::new().with_view(DesignFormat::Def, path))
    }
}

#[test]
fn wrapper_persists_slice_and_states_in_the_sandbox() {
    let run = tempfile::tempdir().unwrap();
    let step_dir = run.path().join("01-synthesis");
    let ctx = StepContext::new(test_config(), step_dir.clone(), 0);
    let step = EmitNetlist::well_behaved();

    let out = execute_step(&step, &ctx, &DesignState::new()).unwrap();

    assert!(step_dir.join("config.json").is_file());
    assert!(step_dir.join("state_in.json").is_file());
    assert!(step_dir.join("state_out.json").is_file());

    let slice: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(step_dir.join("config.json")).unwrap()).unwrap();
    assert_eq!(slice, json!({"CLOCK_PERIOD": 10.0}));

    let persisted: DesignState =
        serde_json::from_str(&std::fs::read_to_string(step_dir.join("state_out.json")).unwrap()).unwrap();
    assert_eq!(persisted, out);
    assert_eq!(out.metric("synthesis__cell_count"), Some(&json!(412)));
}

#[test]
fn missing_declared_input_fails_before_running() {
    let run = tempfile::tempdir().unwrap();
    let ctx = StepContext::new(test_config(), run.path().join("02-floorplan"), 1);

    let err = execute_step(&NeedsNetlist, &ctx, &DesignState::new()).unwrap_err();
    assert_eq!(err,
               StepError::MissingInput { step: "floorplan".to_string(), format: DesignFormat::Netlist });
    // el sandbox ni siquiera se crea: la validación va primero
    assert!(!run.path().join("02-floorplan").exists());
}

#[test]
fn dangling_input_path_is_invalid() {
    let run = tempfile::tempdir().unwrap();
    let ctx = StepContext::new(test_config(), run.path().join("02-floorplan"), 1);

    let mut views = indexmap::IndexMap::new();
    views.insert(DesignFormat::Netlist, fab_core::StateView::Path(run.path().join("missing.nl.v")));
    let state = DesignState::from_views(views);

    let err = execute_step(&NeedsNetlist, &ctx, &state).unwrap_err();
    assert!(matches!(err, StepError::InvalidInput { format: DesignFormat::Netlist, .. }));
}

#[test]
fn undeclared_output_view_violates_the_contract() {
    let run = tempfile::tempdir().unwrap();
    let ctx = StepContext::new(test_config(), run.path().join("01-synthesis"), 0);

    let err = execute_step(&EmitNetlist::contract_breaker(), &ctx, &DesignState::new()).unwrap_err();
    assert!(matches!(err, StepError::OutputContract { .. }));
}

#[test]
fn rerun_in_the_same_sandbox_is_idempotent() {
    let run = tempfile::tempdir().unwrap();
    let ctx = StepContext::new(test_config(), run.path().join("01-synthesis"), 0);
    let step = EmitNetlist::well_behaved();

    let first = execute_step(&step, &ctx, &DesignState::new()).unwrap();
    let second = execute_step(&step, &ctx, &DesignState::new()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.fingerprint(), second.fingerprint());
}

#[test]
fn unrelated_views_pass_through_untouched() {
    let run = tempfile::tempdir().unwrap();
    let sdc = run.path().join("base.sdc");
    std::fs::write(&sdc, "create_clock\n").unwrap();

    let mut views = indexmap::IndexMap::new();
    views.insert(DesignFormat::Sdc, fab_core::StateView::Path(sdc.clone()));
    let input = DesignState::from_views(views);

    let ctx = StepContext::new(test_config(), run.path().join("01-synthesis"), 0);
    let out = execute_step(&EmitNetlist::well_behaved(), &ctx, &input).unwrap();

    // la vista ajena sobrevive sin que el step la haya tocado
    assert_eq!(out.path_of(DesignFormat::Sdc), Some(sdc.as_path()));
    assert!(out.path_of(DesignFormat::Netlist).is_some());
}
