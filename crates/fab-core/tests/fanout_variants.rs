//! Pruebas de fan-out: variantes paralelas con selección explícita por
//! métrica.

use serde_json::json;
use std::path::Path;
use std::sync::Arc;

use fab_core::{evaluate_variants, BuildContext, Config, ConfigBuilder, ConfigSchema, DesignState, FlowError,
               InMemoryEventStore, InMemoryRunStore, Objective, RawConfig, Step, StepContext, StepError,
               StepOutcome, Variant};
use fab_domain::DesignFormat;

#[derive(Debug)]
struct PlaceWithDensity {
    density: f64,
    fail: bool,
}

impl Step for PlaceWithDensity {
    fn id(&self) -> &str {
        "global_placement"
    }

    fn inputs(&self) -> &[DesignFormat] {
        &[]
    }

    fn outputs(&self) -> &[DesignFormat] {
        &[DesignFormat::Def]
    }

    fn run(&self, ctx: &StepContext, _input: &DesignState) -> Result<StepOutcome, StepError> {
        if self.fail {
            return Err(StepError::Internal("placer diverged".to_string()));
        }
        let path = ctx.step_dir().join("spm.def");
        std::fs::write(&path, "DESIGN spm ;\n").map_err(|e| StepError::io(self.id(), e))?;
        // la congestión sintética crece con la densidad
        Ok(StepOutcome::new().with_view(DesignFormat::Def, path)
                             .with_metric("place__congestion", json!(self.density * 10.0)))
    }
}

fn shared_config() -> Arc<Config> {
    let mut schema = ConfigSchema::new();
    schema.extend("flow", ConfigSchema::universal()).unwrap();
    let builder = ConfigBuilder::new(schema, BuildContext::new("/designs/spm", "sky130A", "sky130_fd_sc_hd"));
    let raw = RawConfig::from_value(json!({"DESIGN_NAME": "spm"}), Path::new("<test>")).unwrap();
    builder.build(raw).unwrap().into_shared()
}

#[test]
fn best_variant_is_selected_by_metric() {
    let run = tempfile::tempdir().unwrap();
    let base = InMemoryRunStore::new(run.path());

    let variants = vec![Variant::new("dense",
                                     vec![Box::new(PlaceWithDensity { density: 0.7, fail: false })
                                              as Box<dyn Step>]),
                        Variant::new("sparse",
                                     vec![Box::new(PlaceWithDensity { density: 0.4, fail: false })
                                              as Box<dyn Step>])];

    let (winner, state) = evaluate_variants(shared_config(),
                                            &DesignState::new(),
                                            variants,
                                            "place__congestion",
                                            Objective::Minimize,
                                            |name| Ok((InMemoryEventStore::default(), base.branch(name))))
        .unwrap();

    assert_eq!(winner, "sparse");
    assert_eq!(state.metric("place__congestion"), Some(&json!(4.0)));
    // cada variante corrió bajo su propio namespace del run directory
    assert!(run.path().join("sparse/01-global-placement/state_out.json").is_file());
    assert!(run.path().join("dense/01-global-placement/state_out.json").is_file());
}

#[test]
fn failed_variants_do_not_win() {
    let run = tempfile::tempdir().unwrap();
    let base = InMemoryRunStore::new(run.path());

    let variants = vec![Variant::new("broken",
                                     vec![Box::new(PlaceWithDensity { density: 0.1, fail: true })
                                              as Box<dyn Step>]),
                        Variant::new("ok",
                                     vec![Box::new(PlaceWithDensity { density: 0.9, fail: false })
                                              as Box<dyn Step>])];

    let (winner, _) = evaluate_variants(shared_config(),
                                        &DesignState::new(),
                                        variants,
                                        "place__congestion",
                                        Objective::Minimize,
                                        |name| Ok((InMemoryEventStore::default(), base.branch(name))))
        .unwrap();
    assert_eq!(winner, "ok");
}

#[test]
fn fanout_with_no_usable_result_fails() {
    let run = tempfile::tempdir().unwrap();
    let base = InMemoryRunStore::new(run.path());

    let variants = vec![Variant::new("broken",
                                     vec![Box::new(PlaceWithDensity { density: 0.1, fail: true })
                                              as Box<dyn Step>])];

    let err = evaluate_variants(shared_config(),
                                &DesignState::new(),
                                variants,
                                "place__congestion",
                                Objective::Minimize,
                                |name| Ok((InMemoryEventStore::default(), base.branch(name))))
        .unwrap_err();
    assert!(matches!(err, FlowError::FanOut(_)));
}
