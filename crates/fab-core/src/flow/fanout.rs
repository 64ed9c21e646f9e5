//! Fan-out de variantes: sub-flows independientes evaluados en paralelo.
//!
//! Cada variante comparte únicamente la configuración y el estado semilla
//! (ambos inmutables) y corre en su propio store — la disciplina
//! sandbox-por-step hace el paralelismo seguro sin locks. El join es una
//! selección explícita por métrica; nunca memoria mutable compartida.

use dashmap::DashMap;
use rayon::prelude::*;
use std::sync::Arc;

use crate::config::Config;
use crate::errors::{FlowError, StoreError};
use crate::event::EventStore;
use crate::flow::Flow;
use crate::model::DesignState;
use crate::step::Step;
use crate::store::RunStore;

/// Una alternativa a evaluar: nombre estable + su propia secuencia de steps.
pub struct Variant {
    pub name: String,
    pub steps: Vec<Box<dyn Step>>,
}

impl Variant {
    pub fn new(name: impl Into<String>, steps: Vec<Box<dyn Step>>) -> Self {
        Self { name: name.into(), steps }
    }
}

/// Dirección de la selección sobre la métrica objetivo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    Minimize,
    Maximize,
}

/// Corre todas las variantes en paralelo y selecciona la mejor por `metric`.
///
/// Las variantes fallidas se reportan en el log y no participan de la
/// selección; si ninguna produce la métrica, el fan-out completo falla.
/// La selección es determinista: a igualdad de métrica gana el nombre menor.
pub fn evaluate_variants<E, R, F>(config: Arc<Config>,
                                  seed: &DesignState,
                                  variants: Vec<Variant>,
                                  metric: &str,
                                  objective: Objective,
                                  store_factory: F)
                                  -> Result<(String, DesignState), FlowError>
    where E: EventStore + Send,
          R: RunStore + Send,
          F: Fn(&str) -> Result<(E, R), StoreError> + Sync
{
    if variants.is_empty() {
        return Err(FlowError::FanOut("no variants to evaluate".to_string()));
    }

    let results: DashMap<String, Result<DesignState, String>> = DashMap::new();
    variants.into_par_iter().for_each(|variant| {
                               let name = variant.name.clone();
                               let outcome = run_variant(&config, seed, variant, &store_factory);
                               results.insert(name, outcome.map_err(|e| e.to_string()));
                           });

    let mut candidates: Vec<(String, DesignState, f64)> = Vec::new();
    let mut names: Vec<String> = results.iter().map(|e| e.key().clone()).collect();
    names.sort();
    for name in names {
        let entry = results.get(&name).expect("resultado de variante presente");
        match entry.value() {
            Ok(state) => match state.metric(metric).and_then(|v| v.as_f64()) {
                Some(value) => candidates.push((name.clone(), state.clone(), value)),
                None => log::warn!("variant '{name}' finished without metric '{metric}'"),
            },
            Err(detail) => log::warn!("variant '{name}' failed: {detail}"),
        }
    }

    candidates.into_iter()
              .reduce(|best, cand| {
                  let better = match objective {
                      Objective::Minimize => cand.2 < best.2,
                      Objective::Maximize => cand.2 > best.2,
                  };
                  if better { cand } else { best }
              })
              .map(|(name, state, value)| {
                  log::info!("variant '{name}' selected ({metric} = {value})");
                  (name, state)
              })
              .ok_or_else(|| FlowError::FanOut(format!("no variant produced metric '{metric}'")))
}

fn run_variant<E, R, F>(config: &Arc<Config>,
                        seed: &DesignState,
                        variant: Variant,
                        store_factory: &F)
                        -> Result<DesignState, FlowError>
    where E: EventStore,
          R: RunStore,
          F: Fn(&str) -> Result<(E, R), StoreError>
{
    let (events, store) = store_factory(&variant.name)?;
    let mut flow = Flow::new(variant.steps, Arc::clone(config), events, store)?;
    flow.start(Some(seed.clone()))
}
