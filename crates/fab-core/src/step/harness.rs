//! Wrapper fijo de ejecución de steps.
//!
//! `execute_step` es la única puerta de entrada: valida el contrato de
//! entrada, materializa el sandbox, persiste el slice de configuración y el
//! estado consumido, invoca la transformación interna y valida el contrato de
//! salida antes de devolver el estado nuevo. Ningún fallo se suprime: todo
//! propaga al flow como `StepError` tipado.

use serde::Serialize;
use std::path::Path;

use crate::constants::{CONFIG_SLICE_FILE, METRICS_FRAGMENT_FILE, STATE_IN_FILE, STATE_OUT_FILE};
use crate::errors::StepError;
use crate::model::{DesignState, StateView};
use crate::step::{Step, StepContext};

/// Ejecuta `step` bajo el contrato completo y devuelve el estado de salida.
pub fn execute_step(step: &dyn Step, ctx: &StepContext, input: &DesignState) -> Result<DesignState, StepError> {
    validate_inputs(step, input)?;

    std::fs::create_dir_all(ctx.step_dir()).map_err(|e| StepError::io(step.id(), e))?;
    persist_json(step.id(), &ctx.step_dir().join(CONFIG_SLICE_FILE), &consumed_slice(step, ctx))?;
    persist_json(step.id(), &ctx.step_dir().join(STATE_IN_FILE), input)?;

    log::info!("step '{}' running in {}", step.id(), ctx.step_dir().display());
    let outcome = step.run(ctx, input)?;

    let (views, metrics) = outcome.into_parts();
    for format in views.keys() {
        if !step.outputs().contains(format) {
            return Err(StepError::OutputContract { step: step.id().to_string(),
                                                   detail: format!("view '{format}' is not a declared output") });
        }
    }

    persist_json(step.id(), &ctx.step_dir().join(METRICS_FRAGMENT_FILE), &metrics)?;
    let output = input.derive(views).with_metrics(metrics);
    persist_json(step.id(), &ctx.step_dir().join(STATE_OUT_FILE), &output)?;
    log::info!("step '{}' finished", step.id());
    Ok(output)
}

/// Toda dependencia declarada debe existir en el estado con la forma correcta
/// y apuntar a rutas presentes en disco.
fn validate_inputs(step: &dyn Step, input: &DesignState) -> Result<(), StepError> {
    for format in step.inputs() {
        match input.view(*format) {
            None => {
                return Err(StepError::MissingInput { step: step.id().to_string(), format: *format });
            }
            Some(StateView::Path(p)) => {
                if !p.exists() {
                    return Err(StepError::InvalidInput { step: step.id().to_string(),
                                                         format: *format,
                                                         detail: format!("{} does not exist", p.display()) });
                }
            }
            Some(StateView::Group(group)) => {
                for (tag, p) in group {
                    if !p.exists() {
                        return Err(StepError::InvalidInput { step: step.id().to_string(),
                                                             format: *format,
                                                             detail: format!("{tag}: {} does not exist",
                                                                             p.display()) });
                    }
                }
            }
        }
    }
    Ok(())
}

fn consumed_slice(step: &dyn Step, ctx: &StepContext) -> indexmap::IndexMap<String, fab_domain::Value> {
    let vars = step.variables();
    ctx.config().slice(vars.iter().map(|v| v.name.as_str()))
}

fn persist_json<T: Serialize>(step: &str, path: &Path, value: &T) -> Result<(), StepError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| StepError::Io { step: step.to_string(), detail: e.to_string() })?;
    std::fs::write(path, text).map_err(|e| StepError::io(step, e))
}
