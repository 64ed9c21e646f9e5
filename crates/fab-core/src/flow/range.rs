//! Selección de rango: qué subconjunto de steps se ejecuta.
//!
//! Los steps fuera del rango no desaparecen: el secuenciador reutiliza su
//! salida persistida (si existe) al pasar sobre ellos, de modo que una corrida
//! "desde el step 3" sembrada con el checkpoint de una corrida "hasta antes
//! del 3" produce el mismo estado final que una corrida completa.

use crate::errors::FlowError;
use crate::step::Step;

/// Selector de step por identidad o por ordinal (base 0).
#[derive(Debug, Clone, PartialEq)]
pub enum StepSelector {
    Id(String),
    Ordinal(usize),
}

impl From<&str> for StepSelector {
    fn from(id: &str) -> Self {
        StepSelector::Id(id.to_string())
    }
}

impl From<usize> for StepSelector {
    fn from(ordinal: usize) -> Self {
        StepSelector::Ordinal(ordinal)
    }
}

/// Rango de ejecución declarativo.
#[derive(Debug, Clone, Default)]
pub struct FlowRange {
    from: Option<StepSelector>,
    to_exclusive: Option<StepSelector>,
    only: Option<StepSelector>,
    skip: Vec<StepSelector>,
}

impl FlowRange {
    /// Rango completo: todos los steps se ejecutan.
    pub fn full() -> Self {
        Self::default()
    }

    /// Primer step (inclusive) a ejecutar.
    pub fn start_from(mut self, sel: impl Into<StepSelector>) -> Self {
        self.from = Some(sel.into());
        self
    }

    /// Step (exclusive) donde detenerse.
    pub fn stop_before(mut self, sel: impl Into<StepSelector>) -> Self {
        self.to_exclusive = Some(sel.into());
        self
    }

    /// Ejecutar únicamente este step.
    pub fn only(mut self, sel: impl Into<StepSelector>) -> Self {
        self.only = Some(sel.into());
        self
    }

    /// Excluir este step (componible con el resto del rango).
    pub fn skip(mut self, sel: impl Into<StepSelector>) -> Self {
        self.skip.push(sel.into());
        self
    }

    /// Máscara de ejecución sobre la lista ordenada de steps.
    pub(crate) fn executed_mask(&self, steps: &[Box<dyn Step>]) -> Result<Vec<bool>, FlowError> {
        let resolve = |sel: &StepSelector| -> Result<usize, FlowError> {
            match sel {
                StepSelector::Ordinal(i) if *i < steps.len() => Ok(*i),
                StepSelector::Ordinal(i) => Err(FlowError::UnknownStep(i.to_string())),
                StepSelector::Id(id) => steps.iter()
                                             .position(|s| s.id() == id)
                                             .ok_or_else(|| FlowError::UnknownStep(id.clone())),
            }
        };

        let mut mask = vec![true; steps.len()];
        if let Some(sel) = &self.only {
            if self.from.is_some() || self.to_exclusive.is_some() {
                return Err(FlowError::InvalidRange("'only' cannot combine with from/stop-before".to_string()));
            }
            let idx = resolve(sel)?;
            mask = vec![false; steps.len()];
            mask[idx] = true;
        } else {
            if let Some(sel) = &self.from {
                let from = resolve(sel)?;
                for slot in mask.iter_mut().take(from) {
                    *slot = false;
                }
            }
            if let Some(sel) = &self.to_exclusive {
                let to = resolve(sel)?;
                for slot in mask.iter_mut().skip(to) {
                    *slot = false;
                }
            }
            if let (Some(f), Some(t)) = (&self.from, &self.to_exclusive) {
                if resolve(f)? >= resolve(t)? {
                    return Err(FlowError::InvalidRange("start-from is at or after stop-before".to_string()));
                }
            }
        }
        for sel in &self.skip {
            mask[resolve(sel)?] = false;
        }
        Ok(mask)
    }
}
