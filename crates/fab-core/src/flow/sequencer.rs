//! El secuenciador de flows.
//!
//! Un `Flow` compone una lista ordenada de steps bajo una configuración,
//! enhebrando el estado de step en step. La única operación que muta la
//! instancia es `advance`: ejecuta (o reutiliza) el siguiente step, fusiona
//! métricas, persiste checkpoint y journal, y mueve el cursor. El step N+1
//! jamás arranca antes de que la salida del N esté persistida.

use indexmap::IndexMap;
use serde_json::{json, Value as Json};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{Config, ConfigSchema};
use crate::constants::ENGINE_VERSION;
use crate::errors::{ConfigError, FlowError};
use crate::event::{EventStore, FlowEvent, FlowEventKind};
use crate::flow::{Checkpoint, FlowRange};
use crate::hashing::hash_value;
use crate::model::DesignState;
use crate::step::{execute_step, Step, StepContext, StepStatus};
use crate::store::RunStore;

/// Motor de ejecución de un flow, genérico sobre journal y store.
#[derive(Debug)]
pub struct Flow<E, R>
    where E: EventStore,
          R: RunStore
{
    run_id: Uuid,
    steps: Vec<Box<dyn Step>>,
    config: Arc<Config>,
    events: E,
    store: R,
    mask: Vec<bool>,
    statuses: Vec<StepStatus>,
    cursor: usize,
    state: DesignState,
    metrics: IndexMap<String, Json>,
    definition_hash: String,
    initialized: bool,
    completed: bool,
}

impl<E, R> Flow<E, R>
    where E: EventStore,
          R: RunStore
{
    /// Crea una instancia lista para correr el rango completo desde el estado
    /// vacío.
    pub fn new(steps: Vec<Box<dyn Step>>, config: Arc<Config>, events: E, store: R) -> Result<Self, FlowError> {
        if steps.is_empty() {
            return Err(FlowError::InvalidRange("flow has no steps".to_string()));
        }
        let definition_hash = definition_hash(&steps);
        let mask = vec![true; steps.len()];
        let statuses = vec![StepStatus::Pending; steps.len()];
        Ok(Self { run_id: Uuid::new_v4(),
                  steps,
                  config,
                  events,
                  store,
                  mask,
                  statuses,
                  cursor: 0,
                  state: DesignState::new(),
                  metrics: IndexMap::new(),
                  definition_hash,
                  initialized: false,
                  completed: false })
    }

    /// Restringe la ejecución a un rango; los steps fuera del rango reutilizan
    /// su salida persistida.
    pub fn with_range(mut self, range: FlowRange) -> Result<Self, FlowError> {
        self.mask = range.executed_mask(&self.steps)?;
        Ok(self)
    }

    /// Siembra cursor y estado desde el checkpoint persistido en el store.
    /// Falla si el checkpoint pertenece a otra definición de flow.
    pub fn resumed(mut self) -> Result<Self, FlowError> {
        let Some(cp) = self.store.load_checkpoint()? else {
            log::warn!("no checkpoint to resume from; starting clean");
            return Ok(self);
        };
        if cp.definition_hash != self.definition_hash {
            return Err(FlowError::CheckpointMismatch { expected: self.definition_hash.clone(),
                                                       found: cp.definition_hash });
        }
        log::info!("resuming at cursor {} from checkpoint", cp.cursor);
        self.cursor = cp.cursor;
        for status in self.statuses.iter_mut().take(cp.cursor) {
            *status = StepStatus::Reused;
        }
        self.state = cp.state;
        Ok(self)
    }

    /// Esquema agregado de un conjunto de steps: descriptores universales más
    /// el slice de cada step, con control de unicidad global.
    pub fn aggregate_schema(steps: &[Box<dyn Step>]) -> Result<ConfigSchema, ConfigError> {
        let mut schema = ConfigSchema::new();
        schema.extend("flow", ConfigSchema::universal())?;
        for step in steps {
            schema.extend(step.id(), step.variables())?;
        }
        Ok(schema)
    }

    /// Corre el rango seleccionado hasta agotarlo y devuelve el estado final.
    /// Ante el primer fallo aborta; lo acumulado hasta el step anterior queda
    /// persistido.
    pub fn start(&mut self, initial: Option<DesignState>) -> Result<DesignState, FlowError> {
        if let Some(seed) = initial {
            self.state = seed;
        }
        loop {
            match self.advance() {
                Ok(()) => {}
                Err(FlowError::Completed) => return Ok(self.state.clone()),
                Err(e) => return Err(e),
            }
        }
    }

    /// La única operación de mutación: procesa el siguiente step pendiente.
    pub fn advance(&mut self) -> Result<(), FlowError> {
        self.ensure_initialized()?;

        if self.completed {
            return Err(FlowError::Completed);
        }
        if self.cursor >= self.steps.len() {
            self.finalize()?;
            return Err(FlowError::Completed);
        }

        let ordinal = self.cursor;
        let step_id = self.steps[ordinal].id().to_string();

        if !self.mask[ordinal] {
            self.reuse_persisted(ordinal, &step_id)?;
            self.cursor += 1;
            self.persist_checkpoint()?;
            return Ok(());
        }

        self.statuses[ordinal] = StepStatus::Running;
        self.events.append_kind(self.run_id,
                                FlowEventKind::StepStarted { ordinal, step_id: step_id.clone() });

        let step_dir = self.store.step_dir(ordinal, &step_id)?;
        let ctx = StepContext::new(Arc::clone(&self.config), step_dir, ordinal);

        match execute_step(self.steps[ordinal].as_ref(), &ctx, &self.state) {
            Ok(next) => {
                for (k, v) in next.metrics() {
                    self.metrics.insert(k.clone(), v.clone());
                }
                self.events.append_kind(self.run_id,
                                        FlowEventKind::StepFinished { ordinal,
                                                                      step_id,
                                                                      state_fingerprint: next.fingerprint() });
                self.statuses[ordinal] = StepStatus::FinishedOk;
                self.state = next;
                self.cursor += 1;
                self.persist_checkpoint()?;
                self.store.save_metrics(&self.metrics)?;
                Ok(())
            }
            Err(error) => {
                self.statuses[ordinal] = StepStatus::Failed;
                self.events.append_kind(self.run_id,
                                        FlowEventKind::StepFailed { ordinal,
                                                                    step_id: step_id.clone(),
                                                                    error: error.clone() });
                Err(FlowError::Step { step: step_id, source: error })
            }
        }
    }

    fn ensure_initialized(&mut self) -> Result<(), FlowError> {
        if self.initialized {
            return Ok(());
        }
        let has_init = self.events
                           .list(self.run_id)
                           .iter()
                           .any(|e| matches!(e.kind, FlowEventKind::FlowInitialized { .. }));
        if !has_init {
            self.events.append_kind(self.run_id,
                                    FlowEventKind::FlowInitialized { definition_hash: self.definition_hash
                                                                                          .clone(),
                                                                     step_count: self.steps.len() });
        }
        self.store.save_resolved_config(&self.config)?;
        self.initialized = true;
        Ok(())
    }

    /// Step fuera de rango: su salida persistida (si existe) se fusiona
    /// conservadoramente con el estado vivo; en conflicto gana el vivo.
    fn reuse_persisted(&mut self, ordinal: usize, step_id: &str) -> Result<(), FlowError> {
        match self.store.load_step_output(ordinal, step_id)? {
            Some(persisted) => {
                self.state = self.state.merge_missing_from(&persisted);
                for (k, v) in persisted.metrics() {
                    if !self.metrics.contains_key(k) {
                        self.metrics.insert(k.clone(), v.clone());
                    }
                }
                self.statuses[ordinal] = StepStatus::Reused;
                self.events.append_kind(self.run_id,
                                        FlowEventKind::StepReused { ordinal, step_id: step_id.to_string() });
                log::info!("step '{step_id}' out of range: reusing persisted output");
            }
            None => {
                log::warn!("step '{step_id}' out of range and no persisted output found; state unchanged");
            }
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), FlowError> {
        let flow_fingerprint = hash_value(&json!({
            "engine_version": ENGINE_VERSION,
            "definition_hash": self.definition_hash,
            "state_fingerprint": self.state.fingerprint(),
        }));
        self.events.append_kind(self.run_id, FlowEventKind::FlowCompleted { flow_fingerprint });
        self.persist_checkpoint()?;
        self.store.save_metrics(&self.metrics)?;
        self.completed = true;
        log::info!("flow completed after {} step slot(s)", self.steps.len());
        Ok(())
    }

    fn persist_checkpoint(&mut self) -> Result<(), FlowError> {
        let cp = Checkpoint { cursor: self.cursor,
                              definition_hash: self.definition_hash.clone(),
                              state: self.state.clone() };
        self.store.save_checkpoint(&cp)?;
        Ok(())
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn state(&self) -> &DesignState {
        &self.state
    }

    /// Métricas acumuladas de la corrida (mismo nombre: el último gana).
    pub fn metrics(&self) -> &IndexMap<String, Json> {
        &self.metrics
    }

    pub fn statuses(&self) -> &[StepStatus] {
        &self.statuses
    }

    pub fn definition_hash(&self) -> &str {
        &self.definition_hash
    }

    pub fn events(&self) -> Vec<FlowEvent> {
        self.events.list(self.run_id)
    }

    pub fn store(&self) -> &R {
        &self.store
    }

    /// Libera journal y store (p. ej. para reanudar con otra instancia).
    pub fn into_stores(self) -> (E, R) {
        (self.events, self.store)
    }
}

/// Identidad estable de la definición: hash de los ids ordenados más el
/// contrato IO de cada step.
fn definition_hash(steps: &[Box<dyn Step>]) -> String {
    let hashes: Vec<String> = steps.iter().map(|s| s.definition_hash()).collect();
    hash_value(&json!({ "engine_version": ENGINE_VERSION, "steps": hashes }))
}
