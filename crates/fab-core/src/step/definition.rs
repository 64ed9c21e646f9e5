//! Interfaz neutral de un step.

use serde_json::json;

use fab_domain::DesignFormat;

use crate::config::Variable;
use crate::errors::StepError;
use crate::model::DesignState;
use crate::step::{StepContext, StepOutcome};

/// Trait que define un step. Implementaciones deben ser deterministas
/// respecto a (configuración, estado de entrada, identidad): mismo trío,
/// mismo estado de salida estructural.
pub trait Step: std::fmt::Debug + Send + Sync {
    /// Identificador estable y único dentro del flow; sobrevive re-runs para
    /// que un estado persistido pueda alimentar una corrida posterior.
    fn id(&self) -> &str;

    /// Nombre amigable.
    fn name(&self) -> &str {
        self.id()
    }

    /// Dependencias de entrada declaradas (vistas que deben existir en el
    /// estado de entrada).
    fn inputs(&self) -> &[DesignFormat];

    /// Vistas que este step puede añadir o sobrescribir. Tocar cualquier otra
    /// es violación del contrato de salida.
    fn outputs(&self) -> &[DesignFormat];

    /// Slice de descriptores de variable que este step aporta al esquema
    /// agregado del flow.
    fn variables(&self) -> Vec<Variable> {
        Vec::new()
    }

    /// La transformación interna. Corre dentro del sandbox ya creado; sólo
    /// debe leer lo que configuración/estado exponen y escribir dentro de
    /// `ctx.step_dir()`. Nunca la invoca nadie más que `execute_step`.
    fn run(&self, ctx: &StepContext, input: &DesignState) -> Result<StepOutcome, StepError>;

    /// Hash estable de la declaración del step (identidad + contrato IO).
    fn definition_hash(&self) -> String {
        let inputs: Vec<&str> = self.inputs().iter().map(|f| f.tag()).collect();
        let outputs: Vec<&str> = self.outputs().iter().map(|f| f.tag()).collect();
        crate::hashing::hash_value(&json!({
            "id": self.id(),
            "inputs": inputs,
            "outputs": outputs,
        }))
    }
}
