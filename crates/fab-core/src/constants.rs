//! Constantes del motor.
//!
//! Valores estáticos que participan en fingerprints y en la compatibilidad
//! entre versiones. `ENGINE_VERSION` entra al hash de cada fingerprint: un
//! cambio de versión invalida determinísticamente resultados previos aunque
//! definición y datos no cambien.

/// Versión lógica del motor.
pub const ENGINE_VERSION: &str = "1.0";

/// Nombre del archivo de estado de entrada persistido en el sandbox del step.
pub const STATE_IN_FILE: &str = "state_in.json";

/// Nombre del archivo de estado de salida persistido en el sandbox del step.
pub const STATE_OUT_FILE: &str = "state_out.json";

/// Nombre del archivo con el slice de configuración consumido por el step.
pub const CONFIG_SLICE_FILE: &str = "config.json";

/// Fragmento de métricas reportado por el step en su sandbox.
pub const METRICS_FRAGMENT_FILE: &str = "metrics.json";
