//! fab-adapters: steps concretos sobre herramientas EDA externas.
//!
//! Cada step es una invocación delgada: construye un script de control dentro
//! de su sandbox, lanza la herramienta vía el bridge del core y publica los
//! artefactos declarados en el estado. El trabajo pesado (síntesis, placement,
//! ruteo, verificación) vive en las herramientas; aquí sólo se puentean sus
//! interfaces de proceso y formato de archivo.

pub mod invocation;
pub mod metrics;
pub mod steps;

pub use invocation::{checksum_artifact, expect_artifact, tool_command};
pub use steps::{classic_flow, DrcStep, FloorplanStep, PlacementStep, RoutingStep, StreamOutStep,
                SynthesisStep};
