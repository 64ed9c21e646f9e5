//! Registro de formatos de diseño.
//!
//! `DesignFormat` enumera los tipos de artefacto que un step puede declarar
//! como dependencia o salida. Funciona como contrato de cableado entre steps:
//! nunca se comunican directamente, sólo mediante rutas registradas en el
//! estado bajo uno de estos tags. El enum es cerrado a propósito: integrar una
//! herramienta nueva añade steps, no formatos ad-hoc.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::DomainError;

/// Tipos de artefacto intercambiados entre steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesignFormat {
    /// Fuentes RTL (Verilog).
    Rtl,
    /// Netlist lógico post-síntesis.
    Netlist,
    /// Netlist con pines de alimentación conectados.
    PoweredNetlist,
    /// Vista física en DEF.
    Def,
    /// Base de datos de layout (OpenDB).
    Odb,
    /// Vista de abstracción física (LEF).
    Lef,
    /// Layout final en GDSII.
    Gds,
    /// Restricciones de timing (SDC).
    Sdc,
    /// Anotación de retardos (SDF).
    Sdf,
    /// Parásitos extraídos (SPEF).
    Spef,
    /// Vista de timing liberty.
    Lib,
}

impl DesignFormat {
    /// Todos los formatos registrados, en orden estable.
    pub fn all() -> &'static [DesignFormat] {
        use DesignFormat::*;
        &[Rtl, Netlist, PoweredNetlist, Def, Odb, Lef, Gds, Sdc, Sdf, Spef, Lib]
    }

    /// Tag estable usado como clave de estado y en serialización.
    pub fn tag(&self) -> &'static str {
        match self {
            DesignFormat::Rtl => "rtl",
            DesignFormat::Netlist => "netlist",
            DesignFormat::PoweredNetlist => "powered_netlist",
            DesignFormat::Def => "def",
            DesignFormat::Odb => "odb",
            DesignFormat::Lef => "lef",
            DesignFormat::Gds => "gds",
            DesignFormat::Sdc => "sdc",
            DesignFormat::Sdf => "sdf",
            DesignFormat::Spef => "spef",
            DesignFormat::Lib => "lib",
        }
    }

    /// Extensión canónica en disco.
    pub fn extension(&self) -> &'static str {
        match self {
            DesignFormat::Rtl => "v",
            DesignFormat::Netlist => "nl.v",
            DesignFormat::PoweredNetlist => "pnl.v",
            DesignFormat::Def => "def",
            DesignFormat::Odb => "odb",
            DesignFormat::Lef => "lef",
            DesignFormat::Gds => "gds",
            DesignFormat::Sdc => "sdc",
            DesignFormat::Sdf => "sdf",
            DesignFormat::Spef => "spef",
            DesignFormat::Lib => "lib",
        }
    }

    /// Nombre legible para reportes.
    pub fn describe(&self) -> &'static str {
        match self {
            DesignFormat::Rtl => "RTL sources",
            DesignFormat::Netlist => "logic netlist",
            DesignFormat::PoweredNetlist => "powered netlist",
            DesignFormat::Def => "design exchange format view",
            DesignFormat::Odb => "OpenDB database",
            DesignFormat::Lef => "library exchange format view",
            DesignFormat::Gds => "GDSII stream",
            DesignFormat::Sdc => "timing constraints",
            DesignFormat::Sdf => "delay annotation",
            DesignFormat::Spef => "extracted parasitics",
            DesignFormat::Lib => "liberty timing view",
        }
    }

    /// Busca un formato por su tag.
    pub fn from_tag(tag: &str) -> Result<DesignFormat, DomainError> {
        DesignFormat::all()
            .iter()
            .copied()
            .find(|f| f.tag() == tag)
            .ok_or_else(|| DomainError::UnknownFormat(tag.to_string()))
    }
}

impl fmt::Display for DesignFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_unique_and_roundtrip() {
        let mut seen = std::collections::HashSet::new();
        for fmt in DesignFormat::all() {
            assert!(seen.insert(fmt.tag()), "tag duplicado: {}", fmt.tag());
            assert_eq!(DesignFormat::from_tag(fmt.tag()).unwrap(), *fmt);
        }
    }

    #[test]
    fn unknown_tag_is_an_error() {
        assert_eq!(DesignFormat::from_tag("bitstream"),
                   Err(DomainError::UnknownFormat("bitstream".to_string())));
    }

    #[test]
    fn serde_uses_the_tag() {
        let json = serde_json::to_string(&DesignFormat::PoweredNetlist).unwrap();
        assert_eq!(json, "\"powered_netlist\"");
        let back: DesignFormat = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DesignFormat::PoweredNetlist);
    }
}
