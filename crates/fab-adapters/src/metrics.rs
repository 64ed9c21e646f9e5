//! Parsers de métricas desde salidas de herramientas.
//!
//! Las herramientas reportan en formatos propios (JSON embebido en el log de
//! yosys, líneas de resumen de OpenROAD, reporte plano de magic); aquí se
//! traducen al mapa de métricas del estado. Los nombres siguen la convención
//! `<etapa>__<métrica>`.

use indexmap::IndexMap;
use serde_json::Value as Json;

/// Extrae el bloque `stat -json` del log de yosys y lo proyecta a métricas
/// de síntesis. El log puede contener texto antes y después del JSON.
pub fn parse_yosys_stats(log: &str) -> IndexMap<String, Json> {
    let mut out = IndexMap::new();
    let Some(blob) = last_json_object(log) else {
        log::warn!("no stat -json block found in yosys log");
        return out;
    };
    let Ok(parsed) = serde_json::from_str::<Json>(&blob) else {
        log::warn!("stat -json block does not parse");
        return out;
    };
    let design = parsed.get("design").unwrap_or(&parsed);
    for (source, metric) in [("num_cells", "synthesis__cell_count"),
                             ("num_wires", "synthesis__wire_count"),
                             ("num_memories", "synthesis__memory_count"),
                             ("area", "synthesis__area")]
    {
        if let Some(v) = design.get(source) {
            out.insert(metric.to_string(), v.clone());
        }
    }
    out
}

/// Último objeto JSON balanceado dentro de un texto libre.
fn last_json_object(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let mut best: Option<(usize, usize)> = None;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            if let Some(end) = matching_brace(bytes, i) {
                best = Some((i, end));
                i = end + 1;
                continue;
            }
        }
        i += 1;
    }
    best.map(|(start, end)| text[start..=end].to_string())
}

fn matching_brace(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if *b == b'\\' {
                escaped = true;
            } else if *b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Largo total de cable reportado por el router en su log
/// (`Total wire length: <n> um`).
pub fn parse_routing_wirelength(log: &str) -> Option<f64> {
    const MARKER: &str = "Total wire length:";
    for line in log.lines() {
        if let Some(pos) = line.find(MARKER) {
            let rest = line[pos + MARKER.len()..].trim();
            let number: String = rest.chars().take_while(|c| c.is_ascii_digit() || *c == '.').collect();
            if let Ok(v) = number.parse() {
                return Some(v);
            }
        }
    }
    None
}

/// Cuenta violaciones en un reporte DRC de magic: cada regla violada aparece
/// como una línea de descripción seguida de una línea de coordenadas por
/// ocurrencia.
pub fn count_drc_violations(report: &str) -> u64 {
    report.lines()
          .map(str::trim)
          .filter(|line| !line.is_empty())
          .filter(|line| {
              line.chars()
                  .all(|c| c.is_ascii_digit() || c.is_whitespace() || c == '.' || c == '-' || c == 'u' || c == 'm')
                  && line.chars().any(|c| c.is_ascii_digit())
          })
          .count() as u64
}
