//! Render de agregados de métricas.
//!
//! El flow acumula métricas en orden de ejecución (mismo nombre: el último
//! gana); aquí sólo se materializan en las dos formas del run directory:
//! JSON (máquina) y CSV (tabular). El render es determinista: mismo mapa,
//! mismos bytes.

use indexmap::IndexMap;
use serde_json::Value as Json;

/// Tabla `metric,value` con escapado CSV mínimo.
pub fn render_csv(metrics: &IndexMap<String, Json>) -> String {
    let mut out = String::from("metric,value\n");
    for (name, value) in metrics {
        out.push_str(&csv_field(name));
        out.push(',');
        out.push_str(&csv_field(&render_scalar(value)));
        out.push('\n');
    }
    out
}

fn render_scalar(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        Json::Number(n) => n.to_string(),
        Json::Bool(b) => b.to_string(),
        Json::Null => String::new(),
        other => other.to_string(),
    }
}

fn csv_field(text: &str) -> String {
    if text.contains(',') || text.contains('"') || text.contains('\n') {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_in_insertion_order() {
        let mut metrics = IndexMap::new();
        metrics.insert("synthesis__cell_count".to_string(), json!(412));
        metrics.insert("route__wirelength".to_string(), json!(10432.5));
        metrics.insert("drc__clean".to_string(), json!(true));
        assert_eq!(render_csv(&metrics),
                   "metric,value\nsynthesis__cell_count,412\nroute__wirelength,10432.5\ndrc__clean,true\n");
    }

    #[test]
    fn escapes_fields_with_commas_and_quotes() {
        let mut metrics = IndexMap::new();
        metrics.insert("sta__violations".to_string(), json!("setup, hold"));
        metrics.insert("note".to_string(), json!("said \"ok\""));
        let csv = render_csv(&metrics);
        assert!(csv.contains("sta__violations,\"setup, hold\"\n"));
        assert!(csv.contains("note,\"said \"\"ok\"\"\"\n"));
    }

    #[test]
    fn identical_maps_render_identical_bytes() {
        let mut a = IndexMap::new();
        a.insert("m".to_string(), json!(1));
        let mut b = IndexMap::new();
        b.insert("m".to_string(), json!(1));
        assert_eq!(render_csv(&a), render_csv(&b));
    }
}
