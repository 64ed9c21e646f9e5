//! JSON canónico: claves de objeto ordenadas, sin espacios.
//!
//! La forma canónica es el insumo de todos los fingerprints del motor. Dos
//! valores estructuralmente iguales deben producir el mismo string canónico
//! sin importar el orden de inserción de sus claves.

use serde_json::Value;
use std::collections::BTreeMap;

pub fn to_canonical_json(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => canonical_number(n),
        Value::String(s) => serde_json::to_string(s).expect("string JSON válido"),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(to_canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        Value::Object(map) => {
            let mut tree = BTreeMap::new();
            for (k, v) in map {
                tree.insert(k, to_canonical_json(v));
            }
            let items: Vec<String> = tree.into_iter()
                                         .map(|(k, v)| format!("{}:{}", serde_json::to_string(&k).unwrap(), v))
                                         .collect();
            format!("{{{}}}", items.join(","))
        }
    }
}

/// Enteros exactos se emiten sin parte decimal para que `4.0` y `4` colapsen
/// a la misma forma canónica.
fn canonical_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(f) = n.as_f64() {
        if f.fract() == 0.0 && f.abs() < 9e15 {
            return format!("{}", f as i64);
        }
        return format!("{f}");
    }
    n.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_keys_are_sorted() {
        let a = json!({"b": 1, "a": 2});
        let b = json!({"a": 2, "b": 1});
        assert_eq!(to_canonical_json(&a), to_canonical_json(&b));
        assert_eq!(to_canonical_json(&a), r#"{"a":2,"b":1}"#);
    }

    #[test]
    fn whole_floats_collapse_to_integers() {
        assert_eq!(to_canonical_json(&json!(4.0)), "4");
        assert_eq!(to_canonical_json(&json!(4)), "4");
        assert_eq!(to_canonical_json(&json!(4.5)), "4.5");
    }
}
