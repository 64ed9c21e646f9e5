//! Pruebas del builder de configuración: overlays, referencias, rutas,
//! expresiones y validación atómica.

use serde_json::json;
use std::path::Path;

use fab_core::{BuildContext, ConfigBuilder, ConfigError, ConfigSchema, RawConfig, Variable, VariableType};
use fab_domain::Value;

fn schema_with(vars: Vec<Variable>) -> ConfigSchema {
    let mut schema = ConfigSchema::new();
    schema.extend("test", vars).unwrap();
    schema
}

fn ctx(design_dir: &Path) -> BuildContext {
    BuildContext::new(design_dir, "sky130A", "sky130_fd_sc_hd")
}

fn raw(value: serde_json::Value) -> RawConfig {
    RawConfig::from_value(value, Path::new("<test>")).unwrap()
}

#[test]
fn overlay_then_top_level_resolves_to_top_level() {
    let schema = schema_with(vec![Variable::new("A", VariableType::Number)]);
    let builder = ConfigBuilder::new(schema, ctx(Path::new("/designs/spm")));
    let cfg = builder.build(raw(json!({"pdk::sky130*": {"A": 40}, "A": 4}))).unwrap();
    assert_eq!(cfg.number("A"), Some(4.0));
}

#[test]
fn top_level_then_overlay_resolves_to_overlay() {
    let schema = schema_with(vec![Variable::new("A", VariableType::Number)]);
    let builder = ConfigBuilder::new(schema, ctx(Path::new("/designs/spm")));
    let cfg = builder.build(raw(json!({"A": 4, "pdk::sky130*": {"A": 40}}))).unwrap();
    assert_eq!(cfg.number("A"), Some(40.0));
}

#[test]
fn non_matching_overlay_is_dropped() {
    let schema = schema_with(vec![Variable::new("A", VariableType::Number)]);
    let builder = ConfigBuilder::new(schema, ctx(Path::new("/designs/spm")));
    let cfg = builder.build(raw(json!({"A": 4, "pdk::gf180*": {"A": 40}}))).unwrap();
    assert_eq!(cfg.number("A"), Some(4.0));
}

#[test]
fn scl_overlay_matches_the_library_context() {
    let schema = schema_with(vec![Variable::new("CELL_PAD", VariableType::Number)]);
    let builder = ConfigBuilder::new(schema, ctx(Path::new("/designs/spm")));
    let cfg = builder.build(raw(json!({
        "CELL_PAD": 2,
        "scl::sky130_fd_sc_h?": {"CELL_PAD": 4},
    })))
                     .unwrap();
    assert_eq!(cfg.number("CELL_PAD"), Some(4.0));
}

#[test]
fn cross_reference_resolves_backwards_only() {
    let schema = schema_with(vec![Variable::new("A", VariableType::String),
                                  Variable::new("B", VariableType::String)]);
    let builder = ConfigBuilder::new(schema.clone(), ctx(Path::new("/designs/spm")));

    let ok = builder.build(raw(json!({"B": "vdd gnd", "A": "ref::$B"}))).unwrap();
    assert_eq!(ok.str("A"), Some("vdd gnd"));

    let builder = ConfigBuilder::new(schema, ctx(Path::new("/designs/spm")));
    let err = builder.build(raw(json!({"A": "ref::$B", "B": "vdd gnd"}))).unwrap_err();
    let ConfigError::Invalid { violations } = err else { panic!("expected Invalid") };
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].variable, "A");
    assert!(violations[0].message.contains("$B"));
}

#[test]
fn cross_reference_interpolates_inside_text() {
    let schema = schema_with(vec![Variable::new("POWER", VariableType::String),
                                  Variable::new("PINS", VariableType::String)]);
    let builder = ConfigBuilder::new(schema, ctx(Path::new("/designs/spm")));
    let cfg = builder.build(raw(json!({"POWER": "vdd", "PINS": "ref::$POWER gnd clk"}))).unwrap();
    assert_eq!(cfg.str("PINS"), Some("vdd gnd clk"));
}

#[test]
fn dir_shorthand_anchors_to_the_design_directory() {
    let schema = schema_with(vec![Variable::new("PIN_CFG", VariableType::Path)]);
    let builder = ConfigBuilder::new(schema, ctx(Path::new("/designs/spm")));
    let cfg = builder.build(raw(json!({"PIN_CFG": "dir::pin_order.cfg"}))).unwrap();
    assert_eq!(cfg.path("PIN_CFG"), Some(Path::new("/designs/spm/pin_order.cfg")));
}

#[test]
fn glob_shorthand_yields_a_sorted_list() {
    let design = tempfile::tempdir().unwrap();
    std::fs::create_dir(design.path().join("src")).unwrap();
    std::fs::write(design.path().join("src/b.v"), "").unwrap();
    std::fs::write(design.path().join("src/a.v"), "").unwrap();
    std::fs::write(design.path().join("src/notes.md"), "").unwrap();

    let schema = schema_with(vec![Variable::new("VERILOG_FILES", VariableType::List(Box::new(VariableType::Path)))]);
    let builder = ConfigBuilder::new(schema, ctx(design.path()));
    let cfg = builder.build(raw(json!({"VERILOG_FILES": "glob::src/*.v"}))).unwrap();

    let files = cfg.paths("VERILOG_FILES").unwrap();
    assert_eq!(files.len(), 2);
    assert!(files[0].ends_with("src/a.v"));
    assert!(files[1].ends_with("src/b.v"));
}

#[test]
fn glob_escaping_the_design_dir_resolves_literally() {
    let design = tempfile::tempdir().unwrap();
    let schema = schema_with(vec![Variable::new("EXTRA", VariableType::List(Box::new(VariableType::Path)))]);
    let builder = ConfigBuilder::new(schema, ctx(design.path()));
    let cfg = builder.build(raw(json!({"EXTRA": "glob::../elsewhere/*.lef"}))).unwrap();

    // sin expansión: una sola ruta literal, promovida a lista
    let paths = cfg.paths("EXTRA").unwrap();
    assert_eq!(paths.len(), 1);
    assert!(paths[0].ends_with("elsewhere/*.lef"));
}

#[test]
fn expressions_use_previously_resolved_numbers() {
    let schema = schema_with(vec![Variable::new("CLOCK_PERIOD", VariableType::Number),
                                  Variable::new("CTS_TARGET_SKEW", VariableType::Number)]);
    let builder = ConfigBuilder::new(schema, ctx(Path::new("/designs/spm")));
    let cfg = builder.build(raw(json!({
        "CLOCK_PERIOD": 10,
        "CTS_TARGET_SKEW": "expr::$CLOCK_PERIOD * 0.2 + 1",
    })))
                     .unwrap();
    assert_eq!(cfg.number("CTS_TARGET_SKEW"), Some(3.0));
}

#[test]
fn expression_forward_reference_is_a_hard_error() {
    let schema = schema_with(vec![Variable::new("CLOCK_PERIOD", VariableType::Number),
                                  Variable::new("CTS_TARGET_SKEW", VariableType::Number)]);
    let builder = ConfigBuilder::new(schema, ctx(Path::new("/designs/spm")));
    let err = builder.build(raw(json!({
        "CTS_TARGET_SKEW": "expr::$CLOCK_PERIOD * 0.2",
        "CLOCK_PERIOD": 10,
    })))
                     .unwrap_err();
    let ConfigError::Invalid { violations } = err else { panic!("expected Invalid") };
    assert_eq!(violations[0].variable, "CTS_TARGET_SKEW");
}

#[test]
fn all_violations_are_batched_into_one_error() {
    let schema = schema_with(vec![Variable::new("CLOCK_PERIOD", VariableType::Number).required(),
                                  Variable::new("STRATEGY", VariableType::Enum(vec!["AREA 0".to_string(),
                                                                                    "DELAY 0".to_string()]))]);
    let builder = ConfigBuilder::new(schema, ctx(Path::new("/designs/spm")));
    // tres violaciones independientes: enum inválido, variable desconocida y
    // requerida ausente
    let err = builder.build(raw(json!({
        "STRATEGY": "FAST",
        "TYPO_VARIABLE": 1,
    })))
                     .unwrap_err();
    let ConfigError::Invalid { violations } = err else { panic!("expected Invalid") };
    assert_eq!(violations.len(), 3);
    let vars: Vec<&str> = violations.iter().map(|v| v.variable.as_str()).collect();
    assert!(vars.contains(&"STRATEGY"));
    assert!(vars.contains(&"TYPO_VARIABLE"));
    assert!(vars.contains(&"CLOCK_PERIOD"));
}

#[test]
fn defaults_fill_missing_optionals() {
    let schema = schema_with(vec![Variable::new("PL_TARGET_DENSITY", VariableType::Number).with_default(0.5)]);
    let builder = ConfigBuilder::new(schema, ctx(Path::new("/designs/spm")));
    let cfg = builder.build(raw(json!({}))).unwrap();
    assert_eq!(cfg.number("PL_TARGET_DENSITY"), Some(0.5));
}

#[test]
fn aliases_map_to_the_canonical_name() {
    let schema = schema_with(vec![Variable::new("SYNTH_STRATEGY", VariableType::String).with_alias("STRATEGY")]);
    let builder = ConfigBuilder::new(schema, ctx(Path::new("/designs/spm")));
    let cfg = builder.build(raw(json!({"STRATEGY": "AREA 0"}))).unwrap();
    assert_eq!(cfg.str("SYNTH_STRATEGY"), Some("AREA 0"));
    assert!(cfg.get("STRATEGY").is_none());
}

#[test]
fn scalars_promote_to_singleton_lists() {
    let schema = schema_with(vec![Variable::new("SDC_FILES", VariableType::List(Box::new(VariableType::Path)))]);
    let builder = ConfigBuilder::new(schema, ctx(Path::new("/designs/spm")));
    let cfg = builder.build(raw(json!({"SDC_FILES": "base.sdc"}))).unwrap();
    assert_eq!(cfg.paths("SDC_FILES").unwrap().len(), 1);
}

#[test]
fn numeric_strings_coerce_and_garbage_does_not() {
    let schema = schema_with(vec![Variable::new("CLOCK_PERIOD", VariableType::Number)]);
    let builder = ConfigBuilder::new(schema.clone(), ctx(Path::new("/designs/spm")));
    let cfg = builder.build(raw(json!({"CLOCK_PERIOD": "12.5"}))).unwrap();
    assert_eq!(cfg.number("CLOCK_PERIOD"), Some(12.5));

    let builder = ConfigBuilder::new(schema, ctx(Path::new("/designs/spm")));
    let err = builder.build(raw(json!({"CLOCK_PERIOD": "fast"}))).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }));
}

#[test]
fn nested_dict_values_are_typed() {
    let schema = schema_with(vec![Variable::new("CORNER_LIBS",
                                                VariableType::Dict(Box::new(VariableType::Path)))]);
    let builder = ConfigBuilder::new(schema, ctx(Path::new("/designs/spm")));
    let cfg = builder.build(raw(json!({"CORNER_LIBS": {"nom": "dir::lib/nom.lib", "max": "dir::lib/max.lib"}})))
                     .unwrap();
    let dict = cfg.get("CORNER_LIBS").unwrap().as_dict().unwrap();
    assert_eq!(dict.get("nom").unwrap(),
               &Value::Path("/designs/spm/lib/nom.lib".into()));
}

#[test]
fn identical_inputs_build_identical_configurations() {
    let schema = schema_with(vec![Variable::new("A", VariableType::Number),
                                  Variable::new("B", VariableType::String)]);
    let input = json!({"A": 4, "B": "x", "pdk::sky130*": {"A": 40}});
    let one = ConfigBuilder::new(schema.clone(), ctx(Path::new("/d"))).build(raw(input.clone())).unwrap();
    let two = ConfigBuilder::new(schema, ctx(Path::new("/d"))).build(raw(input)).unwrap();
    assert_eq!(one, two);
    assert_eq!(one.fingerprint(), two.fingerprint());
    assert_eq!(serde_json::to_string(&one.to_json()).unwrap(),
               serde_json::to_string(&two.to_json()).unwrap());
}
