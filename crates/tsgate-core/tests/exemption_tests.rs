//! Integration tests for exemption lists found through a project on disk

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;
use tsgate_core::analysis::{AnalysisEngine, EXEMPTION_RULE_ID, find_exemption_config};
use tsgate_core::config::Config;
use tsgate_core::config::tsconfig::find_tsconfig;
use tsgate_core::program::Program;

fn write(dir: &Path, relative: &str, content: &str) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn project() -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    write(dir.path(), "src/app.ts", "eval('app');\n");
    write(dir.path(), "src/legacy/old.ts", "eval('old');\n");
    dir
}

fn build_program(dir: &Path) -> Arc<Program> {
    let builder = Program::builder()
        .add_file(&dir.join("src/app.ts"))
        .and_then(|b| b.add_file(&dir.join("src/legacy/old.ts")))
        .expect("sources readable");
    Arc::new(builder.build())
}

fn engine_for(dir: &Path, config: &Config) -> AnalysisEngine {
    let tsconfig = find_tsconfig(&dir.join("src"));
    let mut engine = AnalysisEngine::with_config(config);
    if let Some(path) = find_exemption_config(config, dir, tsconfig.as_deref()) {
        engine.load_exemptions(&path).expect("exemption config readable");
    }
    engine
}

fn reported_files(engine: &AnalysisEngine, program: &Arc<Program>) -> Vec<String> {
    let mut files: Vec<String> = engine
        .analyze(program)
        .into_iter()
        .filter(|d| !d.exempted)
        .map(|d| d.file)
        .collect();
    files.sort();
    files
}

#[test]
fn tsconfig_plugin_option_locates_exemptions() {
    let dir = project();
    write(
        dir.path(),
        "tsconfig.json",
        r#"{
  // comments are allowed in tsconfig
  "compilerOptions": {
    "plugins": [{ "name": "tsgate", "exemptionConfig": "./conformance/exemptions.json" }]
  }
}"#,
    );
    write(
        dir.path(),
        "conformance/exemptions.json",
        r#"{ "ban-eval-calls": ["../src/legacy/*.ts"] }"#,
    );
    let program = build_program(dir.path());

    let engine = engine_for(dir.path(), &Config::default());

    let files = reported_files(&engine, &program);
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with("src/app.ts"), "{files:?}");
}

#[test]
fn extended_tsconfig_supplies_the_option() {
    let dir = project();
    write(
        dir.path(),
        "tsconfig.base.json",
        r#"{ "compilerOptions": { "plugins": [{ "name": "tsgate", "exemptionConfig": "exemptions.json" }] } }"#,
    );
    write(dir.path(), "tsconfig.json", r#"{ "extends": "./tsconfig.base" }"#);
    write(dir.path(), "exemptions.json", r#"{ "ban-eval-calls": ["src/legacy/old.ts"] }"#);
    let program = build_program(dir.path());

    let engine = engine_for(dir.path(), &Config::default());

    assert_eq!(reported_files(&engine, &program).len(), 1);
}

#[test]
fn tool_config_overrides_tsconfig() {
    let dir = project();
    write(
        dir.path(),
        "tsconfig.json",
        r#"{ "compilerOptions": { "plugins": [{ "name": "tsgate", "exemptionConfig": "none.json" }] } }"#,
    );
    write(dir.path(), "exempt-all.json", r#"{ "ban-eval-calls": ["src/**/*.ts"] }"#);
    let mut config = Config::default();
    config.exemptions.config = Some("exempt-all.json".into());
    let program = build_program(dir.path());

    let mut engine = engine_for(dir.path(), &config);

    assert!(reported_files(&engine, &program).is_empty());
    engine.set_audit(true);
    let audited = engine.analyze(&program);
    assert_eq!(audited.len(), 2);
    assert!(audited.iter().all(|d| d.exempted));
}

#[test]
fn malformed_entries_are_skipped_not_fatal() {
    let dir = project();
    write(
        dir.path(),
        "exemptions.json",
        r#"{
  "ban-eval-calls": ["src/legacy/*.ts", 42],
  "ban-worker-calls": "src/workers",
  "ban-nothing-at-all": []
}"#,
    );
    let mut config = Config::default();
    config.exemptions.config = Some("exemptions.json".into());
    let program = build_program(dir.path());

    let engine = engine_for(dir.path(), &config);

    let warnings: Vec<_> = engine
        .exemption_diagnostics()
        .iter()
        .map(|d| (d.line, d.message.as_str()))
        .collect();
    assert_eq!(warnings.len(), 3, "{warnings:?}");
    assert!(engine.exemption_diagnostics().iter().all(|d| d.rule_id == EXEMPTION_RULE_ID));
    assert_eq!(warnings[0].0, 2);
    assert_eq!(warnings[1].0, 3);
    assert!(warnings[2].1.contains("ban-nothing-at-all"));

    let files = reported_files(&engine, &program);
    assert_eq!(files.len(), 1, "the well-formed entry still applies");
}

#[test]
fn non_object_root_leaves_no_exemptions() {
    let dir = project();
    write(dir.path(), "exemptions.json", r#"["src/legacy/*.ts"]"#);
    let mut config = Config::default();
    config.exemptions.config = Some("exemptions.json".into());
    let program = build_program(dir.path());

    let engine = engine_for(dir.path(), &config);

    assert_eq!(engine.exemption_diagnostics().len(), 1);
    assert!(engine.exemptions().is_empty());
    assert_eq!(reported_files(&engine, &program).len(), 2);
}
