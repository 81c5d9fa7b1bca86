use std::fs;

use pretty_assertions::assert_eq;
use serde_json::json;
use simple_docs_config::{Config, LoadOptions};
use simple_docs_core::{DocsError, ManifestState, SimpleDocs, TeraEngine, Variables};
use simple_docs_test_support::{init_test_logging, sample_docs, write_file};
use tempfile::TempDir;

fn vars(pairs: &[(&str, serde_json::Value)]) -> Variables {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

#[test]
fn constructing_over_missing_directory_fails() {
    let temp = TempDir::new().unwrap();
    let err = SimpleDocs::new(temp.path().join("absent"))
        .err()
        .expect("missing directory must fail");
    assert!(matches!(err, DocsError::DirectoryNotFound { .. }));
}

#[test]
fn direct_file_resolves_without_manifest() {
    init_test_logging(None);
    let docs = sample_docs();
    let resolver = SimpleDocs::new(docs.path()).unwrap();

    let doc = resolver.find("readme").unwrap();
    assert_eq!(doc.title(), Some("Readme"));
    assert_eq!(doc.path(), resolver.base_dir().join("readme.md"));
}

#[test]
fn prefixed_names_need_the_manifest() {
    let docs = sample_docs();
    let mut resolver = SimpleDocs::new(docs.path()).unwrap();

    let err = resolver.find("guide/intro").unwrap_err();
    match err {
        DocsError::FileNotFound { path } => {
            assert_eq!(path, resolver.base_dir().join("guide/intro.md"));
        }
        other => panic!("unexpected error: {other}"),
    }

    resolver.enable_manifest(true, true).unwrap();
    let doc = resolver.find("guide/intro").unwrap();
    assert_eq!(doc.attribute("title"), Some("Introduction"));
    assert_eq!(
        doc.path(),
        resolver.base_dir().join("010_guide/020_intro.md")
    );
}

#[test]
fn missing_page_reports_probed_path() {
    let docs = sample_docs();
    let resolver = SimpleDocs::new(docs.path()).unwrap();

    let err = resolver.find("missing/page").unwrap_err();
    assert!(err
        .to_string()
        .contains(&resolver.base_dir().join("missing/page.md").display().to_string()));
    assert!(matches!(err, DocsError::FileNotFound { .. }));
}

#[test]
fn direct_file_beats_disagreeing_manifest() {
    let docs = sample_docs();
    let mut resolver = SimpleDocs::new(docs.path()).unwrap();
    resolver.enable_manifest(true, true).unwrap();

    write_file(docs.path(), "guide/intro.md", "# Direct copy\n");

    let doc = resolver.find("guide/intro").unwrap();
    assert_eq!(doc.title(), Some("Direct copy"));
    assert_eq!(doc.path(), resolver.base_dir().join("guide/intro.md"));
}

#[test]
fn disabled_manifest_is_ignored_even_when_persisted() {
    let docs = sample_docs();
    let mut resolver = SimpleDocs::new(docs.path()).unwrap();
    resolver.enable_manifest(true, true).unwrap();
    resolver.enable_manifest(false, true).unwrap();

    assert!(resolver.manifest().unwrap().is_some());
    assert_eq!(resolver.manifest_state().unwrap(), ManifestState::Disabled);
    assert!(matches!(
        resolver.find("guide/setup").unwrap_err(),
        DocsError::FileNotFound { .. }
    ));
}

#[test]
fn manifest_lookup_uses_the_name_as_given() {
    let docs = sample_docs();
    let mut resolver = SimpleDocs::new(docs.path()).unwrap();
    resolver.enable_manifest(true, true).unwrap();

    assert!(resolver.find("guide/setup").is_ok());
    assert!(matches!(
        resolver.find("010_guide/setup").unwrap_err(),
        DocsError::FileNotFound { .. }
    ));
}

#[test]
fn repeated_enable_with_rebuild_always_picks_up_new_files() {
    let docs = sample_docs();
    let mut resolver = SimpleDocs::new(docs.path()).unwrap();

    resolver.enable_manifest(true, true).unwrap();
    write_file(docs.path(), "010_guide/040_deploy.md", "# Deploy\n");
    assert!(resolver.find("guide/deploy").is_err());

    resolver.enable_manifest(true, true).unwrap();
    assert_eq!(
        resolver.find("guide/deploy").unwrap().title(),
        Some("Deploy")
    );
}

#[test]
fn persisted_manifest_is_pretty_json_keyed_by_name() {
    let docs = sample_docs();
    let mut resolver = SimpleDocs::new(docs.path()).unwrap();
    resolver.enable_manifest(true, true).unwrap();

    let raw = fs::read_to_string(resolver.manifest_path()).unwrap();
    assert!(raw.contains('\n'));
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["guide/setup"]["attributes"]["title"], "Setup");
    assert_eq!(
        json["guide/setup"]["path"],
        resolver
            .base_dir()
            .join("010_guide/030_setup.md")
            .to_str()
            .unwrap()
    );
}

#[test]
fn rendering_without_engine_and_with_variables_fails() {
    let docs = sample_docs();
    let resolver = SimpleDocs::new(docs.path()).unwrap();
    let doc = resolver.find("readme").unwrap();

    let html = doc.render(&Variables::new()).unwrap();
    assert_eq!(html, doc.render(&Variables::new()).unwrap());
    assert!(matches!(
        doc.render(&vars(&[("x", json!(1))])).unwrap_err(),
        DocsError::TemplateCapabilityMissing
    ));
}

#[test]
fn injected_engine_renders_attributes_and_variables() {
    let docs = sample_docs();
    let mut resolver = SimpleDocs::new(docs.path())
        .unwrap()
        .with_template_engine(TeraEngine::new());
    resolver.enable_manifest(true, true).unwrap();

    let doc = resolver.find("guide/intro").unwrap();
    let view = doc.to_view(&vars(&[("product", json!("simple-docs"))])).unwrap();

    assert_eq!(view.title, Some("Introduction"));
    assert!(view.output.contains("Welcome to simple-docs."));
    assert_eq!(view.sections[0].title, "Intro");
}

#[test]
fn configuration_drives_manifest_and_templates() {
    let docs = sample_docs();
    write_file(
        docs.path(),
        ".simple-docs.toml",
        "[manifest]\nenabled = true\nfile_name = \"index.json\"\n\n[render]\ntemplates = true\n",
    );

    let config = Config::load(LoadOptions::default().with_base_dir(docs.path())).unwrap();
    let resolver = SimpleDocs::from_config(&config).unwrap();

    assert!(resolver.manifest_enabled());
    assert!(resolver.base_dir().join("index.json").is_file());
    assert!(!resolver.base_dir().join("manifest.json").exists());

    let doc = resolver.find("guide/intro").unwrap();
    let output = doc.render(&vars(&[("product", json!("X"))])).unwrap();
    assert!(output.contains("Welcome to X."));
}
