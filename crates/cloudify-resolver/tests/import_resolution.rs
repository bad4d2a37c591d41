use std::path::{Path, PathBuf};

use cloudify_core::{BlueprintRecord, CatalogEntry, ImportKind, PlatformInfo};
use cloudify_resolver::{
    DslParser, ImportResolver, ParseError, ResolveError, TracedResolver, YamlDslParser,
};
use cloudify_storage::{DirectoryBlueprintStore, MemoryBlueprintStore, MemoryCatalog};

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/mock_blueprint")
}

fn platform() -> PlatformInfo {
    PlatformInfo::new("linux_x86_64", "centos", "core")
}

fn script_plugin_catalog() -> MemoryCatalog {
    MemoryCatalog::new(vec![
        CatalogEntry::new("cloudify-script-plugin", "1.2")
            .with_platform("any")
            .with_package_path("/opt/manager/resources/plugins/script/plugin.wgn"),
    ])
    .expect("catalog")
}

fn uploaded_blueprints() -> MemoryBlueprintStore {
    MemoryBlueprintStore::new([BlueprintRecord::new(
        "imported_blueprint",
        fixtures(),
        "blueprint_with_substitution_mapping.yaml",
    )
    .expect("record")])
}

async fn parse_with<R, S>(
    file: &str,
    resolver: &ImportResolver<R, S>,
) -> Result<cloudify_resolver::Plan, ParseError>
where
    R: cloudify_storage::PluginRegistry,
    S: cloudify_storage::BlueprintStore,
{
    YamlDslParser::new()
        .parse(&fixtures().join(file), &fixtures(), resolver)
        .await
}

#[tokio::test]
async fn plugin_import_lands_in_plugins_to_install() {
    let resolver = ImportResolver::new(
        script_plugin_catalog(),
        MemoryBlueprintStore::default(),
        platform(),
    );

    let plan = parse_with("blueprint_with_plugin_import.yaml", &resolver)
        .await
        .expect("parsed");

    assert_eq!(plan.deployment_plugins_to_install.len(), 1);
    assert_eq!(
        plan.deployment_plugins_to_install[0].package_name,
        "cloudify-script-plugin"
    );
    assert_eq!(plan.imports.len(), 3);
    assert_eq!(plan.imports[1].kind, ImportKind::Plugin);
    assert_eq!(
        plan.imports[1].location,
        "/opt/manager/resources/plugins/script/plugin.wgn"
    );
    assert!(plan.section("node_types").is_some());
}

#[tokio::test]
async fn plugin_import_missing_from_catalog_aborts_parse() {
    let resolver = ImportResolver::new(
        MemoryCatalog::empty(),
        MemoryBlueprintStore::default(),
        platform(),
    );

    let err = parse_with("blueprint_with_plugin_import.yaml", &resolver)
        .await
        .unwrap_err();

    assert!(matches!(
        err.resolve_error(),
        Some(ResolveError::NotFound {
            kind: ImportKind::Plugin,
            ..
        })
    ));
}

#[tokio::test]
async fn plugin_import_for_another_platform_is_invalid() {
    let catalog = MemoryCatalog::new(vec![
        CatalogEntry::new("cloudify-script-plugin", "1.2")
            .with_platform("windows_x86_64")
            .with_package_path("/plugins/script-win.wgn"),
    ])
    .expect("catalog");
    let resolver = ImportResolver::new(catalog, MemoryBlueprintStore::default(), platform());

    let err = parse_with("blueprint_with_plugin_import.yaml", &resolver)
        .await
        .unwrap_err();

    assert_eq!(err.resolve_error().map(ResolveError::kind), Some("invalid_plugin"));
}

#[tokio::test]
async fn blueprint_import_is_substituted_with_uploaded_document() {
    let resolver = ImportResolver::new(MemoryCatalog::empty(), uploaded_blueprints(), platform());

    let composed = parse_with("blueprint_using_substitution_mapping.yaml", &resolver)
        .await
        .expect("composed");
    let inlined = parse_with("final_blueprint_with_substitution_mapping.yaml", &resolver)
        .await
        .expect("inlined");

    assert_eq!(composed.sections, inlined.sections);
    assert_eq!(
        composed.tosca_definitions_version,
        inlined.tosca_definitions_version
    );
    assert_eq!(composed.description, inlined.description);
    assert_eq!(composed.imports[0].kind, ImportKind::Blueprint);
}

#[tokio::test]
async fn blueprint_import_from_uploads_directory() {
    let uploads = tempfile::tempdir().expect("tempdir");
    let blueprint_dir = uploads.path().join("imported_blueprint");
    std::fs::create_dir(&blueprint_dir).expect("mkdir");
    for file in ["types.yaml", "blueprint_with_substitution_mapping.yaml"] {
        std::fs::copy(fixtures().join(file), blueprint_dir.join(file)).expect("copy");
    }
    std::fs::write(
        blueprint_dir.join(".blueprint.json"),
        r#"{"main_file_name": "blueprint_with_substitution_mapping.yaml"}"#,
    )
    .expect("meta");

    let resolver = ImportResolver::new(
        MemoryCatalog::empty(),
        DirectoryBlueprintStore::new(uploads.path()),
        platform(),
    );
    let plan = parse_with("blueprint_using_substitution_mapping.yaml", &resolver)
        .await
        .expect("composed");

    assert_eq!(
        plan.section("substitution_mapping"),
        Some(&serde_json::json!({"node_type": "test_type"}))
    );
}

#[tokio::test]
async fn missing_blueprint_is_not_found() {
    let resolver = ImportResolver::new(
        MemoryCatalog::empty(),
        MemoryBlueprintStore::default(),
        platform(),
    );

    let err = parse_with("blueprint_using_substitution_mapping.yaml", &resolver)
        .await
        .unwrap_err();

    match err.resolve_error() {
        Some(ResolveError::NotFound { reference, kind }) => {
            assert_eq!(reference, "blueprint:imported_blueprint");
            assert_eq!(*kind, ImportKind::Blueprint);
        }
        other => panic!("expected blueprint not found, got {other:?}"),
    }
}

#[tokio::test]
async fn local_import_needs_no_storage() {
    let resolver = ImportResolver::new(
        MemoryCatalog::empty(),
        MemoryBlueprintStore::default(),
        platform(),
    );

    let local = parse_with("blueprint_local_using_substitution_mapping.yaml", &resolver)
        .await
        .expect("local");
    let inlined = parse_with("final_blueprint_with_substitution_mapping.yaml", &resolver)
        .await
        .expect("inlined");

    assert_eq!(local.sections, inlined.sections);
    assert_eq!(local.imports[0].kind, ImportKind::Plain);
}

#[tokio::test]
async fn cyclic_imports_are_loaded_once() {
    let resolver = ImportResolver::new(
        MemoryCatalog::empty(),
        MemoryBlueprintStore::default(),
        platform(),
    );

    let plan = parse_with("cycle_a.yaml", &resolver).await.expect("parsed");

    let inputs = plan.section("inputs").expect("inputs");
    assert!(inputs.get("from_a").is_some());
    assert!(inputs.get("from_b").is_some());
    assert_eq!(plan.imports.len(), 2);
}

#[tokio::test]
async fn remote_imports_are_rejected() {
    let resolver = ImportResolver::new(
        MemoryCatalog::empty(),
        MemoryBlueprintStore::default(),
        platform(),
    );

    let err = parse_with("blueprint_with_remote_import.yaml", &resolver)
        .await
        .unwrap_err();

    assert!(matches!(err, ParseError::UnsupportedImport { .. }));
}

#[tokio::test]
async fn traced_resolver_does_not_change_the_plan() {
    let plain = ImportResolver::new(script_plugin_catalog(), uploaded_blueprints(), platform());
    let traced = TracedResolver::new(
        ImportResolver::new(script_plugin_catalog(), uploaded_blueprints(), platform()),
        true,
    );
    let parser = YamlDslParser::new();
    let file = fixtures().join("blueprint_with_plugin_import.yaml");

    let expected = parser
        .parse(&file, &fixtures(), &plain)
        .await
        .expect("plain");
    let actual = parser
        .parse(&file, &fixtures(), &traced)
        .await
        .expect("traced");

    assert_eq!(expected, actual);
}
