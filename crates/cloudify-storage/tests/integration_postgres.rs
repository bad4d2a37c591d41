use anyhow::{Context, Result, anyhow};
use cloudify_storage::{BlueprintStore, PluginQuery, PluginRegistry, PostgresStore};
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::path::Path;
use std::{env, fs};

const FIXTURE_PATHS: &[&str] = &[
    "fixtures/sql/postgres/001_schema.sql",
    "fixtures/sql/postgres/002_data.sql",
];

fn database_url() -> Option<String> {
    env::var("TEST_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .ok()
}

async fn run_fixture(pool: &PgPool, path: &str) -> Result<()> {
    let script = fs::read_to_string(path).with_context(|| format!("reading fixture {path}"))?;

    for statement in script.split(';') {
        let sql = statement.trim();
        if sql.is_empty() {
            continue;
        }

        sqlx::query(sql)
            .execute(pool)
            .await
            .with_context(|| format!("executing fixture {path}"))?;
    }

    Ok(())
}

async fn reset_fixtures(pool: &PgPool) -> Result<()> {
    for path in FIXTURE_PATHS {
        run_fixture(pool, path).await?;
    }
    Ok(())
}

#[tokio::test]
async fn reads_catalog_and_blueprints_from_postgres() -> Result<()> {
    let Some(db_url) = database_url() else {
        eprintln!("skipping: set TEST_DATABASE_URL or DATABASE_URL for integration tests");
        return Ok(());
    };
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(std::time::Duration::from_secs(10))
        .connect(&db_url)
        .await
        .context("connecting to Postgres")?;

    reset_fixtures(&pool).await?;

    let store = PostgresStore::new(pool, "/opt/manager/resources/blueprints");

    let script = store
        .find_plugins(&PluginQuery::new("cloudify-script-plugin", "1.2"))
        .await?;
    assert_eq!(script.len(), 1);
    assert!(script[0].is_universal());

    let openstack = store
        .find_plugins(&PluginQuery::new("cloudify-openstack-plugin", "2.0.1"))
        .await?;
    assert_eq!(openstack.len(), 2);
    let ubuntu = openstack
        .iter()
        .find(|entry| entry.distribution.as_deref() == Some("ubuntu"))
        .ok_or_else(|| anyhow!("expected ubuntu build"))?;
    assert_eq!(ubuntu.package_path, None, "blank package path maps to None");

    let missing = store
        .find_plugins(&PluginQuery::new("cloudify-script-plugin", "9.9"))
        .await?;
    assert!(missing.is_empty());

    assert_eq!(store.list_plugins().await?.len(), 3);

    let blueprint = store
        .get_blueprint("imported_blueprint")
        .await?
        .ok_or_else(|| anyhow!("expected imported_blueprint"))?;
    assert_eq!(
        blueprint.root_document(),
        Path::new(
            "/opt/manager/resources/blueprints/imported_blueprint/blueprint_with_substitution_mapping.yaml"
        )
    );
    assert!(store.get_blueprint("nope").await?.is_none());

    Ok(())
}
