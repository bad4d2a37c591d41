use sqlx::PgPool;

use crate::error::Result;

#[derive(Debug, sqlx::FromRow)]
pub struct RawPlugin {
    pub id: String,
    pub package_name: String,
    pub package_version: String,
    pub supported_platform: Option<String>,
    pub distribution: Option<String>,
    pub distribution_release: Option<String>,
    pub package_path: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct RawBlueprint {
    pub id: String,
    pub main_file_name: String,
}

const PLUGIN_COLUMNS: &str = r#"
    id,
    package_name,
    package_version,
    supported_platform,
    distribution,
    distribution_release,
    package_path
"#;

pub async fn list_plugins_by_name_version(
    pool: &PgPool,
    name: &str,
    version: &str,
) -> Result<Vec<RawPlugin>> {
    let sql = format!(
        "select {PLUGIN_COLUMNS} from plugins \
         where package_name = $1 and package_version = $2 \
         order by id"
    );
    let rows = sqlx::query_as::<_, RawPlugin>(&sql)
        .bind(name)
        .bind(version)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn list_all_plugins(pool: &PgPool) -> Result<Vec<RawPlugin>> {
    let sql = format!(
        "select {PLUGIN_COLUMNS} from plugins \
         order by package_name, package_version, id"
    );
    let rows = sqlx::query_as::<_, RawPlugin>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn fetch_blueprint(pool: &PgPool, blueprint_id: &str) -> Result<Option<RawBlueprint>> {
    let row = sqlx::query_as::<_, RawBlueprint>(
        r#"
        select id, main_file_name
        from blueprints
        where id = $1
        "#,
    )
    .bind(blueprint_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}
