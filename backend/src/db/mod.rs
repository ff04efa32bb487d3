pub mod schema;

use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;

/// SQLite only: the repositories use `?` placeholders, which the `Any` driver
/// passes through unchanged.
#[derive(Clone)]
pub struct Db {
    pub pool: AnyPool,
}

impl Db {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        if !database_url.starts_with("sqlite:") {
            anyhow::bail!("unsupported database url {database_url:?}; expected sqlite:");
        }

        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        schema::migrate(&self.pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn rejects_non_sqlite_urls() {
        let err = Db::connect("postgres://localhost/chainpulse", 1).await.err().unwrap();
        assert!(err.to_string().contains("unsupported database url"));
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let url = format!("sqlite:file:{}?mode=memory&cache=shared", Uuid::new_v4());
        let db = Db::connect(&url, 2).await.unwrap();

        db.migrate().await.unwrap();
        db.migrate().await.unwrap();
    }
}
