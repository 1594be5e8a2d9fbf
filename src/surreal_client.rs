use anyhow::{ Context, Result };
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;
use tracing::{ debug, info };

use crate::models::{ ApiUser, NewApiUser };

const API_USER_TABLE: &str = "api_user";

#[derive(Clone, Debug)]
pub struct SurrealClient {
    pub db: Surreal<Any>,
}

impl SurrealClient {
    /// Create a new SurrealDB client
    pub async fn new(
        connection_url: &str,
        username: &str,
        password: &str,
        namespace: &str,
        database: &str
    ) -> Result<Self> {
        info!("Connecting to SurrealDB at {}", connection_url);

        let db: Surreal<Any> = Surreal::init();
        db.connect(connection_url).await.context("Failed to connect to SurrealDB")?;

        db
            .signin(Root { username, password }).await
            .context("Failed to authenticate with SurrealDB")?;

        db
            .use_ns(namespace)
            .use_db(database).await
            .context("Failed to select namespace and database")?;

        info!("Successfully connected to SurrealDB");
        Ok(Self { db })
    }

    /// Define the `api_user` table and its unique indexes
    pub async fn define_schema(&self) -> Result<()> {
        let schema =
            r#"
            DEFINE TABLE IF NOT EXISTS api_user SCHEMALESS;
            DEFINE INDEX IF NOT EXISTS api_user_api_key ON api_user FIELDS api_key UNIQUE;
            DEFINE INDEX IF NOT EXISTS api_user_username ON api_user FIELDS username UNIQUE;
            DEFINE INDEX IF NOT EXISTS api_user_email ON api_user FIELDS email UNIQUE;
        "#;

        self.db.query(schema).await?.check().context("Failed to define api_user schema")?;
        debug!("api_user schema ready");
        Ok(())
    }

    /// Look up the user owning an API key
    pub async fn find_api_user(&self, api_key: &str) -> Result<Option<ApiUser>> {
        let query =
            r#"
            SELECT * FROM api_user WHERE api_key = $api_key LIMIT 1
        "#;

        let mut result = self.db
            .query(query)
            .bind(("api_key", api_key.to_string())).await
            .context("Failed to query api_user")?;

        let users: Vec<ApiUser> = result.take(0)?;
        Ok(users.into_iter().next())
    }

    /// Insert a new API user
    pub async fn create_api_user(&self, user: NewApiUser) -> Result<ApiUser> {
        let username = user.username.clone();
        let created: Option<ApiUser> = self.db
            .create(API_USER_TABLE)
            .content(user).await
            .with_context(|| format!("Failed to create api_user {}", username))?;

        created.with_context(|| format!("No record returned creating api_user {}", username))
    }

    /// Round-trip a trivial query
    pub async fn ping(&self) -> Result<()> {
        self.db.query("RETURN 1").await?.check()?;
        Ok(())
    }
}
