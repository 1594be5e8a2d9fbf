use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "star-neighbours-server")]
#[command(about = "Star Neighbours Server - Finds GitHub repositories that share stargazers")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API
    Serve(ServeArgs),

    /// Create a user with a new API key
    CreateApiKey(CreateApiKeyArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Stargazers, then each stargazer's stars, over the REST API
    Rest,
    /// Batched GraphQL queries
    Graphql,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Address to bind the HTTP server to
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind: String,

    /// GitHub token used for upstream requests
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// GitHub REST API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = crate::github::API_BASE_URL)]
    pub github_api_url: String,

    /// GitHub GraphQL endpoint
    #[arg(long, env = "GITHUB_GRAPHQL_URL", default_value = crate::graphql::GRAPHQL_URL)]
    pub github_graphql_url: String,

    /// Upstream access strategy
    #[arg(long, env = "STAR_STRATEGY", value_enum, default_value_t = Strategy::Rest)]
    pub strategy: Strategy,

    /// Starred-repo lookups in flight at once (REST strategy)
    #[arg(long, env = "LOOKUP_CONCURRENCY", default_value_t = 1)]
    pub lookup_concurrency: usize,

    /// Per-request upstream timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT", default_value_t = 30)]
    pub request_timeout: u64,

    /// Overall discovery timeout in seconds
    #[arg(long, env = "DISCOVERY_TIMEOUT")]
    pub discovery_timeout: Option<u64>,

    #[command(flatten)]
    pub database: DatabaseArgs,
}

#[derive(Args)]
pub struct CreateApiKeyArgs {
    pub username: String,

    pub email: String,

    /// Expiry (ISO 8601); defaults to 90 days from now
    #[arg(long)]
    pub expire_at: Option<String>,

    #[command(flatten)]
    pub database: DatabaseArgs,
}

#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    /// SurrealDB connection URL
    #[arg(long, env = "DB_URL", default_value = "ws://localhost:8000")]
    pub db_url: String,

    /// SurrealDB username
    #[arg(long, env = "DB_USER", default_value = "root")]
    pub db_user: String,

    /// SurrealDB password
    #[arg(long, env = "DB_PASS", default_value = "root", hide_env_values = true)]
    pub db_pass: String,

    /// SurrealDB namespace
    #[arg(long, env = "DB_NAMESPACE", default_value = "stargazer")]
    pub db_namespace: String,

    /// SurrealDB database
    #[arg(long, env = "DB_DATABASE", default_value = "auth")]
    pub db_database: String,

    /// Maximum pooled SurrealDB connections
    #[arg(long, env = "DB_POOL_MAX_SIZE", default_value_t = 10)]
    pub db_pool_max_size: usize,

    /// Seconds to wait for a SurrealDB connection
    #[arg(long, env = "DB_CONNECTION_TIMEOUT", default_value_t = 30)]
    pub db_connection_timeout: u64,
}
