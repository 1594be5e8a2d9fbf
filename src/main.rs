use clap::Parser;
use colored::*;
use star_neighbours_server::api::{create_router, serve, AppState};
use star_neighbours_server::cli::{Cli, Command, CreateApiKeyArgs, DatabaseArgs, ServeArgs, Strategy};
use star_neighbours_server::credentials::{issue_api_key, parse_expiry, SurrealCredentialStore};
use star_neighbours_server::github::{RestStarSource, StarSource};
use star_neighbours_server::graphql::GraphQlStarSource;
use star_neighbours_server::pool::create_pool;
use star_neighbours_server::transport::HttpTransport;
use star_neighbours_server::{Result, StarNeighbourService, StarNeighboursError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => run_server(args).await,
        Command::CreateApiKey(args) => create_api_key(args).await,
    }
}

async fn connect_credentials(database: &DatabaseArgs) -> Result<SurrealCredentialStore> {
    let pool = Arc::new(create_pool(database.into(), database.into())?);
    let store = SurrealCredentialStore::new(pool);
    store.define_schema().await?;
    Ok(store)
}

fn build_star_source(args: &ServeArgs) -> Result<Arc<dyn StarSource>> {
    let transport = Arc::new(HttpTransport::new(
        args.github_token.clone(),
        Duration::from_secs(args.request_timeout),
    )?);

    match args.strategy {
        Strategy::Rest => {
            if !transport.has_token() {
                warn!("GITHUB_TOKEN not set; unauthenticated REST requests are heavily rate limited");
            }
            let source = RestStarSource::new(transport, &args.github_api_url)?
                .with_lookup_concurrency(args.lookup_concurrency);
            Ok(Arc::new(source))
        }
        Strategy::Graphql => {
            if !transport.has_token() {
                return Err(StarNeighboursError::ConfigError(
                    "GITHUB_TOKEN is required for the GraphQL strategy".to_string(),
                ));
            }
            Ok(Arc::new(GraphQlStarSource::new(transport, &args.github_graphql_url)?))
        }
    }
}

async fn run_server(args: ServeArgs) -> Result<()> {
    println!("{}", "Star Neighbours Server".bold().green());
    println!("{}\n", "=".repeat(50).dimmed());

    let source = build_star_source(&args)?;
    let service = StarNeighbourService::new(source)
        .with_timeout(args.discovery_timeout.map(Duration::from_secs));
    println!("✅ Using {} strategy", service.strategy());

    let credentials = connect_credentials(&args.database).await?;
    println!("✅ Connected to credential store at {}", args.database.db_url);

    let state = AppState::new(Arc::new(service), Arc::new(credentials));
    let router = create_router(state);

    println!("\nPress Ctrl+C to stop the server\n");

    serve(router, &args.bind, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
        }
        println!("\n🛑 Shutting down server...");
    })
    .await?;

    info!("Server stopped");
    println!("✅ Server stopped");
    Ok(())
}

async fn create_api_key(args: CreateApiKeyArgs) -> Result<()> {
    let expire_at = match args.expire_at.as_deref().map(parse_expiry).transpose() {
        Ok(expire_at) => expire_at,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };

    let store = connect_credentials(&args.database).await?;

    match issue_api_key(&store, &args.username, &args.email, expire_at, chrono::Utc::now()).await {
        Ok(credential) => {
            println!("{}", "✓ User created successfully!".green());
            println!("  Username: {}", credential.username);
            println!("  Email: {}", credential.email);
            println!("  API Key: {}", credential.api_key.bold());
            println!("  Valid Until: {}", credential.api_key_valid_until.to_rfc3339());
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", "Error creating user:".red().bold(), e);
            Err(e)
        }
    }
}
