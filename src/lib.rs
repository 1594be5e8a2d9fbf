pub mod api;
pub mod auth;
pub mod cli;
pub mod credentials;
pub mod discovery;
pub mod error;
pub mod github;
pub mod graphql;
pub mod health;
pub mod models;
pub mod neighbours;
pub mod pagination;
pub mod pool;
pub mod surreal_client;
pub mod transport;
pub mod types;

pub use discovery::{DiscoveryFailure, StarNeighbourService};
pub use error::{Result, StarNeighboursError};
pub use models::{NeighbourResult, RepositoryFullName, StarredRepoSet};
