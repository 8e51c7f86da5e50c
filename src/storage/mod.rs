//! SQLite storage for API settings, cached races and stored predictions.

pub mod credentials;
pub mod repository;
pub mod schema;

pub use credentials::{ApiCredentials, CredentialProvider, StaticCredentials};
pub use repository::{NewPrediction, NewRace, Repository, StoredPrediction, StoredRace};
pub use schema::create_tables;
