//! CLI subcommands.

pub mod migrate;
pub mod product;

/// Read the bridge database URL, falling back to `DATABASE_URL`.
pub(crate) fn database_url() -> Result<secrecy::SecretString, &'static str> {
    dotenvy::dotenv().ok();

    std::env::var("BRIDGE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(secrecy::SecretString::from)
        .map_err(|_| "BRIDGE_DATABASE_URL")
}
