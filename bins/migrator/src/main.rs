//! Database migration runner for the settlement store.
//!
//! Reads `DATABASE_URL` (or `-u <url>`).
//!
//! Usage:
//!   migrator up      - Create the settlements table
//!   migrator down    - Drop it again
//!   migrator status  - Show migration status

use sea_orm_migration::prelude::*;
use bahi_db::migration::Migrator;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    cli::run_cli(Migrator).await;
}
