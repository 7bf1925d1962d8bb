mod products;
mod users;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::products::run_products_import;
use crate::users::{run_create_admin, run_make_admin};

#[derive(Debug, Parser)]
#[command(name = "storefront-cli")]
#[command(about = "Storefront maintenance command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Account administration
    Users {
        #[command(subcommand)]
        command: UsersCommands,
    },
    /// Catalog maintenance
    Products {
        #[command(subcommand)]
        command: ProductsCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check that the database is reachable
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Upsert the default category set
    Seed,
}

#[derive(Debug, Subcommand)]
enum UsersCommands {
    /// Create an admin account, or promote the account if the email exists
    CreateAdmin {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "STOREFRONT_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Promote an existing account to admin
    MakeAdmin {
        #[arg(long)]
        email: String,
    },
}

#[derive(Debug, Subcommand)]
enum ProductsCommands {
    /// Bulk-import products from a CSV or JSON file
    Import {
        /// Path to a `.csv` or `.json` file
        file: PathBuf,
        /// Resolve every row and print the report without writing anything
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("storefront-cli: run with --help to list commands");
        return Ok(());
    };

    let config = storefront_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = storefront_db::PoolConfig::from_app_config(&config);
    let pool = storefront_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db { command } => match command {
            DbCommands::Ping => {
                storefront_db::ping(&pool).await?;
                println!("database ok");
            }
            DbCommands::Migrate => {
                let applied = storefront_db::run_migrations(&pool).await?;
                println!("applied {applied} migration(s)");
            }
            DbCommands::Seed => {
                let seeded =
                    storefront_db::seed_categories(&pool, storefront_db::DEFAULT_CATEGORIES)
                        .await?;
                println!("seeded {seeded} categories");
            }
        },
        Commands::Users { command } => match command {
            UsersCommands::CreateAdmin {
                name,
                email,
                password,
            } => run_create_admin(&pool, &name, &email, &password).await?,
            UsersCommands::MakeAdmin { email } => run_make_admin(&pool, &email).await?,
        },
        Commands::Products { command } => match command {
            ProductsCommands::Import { file, dry_run } => {
                run_products_import(&pool, &file, dry_run).await?;
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests;
