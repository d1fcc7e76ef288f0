// cli.rs - CLI utility for database migrations and admin provisioning
use std::env;
use std::io;
use std::io::Write;
use thiserror::Error;
use clap::{Parser, Subcommand};

use crate::app;
use crate::app::MigrationError;
use crate::auth;
use crate::auth::Role;
use crate::cfg;
use crate::core::{DbContext, DbError};
use crate::db;
use crate::db::NewUser;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Migration creation failed")]
    MigrationCreateFailed { #[source] source: MigrationError },

    // NoMigrationsApplied is reported as status output, not as an error
    #[error("Checking migration status failed")]
    MigrationStatusCheckFailed { #[source] source: MigrationError },

    #[error("Running migrations failed")]
    MigrationRunFailed { #[source] source: MigrationError },

    #[error("Reading the password failed")]
    PasswordPromptFailed { #[from] source: io::Error },

    #[error("Hashing the password failed: {0}")]
    PasswordHashingFailed(argon2::password_hash::Error),

    #[error("Creating the admin user failed")]
    AdminCreationFailed { #[source] source: DbError },

    #[error("{0}")]
    InvalidInput(String),
}

#[derive(Parser)]
#[command(name = "migrate")]
#[command(about = "Database migration and admin utility", long_about = None)]
struct Cli {
    #[command(subcommand)]
    migrate_sub_command: MigrateSubCommands,
}

#[derive(Subcommand)]
enum MigrateSubCommands {
    /// Create a new migration file
    Create {
        /// Name of the migration
        name: String,
    },
    /// List all available migrations
    List,
    /// Check if there are pending migrations
    Status,
    /// Run all pending migrations
    Run,
    /// Create an admin user; admins cannot sign up through the API
    CreateAdmin {
        /// Email for the admin user
        #[arg(short, long)]
        email: String,
        /// Full name shown in the admin console
        #[arg(short, long, default_value = "Administrator")]
        name: String,
        /// Phone number (optional)
        #[arg(short, long, default_value = "")]
        phone: String,
    },
}

/// Runs a `migrate ...` command if one was given. Returns `true` when a
/// command ran and the server should not start.
pub async fn run_cli(db: &DbContext) -> Result<bool, CliError> {
    let args: Vec<String> = env::args().collect();

    // Only run if this is explicitly called with the right arguments
    if args.len() < 2 || args[1] != "migrate" {
        return Ok(false);
    }

    // Rewrite args for clap to parse correctly (remove the "migrate" argument)
    let mut cli_args = vec![args[0].clone()];
    cli_args.extend(args.iter().skip(2).cloned());

    let cli = Cli::parse_from(cli_args);

    match cli.migrate_sub_command {
        MigrateSubCommands::Create { name } => {
            let filename = app::create_migration(&name)
                .map_err(|e| CliError::MigrationCreateFailed { source: e })?;
            println!("Created new migration file: {filename}");
        },
        MigrateSubCommands::List => {
            let migrations = app::list_migrations();
            if migrations.is_empty() {
                println!("No migrations found.");
            } else {
                println!("Available migrations:");
                for (i, migration) in migrations.iter().enumerate() {
                    println!("{}. {}", i + 1, migration);
                }
            }
        },
        MigrateSubCommands::Status => {
            match app::check_pending_migrations(db).await {
                Ok(true) => println!("There are pending migrations that need to be applied."),
                Ok(false) => println!("Database is up to date. No pending migrations."),
                Err(MigrationError::NoMigrationsApplied) => println!("No migrations have been applied yet."),
                Err(e) => return Err(CliError::MigrationStatusCheckFailed { source: e }),
            }
        },
        MigrateSubCommands::Run => {
            app::run_migrations(db).await
                .map_err(|e| CliError::MigrationRunFailed { source: e })?;
            println!("Migrations applied successfully.");
        },
        MigrateSubCommands::CreateAdmin { email, name, phone } => {
            app::run_migrations(db).await
                .map_err(|e| CliError::MigrationRunFailed { source: e })?;

            // Prompt for password securely
            print!("Enter password for admin user '{email}': ");
            io::stdout().flush()?;
            let password = rpassword::read_password()?;

            let min_length = cfg::AuthSettings::default().min_password_length;
            auth::validate_new_password(&password, min_length)
                .map_err(|e| CliError::InvalidInput(e.to_string()))?;

            create_admin_user(db, &email, &name, &phone, &password).await?;
            println!("Admin user '{email}' created successfully!");
        },
    }

    Ok(true)
}

async fn create_admin_user(
    db: &DbContext,
    email: &str,
    full_name: &str,
    phone: &str,
    password: &str,
) -> Result<(), CliError> {
    if db::get_user_by_email(db, email).await.is_ok() {
        return Err(CliError::InvalidInput(format!("User '{email}' already exists")));
    }

    let new_user = NewUser {
        email: email.trim().to_lowercase(),
        password_hash: auth::hash_password(password).map_err(CliError::PasswordHashingFailed)?,
        full_name: full_name.to_string(),
        phone: phone.to_string(),
    };
    db::create_user_with_role(db, &new_user, Role::Admin)
        .await
        .map_err(|e| CliError::AdminCreationFailed { source: e })?;
    Ok(())
}
