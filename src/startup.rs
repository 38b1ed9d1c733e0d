use crate::config::Config;
use crate::validation::validate_base_url;
use anyhow::{Context, Result};
use sqlx::PgPool;

pub struct ValidationReport {
    pub environment: bool,
    pub gateway: bool,
    /// `None` when no database is configured.
    pub database: Option<bool>,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.environment && self.gateway && self.database.unwrap_or(true)
    }

    pub fn print(&self) {
        println!("\n=== Startup Validation Report ===");
        println!("Environment Variables: {}", status(self.environment));
        println!("Gateway Settings:      {}", status(self.gateway));
        println!(
            "Database Connectivity: {}",
            self.database.map(status).unwrap_or("SKIPPED")
        );

        if !self.errors.is_empty() {
            println!("\nErrors:");
            for error in &self.errors {
                println!("  ❌ {}", error);
            }
        }

        println!("\nOverall Status: {}", if self.is_valid() { "✅ PASS" } else { "❌ FAIL" });
        println!("=================================\n");
    }
}

fn status(ok: bool) -> &'static str {
    if ok { "✅ OK" } else { "❌ FAIL" }
}

pub async fn validate_environment(config: &Config, pool: Option<&PgPool>) -> Result<ValidationReport> {
    let mut report = ValidationReport {
        environment: true,
        gateway: true,
        database: None,
        errors: Vec::new(),
    };

    if let Err(e) = validate_env_vars(config) {
        report.environment = false;
        report.errors.push(format!("Environment: {}", e));
    }

    if let Err(e) = config.gateway.validate() {
        report.gateway = false;
        report.errors.push(format!("Gateway: {}", e));
    }

    if let Some(pool) = pool {
        match validate_database(pool).await {
            Ok(()) => report.database = Some(true),
            Err(e) => {
                report.database = Some(false);
                report.errors.push(format!("Database: {}", e));
            }
        }
    }

    Ok(report)
}

fn validate_env_vars(config: &Config) -> Result<()> {
    validate_base_url("PUBLIC_BASE_URL", &config.public_base_url)?;

    if let Some(database_url) = &config.database_url {
        url::Url::parse(database_url).context("DATABASE_URL is not a valid URL")?;
    }

    Ok(())
}

async fn validate_database(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await
        .context("Failed to connect to database")?;

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .context("Failed to check migrations table")?;

    if applied == 0 {
        anyhow::bail!("No migrations applied");
    }

    Ok(())
}
