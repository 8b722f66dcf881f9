use anyhow::{anyhow, Result};
use hackabot::config::Config;
use hackabot::database::connection::DatabaseManager;
use hackabot::database::models::{Node, Photo};
use hackabot::utils::datetime::event_date_for;
use std::collections::HashMap;
use std::env;
use std::io;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hackabot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("migrate");
    let dry_run = args.iter().skip(2).any(|arg| arg == "--dry-run");

    match command {
        "migrate" | "up" => run_migrations().await,
        "check" => check_database().await,
        "reset" => reset_database().await,
        "backfill-photo-dates" => backfill_photo_dates(dry_run).await,
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {command}");
            print_help();
            std::process::exit(1);
        }
    }
}

fn sqlite_path(database_url: &str) -> Option<&str> {
    database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
}

async fn run_migrations() -> Result<()> {
    println!("🔧 Hackabot - Database Migration Tool");
    println!("=====================================");

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    println!("📊 Database URL: {}", mask_url(&config.database_url));

    if let Some(db_path) = sqlite_path(&config.database_url) {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                println!("📁 Creating directory: {}", parent.display());
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    println!("🚀 Running database migrations...");

    let db_manager = DatabaseManager::new(&config.database_url)
        .await
        .map_err(|e| anyhow!("Failed to connect to database: {}", e))?;

    match db_manager.run_migrations().await {
        Ok(()) => println!("✅ Migrations completed successfully!"),
        Err(e) => {
            eprintln!("❌ Migration failed: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn check_database() -> Result<()> {
    println!("🔍 Checking database connection and schema...");

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    println!("📊 Database URL: {}", mask_url(&config.database_url));

    let db_manager = DatabaseManager::new(&config.database_url)
        .await
        .map_err(|e| anyhow!("Failed to connect to database: {}", e))?;

    match check_tables(&db_manager).await {
        Ok(tables) => {
            println!("✅ Database connection successful!");
            println!("📋 Found tables:");
            for table in tables {
                println!("  • {table}");
            }
        }
        Err(e) => {
            println!("⚠️  Database check failed: {e}");
            println!("💡 Try running 'migrate up' to create the schema");
        }
    }

    Ok(())
}

async fn reset_database() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    if config.is_production() {
        return Err(anyhow!("Refusing to reset a production database"));
    }

    println!("⚠️  WARNING: This will delete ALL data in the database!");
    println!("🤔 Are you sure you want to continue? (yes/no)");

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    if input.trim().to_lowercase() != "yes" {
        println!("❌ Reset cancelled.");
        return Ok(());
    }

    let Some(db_path) = sqlite_path(&config.database_url) else {
        return Err(anyhow!("Reset is only supported for SQLite databases"));
    };
    if Path::new(db_path).exists() {
        std::fs::remove_file(db_path)?;
        println!("🗑️  Deleted database file: {db_path}");
    }

    println!("🔄 Recreating database schema...");
    run_migrations().await?;

    println!("✅ Database reset completed!");
    Ok(())
}

/// Moves every photo's date back to its node's event day, keeping the time.
async fn backfill_photo_dates(dry_run: bool) -> Result<()> {
    println!("🖼️  Backfilling photo dates{}", if dry_run { " (dry run)" } else { "" });

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    let db_manager = DatabaseManager::new(&config.database_url)
        .await
        .map_err(|e| anyhow!("Failed to connect to database: {}", e))?;
    let pool = &db_manager.pool;

    let nodes: HashMap<i64, Node> = Node::find_all(pool)
        .await?
        .into_iter()
        .map(|node| (node.id, node))
        .collect();

    let mut updated = 0;
    for (photo_id, node_id, created) in Photo::all_dates(pool).await? {
        let Some(node) = nodes.get(&node_id) else {
            continue;
        };

        let event_date = event_date_for(created, node.event_weekday(), node.tz());
        if event_date == created {
            continue;
        }

        println!(
            "  • Photo {photo_id} ({}): {} -> {}",
            node.name,
            created.format("%Y-%m-%d"),
            event_date.format("%Y-%m-%d")
        );
        if !dry_run {
            Photo::set_created(pool, photo_id, event_date).await?;
        }
        updated += 1;
    }

    if dry_run {
        println!("✅ Would update {updated} photos");
    } else {
        println!("✅ Updated {updated} photos");
    }
    Ok(())
}

async fn check_tables(db_manager: &DatabaseManager) -> Result<Vec<String>> {
    let tables = sqlx::query_scalar::<_, String>(
        "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
    )
    .fetch_all(&db_manager.pool)
    .await?;

    Ok(tables)
}

fn mask_url(url: &str) -> String {
    match sqlite_path(url).and_then(|path| Path::new(path).file_name()) {
        Some(filename) => format!("sqlite:.../{}", filename.to_string_lossy()),
        None => url.to_string(),
    }
}

fn print_help() {
    println!("🤖 Hackabot - Database Migration Tool");
    println!();
    println!("USAGE:");
    println!("    migrate [COMMAND] [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    migrate, up            Run database migrations (default)");
    println!("    check                  Check database connection and schema");
    println!("    reset                  Reset database (SQLite, dev only) - DESTRUCTIVE!");
    println!("    backfill-photo-dates   Move photo dates to their node's event day");
    println!("    help                   Show this help message");
    println!();
    println!("OPTIONS:");
    println!("    --dry-run              With backfill-photo-dates, only report changes");
    println!();
    println!("ENVIRONMENT:");
    println!("    DATABASE_URL   Database connection string (default: sqlite:./data/hackabot.db)");
    println!();
    println!("EXAMPLES:");
    println!("    migrate                                # Run migrations");
    println!("    migrate check                          # Check database status");
    println!("    migrate backfill-photo-dates --dry-run # Preview photo date changes");
    println!();
}
