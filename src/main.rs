use anyhow::{bail, Context, Result};
use chrono::Duration;
use rusqlite::Connection;
use std::env;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

// Use library instead of local modules
use jar_ledger::{add_member, create_category, create_jar, issue_session, setup_database, Config};

const USAGE: &str = "usage:
  jar-ledger migrate
  jar-ledger create-jar <name> <owner-user-id>
  jar-ledger add-member <jar-id> <user-id> [OWNER|MEMBER]
  jar-ledger add-category <jar-id> <name> <INCOME|EXPENSE|SAVINGS>
  jar-ledger issue-session <user-id>";

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = Config::from_env()?;

    let Some(command) = args.first() else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };

    let conn = Connection::open(&config.database_path)
        .with_context(|| format!("Failed to open database {:?}", config.database_path))?;
    setup_database(&conn)?;

    match (command.as_str(), &args[1..]) {
        ("migrate", []) => {
            info!(db = ?config.database_path, "database schema is up to date");
        }
        ("create-jar", [name, owner]) => {
            let jar_id = create_jar(&conn, name, owner)?;
            info!(%jar_id, %owner, "jar created");
            println!("{}", jar_id);
        }
        ("add-member", [jar_id, user_id, rest @ ..]) if rest.len() <= 1 => {
            let role = match rest.first() {
                Some(role) => role.parse()?,
                None => jar_ledger::MemberRole::Member,
            };
            add_member(&conn, jar_id, user_id, role)?;
            info!(%jar_id, %user_id, role = role.as_str(), "member added");
        }
        ("add-category", [jar_id, name, entry_type]) => {
            let category_id = create_category(&conn, jar_id, name, entry_type.parse()?)?;
            info!(%jar_id, %category_id, "category created");
            println!("{}", category_id);
        }
        ("issue-session", [user_id]) => {
            let token = issue_session(&conn, user_id, Duration::hours(config.session_ttl_hours))?;
            info!(%user_id, ttl_hours = config.session_ttl_hours, "session issued");
            println!("{}", token);
        }
        _ => {
            eprintln!("{}", USAGE);
            bail!("unrecognized command: {}", args.join(" "));
        }
    }

    Ok(())
}
