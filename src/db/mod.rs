pub mod queries;

use anyhow::Context;
use rusqlite::Connection;

// Compiled into the binary so a deployment is just the executable plus its
// database file. Ordered; each entry runs once and is recorded by name.
const MIGRATIONS: &[(&str, &str)] = &[
    ("0001_init", include_str!("../../migrations/0001_init.sql")),
    (
        "0002_seed_rooms",
        include_str!("../../migrations/0002_seed_rooms.sql"),
    ),
];

pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path).context("failed to open database")?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("failed to set database pragmas")?;

    apply_migrations(&conn)?;

    Ok(conn)
}

fn apply_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .context("failed to create schema_migrations table")?;

    for (name, sql) in MIGRATIONS {
        let applied: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM schema_migrations WHERE name = ?1)",
            [name],
            |row| row.get(0),
        )?;
        if applied {
            continue;
        }

        conn.execute_batch(sql)
            .with_context(|| format!("schema migration {name} failed"))?;
        conn.execute("INSERT INTO schema_migrations (name) VALUES (?1)", [name])?;

        tracing::debug!(migration = name, "schema migration applied");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_applies_schema_and_seed() {
        let conn = init_db(":memory:").unwrap();

        let rooms: i64 = conn
            .query_row("SELECT COUNT(*) FROM rooms", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rooms, 6);

        let recorded: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(recorded, MIGRATIONS.len() as i64);
    }

    #[test]
    fn test_migrations_run_once() {
        let conn = init_db(":memory:").unwrap();

        // A second pass must skip everything already recorded; the seed
        // would otherwise violate the rooms primary key.
        apply_migrations(&conn).unwrap();

        let rooms: i64 = conn
            .query_row("SELECT COUNT(*) FROM rooms", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rooms, 6);
    }
}
