use std::borrow::Cow;

use ::duckdb::Connection;
use rankimport_core::SCREENER_COLUMNS;

use crate::sql;

pub(crate) const SCREENER_TABLE: &str = "screener_facts";
pub(crate) const SCREENER_KEY: &[&str] = &["ticker", "composite_figi", "event_date"];

enum MigrationSql {
    Static(&'static str),
    Generated(fn() -> String),
}

impl MigrationSql {
    fn render(&self) -> Cow<'static, str> {
        match self {
            Self::Static(sql) => Cow::Borrowed(sql),
            Self::Generated(build) => Cow::Owned(build()),
        }
    }
}

struct Migration {
    version: &'static str,
    sql: MigrationSql,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "0001_reference_tables",
        sql: MigrationSql::Static(
            r#"
CREATE TABLE IF NOT EXISTS assets (
    ticker TEXT NOT NULL,
    name TEXT,
    composite_figi TEXT,
    primary_exchange TEXT,
    active BOOLEAN NOT NULL DEFAULT TRUE,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS balance_sheet_exclusions (
    ticker TEXT NOT NULL,
    composite_figi TEXT NOT NULL,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
        ),
    },
    Migration {
        version: "0002_screener_facts",
        sql: MigrationSql::Generated(screener_facts),
    },
    Migration {
        version: "0003_fundamentals",
        sql: MigrationSql::Static(
            r#"
CREATE TABLE IF NOT EXISTS fundamentals (
    ticker TEXT NOT NULL,
    composite_figi TEXT NOT NULL,
    calendar_date TEXT NOT NULL,
    dim TEXT NOT NULL,
    event_date DATE,
    curr_assets DOUBLE,
    curr_liabilities DOUBLE,
    working_capital DOUBLE,
    download_date DATE,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY (composite_figi, calendar_date, dim)
);
"#,
        ),
    },
    Migration {
        version: "0004_ingest_log",
        sql: MigrationSql::Static(
            r#"
CREATE TABLE IF NOT EXISTS ingest_log (
    request_id TEXT NOT NULL,
    dataset TEXT NOT NULL,
    source_name TEXT,
    event_date DATE,
    status TEXT NOT NULL,
    parsed BIGINT NOT NULL DEFAULT 0,
    saved BIGINT NOT NULL DEFAULT 0,
    failed BIGINT NOT NULL DEFAULT 0,
    latency_ms BIGINT,
    timestamp TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
        ),
    },
];

fn screener_facts() -> String {
    sql::create_table(SCREENER_TABLE, SCREENER_COLUMNS, SCREENER_KEY)
}

pub fn apply_migrations(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    )?;

    for migration in MIGRATIONS {
        let applied_count: i64 = connection.query_row(
            "SELECT COUNT(*) FROM schema_migrations WHERE version = ?",
            [migration.version],
            |row| row.get(0),
        )?;

        if applied_count == 0 {
            connection.execute_batch(migration.sql.render().as_ref())?;
            connection.execute(
                "INSERT INTO schema_migrations (version) VALUES (?)",
                [migration.version],
            )?;
            tracing::debug!(version = migration.version, "applied migration");
        }
    }

    Ok(())
}
