mod ansi;
mod mysql;
mod postgres;
mod sqlite;

pub use ansi::AnsiDialect;
pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;
