//! Dialect-parameterized synthesis of SELECT / INSERT / UPDATE / DELETE / DDL
//! from a [`eo_fetch::FetchSpecification`] plus a [`eo_model::Model`].
//!
//! The only polymorphism point is [`Dialect`]: everything else in this crate
//! (alias allocation, qualifier rendering, statement assembly) is shared
//! across backends and simply asks the dialect how to spell the bits that
//! differ (placeholders, identifier quoting, lock clauses, column types).
//! [`ExpressionFactory`] is the per-adaptor entry point `eo-adaptor` and
//! `eo-channel` hold a trait object of.

pub mod builder;
pub mod ddl;
pub mod dialect;
pub mod dialects;
pub mod dml;
pub mod error;
pub mod expression;
pub mod factory;
pub mod predicate;
pub mod select;

pub use builder::{AliasBook, ResolvedColumn};
pub use ddl::{create_table_statements_for_entities, drop_table_statements_for_entities};
pub use dialect::{Dialect, DialectKind, PlaceholderStyle};
pub use error::SqlError;
pub use expression::SqlExpression;
pub use factory::{AnsiExpressionFactory, ExpressionFactory, MySqlExpressionFactory, PostgresExpressionFactory, SqliteExpressionFactory};
pub use select::combined_qualifier;
