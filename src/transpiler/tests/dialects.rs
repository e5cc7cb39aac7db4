//! Dialect-specific rendering: quoting, placeholders, pagination, operator
//! fallbacks and capability errors.

use pretty_assertions::assert_eq;

use super::{tweet, user};
use crate::ast::*;
use crate::error::QuarryError;
use crate::transpiler::{Dialect, DialectConfig, ToSql};

fn active_users() -> SelectBuilder {
    let u = user();
    Query::select([u.col("id"), u.col("username")])
        .from(&u)
        .filter(u.col("active").eq(true).unwrap())
}

#[test]
fn test_mysql_backticks_and_qmarks() {
    let compiled = active_users().limit(5).to_sql_for(Dialect::MySQL).unwrap();
    assert_eq!(
        compiled.sql,
        "SELECT t1.`id`, t1.`username` FROM `user` AS t1 WHERE (t1.`active` = ?) LIMIT 5"
    );
    assert_eq!(compiled.params, vec![Value::Bool(true)]);
}

#[test]
fn test_sqlserver_brackets_and_offset_fetch() {
    let sql = active_users()
        .limit(10)
        .offset(5)
        .to_sql_for(Dialect::SqlServer)
        .unwrap()
        .sql;
    assert_eq!(
        sql,
        "SELECT t1.[id], t1.[username] FROM [user] AS t1 WHERE (t1.[active] = @p1) \
         ORDER BY (SELECT NULL) OFFSET 5 ROWS FETCH NEXT 10 ROWS ONLY"
    );
}

#[test]
fn test_sqlserver_keeps_existing_order() {
    let u = user();
    let sql = Query::select([u.col("id")])
        .from(&u)
        .order_by(u.col("id").desc())
        .limit(3)
        .to_sql_for(Dialect::SqlServer)
        .unwrap()
        .sql;
    assert_eq!(
        sql,
        "SELECT t1.[id] FROM [user] AS t1 ORDER BY t1.[id] DESC OFFSET 0 ROWS FETCH NEXT 3 ROWS ONLY"
    );
}

#[test]
fn test_offset_without_limit() {
    let u = user();
    let query = Query::select([u.col("id")]).from(&u).offset(5);
    assert!(query
        .to_sql_for(Dialect::SQLite)
        .unwrap()
        .sql
        .ends_with(" LIMIT -1 OFFSET 5"));
    assert!(query
        .to_sql_for(Dialect::MySQL)
        .unwrap()
        .sql
        .ends_with(" LIMIT 18446744073709551615 OFFSET 5"));
    assert!(query.to_sql().unwrap().sql.ends_with("AS t1 OFFSET 5"));
}

#[test]
fn test_pattern_operators_per_dialect() {
    let u = user();
    let like = Query::select([u.col("id")])
        .from(&u)
        .filter(u.col("username").like("a*").unwrap());
    let ilike = Query::select([u.col("id")])
        .from(&u)
        .filter(u.col("username").ilike("a%").unwrap());

    assert!(like.to_sql().unwrap().sql.ends_with("WHERE (t1.\"username\" LIKE $1)"));
    assert!(like
        .to_sql_for(Dialect::SQLite)
        .unwrap()
        .sql
        .ends_with("WHERE (t1.\"username\" GLOB ?)"));
    assert!(like
        .to_sql_for(Dialect::MySQL)
        .unwrap()
        .sql
        .ends_with("WHERE (t1.`username` LIKE BINARY ?)"));

    assert!(ilike.to_sql().unwrap().sql.ends_with("WHERE (t1.\"username\" ILIKE $1)"));
    assert!(ilike
        .to_sql_for(Dialect::SQLite)
        .unwrap()
        .sql
        .ends_with("WHERE (t1.\"username\" LIKE ?)"));
}

#[test]
fn test_negated_pattern() {
    let u = user();
    let sql = Query::select([u.col("id")])
        .from(&u)
        .filter(u.col("username").like("a%").unwrap().not())
        .to_sql_for(Dialect::MySQL)
        .unwrap()
        .sql;
    assert!(sql.ends_with("WHERE (t1.`username` NOT LIKE BINARY ?)"));
}

#[test]
fn test_ilike_lowered_without_operator() {
    let u = user();
    let dialect = DialectConfig {
        ilike_operator: None,
        ..Dialect::Postgres.config()
    };
    let sql = Query::select([u.col("id")])
        .from(&u)
        .filter(u.col("username").ilike("A%").unwrap())
        .to_sql_with_dialect(&dialect)
        .unwrap()
        .sql;
    assert!(sql.ends_with("WHERE (LOWER(t1.\"username\") LIKE LOWER($1))"));
}

#[test]
fn test_concat_operator_and_function() {
    let u = user();
    let query = Query::select([u
        .col("username")
        .concat("-")
        .concat(u.col("username"))
        .alias("tag")])
    .from(&u);

    assert_eq!(
        query.to_sql().unwrap().sql,
        "SELECT t1.\"username\" || $1 || t1.\"username\" AS \"tag\" FROM \"user\" AS t1"
    );
    assert_eq!(
        query.to_sql_for(Dialect::MySQL).unwrap().sql,
        "SELECT CONCAT(t1.`username`, ?, t1.`username`) AS `tag` FROM `user` AS t1"
    );
    assert_eq!(
        query.to_sql_for(Dialect::SqlServer).unwrap().sql,
        "SELECT t1.[username] + @p1 + t1.[username] AS [tag] FROM [user] AS t1"
    );
}

#[test]
fn test_concat_isolates_arithmetic() {
    let u = user();
    let sql = Query::select([(u.col("id") + 1).concat("x").alias("v")])
        .from(&u)
        .to_sql_for(Dialect::SQLite)
        .unwrap()
        .sql;
    assert_eq!(sql, "SELECT (t1.\"id\" + ?) || ? AS \"v\" FROM \"user\" AS t1");
}

#[test]
fn test_boolean_literals_for_empty_in() {
    let u = user();
    let query = Query::select([u.col("id")])
        .from(&u)
        .filter(u.col("id").is_in(Vec::<i64>::new()));
    assert!(query.to_sql_for(Dialect::SQLite).unwrap().sql.ends_with("WHERE (0)"));
    assert!(query
        .to_sql_for(Dialect::SqlServer)
        .unwrap()
        .sql
        .ends_with("WHERE ((1 = 0))"));
}

#[test]
fn test_upsert_on_conflict() {
    let u = user();
    let upsert = Query::insert(&u)
        .value("id", 1)
        .value("username", "ann")
        .on_conflict(OnConflict::update_excluded(["id"], ["username"]));
    assert_eq!(
        upsert.to_sql().unwrap().sql,
        "INSERT INTO \"user\" (\"id\", \"username\") VALUES ($1, $2) \
         ON CONFLICT (\"id\") DO UPDATE SET \"username\" = EXCLUDED.\"username\""
    );
    assert_eq!(
        upsert.to_sql_for(Dialect::MySQL).unwrap().sql,
        "INSERT INTO `user` (`id`, `username`) VALUES (?, ?) \
         ON DUPLICATE KEY UPDATE `username` = VALUES(`username`)"
    );
}

#[test]
fn test_upsert_do_nothing() {
    let u = user();
    let insert = Query::insert(&u)
        .value("id", 1)
        .on_conflict(OnConflict::do_nothing(["id"]));
    assert_eq!(
        insert.to_sql_for(Dialect::SQLite).unwrap().sql,
        "INSERT INTO \"user\" (\"id\") VALUES (?) ON CONFLICT (\"id\") DO NOTHING"
    );
    assert_eq!(
        insert.to_sql_for(Dialect::MySQL).unwrap().sql,
        "INSERT IGNORE INTO `user` (`id`) VALUES (?)"
    );
}

#[test]
fn test_upsert_update_needs_target() {
    let u = user();
    let err = Query::insert(&u)
        .value("id", 1)
        .on_conflict(OnConflict::update_excluded(Vec::<String>::new(), ["username"]))
        .to_sql()
        .unwrap_err();
    assert!(matches!(err, QuarryError::MalformedExpression(_)));
}

#[test]
fn test_capability_errors() {
    let (u, t) = (user(), tweet());

    let err = Query::insert(&u)
        .value("id", 1)
        .on_conflict(OnConflict::do_nothing(["id"]))
        .to_sql_for(Dialect::SqlServer)
        .unwrap_err();
    assert!(matches!(err, QuarryError::Unsupported { feature: "upsert", .. }));

    let err = Query::insert(&u)
        .value("id", 1)
        .returning([u.col("id")])
        .to_sql_for(Dialect::MySQL)
        .unwrap_err();
    assert!(matches!(err, QuarryError::Unsupported { feature: "RETURNING", .. }));

    let err = Query::select_from(&u)
        .for_update()
        .to_sql_for(Dialect::SQLite)
        .unwrap_err();
    assert!(matches!(err, QuarryError::Unsupported { .. }));

    let err = Query::select([u.col("id")])
        .from(&u)
        .join_kind(&t, JoinKind::Full)
        .unwrap()
        .to_sql_for(Dialect::MySQL)
        .unwrap_err();
    assert!(matches!(err, QuarryError::Unsupported { .. }));
    assert!(err.is_construction_error());
}

#[test]
fn test_row_locking() {
    let u = user();
    let sql = Query::select([u.col("id")])
        .from(&u)
        .filter(u.col("id").eq(1).unwrap())
        .lock(LockMode::UpdateSkipLocked)
        .to_sql()
        .unwrap()
        .sql;
    assert_eq!(
        sql,
        "SELECT t1.\"id\" FROM \"user\" AS t1 WHERE (t1.\"id\" = $1) FOR UPDATE SKIP LOCKED"
    );
}

#[test]
fn test_default_values_insert() {
    let u = user();
    assert_eq!(
        Query::insert(&u).to_sql().unwrap().sql,
        "INSERT INTO \"user\" DEFAULT VALUES"
    );
    assert_eq!(
        Query::insert(&u).to_sql_for(Dialect::MySQL).unwrap().sql,
        "INSERT INTO `user` () VALUES ()"
    );
}

#[test]
fn test_nulls_ordering_native_and_emulated() {
    let u = user();
    let query = Query::select([u.col("username")])
        .from(&u)
        .order_by(u.col("username").asc().nulls_last());
    assert!(query
        .to_sql()
        .unwrap()
        .sql
        .ends_with("ORDER BY t1.\"username\" NULLS LAST"));
    assert!(query.to_sql_for(Dialect::MySQL).unwrap().sql.ends_with(
        "ORDER BY CASE WHEN t1.`username` IS NULL THEN 1 ELSE 0 END, t1.`username`"
    ));

    let first = Query::select([u.col("username")])
        .from(&u)
        .order_by(u.col("username").desc().nulls_first());
    assert!(first
        .to_sql()
        .unwrap()
        .sql
        .ends_with("ORDER BY t1.\"username\" DESC NULLS FIRST"));
}

#[test]
fn test_dialect_names_and_urls() {
    assert_eq!("pg".parse::<Dialect>().unwrap(), Dialect::Postgres);
    assert_eq!("MSSQL".parse::<Dialect>().unwrap(), Dialect::SqlServer);
    assert!(matches!(
        "oracle".parse::<Dialect>(),
        Err(QuarryError::Config(_))
    ));
    assert_eq!(
        Dialect::from_url("sqlite://data.db"),
        Some(Dialect::SQLite)
    );
    assert_eq!(
        Dialect::from_url("mysql://root@localhost/app"),
        Some(Dialect::MySQL)
    );
    assert_eq!(Dialect::from_url("redis://localhost"), None);
}

#[test]
fn test_custom_placeholder_style() {
    let u = user();
    let dialect = DialectConfig {
        placeholder: crate::transpiler::PlaceholderStyle::Numbered {
            prefix: ":".into(),
        },
        ..Dialect::Postgres.config()
    };
    let sql = Query::select([u.col("id")])
        .from(&u)
        .filter(u.col("id").is_in([4, 5]))
        .to_sql_with_dialect(&dialect)
        .unwrap()
        .sql;
    assert!(sql.ends_with("WHERE (t1.\"id\" IN (:1, :2))"));
}
