//! Compound selects, CTEs, subqueries, windows, CASE and friends.

use pretty_assertions::assert_eq;

use super::{tweet, user};
use crate::ast::*;
use crate::error::QuarryError;
use crate::transpiler::{Dialect, ToSql};

fn members() -> (SelectBuilder, SelectBuilder) {
    members_of(&user(), &tweet())
}

fn members_of(u: &Source, t: &Source) -> (SelectBuilder, SelectBuilder) {
    let a = Query::select([u.col("id")])
        .from(u)
        .filter(u.col("active").eq(true).unwrap());
    let b = Query::select([t.col("user_id")])
        .from(t)
        .filter(t.col("id").gt(10).unwrap());
    (a, b)
}

#[test]
fn test_union_parenthesized_members() {
    let u = user();
    let (a, b) = members_of(&u, &tweet());
    let compiled = a.union(b).order_by(u.col("id")).limit(5).to_sql().unwrap();
    assert_eq!(
        compiled.sql,
        "(SELECT t1.\"id\" FROM \"user\" AS t1 WHERE (t1.\"active\" = $1)) UNION \
         (SELECT t2.\"user_id\" FROM \"tweet\" AS t2 WHERE (t2.\"id\" > $2)) \
         ORDER BY \"id\" LIMIT 5"
    );
    assert_eq!(compiled.params, vec![Value::Bool(true), Value::Int(10)]);
}

#[test]
fn test_compound_order_by_must_name_a_member_column() {
    let (u, t) = (user(), tweet());
    let (a, b) = members_of(&u, &t);
    let sql = a.union(b).order_by(t.col("user_id").desc()).to_sql().unwrap().sql;
    assert!(sql.ends_with("ORDER BY \"user_id\" DESC"));

    let (a, b) = members_of(&u, &t);
    let stranger = user();
    let err = a.union(b).order_by(stranger.col("id")).to_sql().unwrap_err();
    assert!(matches!(err, QuarryError::UnboundSource(ref name) if name == "user"));
}

#[test]
fn test_union_bare_members() {
    let (a, b) = members();
    let sql = a.union_all(b).to_sql_for(Dialect::SQLite).unwrap().sql;
    assert_eq!(
        sql,
        "SELECT t1.\"id\" FROM \"user\" AS t1 WHERE (t1.\"active\" = ?) UNION ALL \
         SELECT t2.\"user_id\" FROM \"tweet\" AS t2 WHERE (t2.\"id\" > ?)"
    );
}

#[test]
fn test_member_with_limit_becomes_derived_table() {
    let (a, b) = members();
    let sql = a.limit(1).intersect(b).to_sql_for(Dialect::SQLite).unwrap().sql;
    assert_eq!(
        sql,
        "SELECT * FROM (SELECT t1.\"id\" FROM \"user\" AS t1 WHERE (t1.\"active\" = ?) LIMIT 1) AS t2 \
         INTERSECT SELECT t3.\"user_id\" FROM \"tweet\" AS t3 WHERE (t3.\"id\" > ?)"
    );
}

#[test]
fn test_symmetric_difference() {
    let (a, b) = members();
    let compiled = a.symmetric_difference(b).to_sql_for(Dialect::SQLite).unwrap();
    assert_eq!(
        compiled.sql,
        "SELECT t1.\"id\" FROM \"user\" AS t1 WHERE (t1.\"active\" = ?) EXCEPT \
         SELECT t2.\"user_id\" FROM \"tweet\" AS t2 WHERE (t2.\"id\" > ?) UNION \
         SELECT * FROM (SELECT t2.\"user_id\" FROM \"tweet\" AS t2 WHERE (t2.\"id\" > ?) EXCEPT \
         SELECT t1.\"id\" FROM \"user\" AS t1 WHERE (t1.\"active\" = ?)) AS t3"
    );
    assert_eq!(
        compiled.params,
        vec![
            Value::Bool(true),
            Value::Int(10),
            Value::Int(10),
            Value::Bool(true)
        ]
    );
}

#[test]
fn test_compound_output_names_follow_left_member() {
    let (a, b) = members();
    assert_eq!(a.union(b).output_names(), vec!["id".to_string()]);
}

fn recent_tweets() -> (Source, Source) {
    let t = tweet();
    let recent = Source::cte(
        "recent",
        ["id"],
        Query::select([t.col("id")])
            .from(&t)
            .filter(t.col("id").gt(100).unwrap()),
    );
    (t, recent)
}

#[test]
fn test_cte_hoisted_from_source() {
    let (_, recent) = recent_tweets();
    let compiled = Query::select([recent.col("id")])
        .from(&recent)
        .to_sql()
        .unwrap();
    assert_eq!(
        compiled.sql,
        "WITH \"recent\" (\"id\") AS (SELECT t1.\"id\" FROM \"tweet\" AS t1 WHERE (t1.\"id\" > $1)) \
         SELECT t2.\"id\" FROM \"recent\" AS t2"
    );
    assert_eq!(compiled.params, vec![Value::Int(100)]);
}

#[test]
fn test_cte_declared_once_for_nested_use() {
    let u = user();
    let (_, recent) = recent_tweets();
    let inner = Query::select([recent.col("id")]).from(&recent);
    let sql = Query::select([u.col("id")])
        .from(&u)
        .with_cte(&recent)
        .filter(u.col("id").in_query(inner).unwrap())
        .to_sql()
        .unwrap()
        .sql;
    assert_eq!(
        sql,
        "WITH \"recent\" (\"id\") AS (SELECT t1.\"id\" FROM \"tweet\" AS t1 WHERE (t1.\"id\" > $1)) \
         SELECT t2.\"id\" FROM \"user\" AS t2 \
         WHERE (t2.\"id\" IN (SELECT t3.\"id\" FROM \"recent\" AS t3))"
    );
    assert_eq!(sql.matches("WITH").count(), 1);
}

#[test]
fn test_recursive_cte() {
    let category = Source::table(
        TableDef::new("category")
            .field("id", SqlType::Integer)
            .nullable_field("parent_id", SqlType::Integer),
    );
    let tree_ref = Source::named("tree");
    let child = category.fresh();

    let roots = Query::select([category.col("id")])
        .from(&category)
        .filter(category.col("parent_id").is_null());
    let descendants = Query::select([child.col("id")]).from(&child).join_on(
        &tree_ref,
        JoinKind::Inner,
        child.col("parent_id").eq(tree_ref.col("id")).unwrap(),
    );
    let tree = Source::recursive_cte("tree", ["id"], roots.union_all(descendants));

    let sql = Query::select([tree.col("id")])
        .from(&tree)
        .to_sql_for(Dialect::SQLite)
        .unwrap()
        .sql;
    assert_eq!(
        sql,
        "WITH RECURSIVE \"tree\" (\"id\") AS (\
         SELECT t1.\"id\" FROM \"category\" AS t1 WHERE (t1.\"parent_id\" IS NULL) UNION ALL \
         SELECT t2.\"id\" FROM \"category\" AS t2 \
         INNER JOIN \"tree\" AS t3 ON (t2.\"parent_id\" = t3.\"id\")) \
         SELECT t4.\"id\" FROM \"tree\" AS t4"
    );
}

#[test]
fn test_subquery_source() {
    let u = user();
    let active = Source::subquery(
        Query::select([u.col("id")])
            .from(&u)
            .filter(u.col("active").eq(true).unwrap()),
    );
    let sql = Query::select([active.col("id")])
        .from(&active)
        .to_sql()
        .unwrap()
        .sql;
    assert_eq!(
        sql,
        "SELECT t1.\"id\" FROM (SELECT t2.\"id\" FROM \"user\" AS t2 WHERE (t2.\"active\" = $1)) AS t1"
    );
}

#[test]
fn test_subquery_source_is_not_correlated() {
    let (u, t) = (user(), tweet());
    let theirs = Source::subquery(
        Query::select([t.col("user_id")])
            .from(&t)
            .filter(t.col("user_id").eq(u.col("id")).unwrap()),
    );
    let err = Query::select([u.col("id")])
        .from(&u)
        .cross_join(&theirs)
        .to_sql()
        .unwrap_err();
    assert!(matches!(err, QuarryError::UnboundSource(ref name) if name == "user"));
}

#[test]
fn test_scalar_subquery_column() {
    let (u, t) = (user(), tweet());
    let tweets = Query::select([count_star()])
        .from(&t)
        .filter(t.col("user_id").eq(u.col("id")).unwrap())
        .into_expr()
        .alias("tweets");
    let sql = Query::select([u.col("id"), tweets])
        .from(&u)
        .to_sql()
        .unwrap()
        .sql;
    assert_eq!(
        sql,
        "SELECT t1.\"id\", (SELECT COUNT(*) FROM \"tweet\" AS t2 WHERE (t2.\"user_id\" = t1.\"id\")) \
         AS \"tweets\" FROM \"user\" AS t1"
    );
}

#[test]
fn test_in_and_not_exists_subqueries() {
    let (u, t) = (user(), tweet());
    let authors = Query::select([t.col("user_id")]).from(&t);
    let sql = Query::select([u.col("id")])
        .from(&u)
        .filter(u.col("id").in_query(authors).unwrap())
        .to_sql()
        .unwrap()
        .sql;
    assert!(sql.ends_with("WHERE (t1.\"id\" IN (SELECT t2.\"user_id\" FROM \"tweet\" AS t2))"));

    let silent = Expr::exists(
        Query::select([t.col("id")])
            .from(&t)
            .filter(t.col("user_id").eq(u.col("id")).unwrap()),
    )
    .not();
    let sql = Query::select([u.col("id")])
        .from(&u)
        .filter(silent)
        .to_sql()
        .unwrap()
        .sql;
    assert!(sql.ends_with(
        "WHERE (NOT EXISTS (SELECT t2.\"id\" FROM \"tweet\" AS t2 WHERE (t2.\"user_id\" = t1.\"id\")))"
    ));
}

#[test]
fn test_window_functions() {
    let t = tweet();
    let sql = Query::select([
        t.col("id"),
        row_number()
            .over(
                Window::new()
                    .partition_by(t.col("user_id"))
                    .order_by(t.col("id").desc()),
            )
            .alias("rn"),
        sum(t.col("id"))
            .over(Window::new().order_by(t.col("id")).frame(WindowFrame::Rows {
                start: FrameBound::UnboundedPreceding,
                end: FrameBound::CurrentRow,
            }))
            .alias("running"),
    ])
    .from(&t)
    .to_sql()
    .unwrap()
    .sql;
    assert_eq!(
        sql,
        "SELECT t1.\"id\", ROW_NUMBER() OVER (PARTITION BY t1.\"user_id\" ORDER BY t1.\"id\" DESC) AS \"rn\", \
         SUM(t1.\"id\") OVER (ORDER BY t1.\"id\" ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW) AS \"running\" \
         FROM \"tweet\" AS t1"
    );
}

#[test]
fn test_case_expressions() {
    let u = user();
    let compiled = Query::select([
        case_when(u.col("active").eq(true).unwrap(), "yes")
            .otherwise("no")
            .alias("state"),
        case(u.col("active")).when(1, "on").otherwise("off").build(),
    ])
    .from(&u)
    .to_sql()
    .unwrap();
    assert_eq!(
        compiled.sql,
        "SELECT CASE WHEN t1.\"active\" = $1 THEN $2 ELSE $3 END AS \"state\", \
         CASE t1.\"active\" WHEN $4 THEN $5 ELSE $6 END FROM \"user\" AS t1"
    );
    assert_eq!(compiled.params[3], Value::Bool(true));
}

#[test]
fn test_between_and_cast() {
    let u = user();
    let sql = Query::select([cast(u.col("id"), "TEXT").alias("label")])
        .from(&u)
        .filter(u.col("id").between(1, 10))
        .filter(u.col("id").not_between(4, 5))
        .to_sql()
        .unwrap()
        .sql;
    assert_eq!(
        sql,
        "SELECT CAST(t1.\"id\" AS TEXT) AS \"label\" FROM \"user\" AS t1 \
         WHERE (t1.\"id\" BETWEEN $1 AND $2 AND t1.\"id\" NOT BETWEEN $3 AND $4)"
    );
}

#[test]
fn test_aggregates_and_negation() {
    let t = tweet();
    let sql = Query::select([
        count_distinct(t.col("user_id")).alias("authors"),
        (-t.col("id")).alias("neg"),
        (-(t.col("id") + 1)).alias("neg_sum"),
    ])
    .from(&t)
    .to_sql()
    .unwrap()
    .sql;
    assert_eq!(
        sql,
        "SELECT COUNT(DISTINCT t1.\"user_id\") AS \"authors\", -t1.\"id\" AS \"neg\", \
         -(t1.\"id\" + $1) AS \"neg_sum\" FROM \"tweet\" AS t1"
    );
}

#[test]
fn test_update_with_correlated_subquery() {
    let (u, t) = (user(), tweet());
    let has_tweets = Expr::exists(
        Query::select([t.col("id")])
            .from(&t)
            .filter(t.col("user_id").eq(u.col("id")).unwrap()),
    );
    let sql = Query::update(&u)
        .set("active", true)
        .filter(has_tweets)
        .to_sql()
        .unwrap()
        .sql;
    assert_eq!(
        sql,
        "UPDATE \"user\" SET \"active\" = $1 WHERE EXISTS \
         (SELECT t1.\"id\" FROM \"tweet\" AS t1 WHERE (t1.\"user_id\" = \"user\".\"id\"))"
    );
}
