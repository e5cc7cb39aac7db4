use pretty_assertions::assert_eq;
use quarry::engine::{Database, Executor, MockExecutor};
use quarry::prelude::*;

const SCHEMA: &str = r#"
[database]
dialect = "sqlite"

[[tables]]
name = "user"
primary_key = ["id"]
fields = [
    { name = "id", type = "integer" },
    { name = "name", type = "text" },
    { name = "active", type = "boolean" },
]

[[tables]]
name = "tweet"
primary_key = ["id"]
fields = [
    { name = "id", type = "integer" },
    { name = "user_id", type = "integer" },
    { name = "body", type = "text" },
]
foreign_keys = [{ column = "user_id", references = "user" }]
"#;

fn sources() -> (QuarryConfig, Source, Source) {
    let config = QuarryConfig::parse(SCHEMA).expect("valid schema");
    let user = config.source("user").expect("user declared");
    let tweet = config.source("tweet").expect("tweet declared");
    (config, user, tweet)
}

fn timeline(user: &Source, tweet: &Source) -> Query {
    Query::select([
        user.col("id"),
        user.col("name"),
        tweet.col("id"),
        tweet.col("body"),
    ])
    .from(user)
    .left_join(tweet)
    .expect("foreign key declared")
    .order_by(user.col("id"))
    .order_by(tweet.col("id"))
    .into()
}

#[tokio::test]
async fn test_config_filter_and_objects_through_mock() {
    let (config, user, tweet) = sources();
    let dialect = config.dialect_config().unwrap();

    let filter = parse_filter(&user, "active = 1 and name ~* 'a%'").unwrap();
    let query: Query = Query::select([
        user.col("id"),
        user.col("name"),
        tweet.col("id"),
        tweet.col("body"),
    ])
    .from(&user)
    .join(&tweet)
    .unwrap()
    .filter(filter)
    .order_by(user.col("id"))
    .into();

    let mock = MockExecutor::with_config(dialect).push_rows(vec![
        vec![Value::Int(1), "ann".into(), Value::Int(10), "hi".into()],
        vec![Value::Int(1), "ann".into(), Value::Int(11), "again".into()],
        vec![Value::Int(2), "amy".into(), Value::Int(12), "hey".into()],
    ]);
    let users = mock.fetch_objects(&query).await.unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users[0].children("tweet").len(), 2);
    assert_eq!(users[1].children("tweet").len(), 1);
    assert_eq!(
        users[1].to_json(),
        serde_json::json!({
            "id": 2,
            "name": "amy",
            "tweet": [{"id": 12, "body": "hey"}],
        })
    );

    let statements = mock.statements();
    assert_eq!(
        statements[0].sql,
        "SELECT t1.\"id\", t1.\"name\", t2.\"id\", t2.\"body\" FROM \"user\" AS t1 \
         INNER JOIN \"tweet\" AS t2 ON (t1.\"id\" = t2.\"user_id\") \
         WHERE (t1.\"active\" = ? AND t1.\"name\" LIKE ?) ORDER BY t1.\"id\""
    );
    // `1` is coerced to the declared boolean type
    assert_eq!(
        statements[0].params,
        vec![Value::Bool(true), Value::from("a%")]
    );
}

#[tokio::test]
async fn test_records_are_keyed_by_projected_name() {
    let (_, user, tweet) = sources();
    let mock = MockExecutor::new(Dialect::Postgres).push_rows(vec![vec![
        Value::Int(1),
        "ann".into(),
        Value::Int(10),
        "hi".into(),
    ]]);
    let records = mock.fetch_records(&timeline(&user, &tweet)).await.unwrap();
    let keys: Vec<&String> = records[0].keys().collect();
    assert_eq!(keys, vec!["body", "name", "tweet.id", "user.id"]);
}

#[tokio::test]
async fn test_unordered_rows_fail_instead_of_duplicating() {
    let (_, user, tweet) = sources();
    let mock = MockExecutor::new(Dialect::SQLite).push_rows(vec![
        vec![Value::Int(1), "ann".into(), Value::Int(10), "a".into()],
        vec![Value::Int(2), "bob".into(), Value::Int(11), "b".into()],
        vec![Value::Int(1), "ann".into(), Value::Int(12), "c".into()],
    ]);
    let err = mock
        .fetch_objects(&timeline(&user, &tweet))
        .await
        .unwrap_err();
    assert!(matches!(err, QuarryError::UnorderedRows(ref name) if name == "user"));
}

#[tokio::test]
async fn test_sqlite_round_trip() {
    let (config, user, tweet) = sources();
    let db = Database::connect_with("sqlite::memory:", config.dialect_config().unwrap(), 1)
        .await
        .unwrap();

    db.execute(
        "CREATE TABLE \"user\" (\"id\" INTEGER PRIMARY KEY, \"name\" TEXT, \"active\" INTEGER)",
        &[],
    )
    .await
    .unwrap();
    db.execute(
        "CREATE TABLE \"tweet\" (\"id\" INTEGER PRIMARY KEY, \"user_id\" INTEGER, \"body\" TEXT)",
        &[],
    )
    .await
    .unwrap();

    let users = Query::insert(&user)
        .columns(["id", "name", "active"])
        .row([Value::Int(1), "ann".into(), Value::Int(1)])
        .unwrap()
        .row([Value::Int(2), "bob".into(), Value::Int(0)])
        .unwrap();
    assert_eq!(db.run(&users.into()).await.unwrap(), 2);

    let tweets = Query::insert(&tweet)
        .columns(["id", "user_id", "body"])
        .row([Value::Int(10), Value::Int(1), "first".into()])
        .unwrap()
        .row([Value::Int(11), Value::Int(1), "second".into()])
        .unwrap();
    assert_eq!(db.run(&tweets.into()).await.unwrap(), 2);

    let objects = db.fetch_objects(&timeline(&user, &tweet)).await.unwrap();
    assert_eq!(objects.len(), 2);
    assert_eq!(objects[0].get("name"), Some(&Value::from("ann")));
    assert_eq!(
        objects[0]
            .children("tweet")
            .iter()
            .map(|t| t.get("body").cloned())
            .collect::<Vec<_>>(),
        vec![Some(Value::from("first")), Some(Value::from("second"))]
    );
    assert!(objects[1].children("tweet").is_empty());

    let rename = Query::update(&user)
        .set("name", "robert")
        .filter(user.col("id").eq(2).unwrap());
    assert_eq!(db.run(&rename.into()).await.unwrap(), 1);

    let names: Query = Query::select([user.col("name")])
        .from(&user)
        .filter(user.col("id").eq(2).unwrap())
        .into();
    let rows = db.fetch_rows(&names).await.unwrap();
    assert_eq!(rows, vec![vec![Value::from("robert")]]);

    let purge = Query::delete(&tweet).filter(tweet.col("user_id").eq(1).unwrap());
    assert_eq!(db.run(&purge.into()).await.unwrap(), 2);
}
