use branchkey_commons::{ColumnMeta, DialectKind, IndexType, SqlValue};
use branchkey_core::dialect::dialect_for;
use branchkey_core::keywords::keyword_checker;
use branchkey_core::schema_registry::SchemaRegistry;
use branchkey_core::test_helpers::MockConnection;

fn orders_columns(table: &str) -> Vec<ColumnMeta> {
    vec![
        ColumnMeta::new(table, "id", "bigint", 1),
        ColumnMeta::new(table, "name", "varchar", 2),
        ColumnMeta::new(table, "email", "varchar", 3),
    ]
}

#[tokio::test]
async fn test_mysql_statistics_rows() {
    let conn = MockConnection::new(vec![
        ColumnMeta::new("orders", "id", "BIGINT", 1).with_autoincrement(true),
        ColumnMeta::new("orders", "name", "VARCHAR", 2),
        ColumnMeta::new("orders", "email", "VARCHAR", 3),
    ])
    .with_catalog("shop")
    .with_index_rows(
        &["INDEX_NAME", "COLUMN_NAME", "NON_UNIQUE"],
        vec![
            vec!["PRIMARY".into(), "id".into(), SqlValue::Int(0)],
            vec!["uk_email".into(), "email".into(), SqlValue::Int(0)],
            vec!["idx_name".into(), "name".into(), SqlValue::Int(1)],
        ],
    );

    let table = dialect_for(DialectKind::MySql)
        .fetch_schema(&conn, "`orders`")
        .await
        .unwrap();

    assert_eq!(table.primary_key_only_names(), ["id"]);
    assert_eq!(table.all_indexes()["uk_email"].index_type, IndexType::Unique);
    assert_eq!(table.all_indexes()["idx_name"].index_type, IndexType::Normal);
    assert_eq!(table.auto_increment_pk_columns().len(), 1);

    let (sql, params) = conn.last_query().unwrap();
    assert!(sql.contains("information_schema.STATISTICS"));
    assert_eq!(params, vec![SqlValue::from("shop"), SqlValue::from("orders")]);
}

#[tokio::test]
async fn test_mysql_table_name_case_is_one_rule_for_key_and_fetch() {
    let registry = SchemaRegistry::new(dialect_for(DialectKind::MySql), 0, None);
    let conn = MockConnection::new(vec![ColumnMeta::new("Orders", "id", "BIGINT", 1)])
        .with_catalog("shop")
        .with_index_rows(
            &["INDEX_NAME", "COLUMN_NAME", "NON_UNIQUE"],
            vec![vec!["PRIMARY".into(), "id".into(), SqlValue::Int(0)]],
        );

    registry.get(&conn, "`Orders`", "rm-1").await.unwrap();
    let (_, params) = conn.last_query().unwrap();
    assert_eq!(params[1], SqlValue::from("Orders"));

    registry.get(&conn, "orders", "rm-1").await.unwrap();
    let (_, params) = conn.last_query().unwrap();
    assert_eq!(params[1], SqlValue::from("orders"));

    // same spelling is served from the cache
    registry.get(&conn, "Orders", "rm-1").await.unwrap();
    assert_eq!(registry.fetch_count(), 2);
    assert_eq!(registry.len(), 2);
}

#[tokio::test]
async fn test_postgresql_sequence_default_marks_auto_increment() {
    let conn = MockConnection::new(vec![
        ColumnMeta::new("orders", "id", "int8", 1).with_default("nextval('orders_id_seq'::regclass)"),
        ColumnMeta::new("orders", "name", "text", 2),
    ])
    .with_index_rows(
        &["index_name", "column_name", "is_primary", "is_unique"],
        vec![vec![
            "orders_pkey".into(),
            "id".into(),
            SqlValue::Bool(true),
            SqlValue::Bool(true),
        ]],
    );

    let table = dialect_for(DialectKind::PostgreSql)
        .fetch_schema(&conn, "Public.Orders")
        .await
        .unwrap();

    assert_eq!(table.primary_key_only_names(), ["id"]);
    assert!(table.column_meta("id").unwrap().is_autoincrement());

    let (_, params) = conn.last_query().unwrap();
    assert_eq!(params, vec![SqlValue::from("orders"), SqlValue::from("public")]);
}

#[tokio::test]
async fn test_oracle_constraint_rows() {
    let conn = MockConnection::new(orders_columns("ORDERS")).with_index_rows(
        &["INDEX_NAME", "COLUMN_NAME", "UNIQUENESS", "CONSTRAINT_TYPE"],
        vec![
            vec!["SYS_C001".into(), "id".into(), "UNIQUE".into(), "P".into()],
            vec!["UK_EMAIL".into(), "email".into(), "UNIQUE".into(), SqlValue::Null],
            vec!["IDX_NAME".into(), "name".into(), "NONUNIQUE".into(), SqlValue::Null],
        ],
    );

    let table = dialect_for(DialectKind::Oracle)
        .fetch_schema(&conn, "orders")
        .await
        .unwrap();

    assert_eq!(table.primary_key_only_names(), ["id"]);
    assert_eq!(table.all_indexes()["UK_EMAIL"].index_type, IndexType::Unique);
    assert!(table.all_indexes()["IDX_NAME"].non_unique);

    let (_, params) = conn.last_query().unwrap();
    assert_eq!(params, vec![SqlValue::from("ORDERS"), SqlValue::Null]);
}

#[tokio::test]
async fn test_gbase_owner_is_bound_twice() {
    let conn = MockConnection::orders();

    dialect_for(DialectKind::GBasedbt)
        .fetch_schema(&conn, "informix.ORDERS")
        .await
        .unwrap();

    let (_, params) = conn.last_query().unwrap();
    assert_eq!(
        params,
        vec![
            SqlValue::from("orders"),
            SqlValue::from("informix"),
            SqlValue::from("informix")
        ]
    );
}

#[test]
fn test_dialect_keyword_checkers() {
    let gbase = dialect_for(DialectKind::GBasedbt);
    assert!(std::ptr::eq(
        gbase.keyword_checker(),
        keyword_checker(DialectKind::GBasedbt)
    ));
    assert_eq!(gbase.keyword_checker().escape("select"), "\"select\"");
    assert_eq!(
        dialect_for(DialectKind::MySql).keyword_checker().escape("order"),
        "`order`"
    );
}
