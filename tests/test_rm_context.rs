use branchkey::{load_config, RmContext};
use branchkey_commons::{DialectKind, SqlValue};
use branchkey_configs::RmConfig;
use branchkey_core::test_helpers::{int, text, MockConnection, MockExecutedStatement, ParsedInsert};
use std::io::Write;
use std::sync::Arc;

fn gbase_context() -> RmContext {
    let mut config = RmConfig::new(DialectKind::GBasedbt);
    config.resource_id = "jdbc:gbasedbt-sqli://db:9088/shop".to_string();
    RmContext::from_config(config).unwrap()
}

#[tokio::test]
async fn test_orders_insert_end_to_end() {
    let ctx = gbase_context();
    let conn = MockConnection::orders();
    let insert = ParsedInsert::new("orders", &["NAME", "AMOUNT"]).row(vec![text("x"), int(10)]);
    let mut executed = MockExecutedStatement::zero_columns().with_fallback_values(vec![SqlValue::Int(501)]);

    let keys = ctx
        .resolve_insert_pks(&conn, &insert, &mut executed)
        .await
        .unwrap();

    assert_eq!(keys.get("ID"), Some(&[SqlValue::Int(501)][..]));
    assert_eq!(executed.generated_calls(), 1);
    assert_eq!(executed.fallback_calls(), 1);

    // second statement on the same table hits the cache
    let mut executed = MockExecutedStatement::with_generated_keys(vec![SqlValue::Int(502)]);
    ctx.resolve_insert_pks(&conn, &insert, &mut executed)
        .await
        .unwrap();
    assert_eq!(conn.columns_calls(), 1);
    assert_eq!(ctx.schema_registry().stats().hits, 1);
}

#[tokio::test]
async fn test_invalidate_table_uses_the_context_resource() {
    let ctx = gbase_context();
    let conn = MockConnection::line_item();

    let first = ctx.table_meta(&conn, "LINE_ITEM").await.unwrap();
    assert!(ctx.invalidate_table("line_item"));
    let second = ctx.table_meta(&conn, "line_item").await.unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(conn.columns_calls(), 2);
}

#[test]
fn test_context_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
resource_id = "jdbc:mysql://db:3306/shop"
dialect = "mysql"

[schema_cache]
max_entries = 8
fetch_timeout_ms = 250

[generated_keys]
fallback_enabled = false
"#
    )
    .unwrap();

    let config = load_config(file.path()).unwrap();
    let ctx = RmContext::from_config(config).unwrap();

    assert_eq!(ctx.dialect().kind(), DialectKind::MySql);
    assert_eq!(ctx.resource_id(), "jdbc:mysql://db:3306/shop");
    assert!(!ctx.pk_resolver().options().fallback_enabled);
    assert_eq!(ctx.keyword_checker().quote_char(), '`');
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = RmConfig::new(DialectKind::Oracle);
    config.resource_id = String::new();
    assert!(RmContext::from_config(config).is_err());
}
