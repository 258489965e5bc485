//! Resource-manager context
//!
//! One [`RmContext`] per datasource: the configured dialect, its schema
//! registry and the primary-key resolver, wired from [`RmConfig`].

use std::path::Path;
use std::sync::Arc;

use branchkey_commons::{PkValueMap, TableMeta};
use branchkey_configs::RmConfig;
use branchkey_core::dialect::{dialect_for, Dialect};
use branchkey_core::driver::{DbConnection, ExecutedStatement};
use branchkey_core::error::{PkResolveError, SchemaFetchError};
use branchkey_core::keywords::KeywordChecker;
use branchkey_core::pk::{GeneratedKeyOptions, PkResolver};
use branchkey_core::schema_registry::SchemaRegistry;
use branchkey_core::statement::InsertStatement;

/// Load a config file, then apply environment overrides and validate
pub fn load_config<P: AsRef<Path>>(path: P) -> anyhow::Result<RmConfig> {
    let mut config = RmConfig::from_file(path)?;
    config.apply_env_overrides()?;
    config.finalize()?;
    Ok(config)
}

pub struct RmContext {
    config: RmConfig,
    dialect: Arc<dyn Dialect>,
    schema_registry: Arc<SchemaRegistry>,
    pk_resolver: PkResolver,
}

impl std::fmt::Debug for RmContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RmContext")
            .field("resource_id", &self.config.resource_id)
            .field("dialect", &self.dialect.kind())
            .field("schema_registry", &self.schema_registry)
            .finish()
    }
}

impl RmContext {
    pub fn from_config(config: RmConfig) -> anyhow::Result<Self> {
        config.validate()?;

        let dialect = dialect_for(config.dialect);
        let schema_registry = Arc::new(SchemaRegistry::new(
            Arc::clone(&dialect),
            config.schema_cache.max_entries,
            config.schema_cache.fetch_timeout(),
        ));
        let pk_resolver = PkResolver::new(
            Arc::clone(&dialect),
            GeneratedKeyOptions {
                fallback_enabled: config.generated_keys.fallback_enabled,
                timeout: config.generated_keys.timeout(),
            },
        );

        log::info!(
            "[RmContext] Resource {} ready (dialect={}, schema_cache.max_entries={})",
            config.resource_id,
            config.dialect,
            config.schema_cache.max_entries
        );

        Ok(Self {
            config,
            dialect,
            schema_registry,
            pk_resolver,
        })
    }

    pub fn config(&self) -> &RmConfig {
        &self.config
    }

    pub fn resource_id(&self) -> &str {
        &self.config.resource_id
    }

    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    pub fn schema_registry(&self) -> &Arc<SchemaRegistry> {
        &self.schema_registry
    }

    pub fn pk_resolver(&self) -> &PkResolver {
        &self.pk_resolver
    }

    /// Reserved-word checker for SQL generated against this resource
    pub fn keyword_checker(&self) -> &'static KeywordChecker {
        self.dialect.keyword_checker()
    }

    /// Schema snapshot of a table of this resource (read-through)
    pub async fn table_meta(
        &self,
        conn: &dyn DbConnection,
        table_name: &str,
    ) -> Result<Arc<TableMeta>, SchemaFetchError> {
        self.schema_registry
            .get(conn, table_name, &self.config.resource_id)
            .await
    }

    /// Primary key values of an executed INSERT, ready for the undo log
    pub async fn resolve_insert_pks(
        &self,
        conn: &dyn DbConnection,
        statement: &dyn InsertStatement,
        executed: &mut dyn ExecutedStatement,
    ) -> Result<PkValueMap, PkResolveError> {
        let table_meta = self.table_meta(conn, statement.table_name()).await?;
        self.pk_resolver.resolve(statement, &table_meta, executed).await
    }

    /// Forget the cached schema of a table (e.g. after DDL)
    pub fn invalidate_table(&self, table_name: &str) -> bool {
        self.schema_registry
            .invalidate(&self.config.resource_id, table_name)
    }
}
