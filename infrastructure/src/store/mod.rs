//! SQLite-backed registry store
//!
//! [`SqliteStore`] implements the application's [`RegistryStore`] port over
//! an r2d2 pool of rusqlite connections. Blocking database work runs on
//! tokio's blocking pool; writes use `IMMEDIATE` transactions and re-check
//! the caller's [`Cancellation`] right before commit.

mod discovery;
mod error;
mod rows;
mod schema;

use agent_tools_application::{
    Cancellation, RegistryStore, StoreError, StoreResult, TransitionResult,
};
use agent_tools_domain::{
    Invocation, InvocationId, InvocationOutcome, InvocationStatus, Page, Provider, Tool,
    ToolFilter, ToolUpdate,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use discovery::ToolQuery;
use error::{classify, json_error, pool_error};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rows::{
    INVOCATION_COLUMNS, PROVIDER_COLUMNS, TOOL_COLUMNS, invocation_from_row, join_tags,
    provider_from_row, to_millis, tool_from_row,
};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params, params_from_iter};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Path that selects a private in-memory database
pub const MEMORY_PATH: &str = ":memory:";

/// Options for opening a [`SqliteStore`]
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub path: PathBuf,
    pub pool_size: u32,
    pub busy_timeout_ms: u64,
}

impl StoreOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_pool_size(mut self, pool_size: u32) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn with_busy_timeout_ms(mut self, busy_timeout_ms: u64) -> Self {
        self.busy_timeout_ms = busy_timeout_ms;
        self
    }

    fn is_memory(&self) -> bool {
        self.path.as_os_str() == MEMORY_PATH
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/agent-tools.db"),
            pool_size: 8,
            busy_timeout_ms: 5000,
        }
    }
}

/// Registry store over a pooled SQLite database
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
    path: PathBuf,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.path)
            .field("connections", &self.pool.state().connections)
            .finish()
    }
}

impl SqliteStore {
    /// Open (or create) the database at `path` with default pool settings
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with(StoreOptions::new(path.as_ref()))
    }

    /// Open with explicit options
    ///
    /// Creates missing parent directories, configures each pooled connection
    /// (WAL, foreign keys, busy timeout) and applies the schema. `":memory:"`
    /// uses a single long-lived connection so every caller sees one database.
    pub fn open_with(options: StoreOptions) -> StoreResult<Self> {
        let open_err = |reason: String| StoreError::Open {
            path: options.path.display().to_string(),
            reason,
        };

        let (manager, builder) = if options.is_memory() {
            (
                SqliteConnectionManager::memory(),
                Pool::builder()
                    .max_size(1)
                    .idle_timeout(None)
                    .max_lifetime(None),
            )
        } else {
            if let Some(parent) = options.path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent).map_err(|e| {
                    open_err(format!("create directory {}: {}", parent.display(), e))
                })?;
            }
            (
                SqliteConnectionManager::file(&options.path),
                Pool::builder().max_size(options.pool_size.max(1)),
            )
        };

        let pragmas = schema::connection_pragmas(options.busy_timeout_ms);
        let manager = manager.with_init(move |conn| conn.execute_batch(&pragmas));
        let pool = builder
            .connection_timeout(Duration::from_secs(5))
            .build(manager)
            .map_err(|e| open_err(e.to_string()))?;

        let conn = pool.get().map_err(|e| open_err(e.to_string()))?;
        schema::apply(&conn).map_err(|e| open_err(format!("apply schema: {}", e)))?;
        drop(conn);

        info!(path = %options.path.display(), pool_size = pool.max_size(), "Store opened");
        Ok(Self {
            pool,
            path: options.path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the pool. Consuming `self` makes a second close impossible.
    pub fn close(self) {
        debug!(path = %self.path.display(), "Store closed");
        drop(self.pool);
    }

    /// Run `work` on the blocking pool with a pooled connection
    async fn run<T, F>(&self, scope: &Cancellation, work: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection, &Cancellation) -> StoreResult<T> + Send + 'static,
    {
        scope.check()?;
        let pool = self.pool.clone();
        let scope = scope.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(pool_error)?;
            work(&mut conn, &scope)
        })
        .await
        .map_err(|e| StoreError::Database(format!("store worker failed: {}", e)))?
    }

    /// Run `work` inside an `IMMEDIATE` transaction that commits only if the
    /// scope is still live
    async fn write<T, F>(&self, scope: &Cancellation, work: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&rusqlite::Transaction<'_>) -> StoreResult<T> + Send + 'static,
    {
        self.run(scope, move |conn, scope| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(classify)?;
            let out = work(&tx)?;
            // Dropping `tx` on the error path rolls back.
            scope.check()?;
            tx.commit().map_err(classify)?;
            Ok(out)
        })
        .await
    }
}

/// Materialize the owner of a new tool as a placeholder, or refresh `last_seen`
fn touch_provider(tx: &Connection, provider_id: &str, now: DateTime<Utc>) -> StoreResult<()> {
    let placeholder = Provider::placeholder(provider_id, now);
    tx.execute(
        "INSERT INTO providers
             (id, name, endpoint, pubkey, stake_claw, reputation, created_at, last_seen)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(id) DO UPDATE SET last_seen = excluded.last_seen",
        params![
            placeholder.id,
            placeholder.name,
            placeholder.endpoint,
            placeholder.pubkey,
            placeholder.stake_claw,
            placeholder.reputation,
            to_millis(placeholder.created_at),
            to_millis(placeholder.last_seen),
        ],
    )
    .map_err(classify)?;
    Ok(())
}

fn outcome_columns(outcome: &InvocationOutcome) -> (Option<&str>, Option<&str>, Option<&str>) {
    match outcome {
        InvocationOutcome::Completed {
            output_hash,
            receipt_sig,
            cost_claw,
        } => (
            Some(output_hash.as_str()),
            Some(receipt_sig.as_str()),
            Some(cost_claw.as_str()),
        ),
        _ => (None, None, None),
    }
}

#[async_trait]
impl RegistryStore for SqliteStore {
    async fn insert_tool(&self, scope: &Cancellation, tool: &Tool) -> StoreResult<()> {
        let schema_json = serde_json::to_string(&tool.schema).map_err(json_error)?;
        let pricing = serde_json::to_string(&tool.pricing).map_err(json_error)?;
        let tool = tool.clone();

        self.write(scope, move |tx| {
            touch_provider(tx, &tool.provider_id, tool.created_at)?;

            // A deactivated row with the same derived ID is revived in place;
            // an active one leaves the upsert with nothing to change.
            let changed = tx
                .execute(
                    "INSERT INTO tools (id, name, version, description, schema_json, pricing,
                                        provider_id, endpoint, timeout_ms, tags, created_at, updated_at, is_active)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 1)
                     ON CONFLICT(id) DO UPDATE SET
                         description = excluded.description,
                         schema_json = excluded.schema_json,
                         pricing     = excluded.pricing,
                         endpoint    = excluded.endpoint,
                         timeout_ms  = excluded.timeout_ms,
                         tags        = excluded.tags,
                         created_at  = excluded.created_at,
                         updated_at  = excluded.updated_at,
                         is_active   = 1
                     WHERE tools.is_active = 0",
                    params![
                        tool.id,
                        tool.name,
                        tool.version,
                        tool.description,
                        schema_json,
                        pricing,
                        tool.provider_id,
                        tool.endpoint,
                        tool.timeout_ms,
                        join_tags(&tool.tags),
                        to_millis(tool.created_at),
                        to_millis(tool.updated_at),
                    ],
                )
                .map_err(classify)?;
            if changed == 0 {
                return Err(StoreError::UniqueViolation(format!(
                    "tool {} is already active",
                    tool.id
                )));
            }
            Ok(())
        })
        .await
    }

    async fn get_tool(&self, scope: &Cancellation, id: &str) -> StoreResult<Option<Tool>> {
        let id = id.to_string();
        self.run(scope, move |conn, _| {
            conn.query_row(
                &format!("SELECT {} FROM tools t WHERE t.id = ?1", TOOL_COLUMNS),
                params![id],
                tool_from_row,
            )
            .optional()
            .map_err(classify)
        })
        .await
    }

    async fn list_tools(
        &self,
        scope: &Cancellation,
        filter: &ToolFilter,
        page: Page,
    ) -> StoreResult<Vec<Tool>> {
        let query = ToolQuery::new(filter);
        self.run(scope, move |conn, _| {
            let mut stmt = conn.prepare(&query.select_sql()).map_err(classify)?;
            let tools = stmt
                .query_map(params_from_iter(query.page_params(page)), tool_from_row)
                .map_err(classify)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(classify)?;
            Ok(tools)
        })
        .await
    }

    async fn count_tools(&self, scope: &Cancellation, filter: &ToolFilter) -> StoreResult<u64> {
        let query = ToolQuery::new(filter);
        self.run(scope, move |conn, _| {
            let count: i64 = conn
                .query_row(
                    &query.count_sql(),
                    params_from_iter(query.count_params()),
                    |row| row.get(0),
                )
                .map_err(classify)?;
            Ok(u64::try_from(count).unwrap_or_default())
        })
        .await
    }

    async fn update_tool(
        &self,
        scope: &Cancellation,
        id: &str,
        owner: &str,
        update: &ToolUpdate,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let pricing = update
            .pricing
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(json_error)?;
        let tags = update.tags.as_deref().map(join_tags);
        let (id, owner, update) = (id.to_string(), owner.to_string(), update.clone());

        self.write(scope, move |tx| {
            let changed = tx
                .execute(
                    "UPDATE tools SET
                         description = COALESCE(?1, description),
                         pricing     = COALESCE(?2, pricing),
                         endpoint    = COALESCE(?3, endpoint),
                         timeout_ms  = COALESCE(?4, timeout_ms),
                         tags        = COALESCE(?5, tags),
                         updated_at  = ?6
                     WHERE id = ?7 AND provider_id = ?8 AND is_active = 1",
                    params![
                        update.description,
                        pricing,
                        update.endpoint,
                        update.timeout_ms,
                        tags,
                        to_millis(at),
                        id,
                        owner,
                    ],
                )
                .map_err(classify)?;
            Ok(changed > 0)
        })
        .await
    }

    async fn deactivate_tool(
        &self,
        scope: &Cancellation,
        id: &str,
        owner: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let (id, owner) = (id.to_string(), owner.to_string());
        self.write(scope, move |tx| {
            let changed = tx
                .execute(
                    "UPDATE tools
                     SET updated_at = CASE WHEN is_active = 1 THEN ?1 ELSE updated_at END,
                         is_active = 0
                     WHERE id = ?2 AND provider_id = ?3",
                    params![to_millis(at), id, owner],
                )
                .map_err(classify)?;
            Ok(changed > 0)
        })
        .await
    }

    async fn upsert_provider(&self, scope: &Cancellation, provider: &Provider) -> StoreResult<()> {
        let provider = provider.clone();
        self.write(scope, move |tx| {
            tx.execute(
                "INSERT INTO providers (id, name, endpoint, pubkey, stake_claw, reputation, created_at, last_seen)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(id) DO UPDATE SET
                     name       = excluded.name,
                     endpoint   = excluded.endpoint,
                     pubkey     = excluded.pubkey,
                     stake_claw = excluded.stake_claw,
                     last_seen  = excluded.last_seen",
                params![
                    provider.id,
                    provider.name,
                    provider.endpoint,
                    provider.pubkey,
                    provider.stake_claw,
                    provider.reputation,
                    to_millis(provider.created_at),
                    to_millis(provider.last_seen),
                ],
            )
            .map_err(classify)?;
            Ok(())
        })
        .await
    }

    async fn get_provider(&self, scope: &Cancellation, id: &str) -> StoreResult<Option<Provider>> {
        let id = id.to_string();
        self.run(scope, move |conn, _| {
            conn.query_row(
                &format!("SELECT {} FROM providers WHERE id = ?1", PROVIDER_COLUMNS),
                params![id],
                provider_from_row,
            )
            .optional()
            .map_err(classify)
        })
        .await
    }

    async fn list_providers(&self, scope: &Cancellation) -> StoreResult<Vec<Provider>> {
        self.run(scope, move |conn, _| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {} FROM providers ORDER BY reputation DESC, created_at DESC, rowid DESC",
                    PROVIDER_COLUMNS
                ))
                .map_err(classify)?;
            let providers = stmt
                .query_map([], provider_from_row)
                .map_err(classify)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(classify)?;
            Ok(providers)
        })
        .await
    }

    async fn insert_invocation(
        &self,
        scope: &Cancellation,
        invocation: &Invocation,
    ) -> StoreResult<()> {
        let invocation = invocation.clone();
        self.write(scope, move |tx| {
            tx.execute(
                "INSERT INTO invocations (id, tool_id, consumer_id, input_hash, status, started_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    invocation.id.as_str(),
                    invocation.tool_id,
                    invocation.consumer_id,
                    invocation.input_hash,
                    invocation.status.as_str(),
                    to_millis(invocation.started_at),
                ],
            )
            .map_err(classify)?;
            Ok(())
        })
        .await
    }

    async fn get_invocation(
        &self,
        scope: &Cancellation,
        id: &InvocationId,
    ) -> StoreResult<Option<Invocation>> {
        let id = id.clone();
        self.run(scope, move |conn, _| {
            conn.query_row(
                &format!("SELECT {} FROM invocations WHERE id = ?1", INVOCATION_COLUMNS),
                params![id.as_str()],
                invocation_from_row,
            )
            .optional()
            .map_err(classify)
        })
        .await
    }

    async fn list_invocations(
        &self,
        scope: &Cancellation,
        tool_id: &str,
    ) -> StoreResult<Vec<Invocation>> {
        let tool_id = tool_id.to_string();
        self.run(scope, move |conn, _| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {} FROM invocations WHERE tool_id = ?1
                     ORDER BY started_at DESC, rowid DESC",
                    INVOCATION_COLUMNS
                ))
                .map_err(classify)?;
            let invocations = stmt
                .query_map(params![tool_id], invocation_from_row)
                .map_err(classify)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(classify)?;
            Ok(invocations)
        })
        .await
    }

    async fn finish_invocation(
        &self,
        scope: &Cancellation,
        id: &InvocationId,
        outcome: &InvocationOutcome,
        at: DateTime<Utc>,
    ) -> StoreResult<TransitionResult> {
        let (id, outcome) = (id.clone(), outcome.clone());
        self.write(scope, move |tx| {
            let (output_hash, receipt_sig, cost_claw) = outcome_columns(&outcome);
            let changed = tx
                .execute(
                    "UPDATE invocations SET
                         status       = ?1,
                         output_hash  = ?2,
                         receipt_sig  = ?3,
                         cost_claw    = ?4,
                         error        = ?5,
                         completed_at = ?6
                     WHERE id = ?7 AND status = 'pending'",
                    params![
                        outcome.status().as_str(),
                        output_hash,
                        receipt_sig,
                        cost_claw,
                        outcome.error_message(),
                        to_millis(at),
                        id.as_str(),
                    ],
                )
                .map_err(classify)?;
            if changed > 0 {
                return Ok(TransitionResult::Applied);
            }

            let current: Option<String> = tx
                .query_row(
                    "SELECT status FROM invocations WHERE id = ?1",
                    params![id.as_str()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(classify)?;
            match current {
                None => Ok(TransitionResult::Missing),
                Some(status) => {
                    let status = status
                        .parse::<InvocationStatus>()
                        .map_err(|e| StoreError::Corrupt(e.to_string()))?;
                    Ok(TransitionResult::AlreadyTerminal(status))
                }
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_tools_application::{RegistryError, RegistryService};
    use agent_tools_domain::{
        Pricing, PricingModel, RegisterProviderRequest, RegisterToolRequest, SearchQuery,
        ToolSchema, tool_did,
    };
    use serde_json::json;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    const P: &str = "did:claw:agent:provider-p";
    const Q: &str = "did:claw:agent:provider-q";

    fn memory_service() -> RegistryService<SqliteStore> {
        RegistryService::new(Arc::new(SqliteStore::open(MEMORY_PATH).unwrap()))
    }

    fn tool(name: &str, description: &str) -> RegisterToolRequest {
        RegisterToolRequest::new(
            name,
            "1.0.0",
            format!("https://{}.example/run", name),
            ToolSchema::new(json!({"type": "object", "properties": {"source": {"type": "string"}}}))
                .with_output(json!({"type": "object"})),
        )
        .with_description(description)
    }

    // ==================== Open / close ====================

    #[tokio::test]
    async fn test_open_in_memory() {
        let store = SqliteStore::open(MEMORY_PATH).unwrap();
        assert!(store.list_providers(&Cancellation::none()).await.unwrap().is_empty());
        store.close();
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("agent-tools.db");
        let store = SqliteStore::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.path(), path.as_path());
        store.close();
    }

    #[test]
    fn test_open_fails_when_parent_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocking = dir.path().join("blocking");
        std::fs::write(&blocking, b"block").unwrap();

        let err = SqliteStore::open(blocking.join("agent-tools.db")).unwrap_err();
        match err {
            StoreError::Open { reason, .. } => assert!(reason.contains("create directory")),
            other => panic!("expected open error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent-tools.db");

        let store = Arc::new(SqliteStore::open(&path).unwrap());
        let id = RegistryService::new(Arc::clone(&store))
            .register_tool(P, tool("persist", "Survives reopen"))
            .await
            .unwrap()
            .id;
        drop(store);

        let reopened = SqliteStore::open_with(
            StoreOptions::new(&path)
                .with_pool_size(2)
                .with_busy_timeout_ms(1000),
        )
        .unwrap();
        let found = reopened
            .get_tool(&Cancellation::none(), &id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.name, "persist");
        assert_eq!(found.schema.output, json!({"type": "object"}));
    }

    // ==================== Registration ====================

    #[tokio::test]
    async fn test_register_round_trip() {
        let service = memory_service();
        let registered = service
            .register_tool(
                P,
                tool("solidity-auditor", "Audits Solidity smart contracts")
                    .with_pricing(Pricing::new(PricingModel::PerCall, "0.5"))
                    .with_tags(["security", "solidity"])
                    .with_timeout_ms(5000),
            )
            .await
            .unwrap();

        let fetched = service.get_tool(&registered.id).await.unwrap();
        assert_eq!(fetched, registered);
        assert_eq!(fetched.id, tool_did("solidity-auditor", "1.0.0", P));
        assert_eq!(fetched.tags, vec!["security", "solidity"]);
        assert_eq!(fetched.pricing.model, PricingModel::PerCall);
        assert_eq!(fetched.timeout_ms, 5000);
    }

    #[tokio::test]
    async fn test_register_twice_is_duplicate() {
        let service = memory_service();
        service.register_tool(P, tool("dup", "first")).await.unwrap();

        let err = service
            .register_tool(P, tool("dup", "second"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_TOOL");
        assert_eq!(service.list_tools(1, 20).await.unwrap().total, 1);
        assert_eq!(
            service
                .get_tool(&tool_did("dup", "1.0.0", P))
                .await
                .unwrap()
                .description,
            "first"
        );
    }

    #[tokio::test]
    async fn test_same_name_other_provider_is_distinct() {
        let service = memory_service();
        let a = service.register_tool(P, tool("shared", "a")).await.unwrap();
        let b = service.register_tool(Q, tool("shared", "b")).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(service.list_providers().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_reregister_after_deactivation() {
        let service = memory_service();
        let first = service
            .register_tool(P, tool("reuse", "old description"))
            .await
            .unwrap();
        let inv = service
            .invocations()
            .record_invocation(&first.id, "consumer", &json!({}))
            .await
            .unwrap();
        service.deactivate_tool(&first.id, P).await.unwrap();

        let second = service
            .register_tool(P, tool("reuse", "new description"))
            .await
            .unwrap();
        assert_eq!(second.id, first.id);
        assert!(second.is_active);
        assert_eq!(second.description, "new description");

        // History stays attached and search sees the new text only.
        assert_eq!(
            service.invocations().get_invocation(&inv).await.unwrap().tool_id,
            second.id
        );
        let hits = service.search_tools(&SearchQuery::new("new")).await.unwrap();
        assert_eq!(hits.total, 1);
        let misses = service.search_tools(&SearchQuery::new("old")).await.unwrap();
        assert_eq!(misses.total, 0);
    }

    #[tokio::test]
    async fn test_default_coercion() {
        let service = memory_service();
        let zero = service
            .register_tool(P, tool("zero", "").with_timeout_ms(0))
            .await
            .unwrap();
        let negative = service
            .register_tool(P, tool("negative", "").with_timeout_ms(-5))
            .await
            .unwrap();

        for id in [zero.id, negative.id] {
            let stored = service.get_tool(&id).await.unwrap();
            assert_eq!(stored.timeout_ms, 30_000);
            assert_eq!(stored.pricing.model, PricingModel::Free);
        }
    }

    #[tokio::test]
    async fn test_registration_creates_placeholder_provider() {
        let service = memory_service();
        service.register_tool(P, tool("t", "")).await.unwrap();

        let provider = service.get_provider(P).await.unwrap();
        assert!(provider.is_placeholder());
        assert_eq!(provider.stake_claw, "0");
    }

    // ==================== Discovery ====================

    #[tokio::test]
    async fn test_search_scoping() {
        let service = memory_service();
        let a = service
            .register_tool(P, tool("auditor", "Audits Solidity smart contracts"))
            .await
            .unwrap();
        service
            .register_tool(P, tool("pricer", "Returns DeFi token prices"))
            .await
            .unwrap();

        let result = service
            .search_tools(&SearchQuery::new("solidity"))
            .await
            .unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.tools.len(), 1);
        assert_eq!(result.tools[0].id, a.id);
    }

    #[tokio::test]
    async fn test_search_matches_prefix_and_tags() {
        let service = memory_service();
        service
            .register_tool(P, tool("scanner", "Static analysis").with_tags(["security"]))
            .await
            .unwrap();

        assert_eq!(service.search_tools(&SearchQuery::new("secur")).await.unwrap().total, 1);
        assert_eq!(service.search_tools(&SearchQuery::new("scan")).await.unwrap().total, 1);
        assert_eq!(
            service
                .search_tools(&SearchQuery::new("scan nothing-like-this"))
                .await
                .unwrap()
                .total,
            0
        );
    }

    #[tokio::test]
    async fn test_search_tolerates_fts_syntax() {
        let service = memory_service();
        service
            .register_tool(P, tool("quoted", "Handles \"odd\" input"))
            .await
            .unwrap();

        for raw in ["\"odd", "odd*", "name:odd", "(odd", "odd OR", "\"*"] {
            let result = service.search_tools(&SearchQuery::new(raw)).await;
            assert!(result.is_ok(), "query {:?} failed: {:?}", raw, result);
        }
    }

    #[tokio::test]
    async fn test_pagination() {
        let service = memory_service();
        for i in 0..5 {
            service
                .register_tool(P, tool(&format!("tool-{}", i), "paged"))
                .await
                .unwrap();
        }

        let first = service.list_tools(1, 3).await.unwrap();
        assert_eq!(first.tools.len(), 3);
        assert_eq!(first.total, 5);

        let second = service.list_tools(2, 3).await.unwrap();
        assert_eq!(second.tools.len(), 2);
        assert_eq!(second.total, 5);

        let mut seen: Vec<_> = first
            .tools
            .iter()
            .chain(second.tools.iter())
            .map(|t| t.name.clone())
            .collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 5);

        let searched = service
            .search_tools(&SearchQuery::new("paged").with_page(2, 3))
            .await
            .unwrap();
        assert_eq!(searched.tools.len(), 2);
        assert_eq!(searched.total, 5);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let service = memory_service();
        for name in ["first", "second", "third"] {
            service.register_tool(P, tool(name, "")).await.unwrap();
        }
        let names: Vec<_> = service
            .list_tools(1, 20)
            .await
            .unwrap()
            .tools
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_search_filters() {
        let service = memory_service();
        service
            .register_tool(
                P,
                tool("cheap-audit", "audit")
                    .with_tags(["security"])
                    .with_pricing(Pricing::new(PricingModel::PerCall, "0.5")),
            )
            .await
            .unwrap();
        service
            .register_tool(
                P,
                tool("pricey-audit", "audit")
                    .with_tags(["security", "premium"])
                    .with_pricing(Pricing::new(PricingModel::PerCall, "25")),
            )
            .await
            .unwrap();
        service
            .register_tool(Q, tool("free-audit", "audit"))
            .await
            .unwrap();

        let by_tag = service
            .search_tools(&SearchQuery::new("audit").with_tag("security"))
            .await
            .unwrap();
        assert_eq!(by_tag.total, 2);

        // Tag matching is exact, not substring.
        let partial = service
            .search_tools(&SearchQuery::new("").with_tag("secur"))
            .await
            .unwrap();
        assert_eq!(partial.total, 0);

        let by_provider = service
            .search_tools(&SearchQuery::new("audit").with_provider(Q))
            .await
            .unwrap();
        assert_eq!(by_provider.total, 1);
        assert_eq!(by_provider.tools[0].name, "free-audit");

        let mut by_price: Vec<_> = service
            .search_tools(&SearchQuery::new("audit").with_max_price(1.0))
            .await
            .unwrap()
            .tools
            .into_iter()
            .map(|t| t.name)
            .collect();
        by_price.sort();
        assert_eq!(by_price, vec!["cheap-audit", "free-audit"]);
    }

    #[tokio::test]
    async fn test_blank_query_browses() {
        let service = memory_service();
        service.register_tool(P, tool("a", "")).await.unwrap();
        service.register_tool(P, tool("b", "")).await.unwrap();

        let result = service.search_tools(&SearchQuery::new("  ")).await.unwrap();
        assert_eq!(result.total, 2);
        assert!(result.query.is_none());
    }

    // ==================== Concurrency ====================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registration_has_one_winner() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open_with(
            StoreOptions::new(dir.path().join("agent-tools.db")).with_pool_size(8),
        )
        .unwrap();
        let service = RegistryService::new(Arc::new(store));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .register_tool(P, tool("contended", "raced registration"))
                        .await
                })
            })
            .collect();

        let mut registered = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => registered += 1,
                Err(RegistryError::Duplicate { .. }) => duplicates += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!(registered, 1);
        assert_eq!(duplicates, 15);
        assert_eq!(service.list_tools(1, 20).await.unwrap().total, 1);
    }

    // ==================== Lifecycle ====================

    #[tokio::test]
    async fn test_deactivation_requires_owner() {
        let service = memory_service();
        let t = service.register_tool(P, tool("guarded", "")).await.unwrap();

        let err = service.deactivate_tool(&t.id, Q).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(service.get_tool(&t.id).await.unwrap().is_active);
        assert_eq!(service.list_tools(1, 20).await.unwrap().total, 1);

        let err = service
            .deactivate_tool("did:claw:tool:unknown", P)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_repeated_deactivation_by_owner_succeeds() {
        let service = memory_service();
        let t = service.register_tool(P, tool("twice", "")).await.unwrap();

        service.deactivate_tool(&t.id, P).await.unwrap();
        let first = service.get_tool(&t.id).await.unwrap();
        service.deactivate_tool(&t.id, P).await.unwrap();
        let second = service.get_tool(&t.id).await.unwrap();

        assert!(!second.is_active);
        assert_eq!(second.updated_at, first.updated_at);
        assert!(
            service
                .deactivate_tool(&t.id, Q)
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn test_update_tool_refreshes_index() {
        let service = memory_service();
        let t = service
            .register_tool(P, tool("mutable", "original words"))
            .await
            .unwrap();

        let updated = service
            .update_tool(
                &t.id,
                P,
                agent_tools_domain::ToolUpdate {
                    description: Some("rewritten summary".into()),
                    tags: Some(vec!["fresh".into()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.description, "rewritten summary");
        assert_eq!(updated.endpoint, t.endpoint);
        assert!(updated.updated_at >= t.updated_at);

        assert_eq!(service.search_tools(&SearchQuery::new("original")).await.unwrap().total, 0);
        assert_eq!(service.search_tools(&SearchQuery::new("rewritten")).await.unwrap().total, 1);
        assert_eq!(service.search_tools(&SearchQuery::new("fresh")).await.unwrap().total, 1);

        let err = service
            .update_tool(&t.id, Q, agent_tools_domain::ToolUpdate::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_provider_upsert_keeps_created_at() {
        let service = memory_service();
        service.register_tool(P, tool("t", "")).await.unwrap();
        let placeholder = service.get_provider(P).await.unwrap();

        let registered = service
            .register_provider(
                RegisterProviderRequest::new(P, "https://p.example", "ed25519:k1").with_name("P"),
            )
            .await
            .unwrap();
        assert_eq!(registered.created_at, placeholder.created_at);
        assert_eq!(registered.endpoint, "https://p.example");
        assert!(!registered.is_placeholder());

        let err = service.get_provider(Q).await.unwrap_err();
        assert!(err.is_not_found());
    }

    // ==================== Invocations ====================

    #[tokio::test]
    async fn test_invocation_lifecycle_is_monotonic() {
        let service = memory_service();
        let t = service.register_tool(P, tool("runner", "")).await.unwrap();
        let tracker = service.invocations();

        let id = tracker
            .record_invocation(&t.id, "did:claw:agent:c", &json!({"n": 1}))
            .await
            .unwrap();
        tracker
            .complete_invocation(&id, "sha256:abc", "sig", "0.5")
            .await
            .unwrap();

        let err = tracker.fail_invocation(&id, "too late").await.unwrap_err();
        assert!(matches!(
            err,
            RegistryError::InvalidTransition {
                status: InvocationStatus::Completed,
                ..
            }
        ));

        let inv = tracker.get_invocation(&id).await.unwrap();
        assert_eq!(inv.status, InvocationStatus::Completed);
        assert_eq!(inv.output_hash.as_deref(), Some("sha256:abc"));
        assert!(inv.error.is_none());
        assert!(inv.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_invocation_failure_and_timeout() {
        let service = memory_service();
        let t = service.register_tool(P, tool("flaky", "")).await.unwrap();
        let tracker = service.invocations();

        let failed = tracker.record_invocation(&t.id, "c", &json!({})).await.unwrap();
        tracker.fail_invocation(&failed, "upstream 502").await.unwrap();
        let timed_out = tracker.record_invocation(&t.id, "c", &json!({})).await.unwrap();
        tracker.timeout_invocation(&timed_out).await.unwrap();

        let listed = tracker.list_invocations(&t.id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, timed_out);
        assert_eq!(listed[0].status, InvocationStatus::Timeout);
        assert_eq!(listed[1].status, InvocationStatus::Failed);
        assert_eq!(listed[1].error.as_deref(), Some("upstream 502"));
    }

    #[tokio::test]
    async fn test_invocation_unknown_ids() {
        let service = memory_service();
        let tracker = service.invocations();

        let err = tracker
            .record_invocation("did:claw:tool:missing", "c", &json!({}))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = tracker
            .complete_invocation(&InvocationId::from("inv_missing"), "sha256:x", "", "")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_input_hash_is_digest_only() {
        let service = memory_service();
        let t = service.register_tool(P, tool("hasher", "")).await.unwrap();
        let input = json!({"secret": "do not persist"});
        let id = service
            .invocations()
            .record_invocation(&t.id, "c", &input)
            .await
            .unwrap();

        let inv = service.invocations().get_invocation(&id).await.unwrap();
        assert_eq!(inv.input_hash, agent_tools_domain::payload_digest(&input));
        assert!(!inv.input_hash.contains("secret"));
    }

    // ==================== Cancellation & corruption ====================

    #[tokio::test]
    async fn test_cancelled_registration_leaves_no_rows() {
        let service = memory_service();
        let token = CancellationToken::new();
        token.cancel();

        let err = service
            .with_cancellation(token)
            .register_tool(P, tool("never", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Cancelled));
        assert_eq!(service.list_tools(1, 20).await.unwrap().total, 0);
        assert!(service.list_providers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_before_commit_rolls_back() {
        let store = SqliteStore::open(MEMORY_PATH).unwrap();
        let token = CancellationToken::new();
        let scope = Cancellation::none().with_token(token.clone());

        let err = store
            .write(&scope, move |tx| {
                touch_provider(tx, P, Utc::now())?;
                token.cancel();
                Ok(())
            })
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Cancelled);
        assert!(
            store
                .get_provider(&Cancellation::none(), P)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_corrupt_row_is_internal() {
        let store = Arc::new(SqliteStore::open(MEMORY_PATH).unwrap());
        let service = RegistryService::new(Arc::clone(&store));
        let t = service.register_tool(P, tool("broken", "")).await.unwrap();

        store
            .pool
            .get()
            .unwrap()
            .execute(
                "UPDATE tools SET pricing = 'not json' WHERE id = ?1",
                params![t.id],
            )
            .unwrap();

        let err = service.get_tool(&t.id).await.unwrap_err();
        assert!(matches!(err, RegistryError::Internal(_)));
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }

    // ==================== End to end ====================

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let service = memory_service();
        service
            .register_provider(RegisterProviderRequest::new(P, "e1", "k1"))
            .await
            .unwrap();

        let t = service
            .register_tool(
                P,
                tool("solidity-auditor", "Audits Solidity smart contracts")
                    .with_tags(["security", "solidity"]),
            )
            .await
            .unwrap();

        let found = service
            .search_tools(&SearchQuery::new("solidity"))
            .await
            .unwrap();
        assert!(found.tools.iter().any(|x| x.id == t.id));

        service.deactivate_tool(&t.id, P).await.unwrap();
        let listed = service.list_tools(1, 20).await.unwrap();
        assert!(listed.tools.iter().all(|x| x.id != t.id));

        let fetched = service.get_tool(&t.id).await.unwrap();
        assert!(!fetched.is_active);
        assert_eq!(fetched.name, "solidity-auditor");

        let provider = service.get_provider(P).await.unwrap();
        assert_eq!(provider.endpoint, "e1");
        assert_eq!(provider.pubkey, "k1");
    }
}
