//! Redis-based todo storage.
//!
//! Layout:
//!
//! ```text
//! todos            SET   of todo IDs (the index)
//! todo:{id}        HASH  id, text, completed ("true"/"false"), createdAt, updatedAt
//! ```
//!
//! Creates and deletes touch both structures in one `MULTI`/`EXEC` block, and
//! updates run as a `WATCH` transaction on the record key, so no caller can
//! observe an index entry without its record (or the reverse) as a result of
//! these operations.

#[cfg(feature = "redis")]
mod implementation {
    use crate::config::RedisSettings;
    use crate::models::{HealthReport, Todo, TodoId, TodoPatch, sort_newest_first};
    use crate::storage::{TodoStorage, retry_connection};
    use crate::{Error, Result};
    use chrono::{DateTime, SecondsFormat, Utc};
    use redis::{Client, Commands, Connection, RedisError};
    use std::collections::HashMap;
    use std::time::Duration;

    const FIELD_ID: &str = "id";
    const FIELD_TEXT: &str = "text";
    const FIELD_COMPLETED: &str = "completed";
    const FIELD_CREATED_AT: &str = "createdAt";
    const FIELD_UPDATED_AT: &str = "updatedAt";

    /// Key names used by the store.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RedisKeys {
        /// Key of the index set.
        pub index: String,
        /// Prefix of per-todo hash keys.
        pub record_prefix: String,
    }

    impl Default for RedisKeys {
        fn default() -> Self {
            Self {
                index: "todos".to_string(),
                record_prefix: "todo:".to_string(),
            }
        }
    }

    impl RedisKeys {
        /// Keys under a namespace, e.g. `staging:todos` and `staging:todo:{id}`.
        #[must_use]
        pub fn namespaced(namespace: &str) -> Self {
            Self {
                index: format!("{namespace}:todos"),
                record_prefix: format!("{namespace}:todo:"),
            }
        }

        /// Builds the record key for a todo.
        #[must_use]
        pub fn record(&self, id: &str) -> String {
            format!("{}{id}", self.record_prefix)
        }
    }

    /// Redis-based todo storage.
    pub struct RedisTodoStorage {
        client: Client,
        keys: RedisKeys,
        connect_timeout: Duration,
        command_timeout: Duration,
    }

    impl RedisTodoStorage {
        /// Backend name reported in logs and health checks.
        pub const NAME: &'static str = "redis";

        /// Connects to Redis, retrying per `settings.retry`.
        ///
        /// # Errors
        ///
        /// Returns an error if the URL is invalid or no `PING` succeeded before
        /// the retry policy was exhausted.
        pub fn connect(url: &str, settings: &RedisSettings) -> Result<Self> {
            Self::connect_with_keys(url, settings, RedisKeys::default())
        }

        /// Connects using custom key names.
        ///
        /// # Errors
        ///
        /// Same as [`RedisTodoStorage::connect`].
        pub fn connect_with_keys(
            url: &str,
            settings: &RedisSettings,
            keys: RedisKeys,
        ) -> Result<Self> {
            let client = Client::open(url).map_err(|e| Error::OperationFailed {
                operation: "redis_open".to_string(),
                cause: e.to_string(),
            })?;

            let storage = Self {
                client,
                keys,
                connect_timeout: settings.connect_timeout,
                command_timeout: settings.command_timeout,
            };

            retry_connection(&settings.retry, Self::NAME, || storage.ping())?;
            tracing::info!(url = %redact_url(url), index = %storage.keys.index, "Connected to Redis");

            Ok(storage)
        }

        /// Returns the key names in use.
        #[must_use]
        pub const fn keys(&self) -> &RedisKeys {
            &self.keys
        }

        /// Gets a connection with command timeouts applied.
        fn connection(&self, operation: &str) -> Result<Connection> {
            let conn = self
                .client
                .get_connection_with_timeout(self.connect_timeout)
                .map_err(|e| redis_error(operation, &e))?;

            let timeout = Some(self.command_timeout).filter(|d| !d.is_zero());
            conn.set_read_timeout(timeout)
                .map_err(|e| redis_error(operation, &e))?;
            conn.set_write_timeout(timeout)
                .map_err(|e| redis_error(operation, &e))?;

            Ok(conn)
        }

        /// Issues a `PING`.
        fn ping(&self) -> Result<()> {
            let mut conn = self.connection("ping")?;
            let reply: String = redis::cmd("PING")
                .query(&mut conn)
                .map_err(|e| redis_error("ping", &e))?;

            if reply == "PONG" {
                Ok(())
            } else {
                Err(Error::OperationFailed {
                    operation: "redis_ping".to_string(),
                    cause: format!("unexpected reply: {reply}"),
                })
            }
        }

        /// Serializes a todo to hash fields.
        fn encode(todo: &Todo) -> Vec<(&'static str, String)> {
            let mut fields = vec![
                (FIELD_ID, todo.id.to_string()),
                (FIELD_TEXT, todo.text.clone()),
                (FIELD_COMPLETED, todo.completed.to_string()),
                (FIELD_CREATED_AT, format_time(todo.created_at)),
            ];
            if let Some(updated_at) = todo.updated_at {
                fields.push((FIELD_UPDATED_AT, format_time(updated_at)));
            }
            fields
        }

        /// Deserializes a todo from hash fields.
        ///
        /// Returns `None` for an empty hash (no record) or a malformed one.
        fn decode(fields: &HashMap<String, String>) -> Option<Todo> {
            let id = fields.get(FIELD_ID).filter(|s| !s.is_empty())?;
            let text = fields.get(FIELD_TEXT).filter(|s| !s.is_empty())?;
            let created_at = fields.get(FIELD_CREATED_AT).and_then(|s| parse_time(s))?;
            let completed = fields.get(FIELD_COMPLETED).is_some_and(|s| s == "true");
            let updated_at = fields
                .get(FIELD_UPDATED_AT)
                .filter(|s| !s.is_empty())
                .and_then(|s| parse_time(s));

            Some(Todo {
                id: TodoId::new(id.clone()),
                text: text.clone(),
                completed,
                created_at,
                updated_at,
            })
        }

        /// Decodes a record, logging and counting anything unusable.
        fn decode_or_skip(id: &str, fields: &HashMap<String, String>) -> Option<Todo> {
            let todo = Self::decode(fields);
            if todo.is_none() {
                tracing::warn!(
                    todo_id = %id,
                    malformed = !fields.is_empty(),
                    "Skipping index entry without a valid record"
                );
                metrics::counter!("todo_index_orphans_total", "backend" => Self::NAME)
                    .increment(1);
            }
            todo
        }
    }

    impl TodoStorage for RedisTodoStorage {
        fn backend_name(&self) -> &'static str {
            Self::NAME
        }

        fn list(&self) -> Result<Vec<Todo>> {
            let mut conn = self.connection("list")?;
            let ids: Vec<String> = conn
                .smembers(&self.keys.index)
                .map_err(|e| redis_error("list", &e))?;

            if ids.is_empty() {
                return Ok(Vec::new());
            }

            let mut pipe = redis::pipe();
            for id in &ids {
                pipe.hgetall(self.keys.record(id));
            }
            let records: Vec<HashMap<String, String>> = pipe
                .query(&mut conn)
                .map_err(|e| redis_error("list", &e))?;

            let mut todos: Vec<Todo> = ids
                .iter()
                .zip(&records)
                .filter_map(|(id, fields)| Self::decode_or_skip(id, fields))
                .collect();
            sort_newest_first(&mut todos);

            Ok(todos)
        }

        fn get(&self, id: &TodoId) -> Result<Option<Todo>> {
            let mut conn = self.connection("get")?;
            let fields: HashMap<String, String> = conn
                .hgetall(self.keys.record(id.as_str()))
                .map_err(|e| redis_error("get", &e))?;

            if fields.is_empty() {
                return Ok(None);
            }
            Ok(Self::decode_or_skip(id.as_str(), &fields))
        }

        fn create(&self, todo: &Todo) -> Result<Todo> {
            let mut conn = self.connection("create")?;
            let key = self.keys.record(todo.id.as_str());
            let fields = Self::encode(todo);

            let _: () = redis::pipe()
                .atomic()
                .del(&key)
                .ignore()
                .hset_multiple(&key, &fields)
                .ignore()
                .sadd(&self.keys.index, todo.id.as_str())
                .ignore()
                .query(&mut conn)
                .map_err(|e| redis_error("create", &e))?;

            Ok(todo.clone())
        }

        fn update(&self, id: &TodoId, patch: &TodoPatch) -> Result<Option<Todo>> {
            let mut conn = self.connection("update")?;
            let key = self.keys.record(id.as_str());

            // WATCH aborts the EXEC if a delete lands between read and write,
            // and the helper re-runs the closure, which then sees no record.
            redis::transaction(&mut conn, &[&key], |conn, pipe| {
                let fields: HashMap<String, String> = conn.hgetall(&key)?;
                let Some(current) = Self::decode(&fields) else {
                    return Ok(Some(None));
                };
                let next = current.patched(patch, Utc::now());

                let committed: Option<(bool,)> = pipe
                    .hset_multiple(&key, &Self::encode(&next))
                    .ignore()
                    .exists(&key)
                    .query(conn)?;

                Ok(committed.map(|_| Some(next)))
            })
            .map_err(|e| redis_error("update", &e))
        }

        fn delete(&self, id: &TodoId) -> Result<Option<Todo>> {
            let mut conn = self.connection("delete")?;
            let key = self.keys.record(id.as_str());

            let snapshot: HashMap<String, String> = conn
                .hgetall(&key)
                .map_err(|e| redis_error("delete", &e))?;

            // Always SREM so an orphaned index entry is cleaned up too.
            let (removed, _): (i64, i64) = redis::pipe()
                .atomic()
                .del(&key)
                .srem(&self.keys.index, id.as_str())
                .query(&mut conn)
                .map_err(|e| redis_error("delete", &e))?;

            if removed == 0 {
                return Ok(None);
            }
            Ok(Self::decode(&snapshot))
        }

        /// Empty means no decodable records, so an index holding only
        /// orphaned IDs still counts as empty.
        fn is_empty(&self) -> Result<bool> {
            Ok(self.list()?.is_empty())
        }

        fn health_check(&self) -> HealthReport {
            match self.ping() {
                Ok(()) => HealthReport::healthy(Self::NAME),
                Err(e) => HealthReport::disconnected(Self::NAME, e.to_string()),
            }
        }
    }

    /// Maps a Redis error to the crate error.
    ///
    /// Connectivity failures become `BackendUnavailable`; anything else
    /// (wrong type, protocol error) is an `OperationFailed`.
    fn redis_error(operation: &str, e: &RedisError) -> Error {
        if e.is_io_error() || e.is_timeout() || e.is_connection_dropped() || e.is_connection_refusal()
        {
            Error::BackendUnavailable {
                backend: RedisTodoStorage::NAME,
                operation: operation.to_string(),
                cause: e.to_string(),
            }
        } else {
            Error::OperationFailed {
                operation: format!("redis_{operation}"),
                cause: e.to_string(),
            }
        }
    }

    fn format_time(time: DateTime<Utc>) -> String {
        time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    fn parse_time(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// Hides credentials in a connection URL for logging.
    pub(crate) fn redact_url(url: &str) -> String {
        match (url.find("://"), url.rfind('@')) {
            (Some(scheme_end), Some(at)) if at > scheme_end => {
                format!("{}://***@{}", &url[..scheme_end], &url[at + 1..])
            },
            _ => url.to_string(),
        }
    }

}

#[cfg(feature = "redis")]
pub use implementation::{RedisKeys, RedisTodoStorage};

#[cfg(not(feature = "redis"))]
mod stub {
    use crate::config::RedisSettings;
    use crate::models::{HealthReport, Todo, TodoId, TodoPatch};
    use crate::storage::TodoStorage;
    use crate::{Error, Result};

    /// Stub Redis storage when the feature is not enabled.
    pub struct RedisTodoStorage;

    impl RedisTodoStorage {
        /// Backend name reported in logs and health checks.
        pub const NAME: &'static str = "redis";

        /// Connects to Redis (stub).
        ///
        /// # Errors
        ///
        /// Always returns an error because the feature is not enabled.
        pub fn connect(_url: &str, _settings: &RedisSettings) -> Result<Self> {
            Err(Error::FeatureNotEnabled("redis".to_string()))
        }
    }

    impl TodoStorage for RedisTodoStorage {
        fn backend_name(&self) -> &'static str {
            Self::NAME
        }

        fn list(&self) -> Result<Vec<Todo>> {
            Err(Error::FeatureNotEnabled("redis".to_string()))
        }

        fn get(&self, _id: &TodoId) -> Result<Option<Todo>> {
            Err(Error::FeatureNotEnabled("redis".to_string()))
        }

        fn create(&self, _todo: &Todo) -> Result<Todo> {
            Err(Error::FeatureNotEnabled("redis".to_string()))
        }

        fn update(&self, _id: &TodoId, _patch: &TodoPatch) -> Result<Option<Todo>> {
            Err(Error::FeatureNotEnabled("redis".to_string()))
        }

        fn delete(&self, _id: &TodoId) -> Result<Option<Todo>> {
            Err(Error::FeatureNotEnabled("redis".to_string()))
        }

        fn is_empty(&self) -> Result<bool> {
            Err(Error::FeatureNotEnabled("redis".to_string()))
        }

        fn health_check(&self) -> HealthReport {
            HealthReport::disconnected(Self::NAME, "redis feature not enabled")
        }
    }
}

#[cfg(not(feature = "redis"))]
pub use stub::RedisTodoStorage;
