//! # Redis Cache Store
//!
//! Production [`CacheStore`] backed by Redis with the RedisJSON and
//! RediSearch modules: one JSON document per product under
//! `product:{id}`, and a search index over the filterable fields.
//!
//! Filter translation follows the index grammar: substring match on name,
//! inclusive numeric range on price, OR-groups for categories and tags,
//! all clauses joined conjunctively, `*` when no predicate is given.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::Value;
use uuid::Uuid;

use crate::cache::{CacheError, CacheSearchResult, CacheStore};
use crate::config::CacheConfig;
use crate::models::{Product, ProductFilter};

/// Key prefix for product entries
pub const PRODUCT_KEY_PREFIX: &str = "product:";

/// Name of the secondary search index
pub const SEARCH_INDEX: &str = "product:id";

/// Cache key for a product id
pub fn product_key(product_id: Uuid) -> String {
    format!("{PRODUCT_KEY_PREFIX}{product_id}")
}

/// Translate a catalog filter into the index query grammar.
pub(crate) fn build_search_query(filter: &ProductFilter) -> String {
    let mut clauses = Vec::new();

    if let Some(name) = filter.name.as_ref().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        clauses.push(format!("@name:*{name}*"));
    }

    if let Some((low, high)) = filter.price {
        clauses.push(format!("@price:[{low} {high}]"));
    }

    if let Some(categories) = filter.categories.as_ref().filter(|c| !c.is_empty()) {
        let group = categories
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(" | ");
        clauses.push(format!("@category:({group})"));
    }

    if let Some(tags) = filter.tags.as_ref().filter(|t| !t.is_empty()) {
        let group = tags.join(" | ");
        clauses.push(format!("@tags:({group})"));
    }

    if clauses.is_empty() {
        "*".to_string()
    } else {
        clauses.join(" ")
    }
}

/// Redis-backed cache store
#[derive(Clone)]
pub struct RedisCacheStore {
    connection: MultiplexedConnection,
}

impl std::fmt::Debug for RedisCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheStore").finish_non_exhaustive()
    }
}

impl RedisCacheStore {
    /// Connect to the cache. The caller owns the health transition: flip
    /// the flag healthy only after this succeeds.
    pub async fn connect(config: &CacheConfig) -> Result<Self, CacheError> {
        let client = redis::Client::open(config.cache_url())?;
        let connection = tokio::time::timeout(
            Duration::from_secs(config.connect_timeout_seconds),
            client.get_multiplexed_tokio_connection(),
        )
        .await
        .map_err(|_| CacheError::Backend("connection attempt timed out".to_string()))??;

        Ok(Self { connection })
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn ping(&self) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();
        let _: String = redis::cmd("PING").query_async(&mut connection).await?;
        Ok(())
    }

    async fn get(&self, product_id: Uuid) -> Result<Option<Product>, CacheError> {
        let mut connection = self.connection.clone();
        let raw: Option<String> = redis::cmd("JSON.GET")
            .arg(product_key(product_id))
            .arg("$")
            .query_async(&mut connection)
            .await?;

        match raw {
            None => Ok(None),
            // JSON.GET with a `$` path wraps the document in an array
            Some(json) => {
                let mut documents: Vec<Product> = serde_json::from_str(&json)?;
                Ok(documents.pop())
            }
        }
    }

    async fn set(&self, product: &Product) -> Result<(), CacheError> {
        let payload = serde_json::to_string(product)?;
        let mut connection = self.connection.clone();
        let _: () = redis::cmd("JSON.SET")
            .arg(product_key(product.product_id))
            .arg("$")
            .arg(payload)
            .query_async(&mut connection)
            .await?;
        Ok(())
    }

    async fn delete(&self, product_id: Uuid) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();
        let _: () = redis::cmd("DEL")
            .arg(product_key(product_id))
            .query_async(&mut connection)
            .await?;
        Ok(())
    }

    async fn has_any_entries(&self) -> Result<bool, CacheError> {
        let mut connection = self.connection.clone();
        let mut cursor: u64 = 0;
        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(format!("{PRODUCT_KEY_PREFIX}*"))
                .arg("COUNT")
                .arg(100)
                .query_async(&mut connection)
                .await?;

            if !keys.is_empty() {
                return Ok(true);
            }
            if next == 0 {
                return Ok(false);
            }
            cursor = next;
        }
    }

    async fn flush_all(&self) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();
        let _: () = redis::cmd("FLUSHALL").query_async(&mut connection).await?;
        Ok(())
    }

    async fn create_index(&self) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();
        let _: () = redis::cmd("FT.CREATE")
            .arg(SEARCH_INDEX)
            .arg("ON")
            .arg("JSON")
            .arg("PREFIX")
            .arg(1)
            .arg(PRODUCT_KEY_PREFIX)
            .arg("SCHEMA")
            .arg("$.name")
            .arg("AS")
            .arg("name")
            .arg("TEXT")
            .arg("$.price")
            .arg("AS")
            .arg("price")
            .arg("NUMERIC")
            .arg("$.tags[*]")
            .arg("AS")
            .arg("tags")
            .arg("TEXT")
            .arg("$.category")
            .arg("AS")
            .arg("category")
            .arg("TEXT")
            .query_async(&mut connection)
            .await?;
        Ok(())
    }

    async fn search(
        &self,
        filter: &ProductFilter,
        offset: u64,
        limit: u64,
    ) -> Result<CacheSearchResult, CacheError> {
        let query = build_search_query(filter);
        let mut connection = self.connection.clone();
        // Same ordering criteria as the primary read path, so callers cannot
        // tell which path served them.
        let reply: Value = redis::cmd("FT.SEARCH")
            .arg(SEARCH_INDEX)
            .arg(query)
            .arg("SORTBY")
            .arg("price")
            .arg("DESC")
            .arg("LIMIT")
            .arg(offset)
            .arg(limit)
            .query_async(&mut connection)
            .await?;

        parse_search_reply(reply)
    }
}

/// Decode an FT.SEARCH reply: `[total, key, [attr, json, ...], key, ...]`.
/// With an `ON JSON` index the document payload is the `$` attribute.
fn parse_search_reply(reply: Value) -> Result<CacheSearchResult, CacheError> {
    let Value::Array(items) = reply else {
        return Err(CacheError::MalformedReply(
            "expected a top-level array".to_string(),
        ));
    };

    let mut iter = items.into_iter();
    let total = match iter.next() {
        Some(Value::Int(n)) => n.max(0) as u64,
        other => {
            return Err(CacheError::MalformedReply(format!(
                "expected a leading total count, got {other:?}"
            )))
        }
    };

    let mut products = Vec::new();
    for entry in iter {
        let Value::Array(fields) = entry else {
            // Document keys interleave with the field arrays; skip them.
            continue;
        };
        let mut fields = fields.into_iter();
        while let (Some(attr), Some(value)) = (fields.next(), fields.next()) {
            if as_text(&attr).as_deref() == Some("$") {
                if let Some(json) = as_text(&value) {
                    products.push(serde_json::from_str(&json)?);
                }
            }
        }
    }

    Ok(CacheSearchResult { total, products })
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::BulkString(bytes) => String::from_utf8(bytes.clone()).ok(),
        Value::SimpleString(text) => Some(text.clone()),
        _ => None,
    }
}
