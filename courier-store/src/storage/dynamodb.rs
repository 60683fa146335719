//! DynamoDB backend.
//!
//! Item layout:
//!
//! | attribute  | type | meaning                         |
//! |------------|------|---------------------------------|
//! | `id`       | S    | partition key                   |
//! | `secret`   | S    | armored message                 |
//! | `one_time` | BOOL | delete on first read            |
//! | `ttl`      | N    | unix expiry, table TTL attribute |
//!
//! DynamoDB evicts expired items lazily, so reads treat an item past its
//! `ttl` as absent.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client;
use chrono::Utc;

use super::Repository;
use crate::error::RepositoryError;
use crate::types::{Secret, SecretKey, StoredRecord};

const BACKEND: &str = "dynamodb";

pub const ATTR_ID: &str = "id";
pub const ATTR_SECRET: &str = "secret";
pub const ATTR_ONE_TIME: &str = "one_time";
pub const ATTR_TTL: &str = "ttl";

type Item = HashMap<String, AttributeValue>;

fn sdk_error<E: std::error::Error>(err: E) -> RepositoryError {
    RepositoryError::backend(BACKEND, DisplayErrorContext(err))
}

pub fn to_item(record: &StoredRecord) -> Item {
    HashMap::from([
        (ATTR_ID.to_owned(), AttributeValue::S(record.id.clone())),
        (ATTR_SECRET.to_owned(), AttributeValue::S(record.message.clone())),
        (ATTR_ONE_TIME.to_owned(), AttributeValue::Bool(record.one_time)),
        (ATTR_TTL.to_owned(), AttributeValue::N(record.expires_at.to_string())),
    ])
}

pub fn from_item(item: &Item) -> Result<StoredRecord, RepositoryError> {
    let attr = |name: &str| {
        item.get(name)
            .ok_or_else(|| RepositoryError::Corrupt(format!("missing attribute {name}")))
    };
    let wrong_type = |name: &str| RepositoryError::Corrupt(format!("bad type for attribute {name}"));

    let id = attr(ATTR_ID)?.as_s().map_err(|_| wrong_type(ATTR_ID))?;
    let message = attr(ATTR_SECRET)?.as_s().map_err(|_| wrong_type(ATTR_SECRET))?;
    let one_time = attr(ATTR_ONE_TIME)?
        .as_bool()
        .map_err(|_| wrong_type(ATTR_ONE_TIME))?;
    let expires_at = attr(ATTR_TTL)?
        .as_n()
        .map_err(|_| wrong_type(ATTR_TTL))?
        .parse::<i64>()
        .map_err(|_| wrong_type(ATTR_TTL))?;

    Ok(StoredRecord {
        id: id.clone(),
        message: message.clone(),
        one_time: *one_time,
        expires_at,
    })
}

/// Live record from an optional item, `None` when absent or expired.
fn live(item: Option<&Item>, now: i64) -> Result<Option<StoredRecord>, RepositoryError> {
    match item {
        Some(item) => {
            let record = from_item(item)?;
            Ok((!record.is_expired_at(now)).then_some(record))
        }
        None => Ok(None),
    }
}

/// DynamoDB-backed repository.
pub struct DynamoDbRepository {
    client: Client,
    table: String,
}

impl DynamoDbRepository {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    /// Client from the standard AWS environment (region, credentials chain).
    pub async fn from_env(table: impl Into<String>) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self::new(Client::new(&config), table)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    async fn fetch(&self, key: &SecretKey) -> Result<Option<StoredRecord>, RepositoryError> {
        let out = self
            .client
            .get_item()
            .table_name(&self.table)
            .key(ATTR_ID, AttributeValue::S(key.as_str().to_owned()))
            .consistent_read(true)
            .send()
            .await
            .map_err(sdk_error)?;
        live(out.item(), Utc::now().timestamp())
    }

    /// Delete and return the removed record, if one was live.
    async fn remove(&self, key: &SecretKey) -> Result<Option<StoredRecord>, RepositoryError> {
        let out = self
            .client
            .delete_item()
            .table_name(&self.table)
            .key(ATTR_ID, AttributeValue::S(key.as_str().to_owned()))
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .map_err(sdk_error)?;
        live(out.attributes(), Utc::now().timestamp())
    }
}

#[async_trait]
impl Repository for DynamoDbRepository {
    async fn put(&self, key: &SecretKey, secret: &Secret) -> Result<(), RepositoryError> {
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(to_item(&StoredRecord::new(key, secret))))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn get(&self, key: &SecretKey) -> Result<Secret, RepositoryError> {
        let record = self.fetch(key).await?.ok_or(RepositoryError::NotFound)?;
        if !record.one_time {
            return Ok(record.into_secret(Utc::now().timestamp()));
        }
        // The deleted image is what we hand out; a reader that deletes
        // nothing lost the race.
        match self.remove(key).await? {
            Some(removed) => Ok(removed.into_secret(Utc::now().timestamp())),
            None => {
                tracing::debug!(backend = BACKEND, "one-time secret already consumed");
                Err(RepositoryError::NotFound)
            }
        }
    }

    async fn delete(&self, key: &SecretKey) -> Result<bool, RepositoryError> {
        Ok(self.remove(key).await?.is_some())
    }

    async fn status(&self, key: &SecretKey) -> Result<bool, RepositoryError> {
        self.fetch(key)
            .await?
            .map(|r| r.one_time)
            .ok_or(RepositoryError::NotFound)
    }

    fn backend(&self) -> &'static str {
        BACKEND
    }
}
