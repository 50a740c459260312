use crate::error::StoreResult;
use crate::kv::KeyValueStore;
use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::info;

const KEY_PREFIX: &str = "carrel";

#[derive(Clone)]
pub struct RedisStore {
    client: redis::Client,
}

impl RedisStore {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;

        // Fail at startup rather than on the first save
        let mut conn = client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<()>(&mut conn).await?;
        info!("Connected to Redis at {}", connection_string);

        Ok(Self { client })
    }

    fn key(key: &str) -> String {
        format!("{}:{}", KEY_PREFIX, key)
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(Self::key(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.set::<_, _, ()>(Self::key(key), value).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.del::<_, ()>(Self::key(key)).await?;
        Ok(())
    }
}
