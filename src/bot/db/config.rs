use std::{collections::HashMap, sync::Arc};

use sqlx::{Row, SqlitePool};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::bot::{commands::commands::BotResult, db::GroupId, state::def::{BotError, GroupConfig, Settings}};

pub const CONFIG_TABLE: &str = "CREATE TABLE IF NOT EXISTS group_config (
        group_id TEXT PRIMARY KEY,
        config TEXT NOT NULL
    );";

/// Group rows, cached in memory and written through to SQLite.
#[derive(Clone)]
pub struct GroupStore {
    pool: SqlitePool,
    settings: Arc<Settings>,
    cache: Arc<RwLock<HashMap<GroupId, Arc<GroupConfig>>>>,
    writes: Arc<Mutex<()>>,
}

impl GroupStore {
    pub async fn load(pool: SqlitePool, settings: Arc<Settings>) -> BotResult<Self> {
        let groups = load_group_configs_from_db(&pool).await?;
        debug!("Loaded {} group configs", groups.len());

        Ok(Self {
            pool,
            settings,
            cache: Arc::new(RwLock::new(groups.into_iter().map(|(id, cfg)| (id, Arc::new(cfg))).collect())),
            writes: Arc::new(Mutex::new(())),
        })
    }

    /// Snapshot used for one dispatch. Unknown groups get defaults without
    /// creating a row.
    pub async fn snapshot(&self, group_id: &GroupId) -> Arc<GroupConfig> {
        if let Some(cfg) = self.cache.read().await.get(group_id) {
            return cfg.clone();
        }
        Arc::new(GroupConfig::new(&self.settings))
    }

    /// Read, modify and persist one row. Updates run one at a time;
    /// snapshots only wait for the final swap, never for the database.
    pub async fn update<F>(&self, group_id: &GroupId, mutator: F) -> BotResult<Arc<GroupConfig>>
    where
        F: FnOnce(&mut GroupConfig),
    {
        let _write = self.writes.lock().await;

        let mut cfg = GroupConfig::clone(&*self.snapshot(group_id).await);
        mutator(&mut cfg);
        save_group_config(&self.pool, group_id, &cfg).await?;

        let cfg = Arc::new(cfg);
        self.cache.write().await.insert(group_id.clone(), cfg.clone());
        Ok(cfg)
    }
}

pub async fn load_group_configs_from_db(pool: &SqlitePool) -> BotResult<HashMap<GroupId, GroupConfig>> {
    let rows = sqlx::query("SELECT group_id, config FROM group_config").fetch_all(pool).await?;

    let mut groups = HashMap::new();
    for row in rows {
        let group_id: GroupId = match row.try_get("group_id") {
            Ok(id) => id,
            Err(e) => {
                warn!("Skipping group row with bad id: {e}");
                continue;
            }
        };
        let raw: String = row.try_get("config")?;

        let config: GroupConfig = serde_json::from_str(&raw)
            .map_err(|e| BotError::Custom(format!("Invalid config for {group_id}: {e}")))?;

        groups.insert(group_id, config);
    }

    Ok(groups)
}

pub async fn save_group_config(pool: &SqlitePool, group_id: &GroupId, config: &GroupConfig) -> BotResult<()> {
    let json = serde_json::to_string(config)?;

    sqlx::query(
        r#"
        INSERT INTO group_config (group_id, config)
        VALUES (?1, ?2)
        ON CONFLICT (group_id)
        DO UPDATE SET config = excluded.config
        "#,
    )
    .bind(group_id)
    .bind(json)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::bot::{chat_event::chat_event::Platform, db::memory_pool, state::def::Locale};

    fn settings() -> Arc<Settings> {
        Arc::new(Settings::from_lookup(|_| None).unwrap())
    }

    #[tokio::test]
    async fn unknown_group_gets_defaults() {
        let store = GroupStore::load(memory_pool().await, settings()).await.unwrap();
        let cfg = store.snapshot(&GroupId::new(Platform::Console, "nowhere")).await;
        assert_eq!(cfg.command_prefix, "!");
        assert!(!cfg.shortcuts_enabled);
    }

    #[tokio::test]
    async fn updates_persist_across_reload() {
        let pool = memory_pool().await;
        let id = GroupId::new(Platform::Discord, "guild");

        let store = GroupStore::load(pool.clone(), settings()).await.unwrap();
        let before = store.snapshot(&id).await;
        store
            .update(&id, |cfg| {
                cfg.command_prefix = "?".into();
                cfg.locale = Locale::Cs;
            })
            .await
            .unwrap();
        // Snapshots taken earlier do not change.
        assert_eq!(before.command_prefix, "!");

        let reloaded = GroupStore::load(pool, settings()).await.unwrap();
        let cfg = reloaded.snapshot(&id).await;
        assert_eq!(cfg.command_prefix, "?");
        assert_eq!(cfg.locale, Locale::Cs);
    }

    #[tokio::test]
    async fn snapshots_do_not_wait_for_pending_updates() {
        let store = GroupStore::load(memory_pool().await, settings()).await.unwrap();
        let id = GroupId::new(Platform::Discord, "guild");

        let pending = store.writes.lock().await;
        let update = tokio::spawn({
            let store = store.clone();
            let id = id.clone();
            async move { store.update(&id, |cfg| cfg.shortcuts_enabled = true).await.map(|_| ()) }
        });

        let cfg = tokio::time::timeout(Duration::from_secs(1), store.snapshot(&id)).await.unwrap();
        assert!(!cfg.shortcuts_enabled);

        drop(pending);
        update.await.unwrap().unwrap();
        assert!(store.snapshot(&id).await.shortcuts_enabled);
    }

    #[tokio::test]
    async fn concurrent_updates_are_not_lost() {
        let store = GroupStore::load(memory_pool().await, settings()).await.unwrap();
        let id = GroupId::new(Platform::Discord, "guild");

        let updates = (0..10).map(|_| {
            store.update(&id, |cfg| {
                let n = cfg.extra.get("n").and_then(|v| v.as_u64()).unwrap_or(0);
                cfg.extra.insert("n".into(), (n + 1).into());
            })
        });
        for result in futures::future::join_all(updates).await {
            result.unwrap();
        }

        assert_eq!(store.snapshot(&id).await.extra.get("n").and_then(|v| v.as_u64()), Some(10));
    }
}
