use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{encode::IsNull, error::BoxDynError, sqlite::{SqliteArgumentValue, SqliteTypeInfo, SqliteValueRef}, Decode, Encode, Sqlite, SqlitePool, Type};

use crate::bot::chat_event::chat_event::Platform;

pub mod config;

pub async fn initialize_database(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(config::CONFIG_TABLE).execute(pool).await?;
    Ok(())
}

#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    initialize_database(&pool).await.unwrap();
    pool
}

/// `platform:group`, the key of a group row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(platform: Platform, group: impl AsRef<str>) -> Self {
        GroupId(format!("{}:{}", platform, group.as_ref().to_lowercase()))
    }

    pub fn group(&self) -> &str {
        self.0.split_once(':').map(|(_, g)| g).unwrap_or(&self.0)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for GroupId {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (platform, group) = s.split_once(':').ok_or("invalid group id")?;
        if group.is_empty() {
            return Err("invalid group id");
        }
        let platform = Platform::from_str(platform)?;

        Ok(GroupId::new(platform, group))
    }
}

impl Type<Sqlite> for GroupId {
    fn type_info() -> SqliteTypeInfo {
        <String as Type<Sqlite>>::type_info()
    }

    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <String as Type<Sqlite>>::compatible(ty)
    }
}

impl<'q> Encode<'q, Sqlite> for GroupId {
    fn encode_by_ref(&self, buf: &mut Vec<SqliteArgumentValue<'q>>) -> Result<IsNull, BoxDynError> {
        <String as Encode<Sqlite>>::encode(self.0.clone(), buf)
    }
}

impl<'r> Decode<'r, Sqlite> for GroupId {
    fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
        let s = <String as Decode<Sqlite>>::decode(value)?;
        Ok(GroupId::from_str(&s)?)
    }
}
