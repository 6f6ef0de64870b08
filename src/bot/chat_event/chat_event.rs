use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::bot::{db::GroupId, permissions::permissions::MemberPermissions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Platform { Console, Discord }

#[derive(Debug, Clone)]
pub struct ChatEvent {
    pub platform: Platform,
    pub group: String,
    pub channel: String,
    pub user: ChatUser,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ChatUser {
    pub identity: UserIdentity,
    pub name: DisplayName,
    pub permissions: MemberPermissions,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserIdentity {
    pub platform: Platform,
    pub platform_user_id: String,
}

#[derive(Debug, Clone)]
pub struct DisplayName {
    pub login: String,
    pub display: String,
}

impl ChatEvent {
    pub fn group_id(&self) -> GroupId {
        GroupId::new(self.platform, &self.group)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Console => "console",
            Platform::Discord => "discord",
        }
    }
}

impl FromStr for Platform {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "console" => Ok(Platform::Console),
            "discord" => Ok(Platform::Discord),
            _ => Err("Invalid platform"),
        }
    }
}
