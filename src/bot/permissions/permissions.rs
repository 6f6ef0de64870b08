use core::fmt;
use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serenity::all::Permissions;

use crate::bot::commands::commands::Command;

/// Where a capability is evaluated.
#[derive(Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "lowercase")]
pub enum PermissionScope {
    /// Effective permissions in the invocation channel, overrides applied.
    #[default]
    Channel,
    /// Permissions granted at group level.
    Global,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RequiredPermission {
    pub capability: Permissions,
    pub scope: PermissionScope,
}

/// Answers capability queries for one invoker. Supplied by the platform layer,
/// the gate never looks at identity details itself.
pub trait CapabilitySource: Send + Sync {
    fn has_capability(&self, capability: Permissions, scope: PermissionScope) -> bool;
}

/// Resolved member permissions: group-wide grants and the effective set in
/// the channel the message came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemberPermissions {
    pub group: Permissions,
    pub channel: Permissions,
}

impl MemberPermissions {
    pub fn new(group: Permissions, channel: Permissions) -> Self {
        Self { group, channel }
    }

    pub fn uniform(permissions: Permissions) -> Self {
        Self::new(permissions, permissions)
    }
}

impl CapabilitySource for MemberPermissions {
    fn has_capability(&self, capability: Permissions, scope: PermissionScope) -> bool {
        if self.group.contains(Permissions::ADMINISTRATOR) {
            return true;
        }

        match scope {
            PermissionScope::Channel => self.channel.contains(capability),
            PermissionScope::Global => self.group.contains(capability),
        }
    }
}

pub fn check_permission(capabilities: &dyn CapabilitySource, node: &Command) -> bool {
    let Some(required) = node.permission else {
        return true;
    };

    capabilities.has_capability(required.capability, required.scope)
}

const PERMISSION_NAMES: &[(&str, Permissions)] = &[
    ("ADMINISTRATOR", Permissions::ADMINISTRATOR),
    ("MANAGE_GUILD", Permissions::MANAGE_GUILD),
    ("MANAGE_CHANNELS", Permissions::MANAGE_CHANNELS),
    ("MANAGE_ROLES", Permissions::MANAGE_ROLES),
    ("MANAGE_MESSAGES", Permissions::MANAGE_MESSAGES),
    ("MANAGE_NICKNAMES", Permissions::MANAGE_NICKNAMES),
    ("MANAGE_WEBHOOKS", Permissions::MANAGE_WEBHOOKS),
    ("KICK_MEMBERS", Permissions::KICK_MEMBERS),
    ("BAN_MEMBERS", Permissions::BAN_MEMBERS),
    ("MODERATE_MEMBERS", Permissions::MODERATE_MEMBERS),
    ("MENTION_EVERYONE", Permissions::MENTION_EVERYONE),
    ("VIEW_CHANNEL", Permissions::VIEW_CHANNEL),
    ("SEND_MESSAGES", Permissions::SEND_MESSAGES),
    ("CONNECT", Permissions::CONNECT),
    ("SPEAK", Permissions::SPEAK),
    ("MUTE_MEMBERS", Permissions::MUTE_MEMBERS),
    ("MOVE_MEMBERS", Permissions::MOVE_MEMBERS),
];

pub fn parse_permission(name: &str) -> Option<Permissions> {
    let name = name.trim().to_ascii_uppercase();
    PERMISSION_NAMES.iter().find(|(n, _)| *n == name).map(|(_, p)| *p)
}

/// Comma separated list, e.g. `MANAGE_GUILD,KICK_MEMBERS`.
pub fn parse_permission_list(list: &str) -> Result<Permissions, String> {
    let mut permissions = Permissions::empty();
    for name in list.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        permissions |= parse_permission(name).ok_or_else(|| format!("unknown permission `{name}`"))?;
    }
    Ok(permissions)
}

/// Human readable form, used in replies.
pub struct PermissionNames(pub Permissions);

impl Display for PermissionNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = PERMISSION_NAMES
            .iter()
            .filter(|(_, p)| self.0.contains(*p))
            .map(|(n, _)| *n)
            .collect();

        if names.is_empty() {
            write!(f, "{:#x}", self.0.bits())
        } else {
            write!(f, "{}", names.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn administrator_passes_every_scope() {
        let member = MemberPermissions::new(Permissions::ADMINISTRATOR, Permissions::empty());
        assert!(member.has_capability(Permissions::BAN_MEMBERS, PermissionScope::Channel));
        assert!(member.has_capability(Permissions::MANAGE_GUILD, PermissionScope::Global));
    }

    #[test]
    fn channel_override_only_counts_in_channel_scope() {
        let member = MemberPermissions::new(Permissions::SEND_MESSAGES, Permissions::MANAGE_MESSAGES);
        assert!(member.has_capability(Permissions::MANAGE_MESSAGES, PermissionScope::Channel));
        assert!(!member.has_capability(Permissions::MANAGE_MESSAGES, PermissionScope::Global));
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!(parse_permission("manage_guild"), Some(Permissions::MANAGE_GUILD));
        assert_eq!(parse_permission("FLY"), None);
        assert_eq!(
            parse_permission_list("KICK_MEMBERS, ban_members"),
            Ok(Permissions::KICK_MEMBERS | Permissions::BAN_MEMBERS)
        );
        assert!(parse_permission_list("KICK_MEMBERS,nope").is_err());
        assert_eq!(parse_permission_list(""), Ok(Permissions::empty()));
    }

    #[test]
    fn names_render_for_replies() {
        assert_eq!(PermissionNames(Permissions::MANAGE_GUILD).to_string(), "MANAGE_GUILD");
    }
}
