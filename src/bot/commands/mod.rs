use std::{collections::HashSet, sync::Arc};

use tracing::{debug, warn};

use crate::bot::commands::{commands::Command, types::TypeResolvers, validator::{validate, DeclarationError}};

pub mod commands;
pub mod types;
pub mod validator;
pub mod loader;
pub mod general;
pub mod config;

/// The validated command tree. Built once, shared read-only by every
/// dispatch.
#[derive(Clone, Debug)]
pub struct Forest {
    inner: Arc<ForestInner>,
}

#[derive(Debug)]
struct ForestInner {
    roots: Vec<Command>,
    types: TypeResolvers,
}

impl Forest {
    pub fn roots(&self) -> &[Command] {
        &self.inner.roots
    }

    pub fn types(&self) -> &TypeResolvers {
        &self.inner.types
    }

    /// Follows names down the tree, and shortcuts too when enabled. Also
    /// returns the path spelled with full names.
    pub fn lookup(&self, path: &[String], shortcuts_enabled: bool) -> Option<(&Command, Vec<String>)> {
        let mut nodes = self.roots();
        let mut node = None;
        let mut names = Vec::with_capacity(path.len());
        for head in path {
            let found = nodes.iter().find(|c| c.matches(head, shortcuts_enabled))?;
            names.push(found.name.clone());
            nodes = found.subcommands.as_slice();
            node = Some(found);
        }
        node.map(|n| (n, names))
    }

    /// Names only.
    pub fn find(&self, path: &[String]) -> Option<&Command> {
        self.lookup(path, false).map(|(node, _)| node)
    }
}

/// Collects root declarations, rejecting invalid ones without stopping the
/// rest from loading.
pub struct CommandRegistry {
    roots: Vec<Command>,
    idents: HashSet<String>,
    types: TypeResolvers,
    rejected: Vec<DeclarationError>,
}

impl CommandRegistry {
    pub fn new(types: TypeResolvers) -> Self {
        Self { roots: Vec::new(), idents: HashSet::new(), types, rejected: Vec::new() }
    }

    pub fn register(&mut self, command: Command) -> bool {
        if let Err(e) = self.check_root(&command) {
            warn!("Rejected command declaration: {e}");
            self.rejected.push(e);
            return false;
        }

        self.idents.insert(command.name.clone());
        if let Some(shortcut) = &command.shortcut {
            self.idents.insert(shortcut.clone());
        }
        debug!("Registered command `{}`", command.name);
        self.roots.push(command);
        true
    }

    pub fn reject(&mut self, error: DeclarationError) {
        warn!("Rejected command declaration: {error}");
        self.rejected.push(error);
    }

    fn check_root(&self, command: &Command) -> Result<(), DeclarationError> {
        validate(command, &self.types)?;

        for ident in std::iter::once(&command.name).chain(command.shortcut.as_ref()) {
            if self.idents.contains(ident) {
                return Err(DeclarationError::DuplicateName { path: String::new(), name: ident.clone() });
            }
        }
        Ok(())
    }

    pub fn rejected(&self) -> &[DeclarationError] {
        &self.rejected
    }

    pub fn finish(self) -> Forest {
        Forest { inner: Arc::new(ForestInner { roots: self.roots, types: self.types }) }
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt;

    use super::*;

    fn leaf(name: &str) -> Command {
        Command::new(name).handler(|_| async { Ok(()) }.boxed())
    }

    #[test]
    fn invalid_roots_do_not_block_the_rest() {
        let mut registry = CommandRegistry::new(TypeResolvers::with_defaults());
        assert!(registry.register(leaf("ping")));
        assert!(!registry.register(Command::new("broken")));
        assert!(registry.register(Command::new("role").subcommand(leaf("add"))));

        assert_eq!(registry.rejected().len(), 1);
        let forest = registry.finish();
        let names: Vec<&str> = forest.roots().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["ping", "role"]);
    }

    #[test]
    fn root_names_and_shortcuts_stay_unique() {
        let mut registry = CommandRegistry::new(TypeResolvers::new());
        assert!(registry.register(leaf("ping").shortcut("p")));
        assert!(!registry.register(leaf("ping")));
        assert!(!registry.register(leaf("p")));
        assert!(!registry.register(leaf("pong").shortcut("ping")));
        assert!(registry.register(leaf("pong")));
    }

    #[test]
    fn find_follows_names() {
        let mut registry = CommandRegistry::new(TypeResolvers::new());
        registry.register(Command::new("config").subcommand(leaf("prefix").shortcut("px")));
        let forest = registry.finish();

        assert!(forest.find(&["config".into(), "prefix".into()]).is_some());
        assert!(forest.find(&["config".into(), "px".into()]).is_none());
        assert!(forest.find(&[]).is_none());
    }
}
