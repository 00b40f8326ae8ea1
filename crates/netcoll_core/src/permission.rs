//! Read and write permission policies.

use crate::types::ClientId;
use std::fmt;
use std::sync::Arc;

/// Decides which clients may write to, or read from, a variable.
pub trait PermissionPolicy: Send + Sync {
    /// Returns true if `client` may mutate the variable.
    fn can_write(&self, client: ClientId) -> bool;

    /// Returns true if `client` may receive the variable's state.
    fn can_read(&self, _client: ClientId) -> bool {
        true
    }
}

/// Predicate used by [`Permission::Custom`].
pub type PermissionCallback = Arc<dyn Fn(ClientId) -> bool + Send + Sync>;

/// A single permission rule.
#[derive(Clone)]
pub enum Permission {
    /// Only the server.
    ServerOnly,
    /// Only the client that owns the entity.
    OwnerOnly,
    /// Any client.
    Everyone,
    /// A caller-supplied predicate.
    Custom(PermissionCallback),
}

impl Permission {
    /// Creates a custom permission from a predicate.
    pub fn custom(predicate: impl Fn(ClientId) -> bool + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(predicate))
    }

    /// Returns true if the rule admits `client` on an entity owned by `owner`.
    pub fn allows(&self, client: ClientId, owner: ClientId) -> bool {
        match self {
            Permission::ServerOnly => client.is_server(),
            Permission::OwnerOnly => client == owner,
            Permission::Everyone => true,
            Permission::Custom(predicate) => predicate(client),
        }
    }
}

impl fmt::Debug for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permission::ServerOnly => f.write_str("ServerOnly"),
            Permission::OwnerOnly => f.write_str("OwnerOnly"),
            Permission::Everyone => f.write_str("Everyone"),
            Permission::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Read and write rules bound to the owner of an entity.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    /// Who may write.
    pub write: Permission,
    /// Who may read.
    pub read: Permission,
    /// Owner of the entity, for [`Permission::OwnerOnly`].
    pub owner: ClientId,
}

impl AccessPolicy {
    /// Creates a policy.
    pub fn new(write: Permission, read: Permission, owner: ClientId) -> Self {
        Self { write, read, owner }
    }
}

impl PermissionPolicy for AccessPolicy {
    fn can_write(&self, client: ClientId) -> bool {
        self.write.allows(client, self.owner)
    }

    fn can_read(&self, client: ClientId) -> bool {
        self.read.allows(client, self.owner)
    }
}
