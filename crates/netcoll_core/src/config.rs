//! Replication settings.

use crate::permission::Permission;

/// How often a dirty variable may be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendRate {
    /// Every tick the variable is dirty.
    EveryTick,
    /// At most once every `n` ticks.
    EveryNTicks(u32),
    /// Never; the variable only travels in snapshots.
    Never,
}

impl SendRate {
    /// Returns true if a send is allowed at `now` given the tick of the
    /// last send.
    pub fn allows(self, now: u64, last_sent: Option<u64>) -> bool {
        match self {
            SendRate::EveryTick => true,
            SendRate::Never => false,
            SendRate::EveryNTicks(interval) => match last_sent {
                Some(last) => now.saturating_sub(last) >= u64::from(interval),
                None => true,
            },
        }
    }
}

/// Settings for one replicated variable.
#[derive(Debug, Clone)]
pub struct ReplicationSettings {
    /// Who may mutate the variable.
    pub write_permission: Permission,
    /// Who may receive the variable.
    pub read_permission: Permission,
    /// Send rate limit.
    pub send_rate: SendRate,
    /// Whether received events are queued again for downstream replicas.
    pub relay_received: bool,
}

impl Default for ReplicationSettings {
    fn default() -> Self {
        Self {
            write_permission: Permission::ServerOnly,
            read_permission: Permission::Everyone,
            send_rate: SendRate::EveryTick,
            relay_received: false,
        }
    }
}

impl ReplicationSettings {
    /// Creates settings with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the write permission.
    #[must_use]
    pub fn write_permission(mut self, permission: Permission) -> Self {
        self.write_permission = permission;
        self
    }

    /// Sets the read permission.
    #[must_use]
    pub fn read_permission(mut self, permission: Permission) -> Self {
        self.read_permission = permission;
        self
    }

    /// Sets the send rate.
    #[must_use]
    pub fn send_rate(mut self, rate: SendRate) -> Self {
        self.send_rate = rate;
        self
    }

    /// Sets whether received events are relayed downstream.
    #[must_use]
    pub fn relay_received(mut self, value: bool) -> Self {
        self.relay_received = value;
        self
    }
}
