//! Master/slave role state machine.

use filterwatch_config::RoleConfig;
use filterwatch_core::Nick;
use tracing::info;

/// Posting authority of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Role {
    /// Configured master.
    Master,
    /// Shadowing its master without posting.
    Slave,
    /// A slave standing in for its absent master.
    SlaveActingMaster,
}

impl Role {
    /// Whether entries may be posted in this role.
    pub fn may_post(self) -> bool {
        matches!(self, Self::Master | Self::SlaveActingMaster)
    }
}

/// Result of an operator `start` or `stop`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleOutcome {
    /// `start` on a slave: now acting as master.
    Promoted {
        /// The master being stood in for.
        master: Nick,
    },
    /// `start` while already posting.
    AlreadyMaster,
    /// `stop` on a promoted slave: back to shadowing.
    Demoted {
        /// The master that is back.
        master: Nick,
    },
    /// `stop` on the configured master.
    RejectedIsMaster,
    /// `stop` on a slave that is not promoted.
    AlreadySlave,
}

impl RoleOutcome {
    /// Whether the role changed.
    pub fn changed(&self) -> bool {
        matches!(self, Self::Promoted { .. } | Self::Demoted { .. })
    }

    /// The operator-facing acknowledgement.
    pub fn acknowledgement(&self) -> String {
        match self {
            Self::Promoted { master } => format!(
                "thank you for promoting me to master!  Hope {} comes back shortly.",
                master
            ),
            Self::AlreadyMaster => "I'm already master.".to_string(),
            Self::Demoted { master } => format!("glad to hear that {} is back.", master),
            Self::RejectedIsMaster => "wrong bot? I'm the master one.".to_string(),
            Self::AlreadySlave => "wrong bot? I'm already operating in slave mode.".to_string(),
        }
    }
}

/// A transition caused by the master's presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleTransition {
    /// The master went away: now acting as master.
    Promoted,
    /// The master came back: shadowing again.
    Reverted,
}

/// Decides whether this instance posts.
///
/// Only channels this instance is in are ever observed, so the master
/// leaving any of them means a channel is left without a poster.
#[derive(Debug, Clone)]
pub struct RoleController {
    role: Role,
    master: Option<Nick>,
    auto_failover: bool,
}

impl RoleController {
    /// Initial state from configuration.
    pub fn new(config: &RoleConfig) -> Self {
        match config {
            RoleConfig::Master => Self {
                role: Role::Master,
                master: None,
                auto_failover: false,
            },
            RoleConfig::Slave {
                master,
                auto_failover,
            } => Self {
                role: Role::Slave,
                master: Some(master.clone()),
                auto_failover: *auto_failover,
            },
        }
    }

    /// Current role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The master this instance shadows, if it is a slave.
    pub fn master(&self) -> Option<&Nick> {
        self.master.as_ref()
    }

    /// Whether entries may be posted right now.
    pub fn may_post(&self) -> bool {
        self.role.may_post()
    }

    /// Operator `start`.
    pub fn start(&mut self) -> RoleOutcome {
        match (self.role, &self.master) {
            (Role::Slave, Some(master)) => {
                let master = master.clone();
                self.role = Role::SlaveActingMaster;
                info!(master = %master, "Promoted to master by operator");
                RoleOutcome::Promoted { master }
            }
            _ => RoleOutcome::AlreadyMaster,
        }
    }

    /// Operator `stop`.
    pub fn stop(&mut self) -> RoleOutcome {
        match (self.role, &self.master) {
            (Role::SlaveActingMaster, Some(master)) => {
                let master = master.clone();
                self.role = Role::Slave;
                info!(master = %master, "Back to slave mode by operator");
                RoleOutcome::Demoted { master }
            }
            (Role::Slave, _) => RoleOutcome::AlreadySlave,
            _ => RoleOutcome::RejectedIsMaster,
        }
    }

    /// `nick` joined a shared channel.
    pub fn observe_join(&mut self, nick: &str) -> Option<RoleTransition> {
        if !self.is_master(nick) {
            return None;
        }
        self.master_back()
    }

    /// `nick` parted or was kicked from a shared channel.
    pub fn observe_part(&mut self, nick: &str) -> Option<RoleTransition> {
        if !self.is_master(nick) {
            return None;
        }
        self.master_gone()
    }

    /// `nick` disconnected from the network.
    pub fn observe_quit(&mut self, nick: &str) -> Option<RoleTransition> {
        if !self.is_master(nick) {
            return None;
        }
        self.master_gone()
    }

    /// Full member list of a channel we just joined. A list without the
    /// master counts as the master being absent.
    pub fn observe_members(&mut self, nicks: &[String]) -> Option<RoleTransition> {
        self.master.as_ref()?;
        if nicks.iter().any(|nick| self.is_master(nick)) {
            self.master_back()
        } else {
            self.master_gone()
        }
    }

    fn is_master(&self, nick: &str) -> bool {
        self.master.as_ref().is_some_and(|master| master.matches(nick))
    }

    fn master_back(&mut self) -> Option<RoleTransition> {
        if self.role == Role::SlaveActingMaster && self.auto_failover {
            self.role = Role::Slave;
            info!(
                master = ?self.master.as_ref().map(Nick::as_str),
                "Master is back, leaving master mode"
            );
            return Some(RoleTransition::Reverted);
        }
        None
    }

    fn master_gone(&mut self) -> Option<RoleTransition> {
        if self.role == Role::Slave && self.auto_failover {
            self.role = Role::SlaveActingMaster;
            info!(
                master = ?self.master.as_ref().map(Nick::as_str),
                "Master has gone, entering master mode"
            );
            return Some(RoleTransition::Promoted);
        }
        None
    }
}
