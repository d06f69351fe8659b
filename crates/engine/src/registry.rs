// SPDX-License-Identifier: MIT

//! In-memory index of live instances by id and by port.

use crate::FleetError;
use numdrassl_core::{Instance, ServerId, ServerStatus, ServerType, TemplateName};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Shared mutable instance record.
pub type InstanceRef = Arc<Mutex<Instance>>;

#[derive(Default)]
struct Inner {
    by_id: HashMap<ServerId, InstanceRef>,
    by_port: HashMap<u16, ServerId>,
}

/// Both maps are mutated under one lock so they can never disagree:
/// `by_id[i].port == p  ⇔  by_port[p] == i`.
#[derive(Default)]
pub struct Registry {
    inner: Mutex<Inner>,
}

/// Point-in-time fleet totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryStats {
    pub total: usize,
    pub static_count: usize,
    pub dynamic_count: usize,
    pub running: usize,
    pub players: usize,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an instance, rejecting duplicate id or port.
    pub fn register(&self, instance: Instance) -> Result<InstanceRef, FleetError> {
        let mut inner = self.inner.lock();
        if inner.by_id.contains_key(&instance.server_id) {
            return Err(FleetError::DuplicateServerId(instance.server_id));
        }
        if inner.by_port.contains_key(&instance.port) {
            return Err(FleetError::DuplicatePort(instance.port));
        }
        let id = instance.server_id.clone();
        let port = instance.port;
        let slot = Arc::new(Mutex::new(instance));
        inner.by_id.insert(id.clone(), Arc::clone(&slot));
        inner.by_port.insert(port, id);
        Ok(slot)
    }

    /// Remove an instance, clearing both maps.
    pub fn unregister(&self, id: &ServerId) -> Option<InstanceRef> {
        let mut inner = self.inner.lock();
        let slot = inner.by_id.remove(id)?;
        let port = slot.lock().port;
        inner.by_port.remove(&port);
        Some(slot)
    }

    pub fn get(&self, id: &ServerId) -> Option<InstanceRef> {
        self.inner.lock().by_id.get(id).cloned()
    }

    pub fn by_port(&self, port: u16) -> Option<InstanceRef> {
        let inner = self.inner.lock();
        let id = inner.by_port.get(&port)?;
        inner.by_id.get(id).cloned()
    }

    pub fn contains(&self, id: &ServerId) -> bool {
        self.inner.lock().by_id.contains_key(id)
    }

    pub fn snapshot(&self, id: &ServerId) -> Option<Instance> {
        self.get(id).map(|slot| slot.lock().clone())
    }

    pub fn ids(&self) -> Vec<ServerId> {
        self.inner.lock().by_id.keys().cloned().collect()
    }

    /// Snapshots of every instance matching the predicate.
    pub fn filter(&self, pred: impl Fn(&Instance) -> bool) -> Vec<Instance> {
        self.inner
            .lock()
            .by_id
            .values()
            .filter_map(|slot| {
                let instance = slot.lock();
                pred(&instance).then(|| instance.clone())
            })
            .collect()
    }

    pub fn list(&self) -> Vec<Instance> {
        self.filter(|_| true)
    }

    pub fn by_type(&self, server_type: ServerType) -> Vec<Instance> {
        self.filter(|i| i.server_type == server_type)
    }

    pub fn by_status(&self, status: ServerStatus) -> Vec<Instance> {
        self.filter(|i| i.status == status)
    }

    pub fn count_by_type(&self, server_type: ServerType) -> usize {
        self.inner
            .lock()
            .by_id
            .values()
            .filter(|slot| slot.lock().server_type == server_type)
            .count()
    }

    /// Best instance to route a player to: RUNNING, not full, optionally
    /// from one template. Fewest players wins; ties break on smallest id.
    pub fn available_server(&self, template: Option<&TemplateName>) -> Option<Instance> {
        self.filter(|i| {
            i.status.accepting_players()
                && !i.is_full()
                && template.map(|t| i.template.as_ref() == Some(t)).unwrap_or(true)
        })
        .into_iter()
        .min_by(|a, b| {
            a.players
                .len()
                .cmp(&b.players.len())
                .then_with(|| a.server_id.cmp(&b.server_id))
        })
    }

    pub fn stats(&self) -> RegistryStats {
        let inner = self.inner.lock();
        let mut stats = RegistryStats {
            total: inner.by_id.len(),
            static_count: 0,
            dynamic_count: 0,
            running: 0,
            players: 0,
        };
        for slot in inner.by_id.values() {
            let instance = slot.lock();
            match instance.server_type {
                ServerType::Static => stats.static_count += 1,
                ServerType::Dynamic => stats.dynamic_count += 1,
            }
            if instance.status == ServerStatus::Running {
                stats.running += 1;
            }
            stats.players += instance.players.len();
        }
        stats
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
