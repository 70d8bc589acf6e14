//! Projectile pool
//!
//! Owns one side's projectiles. Advances them each tick, applies gravity
//! fields, appends projectiles spawned by splits and detonations, and prunes
//! the spent ones. The pool never grows past its capacity.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::hazard::GravityField;
use super::projectile::{Projectile, TargetRef};
use crate::tuning::Playfield;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectilePool {
    items: Vec<Projectile>,
    capacity: usize,
    next_id: u32,
    /// Emissions dropped since the last advance
    #[serde(skip)]
    dropped: u32,
}

impl ProjectilePool {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity.min(1024)),
            capacity,
            next_id: 1,
            dropped: 0,
        }
    }

    /// Insert a projectile; silently dropped when the pool is full
    pub fn push(&mut self, mut projectile: Projectile) -> bool {
        if self.items.len() >= self.capacity {
            self.dropped += 1;
            if self.dropped == 1 {
                log::debug!("Projectile pool full ({}), dropping emissions", self.capacity);
            }
            return false;
        }
        projectile.id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.items.push(projectile);
        true
    }

    /// Insert many; returns how many were accepted
    pub fn extend(&mut self, projectiles: impl IntoIterator<Item = Projectile>) -> usize {
        let mut accepted = 0;
        for projectile in projectiles {
            if self.push(projectile) {
                accepted += 1;
            }
        }
        accepted
    }

    /// Advance every live projectile by one tick.
    ///
    /// `resolve` maps a tracked handle to its current position; a handle whose
    /// entity is gone resolves to `None`.
    pub fn advance<F>(
        &mut self,
        resolve: F,
        field: &Playfield,
        margin: f32,
        gravity: &[GravityField],
    ) where
        F: Fn(TargetRef) -> Option<Vec2>,
    {
        self.dropped = 0;
        let mut spawned = Vec::new();

        for projectile in self.items.iter_mut().filter(|p| p.active) {
            for well in gravity {
                projectile.vel += well.pull(projectile.pos);
            }
            let target = projectile.target.and_then(&resolve);
            spawned.extend(projectile.update(target, field, margin));
        }

        self.prune();
        if !spawned.is_empty() {
            self.extend(spawned);
        }
    }

    /// Remove every inactive projectile
    pub fn prune(&mut self) {
        self.items.retain(|p| p.active);
    }

    /// Deactivate every projectile matching `pred`; returns the count
    pub fn cancel_where<P>(&mut self, pred: P) -> usize
    where
        P: Fn(&Projectile) -> bool,
    {
        let mut cancelled = 0;
        for projectile in self.items.iter_mut().filter(|p| p.active) {
            if pred(projectile) {
                projectile.active = false;
                cancelled += 1;
            }
        }
        cancelled
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    pub fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Projectile> {
        self.items.iter_mut()
    }

    pub fn as_slice(&self) -> &[Projectile] {
        &self.items
    }
}
