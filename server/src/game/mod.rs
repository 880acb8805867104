pub mod behavior;
pub mod board;
pub mod cards;
pub mod deck;
pub mod effects;
pub mod parameters;
pub mod player;
pub mod projects;
pub mod registry;
pub mod resources;
pub mod scoring;
pub mod session;
pub mod snapshot;
pub mod turn;
pub mod types;

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

// A panic while holding a component lock leaves plain data behind; keep serving it.
pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
