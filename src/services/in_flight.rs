//! Protección contra envíos duplicados
//!
//! Mientras una mutación sobre una entidad está en curso, otra mutación sobre
//! la misma entidad se rechaza. El bloqueo se libera al soltar el guard.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::utils::errors::{AppError, AppResult};

#[derive(Clone, Default)]
pub struct InFlightRegistry {
    keys: Arc<Mutex<HashSet<String>>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.keys.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn try_acquire(&self, key: impl Into<String>) -> AppResult<InFlightGuard> {
        let key = key.into();
        if !self.lock().insert(key.clone()) {
            return Err(AppError::Conflict(format!(
                "An operation on '{}' is already in progress",
                key
            )));
        }
        Ok(InFlightGuard {
            registry: self.clone(),
            key,
        })
    }

    pub fn is_busy(&self, key: &str) -> bool {
        self.lock().contains(key)
    }
}

/// Guard RAII de una entidad en curso
pub struct InFlightGuard {
    registry: InFlightRegistry,
    key: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.key);
    }
}
