// apps/storefront/src/state.rs
use crate::backend::Backend;
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::persistence::{KeyValueStore, LocalMirror};
use crate::pipelines;
use crate::services::session::{AuthEvents, SessionGate};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use storeflow::Flows;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
  pub backend: Backend,
  pub gate: SessionGate,
  pub mirror_store: Arc<dyn KeyValueStore>,
  pub flows: Arc<Flows<AppError>>,
  pub config: Arc<AppConfig>,
  device_locks: Arc<Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>,
  checkouts_in_flight: Arc<Mutex<HashSet<Uuid>>>,
}

impl AppState {
  /// Wires the session gate and registers every workflow pipeline.
  pub fn new(backend: Backend, config: Arc<AppConfig>, mirror_store: Arc<dyn KeyValueStore>) -> Self {
    let gate = SessionGate::new(backend.identity.clone(), config.admin_email.clone(), AuthEvents::default());
    let flows = Arc::new(Flows::<AppError>::new());
    pipelines::register_all_pipelines(&flows);
    Self {
      backend,
      gate,
      mirror_store,
      flows,
      config,
      device_locks: Arc::new(Mutex::new(HashMap::new())),
      checkouts_in_flight: Arc::new(Mutex::new(HashSet::new())),
    }
  }

  pub fn mirror_for(&self, device_id: Uuid) -> LocalMirror {
    LocalMirror::for_device(self.mirror_store.clone(), device_id)
  }

  /// Serializes cart mutations for one device. Hold the guard across
  /// load, mutate and persist.
  pub async fn lock_device(&self, device_id: Uuid) -> DeviceLock {
    let lock = {
      let mut locks = self.device_locks.lock();
      locks.entry(device_id).or_default().clone()
    };
    DeviceLock {
      guard: Some(lock.lock_owned().await),
      locks: self.device_locks.clone(),
      device_id,
    }
  }

  /// Devices that currently have a lock held or awaited.
  pub fn tracked_devices(&self) -> usize {
    self.device_locks.lock().len()
  }

  /// Marks an order placement as running for `device_id`. A second call
  /// while the first guard is alive is refused.
  pub fn begin_checkout(&self, device_id: Uuid) -> Result<CheckoutGuard, AppError> {
    if !self.checkouts_in_flight.lock().insert(device_id) {
      tracing::warn!(%device_id, "Order placement already in flight for device.");
      return Err(AppError::Conflict("Your order is already being processed".to_string()));
    }
    Ok(CheckoutGuard {
      in_flight: self.checkouts_in_flight.clone(),
      device_id,
    })
  }
}

/// Holds one device's cart lock. The map entry goes away with the last user.
pub struct DeviceLock {
  guard: Option<OwnedMutexGuard<()>>,
  locks: Arc<Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>,
  device_id: Uuid,
}

impl Drop for DeviceLock {
  fn drop(&mut self) {
    drop(self.guard.take());
    let mut locks = self.locks.lock();
    // Waiters clone the Arc under this map lock, so a count of one is final.
    if locks.get(&self.device_id).is_some_and(|l| Arc::strong_count(l) == 1) {
      locks.remove(&self.device_id);
    }
  }
}

/// Releases the in-flight mark on drop.
pub struct CheckoutGuard {
  in_flight: Arc<Mutex<HashSet<Uuid>>>,
  device_id: Uuid,
}

impl Drop for CheckoutGuard {
  fn drop(&mut self) {
    self.in_flight.lock().remove(&self.device_id);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::backend::memory::MemoryBackend;
  use crate::persistence::MemoryKv;

  fn state() -> AppState {
    AppState::new(
      Backend::in_memory(Arc::new(MemoryBackend::seeded())),
      Arc::new(AppConfig::default()),
      Arc::new(MemoryKv::new()),
    )
  }

  #[test]
  fn second_checkout_for_a_device_is_refused_until_the_first_ends() {
    let state = state();
    let device = Uuid::new_v4();
    let guard = state.begin_checkout(device).unwrap();
    assert!(matches!(state.begin_checkout(device), Err(AppError::Conflict(_))));
    assert!(state.begin_checkout(Uuid::new_v4()).is_ok());
    drop(guard);
    assert!(state.begin_checkout(device).is_ok());
  }

  #[tokio::test]
  async fn released_device_locks_are_forgotten() {
    let state = state();
    for _ in 0..100 {
      let _lock = state.lock_device(Uuid::new_v4()).await;
    }
    assert_eq!(state.tracked_devices(), 0);

    let device = Uuid::new_v4();
    let first = state.lock_device(device).await;
    let waiter = {
      let state = state.clone();
      tokio::spawn(async move {
        let _second = state.lock_device(device).await;
      })
    };
    tokio::task::yield_now().await;
    assert_eq!(state.tracked_devices(), 1);
    drop(first);
    waiter.await.unwrap();
    assert_eq!(state.tracked_devices(), 0);
  }
}
