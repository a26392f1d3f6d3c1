//! Type-keyed dependency registry with generation-aware caching
//! (component P).
//!
//! Every entry is registered once under one of the five factory kinds; a
//! resolved value is cached against the container's current generation, so
//! bumping the generation (via `reset`) invalidates every cache without
//! having to walk and rebuild each entry eagerly.

use dashmap::DashMap;
use futures::future::BoxFuture;
use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::CoreError;

type AnyArc = Arc<dyn Any + Send + Sync>;
type SyncFactoryFn = dyn Fn() -> AnyArc + Send + Sync;
type AsyncFactoryFn = dyn Fn() -> BoxFuture<'static, AnyArc> + Send + Sync;

/// Discriminates how an entry is produced. Kept as an explicit enum (rather
/// than relying on trait-object dispatch alone) so callers can introspect
/// what a given registration actually does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FactoryKind {
  /// A value registered once, returned as-is on every resolution.
  Value,
  /// A synchronous factory, invoked at most once per generation.
  SyncCall,
  /// An asynchronous factory, invoked at most once per generation.
  AsyncCall,
  /// A synchronous scoped resource; release is the caller's responsibility
  /// (modeled as a plain `SyncCall` whose value is a guard type).
  SyncContext,
  /// An asynchronous scoped resource, same caveat as `SyncContext`.
  AsyncContext,
}

enum Entry {
  Value(AnyArc),
  SyncFactory(Arc<SyncFactoryFn>),
  AsyncFactory(Arc<AsyncFactoryFn>),
}

impl Entry {
  fn kind(&self) -> FactoryKind {
    match self {
      Entry::Value(_) => FactoryKind::Value,
      Entry::SyncFactory(_) => FactoryKind::SyncCall,
      Entry::AsyncFactory(_) => FactoryKind::AsyncCall,
    }
  }
}

#[derive(Default)]
pub struct Container {
  entries: DashMap<TypeId, Entry>,
  cache: DashMap<TypeId, (u64, AnyArc)>,
  generation: AtomicU64,
}

impl Container {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn generation(&self) -> u64 {
    self.generation.load(Ordering::Acquire)
  }

  /// Invalidates every cached resolution without touching registrations;
  /// the next `resolve::<T>()` after this call recomputes its value.
  pub fn reset(&self) {
    self.generation.fetch_add(1, Ordering::AcqRel);
  }

  pub fn register_value<T: Send + Sync + 'static>(&self, value: T) {
    self
      .entries
      .insert(TypeId::of::<T>(), Entry::Value(Arc::new(value)));
  }

  pub fn register_sync<T: Send + Sync + 'static>(&self, factory: impl Fn() -> T + Send + Sync + 'static) {
    let f: Arc<SyncFactoryFn> = Arc::new(move || Arc::new(factory()) as AnyArc);
    self.entries.insert(TypeId::of::<T>(), Entry::SyncFactory(f));
  }

  pub fn register_async<T, F, Fut>(&self, factory: F)
  where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = T> + Send + 'static,
  {
    let f: Arc<AsyncFactoryFn> = Arc::new(move || {
      let fut = factory();
      Box::pin(async move { Arc::new(fut.await) as AnyArc })
    });
    self
      .entries
      .insert(TypeId::of::<T>(), Entry::AsyncFactory(f));
  }

  pub fn kind_of<T: 'static>(&self) -> Option<FactoryKind> {
    self.entries.get(&TypeId::of::<T>()).map(|e| e.kind())
  }

  /// Resolves `T`, reusing a cached value from the current generation when
  /// one exists. Synchronous factories are called directly; asynchronous
  /// factories are awaited.
  pub async fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, CoreError> {
    let type_id = TypeId::of::<T>();
    let current_gen = self.generation();

    if let Some(cached) = self.cache.get(&type_id) {
      if cached.0 == current_gen {
        return downcast(cached.1.clone());
      }
    }

    enum Producer {
      Value(AnyArc),
      Sync(Arc<SyncFactoryFn>),
      Async(Arc<AsyncFactoryFn>),
    }

    let producer = {
      let entry = self.entries.get(&type_id).ok_or_else(|| {
        CoreError::Internal("no dependency registered for requested type".into())
      })?;
      match &*entry {
        Entry::Value(v) => Producer::Value(v.clone()),
        Entry::SyncFactory(f) => Producer::Sync(f.clone()),
        Entry::AsyncFactory(f) => Producer::Async(f.clone()),
      }
      // `entry` (the DashMap shard guard) is dropped here, before any `.await`.
    };

    let produced: AnyArc = match producer {
      Producer::Value(v) => v,
      Producer::Sync(f) => f(),
      Producer::Async(f) => f().await,
    };

    self.cache.insert(type_id, (current_gen, produced.clone()));
    downcast(produced)
  }
}

fn downcast<T: Send + Sync + 'static>(value: AnyArc) -> Result<Arc<T>, CoreError> {
  value
    .downcast::<T>()
    .map_err(|_| CoreError::Internal("dependency container type mismatch".into()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn value_resolves_to_the_registered_instance() {
    let c = Container::new();
    c.register_value(42i32);
    let v = c.resolve::<i32>().await.unwrap();
    assert_eq!(*v, 42);
  }

  #[tokio::test]
  async fn reset_invalidates_sync_factory_cache() {
    let c = Container::new();
    let counter = Arc::new(AtomicU64::new(0));
    let counter2 = counter.clone();
    c.register_sync(move || counter2.fetch_add(1, Ordering::SeqCst));

    let first = *c.resolve::<u64>().await.unwrap();
    let second = *c.resolve::<u64>().await.unwrap();
    assert_eq!(first, second, "cached within the same generation");

    c.reset();
    let third = *c.resolve::<u64>().await.unwrap();
    assert_ne!(third, second, "generation bump forces recomputation");
  }

  #[tokio::test]
  async fn async_factory_resolves() {
    let c = Container::new();
    c.register_async(|| async { "hello".to_string() });
    let v = c.resolve::<String>().await.unwrap();
    assert_eq!(v.as_str(), "hello");
  }
}
