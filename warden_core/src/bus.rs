//! Command/query dispatch and fire-and-forget event notification
//! (component M).
//!
//! Handlers are registered by the concrete Rust type of the message they
//! accept; the middleware chain for a handler is composed once at
//! registration, not per dispatch.

use async_trait::async_trait;
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::error::CoreError;
use crate::models::context::Context;

/// A message-typed handler. `Msg` is the command/query payload, `Out` its
/// response.
#[async_trait]
pub trait Handler<Msg, Out>: Send + Sync {
  async fn handle(&self, ctx: &Context, msg: Msg) -> Result<Out, CoreError>;
}

/// A middleware wraps a handler invocation for one concrete message type —
/// e.g. the cache-through / cache-invalidate middlewares (§4.L).
#[async_trait]
pub trait BusMiddleware<Msg, Out>: Send + Sync {
  async fn call(
    &self,
    ctx: &Context,
    msg: Msg,
    next: &(dyn Handler<Msg, Out> + Send + Sync),
  ) -> Result<Out, CoreError>;
}

/// A handler pre-wrapped in its composed middleware chain, stored behind a
/// type-erased key so heterogeneous message types can share one registry.
struct Registration<Msg, Out> {
  chain: Arc<dyn Handler<Msg, Out> + Send + Sync>,
}

/// Command/query bus. `register::<Msg, Out>` attaches a handler (already
/// wrapped in whatever middlewares the caller composed); `send::<Msg, Out>`
/// looks it up by `TypeId::of::<Msg>()` and invokes it.
#[derive(Default)]
pub struct Bus {
  handlers: DashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Bus {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register<Msg: 'static, Out: 'static>(
    &self,
    handler: Arc<dyn Handler<Msg, Out> + Send + Sync>,
  ) {
    let reg = Registration { chain: handler };
    self
      .handlers
      .insert(TypeId::of::<Msg>(), Box::new(reg));
  }

  pub async fn send<Msg: 'static + Send, Out: 'static>(
    &self,
    ctx: &Context,
    msg: Msg,
  ) -> Result<Out, CoreError> {
    let entry = self
      .handlers
      .get(&TypeId::of::<Msg>())
      .ok_or_else(|| CoreError::ServiceNotImplemented("no handler registered for message type".into()))?;
    let reg = entry
      .downcast_ref::<Registration<Msg, Out>>()
      .ok_or_else(|| CoreError::Internal("handler type mismatch".into()))?;
    reg.chain.handle(ctx, msg).await
  }
}

/// Wildcard-capable fire-and-forget notification bus.
///
/// Per the resolved open question in §9.1, `publish` spawns one task per
/// handler and awaits all of them via `join_all` (so callers that need
/// completion — tests, graceful shutdown — can await it), while still
/// swallowing and logging per-handler errors rather than propagating them.
#[async_trait]
pub trait EventHandler<Evt>: Send + Sync {
  async fn handle(&self, evt: &Evt) -> Result<(), CoreError>;
}

pub struct EventBus<Evt> {
  handlers: Vec<Arc<dyn EventHandler<Evt> + Send + Sync>>,
  wildcard: Vec<Arc<dyn EventHandler<Evt> + Send + Sync>>,
}

impl<Evt> Default for EventBus<Evt> {
  fn default() -> Self {
    Self {
      handlers: Vec::new(),
      wildcard: Vec::new(),
    }
  }
}

impl<Evt: Send + Sync + 'static> EventBus<Evt> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register(&mut self, handler: Arc<dyn EventHandler<Evt> + Send + Sync>) {
    self.handlers.push(handler);
  }

  pub fn register_any(&mut self, handler: Arc<dyn EventHandler<Evt> + Send + Sync>) {
    self.wildcard.push(handler);
  }

  pub async fn publish(&self, evt: Evt) {
    let evt = Arc::new(evt);
    let mut tasks = Vec::with_capacity(self.handlers.len() + self.wildcard.len());
    for h in self.handlers.iter().chain(self.wildcard.iter()).cloned() {
      let evt = evt.clone();
      tasks.push(tokio::spawn(async move {
        if let Err(e) = h.handle(&evt).await {
          tracing::warn!(error = %e, "event handler failed");
        }
      }));
    }
    futures::future::join_all(tasks).await;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Echo;

  #[async_trait]
  impl Handler<i32, i32> for Echo {
    async fn handle(&self, _ctx: &Context, msg: i32) -> Result<i32, CoreError> {
      Ok(msg * 2)
    }
  }

  fn test_ctx() -> Context {
    Context {
      user: None,
      request_id: "r".into(),
      request_method: "GET".into(),
      request_path: "/".into(),
      request_url: "http://x/".into(),
      request_path_params: serde_json::json!({}),
      request_query_params: serde_json::json!({}),
      request_json_params: serde_json::json!({}),
    }
  }

  #[tokio::test]
  async fn send_dispatches_to_registered_handler() {
    let bus = Bus::new();
    bus.register::<i32, i32>(Arc::new(Echo));
    let out: i32 = bus.send(&test_ctx(), 21).await.unwrap();
    assert_eq!(out, 42);
  }

  #[tokio::test]
  async fn send_errors_on_unregistered_type() {
    let bus = Bus::new();
    let result: Result<i32, CoreError> = bus.send(&test_ctx(), "unregistered".to_string()).await;
    assert!(result.is_err());
  }
}
