pub mod authenticator;
pub mod bootstrap;
pub mod bus;
pub mod cache;
pub mod container;
pub mod error;
pub mod hasher;
pub mod jwt;
pub mod lock;
pub mod models;
pub mod refresh_store;
pub mod repository;
pub mod result;
pub mod route_rule;
pub mod state;
pub mod transaction;

pub use error::{CoreError, ErrorMapper};
pub use models::{AuthUser, Context, User};
pub use result::AppResult;
