//! Logged, validated access to stored models.
//!
//! A [`Service`] wraps a [`Repository`] and runs every operation through a
//! [`ServiceFunction`]:
//!
//! 1. write operations on a read-only service are rejected
//! 2. required log messages are checked before anything runs
//! 3. the operation runs; on success the info message is logged and a new
//!    service holding the result is returned
//! 4. programming errors come back untouched; any other failure is logged and
//!    then raised or suppressed according to the service's [`ErrorPolicy`]

mod decorator;
mod guard;
mod model;
mod objects;
mod service;
mod store;
pub mod users;

pub use decorator::{LogMessages, ServiceFunction};
pub use guard::write_guard;
pub use model::{Fields, Lookup, Model};
pub use objects::Objects;
pub use service::{CreationStrategy, ErrorPolicy, Service, ServiceBuilder, ServiceResult};
pub use store::{InMemoryStore, Repository, StoreError};
pub use users::{user_service, User};
