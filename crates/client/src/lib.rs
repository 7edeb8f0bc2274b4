//! Backend wiring for the vision-on-edge console: REST client, entity
//! store, request currency, kubeconfig upload, wizard submission and the
//! signed-in session.

pub mod api;
pub mod config;
pub mod error;
pub mod scope;
pub mod session;
pub mod store;
pub mod submit;
pub mod sync;
pub mod upload;

pub use api::{ApiError, VoeApi};
pub use config::ClientConfig;
pub use error::ClientError;
pub use scope::{Currency, RequestScope};
pub use store::EntityStore;
