//! REST client, used by `shipctl` and as a remote [`StatusSource`](crate::domain::repositories::StatusSource).

pub mod api_client;

pub use api_client::{ApiClient, ClientError};
