//! Casa Notify Library
//!
//! Broadcasts a notification to every registered device (or only recently
//! active ones) through the push gateway, in gateway-sized batches, and
//! records the aggregate outcome in the notification history table.

pub mod context;
pub mod error;
pub mod fanout;
pub mod gateway;
pub mod repository;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use context::{NotificationContext, PushTokenProvider};
pub use error::{BroadcastError, GatewayError, RepositoryError};
pub use fanout::BroadcastService;
pub use gateway::{is_push_token, ExpoPushGateway, PushGateway};
pub use repository::{DeviceTokenRepository, NotificationHistoryRepository, RestRepository};
