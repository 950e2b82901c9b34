pub mod client;
pub mod endpoint;

pub use client::{
    ClientConfig, ClientStats, ConnectionStats, DeliveryClient, DeliveryFailure,
    HttpDeliveryClient,
};
pub use endpoint::{DEFAULT_LISTENER_HOST, ListenerEndpoint, listener_url, redact_token};
