pub mod carrier;
pub mod client;
pub mod codegen;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;

pub use carrier::Carrier;
pub use client::{ProviderClient, ProviderResult};
pub use codegen::TrackingFormat;
pub use config::{FallbackPolicy, ProviderEndpoint, ShippingConfig};
pub use dispatch::{TrackOutcome, Tracker};
pub use error::ShippingError;
pub use events::{extract_events, TrackingEvent};
