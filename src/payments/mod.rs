pub mod client;
pub mod events;
pub mod signature;

pub use client::{IntentMetadata, PaymentIntentRef, PaymentProvider, ProviderError, StripeClient};
pub use events::{EventKind, ProviderEvent};
