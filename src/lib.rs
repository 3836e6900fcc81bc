/// Common error types: serialization failures, result alias.
pub mod error;
/// Event registry: weak subscriptions, emission, sweeping, snapshots.
pub mod pubsub;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Operation errors and result types.
pub use error::{RegistryError, RegistryResult};
/// Process-wide registry facade: subscribe, emit, sweep and friends.
pub use pubsub::global;
/// Event registry API.
pub use pubsub::{
    handler, ArgValue, EventArgs, EventHandler, EventRegistry, EventSnapshot, HandlerFn,
    HandlerState, MetricsSnapshot, RegistryMetrics, RegistrySnapshot, SubscriptionId,
    SubscriptionSnapshot,
};
