//! Session layer for the Téléinfo gateway.
//!
//! This crate wires the protocol decoder from `teleinfo-protocol` to the
//! outside world: session configuration, the event emission boundary handed
//! to collaborators (MQTT mirror, event bus, discovery publisher), the
//! serial transport bridge, and the per-connection session object.
//!
//! One [`TicSession`] corresponds to one physical serial connection.
//! Sessions are fully independent; there is no shared state between them.

pub mod config;
pub mod discovery;
pub mod emission;
pub mod session;
pub mod transport;

pub use config::{DiscoveryConfig, MirrorConfig, SerialConfig, SessionConfig};
pub use discovery::DiscoveryRequest;
pub use emission::{ChannelSink, Emission, EmissionSink, MirrorMessage, TracingSink};
pub use session::{SessionDiagnostics, SessionShutdown, TicSession};
