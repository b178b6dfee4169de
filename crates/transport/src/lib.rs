pub mod device;
pub mod error;
pub mod gateway;
pub mod notifier;
pub mod registry;

pub use device::TabletDevice;
pub use error::TransportError;
pub use gateway::TabletGateway;
pub use notifier::WorkstationNotifier;
pub use registry::TabletRegistry;
