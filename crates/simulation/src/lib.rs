//! Simulation toolkit for exercising the signature orchestration stack in a
//! controlled, fully in-memory environment.
//!
//! A [`SimulationHarness`] wires a real orchestrator to simulated tablet,
//! notifier, registry, document, blob and renderer backends. The backends
//! record every interaction and can be flipped into failure modes
//! mid-scenario.
//!
//! # Quick start
//!
//! ```
//! use paraph_simulation::SimulationHarness;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let sim = SimulationHarness::start().expect("harness should start");
//!
//! let created = sim
//!     .orchestrator
//!     .create_session(sim.default_request())
//!     .await
//!     .expect("dispatch should succeed");
//!
//! // The simulated tablet saw the document and signs it.
//! assert_eq!(sim.tablet.dispatches().len(), 1);
//! assert!(sim.submit_signature(&created.session_id).await);
//! # }
//! ```

pub mod backends;
pub mod harness;
pub mod notifier;
pub mod tablet;

pub use backends::{SimulatedBlobs, SimulatedDocuments, SimulatedRegistry, SimulatedRenderer};
pub use harness::{HarnessBuilder, SIGNATURE_BYTES, SimulationHarness, encoded_signature};
pub use notifier::RecordingNotifier;
pub use tablet::{CapturedDispatch, SimulatedTablet};
