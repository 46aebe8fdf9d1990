//! petcheck-runner: drives the pet API scenarios over HTTP

pub mod dispatch;
pub mod robustness;
pub mod scenario;
pub mod transport;

pub use dispatch::{CleanupOutcome, DispatchError, Dispatcher, log_response};
pub use robustness::Robustness;
pub use scenario::{Scenario, ScenarioOptions};
pub use transport::{HttpReply, HttpRequest, ReqwestTransport, Transport, TransportError};
