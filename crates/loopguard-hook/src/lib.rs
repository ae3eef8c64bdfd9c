//! SABnzbd hook that refuses downloads it has already seen within a time
//! window.
//!
//! The binary runs once per host event: [`gate::AdmissionGate`] before a
//! download is queued, [`reporter::CompletionReporter`] after it has been
//! post-processed. Both share the flat-file history and the configured
//! notifier.

pub mod dispatch;
pub mod gate;
pub mod host;
pub mod logging;
pub mod reporter;
pub mod settings;

pub use dispatch::Dispatcher;
pub use gate::{AdmissionGate, Answer, GateReport};
pub use host::{DownloadInfo, HostResponse};
pub use reporter::{CompletionReport, CompletionReporter};
pub use settings::Settings;
