//! Client-side availability tracking for the event RSVP form.
//!
//! [`AvailabilityReconciler`] keeps a live view of the menu, merging
//! server-confirmed counts with optimistic local bumps, and
//! [`RegistrationSession`] drives one visitor through submission.

pub mod admin;
pub mod catalog;
pub mod error;
pub mod poller;
pub mod reconciler;
pub mod session;
pub mod transport;
pub mod types;

pub use admin::AdminClient;
pub use catalog::{CatalogEntry, CatalogError, MenuCatalog, MenuItem};
pub use error::{BackendError, SubmitError, SyncError, ValidationError};
pub use poller::{spawn_poller, PollerHandle, MIN_POLL_INTERVAL};
pub use reconciler::{AvailabilityEvent, AvailabilityReconciler, PollOutcome, ReconcilerConfig};
pub use session::{RegistrationSession, SubmissionPhase};
pub use transport::{ApiBase, HttpRsvpBackend, RegistrationAck, RsvpBackend};
pub use types::{Confirmation, RegistrationDraft};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
