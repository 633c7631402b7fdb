use tracing::debug;

use crate::{
    error::SubmitError,
    reconciler::AvailabilityReconciler,
    types::{Confirmation, RegistrationDraft},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    Idle,
    Submitting,
    Confirmed,
}

/// Puts the phase back to `Idle` when a submission is abandoned mid-flight.
struct SubmittingPhase<'a>(&'a mut SubmissionPhase);

impl<'a> SubmittingPhase<'a> {
    fn enter(phase: &'a mut SubmissionPhase) -> Self {
        *phase = SubmissionPhase::Submitting;
        Self(phase)
    }

    fn finish(mut self, outcome: SubmissionPhase) {
        *self.0 = outcome;
    }
}

impl Drop for SubmittingPhase<'_> {
    fn drop(&mut self) {
        if *self.0 == SubmissionPhase::Submitting {
            *self.0 = SubmissionPhase::Idle;
        }
    }
}

/// One visitor's pass through the registration form.
///
/// The draft survives every failed attempt and is dropped once the server
/// confirms the registration.
#[derive(Debug)]
pub struct RegistrationSession {
    draft: Option<RegistrationDraft>,
    phase: SubmissionPhase,
    last_error: Option<String>,
    confirmation: Option<Confirmation>,
}

impl RegistrationSession {
    pub fn new(draft: RegistrationDraft) -> Self {
        Self {
            draft: Some(draft),
            phase: SubmissionPhase::Idle,
            last_error: None,
            confirmation: None,
        }
    }

    pub fn draft(&self) -> Option<&RegistrationDraft> {
        self.draft.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut RegistrationDraft> {
        self.draft.as_mut()
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.phase
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn confirmation(&self) -> Option<&Confirmation> {
        self.confirmation.as_ref()
    }

    pub async fn submit(
        &mut self,
        reconciler: &AvailabilityReconciler,
    ) -> Result<Confirmation, SubmitError> {
        let Some(draft) = self.draft.as_ref() else {
            return Err(SubmitError::NoActiveDraft);
        };
        let phase = SubmittingPhase::enter(&mut self.phase);
        let outcome = reconciler.submit(draft).await;
        match outcome {
            Ok(confirmation) => {
                phase.finish(SubmissionPhase::Confirmed);
                self.last_error = None;
                self.draft = None;
                self.confirmation = Some(confirmation.clone());
                Ok(confirmation)
            }
            Err(err) => {
                debug!(error = %err, "session: submission failed; draft kept");
                phase.finish(SubmissionPhase::Idle);
                self.last_error = Some(err.user_message());
                Err(err)
            }
        }
    }

    /// Starts over with a new draft after a confirmation.
    pub fn restart(&mut self, draft: RegistrationDraft) {
        *self = Self::new(draft);
    }
}
