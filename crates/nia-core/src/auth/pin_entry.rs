//! PIN entry state machine.
//!
//! ```text
//! SelectingIdentity --select--> EnteringPin --4th digit--> Verifying
//!        ^                         |   ^                     |     |
//!        +---------back------------+   |                ok   |     | fail
//!        +---------back------------ Rejected <---------------+-----+
//!                                                            v
//!                                                      Authenticated
//! ```
//!
//! The machine is synchronous and does no I/O. Reaching four digits is a
//! guard evaluated inside `push_digit`; the resulting `DigitOutcome::Submit`
//! carries the one verification request the caller must dispatch. While the
//! machine is `Verifying` every input is ignored, so at most one request is
//! outstanding per completed buffer.

use super::pin::{Digit, PIN_LENGTH, PinBuffer};
use super::verifier::{PinVerdict, VerifyPinRequest};
use crate::child::{ChildId, ChildIdentity};
use crate::error::{NiaError, Result};
use crate::session::Session;
use std::mem;

/// The single, generic message shown after any failed verification.
pub const INCORRECT_PIN_MESSAGE: &str = "Incorrect PIN. Please try again.";

/// Shown instead of the picker when the household has no child profiles.
pub const NO_PROFILES_MESSAGE: &str =
    "No children profiles found. Please ask your parent to add you!";

/// Observable phase of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum PinPhase {
    SelectingIdentity,
    EnteringPin,
    Verifying,
    /// Entering a PIN again after a failure; the error message is visible.
    Rejected,
    Authenticated,
}

#[derive(Debug, Clone)]
enum State {
    SelectingIdentity,
    EnteringPin {
        child: ChildIdentity,
        buffer: PinBuffer,
    },
    Verifying {
        child: ChildIdentity,
    },
    Rejected {
        child: ChildIdentity,
        buffer: PinBuffer,
    },
    Authenticated {
        session: Session,
    },
}

/// Result of a digit press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigitOutcome {
    /// Not accepted in the current phase.
    Ignored,
    /// Stored; `entered` digits are now in the buffer.
    Appended { entered: usize },
    /// Fourth digit: the machine moved to `Verifying`. Dispatch this request.
    Submit(VerifyPinRequest),
}

/// Result of feeding a verification answer back into the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Authenticated(Session),
    Rejected,
    /// No verification was outstanding.
    Ignored,
}

/// Read-only snapshot for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinEntryView {
    pub phase: PinPhase,
    pub selected: Option<ChildIdentity>,
    pub entered: usize,
    pub error: Option<&'static str>,
}

/// Identity selection and digit-by-digit PIN capture.
#[derive(Debug, Clone)]
pub struct PinEntry {
    children: Vec<ChildIdentity>,
    state: State,
    failed_attempts: u32,
}

impl PinEntry {
    /// Starts in `SelectingIdentity` over the household's profiles.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when `children` is empty. That is a display
    /// condition (see [`NO_PROFILES_MESSAGE`]), not a machine state.
    pub fn new(children: Vec<ChildIdentity>) -> Result<Self> {
        if children.is_empty() {
            return Err(NiaError::not_found("child profile", "household"));
        }
        Ok(Self {
            children,
            state: State::SelectingIdentity,
            failed_attempts: 0,
        })
    }

    pub fn children(&self) -> &[ChildIdentity] {
        &self.children
    }

    pub fn phase(&self) -> PinPhase {
        match self.state {
            State::SelectingIdentity => PinPhase::SelectingIdentity,
            State::EnteringPin { .. } => PinPhase::EnteringPin,
            State::Verifying { .. } => PinPhase::Verifying,
            State::Rejected { .. } => PinPhase::Rejected,
            State::Authenticated { .. } => PinPhase::Authenticated,
        }
    }

    /// The child whose PIN is being entered.
    pub fn selected(&self) -> Option<&ChildIdentity> {
        match &self.state {
            State::EnteringPin { child, .. }
            | State::Verifying { child }
            | State::Rejected { child, .. } => Some(child),
            State::Authenticated { session } => Some(&session.child),
            State::SelectingIdentity => None,
        }
    }

    /// Number of digits shown as filled.
    pub fn entered_digits(&self) -> usize {
        match &self.state {
            State::EnteringPin { buffer, .. } | State::Rejected { buffer, .. } => buffer.len(),
            State::Verifying { .. } => PIN_LENGTH,
            _ => 0,
        }
    }

    pub fn error_message(&self) -> Option<&'static str> {
        matches!(self.state, State::Rejected { .. }).then_some(INCORRECT_PIN_MESSAGE)
    }

    /// Failed verifications since this machine was created.
    ///
    /// Informational only; retries are unlimited.
    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    /// The session produced by a successful verification.
    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            State::Authenticated { session } => Some(session),
            _ => None,
        }
    }

    pub fn view(&self) -> PinEntryView {
        PinEntryView {
            phase: self.phase(),
            selected: self.selected().cloned(),
            entered: self.entered_digits(),
            error: self.error_message(),
        }
    }

    /// Chooses whose PIN to enter. Starts with an empty buffer and no error.
    ///
    /// # Errors
    ///
    /// - `Busy` while a verification is outstanding
    /// - `Validation` once authenticated
    /// - `NotFound` for an id outside the loaded list
    pub fn select(&mut self, child_id: ChildId) -> Result<()> {
        match self.state {
            State::Verifying { .. } => return Err(NiaError::Busy("pin verification")),
            State::Authenticated { .. } => {
                return Err(NiaError::validation("a child is already signed in"));
            }
            _ => {}
        }

        let child = self
            .children
            .iter()
            .find(|c| c.id == child_id)
            .cloned()
            .ok_or_else(|| NiaError::not_found("child profile", child_id.to_string()))?;

        self.state = State::EnteringPin {
            child,
            buffer: PinBuffer::new(),
        };
        Ok(())
    }

    /// Appends a digit; the fourth one moves the machine to `Verifying`.
    pub fn push_digit(&mut self, digit: Digit) -> DigitOutcome {
        match mem::replace(&mut self.state, State::SelectingIdentity) {
            State::EnteringPin { child, mut buffer } => {
                buffer.push(digit);
                self.after_append(child, buffer, false)
            }
            State::Rejected { child, mut buffer } => {
                buffer.push(digit);
                self.after_append(child, buffer, true)
            }
            other => {
                self.state = other;
                DigitOutcome::Ignored
            }
        }
    }

    fn after_append(
        &mut self,
        child: ChildIdentity,
        mut buffer: PinBuffer,
        rejected: bool,
    ) -> DigitOutcome {
        if let Some(pin) = buffer.take_code() {
            let request = VerifyPinRequest {
                child_id: child.id,
                pin,
            };
            self.state = State::Verifying { child };
            return DigitOutcome::Submit(request);
        }

        let entered = buffer.len();
        self.state = if rejected {
            State::Rejected { child, buffer }
        } else {
            State::EnteringPin { child, buffer }
        };
        DigitOutcome::Appended { entered }
    }

    /// Removes the last digit. No-op outside PIN entry or on an empty buffer.
    pub fn backspace(&mut self) -> bool {
        match &mut self.state {
            State::EnteringPin { buffer, .. } | State::Rejected { buffer, .. } => {
                buffer.backspace()
            }
            _ => false,
        }
    }

    /// Returns to identity selection, discarding the buffer and any error.
    ///
    /// Ignored while verifying or once authenticated.
    pub fn back(&mut self) -> bool {
        match self.state {
            State::EnteringPin { .. } | State::Rejected { .. } => {
                self.state = State::SelectingIdentity;
                true
            }
            _ => false,
        }
    }

    /// Applies the verifier's answer.
    ///
    /// A transport error is handled exactly like a wrong PIN. On success the
    /// identity returned by the verifier, not the locally selected one,
    /// becomes the session's child.
    pub fn resolve(&mut self, verdict: Result<PinVerdict>) -> Resolution {
        let child = match mem::replace(&mut self.state, State::SelectingIdentity) {
            State::Verifying { child } => child,
            other => {
                self.state = other;
                return Resolution::Ignored;
            }
        };

        match verdict {
            Ok(PinVerdict::Verified(identity)) => {
                if identity.id != child.id {
                    tracing::warn!(
                        selected = %child.id,
                        verified = %identity.id,
                        "Verifier returned a different child than selected"
                    );
                }
                let session = Session::new(identity);
                self.state = State::Authenticated {
                    session: session.clone(),
                };
                Resolution::Authenticated(session)
            }
            Ok(PinVerdict::Rejected) => self.reject(child),
            Err(e) => {
                tracing::warn!(child_id = %child.id, error = %e, "PIN verification failed");
                self.reject(child)
            }
        }
    }

    fn reject(&mut self, child: ChildIdentity) -> Resolution {
        self.failed_attempts += 1;
        self.state = State::Rejected {
            child,
            buffer: PinBuffer::new(),
        };
        Resolution::Rejected
    }
}
