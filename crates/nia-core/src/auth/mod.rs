//! Child authentication: PIN capture, verification and sign-in.
//!
//! - `pin`: `Digit`, `PinBuffer`, `PinCode`
//! - `verifier`: the remote PIN verification interface
//! - `pin_entry`: the synchronous `PinEntry` state machine
//! - `login`: `PinLogin`, the async driver that verifies and establishes the session

mod login;
mod pin;
mod pin_entry;
mod verifier;

pub use login::{LoginProgress, PinLogin};
pub use pin::{Digit, PIN_LENGTH, PinBuffer, PinCode};
pub use pin_entry::{
    DigitOutcome, INCORRECT_PIN_MESSAGE, NO_PROFILES_MESSAGE, PinEntry, PinEntryView, PinPhase,
    Resolution,
};
pub use verifier::{PinVerdict, PinVerifier, VerifyPinRequest};
