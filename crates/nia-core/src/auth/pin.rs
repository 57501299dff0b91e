//! PIN digits, the entry buffer and the completed code.
//!
//! None of these types print their digits through `Debug`.

use crate::error::{NiaError, Result};
use serde::{Serialize, Serializer};
use std::fmt;

/// Number of digits in a child PIN.
pub const PIN_LENGTH: usize = 4;

/// A single decimal digit.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Digit(u8);

impl Digit {
    /// Creates a digit from a value in `0..=9`.
    pub fn new(value: u8) -> Option<Self> {
        (value <= 9).then_some(Self(value))
    }

    /// Parses `'0'..='9'`.
    pub fn from_char(c: char) -> Option<Self> {
        c.to_digit(10).map(|d| Self(d as u8))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    fn as_char(self) -> char {
        char::from(b'0' + self.0)
    }
}

impl fmt::Debug for Digit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Digit(*)")
    }
}

impl TryFrom<char> for Digit {
    type Error = NiaError;

    fn try_from(c: char) -> Result<Self> {
        Self::from_char(c).ok_or_else(|| NiaError::validation("PIN digits must be 0-9"))
    }
}

/// Digits typed so far. Length stays within `0..=PIN_LENGTH`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PinBuffer {
    digits: Vec<Digit>,
}

impl PinBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.digits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.digits.len() == PIN_LENGTH
    }

    /// Appends a digit. Returns false (no-op) when the buffer is already full.
    pub fn push(&mut self, digit: Digit) -> bool {
        if self.is_complete() {
            return false;
        }
        self.digits.push(digit);
        true
    }

    /// Removes the last digit. Returns false (no-op) when empty.
    pub fn backspace(&mut self) -> bool {
        self.digits.pop().is_some()
    }

    pub fn clear(&mut self) {
        self.digits.clear();
    }

    /// Takes the completed code, leaving the buffer empty.
    ///
    /// Returns `None` and leaves the buffer untouched while it is incomplete.
    pub fn take_code(&mut self) -> Option<PinCode> {
        if !self.is_complete() {
            return None;
        }
        let code = self.digits.drain(..).map(Digit::as_char).collect();
        Some(PinCode(code))
    }
}

impl fmt::Debug for PinBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PinBuffer({}/{})", self.len(), PIN_LENGTH)
    }
}

/// A complete four-digit PIN, ready for verification.
#[derive(Clone, PartialEq, Eq)]
pub struct PinCode(String);

impl PinCode {
    /// Parses a full code such as `"4321"`.
    ///
    /// # Errors
    ///
    /// Returns a validation error unless the input is exactly four ASCII digits.
    pub fn parse(code: &str) -> Result<Self> {
        if code.len() != PIN_LENGTH || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(NiaError::validation("PIN must be exactly 4 digits"));
        }
        Ok(Self(code.to_string()))
    }

    /// The digits, for the wire request only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PinCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PinCode(****)")
    }
}

impl Serialize for PinCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
