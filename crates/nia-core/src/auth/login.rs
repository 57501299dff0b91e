//! Async driver around [`PinEntry`].

use super::pin::Digit;
use super::pin_entry::{DigitOutcome, PinEntry, PinEntryView, Resolution};
use super::verifier::{PinVerifier, VerifyPinRequest};
use crate::child::{ChildId, ChildIdentity};
use crate::error::{NiaError, Result};
use crate::session::{Session, SessionStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// What a key press led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginProgress {
    /// Not accepted in the current phase (including while verifying).
    Ignored,
    /// Digit stored; `entered` digits are filled.
    Entering { entered: usize },
    /// Verification failed; buffer cleared, same child still selected.
    Rejected,
    /// Verified and written to the Session Store.
    Authenticated(Session),
}

/// PIN sign-in for one visit of the picker screen.
///
/// Owns the entry machine, dispatches the verification the machine asks for
/// and, on success, establishes the session. The machine lock is not held
/// while the verifier runs; presses that arrive meanwhile find the machine in
/// `Verifying` and are ignored.
pub struct PinLogin {
    entry: Mutex<PinEntry>,
    verifier: Arc<dyn PinVerifier>,
    sessions: Arc<SessionStore>,
    timeout: Duration,
}

impl PinLogin {
    /// # Errors
    ///
    /// Returns `NotFound` if `children` is empty.
    pub fn new(
        children: Vec<ChildIdentity>,
        verifier: Arc<dyn PinVerifier>,
        sessions: Arc<SessionStore>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            entry: Mutex::new(PinEntry::new(children)?),
            verifier,
            sessions,
            timeout,
        })
    }

    pub async fn view(&self) -> PinEntryView {
        self.entry.lock().await.view()
    }

    pub async fn children(&self) -> Vec<ChildIdentity> {
        self.entry.lock().await.children().to_vec()
    }

    pub async fn select(&self, child_id: ChildId) -> Result<()> {
        self.entry.lock().await.select(child_id)
    }

    pub async fn backspace(&self) -> bool {
        self.entry.lock().await.backspace()
    }

    pub async fn back(&self) -> bool {
        self.entry.lock().await.back()
    }

    /// Feeds one digit. The fourth digit verifies before this returns.
    pub async fn press(&self, digit: Digit) -> LoginProgress {
        let outcome = self.entry.lock().await.push_digit(digit);
        match outcome {
            DigitOutcome::Ignored => LoginProgress::Ignored,
            DigitOutcome::Appended { entered } => LoginProgress::Entering { entered },
            DigitOutcome::Submit(request) => self.verify(request).await,
        }
    }

    /// Convenience for keyboards: feeds a character as a digit press.
    ///
    /// # Errors
    ///
    /// Returns a validation error for non-digit characters, without touching
    /// the machine.
    pub async fn press_char(&self, c: char) -> Result<LoginProgress> {
        let digit = Digit::try_from(c)?;
        Ok(self.press(digit).await)
    }

    async fn verify(&self, request: VerifyPinRequest) -> LoginProgress {
        tracing::info!(child_id = %request.child_id, "Verifying PIN");

        let verdict = match tokio::time::timeout(self.timeout, self.verifier.verify(&request)).await
        {
            Ok(result) => result,
            Err(_) => Err(NiaError::timeout("pin verification", self.timeout)),
        };

        let resolution = self.entry.lock().await.resolve(verdict);
        match resolution {
            Resolution::Authenticated(session) => {
                if let Err(e) = self.sessions.establish(session.clone()).await {
                    tracing::warn!(error = %e, "Session not persisted; signed in for this run only");
                }
                LoginProgress::Authenticated(session)
            }
            Resolution::Rejected => LoginProgress::Rejected,
            Resolution::Ignored => LoginProgress::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{PinPhase, PinVerdict};
    use crate::session::MemorySessionRepository;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Notify;

    // Verifier accepting a single PIN; records every request it receives.
    struct MockVerifier {
        pin: &'static str,
        calls: StdMutex<Vec<(ChildId, String)>>,
        gate: Option<Arc<Notify>>,
        fail_transport: bool,
    }

    impl MockVerifier {
        fn accepting(pin: &'static str) -> Self {
            Self {
                pin,
                calls: StdMutex::new(Vec::new()),
                gate: None,
                fail_transport: false,
            }
        }

        fn calls(&self) -> Vec<(ChildId, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PinVerifier for MockVerifier {
        async fn verify(&self, request: &VerifyPinRequest) -> Result<PinVerdict> {
            self.calls
                .lock()
                .unwrap()
                .push((request.child_id, request.pin.expose().to_string()));
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail_transport {
                return Err(NiaError::service("pin", Some(503), "unavailable"));
            }
            if request.pin.expose() == self.pin {
                Ok(PinVerdict::Verified(ChildIdentity::new(
                    request.child_id,
                    "Ava",
                    "2nd",
                )))
            } else {
                Ok(PinVerdict::Rejected)
            }
        }
    }

    fn store() -> Arc<SessionStore> {
        Arc::new(SessionStore::new(Arc::new(MemorySessionRepository::new())))
    }

    fn login(verifier: Arc<MockVerifier>, sessions: Arc<SessionStore>) -> PinLogin {
        PinLogin::new(
            vec![ChildIdentity::new(1, "Ava", "2nd")],
            verifier,
            sessions,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_ava_signs_in_with_one_verify_call() {
        let verifier = Arc::new(MockVerifier::accepting("4321"));
        let sessions = store();
        let login = login(verifier.clone(), sessions.clone());

        login.select(ChildId(1)).await.unwrap();
        let mut last = LoginProgress::Ignored;
        for c in "4321".chars() {
            last = login.press_char(c).await.unwrap();
        }

        assert_eq!(verifier.calls(), vec![(ChildId(1), "4321".to_string())]);
        match last {
            LoginProgress::Authenticated(session) => {
                assert_eq!(session.child.id, ChildId(1));
                assert_eq!(sessions.current(), Some(session));
            }
            other => panic!("expected Authenticated, got {other:?}"),
        }
        assert_eq!(login.view().await.phase, PinPhase::Authenticated);
    }

    #[tokio::test]
    async fn test_wrong_pin_rejects_and_keeps_child() {
        let verifier = Arc::new(MockVerifier::accepting("4321"));
        let sessions = store();
        let login = login(verifier.clone(), sessions.clone());

        login.select(ChildId(1)).await.unwrap();
        for c in "123".chars() {
            login.press_char(c).await.unwrap();
        }
        assert_eq!(login.press_char('4').await.unwrap(), LoginProgress::Rejected);

        let view = login.view().await;
        assert_eq!(view.entered, 0);
        assert_eq!(view.selected.unwrap().id, ChildId(1));
        assert_eq!(view.error, Some("Incorrect PIN. Please try again."));
        assert!(sessions.current().is_none());
    }

    #[tokio::test]
    async fn test_transport_failure_rejects() {
        let verifier = Arc::new(MockVerifier {
            fail_transport: true,
            ..MockVerifier::accepting("4321")
        });
        let login = login(verifier, store());

        login.select(ChildId(1)).await.unwrap();
        for c in "432".chars() {
            login.press_char(c).await.unwrap();
        }
        assert_eq!(login.press_char('1').await.unwrap(), LoginProgress::Rejected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_verifier_timeout_rejects() {
        let gate = Arc::new(Notify::new());
        let verifier = Arc::new(MockVerifier {
            gate: Some(gate),
            ..MockVerifier::accepting("4321")
        });
        let login = login(verifier, store());

        login.select(ChildId(1)).await.unwrap();
        for c in "432".chars() {
            login.press_char(c).await.unwrap();
        }
        // Gate is never opened; the paused clock advances to the timeout
        assert_eq!(login.press_char('1').await.unwrap(), LoginProgress::Rejected);
    }

    #[tokio::test]
    async fn test_presses_during_verification_are_ignored() {
        let gate = Arc::new(Notify::new());
        let verifier = Arc::new(MockVerifier {
            gate: Some(gate.clone()),
            ..MockVerifier::accepting("4321")
        });
        let login = login(verifier.clone(), store());

        login.select(ChildId(1)).await.unwrap();
        for c in "432".chars() {
            login.press_char(c).await.unwrap();
        }

        let (first, second) = tokio::join!(login.press_char('1'), async {
            let extra = login.press_char('1').await.unwrap();
            let back = login.back().await;
            gate.notify_one();
            (extra, back)
        });

        assert!(matches!(first.unwrap(), LoginProgress::Authenticated(_)));
        assert_eq!(second, (LoginProgress::Ignored, false));
        assert_eq!(verifier.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_non_digit_is_validation_error() {
        let login = login(Arc::new(MockVerifier::accepting("4321")), store());
        login.select(ChildId(1)).await.unwrap();

        assert!(login.press_char('x').await.unwrap_err().is_validation());
        assert_eq!(login.view().await.entered, 0);
    }
}
