use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::domain::author::{AuthorIdentity, AuthorName};

use super::store::{IdentityError, IdentityStore, Readiness};

/// Pause between hydration and opening the welcome prompt.
pub const DEFAULT_WELCOME_DELAY: Duration = Duration::from_millis(400);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingState {
    /// Storage has not been hydrated (or never will be).
    Unknown,
    /// Hydrated, no name chosen, welcome not yet shown.
    AnonymousNew,
    Prompting,
    /// Name chosen, welcome completed, or prompt suppressed. Sticky.
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WelcomeChoice {
    SetName { name: String, dont_show_again: bool },
    ContinueAnonymously { dont_show_again: bool },
}

#[derive(Debug, Error)]
pub enum OnboardingError {
    #[error("welcome prompt is not open (current state: {0:?})")]
    NotPrompting(OnboardingState),
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

/// Ensures the welcome prompt opens at most once per process, however many
/// machines evaluate the identity.
#[derive(Debug, Clone, Default)]
pub struct SessionGuard(Arc<AtomicBool>);

impl SessionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_fired(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn claim(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }
}

pub struct OnboardingMachine {
    store: Arc<IdentityStore>,
    delay: Duration,
    guard: SessionGuard,
    state: watch::Sender<OnboardingState>,
}

impl OnboardingMachine {
    pub fn new(store: Arc<IdentityStore>) -> Self {
        let (state, _) = watch::channel(OnboardingState::Unknown);
        Self {
            store,
            delay: DEFAULT_WELCOME_DELAY,
            guard: SessionGuard::new(),
            state,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_session_guard(mut self, guard: SessionGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn state(&self) -> OnboardingState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<OnboardingState> {
        self.state.subscribe()
    }

    /// Drive the machine from session start up to the point where it needs the user.
    ///
    /// Waits for hydration; if storage turns out to be unavailable the machine stays
    /// in [`OnboardingState::Unknown`]. The session guard is claimed only when the
    /// prompt actually opens, so a run dropped during the delay can be run again.
    pub async fn run(&self) -> Result<OnboardingState, OnboardingError> {
        match self.state() {
            OnboardingState::Unknown => {
                if let Some(settled) = self.evaluate().await? {
                    return Ok(settled);
                }
            }
            OnboardingState::AnonymousNew => {}
            settled => return Ok(settled),
        }

        if self.guard.has_fired() {
            debug!(
                target = "inkpost::onboarding",
                "welcome prompt already shown in this session"
            );
            return Ok(self.state());
        }

        tokio::time::sleep(self.delay).await;
        if !self.guard.claim() {
            return Ok(self.state());
        }
        Ok(self.transition(OnboardingState::Prompting))
    }

    /// Leave `Unknown` once hydration settles. Returns the state to stop in, or
    /// `None` when the author is new and the prompt should be scheduled.
    async fn evaluate(&self) -> Result<Option<OnboardingState>, OnboardingError> {
        match self.store.wait_hydrated().await {
            Readiness::Ready => {}
            readiness => {
                info!(
                    target = "inkpost::onboarding",
                    ?readiness,
                    "identity storage not ready; welcome prompt skipped"
                );
                return Ok(Some(self.state()));
            }
        }

        let identity = self.store.initialize().await?;
        if !needs_welcome(&identity) {
            return Ok(Some(self.transition(OnboardingState::Resolved)));
        }
        self.transition(OnboardingState::AnonymousNew);
        Ok(None)
    }

    /// Close the welcome prompt with the user's choice.
    pub async fn resolve(&self, choice: WelcomeChoice) -> Result<OnboardingState, OnboardingError> {
        let current = self.state();
        if current != OnboardingState::Prompting {
            return Err(OnboardingError::NotPrompting(current));
        }

        let (name, dont_show_again) = match choice {
            WelcomeChoice::SetName {
                name,
                dont_show_again,
            } => (
                AuthorName::parse(&name).map_err(IdentityError::from)?,
                dont_show_again,
            ),
            WelcomeChoice::ContinueAnonymously { dont_show_again } => {
                (AuthorName::anonymous(), dont_show_again)
            }
        };

        let update = self.store.begin_update().await?;
        let mut next = update.current().clone();
        next.name = Some(name.clone());
        next.initialized = true;
        next.welcome_completed = true;
        if dont_show_again {
            next.welcome_suppressed = true;
        }
        update.commit(next).await;

        info!(
            target = "inkpost::onboarding",
            name = %name,
            dont_show_again,
            "welcome completed"
        );
        Ok(self.transition(OnboardingState::Resolved))
    }

    fn transition(&self, next: OnboardingState) -> OnboardingState {
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!(
                target = "inkpost::onboarding",
                from = ?previous,
                to = ?next,
                "onboarding transition"
            );
        }
        next
    }
}

/// A hydrated identity needs the welcome prompt only while nobody has named it or
/// dismissed the prompt.
fn needs_welcome(identity: &AuthorIdentity) -> bool {
    identity.initialized
        && !identity.has_name()
        && !identity.welcome_completed
        && !identity.welcome_suppressed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::identity::testing::MemoryStorage;
    use crate::domain::author::ANONYMOUS_AUTHOR;

    const FAST: Duration = Duration::from_millis(5);

    fn machine(store: Arc<IdentityStore>) -> OnboardingMachine {
        OnboardingMachine::new(store).with_delay(FAST)
    }

    async fn hydrated_store(storage: Arc<MemoryStorage>) -> Arc<IdentityStore> {
        let store = Arc::new(IdentityStore::new(storage));
        store.hydrate().await;
        store
    }

    #[tokio::test]
    async fn fresh_device_reaches_prompting() {
        let store = hydrated_store(Arc::new(MemoryStorage::default())).await;
        let machine = machine(store.clone());

        assert_eq!(machine.state(), OnboardingState::Unknown);
        let state = machine.run().await.expect("run");

        assert_eq!(state, OnboardingState::Prompting);
        let identity = store.identity().await.expect("hydrated");
        assert!(identity.initialized);
        assert!(identity.name.is_none());
    }

    #[tokio::test]
    async fn anonymous_with_suppression_resolves_for_good() {
        let storage = Arc::new(MemoryStorage::default());
        let store = hydrated_store(storage.clone()).await;
        let first = machine(store.clone());
        assert_eq!(first.run().await.expect("run"), OnboardingState::Prompting);

        let state = first
            .resolve(WelcomeChoice::ContinueAnonymously {
                dont_show_again: true,
            })
            .await
            .expect("resolve");
        assert_eq!(state, OnboardingState::Resolved);

        let identity = store.identity().await.expect("hydrated");
        assert_eq!(identity.display_name(), ANONYMOUS_AUTHOR);
        assert!(identity.has_name());
        assert!(identity.welcome_suppressed);

        // A later session on the same device, with its own session guard.
        let next_store = hydrated_store(storage).await;
        let second = machine(next_store);
        assert_eq!(second.run().await.expect("run"), OnboardingState::Resolved);
    }

    #[tokio::test]
    async fn setting_a_name_completes_welcome() {
        let store = hydrated_store(Arc::new(MemoryStorage::default())).await;
        let machine = machine(store.clone());
        machine.run().await.expect("run");

        machine
            .resolve(WelcomeChoice::SetName {
                name: "  Ada ".into(),
                dont_show_again: false,
            })
            .await
            .expect("resolve");

        let identity = store.identity().await.expect("hydrated");
        assert_eq!(identity.display_name(), "Ada");
        assert!(identity.welcome_completed);
        assert!(!identity.welcome_suppressed);
    }

    #[tokio::test]
    async fn invalid_name_keeps_prompt_open() {
        let store = hydrated_store(Arc::new(MemoryStorage::default())).await;
        let machine = machine(store.clone());
        machine.run().await.expect("run");

        let err = machine
            .resolve(WelcomeChoice::SetName {
                name: "   ".into(),
                dont_show_again: true,
            })
            .await
            .expect_err("invalid");

        assert!(matches!(err, OnboardingError::Identity(IdentityError::Validation(_))));
        assert_eq!(machine.state(), OnboardingState::Prompting);
        let identity = store.identity().await.expect("hydrated");
        assert!(!identity.welcome_suppressed);
    }

    #[tokio::test]
    async fn unavailable_storage_stays_unknown() {
        let store = hydrated_store(Arc::new(MemoryStorage::failing_loads())).await;
        let machine = machine(store);

        assert_eq!(machine.run().await.expect("run"), OnboardingState::Unknown);
        let err = machine
            .resolve(WelcomeChoice::ContinueAnonymously {
                dont_show_again: false,
            })
            .await
            .expect_err("no prompt");
        assert!(matches!(
            err,
            OnboardingError::NotPrompting(OnboardingState::Unknown)
        ));
    }

    #[tokio::test]
    async fn pending_hydration_never_prompts() {
        let store = Arc::new(IdentityStore::new(Arc::new(MemoryStorage::default())));
        let machine = Arc::new(machine(store));

        let run = {
            let machine = machine.clone();
            tokio::spawn(async move { machine.run().await })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(machine.state(), OnboardingState::Unknown);
        assert!(!run.is_finished());
        run.abort();
    }

    #[tokio::test]
    async fn prompt_opens_once_per_session() {
        let storage = Arc::new(MemoryStorage::default());
        let guard = SessionGuard::new();

        let store = hydrated_store(storage.clone()).await;
        let first = machine(store.clone()).with_session_guard(guard.clone());
        assert_eq!(first.run().await.expect("run"), OnboardingState::Prompting);
        assert!(guard.has_fired());

        // The flags still say "new visitor", but this process already prompted.
        let second = machine(store).with_session_guard(guard);
        assert_eq!(second.run().await.expect("run"), OnboardingState::AnonymousNew);
    }

    #[tokio::test]
    async fn run_cancelled_during_delay_leaves_guard_unclaimed() {
        let store = hydrated_store(Arc::new(MemoryStorage::default())).await;
        let guard = SessionGuard::new();
        let machine = OnboardingMachine::new(store)
            .with_delay(Duration::from_millis(50))
            .with_session_guard(guard.clone());

        let cancelled = tokio::time::timeout(Duration::from_millis(10), machine.run()).await;
        assert!(cancelled.is_err());
        assert_eq!(machine.state(), OnboardingState::AnonymousNew);
        assert!(!guard.has_fired());

        assert_eq!(machine.run().await.expect("run"), OnboardingState::Prompting);
        assert!(guard.has_fired());
    }

    #[tokio::test]
    async fn suppressed_prompt_resolves_immediately() {
        let store = hydrated_store(Arc::new(MemoryStorage::default())).await;
        store.set_welcome_suppressed(true).await.expect("flag");

        let machine = machine(store);
        assert_eq!(machine.run().await.expect("run"), OnboardingState::Resolved);
    }

    #[tokio::test]
    async fn named_identity_skips_welcome() {
        let store = hydrated_store(Arc::new(MemoryStorage::default())).await;
        store.set_name("Grace").await.expect("valid");

        let machine = machine(store);
        assert_eq!(machine.run().await.expect("run"), OnboardingState::Resolved);
    }

    #[tokio::test]
    async fn prompt_waits_for_the_delay() {
        let store = hydrated_store(Arc::new(MemoryStorage::default())).await;
        let machine = Arc::new(
            OnboardingMachine::new(store).with_delay(Duration::from_millis(200)),
        );
        let mut states = machine.subscribe();

        let run = {
            let machine = machine.clone();
            tokio::spawn(async move { machine.run().await })
        };

        states
            .wait_for(|state| *state == OnboardingState::AnonymousNew)
            .await
            .expect("state channel open");
        assert_eq!(machine.state(), OnboardingState::AnonymousNew);

        let state = run.await.expect("join").expect("run");
        assert_eq!(state, OnboardingState::Prompting);
    }

    #[tokio::test]
    async fn resolve_outside_prompt_is_rejected() {
        let store = hydrated_store(Arc::new(MemoryStorage::default())).await;
        let machine = machine(store);
        let err = machine
            .resolve(WelcomeChoice::ContinueAnonymously {
                dont_show_again: false,
            })
            .await
            .expect_err("not prompting");
        assert!(matches!(err, OnboardingError::NotPrompting(_)));
    }
}
