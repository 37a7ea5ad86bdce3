//! Author identity flow: the device-local store, the rename reconciliation and
//! the first-visit onboarding machine.
//!
//! Every component receives the [`IdentityStore`] explicitly; there is no global
//! instance.

mod authoring;
mod onboarding;
mod reconcile;
mod store;

pub use authoring::{DEFAULT_PUBLISH_TIMEOUT, PostAuthoring, PublishError};
pub use onboarding::{
    DEFAULT_WELCOME_DELAY, OnboardingError, OnboardingMachine, OnboardingState, SessionGuard,
    WelcomeChoice,
};
pub use reconcile::{
    DEFAULT_RECONCILE_TIMEOUT, ReconcileFailure, RenameError, RenameOutcome, RenameReconciler,
};
pub use store::{IDENTITY_STORAGE_KEY, IdentityError, IdentityStore, Readiness};

#[cfg(test)]
pub(crate) mod testing;
