use inkpost::application::identity::{
    OnboardingMachine, OnboardingState, Readiness, RenameError, RenameOutcome, RenameReconciler,
    WelcomeChoice,
};
use inkpost::domain::author::AuthorIdentity;
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::args::{NameCmd, WelcomeArgs};
use crate::client::{CliError, Ctx};
use crate::print::print_json;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityView {
    pub readiness: &'static str,
    pub persistent: bool,
    pub author_name: Option<String>,
    pub display_name: String,
    pub initialized: bool,
    pub welcome_suppressed: bool,
    pub welcome_completed: bool,
}

impl IdentityView {
    fn new(readiness: Readiness, persistent: bool, identity: &AuthorIdentity) -> Self {
        Self {
            readiness: readiness_label(readiness),
            persistent,
            author_name: identity.name.as_ref().map(|name| name.as_str().to_string()),
            display_name: identity.display_name().to_string(),
            initialized: identity.initialized,
            welcome_suppressed: identity.welcome_suppressed,
            welcome_completed: identity.welcome_completed,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeView {
    pub state: &'static str,
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameView {
    pub outcome: &'static str,
    pub name: String,
    pub updated_count: u64,
}

impl From<&RenameOutcome> for RenameView {
    fn from(outcome: &RenameOutcome) -> Self {
        let label = match outcome {
            RenameOutcome::FirstName { .. } => "first_name",
            RenameOutcome::Unchanged { .. } => "unchanged",
            RenameOutcome::Relabelled { .. } => "relabelled",
        };
        Self {
            outcome: label,
            name: outcome.name().as_str().to_string(),
            updated_count: outcome.updated_count(),
        }
    }
}

pub async fn whoami(ctx: &Ctx) -> Result<IdentityView, CliError> {
    let identity = ctx
        .store
        .identity()
        .await
        .unwrap_or_default();
    let view = IdentityView::new(
        ctx.store.readiness(),
        ctx.store.is_persistent().await,
        &identity,
    );
    print_json(&view)?;
    Ok(view)
}

/// Drive onboarding; when the prompt opens, answer it from the flags or from `input`.
pub async fn welcome<R>(ctx: &Ctx, args: WelcomeArgs, input: &mut R) -> Result<WelcomeView, CliError>
where
    R: AsyncBufRead + Unpin,
{
    let machine = OnboardingMachine::new(ctx.store.clone()).with_delay(ctx.welcome_delay);
    let mut state = machine.run().await?;

    if state == OnboardingState::Prompting {
        let choice = match (args.name, args.anonymous) {
            (Some(name), _) => WelcomeChoice::SetName {
                name,
                dont_show_again: args.dont_show_again,
            },
            (None, true) => WelcomeChoice::ContinueAnonymously {
                dont_show_again: args.dont_show_again,
            },
            (None, false) => prompt_for_choice(input, args.dont_show_again).await?,
        };
        state = machine.resolve(choice).await?;
    }

    let view = WelcomeView {
        state: state_label(state),
        display_name: ctx
            .store
            .identity()
            .await
            .map(|identity| identity.display_name().to_string()),
    };
    print_json(&view)?;
    Ok(view)
}

async fn prompt_for_choice<R>(input: &mut R, dont_show_again: bool) -> Result<WelcomeChoice, CliError>
where
    R: AsyncBufRead + Unpin,
{
    eprint!("Welcome! Enter your name (leave blank to stay anonymous): ");
    let mut line = String::new();
    input
        .read_line(&mut line)
        .await
        .map_err(|err| CliError::InvalidInput(format!("failed to read answer: {err}")))?;

    let name = line.trim();
    if name.is_empty() {
        Ok(WelcomeChoice::ContinueAnonymously { dont_show_again })
    } else {
        Ok(WelcomeChoice::SetName {
            name: name.to_string(),
            dont_show_again,
        })
    }
}

pub async fn handle_name(ctx: &Ctx, cmd: NameCmd) -> Result<(), CliError> {
    match cmd {
        NameCmd::Set { name } => set_name(ctx, &name).await.map(|_| ()),
        NameCmd::ResetWelcome => {
            ctx.store.reset_welcome().await?;
            whoami(ctx).await.map(|_| ())
        }
    }
}

/// First and unchanged names commit locally; only a real rename needs `--site`.
pub async fn set_name(ctx: &Ctx, name: &str) -> Result<RenameView, CliError> {
    let reconciler = match ctx.content_client() {
        Some(content) => RenameReconciler::new(ctx.store.clone(), content),
        None => RenameReconciler::offline(ctx.store.clone()),
    }
    .with_timeout(ctx.timeout);
    let outcome = reconciler.rename_author(name).await.map_err(|err| match err {
        RenameError::Offline { .. } => CliError::MissingSite,
        other => CliError::Rename(other),
    })?;
    let view = RenameView::from(&outcome);
    print_json(&view)?;
    Ok(view)
}

fn readiness_label(readiness: Readiness) -> &'static str {
    match readiness {
        Readiness::Pending => "pending",
        Readiness::Ready => "ready",
        Readiness::Unavailable => "unavailable",
    }
}

fn state_label(state: OnboardingState) -> &'static str {
    match state {
        OnboardingState::Unknown => "unknown",
        OnboardingState::AnonymousNew => "anonymous_new",
        OnboardingState::Prompting => "prompting",
        OnboardingState::Resolved => "resolved",
    }
}
