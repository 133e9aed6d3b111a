//! Continue-on-failure step runner.
//!
//! Every step after validation is wrapped in [`attempt`] or
//! [`attempt_with`]: the action runs, a failure is written to the
//! [`Journal`] (and so to the log and the caller's event callback), and the
//! state that went in comes back out. Neither function returns an error.

use std::fmt::Display;
use std::future::Future;

use super::event::{Journal, Step};

/// Run `action` as `step`, returning `state` unchanged either way.
///
/// `message` describes the success in the step report.
pub async fn attempt<S, T, E, F>(
    journal: &mut Journal<'_>,
    step: Step,
    state: S,
    action: F,
    message: impl Into<String>,
) -> S
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    let message = message.into();
    attempt_with(journal, step, state, action, move |state, _| (state, message)).await
}

/// Run `action` as `step`; on success fold its output into `state`.
///
/// `merge` receives the incoming state and the action's output and returns
/// the new state plus a success message. On failure `merge` is not called
/// and the incoming state is returned as-is.
pub async fn attempt_with<S, T, E, F, M>(
    journal: &mut Journal<'_>,
    step: Step,
    state: S,
    action: F,
    merge: M,
) -> S
where
    F: Future<Output = Result<T, E>>,
    E: Display,
    M: FnOnce(S, T) -> (S, String),
{
    journal.start(step);
    match action.await {
        Ok(output) => {
            let (state, message) = merge(state, output);
            journal.succeed(step, message);
            state
        }
        Err(err) => {
            journal.fail(step, &err);
            state
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::event::{PipelineEvent, StepOutcome};

    #[tokio::test]
    async fn failing_action_returns_passthrough_unchanged() {
        let mut journal = Journal::silent();
        let state = ("1.2.3".to_string(), "develop".to_string());

        let out = attempt(
            &mut journal,
            Step::PushTags,
            state.clone(),
            async { Err::<(), _>("remote hung up") },
            "pushed",
        )
        .await;

        assert_eq!(out, state);
        assert_eq!(
            journal.last(Step::PushTags),
            Some(&StepOutcome::Failed {
                error: "remote hung up".into()
            })
        );
    }

    #[tokio::test]
    async fn merge_is_skipped_on_failure() {
        let mut journal = Journal::silent();
        let out = attempt_with(
            &mut journal,
            Step::CreateBranch,
            vec!["a"],
            async { Err::<&str, _>("branch exists") },
            |mut v, extra| {
                v.push(extra);
                (v, "created".into())
            },
        )
        .await;

        assert_eq!(out, vec!["a"]);
    }

    #[tokio::test]
    async fn merge_folds_output_on_success() {
        let mut journal = Journal::silent();
        let out = attempt_with(
            &mut journal,
            Step::CreateBranch,
            vec!["a"],
            async { Ok::<_, String>("b") },
            |mut v, extra| {
                v.push(extra);
                (v, format!("added {extra}"))
            },
        )
        .await;

        assert_eq!(out, vec!["a", "b"]);
        assert_eq!(
            journal.last(Step::CreateBranch),
            Some(&StepOutcome::Success {
                message: "added b".into()
            })
        );
    }

    #[tokio::test]
    async fn emits_start_then_completion() {
        let mut events = Vec::new();
        {
            let mut journal = Journal::new(|e: &PipelineEvent| events.push(e.clone()));
            attempt(
                &mut journal,
                Step::Pull,
                (),
                async { Ok::<_, String>(()) },
                "pulled",
            )
            .await;
        }

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], PipelineEvent::StepStarted(Step::Pull));
        assert!(matches!(
            events[1],
            PipelineEvent::StepCompleted(Step::Pull, StepOutcome::Success { .. })
        ));
    }
}
