use std::time::Duration;

use crate::client::answers::AnswerSheet;
use crate::client::timer::{Countdown, TimerState};
use crate::client::{ClientError, QuizBackend};
use crate::dto::quiz_dto::{AttemptQuestion, SubmitQuizResponse, ViewAnswersResponse};

/// Fallback when the load response carries no usable duration: 10 minutes.
pub const DEFAULT_DURATION_SECS: u32 = 600;

/// Serializes the two submission triggers (manual click, timer expiry) so
/// at most one request is ever in flight and at most one succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubmissionState {
    Idle,
    InFlight,
    Done,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Submitted(SubmitQuizResponse),
    /// A submission already succeeded or is in flight; this trigger was
    /// debounced and no request was made.
    AlreadySubmitted,
}

/// One user's pass through a quiz: owns the question list, the answer
/// sheet, the countdown, and the submission guard. Dropping the session
/// (or the future driving [`run_countdown`](Self::run_countdown)) tears
/// everything down without a stale auto-submission firing.
pub struct AttemptSession<B> {
    backend: B,
    quiz_id: i64,
    questions: Vec<AttemptQuestion>,
    sheet: AnswerSheet,
    countdown: Countdown,
    submission: SubmissionState,
}

impl<B: QuizBackend> AttemptSession<B> {
    pub fn new(backend: B, quiz_id: i64) -> Self {
        Self {
            backend,
            quiz_id,
            questions: Vec::new(),
            sheet: AnswerSheet::new(),
            countdown: Countdown::new(),
            submission: SubmissionState::Idle,
        }
    }

    /// Fetch the question set and start the countdown immediately. The
    /// authored duration is minutes; absent or non-positive values fall
    /// back to [`DEFAULT_DURATION_SECS`].
    pub async fn load(&mut self) -> Result<&[AttemptQuestion], ClientError> {
        let payload = self.backend.load_quiz(self.quiz_id).await?;
        let duration_secs = payload
            .time_duration
            .filter(|minutes| *minutes > 0)
            .map(|minutes| minutes as u32 * 60)
            .unwrap_or(DEFAULT_DURATION_SECS);
        self.questions = payload.questions;
        self.countdown.start(duration_secs);
        Ok(&self.questions)
    }

    pub fn select(&mut self, question_id: i64, option: i32) {
        self.sheet.select(question_id, option);
    }

    pub fn questions(&self) -> &[AttemptQuestion] {
        &self.questions
    }

    pub fn sheet(&self) -> &AnswerSheet {
        &self.sheet
    }

    pub fn remaining_secs(&self) -> u32 {
        self.countdown.remaining_secs()
    }

    pub fn timer_state(&self) -> TimerState {
        self.countdown.state()
    }

    /// Tear down the attempt: stops the countdown so no automatic
    /// submission can fire afterwards.
    pub fn cancel(&mut self) {
        self.countdown.cancel();
    }

    /// Manual submission. Cancels the countdown on success.
    pub async fn submit(&mut self) -> Result<SubmitOutcome, ClientError> {
        self.submit_guarded().await
    }

    /// Fetch the persisted score and per-question breakdown for the results
    /// view. Read-only; fails with `NotFound` until an attempt was scored.
    pub async fn view_results(&self) -> Result<ViewAnswersResponse, ClientError> {
        self.backend.view_answers(self.quiz_id).await
    }

    /// Drive the countdown to completion: one tick per wall-clock second.
    /// On expiry the current sheet (possibly empty) is auto-submitted.
    /// Returns `None` when the countdown was cancelled instead; dropping
    /// the future cancels ticking outright.
    pub async fn run_countdown(&mut self) -> Result<Option<SubmitOutcome>, ClientError> {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        // The first tick of a tokio interval resolves immediately.
        interval.tick().await;

        loop {
            match self.countdown.state() {
                TimerState::Running => {}
                TimerState::Expired => {
                    return self.submit_guarded().await.map(Some);
                }
                TimerState::Idle | TimerState::Cancelled => return Ok(None),
            }

            interval.tick().await;
            if self.countdown.tick() == TimerState::Expired {
                tracing::info!(quiz_id = self.quiz_id, "Countdown expired; auto-submitting");
                return self.submit_guarded().await.map(Some);
            }
        }
    }

    async fn submit_guarded(&mut self) -> Result<SubmitOutcome, ClientError> {
        match self.submission {
            SubmissionState::InFlight | SubmissionState::Done => {
                return Ok(SubmitOutcome::AlreadySubmitted);
            }
            SubmissionState::Idle => {}
        }

        self.submission = SubmissionState::InFlight;
        match self.backend.submit_quiz(self.quiz_id, self.sheet.as_map()).await {
            Ok(result) => {
                self.submission = SubmissionState::Done;
                self.countdown.cancel();
                self.sheet.clear();
                Ok(SubmitOutcome::Submitted(result))
            }
            Err(err) => {
                // Failed submissions keep the sheet so the user can retry;
                // an expired countdown stays expired.
                self.submission = SubmissionState::Idle;
                tracing::warn!(quiz_id = self.quiz_id, error = %err, "Submission failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::quiz_dto::{AttemptQuizResponse, ViewAnswersResponse};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Counts submissions and can fail the first N of them.
    struct FakeBackend {
        time_duration: Option<i32>,
        submit_calls: Arc<AtomicUsize>,
        failures_remaining: AtomicUsize,
    }

    impl FakeBackend {
        fn new(time_duration: Option<i32>) -> Self {
            Self {
                time_duration,
                submit_calls: Arc::new(AtomicUsize::new(0)),
                failures_remaining: AtomicUsize::new(0),
            }
        }

        fn failing_once(time_duration: Option<i32>) -> Self {
            let backend = Self::new(time_duration);
            backend.failures_remaining.store(1, Ordering::SeqCst);
            backend
        }

        fn submit_calls(&self) -> Arc<AtomicUsize> {
            self.submit_calls.clone()
        }
    }

    #[async_trait]
    impl QuizBackend for FakeBackend {
        async fn load_quiz(&self, quiz_id: i64) -> Result<AttemptQuizResponse, ClientError> {
            Ok(AttemptQuizResponse {
                quiz_id,
                questions: vec![AttemptQuestion {
                    id: 1,
                    question_statement: "2 + 2?".to_string(),
                    option1: "3".to_string(),
                    option2: "4".to_string(),
                    option3: "5".to_string(),
                    option4: "6".to_string(),
                }],
                time_duration: self.time_duration,
            })
        }

        async fn submit_quiz(
            &self,
            _quiz_id: i64,
            answers: &HashMap<i64, i32>,
        ) -> Result<SubmitQuizResponse, ClientError> {
            self.submit_calls.fetch_add(1, Ordering::SeqCst);
            if self
                .failures_remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(ClientError::Server("boom".to_string()));
            }
            Ok(SubmitQuizResponse {
                score: if answers.get(&1) == Some(&2) { 100.0 } else { 0.0 },
                total_questions: 1,
                correct_answers: usize::from(answers.get(&1) == Some(&2)),
                score_id: 1,
                questions: Vec::new(),
                message: "ok".to_string(),
            })
        }

        async fn view_answers(&self, quiz_id: i64) -> Result<ViewAnswersResponse, ClientError> {
            Ok(ViewAnswersResponse {
                quiz_id,
                score: 100.0,
                attempt_date: chrono::DateTime::UNIX_EPOCH,
                remarks: None,
                questions: Vec::new(),
            })
        }
    }

    #[tokio::test]
    async fn load_seeds_timer_from_duration_minutes() {
        let mut session = AttemptSession::new(FakeBackend::new(Some(5)), 1);
        session.load().await.expect("load");
        assert_eq!(session.remaining_secs(), 300);
        assert_eq!(session.timer_state(), TimerState::Running);
    }

    #[tokio::test]
    async fn missing_duration_defaults_to_ten_minutes() {
        let mut session = AttemptSession::new(FakeBackend::new(None), 1);
        session.load().await.expect("load");
        assert_eq!(session.remaining_secs(), DEFAULT_DURATION_SECS);
    }

    #[tokio::test]
    async fn non_positive_duration_defaults_to_ten_minutes() {
        let mut session = AttemptSession::new(FakeBackend::new(Some(0)), 1);
        session.load().await.expect("load");
        assert_eq!(session.remaining_secs(), DEFAULT_DURATION_SECS);
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_auto_submits_the_current_sheet() {
        let backend = FakeBackend::new(Some(1));
        let calls = backend.submit_calls();
        let mut session = AttemptSession::new(backend, 1);
        session.load().await.expect("load");
        session.select(1, 2);

        let outcome = session.run_countdown().await.expect("countdown");
        match outcome {
            Some(SubmitOutcome::Submitted(result)) => assert_eq!(result.score, 100.0),
            other => panic!("expected submission, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(session.sheet().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_after_manual_submit_is_debounced_to_one_request() {
        let backend = FakeBackend::new(Some(1));
        let calls = backend.submit_calls();
        let mut session = AttemptSession::new(backend, 1);
        session.load().await.expect("load");
        session.select(1, 2);

        let manual = session.submit().await.expect("submit");
        assert!(matches!(manual, SubmitOutcome::Submitted(_)));

        // The countdown was cancelled by the successful submit, so the
        // expiry trigger never fires a second request.
        let auto = session.run_countdown().await.expect("countdown");
        assert!(auto.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn repeat_manual_submit_is_debounced() {
        let backend = FakeBackend::new(Some(1));
        let calls = backend.submit_calls();
        let mut session = AttemptSession::new(backend, 1);
        session.load().await.expect("load");

        assert!(matches!(
            session.submit().await.expect("first"),
            SubmitOutcome::Submitted(_)
        ));
        assert!(matches!(
            session.submit().await.expect("second"),
            SubmitOutcome::AlreadySubmitted
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_submit_preserves_answers_for_retry() {
        let backend = FakeBackend::failing_once(Some(1));
        let calls = backend.submit_calls();
        let mut session = AttemptSession::new(backend, 1);
        session.load().await.expect("load");
        session.select(1, 2);

        let err = session.submit().await.expect_err("should fail");
        assert!(matches!(err, ClientError::Server(_)));
        assert_eq!(session.sheet().selected(1), Some(2));

        let retry = session.submit().await.expect("retry");
        assert!(matches!(retry, SubmitOutcome::Submitted(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn results_read_is_idempotent() {
        let mut session = AttemptSession::new(FakeBackend::new(Some(1)), 1);
        session.load().await.expect("load");
        session.submit().await.expect("submit");

        let first = session.view_results().await.expect("first read");
        let second = session.view_results().await.expect("second read");
        assert_eq!(first.score, second.score);
        assert_eq!(first.attempt_date, second.attempt_date);
        assert_eq!(first.questions.len(), second.questions.len());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_session_never_auto_submits() {
        let backend = FakeBackend::new(Some(1));
        let calls = backend.submit_calls();
        let mut session = AttemptSession::new(backend, 1);
        session.load().await.expect("load");
        session.cancel();

        let outcome = session.run_countdown().await.expect("countdown");
        assert!(outcome.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
