use chrono::{DateTime, Utc};

use exam_core::model::{AnswerSheet, Exam, ExamResultId, OptionLabel, Question, UserId};
use exam_core::scoring::{Score, score_exam};

use crate::error::SessionError;
use crate::session::settings::SessionSettings;

//
// ─── PHASE ─────────────────────────────────────────────────────────────────────
//

/// Where a session stands between entry and disposal.
///
/// `Finished` and `Submitted` are terminal for answering: no path leads back
/// to `Navigating` once scoring has happened. The two confirmation phases
/// model the irrevocable finish dialog as machine states rather than UI
/// booleans so the deadline precedence rule is checkable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Normal answering: navigation and option selection are honored.
    Navigating,
    /// First "are you sure?" step of the finish protocol.
    AwaitingPreConfirm,
    /// Second, final confirmation step.
    AwaitingFinalConfirm,
    /// The clock ran out; navigation is frozen while a short notice shows.
    TimeExpiredGrace,
    /// Scored exactly once; awaiting submission (retryable).
    Finished,
    /// Result persisted; the session is done.
    Submitted,
}

impl Phase {
    /// Phases in which the test-taker still interacts with questions.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(
            self,
            Phase::Navigating | Phase::AwaitingPreConfirm | Phase::AwaitingFinalConfirm
        )
    }
}

//
// ─── EVENTS ────────────────────────────────────────────────────────────────────
//

/// Triggers a host can queue against a session.
///
/// Processing is strictly one event at a time; an event with no defined edge
/// from the current phase is a silent no-op so stale UI events cannot corrupt
/// a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    SelectOption(OptionLabel),
    Advance,
    Retreat,
    JumpTo(usize),
    RequestFinish,
    Confirm,
    Cancel,
    Tick,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One test-taker's run through a live exam snapshot.
///
/// The session owns an immutable copy of the exam taken at entry, a fresh
/// answer sheet, and the only countdown for this run. The host delivers a
/// `Tick` once per wall-clock second; the engine itself never reads a clock,
/// which keeps every transition deterministic under test.
///
/// Deadline precedence: every user trigger first checks the remaining time
/// and, at zero, forces the phase toward `TimeExpiredGrace` before the
/// trigger is considered — leaving a confirmation dialog open cannot stall
/// the deadline.
#[derive(Debug, Clone)]
pub struct ExamSession {
    user_id: UserId,
    exam: Exam,
    current: usize,
    answers: AnswerSheet,
    remaining_seconds: u32,
    grace_remaining: u32,
    phase: Phase,
    score: Option<Score>,
    submitting: bool,
    result_id: Option<ExamResultId>,
    started_at: DateTime<Utc>,
    settings: SessionSettings,
}

impl ExamSession {
    /// Open a session over a snapshot of the given exam.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyExam` when the exam has no questions.
    pub fn new(
        user_id: UserId,
        exam: Exam,
        settings: SessionSettings,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if exam.question_count() == 0 {
            return Err(SessionError::EmptyExam);
        }
        let remaining_seconds = exam.time_limit_seconds();

        Ok(Self {
            user_id,
            exam,
            current: 0,
            answers: AnswerSheet::new(),
            remaining_seconds,
            grace_remaining: 0,
            phase: Phase::Navigating,
            score: None,
            submitting: false,
            result_id: None,
            started_at,
            settings,
        })
    }

    //
    // ─── ACCESSORS ─────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// The exam snapshot this session runs against.
    #[must_use]
    pub fn exam(&self) -> &Exam {
        &self.exam
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.exam.question_at(self.current)
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    /// Seconds left of the time's-up notice; zero outside `TimeExpiredGrace`.
    #[must_use]
    pub fn grace_remaining(&self) -> u32 {
        self.grace_remaining
    }

    /// The computed score, present from `Finished` onward.
    #[must_use]
    pub fn score(&self) -> Option<Score> {
        self.score
    }

    #[must_use]
    pub fn result_id(&self) -> Option<ExamResultId> {
        self.result_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished | Phase::Submitted)
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.phase == Phase::Submitted
    }

    //
    // ─── TRIGGERS ──────────────────────────────────────────────────────────
    //

    /// Apply one queued trigger.
    pub fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::SelectOption(label) => self.select_option(label),
            SessionEvent::Advance => self.advance(),
            SessionEvent::Retreat => self.retreat(),
            SessionEvent::JumpTo(index) => self.jump_to(index),
            SessionEvent::RequestFinish => self.request_finish(),
            SessionEvent::Confirm => self.confirm(),
            SessionEvent::Cancel => self.cancel(),
            SessionEvent::Tick => self.tick(),
        }
    }

    /// Record the selection for the question currently in view.
    ///
    /// Honored only while `Navigating` and only for labels the question
    /// actually offers; reselecting the same label changes nothing.
    pub fn select_option(&mut self, label: OptionLabel) {
        self.enforce_deadline();
        if self.phase != Phase::Navigating {
            return;
        }
        let Some(question) = self.exam.question_at(self.current) else {
            return;
        };
        if !question.offers(label) {
            return;
        }
        self.answers.select(question.id(), label);
    }

    /// Move to the next question; from the last question, open the finish
    /// protocol instead.
    pub fn advance(&mut self) {
        self.enforce_deadline();
        if self.phase != Phase::Navigating {
            return;
        }
        if self.current + 1 < self.exam.question_count() {
            self.current += 1;
        } else {
            self.phase = Phase::AwaitingPreConfirm;
        }
    }

    /// Move to the previous question; a no-op at the first one.
    pub fn retreat(&mut self) {
        self.enforce_deadline();
        if self.phase != Phase::Navigating {
            return;
        }
        if self.current > 0 {
            self.current -= 1;
        }
    }

    /// Jump straight to a question by position (the sidebar palette).
    /// Out-of-range positions are ignored.
    pub fn jump_to(&mut self, index: usize) {
        self.enforce_deadline();
        if self.phase != Phase::Navigating {
            return;
        }
        if index < self.exam.question_count() {
            self.current = index;
        }
    }

    /// Open the finish protocol from anywhere in the question list.
    pub fn request_finish(&mut self) {
        self.enforce_deadline();
        if self.phase != Phase::Navigating {
            return;
        }
        self.phase = Phase::AwaitingPreConfirm;
    }

    /// Step the finish protocol forward: pre-confirm moves to the final
    /// dialog, the final confirmation scores the session.
    pub fn confirm(&mut self) {
        self.enforce_deadline();
        match self.phase {
            Phase::AwaitingPreConfirm => self.phase = Phase::AwaitingFinalConfirm,
            Phase::AwaitingFinalConfirm => self.finish(),
            _ => {}
        }
    }

    /// Step the finish protocol back: the final dialog returns to
    /// pre-confirm, pre-confirm returns to answering.
    pub fn cancel(&mut self) {
        self.enforce_deadline();
        match self.phase {
            Phase::AwaitingFinalConfirm => self.phase = Phase::AwaitingPreConfirm,
            Phase::AwaitingPreConfirm => self.phase = Phase::Navigating,
            _ => {}
        }
    }

    /// One second of wall-clock time.
    ///
    /// Dialogs and focus loss never pause the countdown; only `Submitted`
    /// stops it. Arithmetic saturates, so remaining time can never go
    /// negative however many ticks arrive.
    pub fn tick(&mut self) {
        if self.phase == Phase::Submitted {
            return;
        }
        if self.phase == Phase::TimeExpiredGrace {
            self.grace_remaining = self.grace_remaining.saturating_sub(1);
            if self.grace_remaining == 0 {
                self.finish();
            }
            return;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        self.enforce_deadline();
    }

    //
    // ─── INTERNALS ─────────────────────────────────────────────────────────
    //

    /// Force the phase toward `TimeExpiredGrace` once the countdown is
    /// exhausted, whatever dialog is open. Called before every user trigger
    /// so expiry always wins a race against queued input.
    fn enforce_deadline(&mut self) {
        if self.remaining_seconds == 0 && self.phase.is_active() {
            self.phase = Phase::TimeExpiredGrace;
            self.grace_remaining = self.settings.grace_seconds();
        }
    }

    /// Score the session. Runs at most once; the phase moves to `Finished`
    /// and the score is retained for submission.
    fn finish(&mut self) {
        if self.score.is_some() {
            return;
        }
        self.score = Some(score_exam(&self.exam, &self.answers));
        self.grace_remaining = 0;
        self.phase = Phase::Finished;
    }

    /// Claim the single submission slot. Returns false when a submission is
    /// already pending or the session is not `Finished`.
    pub(crate) fn begin_submission(&mut self) -> bool {
        if self.phase != Phase::Finished || self.submitting {
            return false;
        }
        self.submitting = true;
        true
    }

    /// Release the submission slot after a persistence failure; the score
    /// stays retained and the phase stays `Finished` so the host can retry.
    pub(crate) fn abort_submission(&mut self) {
        self.submitting = false;
    }

    /// Seal the session after the result has been persisted.
    pub(crate) fn mark_submitted(&mut self, result_id: ExamResultId) {
        self.submitting = false;
        self.result_id = Some(result_id);
        self.phase = Phase::Submitted;
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{ExamId, QuestionId};
    use exam_core::time::fixed_now;
    use std::collections::BTreeMap;

    fn question(id: u64, correct: OptionLabel) -> Question {
        let mut options = BTreeMap::new();
        options.insert(OptionLabel::A, "a".to_owned());
        options.insert(OptionLabel::B, "b".to_owned());
        options.insert(OptionLabel::C, "c".to_owned());
        Question::new(QuestionId::new(id), format!("Q{id}"), None, options, correct).unwrap()
    }

    fn exam(question_count: u64, time_limit_minutes: u32) -> Exam {
        let questions = (1..=question_count)
            .map(|id| question(id, OptionLabel::A))
            .collect();
        Exam::new(
            ExamId::new(1),
            "Engine test",
            "",
            None,
            time_limit_minutes,
            true,
            questions,
        )
        .unwrap()
    }

    fn session(question_count: u64, time_limit_minutes: u32) -> ExamSession {
        ExamSession::new(
            UserId::new(7),
            exam(question_count, time_limit_minutes),
            SessionSettings::default(),
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn refuses_empty_exam() {
        let empty = Exam::new(ExamId::new(1), "Empty", "", None, 5, true, Vec::new()).unwrap();
        let err = ExamSession::new(
            UserId::new(1),
            empty,
            SessionSettings::default(),
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(err, SessionError::EmptyExam));
    }

    #[test]
    fn seeds_countdown_from_time_limit() {
        let session = session(3, 5);
        assert_eq!(session.remaining_seconds(), 300);
        assert_eq!(session.phase(), Phase::Navigating);
    }

    #[test]
    fn navigation_stays_in_bounds() {
        let mut session = session(3, 5);

        session.retreat();
        assert_eq!(session.current_index(), 0);

        session.advance();
        session.advance();
        assert_eq!(session.current_index(), 2);

        // From the last question, advance opens the finish protocol.
        session.advance();
        assert_eq!(session.phase(), Phase::AwaitingPreConfirm);
        assert_eq!(session.current_index(), 2);
    }

    #[test]
    fn jump_ignores_out_of_range() {
        let mut session = session(3, 5);
        session.jump_to(2);
        assert_eq!(session.current_index(), 2);
        session.jump_to(99);
        assert_eq!(session.current_index(), 2);
    }

    #[test]
    fn selection_targets_the_question_in_view() {
        let mut session = session(2, 5);
        session.select_option(OptionLabel::B);
        session.advance();
        session.select_option(OptionLabel::C);

        assert_eq!(
            session.answers().selected(QuestionId::new(1)),
            Some(OptionLabel::B)
        );
        assert_eq!(
            session.answers().selected(QuestionId::new(2)),
            Some(OptionLabel::C)
        );
    }

    #[test]
    fn selection_ignores_labels_not_offered() {
        let mut session = session(1, 5);
        session.select_option(OptionLabel::D);
        assert!(session.answers().is_empty());
    }

    #[test]
    fn reselecting_is_idempotent() {
        let mut session = session(1, 5);
        session.select_option(OptionLabel::A);
        let before = session.answers().clone();
        session.select_option(OptionLabel::A);
        assert_eq!(session.answers(), &before);
    }

    #[test]
    fn two_step_confirmation_scores_once() {
        let mut session = session(2, 5);
        session.select_option(OptionLabel::A);
        session.request_finish();
        assert_eq!(session.phase(), Phase::AwaitingPreConfirm);

        session.confirm();
        assert_eq!(session.phase(), Phase::AwaitingFinalConfirm);

        session.confirm();
        assert_eq!(session.phase(), Phase::Finished);
        let score = session.score().unwrap();
        assert_eq!(score.correct, 1);
        assert_eq!(score.total, 2);
    }

    #[test]
    fn cancel_steps_back_one_level() {
        let mut session = session(2, 5);
        session.request_finish();
        session.confirm();
        assert_eq!(session.phase(), Phase::AwaitingFinalConfirm);

        session.cancel();
        assert_eq!(session.phase(), Phase::AwaitingPreConfirm);
        session.cancel();
        assert_eq!(session.phase(), Phase::Navigating);

        // Keeps answering, then reaches the last question again.
        session.select_option(OptionLabel::A);
        session.advance();
        session.advance();
        assert_eq!(session.phase(), Phase::AwaitingPreConfirm);
        assert!(session.score().is_none());
    }

    #[test]
    fn no_trigger_reopens_a_finished_session() {
        let mut session = session(1, 5);
        session.request_finish();
        session.confirm();
        session.confirm();
        assert_eq!(session.phase(), Phase::Finished);
        let score = session.score().unwrap();

        session.select_option(OptionLabel::B);
        session.advance();
        session.retreat();
        session.cancel();
        session.confirm();
        session.request_finish();

        assert_eq!(session.phase(), Phase::Finished);
        assert_eq!(session.score().unwrap(), score);
        assert!(session.answers().is_empty());
    }

    #[test]
    fn ticks_run_the_clock_down_into_grace_then_finished() {
        let mut session = session(1, 1);
        session.select_option(OptionLabel::A);

        for _ in 0..60 {
            session.tick();
        }
        assert_eq!(session.remaining_seconds(), 0);
        assert_eq!(session.phase(), Phase::TimeExpiredGrace);
        assert_eq!(session.grace_remaining(), 3);

        session.tick();
        session.tick();
        assert_eq!(session.phase(), Phase::TimeExpiredGrace);
        session.tick();
        assert_eq!(session.phase(), Phase::Finished);
        assert_eq!(session.score().unwrap().correct, 1);
    }

    #[test]
    fn expiry_wins_over_an_open_dialog() {
        let mut session = session(2, 1);
        session.request_finish();
        session.confirm();
        assert_eq!(session.phase(), Phase::AwaitingFinalConfirm);

        for _ in 0..60 {
            session.tick();
        }
        assert_eq!(session.phase(), Phase::TimeExpiredGrace);

        // The queued confirmation arrives late and must not score early.
        session.confirm();
        assert_eq!(session.phase(), Phase::TimeExpiredGrace);
        assert!(session.score().is_none());
    }

    #[test]
    fn expired_clock_blocks_user_triggers_even_before_the_tick() {
        let mut session = session(2, 1);
        for _ in 0..59 {
            session.tick();
        }
        assert_eq!(session.remaining_seconds(), 1);
        session.tick();

        // Any user trigger now lands in the grace phase, not Navigating.
        session.advance();
        assert_eq!(session.phase(), Phase::TimeExpiredGrace);
        assert_eq!(session.current_index(), 0);
        session.select_option(OptionLabel::A);
        assert!(session.answers().is_empty());
    }

    #[test]
    fn navigation_is_frozen_during_grace() {
        let mut session = session(3, 1);
        for _ in 0..60 {
            session.tick();
        }
        assert_eq!(session.phase(), Phase::TimeExpiredGrace);

        session.advance();
        session.retreat();
        session.jump_to(2);
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn extra_ticks_after_finish_are_harmless() {
        let mut session = session(1, 1);
        for _ in 0..120 {
            session.tick();
        }
        assert_eq!(session.phase(), Phase::Finished);
        assert_eq!(session.remaining_seconds(), 0);

        let score = session.score().unwrap();
        session.tick();
        assert_eq!(session.score().unwrap(), score);
    }

    #[test]
    fn submission_slot_is_single_use_until_released() {
        let mut session = session(1, 5);
        assert!(!session.begin_submission());

        session.request_finish();
        session.confirm();
        session.confirm();

        assert!(session.begin_submission());
        assert!(!session.begin_submission());

        session.abort_submission();
        assert_eq!(session.phase(), Phase::Finished);
        assert!(session.begin_submission());

        session.mark_submitted(41);
        assert_eq!(session.phase(), Phase::Submitted);
        assert_eq!(session.result_id(), Some(41));
        assert!(!session.begin_submission());
    }

    #[test]
    fn ticks_stop_mattering_after_submission() {
        let mut session = session(1, 5);
        session.request_finish();
        session.confirm();
        session.confirm();
        session.begin_submission();
        session.mark_submitted(1);

        let remaining = session.remaining_seconds();
        session.tick();
        assert_eq!(session.remaining_seconds(), remaining);
        assert_eq!(session.phase(), Phase::Submitted);
    }

    #[test]
    fn event_dispatch_matches_direct_calls() {
        let mut session = session(2, 5);
        session.handle(SessionEvent::SelectOption(OptionLabel::A));
        session.handle(SessionEvent::Advance);
        session.handle(SessionEvent::SelectOption(OptionLabel::B));
        session.handle(SessionEvent::RequestFinish);
        session.handle(SessionEvent::Confirm);
        session.handle(SessionEvent::Confirm);

        assert_eq!(session.phase(), Phase::Finished);
        assert_eq!(session.score().unwrap().correct, 1);
    }

    #[test]
    fn answers_only_reference_snapshot_questions() {
        let mut session = session(3, 5);
        session.select_option(OptionLabel::A);
        session.advance();
        session.select_option(OptionLabel::B);

        for (question_id, _) in session.answers().iter() {
            assert!(session.exam().contains_question(question_id));
        }
    }
}
