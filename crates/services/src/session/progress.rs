use crate::session::engine::ExamSession;
use crate::session::settings::ProgressMetric;

/// Snapshot of where a session stands, ready for a host to render.
///
/// The percent tracks whichever metric the settings chose; the counts are
/// always question-based so a host can show "12 of 40" next to the bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    answered: u32,
    question_total: u32,
    current_index: usize,
    remaining_seconds: u32,
    done: u32,
    total: u32,
}

impl Progress {
    #[must_use]
    pub fn answered(&self) -> u32 {
        self.answered
    }

    #[must_use]
    pub fn question_total(&self) -> u32 {
        self.question_total
    }

    /// Zero-based position of the question in view.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    /// Filled percentage per the configured metric, rounded to the nearest
    /// integer; 0 over an empty total.
    #[must_use]
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        (self.done * 200 + self.total) / (self.total * 2)
    }
}

/// Derive the progress a session should display, per its settings.
///
/// `Questions` fills by the position reached (one-based) over the snapshot
/// total, whether or not earlier questions were answered; `Time` fills by
/// elapsed seconds over the exam's limit.
#[must_use]
pub fn session_progress(session: &ExamSession) -> Progress {
    let answered = count_u32(session.answers().answered_count());
    let question_total = count_u32(session.exam().question_count());
    let (done, total) = match session.settings().progress_metric() {
        ProgressMetric::Questions => (count_u32(session.current_index() + 1), question_total),
        ProgressMetric::Time => {
            let limit = session.exam().time_limit_seconds();
            (limit.saturating_sub(session.remaining_seconds()), limit)
        }
    };

    Progress {
        answered,
        question_total,
        current_index: session.current_index(),
        remaining_seconds: session.remaining_seconds(),
        done,
        total,
    }
}

fn count_u32(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::engine::SessionEvent;
    use crate::session::settings::SessionSettings;
    use exam_core::model::{Exam, ExamId, OptionLabel, Question, QuestionId, UserId};
    use exam_core::time::fixed_now;
    use std::collections::BTreeMap;

    fn session(metric: ProgressMetric) -> ExamSession {
        let questions = (1..=4)
            .map(|id| {
                let mut options = BTreeMap::new();
                options.insert(OptionLabel::A, "a".to_owned());
                options.insert(OptionLabel::B, "b".to_owned());
                Question::new(
                    QuestionId::new(id),
                    format!("Q{id}"),
                    None,
                    options,
                    OptionLabel::A,
                )
                .unwrap()
            })
            .collect();
        let exam = Exam::new(ExamId::new(1), "Progress", "", None, 2, true, questions).unwrap();
        let settings = SessionSettings::new(3, metric).unwrap();
        ExamSession::new(UserId::new(1), exam, settings, fixed_now()).unwrap()
    }

    #[test]
    fn questions_metric_fills_by_position_reached() {
        let mut session = session(ProgressMetric::Questions);
        // The first question is already in view, so the bar starts at 1 of 4.
        assert_eq!(session_progress(&session).percent(), 25);

        session.handle(SessionEvent::SelectOption(OptionLabel::A));
        session.handle(SessionEvent::Advance);

        let progress = session_progress(&session);
        assert_eq!(progress.answered(), 1);
        assert_eq!(progress.question_total(), 4);
        assert_eq!(progress.current_index(), 1);
        assert_eq!(progress.percent(), 50);

        // Skipping ahead without answering still moves the bar.
        session.handle(SessionEvent::JumpTo(3));
        let progress = session_progress(&session);
        assert_eq!(progress.answered(), 1);
        assert_eq!(progress.percent(), 100);
    }

    #[test]
    fn time_metric_fills_by_elapsed_seconds() {
        let mut session = session(ProgressMetric::Time);
        session.handle(SessionEvent::SelectOption(OptionLabel::A));
        for _ in 0..30 {
            session.handle(SessionEvent::Tick);
        }

        let progress = session_progress(&session);
        assert_eq!(progress.remaining_seconds(), 90);
        assert_eq!(progress.percent(), 25);
        // Question counts stay available whatever fills the bar.
        assert_eq!(progress.answered(), 1);
    }

    #[test]
    fn percent_rounds_to_nearest() {
        let mut session = session(ProgressMetric::Questions);
        session.handle(SessionEvent::Advance);
        session.handle(SessionEvent::Advance);
        // Position 3 of 4 -> exactly 75.
        assert_eq!(session_progress(&session).percent(), 75);

        // 50 of 120 elapsed seconds -> 41.67, rounds to 42.
        let timed = Progress {
            done: 50,
            total: 120,
            ..session_progress(&session)
        };
        assert_eq!(timed.percent(), 42);
    }
}
