mod answer_sheet;
mod exam;
mod ids;
mod question;
mod result;
mod user;

pub use answer_sheet::AnswerSheet;
pub use exam::{Exam, ExamError, MAX_TIME_LIMIT_MINUTES};
pub use ids::{ExamId, ParseIdError, QuestionId, UserId};
pub use question::{OptionLabel, ParseLabelError, Question, QuestionError};
pub use result::{ExamResult, ExamResultError, ExamResultId};
pub use user::{ParseRoleError, Role, User, UserError};
