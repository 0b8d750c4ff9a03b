use std::collections::BTreeMap;
use std::sync::Arc;

use exam_core::model::{Exam, ExamId, OptionLabel, Question, QuestionId};
use storage::repository::{ExamRepository, StorageError};

use crate::error::CatalogError;

/// Fields an admin edits on a question; shared by add and update.
#[derive(Debug, Clone)]
pub struct QuestionDraft {
    pub prompt: String,
    pub image_url: Option<String>,
    pub options: BTreeMap<OptionLabel, String>,
    pub correct_option: OptionLabel,
}

/// Orchestrates exam and question administration.
///
/// Exams start as non-live drafts and may stay empty while questions are
/// being authored; the single-live invariant itself lives in the repository,
/// this service just forwards the toggle.
#[derive(Clone)]
pub struct CatalogService {
    exams: Arc<dyn ExamRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(exams: Arc<dyn ExamRepository>) -> Self {
        Self { exams }
    }

    /// Create a new draft exam with no questions and persist it.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Exam` for validation failures.
    /// Returns `CatalogError::Storage` if persistence fails.
    pub async fn create_exam(
        &self,
        title: String,
        description: String,
        category: Option<String>,
        time_limit_minutes: u32,
    ) -> Result<ExamId, CatalogError> {
        let exam = Exam::new(
            ExamId::new(1),
            title,
            description,
            category,
            time_limit_minutes,
            false,
            Vec::new(),
        )?;
        let exam_id = self.exams.insert_new_exam(&exam).await?;
        Ok(exam_id)
    }

    /// Update an exam's descriptive fields, keeping its questions and live
    /// flag.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Exam` if validation fails.
    /// Returns `CatalogError::Storage` if the exam is missing or repository
    /// access fails.
    pub async fn update_exam(
        &self,
        exam_id: ExamId,
        title: String,
        description: String,
        category: Option<String>,
        time_limit_minutes: u32,
    ) -> Result<(), CatalogError> {
        let existing = self.require_exam(exam_id).await?;
        let updated = Exam::new(
            exam_id,
            title,
            description,
            category,
            time_limit_minutes,
            existing.is_live(),
            existing.questions().to_vec(),
        )?;
        self.exams.upsert_exam(&updated).await?;
        Ok(())
    }

    /// Delete an exam and its questions.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if the exam is missing or repository
    /// access fails.
    pub async fn delete_exam(&self, exam_id: ExamId) -> Result<(), CatalogError> {
        self.exams.delete_exam(exam_id).await?;
        Ok(())
    }

    /// Fetch an exam by ID.
    ///
    /// Returns `Ok(None)` when the exam does not exist.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if repository access fails.
    pub async fn get_exam(&self, exam_id: ExamId) -> Result<Option<Exam>, CatalogError> {
        let exam = self.exams.get_exam(exam_id).await?;
        Ok(exam)
    }

    /// List all exams in the catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if repository access fails.
    pub async fn list_exams(&self) -> Result<Vec<Exam>, CatalogError> {
        let exams = self.exams.list_exams().await?;
        Ok(exams)
    }

    /// Append a question to an exam, allocating the next question id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Question` if the draft fails validation.
    /// Returns `CatalogError::Storage` if the exam is missing or repository
    /// access fails.
    pub async fn add_question(
        &self,
        exam_id: ExamId,
        draft: QuestionDraft,
    ) -> Result<QuestionId, CatalogError> {
        let mut exam = self.require_exam(exam_id).await?;
        let question_id = next_question_id(&exam);
        let question = Question::new(
            question_id,
            draft.prompt,
            draft.image_url,
            draft.options,
            draft.correct_option,
        )?;

        let mut questions = exam.questions().to_vec();
        questions.push(question);
        exam.replace_questions(questions)?;

        self.exams.upsert_exam(&exam).await?;
        Ok(question_id)
    }

    /// Replace an existing question's content in place, keeping its id and
    /// position.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Question` if the draft fails validation.
    /// Returns `CatalogError::Storage` if the exam or question is missing or
    /// repository access fails.
    pub async fn update_question(
        &self,
        exam_id: ExamId,
        question_id: QuestionId,
        draft: QuestionDraft,
    ) -> Result<(), CatalogError> {
        let mut exam = self.require_exam(exam_id).await?;
        let mut questions = exam.questions().to_vec();
        let slot = questions
            .iter_mut()
            .find(|q| q.id() == question_id)
            .ok_or(StorageError::NotFound)?;

        *slot = Question::new(
            question_id,
            draft.prompt,
            draft.image_url,
            draft.options,
            draft.correct_option,
        )?;
        exam.replace_questions(questions)?;

        self.exams.upsert_exam(&exam).await?;
        Ok(())
    }

    /// Remove a question from an exam.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if the exam or question is missing or
    /// repository access fails.
    pub async fn remove_question(
        &self,
        exam_id: ExamId,
        question_id: QuestionId,
    ) -> Result<(), CatalogError> {
        let mut exam = self.require_exam(exam_id).await?;
        let before = exam.question_count();
        let questions: Vec<Question> = exam
            .questions()
            .iter()
            .filter(|q| q.id() != question_id)
            .cloned()
            .collect();
        if questions.len() == before {
            return Err(StorageError::NotFound.into());
        }
        exam.replace_questions(questions)?;

        self.exams.upsert_exam(&exam).await?;
        Ok(())
    }

    /// Flag an exam live, clearing the flag on every other exam in the same
    /// write.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if the exam is missing (no flags are
    /// changed) or repository access fails.
    pub async fn set_live(&self, exam_id: ExamId) -> Result<(), CatalogError> {
        self.exams.set_live(exam_id).await?;
        Ok(())
    }

    /// Take whatever exam is live off the air.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if repository access fails.
    pub async fn clear_live(&self) -> Result<(), CatalogError> {
        self.exams.clear_live().await?;
        Ok(())
    }

    /// The exam currently flagged live, if any.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if repository access fails.
    pub async fn live_exam(&self) -> Result<Option<Exam>, CatalogError> {
        let exam = self.exams.get_live().await?;
        Ok(exam)
    }

    async fn require_exam(&self, exam_id: ExamId) -> Result<Exam, CatalogError> {
        let exam = self
            .exams
            .get_exam(exam_id)
            .await?
            .ok_or(StorageError::NotFound)?;
        Ok(exam)
    }
}

fn next_question_id(exam: &Exam) -> QuestionId {
    let max = exam
        .questions()
        .iter()
        .map(|q| q.id().value())
        .max()
        .unwrap_or(0);
    QuestionId::new(max + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::Storage;

    fn draft(correct: OptionLabel) -> QuestionDraft {
        let mut options = BTreeMap::new();
        options.insert(OptionLabel::A, "alpha".to_owned());
        options.insert(OptionLabel::B, "beta".to_owned());
        QuestionDraft {
            prompt: "Pick one".to_owned(),
            image_url: None,
            options,
            correct_option: correct,
        }
    }

    #[tokio::test]
    async fn creates_draft_exams_without_questions() {
        let storage = Storage::in_memory();
        let catalog = CatalogService::new(Arc::clone(&storage.exams));

        let exam_id = catalog
            .create_exam("Safety basics".to_owned(), String::new(), None, 30)
            .await
            .unwrap();

        let exam = catalog.get_exam(exam_id).await.unwrap().unwrap();
        assert_eq!(exam.question_count(), 0);
        assert!(!exam.is_live());
    }

    #[tokio::test]
    async fn question_ids_grow_within_an_exam() {
        let storage = Storage::in_memory();
        let catalog = CatalogService::new(Arc::clone(&storage.exams));
        let exam_id = catalog
            .create_exam("Quiz".to_owned(), String::new(), None, 10)
            .await
            .unwrap();

        let first = catalog.add_question(exam_id, draft(OptionLabel::A)).await.unwrap();
        let second = catalog.add_question(exam_id, draft(OptionLabel::B)).await.unwrap();
        assert_ne!(first, second);

        let exam = catalog.get_exam(exam_id).await.unwrap().unwrap();
        assert_eq!(exam.question_count(), 2);
    }

    #[tokio::test]
    async fn updates_replace_content_in_place() {
        let storage = Storage::in_memory();
        let catalog = CatalogService::new(Arc::clone(&storage.exams));
        let exam_id = catalog
            .create_exam("Quiz".to_owned(), String::new(), None, 10)
            .await
            .unwrap();
        let question_id = catalog.add_question(exam_id, draft(OptionLabel::A)).await.unwrap();

        let mut updated = draft(OptionLabel::B);
        updated.prompt = "Pick the other one".to_owned();
        catalog
            .update_question(exam_id, question_id, updated)
            .await
            .unwrap();

        let exam = catalog.get_exam(exam_id).await.unwrap().unwrap();
        let question = exam.question_at(0).unwrap();
        assert_eq!(question.id(), question_id);
        assert_eq!(question.prompt(), "Pick the other one");
        assert_eq!(question.correct_option(), OptionLabel::B);
    }

    #[tokio::test]
    async fn removing_an_unknown_question_is_an_error() {
        let storage = Storage::in_memory();
        let catalog = CatalogService::new(Arc::clone(&storage.exams));
        let exam_id = catalog
            .create_exam("Quiz".to_owned(), String::new(), None, 10)
            .await
            .unwrap();

        let err = catalog
            .remove_question(exam_id, QuestionId::new(99))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Storage(StorageError::NotFound)));
    }

    #[tokio::test]
    async fn live_toggle_round_trips() {
        let storage = Storage::in_memory();
        let catalog = CatalogService::new(Arc::clone(&storage.exams));
        let a = catalog
            .create_exam("A".to_owned(), String::new(), None, 10)
            .await
            .unwrap();
        let b = catalog
            .create_exam("B".to_owned(), String::new(), None, 10)
            .await
            .unwrap();

        catalog.set_live(a).await.unwrap();
        catalog.set_live(b).await.unwrap();
        let live = catalog.live_exam().await.unwrap().unwrap();
        assert_eq!(live.id(), b);

        catalog.clear_live().await.unwrap();
        assert!(catalog.live_exam().await.unwrap().is_none());
    }
}
