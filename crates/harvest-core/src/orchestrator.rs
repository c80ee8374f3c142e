//! The collection driver.
//!
//! [`Collector::collect_data`] refreshes catalog totals, picks the phase to
//! start from, and runs every remaining phase in order:
//!
//! 1. Collecting questions: walk listing pages after the last processed one.
//! 2. Collecting answers: chunks of question ids, following continuation.
//! 3. Collecting question comments: chunks of question ids.
//! 4. Collecting answer comments: chunks of answer ids.
//! 5. Saving to database: hand every record to the [`RecordSink`].
//!
//! Each phase sets its state through the checkpoint before running, so an
//! illegal move fails instead of being applied. Any phase error marks the
//! checkpoint `Failed` and is returned to the caller.

use harvest_types::{Answer, AnswerId, Comment, PostId, PostKind, Question, QuestionId};
use tracing::{error, info, warn};

use crate::checkpoint::CollectionCheckpoint;
use crate::config::CollectionConfig;
use crate::dedup::RecordSet;
use crate::error::CollectError;
use crate::source::{CatalogSource, RecordSink};
use crate::state::CollectionState;

/// Collection phases in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Questions,
    Answers,
    QuestionComments,
    AnswerComments,
    Save,
}

impl Phase {
    const ALL: [Self; 5] = [
        Self::Questions,
        Self::Answers,
        Self::QuestionComments,
        Self::AnswerComments,
        Self::Save,
    ];

    const fn state(self) -> CollectionState {
        match self {
            Self::Questions => CollectionState::CollectingQuestions,
            Self::Answers => CollectionState::CollectingAnswers,
            Self::QuestionComments => CollectionState::CollectingQuestionComments,
            Self::AnswerComments => CollectionState::CollectingAnswerComments,
            Self::Save => CollectionState::SavingToDatabase,
        }
    }

    /// Phase to resume at for a checkpoint in `state`.
    fn resume_from(state: CollectionState) -> Result<Self, CollectError> {
        match state {
            CollectionState::NotStarted
            | CollectionState::Failed
            | CollectionState::Paused
            | CollectionState::CollectingQuestions => Ok(Self::Questions),
            CollectionState::CollectingAnswers => Ok(Self::Answers),
            CollectionState::CollectingQuestionComments => Ok(Self::QuestionComments),
            CollectionState::CollectingAnswerComments => Ok(Self::AnswerComments),
            CollectionState::SavingToDatabase => Ok(Self::Save),
            CollectionState::Completed => Err(CollectError::AlreadyCompleted),
        }
    }
}

/// Drives one catalog run from its checkpoint to storage.
pub struct Collector<S, W> {
    source: S,
    sink: W,
    checkpoint: CollectionCheckpoint,
    settings: CollectionConfig,
    questions: RecordSet<Question>,
    answers: RecordSet<Answer>,
    comments: RecordSet<Comment>,
}

impl<S: CatalogSource, W: RecordSink> Collector<S, W> {
    /// Build a collector and rebuild its record sets from `checkpoint`.
    pub fn new(source: S, sink: W, checkpoint: CollectionCheckpoint, settings: &CollectionConfig) -> Self {
        let mut questions = RecordSet::new();
        let mut answers = RecordSet::new();
        let mut comments = RecordSet::new();

        for progress in checkpoint.question_progress() {
            questions.insert(progress.question.clone());
            answers.extend(progress.answers.values().cloned());
            comments.extend(progress.question_comments.values().cloned());
            comments.extend(
                progress
                    .answer_comments
                    .values()
                    .flat_map(|by_id| by_id.values().cloned()),
            );
        }
        comments.extend(checkpoint.unattributed_comments().cloned());

        if !questions.is_empty() {
            info!(
                questions = questions.len(),
                answers = answers.len(),
                comments = comments.len(),
                "restored records from checkpoint"
            );
        }

        Self {
            source,
            sink,
            checkpoint,
            settings: settings.clone(),
            questions,
            answers,
            comments,
        }
    }

    /// The checkpoint as it stands.
    pub const fn checkpoint(&self) -> &CollectionCheckpoint {
        &self.checkpoint
    }

    /// Give back the checkpoint.
    pub fn into_checkpoint(self) -> CollectionCheckpoint {
        self.checkpoint
    }

    /// Questions held in memory.
    pub fn questions(&self) -> &[Question] {
        self.questions.as_slice()
    }

    /// Answers held in memory.
    pub fn answers(&self) -> &[Answer] {
        self.answers.as_slice()
    }

    /// Comments held in memory.
    pub fn comments(&self) -> &[Comment] {
        self.comments.as_slice()
    }

    /// Share of questions without answers, from the last refreshed totals.
    ///
    /// `None` before any refresh or when the catalog is empty.
    pub fn no_answer_ratio(&self) -> Option<f64> {
        let totals = self.checkpoint.totals();
        let total = i32::try_from(totals.total_questions).ok().filter(|t| *t > 0)?;
        let no_answer = i32::try_from(totals.no_answer_questions).ok()?;
        Some(f64::from(no_answer) / f64::from(total))
    }

    /// Fetch catalog totals and store them with the derived page count.
    pub async fn refresh_statistics(&mut self) -> Result<(), CollectError> {
        let total = self.source.question_total().await?;
        let no_answer = self.source.no_answer_total().await?;
        let pages = u64::try_from(total)
            .unwrap_or(0)
            .div_ceil(u64::from(self.settings.page_size.max(1)));
        let total_pages = u32::try_from(pages).unwrap_or(u32::MAX);

        self.checkpoint.update_statistics(total, no_answer, total_pages);
        info!(
            total_questions = total,
            no_answer_questions = no_answer,
            total_pages,
            "refreshed catalog statistics"
        );
        Ok(())
    }

    /// Run every remaining phase and land the records in storage.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::AlreadyCompleted`] without touching the
    /// checkpoint when it already records a finished run. Any other error
    /// marks the checkpoint `Failed` before it is returned.
    pub async fn collect_data(&mut self) -> Result<(), CollectError> {
        let start = self.checkpoint.state();
        let first = Phase::resume_from(start)?;
        if matches!(
            start,
            CollectionState::NotStarted | CollectionState::Failed | CollectionState::Paused
        ) {
            info!(state = %start, "starting new collection");
        } else {
            info!(state = %start, "resuming collection");
        }

        match self.run_from(first).await {
            Ok(()) => {
                info!(
                    questions = self.questions.len(),
                    answers = self.answers.len(),
                    comments = self.comments.len(),
                    "data collection completed"
                );
                Ok(())
            }
            Err(err) => {
                error!(error = %err, state = %self.checkpoint.state(), "data collection failed");
                if let Err(e) = self.checkpoint.set_state(CollectionState::Failed) {
                    error!(error = %e, "could not mark checkpoint failed");
                }
                Err(err)
            }
        }
    }

    async fn run_from(&mut self, first: Phase) -> Result<(), CollectError> {
        self.refresh_statistics().await?;

        for phase in Phase::ALL.into_iter().skip_while(|p| *p != first) {
            self.enter(phase.state())?;
            match phase {
                Phase::Questions => self.collect_questions().await?,
                Phase::Answers => self.collect_answers().await?,
                Phase::QuestionComments => self.collect_question_comments().await?,
                Phase::AnswerComments => self.collect_answer_comments().await?,
                Phase::Save => self.save_to_database().await?,
            }
        }
        Ok(())
    }

    fn enter(&mut self, state: CollectionState) -> Result<(), CollectError> {
        self.checkpoint.set_state(state)?;
        info!(
            state = %state,
            progress_pct = state.progress_percentage(),
            "entering phase"
        );
        Ok(())
    }

    async fn collect_questions(&mut self) -> Result<(), CollectError> {
        let total_pages = self.checkpoint.totals().total_pages;
        let step = self.settings.page_step.max(1);
        if step > 1 {
            warn!(page_step = step, "page_step above 1 samples listing pages and skips the rest");
        }

        let mut page = self.checkpoint.last_processed_page().saturating_add(1);
        while page <= total_pages {
            let fetched = self.source.questions(page).await?;
            let mut added: usize = 0;
            for question in fetched {
                if self.questions.contains_key(&question.question_id) {
                    continue;
                }
                self.checkpoint.record_question_progress(question.clone());
                self.questions.insert(question);
                added = added.saturating_add(1);
            }
            self.checkpoint.set_last_processed_page(page);
            info!(
                page,
                total_pages,
                added,
                progress = percent(u64::from(page), u64::from(total_pages)),
                "collected question page"
            );

            let Some(next) = page.checked_add(step) else {
                break;
            };
            page = next;
        }

        info!(total = self.questions.len(), "questions collection completed");
        Ok(())
    }

    async fn collect_answers(&mut self) -> Result<(), CollectError> {
        let pending: Vec<QuestionId> = self
            .questions
            .keys()
            .filter(|id| self.checkpoint.needs_answer_collection(*id))
            .collect();
        let batch = self.batch_size();
        let chunks = pending.len().div_ceil(batch);

        for (index, chunk) in pending.chunks(batch).enumerate() {
            self.checkpoint.update_batch(chunk, index);
            let fetched = self.source.answers(chunk).await?;
            for answer in fetched {
                if self.answers.contains_key(&answer.answer_id) {
                    continue;
                }
                self.checkpoint.record_answer_progress(answer.clone());
                self.answers.insert(answer);
            }
            self.checkpoint.mark_answers_collected(chunk);
            info!(
                chunk = index.saturating_add(1),
                chunks,
                progress = percent(to_u64(index.saturating_add(1)), to_u64(chunks)),
                "collected answer chunk"
            );
        }

        info!(
            total = self.answers.len(),
            skipped = self.questions.len().saturating_sub(pending.len()),
            "answers collection completed"
        );
        Ok(())
    }

    async fn collect_question_comments(&mut self) -> Result<(), CollectError> {
        let pending: Vec<QuestionId> = self
            .questions
            .keys()
            .filter(|id| {
                self.checkpoint
                    .needs_comment_collection(PostId::from(*id), PostKind::Question)
            })
            .collect();
        let batch = self.batch_size();
        let chunks = pending.len().div_ceil(batch);

        for (index, chunk) in pending.chunks(batch).enumerate() {
            self.checkpoint.update_batch(chunk, index);
            let posts: Vec<PostId> = chunk.iter().copied().map(PostId::from).collect();
            let fetched = self.source.comments(PostKind::Question, &posts).await?;
            self.absorb_comments(PostKind::Question, fetched);
            self.checkpoint.mark_question_comments_collected(chunk);
            info!(
                chunk = index.saturating_add(1),
                chunks,
                progress = percent(to_u64(index.saturating_add(1)), to_u64(chunks)),
                "collected question comment chunk"
            );
        }

        info!(total = self.comments.len(), "question comments collection completed");
        Ok(())
    }

    async fn collect_answer_comments(&mut self) -> Result<(), CollectError> {
        let pending: Vec<AnswerId> = self
            .answers
            .keys()
            .filter(|id| {
                self.checkpoint
                    .needs_comment_collection(PostId::from(*id), PostKind::Answer)
            })
            .collect();
        let batch = self.batch_size();
        let chunks = pending.len().div_ceil(batch);

        for (index, chunk) in pending.chunks(batch).enumerate() {
            self.checkpoint.update_batch(chunk, index);
            let posts: Vec<PostId> = chunk.iter().copied().map(PostId::from).collect();
            let fetched = self.source.comments(PostKind::Answer, &posts).await?;
            self.absorb_comments(PostKind::Answer, fetched);
            self.checkpoint.mark_answer_comments_collected(chunk);
            info!(
                chunk = index.saturating_add(1),
                chunks,
                progress = percent(to_u64(index.saturating_add(1)), to_u64(chunks)),
                "collected answer comment chunk"
            );
        }

        info!(total = self.comments.len(), "comments collection completed");
        Ok(())
    }

    async fn save_to_database(&mut self) -> Result<(), CollectError> {
        info!(
            questions = self.questions.len(),
            answers = self.answers.len(),
            comments = self.comments.len(),
            "saving records to database"
        );
        self.sink
            .persist(
                self.questions.as_slice(),
                self.answers.as_slice(),
                self.comments.as_slice(),
            )
            .await
            .map_err(|e| CollectError::Persistence {
                source: Box::new(e),
            })?;
        self.checkpoint.set_state(CollectionState::Completed)?;
        Ok(())
    }

    fn absorb_comments(&mut self, kind: PostKind, fetched: Vec<Comment>) {
        for comment in fetched {
            if self.comments.contains_key(&comment.comment_id) {
                continue;
            }
            self.checkpoint.record_comment_progress(kind, comment.clone());
            self.comments.insert(comment);
        }
    }

    fn batch_size(&self) -> usize {
        usize::try_from(self.settings.batch_size)
            .unwrap_or(usize::MAX)
            .max(1)
    }
}

/// Integer percentage of `done` over `total`; 100 when `total` is zero.
fn percent(done: u64, total: u64) -> u64 {
    done.saturating_mul(100).checked_div(total).unwrap_or(100)
}

fn to_u64(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}
