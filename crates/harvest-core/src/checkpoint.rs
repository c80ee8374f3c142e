//! Durable, crash-consistent record of collection progress.
//!
//! The checkpoint is a single JSON document. It holds the catalog totals,
//! the listing page cursor, one [`QuestionProgress`] per fetched question
//! (with the question's answers and comments), the completed id sets, the
//! active batch cursor, and the lifecycle state.
//!
//! Saves go to `<path>.tmp`, are synced, then renamed over `<path>`, so a
//! reader sees either the previous document or the new one. A missing or
//! unreadable file loads as a fresh checkpoint. Save failures are logged
//! and never abort the run.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write as _};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use harvest_types::{
    Answer, AnswerId, Comment, CommentId, Keyed, PostId, PostKind, Question, QuestionId,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{CheckpointError, StateError};
use crate::state::CollectionState;

/// Save after this many completions of one kind unless configured otherwise.
pub const DEFAULT_SAVE_EVERY: usize = 100;

/// Catalog-wide counts from the last statistics refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogTotals {
    /// Questions in scope.
    pub total_questions: i64,
    /// Questions in scope without answers.
    pub no_answer_questions: i64,
    /// `ceil(total_questions / page_size)`.
    pub total_pages: u32,
}

/// Progress for one question and everything hanging off it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionProgress {
    /// The question as last fetched.
    pub question: Question,
    /// Answers fetched so far.
    #[serde(default)]
    pub answers: BTreeMap<AnswerId, Answer>,
    /// Comments on the question.
    #[serde(default)]
    pub question_comments: BTreeMap<CommentId, Comment>,
    /// Comments on each answer.
    #[serde(default)]
    pub answer_comments: BTreeMap<AnswerId, BTreeMap<CommentId, Comment>>,
    /// Set once an answer fetch covering this question finished.
    #[serde(default)]
    pub answers_collected: bool,
    /// Set once a comment fetch covering the question finished.
    #[serde(default)]
    pub question_comments_collected: bool,
    /// Answers whose comment fetch finished.
    #[serde(default)]
    pub answer_comments_collected: BTreeSet<AnswerId>,
}

impl QuestionProgress {
    fn new(question: Question) -> Self {
        let mut progress = Self {
            question,
            answers: BTreeMap::new(),
            question_comments: BTreeMap::new(),
            answer_comments: BTreeMap::new(),
            answers_collected: false,
            question_comments_collected: false,
            answer_comments_collected: BTreeSet::new(),
        };
        progress.settle_answers();
        progress
    }

    /// Latch the answer flag once every answer the site reports is here.
    fn settle_answers(&mut self) {
        if i64::try_from(self.answers.len()).unwrap_or(i64::MAX) >= self.question.answer_count {
            self.answers_collected = true;
        }
    }

    /// Whether `answer_id` belongs to this question.
    pub fn has_answer(&self, answer_id: AnswerId) -> bool {
        self.answers.contains_key(&answer_id)
    }

    /// Answers are done once a fetch finished or every answer the site
    /// reported was already here. The flag never reverts.
    pub const fn has_collected_answers(&self) -> bool {
        self.answers_collected
    }

    /// Whether the question's own comments were fetched.
    pub const fn has_collected_question_comments(&self) -> bool {
        self.question_comments_collected
    }

    /// Whether comments of `answer_id` were fetched.
    pub fn has_collected_answer_comments(&self, answer_id: AnswerId) -> bool {
        self.answer_comments_collected.contains(&answer_id)
    }

    /// Answers, question comments, and every answer's comments are done.
    pub fn is_complete(&self) -> bool {
        self.has_collected_answers()
            && self.question_comments_collected
            && self
                .answers
                .keys()
                .all(|id| self.answer_comments_collected.contains(id))
    }
}

/// The serialized checkpoint document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct CheckpointData {
    state: CollectionState,
    totals: CatalogTotals,
    last_processed_page: u32,
    questions: BTreeMap<QuestionId, QuestionProgress>,
    unattributed_comments: BTreeMap<CommentId, Comment>,
    completed_question_ids: BTreeSet<QuestionId>,
    completed_answer_ids: BTreeSet<AnswerId>,
    completed_comment_ids: BTreeSet<CommentId>,
    current_batch_ids: Vec<i64>,
    current_batch_index: usize,
    last_update: DateTime<Utc>,
}

impl Default for CheckpointData {
    fn default() -> Self {
        Self {
            state: CollectionState::NotStarted,
            totals: CatalogTotals::default(),
            last_processed_page: 0,
            questions: BTreeMap::new(),
            unattributed_comments: BTreeMap::new(),
            completed_question_ids: BTreeSet::new(),
            completed_answer_ids: BTreeSet::new(),
            completed_comment_ids: BTreeSet::new(),
            current_batch_ids: Vec::new(),
            current_batch_index: 0,
            last_update: Utc::now(),
        }
    }
}

/// Progress of one logical catalog run, backed by a JSON file.
#[derive(Debug, Clone)]
pub struct CollectionCheckpoint {
    path: PathBuf,
    save_every: usize,
    data: CheckpointData,
    /// Owning question of every recorded answer; rebuilt on load.
    answer_index: BTreeMap<AnswerId, QuestionId>,
}

impl CollectionCheckpoint {
    /// A fresh checkpoint in [`CollectionState::NotStarted`] that will be
    /// saved at `path`. Nothing is written until the first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            save_every: DEFAULT_SAVE_EVERY,
            data: CheckpointData::default(),
            answer_index: BTreeMap::new(),
        }
    }

    /// Save after every `n` completions of one kind instead of the default.
    #[must_use]
    pub fn with_save_every(mut self, n: usize) -> Self {
        self.save_every = n.max(1);
        self
    }

    /// Load the checkpoint at `path`, or start fresh if it is missing or
    /// unreadable.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::try_load(&path) {
            Ok(checkpoint) => {
                info!(
                    path = %path.display(),
                    state = %checkpoint.state(),
                    last_update = %checkpoint.last_update(),
                    questions = checkpoint.data.questions.len(),
                    "loaded collection checkpoint"
                );
                checkpoint
            }
            Err(CheckpointError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no checkpoint found, starting fresh");
                Self::new(path)
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to load checkpoint, starting fresh");
                Self::new(path)
            }
        }
    }

    /// Read and parse the checkpoint at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointError::Io`] if the file cannot be read and
    /// [`CheckpointError::Serialization`] if it is not a valid checkpoint.
    pub fn try_load(path: &Path) -> Result<Self, CheckpointError> {
        let bytes = fs::read(path)?;
        let mut data: CheckpointData = serde_json::from_slice(&bytes)?;
        for progress in data.questions.values_mut() {
            progress.settle_answers();
        }
        let answer_index = data
            .questions
            .iter()
            .flat_map(|(qid, progress)| progress.answers.keys().map(move |aid| (*aid, *qid)))
            .collect();
        Ok(Self {
            path: path.to_path_buf(),
            save_every: DEFAULT_SAVE_EVERY,
            data,
            answer_index,
        })
    }

    /// Location of the checkpoint file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> CollectionState {
        self.data.state
    }

    /// Move to `target` if the transition rules allow it, then save.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::InvalidTransition`] and leaves the state
    /// unchanged when the move is illegal.
    pub fn set_state(&mut self, target: CollectionState) -> Result<(), StateError> {
        self.data.state = self.data.state.transition_to(target)?;
        self.touch();
        self.save();
        Ok(())
    }

    /// Totals from the last statistics refresh.
    pub const fn totals(&self) -> CatalogTotals {
        self.data.totals
    }

    /// Record refreshed totals, then save.
    pub fn update_statistics(&mut self, total_questions: i64, no_answer_questions: i64, total_pages: u32) {
        self.data.totals = CatalogTotals {
            total_questions,
            no_answer_questions,
            total_pages,
        };
        self.touch();
        self.save();
    }

    /// Highest listing page fully processed (0 before the first page).
    pub const fn last_processed_page(&self) -> u32 {
        self.data.last_processed_page
    }

    /// Advance the page cursor, then save.
    pub fn set_last_processed_page(&mut self, page: u32) {
        self.data.last_processed_page = page;
        self.touch();
        self.save();
    }

    /// Time of the last mutation.
    pub const fn last_update(&self) -> DateTime<Utc> {
        self.data.last_update
    }

    /// Record a fetched question and mark it completed.
    ///
    /// A re-fetched question replaces the stored record but keeps its
    /// progress, so completion flags never revert.
    pub fn record_question_progress(&mut self, question: Question) {
        let id = question.key();
        match self.data.questions.get_mut(&id) {
            Some(progress) => {
                progress.question = question;
                progress.settle_answers();
            }
            None => {
                self.data.questions.insert(id, QuestionProgress::new(question));
            }
        }
        self.data.completed_question_ids.insert(id);
        self.touch();
        self.maybe_save(self.data.completed_question_ids.len());
    }

    /// Attach a fetched answer to its question and mark it completed.
    ///
    /// Returns `false` when the parent question is not in the checkpoint;
    /// the answer is then not recorded.
    pub fn record_answer_progress(&mut self, answer: Answer) -> bool {
        let id = answer.key();
        let Some(progress) = self.data.questions.get_mut(&answer.question_id) else {
            debug!(answer_id = %id, question_id = %answer.question_id, "answer for unknown question not recorded");
            return false;
        };
        let question_id = answer.question_id;
        progress.answers.insert(id, answer);
        progress.settle_answers();
        self.answer_index.insert(id, question_id);
        self.data.completed_answer_ids.insert(id);
        self.touch();
        self.maybe_save(self.data.completed_answer_ids.len());
        true
    }

    /// Attach a fetched comment to its post and mark it completed.
    ///
    /// Question comments attach directly. Answer comments attach to the
    /// question holding that answer. Comments whose post is not in the
    /// checkpoint are kept aside so a resumed run still persists them.
    pub fn record_comment_progress(&mut self, kind: PostKind, comment: Comment) {
        let id = comment.key();
        let target = comment.post_id.into_inner();
        let owner = match kind {
            PostKind::Question => self.data.questions.get_mut(&QuestionId(target)),
            PostKind::Answer => self
                .answer_index
                .get(&AnswerId(target))
                .and_then(|qid| self.data.questions.get_mut(qid)),
        };
        match (owner, kind) {
            (Some(progress), PostKind::Question) => {
                progress.question_comments.insert(id, comment);
            }
            (Some(progress), PostKind::Answer) => {
                progress
                    .answer_comments
                    .entry(AnswerId(target))
                    .or_default()
                    .insert(id, comment);
            }
            (None, _) => {
                self.data.unattributed_comments.insert(id, comment);
            }
        }
        self.data.completed_comment_ids.insert(id);
        self.touch();
        self.maybe_save(self.data.completed_comment_ids.len());
    }

    /// Mark answer fetching finished for `ids`, then save.
    pub fn mark_answers_collected(&mut self, ids: &[QuestionId]) {
        for id in ids {
            if let Some(progress) = self.data.questions.get_mut(id) {
                progress.answers_collected = true;
            }
        }
        self.touch();
        self.save();
    }

    /// Mark question-comment fetching finished for `ids`, then save.
    pub fn mark_question_comments_collected(&mut self, ids: &[QuestionId]) {
        for id in ids {
            if let Some(progress) = self.data.questions.get_mut(id) {
                progress.question_comments_collected = true;
            }
        }
        self.touch();
        self.save();
    }

    /// Mark answer-comment fetching finished for `ids`, then save.
    pub fn mark_answer_comments_collected(&mut self, ids: &[AnswerId]) {
        for id in ids {
            if let Some(progress) = self
                .answer_index
                .get(id)
                .and_then(|qid| self.data.questions.get_mut(qid))
            {
                progress.answer_comments_collected.insert(*id);
            }
        }
        self.touch();
        self.save();
    }

    /// Record the chunk being fetched and its index. Persisted by the save
    /// that follows the chunk's completion.
    pub fn update_batch<I: Copy + Into<i64>>(&mut self, ids: &[I], index: usize) {
        self.data.current_batch_ids = ids.iter().map(|id| (*id).into()).collect();
        self.data.current_batch_index = index;
        self.touch();
    }

    /// The chunk last handed to [`update_batch`](Self::update_batch).
    pub fn current_batch(&self) -> (&[i64], usize) {
        (&self.data.current_batch_ids, self.data.current_batch_index)
    }

    /// Questions with any collection work left.
    pub fn incomplete_question_ids(&self) -> Vec<QuestionId> {
        self.data
            .questions
            .iter()
            .filter(|(_, p)| !p.is_complete())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Whether answers of `id` still need fetching. Unknown questions do.
    pub fn needs_answer_collection(&self, id: QuestionId) -> bool {
        self.data
            .questions
            .get(&id)
            .is_none_or(|p| !p.has_collected_answers())
    }

    /// Whether comments on `target` still need fetching. Unknown posts do.
    pub fn needs_comment_collection(&self, target: PostId, kind: PostKind) -> bool {
        let id = target.into_inner();
        match kind {
            PostKind::Question => self
                .data
                .questions
                .get(&QuestionId(id))
                .is_none_or(|p| !p.has_collected_question_comments()),
            PostKind::Answer => self
                .answer_index
                .get(&AnswerId(id))
                .and_then(|qid| self.data.questions.get(qid))
                .is_none_or(|p| !p.has_collected_answer_comments(AnswerId(id))),
        }
    }

    /// Per-question progress, ordered by question id.
    pub fn question_progress(&self) -> impl Iterator<Item = &QuestionProgress> {
        self.data.questions.values()
    }

    /// Comments whose post was not in the checkpoint when recorded.
    pub fn unattributed_comments(&self) -> impl Iterator<Item = &Comment> {
        self.data.unattributed_comments.values()
    }

    /// Number of completed questions, answers, and comments.
    pub fn completed_counts(&self) -> (usize, usize, usize) {
        (
            self.data.completed_question_ids.len(),
            self.data.completed_answer_ids.len(),
            self.data.completed_comment_ids.len(),
        )
    }

    /// Save, logging instead of failing.
    pub fn save(&self) {
        if let Err(e) = self.try_save() {
            error!(path = %self.path.display(), error = %e, "failed to save checkpoint");
        }
    }

    /// Serialize and atomically replace the checkpoint file.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointError`] if serialization, the temporary write,
    /// or the final replace fails. The previous file is left intact when
    /// the temporary write fails.
    pub fn try_save(&self) -> Result<(), CheckpointError> {
        let tmp = self.write_temp()?;
        self.commit_temp(&tmp)
    }

    /// Write the document to `<path>.tmp` and sync it.
    fn write_temp(&self) -> Result<PathBuf, CheckpointError> {
        let tmp = temp_path(&self.path);
        let mut writer = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer(&mut writer, &self.data)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        Ok(tmp)
    }

    /// Rename `tmp` over the checkpoint, falling back to delete-then-rename.
    fn commit_temp(&self, tmp: &Path) -> Result<(), CheckpointError> {
        if let Err(first) = fs::rename(tmp, &self.path) {
            warn!(
                path = %self.path.display(),
                error = %first,
                "atomic checkpoint rename failed, retrying as delete then rename"
            );
            match fs::remove_file(&self.path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            fs::rename(tmp, &self.path)?;
        }
        Ok(())
    }

    fn maybe_save(&self, completed: usize) {
        if completed.checked_rem(self.save_every) == Some(0) {
            self.save();
        }
    }

    fn touch(&mut self) {
        self.data.last_update = Utc::now();
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
