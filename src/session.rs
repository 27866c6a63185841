use regex::Regex;
use std::sync::LazyLock;
use uuid::Uuid;

use crate::errors::SessionError;
use crate::log_transition;
use crate::models::{
    Collection, Flashcard, FlashcardRequest, ImageAttachment, LeitnerBox, LeitnerBoxes,
    SavedSessionState, SessionScore, Stage, StudySessionRecord, SummaryRequest,
};
use crate::session_store::LoadedState;
use crate::timer::{SessionTimer, TimerEvent};

pub const SUMMARY_FALLBACK_MESSAGE: &str =
    "Could not generate the summary. Check the material or try again.";
pub const FLASHCARDS_FALLBACK_MESSAGE: &str =
    "Could not generate flashcards. Check the material or try again.";
pub const NO_CARDS_MESSAGE: &str = "No flashcards could be generated. Please try again.";

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Commands and collaborator outcomes the state machine reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    StartNew,
    StudyCollection { collection_id: String },
    ResumeSession,
    DeleteCollection { collection_id: String },
    GenerateSummary {
        text: String,
        image: Option<ImageAttachment>,
    },
    SummaryReady(String),
    SummaryFailed(Option<String>),
    EditSummary(String),
    CreateFlashcards,
    CardsReady(Vec<Flashcard>),
    CardsFailed(Option<String>),
    Grade { card_id: String, bucket: LeitnerBox },
    FinishEarly,
    Repeat,
    SaveAsNew { name: String },
    UpdateExisting,
    ReturnToDashboard,
    SetTimerDuration(u32),
    StartTimer,
    PauseTimer,
    ResetTimer,
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::StartNew => "start a new session",
            SessionEvent::StudyCollection { .. } => "study a collection",
            SessionEvent::ResumeSession => "resume a session",
            SessionEvent::DeleteCollection { .. } => "delete a collection",
            SessionEvent::GenerateSummary { .. } => "generate a summary",
            SessionEvent::SummaryReady(_) => "accept a summary",
            SessionEvent::SummaryFailed(_) => "report a summary failure",
            SessionEvent::EditSummary(_) => "edit the summary",
            SessionEvent::CreateFlashcards => "create flashcards",
            SessionEvent::CardsReady(_) => "accept flashcards",
            SessionEvent::CardsFailed(_) => "report a flashcard failure",
            SessionEvent::Grade { .. } => "grade a card",
            SessionEvent::FinishEarly => "finish the session",
            SessionEvent::Repeat => "repeat the session",
            SessionEvent::SaveAsNew { .. } => "save a new collection",
            SessionEvent::UpdateExisting => "update the collection",
            SessionEvent::ReturnToDashboard => "return to the dashboard",
            SessionEvent::SetTimerDuration(_) => "change the timer duration",
            SessionEvent::StartTimer => "start the timer",
            SessionEvent::PauseTimer => "pause the timer",
            SessionEvent::ResetTimer => "reset the timer",
        }
    }
}

/// Work the owner of the state machine must carry out after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    RequestSummary(SummaryRequest),
    RequestFlashcards(FlashcardRequest),
    SaveSnapshot(Box<SavedSessionState>),
    ClearSnapshot,
    Timer(TimerEvent),
}

/// Saved collections and study history, with dirty flags for the next flush
#[derive(Debug, Clone, Default)]
pub struct Library {
    collections: Vec<Collection>,
    history: Vec<StudySessionRecord>,
    collections_dirty: bool,
    history_dirty: bool,
}

impl Library {
    pub fn new(collections: Vec<Collection>, history: Vec<StudySessionRecord>) -> Self {
        Self {
            collections,
            history,
            collections_dirty: false,
            history_dirty: false,
        }
    }

    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    pub fn history(&self) -> &[StudySessionRecord] {
        &self.history
    }

    pub fn collection(&self, id: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.id == id)
    }

    pub fn collections_dirty(&self) -> bool {
        self.collections_dirty
    }

    pub fn history_dirty(&self) -> bool {
        self.history_dirty
    }

    pub fn mark_collections_saved(&mut self) {
        self.collections_dirty = false;
    }

    pub fn mark_history_saved(&mut self) {
        self.history_dirty = false;
    }

    fn add_collection(&mut self, collection: Collection) {
        self.collections.push(collection);
        self.collections_dirty = true;
    }

    fn record(&mut self, record: StudySessionRecord) {
        self.history.push(record);
        self.history_dirty = true;
    }
}

/// Score on a 1..=10 scale, `None` when nothing was graded.
///
/// `(know + regular / 2) / total * 10`, rounded half up, never below 1.
pub fn compute_score(know: usize, regular: usize, dont_know: usize) -> Option<u8> {
    let total = know + regular + dont_know;
    if total == 0 {
        return None;
    }

    // Integer form of round((2k + r) * 5 / total)
    let numerator = (2 * know + regular) * 5;
    let rounded = (2 * numerator + total) / (2 * total);
    Some(rounded.clamp(1, 10) as u8)
}

/// The study session state machine.
///
/// Owns the current stage, the card partition, the timer and the pending
/// score. Every transition goes through [`StudySession::handle`], which
/// either applies the event and returns the effects to run, or rejects it and
/// leaves the session untouched.
#[derive(Debug, Clone)]
pub struct StudySession {
    stage: Stage,
    boxes: LeitnerBoxes,
    summary: String,
    original_text: String,
    image: Option<ImageAttachment>,
    error: Option<String>,
    current_collection_id: Option<String>,
    pending_score: Option<SessionScore>,
    timer: SessionTimer,
    library: Library,
    snapshot: Option<SavedSessionState>,
}

impl StudySession {
    pub fn new(timer_minutes: u32) -> Self {
        Self::from_loaded(LoadedState::default(), timer_minutes)
    }

    pub fn from_loaded(loaded: LoadedState, timer_minutes: u32) -> Self {
        Self {
            stage: Stage::Dashboard,
            boxes: LeitnerBoxes::default(),
            summary: String::new(),
            original_text: String::new(),
            image: None,
            error: None,
            current_collection_id: None,
            pending_score: None,
            timer: SessionTimer::new(timer_minutes),
            library: Library::new(loaded.collections, loaded.history),
            snapshot: loaded.snapshot.filter(SavedSessionState::is_resumable),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn boxes(&self) -> &LeitnerBoxes {
        &self.boxes
    }

    pub fn current_card(&self) -> Option<&Flashcard> {
        match self.stage {
            Stage::Studying => self.boxes.current_card(),
            _ => None,
        }
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn current_collection_id(&self) -> Option<&str> {
        self.current_collection_id.as_deref()
    }

    pub fn pending_score(&self) -> Option<&SessionScore> {
        self.pending_score.as_ref()
    }

    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut Library {
        &mut self.library
    }

    /// The snapshot currently known to be persisted, if any
    pub fn saved_snapshot(&self) -> Option<&SavedSessionState> {
        self.snapshot.as_ref()
    }

    pub fn can_resume(&self) -> bool {
        self.stage == Stage::Dashboard && self.snapshot.is_some()
    }

    pub fn handle(&mut self, event: SessionEvent) -> Result<Vec<Effect>, SessionError> {
        let from = self.stage;
        let name = event.name();

        match self.apply(event) {
            Ok(mut effects) => {
                self.sync_snapshot(from, &mut effects);
                log_transition!(from, name, self.stage);
                Ok(effects)
            }
            Err(e) => {
                log_transition!(rejected, from, name, error = e);
                Err(e)
            }
        }
    }

    /// Advance the clock by one second. Expiry stops the clock but leaves the
    /// stage alone.
    pub fn tick(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(event) = self.timer.tick() {
            effects.push(Effect::Timer(event));
            if self.stage == Stage::Studying && !self.boxes.unseen.is_empty() {
                let snapshot = self.build_snapshot();
                self.snapshot = Some(snapshot.clone());
                effects.push(Effect::SaveSnapshot(Box::new(snapshot)));
            }
        }
        effects
    }

    fn apply(&mut self, event: SessionEvent) -> Result<Vec<Effect>, SessionError> {
        let stage = self.stage;
        let invalid = |event: &SessionEvent| SessionError::InvalidTransition {
            stage,
            event: event.name(),
        };

        match (stage, event) {
            (Stage::Dashboard, SessionEvent::StartNew) => {
                let effects = self.leave_session();
                self.stage = Stage::Upload;
                Ok(effects)
            }
            (Stage::Dashboard, SessionEvent::StudyCollection { collection_id }) => {
                let collection = self
                    .library
                    .collection(&collection_id)
                    .ok_or_else(|| SessionError::CollectionNotFound(collection_id.clone()))?;
                if collection.cards.is_empty() {
                    return Err(SessionError::EmptyCollection(collection_id));
                }
                let cards = collection.cards.clone();

                self.clear_session_fields();
                self.boxes = LeitnerBoxes::with_unseen(cards);
                self.current_collection_id = Some(collection_id);
                self.stage = Stage::Studying;
                Ok(self.restart_timer())
            }
            (Stage::Dashboard, SessionEvent::ResumeSession) => {
                let snapshot = self.snapshot.take().ok_or(SessionError::NoSavedSession)?;

                self.clear_session_fields();
                self.boxes = snapshot.leitner_boxes;
                self.summary = snapshot.summary;
                self.original_text = snapshot.original_text;
                self.current_collection_id = snapshot.current_collection_id;
                self.timer
                    .restore(snapshot.initial_minutes, snapshot.seconds_left);
                self.stage = Stage::Studying;

                let mut effects = vec![Effect::ClearSnapshot];
                effects.extend(self.timer.start().map(Effect::Timer));
                Ok(effects)
            }
            (Stage::Dashboard, SessionEvent::DeleteCollection { collection_id }) => {
                let index = self
                    .library
                    .collections
                    .iter()
                    .position(|c| c.id == collection_id)
                    .ok_or(SessionError::CollectionNotFound(collection_id))?;
                self.library.collections.remove(index);
                self.library.collections_dirty = true;
                Ok(Vec::new())
            }
            (Stage::Upload, SessionEvent::GenerateSummary { text, image }) => {
                if text.trim().is_empty() && image.is_none() {
                    return Err(SessionError::NoMaterial);
                }

                self.original_text = text.clone();
                self.image = image.clone();
                self.error = None;
                self.stage = Stage::GeneratingSummary;
                Ok(vec![Effect::RequestSummary(SummaryRequest { text, image })])
            }
            (
                Stage::Upload | Stage::Summary | Stage::Finished,
                SessionEvent::ReturnToDashboard,
            ) => {
                let effects = self.leave_session();
                self.stage = Stage::Dashboard;
                Ok(effects)
            }
            (Stage::GeneratingSummary, SessionEvent::SummaryReady(summary)) => {
                self.summary = summary;
                self.stage = Stage::Summary;
                Ok(Vec::new())
            }
            (Stage::GeneratingSummary, SessionEvent::SummaryFailed(message)) => {
                self.error = Some(message_or(message, SUMMARY_FALLBACK_MESSAGE));
                self.stage = Stage::Upload;
                Ok(Vec::new())
            }
            (Stage::Summary, SessionEvent::EditSummary(summary)) => {
                self.summary = summary;
                Ok(Vec::new())
            }
            (Stage::Summary, SessionEvent::CreateFlashcards) => {
                self.error = None;
                self.stage = Stage::GeneratingCards;
                Ok(vec![Effect::RequestFlashcards(FlashcardRequest {
                    summary: self.summary.clone(),
                    original_text: self.original_text.clone(),
                    image: self.image.clone(),
                })])
            }
            (Stage::GeneratingCards, SessionEvent::CardsReady(cards)) => {
                if cards.is_empty() {
                    self.error = Some(NO_CARDS_MESSAGE.to_string());
                    self.stage = Stage::Summary;
                    return Ok(Vec::new());
                }

                self.boxes = LeitnerBoxes::with_unseen(cards);
                self.pending_score = None;
                self.stage = Stage::Studying;
                Ok(self.restart_timer())
            }
            (Stage::GeneratingCards, SessionEvent::CardsFailed(message)) => {
                self.error = Some(message_or(message, FLASHCARDS_FALLBACK_MESSAGE));
                self.stage = Stage::Summary;
                Ok(Vec::new())
            }
            (Stage::Studying, SessionEvent::Grade { card_id, bucket }) => {
                match self.boxes.unseen.first() {
                    Some(front) if front.id == card_id => {}
                    _ => {
                        if !self.boxes.contains(&card_id) {
                            tracing::debug!(card_id = %card_id, "Graded card is not in the deck");
                        }
                        return Err(SessionError::NotFrontCard(card_id));
                    }
                }

                let card = self.boxes.unseen.remove(0);
                tracing::debug!(card_id = %card.id, bucket = bucket.as_str(), "Card graded");
                self.boxes.bucket_mut(bucket).push(card);

                let mut effects = Vec::new();
                if self.boxes.unseen.is_empty() {
                    self.finish(&mut effects);
                }
                Ok(effects)
            }
            (Stage::Studying, SessionEvent::FinishEarly) => {
                let mut effects = Vec::new();
                self.finish(&mut effects);
                Ok(effects)
            }
            (Stage::Studying, SessionEvent::SetTimerDuration(minutes)) => {
                Ok(vec![Effect::Timer(self.timer.set_duration(minutes)?)])
            }
            (Stage::Studying, SessionEvent::StartTimer) => {
                Ok(self.timer.start().map(Effect::Timer).into_iter().collect())
            }
            (Stage::Studying, SessionEvent::PauseTimer) => {
                Ok(self.timer.pause().map(Effect::Timer).into_iter().collect())
            }
            (Stage::Studying, SessionEvent::ResetTimer) => {
                Ok(vec![Effect::Timer(self.timer.reset())])
            }
            (Stage::Finished, SessionEvent::Repeat) => {
                let boxes = std::mem::take(&mut self.boxes);
                let cards: Vec<Flashcard> = boxes
                    .dont_know
                    .into_iter()
                    .chain(boxes.regular)
                    .chain(boxes.know)
                    .chain(boxes.unseen)
                    .collect();

                self.boxes = LeitnerBoxes::with_unseen(cards);
                self.pending_score = None;
                self.stage = Stage::Studying;
                Ok(self.restart_timer())
            }
            (Stage::Finished, SessionEvent::SaveAsNew { name }) => {
                let name = normalize_collection_name(&name);
                if name.is_empty() {
                    return Err(SessionError::EmptyCollectionName);
                }
                if self.boxes.graded_count() == 0 {
                    return Err(SessionError::NothingToSave);
                }

                let collection = Collection {
                    id: format!("col-{}", Uuid::new_v4()),
                    name,
                    cards: self.boxes.graded_for_collection(),
                };
                tracing::info!(
                    collection_id = %collection.id,
                    card_count = collection.cards.len(),
                    "Saving session as new collection"
                );

                if let Some(score) = self.pending_score.take() {
                    self.library.record(score.into_record(&collection.name));
                }
                self.library.add_collection(collection);

                let effects = self.leave_session();
                self.stage = Stage::Dashboard;
                Ok(effects)
            }
            (Stage::Finished, SessionEvent::UpdateExisting) => {
                let collection_id = self
                    .current_collection_id
                    .clone()
                    .ok_or(SessionError::NoCurrentCollection)?;
                let index = self
                    .library
                    .collections
                    .iter()
                    .position(|c| c.id == collection_id)
                    .ok_or_else(|| SessionError::CollectionNotFound(collection_id.clone()))?;
                if self.boxes.graded_count() == 0 {
                    return Err(SessionError::NothingToSave);
                }

                let cards = self.boxes.graded_for_collection();
                let collection = &mut self.library.collections[index];
                collection.cards = cards;
                let collection_name = collection.name.clone();
                self.library.collections_dirty = true;
                tracing::info!(
                    collection_id = %collection_id,
                    "Updated existing collection from session"
                );

                if let Some(score) = self.pending_score.take() {
                    self.library.record(score.into_record(&collection_name));
                }

                let effects = self.leave_session();
                self.stage = Stage::Dashboard;
                Ok(effects)
            }
            (_, event) => Err(invalid(&event)),
        }
    }

    fn finish(&mut self, effects: &mut Vec<Effect>) {
        effects.extend(self.timer.pause().map(Effect::Timer));

        let boxes = &self.boxes;
        self.pending_score = compute_score(
            boxes.know.len(),
            boxes.regular.len(),
            boxes.dont_know.len(),
        )
        .map(|score| SessionScore {
            know_count: boxes.know.len(),
            regular_count: boxes.regular.len(),
            dont_know_count: boxes.dont_know.len(),
            total_time_seconds: self.timer.elapsed_seconds(),
            score,
        });
        self.stage = Stage::Finished;
    }

    fn restart_timer(&mut self) -> Vec<Effect> {
        let mut effects = vec![Effect::Timer(self.timer.reset())];
        effects.extend(self.timer.start().map(Effect::Timer));
        effects
    }

    fn clear_session_fields(&mut self) {
        self.boxes = LeitnerBoxes::default();
        self.summary.clear();
        self.original_text.clear();
        self.image = None;
        self.error = None;
        self.current_collection_id = None;
        self.pending_score = None;
    }

    /// Drop the current attempt and put the clock back to its full duration
    fn leave_session(&mut self) -> Vec<Effect> {
        self.clear_session_fields();
        vec![Effect::Timer(self.timer.reset())]
    }

    fn build_snapshot(&self) -> SavedSessionState {
        SavedSessionState {
            stage: Stage::Studying,
            leitner_boxes: self.boxes.clone(),
            summary: self.summary.clone(),
            original_text: self.original_text.clone(),
            seconds_left: self.timer.seconds_remaining(),
            initial_minutes: self.timer.initial_minutes(),
            current_collection_id: self.current_collection_id.clone(),
        }
    }

    /// Keep the persisted snapshot in line with the session: present while
    /// studying with cards left, removed once another stage is entered.
    fn sync_snapshot(&mut self, from: Stage, effects: &mut Vec<Effect>) {
        if self.stage == Stage::Studying && !self.boxes.unseen.is_empty() {
            let snapshot = self.build_snapshot();
            self.snapshot = Some(snapshot.clone());
            effects.push(Effect::SaveSnapshot(Box::new(snapshot)));
        } else if self.stage != from && self.snapshot.take().is_some() {
            effects.push(Effect::ClearSnapshot);
        }
    }
}

fn message_or(message: Option<String>, fallback: &str) -> String {
    message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Trim a collection name and collapse inner whitespace runs to single spaces
pub fn normalize_collection_name(name: &str) -> String {
    WHITESPACE_RUN.replace_all(name.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deck(n: usize) -> Vec<Flashcard> {
        (1..=n)
            .map(|i| Flashcard {
                id: format!("card-{}", i),
                question: format!("Question {}", i),
                answer: format!("Answer {}", i),
            })
            .collect()
    }

    fn studying_session(cards: Vec<Flashcard>) -> StudySession {
        let mut session = StudySession::new(5);
        session.handle(SessionEvent::StartNew).unwrap();
        session
            .handle(SessionEvent::GenerateSummary {
                text: "Photosynthesis".to_string(),
                image: None,
            })
            .unwrap();
        session
            .handle(SessionEvent::SummaryReady("summary".to_string()))
            .unwrap();
        session.handle(SessionEvent::CreateFlashcards).unwrap();
        session.handle(SessionEvent::CardsReady(cards)).unwrap();
        session
    }

    fn grade_front(session: &mut StudySession, bucket: LeitnerBox) -> Vec<Effect> {
        let card_id = session.boxes().unseen[0].id.clone();
        session
            .handle(SessionEvent::Grade { card_id, bucket })
            .unwrap()
    }

    #[test]
    fn test_score_examples() {
        assert_eq!(compute_score(3, 2, 5), Some(4));
        assert_eq!(compute_score(0, 0, 0), None);
        assert_eq!(compute_score(10, 0, 0), Some(10));
        assert_eq!(compute_score(0, 0, 4), Some(1));
        // 2.5 rounds half up
        assert_eq!(compute_score(0, 1, 1), Some(3));
        // 6.666... rounds to 7
        assert_eq!(compute_score(2, 0, 1), Some(7));
    }

    #[test]
    fn test_normalize_collection_name() {
        assert_eq!(normalize_collection_name("  History \t Unit  1 "), "History Unit 1");
        assert_eq!(normalize_collection_name(" \n "), "");
    }

    #[test]
    fn test_cards_ready_starts_timer_and_snapshots() {
        let mut session = StudySession::new(5);
        session.handle(SessionEvent::StartNew).unwrap();
        session
            .handle(SessionEvent::GenerateSummary {
                text: "text".to_string(),
                image: None,
            })
            .unwrap();
        session
            .handle(SessionEvent::SummaryReady("s".to_string()))
            .unwrap();
        session.handle(SessionEvent::CreateFlashcards).unwrap();

        let effects = session.handle(SessionEvent::CardsReady(deck(2))).unwrap();
        assert_eq!(session.stage(), Stage::Studying);
        assert!(session.timer().is_running());
        assert!(effects.contains(&Effect::Timer(TimerEvent::Started {
            seconds_remaining: 300
        })));
        assert!(matches!(effects.last(), Some(Effect::SaveSnapshot(_))));
    }

    #[test]
    fn test_auto_finish_stops_timer_and_scores() {
        let mut session = studying_session(deck(2));
        session.tick();
        session.tick();

        grade_front(&mut session, LeitnerBox::Know);
        let effects = grade_front(&mut session, LeitnerBox::Regular);

        assert_eq!(session.stage(), Stage::Finished);
        assert!(!session.timer().is_running());
        assert!(effects.contains(&Effect::ClearSnapshot));

        let score = session.pending_score().unwrap();
        assert_eq!(score.know_count, 1);
        assert_eq!(score.regular_count, 1);
        assert_eq!(score.total_time_seconds, 2);
        // (1 + 0.5) / 2 * 10 = 7.5 -> 8
        assert_eq!(score.score, 8);
    }

    #[test]
    fn test_timer_expiry_does_not_end_session() {
        let mut session = studying_session(deck(2));
        session
            .handle(SessionEvent::PauseTimer)
            .unwrap();
        session
            .handle(SessionEvent::SetTimerDuration(1))
            .unwrap();
        session.handle(SessionEvent::StartTimer).unwrap();

        for _ in 0..60 {
            session.tick();
        }
        assert!(session.timer().is_expired());
        assert_eq!(session.stage(), Stage::Studying);

        grade_front(&mut session, LeitnerBox::Know);
        assert_eq!(session.stage(), Stage::Studying);
    }

    #[test]
    fn test_invalid_event_leaves_state_untouched() {
        let mut session = StudySession::new(5);
        let err = session.handle(SessionEvent::Repeat).unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransition { .. }));
        assert_eq!(session.stage(), Stage::Dashboard);
    }

    #[test]
    fn test_second_summary_request_rejected_while_pending() {
        let mut session = StudySession::new(5);
        session.handle(SessionEvent::StartNew).unwrap();
        session
            .handle(SessionEvent::GenerateSummary {
                text: "text".to_string(),
                image: None,
            })
            .unwrap();

        let again = session.handle(SessionEvent::GenerateSummary {
            text: "text".to_string(),
            image: None,
        });
        assert!(again.is_err());
        assert_eq!(session.stage(), Stage::GeneratingSummary);
    }

    #[test]
    fn test_collaborator_failure_message_fallback() {
        let mut session = StudySession::new(5);
        session.handle(SessionEvent::StartNew).unwrap();
        session
            .handle(SessionEvent::GenerateSummary {
                text: "text".to_string(),
                image: None,
            })
            .unwrap();
        session
            .handle(SessionEvent::SummaryFailed(Some("   ".to_string())))
            .unwrap();

        assert_eq!(session.stage(), Stage::Upload);
        assert_eq!(session.error(), Some(SUMMARY_FALLBACK_MESSAGE));
    }
}
