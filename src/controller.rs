use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::errors::SessionError;
use crate::llm_service::StudyAssistant;
use crate::log_store_operation;
use crate::models::{FlashcardRequest, SummaryRequest};
use crate::session::{Effect, SessionEvent, StudySession};
use crate::session_store::{COLLECTIONS_KEY, HISTORY_KEY, SNAPSHOT_KEY, SessionStore};
use crate::timer::TimerEvent;

const TIMER_CHANNEL_CAPACITY: usize = 64;

/// Work for the AI collaborator, run outside the controller lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorRequest {
    Summary(SummaryRequest),
    Flashcards(FlashcardRequest),
}

/// Owns the study session and applies its effects against the store
pub struct SessionController {
    session: StudySession,
    store: SessionStore,
    timer_events: broadcast::Sender<TimerEvent>,
}

impl SessionController {
    pub async fn load(store: SessionStore, default_minutes: u32) -> Self {
        let loaded = store.load_all().await;
        let (timer_events, _) = broadcast::channel(TIMER_CHANNEL_CAPACITY);

        Self {
            session: StudySession::from_loaded(loaded, default_minutes),
            store,
            timer_events,
        }
    }

    pub fn session(&self) -> &StudySession {
        &self.session
    }

    pub fn subscribe_timer(&self) -> broadcast::Receiver<TimerEvent> {
        self.timer_events.subscribe()
    }

    /// Apply one event. A rejected event touches neither the session nor the store.
    pub async fn dispatch(
        &mut self,
        event: SessionEvent,
    ) -> Result<Option<CollaboratorRequest>, SessionError> {
        let effects = self.session.handle(event)?;
        let request = self.run_effects(effects).await;
        self.flush().await;
        Ok(request)
    }

    pub async fn tick(&mut self) {
        let effects = self.session.tick();
        if !effects.is_empty() {
            self.run_effects(effects).await;
        }
    }

    /// Write dirty collections and history. Failures keep the flag set so the
    /// next flush retries.
    pub async fn flush(&mut self) {
        if self.session.library().collections_dirty() {
            let result = self
                .store
                .save_collections(self.session.library().collections())
                .await;
            match result {
                Ok(()) => self.session.library_mut().mark_collections_saved(),
                Err(e) => {
                    log_store_operation!(warn, "save", key = COLLECTIONS_KEY, error = e);
                }
            }
        }

        if self.session.library().history_dirty() {
            let result = self.store.save_history(self.session.library().history()).await;
            match result {
                Ok(()) => self.session.library_mut().mark_history_saved(),
                Err(e) => {
                    log_store_operation!(warn, "save", key = HISTORY_KEY, error = e);
                }
            }
        }
    }

    async fn run_effects(&mut self, effects: Vec<Effect>) -> Option<CollaboratorRequest> {
        let mut request = None;

        for effect in effects {
            match effect {
                Effect::RequestSummary(summary) => {
                    request = Some(CollaboratorRequest::Summary(summary));
                }
                Effect::RequestFlashcards(flashcards) => {
                    request = Some(CollaboratorRequest::Flashcards(flashcards));
                }
                Effect::SaveSnapshot(snapshot) => {
                    if let Err(e) = self.store.save_snapshot(&snapshot).await {
                        log_store_operation!(warn, "save", key = SNAPSHOT_KEY, error = e);
                    }
                }
                Effect::ClearSnapshot => {
                    if let Err(e) = self.store.clear_snapshot().await {
                        log_store_operation!(warn, "remove", key = SNAPSHOT_KEY, error = e);
                    }
                }
                Effect::Timer(timer_event) => {
                    // No subscribers is fine
                    if self.timer_events.send(timer_event).is_err() {
                        debug!(event = ?timer_event, "No timer subscribers");
                    }
                }
            }
        }

        request
    }
}

/// Run a collaborator request and turn its outcome into the event that
/// completes it.
pub async fn fulfil(assistant: &dyn StudyAssistant, request: CollaboratorRequest) -> SessionEvent {
    match request {
        CollaboratorRequest::Summary(summary_request) => {
            match assistant.generate_summary(&summary_request).await {
                Ok(summary) => SessionEvent::SummaryReady(summary),
                Err(e) => {
                    warn!(error = %e, "Summary generation failed");
                    SessionEvent::SummaryFailed(None)
                }
            }
        }
        CollaboratorRequest::Flashcards(flashcard_request) => {
            match assistant.generate_flashcards(&flashcard_request).await {
                Ok(cards) => SessionEvent::CardsReady(cards),
                Err(e) => {
                    warn!(error = %e, "Flashcard generation failed");
                    SessionEvent::CardsFailed(None)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Collection, Flashcard, LeitnerBox, Stage};
    use crate::storage::{KeyValueStore, MemoryStore};
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FixedAssistant;

    #[async_trait]
    impl StudyAssistant for FixedAssistant {
        async fn generate_summary(&self, request: &SummaryRequest) -> Result<String> {
            Ok(format!("Summary of {}", request.text))
        }

        async fn generate_flashcards(&self, _request: &FlashcardRequest) -> Result<Vec<Flashcard>> {
            Ok(vec![Flashcard::new("Q1", "A1"), Flashcard::new("Q2", "A2")])
        }
    }

    struct FailingAssistant;

    #[async_trait]
    impl StudyAssistant for FailingAssistant {
        async fn generate_summary(&self, _request: &SummaryRequest) -> Result<String> {
            Err(anyhow::anyhow!("quota exceeded"))
        }

        async fn generate_flashcards(&self, _request: &FlashcardRequest) -> Result<Vec<Flashcard>> {
            Err(anyhow::anyhow!("quota exceeded"))
        }
    }

    async fn controller() -> (Arc<MemoryStore>, SessionController) {
        let kv = Arc::new(MemoryStore::new());
        let controller = SessionController::load(SessionStore::new(kv.clone()), 5).await;
        (kv, controller)
    }

    async fn run(controller: &mut SessionController, assistant: &dyn StudyAssistant, event: SessionEvent) {
        let request = controller.dispatch(event).await.unwrap();
        if let Some(request) = request {
            let outcome = fulfil(assistant, request).await;
            controller.dispatch(outcome).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_full_flow_persists_collection_and_history() {
        let (kv, mut controller) = controller().await;
        let assistant = FixedAssistant;

        run(&mut controller, &assistant, SessionEvent::StartNew).await;
        run(
            &mut controller,
            &assistant,
            SessionEvent::GenerateSummary {
                text: "Cells".to_string(),
                image: None,
            },
        )
        .await;
        assert_eq!(controller.session().summary(), "Summary of Cells");

        run(&mut controller, &assistant, SessionEvent::CreateFlashcards).await;
        assert_eq!(controller.session().stage(), Stage::Studying);
        assert!(kv.get(SNAPSHOT_KEY).await.unwrap().is_some());

        for _ in 0..2 {
            let card_id = controller.session().boxes().unseen[0].id.clone();
            run(
                &mut controller,
                &assistant,
                SessionEvent::Grade {
                    card_id,
                    bucket: LeitnerBox::Know,
                },
            )
            .await;
        }
        assert_eq!(controller.session().stage(), Stage::Finished);
        assert!(kv.get(SNAPSHOT_KEY).await.unwrap().is_none());

        run(
            &mut controller,
            &assistant,
            SessionEvent::SaveAsNew {
                name: "Biology".to_string(),
            },
        )
        .await;

        let collections: Vec<Collection> =
            serde_json::from_str(&kv.get(COLLECTIONS_KEY).await.unwrap().unwrap()).unwrap();
        assert_eq!(collections.len(), 1);
        assert_eq!(collections[0].name, "Biology");
        assert!(kv.get(HISTORY_KEY).await.unwrap().is_some());
        assert!(!controller.session().library().collections_dirty());
    }

    #[tokio::test]
    async fn test_collaborator_failure_uses_fallback_message() {
        let (_, mut controller) = controller().await;
        let assistant = FailingAssistant;

        run(&mut controller, &assistant, SessionEvent::StartNew).await;
        run(
            &mut controller,
            &assistant,
            SessionEvent::GenerateSummary {
                text: "Cells".to_string(),
                image: None,
            },
        )
        .await;

        assert_eq!(controller.session().stage(), Stage::Upload);
        assert_eq!(
            controller.session().error(),
            Some(crate::session::SUMMARY_FALLBACK_MESSAGE)
        );
    }

    #[tokio::test]
    async fn test_timer_events_are_broadcast() {
        let (_, mut controller) = controller().await;
        let mut timer_rx = controller.subscribe_timer();
        let assistant = FixedAssistant;

        run(&mut controller, &assistant, SessionEvent::StartNew).await;
        run(
            &mut controller,
            &assistant,
            SessionEvent::GenerateSummary {
                text: "Cells".to_string(),
                image: None,
            },
        )
        .await;
        run(&mut controller, &assistant, SessionEvent::CreateFlashcards).await;
        controller.tick().await;
        run(&mut controller, &assistant, SessionEvent::FinishEarly).await;
        run(&mut controller, &assistant, SessionEvent::ReturnToDashboard).await;

        let mut received = Vec::new();
        while let Ok(event) = timer_rx.try_recv() {
            received.push(event);
        }
        assert_eq!(
            received,
            vec![
                TimerEvent::Reset {
                    seconds_remaining: 300
                },
                TimerEvent::Reset {
                    seconds_remaining: 300
                },
                TimerEvent::Started {
                    seconds_remaining: 300
                },
                TimerEvent::Tick {
                    seconds_remaining: 299
                },
                TimerEvent::Paused {
                    seconds_remaining: 299
                },
                TimerEvent::Reset {
                    seconds_remaining: 300
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_rejected_event_writes_nothing() {
        let (kv, mut controller) = controller().await;
        let err = controller.dispatch(SessionEvent::FinishEarly).await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransition { .. }));
        assert!(kv.get(SNAPSHOT_KEY).await.unwrap().is_none());
        assert!(kv.get(COLLECTIONS_KEY).await.unwrap().is_none());
    }

    /// Memory store whose writes fail while `failing` is set
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        failing: AtomicBool,
    }

    #[async_trait]
    impl KeyValueStore for FlakyStore {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(anyhow::anyhow!("disk full"));
            }
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(anyhow::anyhow!("disk full"));
            }
            self.inner.remove(key).await
        }
    }

    #[tokio::test]
    async fn test_failed_writes_keep_state_and_retry_on_next_flush() {
        let kv = Arc::new(FlakyStore::default());
        let mut controller = SessionController::load(SessionStore::new(kv.clone()), 5).await;
        let assistant = FixedAssistant;

        run(&mut controller, &assistant, SessionEvent::StartNew).await;
        run(
            &mut controller,
            &assistant,
            SessionEvent::GenerateSummary {
                text: "Cells".to_string(),
                image: None,
            },
        )
        .await;
        run(&mut controller, &assistant, SessionEvent::CreateFlashcards).await;

        kv.failing.store(true, Ordering::SeqCst);
        let card_id = controller.session().boxes().unseen[0].id.clone();
        run(
            &mut controller,
            &assistant,
            SessionEvent::Grade {
                card_id,
                bucket: LeitnerBox::Regular,
            },
        )
        .await;
        run(&mut controller, &assistant, SessionEvent::FinishEarly).await;
        run(
            &mut controller,
            &assistant,
            SessionEvent::SaveAsNew {
                name: "Biology".to_string(),
            },
        )
        .await;

        let session = controller.session();
        assert_eq!(session.stage(), Stage::Dashboard);
        assert_eq!(session.library().collections().len(), 1);
        assert_eq!(session.library().history().len(), 1);
        assert!(session.library().collections_dirty());
        assert!(session.library().history_dirty());
        assert!(kv.get(COLLECTIONS_KEY).await.unwrap().is_none());

        kv.failing.store(false, Ordering::SeqCst);
        controller.flush().await;

        assert!(!controller.session().library().collections_dirty());
        assert!(!controller.session().library().history_dirty());
        let collections: Vec<Collection> =
            serde_json::from_str(&kv.get(COLLECTIONS_KEY).await.unwrap().unwrap()).unwrap();
        assert_eq!(collections[0].name, "Biology");
        assert!(kv.get(HISTORY_KEY).await.unwrap().is_some());
    }
}
