use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timer::MAX_TIMER_MINUTES;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: String,
    pub question: String,
    pub answer: String,
}

impl Flashcard {
    /// Build a card with a freshly generated `card-<uuid>` identifier
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            id: format!("card-{}", Uuid::new_v4()),
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// The three grading buckets a learner can send a card to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeitnerBox {
    Know,
    Regular,
    DontKnow,
}

impl LeitnerBox {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeitnerBox::Know => "know",
            LeitnerBox::Regular => "regular",
            LeitnerBox::DontKnow => "dont_know",
        }
    }
}

/// Partition of the active deck. A card lives in exactly one of the four buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeitnerBoxes {
    pub unseen: Vec<Flashcard>,
    pub know: Vec<Flashcard>,
    pub regular: Vec<Flashcard>,
    pub dont_know: Vec<Flashcard>,
}

impl LeitnerBoxes {
    pub fn with_unseen(cards: Vec<Flashcard>) -> Self {
        Self {
            unseen: cards,
            ..Self::default()
        }
    }

    pub fn bucket(&self, target: LeitnerBox) -> &[Flashcard] {
        match target {
            LeitnerBox::Know => &self.know,
            LeitnerBox::Regular => &self.regular,
            LeitnerBox::DontKnow => &self.dont_know,
        }
    }

    pub fn bucket_mut(&mut self, target: LeitnerBox) -> &mut Vec<Flashcard> {
        match target {
            LeitnerBox::Know => &mut self.know,
            LeitnerBox::Regular => &mut self.regular,
            LeitnerBox::DontKnow => &mut self.dont_know,
        }
    }

    pub fn current_card(&self) -> Option<&Flashcard> {
        self.unseen.first()
    }

    pub fn graded_count(&self) -> usize {
        self.know.len() + self.regular.len() + self.dont_know.len()
    }

    pub fn total_count(&self) -> usize {
        self.unseen.len() + self.graded_count()
    }

    pub fn contains(&self, card_id: &str) -> bool {
        self.unseen
            .iter()
            .chain(&self.know)
            .chain(&self.regular)
            .chain(&self.dont_know)
            .any(|card| card.id == card_id)
    }

    /// Graded cards in the order they are stored in a saved collection
    pub fn graded_for_collection(&self) -> Vec<Flashcard> {
        self.know
            .iter()
            .chain(&self.regular)
            .chain(&self.dont_know)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub name: String,
    pub cards: Vec<Flashcard>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySessionRecord {
    pub id: String,
    pub date: DateTime<Utc>,
    pub collection_name: String,
    pub know_count: usize,
    pub regular_count: usize,
    pub dont_know_count: usize,
    pub total_time_seconds: u32,
    pub score: u8,
}

/// Result of a finished session, held until the learner decides what to do with it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionScore {
    pub know_count: usize,
    pub regular_count: usize,
    pub dont_know_count: usize,
    pub total_time_seconds: u32,
    pub score: u8,
}

impl SessionScore {
    pub fn into_record(self, collection_name: &str) -> StudySessionRecord {
        StudySessionRecord {
            id: Uuid::new_v4().to_string(),
            date: Utc::now(),
            collection_name: collection_name.to_string(),
            know_count: self.know_count,
            regular_count: self.regular_count,
            dont_know_count: self.dont_know_count,
            total_time_seconds: self.total_time_seconds,
            score: self.score,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    Dashboard,
    Upload,
    GeneratingSummary,
    Summary,
    GeneratingCards,
    Studying,
    Finished,
}

/// Resume snapshot of an in-progress study session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSessionState {
    pub stage: Stage,
    pub leitner_boxes: LeitnerBoxes,
    pub summary: String,
    pub original_text: String,
    pub seconds_left: u32,
    pub initial_minutes: u32,
    pub current_collection_id: Option<String>,
}

impl SavedSessionState {
    pub fn is_resumable(&self) -> bool {
        self.stage == Stage::Studying
            && !self.leitner_boxes.unseen.is_empty()
            && (1..=MAX_TIMER_MINUTES).contains(&self.initial_minutes)
    }
}

/// Base64-encoded image supplied alongside the study material
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttachment {
    pub data: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRequest {
    pub text: String,
    pub image: Option<ImageAttachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardRequest {
    pub summary: String,
    pub original_text: String,
    pub image: Option<ImageAttachment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: &str) -> Flashcard {
        Flashcard {
            id: id.to_string(),
            question: format!("q-{}", id),
            answer: format!("a-{}", id),
        }
    }

    #[test]
    fn test_generated_card_ids_are_unique() {
        let a = Flashcard::new("What?", "That.");
        let b = Flashcard::new("What?", "That.");
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("card-"));
    }

    #[test]
    fn test_bucket_lookup_by_enum() {
        let mut boxes = LeitnerBoxes::with_unseen(vec![card("1")]);
        boxes.bucket_mut(LeitnerBox::DontKnow).push(card("2"));

        assert_eq!(boxes.bucket(LeitnerBox::DontKnow).len(), 1);
        assert!(boxes.bucket(LeitnerBox::Know).is_empty());
        assert_eq!(boxes.total_count(), 2);
        assert_eq!(boxes.graded_count(), 1);
        assert!(boxes.contains("2"));
        assert!(!boxes.contains("3"));
    }

    #[test]
    fn test_snapshot_with_out_of_range_minutes_is_not_resumable() {
        let mut snapshot = SavedSessionState {
            stage: Stage::Studying,
            leitner_boxes: LeitnerBoxes::with_unseen(vec![card("1")]),
            summary: String::new(),
            original_text: String::new(),
            seconds_left: 60,
            initial_minutes: 5,
            current_collection_id: None,
        };
        assert!(snapshot.is_resumable());

        snapshot.initial_minutes = u32::MAX;
        assert!(!snapshot.is_resumable());

        snapshot.initial_minutes = 0;
        assert!(!snapshot.is_resumable());
    }

    #[test]
    fn test_collection_order_is_know_regular_dont_know() {
        let boxes = LeitnerBoxes {
            unseen: vec![card("u")],
            know: vec![card("k")],
            regular: vec![card("r1"), card("r2")],
            dont_know: vec![card("d")],
        };

        let ids: Vec<String> = boxes
            .graded_for_collection()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec!["k", "r1", "r2", "d"]);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&LeitnerBox::DontKnow).unwrap(),
            "\"dont_know\""
        );
        assert_eq!(
            serde_json::to_string(&Stage::GeneratingSummary).unwrap(),
            "\"generatingSummary\""
        );

        let snapshot = SavedSessionState {
            stage: Stage::Studying,
            leitner_boxes: LeitnerBoxes::with_unseen(vec![card("1")]),
            summary: String::new(),
            original_text: String::new(),
            seconds_left: 10,
            initial_minutes: 5,
            current_collection_id: None,
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["stage"], "studying");
        assert_eq!(value["secondsLeft"], 10);
        assert!(value["leitnerBoxes"]["dont_know"].is_array());
        assert!(value["currentCollectionId"].is_null());
    }
}
