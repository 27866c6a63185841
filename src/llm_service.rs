use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::llm_providers::{
    JsonResponseParser, LLMProvider, LLMProviderFactory, LLMProviderType, LLMRequest,
};
use crate::log_llm_operation;
use crate::models::{Flashcard, FlashcardRequest, SummaryRequest};

/// The AI collaborator that turns study material into a summary and a deck
#[async_trait]
pub trait StudyAssistant: Send + Sync {
    async fn generate_summary(&self, request: &SummaryRequest) -> Result<String>;

    async fn generate_flashcards(&self, request: &FlashcardRequest) -> Result<Vec<Flashcard>>;
}

#[derive(Debug, Clone, Deserialize)]
struct GeneratedCard {
    #[serde(default)]
    question: String,
    #[serde(default)]
    answer: String,
}

/// Providers answer either with a bare array or an object wrapping it
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum GeneratedDeck {
    Cards(Vec<GeneratedCard>),
    Wrapped { flashcards: Vec<GeneratedCard> },
}

impl GeneratedDeck {
    fn into_flashcards(self) -> Vec<Flashcard> {
        let cards = match self {
            GeneratedDeck::Cards(cards) => cards,
            GeneratedDeck::Wrapped { flashcards } => flashcards,
        };

        cards
            .into_iter()
            .filter_map(|card| {
                let question = card.question.trim();
                let answer = card.answer.trim();
                if question.is_empty() || answer.is_empty() {
                    return None;
                }
                Some(Flashcard::new(question, answer))
            })
            .collect()
    }
}

const SUMMARY_SYSTEM_MESSAGE: &str = "You are a study assistant for teenagers. \
Write clear, well structured summaries that are easy to understand.";

const FLASHCARD_SYSTEM_MESSAGE: &str = "You are a study assistant for teenagers. \
Always respond with valid JSON in the requested format.";

#[derive(Clone)]
pub struct LLMService {
    provider: LLMProvider,
    json_parser: JsonResponseParser,
}

impl LLMService {
    pub fn new_with_provider(
        api_key: String,
        base_url: Option<String>,
        provider_type: LLMProviderType,
        model: Option<String>,
    ) -> Self {
        let provider = LLMProviderFactory::create_provider(provider_type, api_key, base_url, model);

        Self {
            provider,
            json_parser: JsonResponseParser,
        }
    }

    /// Get the provider name for logging and testing
    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    /// Get the model name being used
    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    fn summary_prompt(request: &SummaryRequest) -> String {
        format!(
            r#"Analyze the following study material (text and/or image) and write a concise summary that highlights the key concepts and main points.
The summary must be easy to understand and structured so it can serve as the basis for study flashcards.

Study material:
{}"#,
            request.text
        )
    }

    fn flashcard_prompt(request: &FlashcardRequest) -> String {
        format!(
            r#"Based on the following summary of some study material, create a set of flashcards.
Use the key concepts of the summary to write the question on the front of each card.
You may use the original material (text and/or image) as context to write more detailed and accurate answers for the back of the cards.
The audience is teenagers, so keep questions and answers clear, concise and easy to understand.
Generate between 5 and 20 cards.

Respond with a JSON object in this exact format:
{{
    "flashcards": [
        {{ "question": "Question text here", "answer": "Answer text here" }}
    ]
}}

SUMMARY (basis for the questions):
{}

ORIGINAL MATERIAL (context for the answers):
{}"#,
            request.summary, request.original_text
        )
    }
}

#[async_trait]
impl StudyAssistant for LLMService {
    async fn generate_summary(&self, request: &SummaryRequest) -> Result<String> {
        log_llm_operation!(
            start,
            "generate_summary",
            provider = self.provider_name(),
            model = self.model_name()
        );
        let started = Instant::now();

        let prompt = Self::summary_prompt(request);
        let llm_request = LLMRequest::new(&prompt)
            .with_system(SUMMARY_SYSTEM_MESSAGE)
            .with_image(request.image.as_ref());

        let summary = match self.provider.make_request(llm_request).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                log_llm_operation!(
                    error,
                    "generate_summary",
                    provider = self.provider_name(),
                    error = e
                );
                return Err(e);
            }
        };

        if summary.is_empty() {
            warn!(
                provider = self.provider_name(),
                "LLM returned an empty summary"
            );
            return Err(anyhow::anyhow!("The assistant returned an empty summary"));
        }

        log_llm_operation!(
            success,
            "generate_summary",
            provider = self.provider_name(),
            duration_ms = started.elapsed().as_millis() as u64
        );
        Ok(summary)
    }

    async fn generate_flashcards(&self, request: &FlashcardRequest) -> Result<Vec<Flashcard>> {
        log_llm_operation!(
            start,
            "generate_flashcards",
            provider = self.provider_name(),
            model = self.model_name()
        );
        let started = Instant::now();

        let prompt = Self::flashcard_prompt(request);
        let llm_request = LLMRequest::new(&prompt)
            .with_system(FLASHCARD_SYSTEM_MESSAGE)
            .with_image(request.image.as_ref())
            .expect_json();

        let response_text = match self.provider.make_request(llm_request).await {
            Ok(text) => text,
            Err(e) => {
                log_llm_operation!(
                    error,
                    "generate_flashcards",
                    provider = self.provider_name(),
                    error = e
                );
                return Err(e);
            }
        };

        debug!(
            response_content = %response_text,
            "Raw LLM response for flashcard generation"
        );

        let deck = match self
            .json_parser
            .parse_json_response::<GeneratedDeck>(&response_text)
        {
            Ok(deck) => deck,
            Err(e) => {
                error!(
                    error = %e,
                    json_content = %JsonResponseParser::extract_json_from_response(&response_text),
                    "Failed to parse flashcard JSON response"
                );
                return Err(anyhow::anyhow!("Failed to parse flashcards JSON: {}", e));
            }
        };

        let cards = deck.into_flashcards();
        info!(card_count = cards.len(), "Generated flashcards");
        log_llm_operation!(
            success,
            "generate_flashcards",
            provider = self.provider_name(),
            duration_ms = started.elapsed().as_millis() as u64
        );
        Ok(cards)
    }
}
