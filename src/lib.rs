pub mod api;
pub mod config;
pub mod controller;
pub mod errors;
pub mod llm_providers;
pub mod llm_service;
pub mod logging;
pub mod models;
pub mod session;
pub mod session_store;
pub mod storage;
pub mod timer;

pub use api::{AppState, ApiResponse, SessionView, create_router};
pub use config::Config;
pub use controller::{CollaboratorRequest, SessionController, fulfil};
pub use errors::*;
pub use llm_providers::{JsonResponseParser, LLMProvider, LLMProviderFactory, LLMProviderType};
pub use llm_service::{LLMService, StudyAssistant};
pub use models::*;
pub use session::{Effect, SessionEvent, StudySession, compute_score};
pub use session_store::{LoadedState, SessionStore};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
pub use timer::{SessionTimer, TimerEvent, TimerStatus};
