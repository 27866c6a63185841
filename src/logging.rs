// Macros file - tracing macros are imported within the macro definitions

/// Standardized logging macros for consistent field names and message patterns across the application
///
/// These macros ensure:
/// - Consistent field naming conventions
/// - Appropriate logging levels for different scenarios
/// - Structured logging with context

// ============================================================================
// API Operation Logging Macros
// ============================================================================

/// Log the start of an API operation with consistent fields
#[macro_export]
macro_rules! log_api_start {
    ($operation:expr, collection_id = $collection_id:expr) => {
        tracing::debug!(
            operation = $operation,
            collection_id = %$collection_id,
            "API operation started"
        );
    };
    ($operation:expr, card_id = $card_id:expr) => {
        tracing::debug!(
            operation = $operation,
            card_id = %$card_id,
            "API operation started"
        );
    };
    ($operation:expr) => {
        tracing::debug!(
            operation = $operation,
            "API operation started"
        );
    };
}

/// Log successful completion of an API operation
#[macro_export]
macro_rules! log_api_success {
    ($operation:expr, collection_id = $collection_id:expr, $msg:expr) => {
        tracing::info!(
            operation = $operation,
            collection_id = %$collection_id,
            "API operation completed: {}", $msg
        );
    };
    ($operation:expr, count = $count:expr, $msg:expr) => {
        tracing::info!(
            operation = $operation,
            count = $count,
            "API operation completed: {}", $msg
        );
    };
    ($operation:expr, $msg:expr) => {
        tracing::info!(
            operation = $operation,
            "API operation completed: {}", $msg
        );
    };
}

/// Log API warnings with context
#[macro_export]
macro_rules! log_api_warn {
    ($operation:expr, collection_id = $collection_id:expr, $msg:expr) => {
        tracing::warn!(
            operation = $operation,
            collection_id = %$collection_id,
            "API operation warning: {}", $msg
        );
    };
    ($operation:expr, $msg:expr) => {
        tracing::warn!(
            operation = $operation,
            "API operation warning: {}", $msg
        );
    };
}

// ============================================================================
// Study Session Logging Macros
// ============================================================================

/// Log state machine transitions
#[macro_export]
macro_rules! log_transition {
    (rejected, $stage:expr, $event:expr, error = $error:expr) => {
        tracing::warn!(
            component = "study_session",
            stage = ?$stage,
            event = $event,
            error = %$error,
            "Session event rejected"
        );
    };
    ($from:expr, $event:expr, $to:expr) => {
        tracing::debug!(
            component = "study_session",
            from = ?$from,
            event = $event,
            to = ?$to,
            "Session transition"
        );
    };
}

// ============================================================================
// Storage Logging Macros
// ============================================================================

/// Log key-value store operations
#[macro_export]
macro_rules! log_store_operation {
    (debug, $operation:expr, key = $key:expr, bytes = $bytes:expr) => {
        tracing::debug!(
            component = "storage",
            operation = $operation,
            key = %$key,
            bytes = $bytes,
            "Store operation completed"
        );
    };
    (info, $operation:expr, $msg:expr) => {
        tracing::info!(
            component = "storage",
            operation = $operation,
            "Store operation: {}", $msg
        );
    };
    (warn, $operation:expr, key = $key:expr, error = $error:expr) => {
        tracing::warn!(
            component = "storage",
            operation = $operation,
            key = %$key,
            error = %$error,
            "Store operation failed"
        );
    };
}

// ============================================================================
// LLM Service Logging Macros
// ============================================================================

/// Log LLM service operations with provider context
#[macro_export]
macro_rules! log_llm_operation {
    (start, $operation:expr, provider = $provider:expr, model = $model:expr) => {
        tracing::info!(
            component = "llm_service",
            operation = $operation,
            provider = %$provider,
            model = %$model,
            "LLM operation started"
        );
    };
    (success, $operation:expr, provider = $provider:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = "llm_service",
            operation = $operation,
            provider = %$provider,
            duration_ms = $duration,
            "LLM operation completed successfully"
        );
    };
    (error, $operation:expr, provider = $provider:expr, error = $error:expr) => {
        tracing::error!(
            component = "llm_service",
            operation = $operation,
            provider = %$provider,
            error = %$error,
            "LLM operation failed"
        );
    };
}

// ============================================================================
// System Event Logging Macros
// ============================================================================

/// Log system startup and shutdown events
#[macro_export]
macro_rules! log_system_event {
    (startup, component = $component:expr, $msg:expr) => {
        tracing::info!(
            event_type = "startup",
            component = $component,
            "System event: {}",
            $msg
        );
    };
    (config, $msg:expr) => {
        tracing::info!(event_type = "configuration", "System event: {}", $msg);
    };
}

// ============================================================================
// Validation Logging Macros
// ============================================================================

/// Log validation results consistently
#[macro_export]
macro_rules! log_validation {
    (success, $component:expr, $msg:expr) => {
        tracing::debug!(
            event_type = "validation",
            component = $component,
            result = "success",
            "Validation completed: {}", $msg
        );
    };
    (failure, $component:expr, error = $error:expr) => {
        tracing::warn!(
            event_type = "validation",
            component = $component,
            result = "failure",
            error = %$error,
            "Validation failed"
        );
    };
}
