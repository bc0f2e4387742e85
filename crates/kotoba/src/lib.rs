//! Kotoba Domain Library
//!
//! Core domain types and interfaces for the Kotoba prompt management system.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain/`): Pure business entities and logic
//!   - `entities/`: Core domain models (Prompt, ChatPrompt, PromptVersion, ObservationData)
//!   - `value_objects/`: Immutable value types (TemplateType, ChatMessage, SupportedModalities)
//!   - `errors/`: Domain-specific error types
//!
//! - **Template Engine** (`template/`): Mustache and Jinja2 rendering with
//!   placeholder validation and multimodal chat rendering
//!
//! - **Ports** (`ports/`): Abstract interfaces (traits)
//!   - `repositories/`: Prompt store interface against the REST backend
//!   - `services/`: Generation client and trace sink interfaces
//!
//! # Usage
//!
//! ```rust,ignore
//! use kotoba::domain::{Prompt, PromptVersion};
//! use kotoba::ports::{PromptStore, TraceSink};
//! ```

pub mod domain;
pub mod ports;
pub mod template;

// Re-export commonly used types
pub use domain::{
    ChatMessage, ChatPrompt, ContentPart, DomainError, ErrorInfo, FormattedPrompt, ImageUrl,
    MessageContent, ObservationData, Prompt, PromptHandle, PromptProperties, PromptTemplate,
    PromptVersion, SupportedModalities, TemplateType, TokenUsage, VideoUrl, load_prompt,
};
pub use ports::{
    // Generation services
    ChatRequest,
    CompletionRequest,
    EmbeddingRequest,
    GenerationClient,
    GenerationOptions,
    NewPrompt,
    // Repositories
    PromptRecord,
    PromptStore,
    PromptUpdate,
    // Tracing
    TraceData,
    TraceHandle,
    TraceSink,
    VERSION_PAGE_SIZE,
    VersionFilter,
    VersionQuery,
};
