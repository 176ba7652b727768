pub mod config;
pub mod error;
mod bootstrap;
mod fallback;
mod pipeline;
mod queue;
mod worker;

pub use bootstrap::Engine;
pub use error::EngineError;
pub use fallback::FallbackFile;
pub use pipeline::AuditPipeline;
pub use queue::RetryQueue;
