//! Chat-service business logic.

pub mod bus;
pub mod chat;
pub mod consumers;
pub mod metrics;
pub mod prompt;
pub mod providers;
pub mod registry;
pub mod session;
pub mod shaping;
pub mod sink;

pub use bus::{ConsumerError, ConsumerFailure, EventConsumer, NotificationBus, PublishReport};
pub use chat::{ChatOptions, ChatOutcome, ChatService};
pub use consumers::{PersistenceConsumer, TranscriptConsumer};
pub use providers::{ChatProvider, GeminiChatProvider, GeminiConfig, MockChatProvider, ModelError};
pub use registry::{SessionHandle, SessionRegistry};
pub use session::ModelSession;
pub use sink::{MemorySink, MongoSink, MongoSinkConfig, PersistError, RecordSink};
