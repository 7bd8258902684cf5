pub mod accreditation;
pub mod badge;
pub mod controller;
pub mod curriculum;
pub mod generation;
pub mod learner;
pub mod library;
pub mod message;
pub mod prompt;
pub mod response;
pub mod roster;
pub mod session;
pub mod standing;
pub mod store;

pub use controller::{ControllerError, ControllerSettings, ProgressController, TurnOutcome};
pub use generation::{GenerationClient, GenerationContext, OpenAICompatibleClient};
pub use store::{KeyValueStore, MemoryStore};
