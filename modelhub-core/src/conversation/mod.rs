pub mod store;

pub use store::{ConversationStore, Thread, Turn};
