// Data models module
// Records persisted by the project store and shapes returned by the backend

pub mod conversation;
pub mod job;
pub mod project;

pub use conversation::*;
pub use job::*;
pub use project::*;
