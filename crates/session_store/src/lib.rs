//! Chat Log Store: persists the ordered turn history of a session as a JSON
//! record plus a markdown rendering, and reloads it.

mod error;
mod paths;
mod render;
mod schema;
mod store;

pub use error::ChatLogError;
pub use paths::{chat_file_name, chat_stamp, parse_chat_file_name, CHAT_FILE_PREFIX};
pub use render::render_markdown;
pub use schema::{ChatLogRecord, ChatLogSummary};
pub use store::ChatLogStore;
