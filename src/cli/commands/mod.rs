mod ask;
mod chat;
mod config;
mod ingest;
mod reset;
mod search;
mod status;

pub use ask::AskArgs;
pub use config::ConfigCommand;
pub use ingest::IngestCommand;
pub use search::SearchArgs;

pub use ask::handle_ask;
pub use chat::handle_chat;
pub use config::handle_config;
pub use ingest::handle_ingest;
pub use reset::handle_reset;
pub use search::handle_search;
pub use status::handle_status;
