//! Command handlers for Tidemark's CLI commands

mod history;
mod record;
mod reset;
mod show;

pub use history::HistoryCommand;
pub use record::RecordCommand;
pub use reset::ResetReferenceCommand;
pub use show::ShowCommand;
