mod chunk;
mod collection;
mod common;
mod config;
mod delete;
mod insert;
mod kb;
mod load;
mod query;
mod retrieve;
mod upsert;

pub use chunk::ChunkArgs;
pub use collection::CollectionCommand;
pub use common::{ChunkingArgs, FieldArgs, SearchArgs, SelectionArgs, TargetArgs};
pub use config::ConfigCommand;
pub use delete::DeleteArgs;
pub use insert::InsertArgs;
pub use kb::{KbCommand, KbSearchArgs};
pub use load::LoadArgs;
pub use query::QueryArgs;
pub use retrieve::RetrieveArgs;
pub use upsert::UpsertArgs;

pub use chunk::handle_chunk;
pub use collection::handle_collection;
pub use config::handle_config;
pub use delete::handle_delete;
pub use insert::handle_insert;
pub use kb::handle_kb;
pub use load::handle_load;
pub use query::handle_query;
pub use retrieve::handle_retrieve;
pub use upsert::handle_upsert;
