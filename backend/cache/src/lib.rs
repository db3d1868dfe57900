pub mod sqlite_store;
pub mod store;

pub use sqlite_store::{hash_key, SqliteTitleCache};
pub use store::InMemoryTitleCache;
