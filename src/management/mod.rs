mod auth;
mod likes;
mod listening;
pub mod store;

pub use auth::TokenManager;
pub use auth::token_from_response;
pub use likes::LikesManager;
pub use listening::ListeningTimeManager;
pub use store::FileStore;
pub use store::MemoryStore;
pub use store::Persistence;
pub use store::StoreError;
