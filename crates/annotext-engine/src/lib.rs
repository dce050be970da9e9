pub mod comment;
pub mod editing;
pub mod io;
pub mod models;
pub mod serialize;
pub mod session;
pub mod storage;
pub mod threads;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use comment::*;
pub use editing::*;
pub use io::*;
pub use models::*;
pub use serialize::*;
pub use session::*;
pub use storage::*;
pub use threads::*;
