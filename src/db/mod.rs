//! Storage for links and users.
//!
//! [`Storage`] owns the replica and its lifetime; the repositories borrow cloned
//! connection handles from it and must be dropped before it is closed.

pub mod links;
pub mod models;
pub mod schema;
pub mod storage;
pub mod users;

pub use links::LinkRepository;
pub use models::{Link, User};
pub use storage::Storage;
pub use users::UserRepository;
