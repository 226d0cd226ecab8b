pub mod error;
pub mod memory;
pub mod store;
pub mod version;

pub use error::{RepositoryError, Result};
pub use memory::InMemoryRepository;
pub use store::{Repository, RepositoryExt, Versioned};
pub use version::Version;
