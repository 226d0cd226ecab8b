//! Shared types for the world economy core.

pub mod ids;
pub mod kind;

pub use ids::{AccountId, AreaId, CoinhouseId, NodeInstanceId, PersonaId, TransactionId};
pub use kind::{Classify, ErrorKind};
