use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for deriving ledger account ids from their holder.
const ACCOUNT_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a4e_93d7_4b0a_9e55_1c3d_7a20_b8e4);

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_identifier!(
    /// Identity that can hold accounts and act in the world: a player
    /// character, an organization, a settlement.
    PersonaId
);

uuid_identifier!(
    /// A coinhouse, the in-world bank holding ledger accounts.
    CoinhouseId
);

uuid_identifier!(
    /// An area (map) where resource nodes are placed.
    AreaId
);

uuid_identifier!(
    /// A ledger account at a coinhouse.
    AccountId
);

uuid_identifier!(
    /// A placed resource node instance.
    NodeInstanceId
);

uuid_identifier!(
    /// A recorded ledger transaction.
    TransactionId
);

impl AccountId {
    /// Derives the account id for a persona's account at a coinhouse.
    ///
    /// A persona holds at most one account per coinhouse, so the pair is
    /// the natural identity and the derivation is stable across restarts.
    pub fn for_holder(persona: PersonaId, coinhouse: CoinhouseId) -> Self {
        let mut name = [0u8; 32];
        name[..16].copy_from_slice(persona.as_uuid().as_bytes());
        name[16..].copy_from_slice(coinhouse.as_uuid().as_bytes());
        Self(Uuid::new_v5(&ACCOUNT_NAMESPACE, &name))
    }
}
