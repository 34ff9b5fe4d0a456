// ============================================================================
// Identifiers
// Natural integer keys of the records the engine reads
// ============================================================================

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

macro_rules! natural_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn value(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

natural_id!(
    /// Identifier of a client order
    OrderId,
    "order"
);
natural_id!(
    /// Identifier of a producer supply offer
    OfferId,
    "offer"
);
natural_id!(
    /// Identifier of a catalog product
    ProductId,
    "product"
);
natural_id!(
    /// Identifier of a cooperated producer
    CooperatedId,
    "cooperated"
);
natural_id!(
    /// Identifier of a client
    ClientId,
    "client"
);
