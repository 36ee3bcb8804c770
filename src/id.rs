#![allow(missing_docs)]

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

macro_rules! num_id {
    ($id:ident, $t:ty) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $id($t);

        impl Deref for $id {
            type Target = $t;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl From<$t> for $id {
            fn from(v: $t) -> Self {
                $id(v)
            }
        }

        impl fmt::Display for $id {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

num_id!(Pt, u8);

impl Pt {
    /// Tests if this is in the dynamic payload type range, 96-127.
    pub fn is_dynamic(&self) -> bool {
        (96..=127).contains(&self.0)
    }
}
