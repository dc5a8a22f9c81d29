//! Closed enumerations carried on the wire as 16-bit codes.
//!
//! Callers see string tags (`"low_price"`, `"LEGENDARY"`); the wire sees
//! the tag's position in its table. The tables below are append-only:
//! reordering an entry silently changes what every deployed peer decodes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::buffer::{ByteBuf, WireWrite};
use crate::ProtocolError;

/// Declares an enumeration together with its code table.
///
/// Each entry is `Variant = code => "tag"`. Generates the enum (serde uses
/// the tag), `code`/`from_code`, `as_str`/`FromStr`, `Display`, and the
/// `write`/`read` pair that puts the code on the wire as a short.
macro_rules! code_table {
    (
        $(#[$meta:meta])*
        pub enum $name:ident as $table:literal {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $code:literal => $tag:literal,
            )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $tag)]
                $variant,
            )+
        }

        impl $name {
            /// Every entry, in code order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The wire code.
            pub const fn code(self) -> i16 {
                match self {
                    $(Self::$variant => $code,)+
                }
            }

            /// Looks up a wire code.
            ///
            /// # Errors
            /// [`ProtocolError::UnknownCode`] for a code outside the table.
            pub fn from_code(code: i16) -> Result<Self, ProtocolError> {
                match code {
                    $($code => Ok(Self::$variant),)+
                    _ => Err(ProtocolError::UnknownCode {
                        table: $table,
                        code,
                    }),
                }
            }

            /// The tag text.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $tag,)+
                }
            }

            pub fn write(self, buf: &mut impl WireWrite) {
                buf.write_short(self.code());
            }

            pub fn read(buf: &mut ByteBuf) -> Result<Self, ProtocolError> {
                Self::from_code(buf.read_short()?)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ProtocolError;

            fn from_str(tag: &str) -> Result<Self, Self::Err> {
                match tag {
                    $($tag => Ok(Self::$variant),)+
                    _ => Err(ProtocolError::UnknownTag {
                        table: $table,
                        tag: tag.to_string(),
                    }),
                }
            }
        }
    };
}

code_table! {
    /// Item category shown in an auction listing.
    pub enum Category as "category" {
        Weapon = 0 => "weapon",
        Armor = 1 => "armor",
        Accessories = 2 => "accessories",
        Consumables = 3 => "consumables",
        Blocks = 4 => "blocks",
        Misc = 5 => "misc",
    }
}

code_table! {
    /// Item rarity, lowest first.
    pub enum Rarity as "rarity" {
        Common = 0 => "COMMON",
        Uncommon = 1 => "UNCOMMON",
        Rare = 2 => "RARE",
        Epic = 3 => "EPIC",
        Legendary = 4 => "LEGENDARY",
        Mythic = 5 => "MYTHIC",
        Divine = 6 => "DIVINE",
        Special = 7 => "SPECIAL",
        VerySpecial = 8 => "VERY_SPECIAL",
    }
}

code_table! {
    /// Ordering requested for a page of auctions.
    pub enum SortOrder as "sort order" {
        HighPrice = 0 => "high_price",
        LowPrice = 1 => "low_price",
        EndNear = 2 => "end_near",
        EndFar = 3 => "end_far",
        /// Shuffled; the server picks a new order per request.
        Random = 4 => "random",
    }
}
