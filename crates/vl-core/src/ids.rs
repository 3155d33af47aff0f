//! Typed ID wrappers for store-assigned integer keys.
//!
//! Each ID type is a newtype over `i64`, preventing accidental misuse
//! (e.g., passing a `SharedLinkId` where a `VideoId` is expected).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Generate a newtype ID wrapper over an SQLite `INTEGER PRIMARY KEY`.
///
/// The macro produces a struct with:
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Ord`,
///   `Serialize`, `Deserialize` (transparent)
/// - `Display` and `FromStr` delegating to the inner integer
/// - `From<i64>` and `Into<i64>` conversions
macro_rules! typed_id {
    ($($(#[doc = $doc:expr])* $name:ident),+ $(,)?) => {
        $(
            $(#[doc = $doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(i64);

            impl $name {
                /// Return the raw integer key.
                #[must_use]
                pub fn get(self) -> i64 {
                    self.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl FromStr for $name {
                type Err = std::num::ParseIntError;

                fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                    s.parse::<i64>().map(Self)
                }
            }

            impl From<i64> for $name {
                fn from(id: i64) -> Self {
                    Self(id)
                }
            }

            impl From<$name> for i64 {
                fn from(id: $name) -> Self {
                    id.0
                }
            }
        )+
    };
}

typed_id! {
    /// Unique identifier for a stored video.
    VideoId,
    /// Unique identifier for a shared link row.
    SharedLinkId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn roundtrip_i64() {
        let id = VideoId::from(7);
        let back: i64 = id.into();
        assert_eq!(back, 7);
        assert_eq!(id.get(), 7);
    }

    #[test]
    fn display_and_from_str() {
        let id = SharedLinkId::from(1234);
        let parsed: SharedLinkId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn serde_is_transparent() {
        let id = VideoId::from(3);
        assert_eq!(serde_json::to_string(&id).unwrap(), "3");
        let back: VideoId = serde_json::from_str("3").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn invalid_from_str() {
        assert!(VideoId::from_str("not-a-number").is_err());
    }

    #[test]
    fn hash_set_dedupes() {
        let set: HashSet<VideoId> = [1, 2, 1].into_iter().map(VideoId::from).collect();
        assert_eq!(set.len(), 2);
    }
}
