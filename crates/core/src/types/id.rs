//! Integer primary keys, one type per table.
//!
//! Every table uses a `SERIAL` key, so each ID wraps an `i32`. Keeping them as
//! distinct types stops a `ProductId` from being passed where an `OrderId` is
//! expected.

/// Define an `i32` ID newtype.
///
/// The generated type serializes as a bare number, orders like its integer
/// (the in-memory store keys `BTreeMap`s by it) and, with the `postgres`
/// feature, binds and decodes as `INT4`.
///
/// ```rust
/// # use bodegon_core::define_id;
/// define_id!(ShelfId);
///
/// let shelf = ShelfId::new(3);
/// assert_eq!(shelf.as_i32(), 3);
/// assert_eq!(shelf.to_string(), "3");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[cfg_attr(feature = "postgres", derive(::sqlx::Type), sqlx(transparent))]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(UserId);
define_id!(CategoryId);
define_id!(ProductId);
define_id!(OrderId);
define_id!(OrderItemId);

impl std::str::FromStr for OrderId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i32>().map(Self)
    }
}

/// Parse a comma-separated list of order IDs (e.g. `"1,2,3"`).
///
/// Empty segments are skipped, so `"1,,2,"` yields two IDs.
///
/// # Errors
///
/// Returns the offending segment if any segment is not an integer.
pub fn parse_order_ids(raw: &str) -> Result<Vec<OrderId>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.parse::<OrderId>().map_err(|_| segment.to_owned()))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_transparent_in_json() {
        let id = ProductId::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        let parsed: ProductId = serde_json::from_str("7").unwrap();
        assert_eq!(parsed.as_i32(), 7);
    }

    #[test]
    fn test_parse_order_ids() {
        let ids = parse_order_ids("3, 1,2").unwrap();
        assert_eq!(ids, vec![OrderId::new(3), OrderId::new(1), OrderId::new(2)]);
    }

    #[test]
    fn test_parse_order_ids_skips_empty_segments() {
        let ids = parse_order_ids("1,,2,").unwrap();
        assert_eq!(ids, vec![OrderId::new(1), OrderId::new(2)]);
        assert!(parse_order_ids("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_order_ids_rejects_garbage() {
        assert_eq!(parse_order_ids("1,abc").unwrap_err(), "abc");
    }
}
