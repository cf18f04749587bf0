//! Newtype IDs for type-safe entity references.
//!
//! Every table in the platform uses a `SERIAL` primary key. Wrapping those
//! integers keeps a `ProductId` from being passed where a `RestaurantId` is
//! expected.

/// Define an `i32`-backed ID newtype.
///
/// The generated type is `Copy`, orders like the underlying integer,
/// serializes transparently, and (with the `postgres` feature) encodes as
/// `INTEGER`.
///
/// ```rust
/// # use food_delivery_core::define_id;
/// define_id!(CourierId);
///
/// let id = CourierId::new(7);
/// assert_eq!(id.as_i32(), 7);
/// assert_eq!(id.to_string(), "7");
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
        #[cfg_attr(feature = "postgres", derive(::sqlx::Type))]
        #[cfg_attr(feature = "postgres", sqlx(transparent))]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wrap a raw database ID.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// The raw database ID.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
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
define_id!(RestaurantId);
define_id!(ProductId);
define_id!(OrderId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_serializes_as_bare_integer() {
        let json = serde_json::to_string(&OrderId::new(42)).unwrap();
        assert_eq!(json, "42");

        let id: ProductId = serde_json::from_str("9").unwrap();
        assert_eq!(id, ProductId::new(9));
    }

    #[test]
    fn test_ids_order_numerically() {
        assert!(RestaurantId::new(2) < RestaurantId::new(10));
    }
}
