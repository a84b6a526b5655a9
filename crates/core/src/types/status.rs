//! Order lifecycle status.
//!
//! Status is recorded on every order but no transition is enforced: the
//! backend stores whatever staff set and never acts on it.

use serde::{Deserialize, Serialize};

/// Order status.
///
/// New orders always start as [`OrderStatus::Created`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "snake_case")
)]
pub enum OrderStatus {
    #[default]
    Created,
    Shipped,
    Completed,
    Refunded,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::Shipped => write!(f, "Shipped"),
            Self::Completed => write!(f, "Completed"),
            Self::Refunded => write!(f, "Refunded"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "created" => Ok(Self::Created),
            "shipped" => Ok(Self::Shipped),
            "completed" => Ok(Self::Completed),
            "refunded" => Ok(Self::Refunded),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_created() {
        assert_eq!(OrderStatus::default(), OrderStatus::Created);
    }

    #[test]
    fn test_serializes_with_variant_name() {
        let json = serde_json::to_string(&OrderStatus::Shipped).unwrap();
        assert_eq!(json, "\"Shipped\"");
    }

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!("REFUNDED".parse::<OrderStatus>().unwrap(), OrderStatus::Refunded);
        assert!("lost".parse::<OrderStatus>().is_err());
    }
}
