//! Status vocabularies for stateful entities.
//!
//! Orders, payments, carts, sales, and coupons each carry a closed status
//! vocabulary stored as `TEXT`. The enums constrain the vocabulary only;
//! there is deliberately no transition guard anywhere in the system - any
//! status may overwrite any other through an update.

use serde::{Deserialize, Serialize};

/// Error returned when a status string is not part of the vocabulary.
#[derive(thiserror::Error, Debug, Clone)]
#[error("unknown {kind} status: {value}")]
pub struct StatusParseError {
    /// Which vocabulary was being parsed.
    pub kind: &'static str,
    /// The offending input.
    pub value: String,
}

/// Define a `TEXT`-backed status enum.
///
/// Generates serde renames, `as_str`/`Display`/`FromStr`, and (with the
/// `postgres` feature) sqlx `Type`/`Encode`/`Decode` delegating to `String`,
/// so the enum binds directly in queries against `TEXT` columns.
macro_rules! define_status {
    ($(#[$meta:meta])* $name:ident ($kind:literal) { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            Serialize,
            Deserialize,
        )]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// The wire/database representation.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = StatusParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(StatusParseError {
                        kind: $kind,
                        value: other.to_owned(),
                    }),
                }
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, ::sqlx::error::BoxDynError> {
                let s = <String as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(s.parse()?)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <&str as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
            }
        }
    };
}

define_status! {
    /// Lifecycle of a sale listing.
    SaleStatus ("sale") {
        Draft => "draft",
        Active => "active",
        Paused => "paused",
        Closed => "closed",
    }
}

define_status! {
    /// Lifecycle of a shopping cart.
    CartStatus ("cart") {
        Active => "active",
        Ordered => "ordered",
        Abandoned => "abandoned",
    }
}

define_status! {
    /// Fulfillment state of an order.
    OrderStatus ("order") {
        Pending => "pending",
        Confirmed => "confirmed",
        Shipped => "shipped",
        Delivered => "delivered",
        Cancelled => "cancelled",
    }
}

define_status! {
    /// Settlement state of an order or an individual payment.
    PaymentStatus ("payment") {
        Pending => "pending",
        Paid => "paid",
        Refunded => "refunded",
        Cancelled => "cancelled",
    }
}

define_status! {
    /// Whether a coupon can currently be applied.
    CouponStatus ("coupon") {
        Active => "active",
        Suspended => "suspended",
        Exhausted => "exhausted",
    }
}

define_status! {
    /// Which balance a ledger entry belongs to.
    LedgerKind ("ledger kind") {
        Mileage => "mileage",
        Deposit => "deposit",
    }
}

define_status! {
    /// Sign of a ledger entry.
    LedgerDirection ("ledger direction") {
        Income => "income",
        Outcome => "outcome",
    }
}

define_status! {
    /// Severity of a fraud flag on an order.
    FraudSeverity ("fraud severity") {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

define_status! {
    /// How a coupon discounts an order.
    DiscountType ("discount type") {
        Amount => "amount",
        Percent => "percent",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_are_snake_case() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::from_str::<PaymentStatus>("\"paid\"").unwrap(),
            PaymentStatus::Paid
        );
    }

    #[test]
    fn test_round_trips_through_str() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_value_is_an_error() {
        let err = "teleported".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.kind, "order");
        assert_eq!(err.value, "teleported");
    }
}
