use crate::error::CheckoutError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Represents a positive monetary amount in KSh.
///
/// This is a wrapper around `rust_decimal::Decimal` to enforce domain-specific rules
/// and provide type safety for payment amounts.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, CheckoutError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(CheckoutError::ValidationError(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = CheckoutError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of item is being paid for.
///
/// Exhibition bookings carry the number of slots reserved; artwork purchases
/// have no extra data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderKind {
    Artwork,
    Exhibition { slots: u32 },
}

impl OrderKind {
    /// The wire label used in the initiation payload (`orderType`).
    pub fn label(&self) -> &'static str {
        match self {
            OrderKind::Artwork => "artwork",
            OrderKind::Exhibition { .. } => "exhibition",
        }
    }

    /// The `accountReference` string sent to the gateway.
    pub fn account_reference(&self) -> String {
        format!("{} Payment", self.label())
    }
}

/// Read-only snapshot of what is being paid for.
///
/// Constructed by the calling screen and borrowed by the payment session for
/// its whole lifetime; the session never mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderContext {
    pub id: String,
    pub title: String,
    pub amount: Amount,
    pub kind: OrderKind,
}

impl OrderContext {
    pub fn artwork(
        id: impl Into<String>,
        title: impl Into<String>,
        amount: Amount,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            amount,
            kind: OrderKind::Artwork,
        }
    }

    pub fn exhibition(
        id: impl Into<String>,
        title: impl Into<String>,
        amount: Amount,
        slots: u32,
    ) -> Result<Self, CheckoutError> {
        if slots == 0 {
            return Err(CheckoutError::ValidationError(
                "Exhibition bookings need at least one slot".to_string(),
            ));
        }
        Ok(Self {
            id: id.into(),
            title: title.into(),
            amount,
            kind: OrderKind::Exhibition { slots },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(dec!(1500.0)).is_ok());
        assert!(matches!(
            Amount::new(dec!(0.0)),
            Err(CheckoutError::ValidationError(_))
        ));
        assert!(matches!(
            Amount::new(dec!(-1.0)),
            Err(CheckoutError::ValidationError(_))
        ));
    }

    #[test]
    fn test_order_kind_account_reference() {
        assert_eq!(OrderKind::Artwork.account_reference(), "artwork Payment");
        assert_eq!(
            OrderKind::Exhibition { slots: 2 }.account_reference(),
            "exhibition Payment"
        );
    }

    #[test]
    fn test_exhibition_requires_slots() {
        let amount = Amount::new(dec!(1500.0)).unwrap();
        assert!(OrderContext::exhibition("ex1", "Modern Art", amount, 2).is_ok());
        assert!(matches!(
            OrderContext::exhibition("ex1", "Modern Art", amount, 0),
            Err(CheckoutError::ValidationError(_))
        ));
    }

    #[test]
    fn test_artwork_has_no_slots() {
        let amount = Amount::new(dec!(2500.0)).unwrap();
        let order = OrderContext::artwork("a1", "Sunset", amount);
        assert_eq!(order.kind, OrderKind::Artwork);
        assert_eq!(order.kind.label(), "artwork");
    }
}
