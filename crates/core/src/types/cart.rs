//! Cart lines and quantity commands.

use serde::{Deserialize, Serialize};

use super::id::{CartLineId, LineId, ProductId};
use super::price::Price;
use super::product::{Product, ProductPayload};
use super::validation::{ValidationError, require};

const RECORD: &str = "cart line";

/// One product in the cart.
///
/// A line always holds at least one unit; a line that would drop to zero is
/// removed instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub product: Product,
    pub quantity: u32,
}

impl CartLine {
    /// A freshly added line awaiting server confirmation.
    #[must_use]
    pub fn pending(product: Product) -> Self {
        Self {
            id: CartLineId::pending(),
            product,
            quantity: 1,
        }
    }

    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product.id
    }

    /// Price of the whole line.
    #[must_use]
    pub fn line_price(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}

/// Cart line as it arrives on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartLinePayload {
    pub id: Option<i64>,
    pub product: Option<ProductPayload>,
    pub quantity: Option<i64>,
}

impl TryFrom<CartLinePayload> for CartLine {
    type Error = ValidationError;

    fn try_from(payload: CartLinePayload) -> Result<Self, Self::Error> {
        let id = require(payload.id, RECORD, "id")?;
        let product = Product::try_from(require(payload.product, RECORD, "product")?)?;
        let raw_quantity = require(payload.quantity, RECORD, "quantity")?;
        let quantity = u32::try_from(raw_quantity)
            .ok()
            .filter(|q| *q >= 1)
            .ok_or_else(|| {
                ValidationError::invalid(
                    RECORD,
                    "quantity",
                    format!("must be at least 1 (got {raw_quantity})"),
                )
            })?;

        Ok(Self {
            id: CartLineId::Remote(LineId::new(id)),
            product,
            quantity,
        })
    }
}

/// A change to a line's quantity.
///
/// The backend accepts either an absolute quantity or a relative action tag;
/// both are expressed here and translated by the API client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuantityChange {
    Increase,
    Decrease,
    SetTo(u32),
}

impl QuantityChange {
    /// The quantity this change produces from `current`.
    ///
    /// Relative changes never drop below one unit.
    #[must_use]
    pub const fn apply(&self, current: u32) -> u32 {
        match self {
            Self::Increase => current.saturating_add(1),
            Self::Decrease => {
                if current > 1 {
                    current - 1
                } else {
                    1
                }
            }
            Self::SetTo(quantity) => *quantity,
        }
    }
}
