use serde::{Deserialize, Serialize};

use crate::models::{Product, ProductId};

/// A single product/quantity pairing inside a cart.
///
/// This is also the persisted shape, so the field names are the ones the
/// storage layout uses (`productId`, `productName`, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub price: f64,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl CartItem {
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }

    pub fn is_for(&self, product_name: &str) -> bool {
        self.product_name == product_name
    }
}

impl From<&Product> for CartItem {
    fn from(product: &Product) -> Self {
        Self {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            price: product.price,
            quantity: 1,
            image: Some(product.image.clone()).filter(|i| !i.is_empty()),
        }
    }
}
