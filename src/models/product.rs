use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Inventory row, exclusively owned by one merchant.
///
/// `quantity` only ever moves down through approved orders and never goes
/// negative; the decrement lives in a guarded UPDATE inside the order
/// finalization transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub profile_id: String,
    pub name: String,
    pub price_cents: i64,
    pub quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    /// Price in decimal reais (converted to cents at the boundary).
    pub price: f64,
    pub quantity: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl CreateProduct {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Nome do produto é obrigatório".into()));
        }
        if self.quantity < 0 {
            return Err(AppError::Validation(
                "Quantidade em estoque não pode ser negativa".into(),
            ));
        }
        Ok(())
    }
}
