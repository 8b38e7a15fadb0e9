use serde::{Deserialize, Serialize};

/// Merchant/user profile. One profile per account; the profile id doubles as
/// the store id for storefront orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub email: String,
    /// WhatsApp number in whatever format the user typed; normalized at
    /// dispatch time, not at rest.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whatsapp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_name: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateProfile {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub whatsapp: Option<String>,
    #[serde(default)]
    pub store_name: Option<String>,
}
