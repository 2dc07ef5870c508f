//! Restaurant Profile Model (singleton)

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Contact channels
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct Contact {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub facebook: Option<String>,
    #[serde(default)]
    pub whatsapp: Option<String>,
}

/// Restaurant profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestaurantProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub contact: Contact,
    #[serde(default)]
    pub updated_at: i64,
}

/// Partial profile update
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RestaurantUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub contact: Option<Contact>,
}

impl RestaurantProfile {
    /// Apply a partial update in place
    pub fn apply(&mut self, update: RestaurantUpdate) {
        if let Some(v) = update.name {
            self.name = v;
        }
        if update.address.is_some() {
            self.address = update.address;
        }
        if update.tagline.is_some() {
            self.tagline = update.tagline;
        }
        if update.logo_url.is_some() {
            self.logo_url = update.logo_url;
        }
        if update.cover_url.is_some() {
            self.cover_url = update.cover_url;
        }
        if update.description.is_some() {
            self.description = update.description;
        }
        if let Some(contact) = update.contact {
            self.contact = contact;
        }
    }
}
