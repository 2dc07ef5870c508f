//! Menu Item Model

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Availability, derived from stock
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuStatus {
    Available,
    #[default]
    Unavailable,
}

impl MenuStatus {
    pub fn from_stock(stock: i32) -> Self {
        if stock > 0 {
            MenuStatus::Available
        } else {
            MenuStatus::Unavailable
        }
    }
}

/// Estimated nutrition per serving
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub sugar: f64,
}

impl Nutrition {
    /// Clamp negatives to zero and round to one decimal
    pub fn normalized(self) -> Self {
        fn fix(v: f64) -> f64 {
            if v.is_finite() && v > 0.0 {
                (v * 10.0).round() / 10.0
            } else {
                0.0
            }
        }
        Self {
            calories: fix(self.calories),
            protein: fix(self.protein),
            carbs: fix(self.carbs),
            fat: fix(self.fat),
            fiber: fix(self.fiber),
            sugar: fix(self.sugar),
        }
    }

    pub fn scaled(self, factor: f64) -> Self {
        Self {
            calories: self.calories * factor,
            protein: self.protein * factor,
            carbs: self.carbs * factor,
            fat: self.fat * factor,
            fiber: self.fiber * factor,
            sugar: self.sugar * factor,
        }
    }
}

impl std::ops::Add for Nutrition {
    type Output = Nutrition;

    fn add(self, rhs: Nutrition) -> Nutrition {
        Nutrition {
            calories: self.calories + rhs.calories,
            protein: self.protein + rhs.protein,
            carbs: self.carbs + rhs.carbs,
            fat: self.fat + rhs.fat,
            fiber: self.fiber + rhs.fiber,
            sugar: self.sugar + rhs.sugar,
        }
    }
}

/// Menu item entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Free-text ingredient list, e.g. "Nasi 200g, Ayam 50g"
    #[serde(default)]
    pub composition: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub price: i64,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub status: MenuStatus,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub nutrition: Option<Nutrition>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl MenuItem {
    /// Re-derive `status` from `stock`
    pub fn refresh_status(&mut self) {
        self.status = MenuStatus::from_stock(self.stock);
    }
}

/// Create menu item payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MenuItemCreate {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub composition: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[validate(range(min = 0))]
    pub price: i64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub stock: i32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub nutrition: Option<Nutrition>,
    /// Estimate nutrition from `composition` before saving
    #[serde(default)]
    pub generate_nutrition: bool,
}

/// Update menu item payload
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct MenuItemUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 1000))]
    pub composition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0))]
    pub price: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<Nutrition>,
    #[serde(default)]
    pub generate_nutrition: bool,
}

/// Menu list filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuQuery {
    #[serde(default)]
    pub category: Option<String>,
    /// Only items with stock
    #[serde(default)]
    pub available: Option<bool>,
}

/// Nutrition estimate request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NutritionRequest {
    #[validate(length(min = 1, max = 1000))]
    pub composition: String,
}
