//! Nutrition estimation for menu compositions
//!
//! A composition is free text such as `"Nasi 200g, Ayam goreng 50g, Sambal"`.
//! [`GenerativeEstimator`] asks an OpenAI-compatible chat endpoint;
//! [`KeywordEstimator`] is the offline table lookup used when that fails.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

use crate::core::config::AiConfig;
use crate::db::models::Nutrition;

#[derive(Debug, Error)]
pub enum NutritionError {
    #[error("Composition is empty")]
    EmptyComposition,

    #[error("Nutrition service is not configured")]
    NotConfigured,

    #[error("Nutrition service request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Nutrition service returned an unusable answer: {0}")]
    InvalidResponse(String),
}

impl From<NutritionError> for AppError {
    fn from(err: NutritionError) -> Self {
        match err {
            NutritionError::EmptyComposition => AppError::validation(err.to_string()),
            other => AppError::with_message(ErrorCode::NutritionEstimateFailed, other.to_string()),
        }
    }
}

#[async_trait]
pub trait NutritionEstimator: Send + Sync {
    async fn estimate(&self, composition: &str) -> Result<Nutrition, NutritionError>;
}

// =============================================================================
// Generative
// =============================================================================

const SYSTEM_PROMPT: &str = "You are a nutritionist. Estimate the nutrition of one serving \
of the dish described by the user. Answer with a JSON object with exactly these numeric \
fields: calories (kcal), protein (g), carbs (g), fat (g), fiber (g), sugar (g).";

pub struct GenerativeEstimator {
    client: reqwest::Client,
    config: AiConfig,
}

impl GenerativeEstimator {
    pub fn new(config: AiConfig, timeout: Duration) -> Result<Self, NutritionError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Six numeric fields; anything missing counts as zero
#[derive(Deserialize)]
struct NutritionAnswer {
    #[serde(default)]
    calories: f64,
    #[serde(default)]
    protein: f64,
    #[serde(default)]
    carbs: f64,
    #[serde(default)]
    fat: f64,
    #[serde(default)]
    fiber: f64,
    #[serde(default)]
    sugar: f64,
}

fn parse_answer(content: &str) -> Result<Nutrition, NutritionError> {
    // Some models wrap JSON in a ```json fence despite the response format
    let trimmed = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    let answer: NutritionAnswer = serde_json::from_str(trimmed)
        .map_err(|e| NutritionError::InvalidResponse(e.to_string()))?;
    Ok(Nutrition {
        calories: answer.calories,
        protein: answer.protein,
        carbs: answer.carbs,
        fat: answer.fat,
        fiber: answer.fiber,
        sugar: answer.sugar,
    }
    .normalized())
}

#[async_trait]
impl NutritionEstimator for GenerativeEstimator {
    async fn estimate(&self, composition: &str) -> Result<Nutrition, NutritionError> {
        let composition = composition.trim();
        if composition.is_empty() {
            return Err(NutritionError::EmptyComposition);
        }
        let url = self.config.api_url.as_deref().ok_or(NutritionError::NotConfigured)?;

        let body = serde_json::json!({
            "model": self.config.model,
            "temperature": 0.2,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": composition },
            ],
        });

        let mut req = self.client.post(url).json(&body);
        if let Some(key) = self.config.api_key.as_deref() {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await?.error_for_status()?;
        let completion: ChatCompletion = resp
            .json()
            .await
            .map_err(|e| NutritionError::InvalidResponse(e.to_string()))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| NutritionError::InvalidResponse("empty completion".into()))?;
        parse_answer(&content)
    }
}

// =============================================================================
// Keyword table
// =============================================================================

/// Grams assumed when an entry carries no weight
const DEFAULT_GRAMS: f64 = 100.0;

const fn per_100g(calories: f64, protein: f64, carbs: f64, fat: f64, fiber: f64, sugar: f64) -> Nutrition {
    Nutrition {
        calories,
        protein,
        carbs,
        fat,
        fiber,
        sugar,
    }
}

/// Per-100 g values; first matching keyword wins
const KEYWORDS: &[(&[&str], Nutrition)] = &[
    (&["nasi", "rice"], per_100g(130.0, 2.7, 28.0, 0.3, 0.4, 0.1)),
    (&["ayam", "chicken"], per_100g(239.0, 27.0, 0.0, 14.0, 0.0, 0.0)),
    (&["daging", "sapi", "beef"], per_100g(250.0, 26.0, 0.0, 15.0, 0.0, 0.0)),
    (&["udang", "shrimp"], per_100g(99.0, 24.0, 0.2, 0.3, 0.0, 0.0)),
    (&["ikan", "fish"], per_100g(206.0, 22.0, 0.0, 12.0, 0.0, 0.0)),
    (&["telur", "egg"], per_100g(155.0, 13.0, 1.1, 11.0, 0.0, 1.1)),
    (&["tahu", "tofu"], per_100g(76.0, 8.0, 1.9, 4.8, 0.3, 0.6)),
    (&["tempe", "tempeh"], per_100g(193.0, 19.0, 9.4, 11.0, 1.4, 0.0)),
    (&["mie", "mi ", "noodle"], per_100g(138.0, 4.5, 25.0, 2.1, 1.2, 0.4)),
    (&["kentang", "potato"], per_100g(77.0, 2.0, 17.0, 0.1, 2.2, 0.8)),
    (&["sayur", "kangkung", "bayam", "vegetable"], per_100g(25.0, 1.5, 5.0, 0.2, 2.5, 2.0)),
    (&["keju", "cheese"], per_100g(402.0, 25.0, 1.3, 33.0, 0.0, 0.5)),
    (&["susu", "milk"], per_100g(61.0, 3.2, 4.8, 3.3, 0.0, 5.1)),
    (&["gula", "sugar"], per_100g(387.0, 0.0, 100.0, 0.0, 0.0, 100.0)),
    (&["minyak", "oil"], per_100g(884.0, 0.0, 0.0, 100.0, 0.0, 0.0)),
    (&["roti", "bread"], per_100g(265.0, 9.0, 49.0, 3.2, 2.7, 5.0)),
];

const GENERIC: Nutrition = per_100g(100.0, 3.0, 15.0, 3.0, 1.0, 2.0);

/// Deterministic offline estimator
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordEstimator;

impl KeywordEstimator {
    /// Split `"Ayam goreng 50g"` into `("ayam goreng", 50.0)`
    fn parse_entry(entry: &str) -> (String, f64) {
        let lower = entry.trim().to_lowercase();
        let mut grams = None;
        let mut name_parts = Vec::new();
        let tokens: Vec<&str> = lower.split_whitespace().collect();
        let mut i = 0;
        while i < tokens.len() {
            let token = tokens[i];
            let unit_stripped = token
                .strip_suffix("gram")
                .or_else(|| token.strip_suffix("gr"))
                .or_else(|| token.strip_suffix('g'));
            if let Some(num) = unit_stripped.and_then(|n| n.replace(',', ".").parse::<f64>().ok()) {
                grams = Some(num);
            } else if let Ok(num) = token.replace(',', ".").parse::<f64>() {
                // "200 g"
                if matches!(tokens.get(i + 1), Some(&("g" | "gr" | "gram"))) {
                    i += 1;
                }
                grams = Some(num);
            } else {
                name_parts.push(token);
            }
            i += 1;
        }
        (name_parts.join(" "), grams.unwrap_or(DEFAULT_GRAMS))
    }

    fn lookup(name: &str) -> Nutrition {
        // Pad so "mi " only matches the standalone word
        let padded = format!(" {name} ");
        KEYWORDS
            .iter()
            .find(|(words, _)| words.iter().any(|w| padded.contains(w)))
            .map(|(_, n)| *n)
            .unwrap_or(GENERIC)
    }

    pub fn estimate_sync(&self, composition: &str) -> Result<Nutrition, NutritionError> {
        let entries: Vec<&str> = composition
            .split([',', ';', '\n'])
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .collect();
        if entries.is_empty() {
            return Err(NutritionError::EmptyComposition);
        }

        let total = entries
            .into_iter()
            .map(Self::parse_entry)
            .map(|(name, grams)| Self::lookup(&name).scaled(grams / 100.0))
            .fold(Nutrition::default(), |acc, n| acc + n);
        Ok(total.normalized())
    }
}

#[async_trait]
impl NutritionEstimator for KeywordEstimator {
    async fn estimate(&self, composition: &str) -> Result<Nutrition, NutritionError> {
        self.estimate_sync(composition)
    }
}

// =============================================================================
// Fallback
// =============================================================================

/// Tries `primary`, falls back to keywords on any error
pub struct FallbackEstimator {
    primary: Box<dyn NutritionEstimator>,
    fallback: KeywordEstimator,
}

impl FallbackEstimator {
    pub fn new(primary: Box<dyn NutritionEstimator>) -> Self {
        Self {
            primary,
            fallback: KeywordEstimator,
        }
    }
}

#[async_trait]
impl NutritionEstimator for FallbackEstimator {
    async fn estimate(&self, composition: &str) -> Result<Nutrition, NutritionError> {
        match self.primary.estimate(composition).await {
            Ok(n) => Ok(n),
            Err(NutritionError::EmptyComposition) => Err(NutritionError::EmptyComposition),
            Err(e) => {
                tracing::warn!(error = %e, "Generative nutrition estimate failed, using keyword table");
                self.fallback.estimate(composition).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_non_negative(n: &Nutrition) -> bool {
        [n.calories, n.protein, n.carbs, n.fat, n.fiber, n.sugar]
            .iter()
            .all(|v| *v >= 0.0)
    }

    #[test]
    fn test_parse_entry_units() {
        assert_eq!(KeywordEstimator::parse_entry("Nasi 200g"), ("nasi".into(), 200.0));
        assert_eq!(
            KeywordEstimator::parse_entry("Ayam goreng 50 g"),
            ("ayam goreng".into(), 50.0)
        );
        assert_eq!(KeywordEstimator::parse_entry("Keju 12,5gr"), ("keju".into(), 12.5));
        assert_eq!(KeywordEstimator::parse_entry("Sambal"), ("sambal".into(), 100.0));
    }

    #[test]
    fn test_rice_and_chicken() {
        let n = KeywordEstimator.estimate_sync("Nasi 200g, Ayam 50g").unwrap();
        // 2 x 130 + 0.5 x 239
        assert_eq!(n.calories, 379.5);
        assert_eq!(n.protein, 18.9);
        assert_eq!(n.carbs, 56.0);
        assert!(all_non_negative(&n));
    }

    #[test]
    fn test_unknown_ingredient_uses_generic_values() {
        let n = KeywordEstimator.estimate_sync("Sambal 50g").unwrap();
        assert_eq!(n.calories, 50.0);
    }

    #[test]
    fn test_noodle_keyword_needs_whole_word() {
        assert_eq!(KeywordEstimator::lookup("mi goreng").calories, 138.0);
        // "minyak" must not hit the noodle entry
        assert_eq!(KeywordEstimator::lookup("minyak").calories, 884.0);
    }

    #[test]
    fn test_empty_composition_rejected() {
        assert!(matches!(
            KeywordEstimator.estimate_sync(" , ;"),
            Err(NutritionError::EmptyComposition)
        ));
    }

    #[test]
    fn test_parse_fenced_answer() {
        let n = parse_answer("```json\n{\"calories\": 410.26, \"protein\": -2, \"carbs\": 50}\n```")
            .unwrap();
        assert_eq!(n.calories, 410.3);
        assert_eq!(n.protein, 0.0);
        assert_eq!(n.fat, 0.0);
    }

    struct Broken;

    #[async_trait]
    impl NutritionEstimator for Broken {
        async fn estimate(&self, _: &str) -> Result<Nutrition, NutritionError> {
            Err(NutritionError::NotConfigured)
        }
    }

    #[tokio::test]
    async fn test_fallback_on_primary_error() {
        let est = FallbackEstimator::new(Box::new(Broken));
        let n = est.estimate("Nasi 200g, Ayam 50g").await.unwrap();
        assert_eq!(n.calories, 379.5);
        assert!(all_non_negative(&n));
    }
}
