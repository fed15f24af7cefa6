use super::locale::Language;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Row id of the single `admin_settings` record.
pub const SETTINGS_ROW_ID: i64 = 1;

/// Shop-wide shipping configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub shipping_cost: Decimal,
    pub free_shipping_threshold: Decimal,
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            id: Some(SETTINGS_ROW_ID),
            shipping_cost: dec!(25),
            free_shipping_threshold: dec!(500),
        }
    }
}

impl AdminSettings {
    /// Shipping owed on `subtotal`: free once a positive threshold is reached.
    pub fn shipping_for(&self, subtotal: Decimal) -> Decimal {
        if self.free_shipping_threshold > Decimal::ZERO && subtotal >= self.free_shipping_threshold {
            Decimal::ZERO
        } else {
            self.shipping_cost
        }
    }
}

/// One slide of the storefront hero carousel.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroSlide {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title_en: String,
    pub title_tr: String,
    pub title_ar: String,
    pub subtitle_en: String,
    pub subtitle_tr: String,
    pub subtitle_ar: String,
    pub description_en: String,
    pub description_tr: String,
    pub description_ar: String,
    pub image_url: String,
    pub button_text_en: String,
    pub button_text_tr: String,
    pub button_text_ar: String,
    pub slide_order: i32,
}

impl HeroSlide {
    pub fn title(&self, lang: Language) -> &str {
        lang.pick(&self.title_en, &self.title_tr, &self.title_ar)
    }

    pub fn subtitle(&self, lang: Language) -> &str {
        lang.pick(&self.subtitle_en, &self.subtitle_tr, &self.subtitle_ar)
    }

    pub fn description(&self, lang: Language) -> &str {
        lang.pick(&self.description_en, &self.description_tr, &self.description_ar)
    }

    pub fn button_text(&self, lang: Language) -> &str {
        lang.pick(&self.button_text_en, &self.button_text_tr, &self.button_text_ar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shipping_for() {
        let settings = AdminSettings::default();
        assert_eq!(settings.shipping_for(dec!(499.99)), dec!(25));
        assert_eq!(settings.shipping_for(dec!(500)), dec!(0));

        let no_free = AdminSettings {
            free_shipping_threshold: dec!(0),
            ..AdminSettings::default()
        };
        assert_eq!(no_free.shipping_for(dec!(10000)), dec!(25));
    }

    #[test]
    fn test_slide_localized_fields() {
        let slide = HeroSlide {
            title_en: "New Season".to_string(),
            title_tr: "Yeni Sezon".to_string(),
            ..Default::default()
        };
        assert_eq!(slide.title(Language::Tr), "Yeni Sezon");
        assert_eq!(slide.title(Language::Ar), "");
    }

    #[test]
    fn test_settings_deserialize_numbers() {
        let row = serde_json::json!({ "id": 1, "shipping_cost": 30, "free_shipping_threshold": 750.5 });
        let settings: AdminSettings = serde_json::from_value(row).unwrap();
        assert_eq!(settings.shipping_cost, dec!(30));
        assert_eq!(settings.free_shipping_threshold, dec!(750.5));
    }
}
