use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One product detail page turned into structured data
///
/// Every field is always present; a field that could not be found holds its
/// type's empty value (empty string, 0 or 0.0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub url: String,
    pub name: String,
    /// Current price, 0.0 when unknown
    pub price: f64,
    pub original_price: f64,
    pub discount: String,
    pub unit: String,
    pub sku: String,
    /// Star rating in [0, 5], 0.0 when unknown
    pub rating: f64,
    pub reviews_count: u64,
    pub comments_count: u64,
    pub brand: String,
    pub official_name: String,
    /// Breadcrumb levels joined by " > "
    pub category_path: String,
    pub registration_number: String,
    pub form: String,
    pub package_size: String,
    pub origin_brand: String,
    pub manufacturer: String,
    pub country_of_manufacture: String,
    pub ingredients: String,
    pub usage_instructions: String,
    pub availability: String,
    pub description: String,
    /// Sanitized HTML fragment of the product article
    pub rich_content: String,
    /// Absolute image URLs in first-seen order
    pub images: Vec<String>,
    pub crawled_at: DateTime<Utc>,
}

impl ProductRecord {
    /// Record for `url` with every other field empty
    pub fn empty(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: String::new(),
            price: 0.0,
            original_price: 0.0,
            discount: String::new(),
            unit: String::new(),
            sku: String::new(),
            rating: 0.0,
            reviews_count: 0,
            comments_count: 0,
            brand: String::new(),
            official_name: String::new(),
            category_path: String::new(),
            registration_number: String::new(),
            form: String::new(),
            package_size: String::new(),
            origin_brand: String::new(),
            manufacturer: String::new(),
            country_of_manufacture: String::new(),
            ingredients: String::new(),
            usage_instructions: String::new(),
            availability: String::new(),
            description: String::new(),
            rich_content: String::new(),
            images: Vec::new(),
            crawled_at: Utc::now(),
        }
    }

    /// Text fields by name, in column order (used for fill statistics)
    pub fn text_fields(&self) -> [(&'static str, &str); 18] {
        [
            ("name", self.name.as_str()),
            ("discount", self.discount.as_str()),
            ("unit", self.unit.as_str()),
            ("sku", self.sku.as_str()),
            ("brand", self.brand.as_str()),
            ("official_name", self.official_name.as_str()),
            ("category_path", self.category_path.as_str()),
            ("registration_number", self.registration_number.as_str()),
            ("form", self.form.as_str()),
            ("package_size", self.package_size.as_str()),
            ("origin_brand", self.origin_brand.as_str()),
            ("manufacturer", self.manufacturer.as_str()),
            ("country_of_manufacture", self.country_of_manufacture.as_str()),
            ("ingredients", self.ingredients.as_str()),
            ("usage_instructions", self.usage_instructions.as_str()),
            ("availability", self.availability.as_str()),
            ("description", self.description.as_str()),
            ("rich_content", self.rich_content.as_str()),
        ]
    }
}
