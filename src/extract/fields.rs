//! Strategy table of the detail page template
//!
//! Markers are the `data-test` attributes of the current template. Row labels
//! are the Vietnamese captions of the specification table. The class patterns
//! cover older template revisions.

use crate::extract::strategy::{
    BreadcrumbJson, Css, CssJoined, FieldChain, JsonKey, LabeledRow, ProductNode, Strategy, Tier,
};

/// Separator between breadcrumb levels
pub const CATEGORY_SEPARATOR: &str = " > ";

fn has_digit(value: &str) -> bool {
    value.chars().any(|c| c.is_ascii_digit())
}

fn chain(name: &'static str, strategies: Vec<Box<dyn Strategy>>) -> FieldChain {
    FieldChain::new(name, strategies)
}

/// One chain per text-valued field of a product record
pub struct FieldChains {
    pub name: FieldChain,
    pub price: FieldChain,
    pub original_price: FieldChain,
    pub discount: FieldChain,
    pub unit: FieldChain,
    pub sku: FieldChain,
    pub brand: FieldChain,
    pub official_name: FieldChain,
    pub category_path: FieldChain,
    pub registration_number: FieldChain,
    pub form: FieldChain,
    pub package_size: FieldChain,
    pub origin_brand: FieldChain,
    pub manufacturer: FieldChain,
    pub country_of_manufacture: FieldChain,
    pub ingredients: FieldChain,
    pub usage_instructions: FieldChain,
    pub availability: FieldChain,
    pub description: FieldChain,
    pub reviews_count: FieldChain,
    pub comments_count: FieldChain,
}

impl FieldChains {
    pub fn standard() -> Self {
        Self {
            name: chain(
                "name",
                vec![
                    Box::new(Css::marker(&[r#"[data-test="product_name"]"#])),
                    Box::new(ProductNode::new(&["name"])),
                    Box::new(Css::pattern(&["h1", ".product-title", ".product-name", ".title"])),
                ],
            ),
            price: chain(
                "price",
                vec![
                    Box::new(Css::marker(&[r#"[data-test="price"]"#])),
                    Box::new(ProductNode::new(&["offers", "price"])),
                    Box::new(Css::pattern(&[".price", ".cost", ".gia"])),
                    Box::new(Css::pattern(&[
                        r#"span[class*="price"]"#,
                        r#"div[class*="price"]"#,
                        r#"[class*="price"]"#,
                    ])),
                ],
            )
            .accept(has_digit),
            original_price: chain(
                "original_price",
                vec![
                    Box::new(Css::marker(&[r#"[data-test="strike_price"]"#])),
                    Box::new(Css::pattern(&[".price-original", ".price-old", ".original-price"])),
                    Box::new(Css::pattern(&[r#"[class*="strike"]"#, "del"])),
                ],
            )
            .accept(has_digit),
            discount: chain(
                "discount",
                vec![
                    Box::new(Css::marker(&[r#"[data-test="discount"]"#, r#"[data-test="discount_badge"]"#])),
                    Box::new(Css::pattern(&[".discount-percent", ".sale-badge", ".discount"])),
                    Box::new(Css::pattern(&[r#"[class*="discount"]"#])),
                ],
            ),
            unit: chain(
                "unit",
                vec![
                    Box::new(Css::marker(&[r#"[data-test="unit"]"#])),
                    Box::new(Css::pattern(&[".unit", r#"[class*="unit"]"#])),
                ],
            )
            .strip_labels(&["/"]),
            sku: chain(
                "sku",
                vec![
                    Box::new(Css::marker(&[r#"[data-test="sku"]"#])),
                    Box::new(Css::marker(&[r#"meta[itemprop="sku"]"#]).attr("content")),
                    Box::new(ProductNode::new(&["sku"])),
                    Box::new(JsonKey::new(&["sku"])),
                    Box::new(Css::pattern(&[".sku", r#"[class*="sku"]"#])),
                ],
            )
            .strip_labels(&["Mã sản phẩm", "SKU"]),
            brand: chain(
                "brand",
                vec![
                    Box::new(Css::marker(&[r#"[data-test="brand"]"#])),
                    Box::new(JsonKey::new(&["brand"])),
                    Box::new(LabeledRow::new("Thương hiệu")),
                    Box::new(Css::pattern(&[".brand", ".thuong-hieu"])),
                    Box::new(Css::pattern(&[r#"[class*="brand"] a"#, r#"[class*="brand"]"#])),
                ],
            )
            .strip_labels(&["Thương hiệu"]),
            official_name: chain(
                "official_name",
                vec![
                    Box::new(Css::marker(&[r#"[data-test="official_name"]"#])),
                    Box::new(LabeledRow::new("Tên chính thức")),
                ],
            ),
            category_path: chain(
                "category_path",
                vec![
                    Box::new(CssJoined::new(
                        Tier::Marker,
                        &[r#"[data-test="breadcrumb"] a"#],
                        CATEGORY_SEPARATOR,
                    )),
                    Box::new(BreadcrumbJson::new(CATEGORY_SEPARATOR)),
                    Box::new(LabeledRow::new("Danh mục")),
                    Box::new(CssJoined::new(
                        Tier::Pattern,
                        &[".breadcrumb a", ".category a", ".danh-muc a"],
                        CATEGORY_SEPARATOR,
                    )),
                    Box::new(CssJoined::new(
                        Tier::Pattern,
                        &[r#"[class*="breadcrumb"] a"#],
                        CATEGORY_SEPARATOR,
                    )),
                ],
            ),
            registration_number: chain(
                "registration_number",
                vec![
                    Box::new(Css::marker(&[r#"[data-test="registration_number"]"#])),
                    Box::new(JsonKey::new(&["registrationnumber", "registration_number"])),
                    Box::new(LabeledRow::new("Số đăng ký")),
                ],
            ),
            form: chain(
                "form",
                vec![
                    Box::new(JsonKey::new(&["dosageform", "dosage_form"])),
                    Box::new(LabeledRow::new("Dạng bào chế")),
                ],
            ),
            package_size: chain(
                "package_size",
                vec![
                    Box::new(Css::marker(&[r#"[data-test="specification"]"#])),
                    Box::new(LabeledRow::new("Quy cách")),
                ],
            ),
            origin_brand: chain(
                "origin_brand",
                vec![Box::new(LabeledRow::new("Xuất xứ thương hiệu"))],
            ),
            manufacturer: chain(
                "manufacturer",
                vec![
                    Box::new(LabeledRow::new("Nhà sản xuất")),
                    Box::new(Css::pattern(&[".manufacturer"])),
                ],
            ),
            country_of_manufacture: chain(
                "country_of_manufacture",
                vec![Box::new(LabeledRow::new("Nước sản xuất"))],
            ),
            ingredients: chain(
                "ingredients",
                vec![
                    Box::new(Css::marker(&[r#"[data-test="ingredient"]"#])),
                    Box::new(LabeledRow::new("Thành phần")),
                    Box::new(Css::pattern(&[".ingredients", ".composition", ".thanh-phan"])),
                ],
            ),
            usage_instructions: chain(
                "usage_instructions",
                vec![
                    Box::new(Css::marker(&[r#"[data-test="usage"]"#])),
                    Box::new(LabeledRow::new("Cách dùng")),
                    Box::new(Css::pattern(&[".usage", ".cach-dung", ".instructions"])),
                ],
            ),
            availability: chain(
                "availability",
                vec![
                    Box::new(Css::marker(&[r#"[data-test="availability"]"#])),
                    Box::new(ProductNode::new(&["offers", "availability"])),
                    Box::new(Css::pattern(&[".availability", ".stock-status", ".tinh-trang"])),
                ],
            ),
            description: chain(
                "description",
                vec![
                    Box::new(Css::marker(&[r#"[data-test="short_description"]"#])),
                    Box::new(ProductNode::new(&["description"])),
                    Box::new(Css::pattern(&[".product-description", ".description", ".product-detail"])),
                ],
            ),
            reviews_count: chain(
                "reviews_count",
                vec![Box::new(Css::marker(&[
                    r#"[data-test="review_count"]"#,
                    r#"[data-test="rating_count"]"#,
                ]))],
            )
            .accept(has_digit),
            comments_count: chain(
                "comments_count",
                vec![Box::new(Css::marker(&[r#"[data-test="comment_count"]"#]))],
            )
            .accept(has_digit),
        }
    }
}

impl Default for FieldChains {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chains_are_tier_ordered() {
        let chains = FieldChains::standard();
        for chain in [&chains.price, &chains.brand, &chains.category_path, &chains.sku] {
            let tiers = chain.tiers();
            let mut sorted = tiers.clone();
            sorted.sort();
            assert_eq!(tiers, sorted, "chain {}", chain.name());
        }
    }

    #[test]
    fn test_has_digit() {
        assert!(has_digit("120.000đ"));
        assert!(!has_digit("Liên hệ"));
    }
}
