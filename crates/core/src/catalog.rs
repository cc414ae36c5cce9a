//! Catalog records served by the product API.
//!
//! These types mirror the JSON the catalog service returns (`camelCase`
//! keys, numeric prices). List endpoints omit most nested data, so every
//! collection field defaults to empty when absent.
//!
//! The catalog is read-only from the storefront's point of view: nothing
//! here is ever written back.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CategoryId, ProductId, VariantId};

/// Response envelope used by every catalog endpoint: `{ "data": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    /// The payload.
    pub data: T,
    /// Optional human-readable status message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Optional success flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
}

impl<T> ApiEnvelope<T> {
    /// Wrap a payload without message or flag.
    pub const fn new(data: T) -> Self {
        Self {
            data,
            message: None,
            success: None,
        }
    }
}

/// A purchasable size of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantOption {
    pub id: VariantId,
    /// Size label (M, L, XL, XXL).
    pub size: String,
    #[serde(default)]
    pub stock: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
}

impl VariantOption {
    /// Whether the catalog reports any units on hand.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Long-form product copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDescription {
    #[serde(default)]
    pub intro: Option<String>,
    #[serde(default)]
    pub bullet_points: Vec<String>,
    #[serde(default)]
    pub outro: Option<String>,
}

/// A category as listed by `GET /category`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

/// Link between a product and one of its categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCategory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    /// Populated relation, when the API includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

/// A product as returned by `GET /product` and `GET /product/{slug}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub slug: String,
    pub price: Decimal,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub new_arrival: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: Option<ProductDescription>,
    #[serde(default)]
    pub product_category: Vec<ProductCategory>,
    #[serde(default)]
    pub variant_option: Vec<VariantOption>,
}

impl Product {
    /// First image, used for cards and cart snapshots.
    #[must_use]
    pub fn featured_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Look up one of this product's variants.
    #[must_use]
    pub fn variant(&self, id: &VariantId) -> Option<&VariantOption> {
        self.variant_option.iter().find(|v| &v.id == id)
    }

    /// The variant preselected on the product page: the first size in stock.
    #[must_use]
    pub fn default_variant(&self) -> Option<&VariantOption> {
        self.variant_option.iter().find(|v| v.in_stock())
    }

    /// Slugs of every populated category relation, in API order.
    pub fn category_slugs(&self) -> impl Iterator<Item = &str> {
        self.product_category
            .iter()
            .filter_map(|pc| pc.category.as_ref())
            .map(|c| c.slug.as_str())
    }

    /// Names of every populated category relation, in API order.
    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.product_category
            .iter()
            .filter_map(|pc| pc.category.as_ref())
            .map(|c| c.name.as_str())
    }

    /// The first category slug; the home page files a product under it.
    #[must_use]
    pub fn primary_category_slug(&self) -> Option<&str> {
        self.category_slugs().next()
    }

    /// Whether any of the product's categories has `slug` (ASCII case-insensitive).
    #[must_use]
    pub fn in_category(&self, slug: &str) -> bool {
        self.category_slugs().any(|s| s.eq_ignore_ascii_case(slug))
    }
}

/// Products matching a category slug, preserving catalog order.
#[must_use]
pub fn products_in_category<'a>(products: &'a [Product], slug: &str) -> Vec<&'a Product> {
    products.iter().filter(|p| p.in_category(slug)).collect()
}

/// One home-page row: a category with a preview of its products.
#[derive(Debug, Clone)]
pub struct CategorySection<'a> {
    pub category: &'a Category,
    pub products: Vec<&'a Product>,
}

/// Build one section per category, holding at most `limit` products whose
/// primary category is that category.
#[must_use]
pub fn group_by_category<'a>(
    categories: &'a [Category],
    products: &'a [Product],
    limit: usize,
) -> Vec<CategorySection<'a>> {
    categories
        .iter()
        .map(|category| CategorySection {
            category,
            products: products
                .iter()
                .filter(|p| p.primary_category_slug() == Some(category.slug.as_str()))
                .take(limit)
                .collect(),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const DETAIL: &str = r#"{
        "data": {
            "id": "p1",
            "title": "Linen Panjabi",
            "slug": "linen-panjabi",
            "price": 1450,
            "sku": "LP-1",
            "barcode": null,
            "images": ["https://cdn.example/lp-front.png", "https://cdn.example/lp-back.png"],
            "color": "white",
            "newArrival": true,
            "createdAt": "2025-01-10T08:00:00.000Z",
            "updatedAt": "2025-01-12T08:00:00.000Z",
            "description": {
                "id": "d1",
                "productId": "p1",
                "intro": "Breathable linen.",
                "bulletPoints": ["100% linen", "Regular fit"],
                "outro": null
            },
            "productCategory": [
                {"id": "pc1", "categoryId": "c1", "productId": "p1",
                 "category": {"id": "c1", "name": "Panjabi", "slug": "Panjabi"}},
                {"id": "pc2", "categoryId": "c2", "productId": "p1",
                 "category": {"id": "c2", "name": "Eid", "slug": "eid"}}
            ],
            "variantOption": [
                {"id": "v1", "size": "M", "stock": 4, "productId": "p1"},
                {"id": "v2", "size": "L", "stock": 0, "productId": "p1"}
            ]
        }
    }"#;

    fn product(id: &str, category: Option<&str>) -> Product {
        Product {
            id: ProductId::new(id),
            title: id.to_uppercase(),
            slug: id.to_string(),
            price: Decimal::from(100),
            sku: None,
            barcode: None,
            images: Vec::new(),
            color: None,
            new_arrival: false,
            created_at: None,
            updated_at: None,
            description: None,
            product_category: category
                .map(|slug| {
                    vec![ProductCategory {
                        category_id: None,
                        category: Some(Category {
                            id: CategoryId::new(slug),
                            name: slug.to_string(),
                            slug: slug.to_string(),
                        }),
                    }]
                })
                .unwrap_or_default(),
            variant_option: Vec::new(),
        }
    }

    #[test]
    fn test_decode_product_detail() {
        let envelope: ApiEnvelope<Product> = serde_json::from_str(DETAIL).unwrap();
        let p = envelope.data;

        assert_eq!(p.id.as_str(), "p1");
        assert_eq!(p.price, Decimal::from(1450));
        assert!(p.new_arrival);
        assert_eq!(p.featured_image(), Some("https://cdn.example/lp-front.png"));
        assert_eq!(p.variant_option.len(), 2);
        assert_eq!(p.default_variant().unwrap().size, "M");
        assert!(!p.variant(&VariantId::new("v2")).unwrap().in_stock());
        assert_eq!(
            p.description.as_ref().unwrap().bullet_points,
            vec!["100% linen", "Regular fit"]
        );
        assert_eq!(p.category_names().collect::<Vec<_>>(), vec!["Panjabi", "Eid"]);
    }

    #[test]
    fn test_default_variant_skips_sold_out_sizes() {
        let mut p = serde_json::from_str::<ApiEnvelope<Product>>(DETAIL).unwrap().data;
        p.variant_option.reverse();
        assert_eq!(p.default_variant().unwrap().id.as_str(), "v1");

        p.variant_option.retain(|v| !v.in_stock());
        assert!(p.default_variant().is_none());
    }

    #[test]
    fn test_decode_list_item_without_relations() {
        let json = r#"{"data": [{"id": "p9", "title": "Cap", "price": 99.5}]}"#;
        let envelope: ApiEnvelope<Vec<Product>> = serde_json::from_str(json).unwrap();

        let p = &envelope.data[0];
        assert_eq!(p.price, Decimal::new(995, 1));
        assert!(p.images.is_empty());
        assert!(p.variant_option.is_empty());
        assert_eq!(p.primary_category_slug(), None);
    }

    #[test]
    fn test_in_category_is_case_insensitive() {
        let envelope: ApiEnvelope<Product> = serde_json::from_str(DETAIL).unwrap();
        assert!(envelope.data.in_category("panjabi"));
        assert!(envelope.data.in_category("EID"));
        assert!(!envelope.data.in_category("saree"));
    }

    #[test]
    fn test_products_in_category_keeps_order() {
        let products = vec![
            product("a", Some("men")),
            product("b", Some("women")),
            product("c", Some("Men")),
        ];

        let ids: Vec<_> = products_in_category(&products, "men")
            .into_iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_group_by_category_limits_and_uses_primary_slug() {
        let categories = vec![
            Category {
                id: CategoryId::new("c1"),
                name: "Men".to_string(),
                slug: "men".to_string(),
            },
            Category {
                id: CategoryId::new("c2"),
                name: "Kids".to_string(),
                slug: "kids".to_string(),
            },
        ];
        let products: Vec<_> = (0..6)
            .map(|i| product(&format!("m{i}"), Some("men")))
            .chain(std::iter::once(product("orphan", None)))
            .collect();

        let sections = group_by_category(&categories, &products, 4);

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].category.slug, "men");
        assert_eq!(sections[0].products.len(), 4);
        assert!(sections[1].products.is_empty());
    }
}
