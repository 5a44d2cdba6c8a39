//! Cache key derivation.
//!
//! One naming scheme for every call site: `prefix:name=value:name=value`,
//! parameters sorted by name, empty parameters dropped, values
//! percent-encoded. Identifier segments always use `name=value` and category
//! references are always `categoryId`.

use std::fmt::Display;

/// Builds a canonical key from a prefix and query parameters.
///
/// ```
/// use storefront_cache::cache::keys::cache_key;
///
/// let key = cache_key("products", &[("subCategoryId", Some("42".into())), ("page", Some("1".into()))]);
/// assert_eq!(key, "products:page=1:subCategoryId=42");
/// ```
pub fn cache_key(prefix: &str, params: &[(&str, Option<String>)]) -> String {
    let mut present: Vec<(&str, &str)> = params
        .iter()
        .filter_map(|(name, value)| match value.as_deref() {
            Some(v) if !v.is_empty() => Some((*name, v)),
            _ => None,
        })
        .collect();

    if present.is_empty() {
        return prefix.to_string();
    }

    present.sort_by(|a, b| a.0.cmp(b.0));

    let mut key = prefix.to_string();
    for (name, value) in present {
        key.push(':');
        key.push_str(name);
        key.push('=');
        key.push_str(&urlencoding::encode(value));
    }
    key
}

fn id_key(prefix: &str, id: impl Display) -> String {
    cache_key(prefix, &[("id", Some(id.to_string()))])
}

// == Catalog ==

pub fn product(id: impl Display) -> String {
    id_key("product", id)
}

/// Related-product keys anchor the product id in the prefix so one pattern
/// covers every `limit` variant.
pub fn related_products(product_id: impl Display, limit: Option<u32>) -> String {
    cache_key(
        &related_products_prefix(product_id),
        &[("limit", limit.map(|l| l.to_string()))],
    )
}

pub fn related_products_prefix(product_id: impl Display) -> String {
    format!(
        "products:related:productId={}",
        urlencoding::encode(&product_id.to_string())
    )
}

/// Paginated or filtered product listings.
pub fn products(params: &[(&str, Option<String>)]) -> String {
    cache_key("products", params)
}

pub fn featured_products(limit: u32) -> String {
    cache_key("products:featured", &[("limit", Some(limit.to_string()))])
}

pub fn product_search(query: &str, limit: Option<u32>) -> String {
    cache_key(
        "products:search",
        &[
            ("query", Some(query.to_string())),
            ("limit", limit.map(|l| l.to_string())),
        ],
    )
}

pub fn categories_all() -> String {
    "categories:all".to_string()
}

pub fn categories_with_subcategories() -> String {
    "categories:with-subcategories".to_string()
}

pub fn category_details(id: impl Display) -> String {
    id_key("category:details", id)
}

pub fn subcategories(category_id: impl Display) -> String {
    cache_key(
        "subcategories",
        &[("categoryId", Some(category_id.to_string()))],
    )
}

// == Content ==

pub fn portfolio(id: impl Display) -> String {
    id_key("portfolio", id)
}

pub fn gallery(id: impl Display) -> String {
    id_key("gallery", id)
}

pub fn contact() -> String {
    "admin:contact".to_string()
}

/// Lifetimes in seconds for each family of keys.
pub mod ttl {
    pub const CATEGORIES: u64 = 300;
    pub const CATEGORY_DETAILS: u64 = 600;
    pub const SUBCATEGORIES: u64 = 300;
    pub const CATEGORIES_WITH_SUBCATEGORIES: u64 = 600;
    pub const PRODUCT: u64 = 600;
    /// Listings, featured and related products
    pub const PRODUCT_LISTING: u64 = 300;
    pub const PRODUCT_SEARCH: u64 = 180;
    pub const PORTFOLIO: u64 = 600;
    pub const FEATURED_PORTFOLIOS: u64 = 300;
    pub const GALLERY: u64 = 600;
    /// Contact details change rarely
    pub const CONTACT: u64 = 3600;
    pub const WARMED: u64 = 600;
}

/// Marker written by cache warming.
pub const WARMED_MARKER: &str = "cache:warmed";

// == HTTP ==

/// Key for a cached HTTP response: method plus full path and query.
pub fn request_key(method: &str, path_and_query: &str) -> String {
    format!("cache:{}:{}", method, path_and_query)
}

/// Pattern matching cached GET responses whose path contains `segment`.
pub fn request_pattern(segment: &str) -> String {
    format!("cache:GET:*/{}*", segment.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_sorted_and_empty_dropped() {
        let key = cache_key(
            "products",
            &[
                ("subCategoryId", Some("42".into())),
                ("search", Some(String::new())),
                ("page", Some("1".into())),
                ("sort", None),
            ],
        );
        assert_eq!(key, "products:page=1:subCategoryId=42");
    }

    #[test]
    fn test_param_order_does_not_matter() {
        let a = cache_key("p", &[("b", Some("2".into())), ("a", Some("1".into()))]);
        let b = cache_key("p", &[("a", Some("1".into())), ("b", Some("2".into()))]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_no_params_returns_prefix() {
        assert_eq!(cache_key("categories:all", &[]), "categories:all");
        assert_eq!(cache_key("products", &[("page", None)]), "products");
    }

    #[test]
    fn test_values_are_percent_encoded() {
        let key = product_search("oak table*", Some(10));
        assert_eq!(key, "products:search:limit=10:query=oak%20table%2A");
    }

    #[test]
    fn test_domain_keys() {
        assert_eq!(product(42), "product:id=42");
        assert_eq!(category_details("abc"), "category:details:id=abc");
        assert_eq!(subcategories(7), "subcategories:categoryId=7");
        assert_eq!(featured_products(8), "products:featured:limit=8");
        assert_eq!(
            related_products(42, Some(4)),
            "products:related:productId=42:limit=4"
        );
        assert_eq!(related_products(42, None), "products:related:productId=42");
    }

    #[test]
    fn test_related_prefix_encodes_like_other_builders() {
        let id = "a b:c*";
        assert_eq!(product(id), "product:id=a%20b%3Ac%2A");
        assert_eq!(
            related_products_prefix(id),
            "products:related:productId=a%20b%3Ac%2A"
        );
        assert_eq!(
            related_products(id, Some(4)),
            "products:related:productId=a%20b%3Ac%2A:limit=4"
        );
    }

    #[test]
    fn test_request_keys() {
        assert_eq!(
            request_key("GET", "/products/3?page=2"),
            "cache:GET:/products/3?page=2"
        );
        assert_eq!(request_pattern("/product"), "cache:GET:*/product*");
    }
}
