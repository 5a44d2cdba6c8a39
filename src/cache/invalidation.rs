//! Invalidation fan-out.
//!
//! When a record changes, every cached view that may have included it is
//! dropped: the entity's own key, the listings it appears in, and the HTTP
//! responses cached by the middleware for the matching routes. Deletions are
//! best effort and unordered; anything missed expires with its TTL.

use std::fmt;
use std::str::FromStr;

use tracing::info;

use crate::cache::keys;
use crate::cache::service::CacheService;
use crate::error::CacheError;

/// Something to delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Key(String),
    Pattern(String),
}

/// Domain areas with their own fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Product,
    Category,
    Subcategory,
    Portfolio,
    Gallery,
    Order,
    Contact,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Product => "product",
            Entity::Category => "category",
            Entity::Subcategory => "subcategory",
            Entity::Portfolio => "portfolio",
            Entity::Gallery => "gallery",
            Entity::Order => "order",
            Entity::Contact => "contact",
        }
    }

    /// Keys and patterns made stale by a change to this entity. `id` narrows
    /// the entity's own key; listings are always cleared.
    pub fn targets(&self, id: Option<&str>) -> Vec<Target> {
        let mut targets = Vec::new();
        let pattern = |p: &str| Target::Pattern(p.to_string());

        match self {
            Entity::Product => {
                if let Some(id) = id {
                    let related = keys::related_products_prefix(id);
                    targets.push(Target::Key(keys::product(id)));
                    targets.push(Target::Pattern(format!("{}:*", related)));
                    targets.push(Target::Key(related));
                }
                targets.push(pattern("products:*"));
                targets.push(pattern("batch:*"));
                targets.push(pattern("home:*"));
                targets.push(Target::Pattern(keys::request_pattern("product")));
            }
            Entity::Category => {
                if let Some(id) = id {
                    targets.push(Target::Key(keys::category_details(id)));
                }
                targets.push(pattern("categories:*"));
                targets.push(pattern("subcategories:*"));
                targets.push(pattern("home:*"));
                targets.push(pattern("batch:*"));
                targets.push(Target::Pattern(keys::request_pattern("categor")));
                targets.push(Target::Pattern(keys::request_pattern("subcategor")));
            }
            Entity::Subcategory => {
                if let Some(category_id) = id {
                    targets.push(Target::Key(keys::subcategories(category_id)));
                }
                targets.push(pattern("subcategories:*"));
                targets.push(pattern("categories:*"));
                targets.push(pattern("batch:*"));
                targets.push(Target::Pattern(keys::request_pattern("subcategor")));
                targets.push(Target::Pattern(keys::request_pattern(
                    "categories-with-subcategories",
                )));
            }
            Entity::Portfolio => {
                if let Some(id) = id {
                    targets.push(Target::Key(keys::portfolio(id)));
                }
                targets.push(pattern("portfolios:*"));
                targets.push(pattern("home:*"));
                targets.push(Target::Pattern(keys::request_pattern("portfolio")));
                targets.push(Target::Pattern(keys::request_pattern("featured-portfolios")));
            }
            Entity::Gallery => {
                if let Some(id) = id {
                    targets.push(Target::Key(keys::gallery(id)));
                }
                targets.push(pattern("galleries:*"));
                targets.push(Target::Pattern(keys::request_pattern("gallery")));
            }
            Entity::Order => {
                // Orders move stock, so listings and reports go stale
                targets.push(pattern("products:*"));
                targets.push(pattern("admin:*"));
                targets.push(pattern("sales:*"));
                targets.push(pattern("batch:*"));
                targets.push(Target::Pattern(keys::request_pattern("product")));
            }
            Entity::Contact => {
                targets.push(Target::Key(keys::contact()));
                targets.push(Target::Pattern(keys::request_pattern("phone")));
            }
        }
        targets
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Entity {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "product" | "products" => Ok(Entity::Product),
            "category" | "categories" => Ok(Entity::Category),
            "subcategory" | "subcategories" => Ok(Entity::Subcategory),
            "portfolio" | "portfolios" => Ok(Entity::Portfolio),
            "gallery" | "galleries" => Ok(Entity::Gallery),
            "order" | "orders" => Ok(Entity::Order),
            "contact" => Ok(Entity::Contact),
            other => Err(CacheError::InvalidRequest(format!(
                "unknown entity '{}'",
                other
            ))),
        }
    }
}

// == Invalidator ==
/// Runs fan-outs against a cache service. Holds no state of its own.
#[derive(Clone)]
pub struct Invalidator {
    cache: CacheService,
}

impl Invalidator {
    pub fn new(cache: CacheService) -> Self {
        Self { cache }
    }

    /// Deletes every target for `entity`. Returns the number of keys removed.
    pub async fn invalidate(&self, entity: Entity, id: Option<&str>) -> usize {
        let mut removed = 0;
        for target in entity.targets(id) {
            removed += match target {
                Target::Key(key) => usize::from(self.cache.remove(&key).await.unwrap_or(false)),
                Target::Pattern(pattern) => self.cache.delete_pattern(&pattern).await,
            };
        }
        info!(entity = %entity, id = id.unwrap_or("*"), removed, "invalidated cache");
        removed
    }

    pub async fn product_changed(&self, id: Option<&str>) -> usize {
        self.invalidate(Entity::Product, id).await
    }

    pub async fn category_changed(&self, id: Option<&str>) -> usize {
        self.invalidate(Entity::Category, id).await
    }

    pub async fn subcategory_changed(&self, category_id: Option<&str>) -> usize {
        self.invalidate(Entity::Subcategory, category_id).await
    }

    pub async fn portfolio_changed(&self, id: Option<&str>) -> usize {
        self.invalidate(Entity::Portfolio, id).await
    }

    pub async fn gallery_changed(&self, id: Option<&str>) -> usize {
        self.invalidate(Entity::Gallery, id).await
    }

    pub async fn order_changed(&self) -> usize {
        self.invalidate(Entity::Order, None).await
    }

    pub async fn contact_changed(&self) -> usize {
        self.invalidate(Entity::Contact, None).await
    }
}
