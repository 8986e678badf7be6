// apps/storefront/src/services/catalog.rs

use crate::backend::RowStore;
use crate::models::Product;
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Category wildcard accepted by `Catalog::filter`.
pub const ALL_CATEGORIES: &str = "All";

/// The products a storefront page works from.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Catalog {
  products: Vec<Product>,
  /// True when the built-in list stands in for the remote catalog.
  fallback: bool,
}

/// Loads available products newest first, substituting the built-in catalog
/// when the row store fails or has nothing to offer. Never errors.
#[instrument(name = "catalog::fetch_catalog", skip_all)]
pub async fn fetch_catalog(rows: &dyn RowStore) -> Catalog {
  match rows.available_products().await {
    Ok(products) if !products.is_empty() => {
      info!(count = products.len(), "Catalog loaded.");
      Catalog {
        products,
        fallback: false,
      }
    }
    Ok(_) => {
      warn!("Catalog is empty; serving the built-in products.");
      Catalog::fallback()
    }
    Err(e) => {
      warn!(error = %e, "Catalog request failed; serving the built-in products.");
      Catalog::fallback()
    }
  }
}

impl Catalog {
  pub fn from_products(products: Vec<Product>) -> Self {
    Self {
      products,
      fallback: false,
    }
  }

  pub fn fallback() -> Self {
    Self {
      products: fallback_products(),
      fallback: true,
    }
  }

  pub fn products(&self) -> &[Product] {
    &self.products
  }

  pub fn is_fallback(&self) -> bool {
    self.fallback
  }

  pub fn find(&self, product_id: &str) -> Option<&Product> {
    self.products.iter().find(|p| p.id == product_id)
  }

  /// Exact (case-sensitive) category unless `"All"`, AND a case-insensitive
  /// name substring match.
  pub fn filter(&self, category: &str, search: &str) -> Vec<&Product> {
    let needle = search.trim().to_lowercase();
    self
      .products
      .iter()
      .filter(|p| category == ALL_CATEGORIES || p.category == category)
      .filter(|p| needle.is_empty() || p.name.to_lowercase().contains(&needle))
      .collect()
  }

  /// Distinct categories in first-seen order.
  pub fn categories(&self) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for p in &self.products {
      if !seen.contains(&p.category.as_str()) {
        seen.push(p.category.as_str());
      }
    }
    seen
  }
}

#[allow(clippy::too_many_arguments)]
fn product(id: &str, name: &str, price: i64, photo: &str, rating: f64, category: &str, stock: i32, description: &str) -> Product {
  Product {
    id: id.to_string(),
    name: name.to_string(),
    price,
    image_url: format!("https://images.unsplash.com/{}?w=400", photo),
    rating,
    category: category.to_string(),
    stock,
    description: description.to_string(),
    is_available: true,
    created_at: None,
  }
}

/// Eight products shown when the remote catalog is unavailable.
pub fn fallback_products() -> Vec<Product> {
  vec![
    product("p1", "Strawberry Dream Cake", 55000, "photo-1565958011703-44f9829ba187", 5.0, "Tart", 10,
      "Crisp tart pastry with custard and fresh strawberries"),
    product("p2", "Chocolate Chip Cookies", 33000, "photo-1558961363-fa8fdf82db35", 4.8, "Cookies", 20,
      "Classic cookies loaded with chocolate chips"),
    product("p3", "Red Velvet Cupcake", 28000, "photo-1614707267537-b85aaf00c4b7", 4.9, "Cupcake", 15,
      "Red velvet cupcake with cream cheese frosting"),
    product("p4", "Fudgy Brownies Box", 43000, "photo-1607920591413-4ec007e70023", 4.9, "Brownies", 12,
      "Extra fudgy chocolate brownies"),
    product("p5", "Black Forest Cake", 90000, "photo-1606890737304-57a1ca8a5b62", 4.8, "Cake", 8,
      "Black forest cake with cherries and whipped cream"),
    product("p6", "Vanilla Cupcake", 22000, "photo-1599785209707-a456fc1337bb", 4.6, "Cupcake", 18,
      "Classic vanilla cupcake with buttercream"),
    product("p7", "Chocolate Fudge Cake", 88000, "photo-1578985545062-69928b1d9587", 4.9, "Cake", 10,
      "Rich chocolate cake with fudge frosting"),
    product("p8", "Lemon Tart", 38000, "photo-1519915212116-7cfef71f1d3e", 4.7, "Tart", 14,
      "Fresh lemon tart with lemon curd"),
  ]
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn category_filter_is_exact() {
    let catalog = Catalog::fallback();
    let cakes: Vec<&str> = catalog.filter("Cake", "").iter().map(|p| p.id.as_str()).collect();
    assert_eq!(cakes, vec!["p5", "p7"]);
    assert!(catalog.filter("cake", "").is_empty());
  }

  #[test]
  fn search_is_case_insensitive_across_categories() {
    let catalog = Catalog::fallback();
    let hits: Vec<&str> = catalog.filter(ALL_CATEGORIES, "velvet").iter().map(|p| p.id.as_str()).collect();
    assert_eq!(hits, vec!["p3"]);
    let hits = catalog.filter("Cupcake", "VANILLA");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "p6");
  }

  #[test]
  fn categories_keep_first_seen_order() {
    assert_eq!(
      Catalog::fallback().categories(),
      vec!["Tart", "Cookies", "Cupcake", "Brownies", "Cake"]
    );
  }
}
