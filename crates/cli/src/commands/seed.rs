//! Seed the catalog from a YAML file.
//!
//! ```yaml
//! categories:
//!   - name: Mochi
//!     products:
//!       - name: Matcha Mochi
//!         description: Stone-ground matcha with sweet red bean.
//!         price: 800
//!         image: products/matcha-mochi.jpg
//! ```
//!
//! `image` is relative to the media directory and optional. `available`
//! defaults to `true`. Categories are matched by name, so re-running adds the
//! products again unless `--clear` is given.

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use wendy_woo_core::Price;
use wendy_woo_storefront::db::{self, PgCatalog};
use wendy_woo_storefront::models::NewProduct;

/// Top-level seed file.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub categories: Vec<CategorySeed>,
}

/// A category and its products.
#[derive(Debug, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

/// One product entry.
#[derive(Debug, Deserialize)]
pub struct ProductSeed {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Unit price in yen.
    pub price: i64,
    pub image: Option<String>,
    #[serde(default = "available_by_default")]
    pub available: bool,
}

const fn available_by_default() -> bool {
    true
}

/// Problems found in a seed file before touching the database.
fn validate(file: &CatalogFile) -> Vec<String> {
    let mut errors = Vec::new();

    for category in &file.categories {
        if category.name.trim().is_empty() {
            errors.push("category with an empty name".to_string());
        }
        for product in &category.products {
            if product.name.trim().is_empty() {
                errors.push(format!("{}: product with an empty name", category.name));
            }
            if product.price < 0 {
                errors.push(format!(
                    "{} / {}: negative price {}",
                    category.name, product.name, product.price
                ));
            }
        }
    }

    errors
}

/// Load categories and products from `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or a database operation fails.
pub async fn catalog(file_path: &Path, clear: bool) -> Result<(), Box<dyn std::error::Error>> {
    let database_url = super::database_url()?;

    if !file_path.exists() {
        return Err(format!("File not found: {}", file_path.display()).into());
    }

    info!(path = %file_path.display(), "Loading catalog from file");

    // Parse and validate before connecting to the database
    let content = tokio::fs::read_to_string(file_path).await?;
    let file: CatalogFile = serde_yaml::from_str(&content)?;

    let errors = validate(&file);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");
    let catalog = PgCatalog::new(&pool);

    if clear {
        let removed = catalog.clear().await?;
        info!(categories = removed, "Cleared existing catalog");
    }

    let mut inserted = 0_usize;
    for seed in file.categories {
        let category = catalog.upsert_category(seed.name.trim()).await?;
        for product in seed.products {
            catalog
                .insert_product(&NewProduct {
                    category_id: category.id,
                    name: product.name.trim().to_string(),
                    description: product.description,
                    image: product.image,
                    price: Price::new(product.price),
                    is_available: product.available,
                })
                .await?;
            inserted += 1;
        }
        info!(category = %category.name, "Seeded category");
    }

    info!("Seeding complete!");
    info!("  Products inserted: {inserted}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"
categories:
  - name: Mochi
    products:
      - name: Matcha Mochi
        description: Stone-ground matcha.
        price: 800
        image: products/matcha.jpg
      - name: Sakura Mochi
        price: 650
        available: false
  - name: Seasonal
";

    #[test]
    fn test_parses_catalog_file() {
        let file: CatalogFile = serde_yaml::from_str(SAMPLE).expect("valid yaml");

        assert_eq!(file.categories.len(), 2);
        let mochi = &file.categories[0];
        assert_eq!(mochi.products.len(), 2);
        assert!(mochi.products[0].available);
        assert!(!mochi.products[1].available);
        assert_eq!(mochi.products[1].description, "");
        assert!(file.categories[1].products.is_empty());
        assert!(validate(&file).is_empty());
    }

    #[test]
    fn test_validate_rejects_negative_price_and_blank_names() {
        let file: CatalogFile = serde_yaml::from_str(
            r"
categories:
  - name: ' '
    products:
      - name: ''
        price: -1
",
        )
        .expect("valid yaml");

        assert_eq!(validate(&file).len(), 3);
    }
}
