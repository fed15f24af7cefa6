mod common;

use async_trait::async_trait;
use common::product;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use tokenshop::application::catalog::CatalogService;
use tokenshop::application::pricing::PriceService;
use tokenshop::application::settings::SettingsService;
use tokenshop::domain::catalog::{Category, DEFAULT_PRODUCT_IMAGE};
use tokenshop::domain::ports::PriceSource;
use tokenshop::domain::settings::{AdminSettings, HeroSlide};
use tokenshop::error::{Result, StoreError};
use tokenshop::infrastructure::in_memory::InMemoryBackend;
use tokenshop::interfaces::csv::product_reader::ProductReader;

struct FixedPrice(Decimal);

#[async_trait]
impl PriceSource for FixedPrice {
    async fn fetch_usd_price(&self) -> Result<Decimal> {
        Ok(self.0)
    }
}

async fn catalog() -> CatalogService {
    CatalogService::new(Arc::new(InMemoryBackend::with_demo_data().await.unwrap()))
}

#[tokio::test]
async fn test_product_lifecycle() {
    let catalog = catalog().await;

    let added = catalog.add_product(&product(0, dec!(12), 3)).await.unwrap();
    let id = added.id.unwrap();
    assert!(added.created_at.is_some());

    let mut changed = added.clone();
    changed.stock = 9;
    changed.price = dec!(15.5);
    let updated = catalog.update_product(id, &changed).await.unwrap();
    assert_eq!(updated.stock, 9);
    assert_eq!(updated.price, dec!(15.5));
    assert_eq!(updated.created_at, added.created_at);

    catalog.delete_product(id).await.unwrap();
    assert!(catalog.list_products().await.unwrap().is_empty());

    let missing = catalog.update_product(id, &changed).await;
    assert!(matches!(missing, Err(StoreError::NotFound(_))));
}

#[tokio::test]
async fn test_bulk_add_orders_by_id() {
    let catalog = catalog().await;
    assert!(catalog.bulk_add_products(&[]).await.unwrap().is_empty());

    let stored = catalog
        .bulk_add_products(&[product(0, dec!(1), 1), product(0, dec!(2), 1)])
        .await
        .unwrap();
    assert_eq!(stored.len(), 2);

    let ids: Vec<_> = catalog
        .list_products()
        .await
        .unwrap()
        .iter()
        .map(|p| p.id.unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2]);
}

#[tokio::test]
async fn test_categories_sorted_by_name() {
    let catalog = catalog().await;
    let added = catalog
        .add_category(&Category::new("Hair Care & Styling", None))
        .await
        .unwrap();
    assert_eq!(added.slug, "hair-care-styling");

    let names: Vec<_> = catalog
        .list_categories()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name_en)
        .collect();
    assert_eq!(names, vec!["Fragrance", "Hair Care & Styling", "Makeup", "Skincare"]);

    catalog.delete_category(added.id.unwrap()).await.unwrap();
    assert_eq!(catalog.list_categories().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_import_preview_converts_prices_and_checks_categories() {
    let catalog = catalog().await;
    let prices = PriceService::new(
        Box::new(FixedPrice(dec!(0.5))),
        Duration::from_secs(300),
        dec!(0.001),
    );
    let data = "name,product_code,price_usd,image,category,description,stock\n\
                Serum,PRD-1,10,,skincare,Glow,5\n\
                Lipstick,PRD-2,4,https://x/lip.jpg,Makeup,Red,2\n\
                Candle,PRD-3,8,,candles,Warm,1\n\
                ,PRD-4,1,,skincare,,1\n";

    let reader = ProductReader::new(data.as_bytes()).unwrap();
    let preview = catalog.preview_import(reader.rows(), &prices).await.unwrap();

    assert_eq!(preview.products.len(), 2);
    assert_eq!(preview.products[0].price, dec!(20));
    assert_eq!(preview.products[0].image, DEFAULT_PRODUCT_IMAGE);
    assert_eq!(preview.products[1].price, dec!(8));
    assert_eq!(preview.products[1].category, "makeup");
    assert_eq!(preview.products[1].product_code.as_deref(), Some("PRD-2"));

    let errors: Vec<String> = preview.errors.iter().map(ToString::to_string).collect();
    assert_eq!(
        errors,
        vec!["Row 4: Invalid category \"candles\"", "Row 5: Name is required"]
    );

    let stored = catalog.bulk_add_products(&preview.products).await.unwrap();
    assert_eq!(stored.len(), 2);
}

#[tokio::test]
async fn test_settings_default_and_update() {
    let settings = SettingsService::new(Arc::new(InMemoryBackend::new()));
    assert_eq!(settings.load().await.unwrap(), AdminSettings::default());

    let updated = settings
        .update(&AdminSettings {
            id: None,
            shipping_cost: dec!(30),
            free_shipping_threshold: dec!(600),
        })
        .await
        .unwrap();
    assert_eq!(updated.id, Some(1));

    settings
        .update(&AdminSettings {
            shipping_cost: dec!(35),
            ..updated
        })
        .await
        .unwrap();
    let loaded = settings.load().await.unwrap();
    assert_eq!(loaded.shipping_cost, dec!(35));
    assert_eq!(loaded.free_shipping_threshold, dec!(600));
}

#[tokio::test]
async fn test_hero_slides_ordered() {
    let settings = SettingsService::new(Arc::new(InMemoryBackend::new()));
    for (order, title) in [(2, "Second"), (1, "First")] {
        settings
            .save_slide(&HeroSlide {
                title_en: title.to_string(),
                slide_order: order,
                ..Default::default()
            })
            .await
            .unwrap();
    }

    let slides = settings.list_slides().await.unwrap();
    let titles: Vec<_> = slides.iter().map(|s| s.title_en.as_str()).collect();
    assert_eq!(titles, vec!["First", "Second"]);

    let mut first = slides[0].clone();
    first.title_en = "Renamed".to_string();
    settings.save_slide(&first).await.unwrap();
    settings.delete_slide(slides[1].id.unwrap()).await.unwrap();

    let slides = settings.list_slides().await.unwrap();
    assert_eq!(slides.len(), 1);
    assert_eq!(slides[0].title_en, "Renamed");
}
