use super::{first_row, from_rows, to_row};
use crate::domain::ports::{Filter, Query, Table, TableStoreRef};
use crate::domain::settings::{AdminSettings, HeroSlide, SETTINGS_ROW_ID};
use crate::error::Result;
use tracing::{debug, info};

/// Shop settings and hero carousel content.
#[derive(Clone)]
pub struct SettingsService {
    store: TableStoreRef,
}

impl SettingsService {
    pub fn new(store: TableStoreRef) -> Self {
        Self { store }
    }

    /// Stored settings, or the defaults when the row has never been written.
    pub async fn load(&self) -> Result<AdminSettings> {
        let query = Query::new()
            .filter(Filter::equals("id", SETTINGS_ROW_ID))
            .limit(1);
        let rows = self.store.select(Table::AdminSettings, &query).await?;
        if rows.is_empty() {
            debug!("no stored settings, using defaults");
            return Ok(AdminSettings::default());
        }
        first_row(rows, "admin settings")
    }

    pub async fn update(&self, settings: &AdminSettings) -> Result<AdminSettings> {
        let row = to_row(&AdminSettings {
            id: Some(SETTINGS_ROW_ID),
            ..settings.clone()
        })?;
        let rows = self.store.upsert(Table::AdminSettings, vec![row]).await?;
        let stored: AdminSettings = first_row(rows, "admin settings")?;
        info!(
            shipping_cost = %stored.shipping_cost,
            free_shipping_threshold = %stored.free_shipping_threshold,
            "settings updated"
        );
        Ok(stored)
    }

    pub async fn list_slides(&self) -> Result<Vec<HeroSlide>> {
        let query = Query::new().order_asc("slide_order");
        from_rows(self.store.select(Table::HeroBannerContent, &query).await?)
    }

    /// Inserts a new slide, or replaces the stored one when `slide.id` is set.
    pub async fn save_slide(&self, slide: &HeroSlide) -> Result<HeroSlide> {
        let row = to_row(slide)?;
        let rows = match slide.id {
            Some(id) => {
                self.store
                    .update(Table::HeroBannerContent, &Filter::equals("id", id), row)
                    .await?
            }
            None => self.store.insert(Table::HeroBannerContent, vec![row]).await?,
        };
        first_row(rows, "hero slide")
    }

    pub async fn delete_slide(&self, id: i64) -> Result<()> {
        self.store
            .delete(Table::HeroBannerContent, &Filter::equals("id", id))
            .await
    }
}
