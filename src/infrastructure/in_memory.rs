use crate::domain::ports::{Filter, Query, Table, TableStore};
use crate::domain::settings::AdminSettings;
use crate::error::{Result, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value, json};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Rows {
    rows: Vec<Value>,
    next_id: i64,
}

impl Rows {
    /// Assigns an id when the row has none and stamps `created_at`.
    fn prepare(&mut self, mut row: Value) -> Result<Value> {
        let object = row
            .as_object_mut()
            .ok_or_else(|| StoreError::ValidationError("row must be a JSON object".to_string()))?;
        match object.get("id") {
            None | Some(Value::Null) => {
                self.next_id += 1;
                object.insert("id".to_string(), json!(self.next_id));
            }
            Some(Value::Number(n)) => {
                if let Some(id) = n.as_i64() {
                    self.next_id = self.next_id.max(id);
                }
            }
            Some(_) => {}
        }
        if !matches!(object.get("created_at"), Some(v) if !v.is_null()) {
            object.insert("created_at".to_string(), json!(Utc::now().to_rfc3339()));
        }
        Ok(row)
    }

    fn position(&self, id: &Value) -> Option<usize> {
        let filter = Filter::equals("id", id.clone());
        self.rows.iter().position(|row| filter.matches(row))
    }
}

/// A thread-safe in-memory table store.
///
/// Uses `Arc<RwLock<HashMap<Table, Rows>>>` for shared concurrent access.
/// Backs the CLI when no backend URL is configured, and the tests.
#[derive(Default, Clone)]
pub struct InMemoryBackend {
    tables: Arc<RwLock<HashMap<Table, Rows>>>,
}

impl InMemoryBackend {
    /// Creates a new, empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend holding the demo categories and default settings.
    pub async fn with_demo_data() -> Result<Self> {
        let backend = Self::new();
        let categories = [
            ("Skincare", "Cilt Bakımı", "skincare"),
            ("Makeup", "Makyaj", "makeup"),
            ("Fragrance", "Parfüm", "fragrance"),
        ]
        .into_iter()
        .map(|(name_en, name_tr, slug)| json!({ "name_en": name_en, "name_tr": name_tr, "slug": slug }))
        .collect();
        backend.insert(Table::Categories, categories).await?;
        backend
            .insert(
                Table::AdminSettings,
                vec![serde_json::to_value(AdminSettings::default())?],
            )
            .await?;
        backend
            .insert(
                Table::HeroBannerContent,
                vec![json!({
                    "title_en": "Glow Season",
                    "title_tr": "Işıltı Sezonu",
                    "title_ar": "موسم الإشراق",
                    "subtitle_en": "New skincare arrivals",
                    "subtitle_tr": "Yeni cilt bakım ürünleri",
                    "subtitle_ar": "وصول منتجات جديدة للعناية بالبشرة",
                    "slide_order": 1
                })],
            )
            .await?;
        Ok(backend)
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn merge(target: &mut Value, patch: &Map<String, Value>) {
    if let Some(object) = target.as_object_mut() {
        for (key, value) in patch {
            object.insert(key.clone(), value.clone());
        }
    }
}

#[async_trait]
impl TableStore for InMemoryBackend {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Value> = tables
            .get(&table)
            .map(|t| {
                t.rows
                    .iter()
                    .filter(|row| query.filters.iter().all(|f| f.matches(row)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if let Some((column, ascending)) = &query.order_by {
            rows.sort_by(|a, b| {
                let ord = compare(a.get(column), b.get(column));
                if *ascending { ord } else { ord.reverse() }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn insert(&self, table: Table, rows: Vec<Value>) -> Result<Vec<Value>> {
        let mut tables = self.tables.write().await;
        let entry = tables.entry(table).or_default();
        let mut inserted = Vec::with_capacity(rows.len());
        for row in rows {
            let row = entry.prepare(row)?;
            if let Some(id) = row.get("id")
                && entry.position(id).is_some()
            {
                return Err(StoreError::BackendError {
                    status: 409,
                    message: format!("duplicate key {id} in {table}"),
                });
            }
            entry.rows.push(row.clone());
            inserted.push(row);
        }
        Ok(inserted)
    }

    async fn update(&self, table: Table, filter: &Filter, patch: Value) -> Result<Vec<Value>> {
        let patch = match patch {
            Value::Object(mut map) => {
                map.remove("id");
                map
            }
            _ => {
                return Err(StoreError::ValidationError(
                    "patch must be a JSON object".to_string(),
                ));
            }
        };
        let mut tables = self.tables.write().await;
        let Some(entry) = tables.get_mut(&table) else {
            return Ok(Vec::new());
        };
        let mut updated = Vec::new();
        for row in entry.rows.iter_mut().filter(|row| filter.matches(row)) {
            merge(row, &patch);
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn upsert(&self, table: Table, rows: Vec<Value>) -> Result<Vec<Value>> {
        let mut tables = self.tables.write().await;
        let entry = tables.entry(table).or_default();
        let mut stored = Vec::with_capacity(rows.len());
        for row in rows {
            let existing = row.get("id").and_then(|id| entry.position(id));
            match (existing, row) {
                (Some(index), Value::Object(patch)) => {
                    merge(&mut entry.rows[index], &patch);
                    stored.push(entry.rows[index].clone());
                }
                (_, row) => {
                    let row = entry.prepare(row)?;
                    entry.rows.push(row.clone());
                    stored.push(row);
                }
            }
        }
        Ok(stored)
    }

    async fn delete(&self, table: Table, filter: &Filter) -> Result<()> {
        let mut tables = self.tables.write().await;
        if let Some(entry) = tables.get_mut(&table) {
            entry.rows.retain(|row| !filter.matches(row));
        }
        Ok(())
    }
}
