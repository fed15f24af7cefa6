use super::{first_row, from_rows, to_row};
use crate::domain::address::Address;
use crate::domain::order::{Order, OrderStatus};
use crate::domain::ports::{Filter, Query, Table, TableStoreRef};
use crate::error::Result;
use serde_json::json;
use tracing::info;

/// Order persistence and back-office status changes.
#[derive(Clone)]
pub struct OrderService {
    store: TableStoreRef,
}

impl OrderService {
    pub fn new(store: TableStoreRef) -> Self {
        Self { store }
    }

    /// Newest first; limited to one wallet when `wallet` is given.
    pub async fn list_orders(&self, wallet: Option<&Address>) -> Result<Vec<Order>> {
        let mut query = Query::new().order_desc("created_at");
        if let Some(wallet) = wallet {
            query = query.filter(Filter::equals("user_wallet", wallet.to_string()));
        }
        from_rows(self.store.select(Table::Orders, &query).await?)
    }

    pub async fn get_order(&self, id: &str) -> Result<Order> {
        let query = Query::new().filter(Filter::equals("id", id)).limit(1);
        let rows = self.store.select(Table::Orders, &query).await?;
        first_row(rows, &format!("order {id}"))
    }

    /// Writes `order` keyed by its id. Writing the same order twice leaves
    /// one row.
    pub async fn record_order(&self, order: &Order) -> Result<Order> {
        let rows = self.store.upsert(Table::Orders, vec![to_row(order)?]).await?;
        let stored: Order = first_row(rows, &format!("order {}", order.id))?;
        info!(order_id = %stored.id, total = %stored.total, "order recorded");
        Ok(stored)
    }

    /// Fails with `NotFound` when no order has `id`.
    pub async fn update_status(&self, id: &str, status: OrderStatus) -> Result<Order> {
        let rows = self
            .store
            .update(
                Table::Orders,
                &Filter::equals("id", id),
                json!({ "status": status }),
            )
            .await?;
        let updated = first_row(rows, &format!("order {id}"))?;
        info!(order_id = id, %status, "order status updated");
        Ok(updated)
    }
}
