// apps/storefront/src/backend/pg.rs

//! Row store over a direct Postgres connection to the same schema the REST
//! service exposes. Ids are uuid columns and travel as text.

use super::{BackendError, BackendResult, RowStore};
use crate::models::{NewOrder, Order, OrderLine, PaymentUpdate, Product, Rating, UserProfile};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::instrument;

const ORDER_COLUMNS: &str = "id::text AS id, order_number, user_id::text AS user_id, \
   total_amount::int8 AS total_amount, status::text AS status, payment_method, delivery_method, \
   delivery_address, payment_proof_url, COALESCE(is_preorder, false) AS is_preorder, created_at, updated_at";

const LINE_COLUMNS: &str = "order_id::text AS order_id, product_id::text AS product_id, product_name, \
   product_price::int8 AS product_price, quantity, subtotal::int8 AS subtotal";

pub struct PgRowStore {
  pool: PgPool,
}

impl PgRowStore {
  pub async fn connect(database_url: &str) -> BackendResult<Self> {
    let pool = PgPoolOptions::new().max_connections(5).connect(database_url).await?;
    tracing::info!("Successfully connected to the database.");
    Ok(Self { pool })
  }

  async fn attach_lines(&self, mut orders: Vec<Order>) -> BackendResult<Vec<Order>> {
    if orders.is_empty() {
      return Ok(orders);
    }
    let ids: Vec<String> = orders.iter().map(|o| o.id.clone()).collect();
    let lines: Vec<OrderLine> = sqlx::query_as(&format!(
      "SELECT {} FROM order_items WHERE order_id::text = ANY($1)",
      LINE_COLUMNS
    ))
    .bind(&ids)
    .fetch_all(&self.pool)
    .await?;

    let mut by_order: HashMap<String, Vec<OrderLine>> = HashMap::new();
    for line in lines {
      by_order.entry(line.order_id.clone()).or_default().push(line);
    }
    for order in &mut orders {
      order.lines = by_order.remove(&order.id).unwrap_or_default();
    }
    Ok(orders)
  }
}

#[async_trait]
impl RowStore for PgRowStore {
  #[instrument(name = "pg::available_products", skip_all, err(Display))]
  async fn available_products(&self) -> BackendResult<Vec<Product>> {
    let rows = sqlx::query_as::<_, Product>(
      "SELECT id::text AS id, name, price::int8 AS price, COALESCE(image_url, '') AS image_url, \
       COALESCE(rating, 0)::float8 AS rating, COALESCE(category, '') AS category, COALESCE(stock, 0)::int4 AS stock, \
       COALESCE(description, '') AS description, is_available, created_at \
       FROM products WHERE is_available = true ORDER BY created_at DESC",
    )
    .fetch_all(&self.pool)
    .await?;
    Ok(rows)
  }

  #[instrument(name = "pg::find_profile", skip(self), err(Display))]
  async fn find_profile(&self, user_id: &str) -> BackendResult<Option<UserProfile>> {
    let row = sqlx::query_as::<_, UserProfile>(
      "SELECT id::text AS id, COALESCE(full_name, '') AS full_name, COALESCE(phone, '') AS phone, \
       COALESCE(address, '') AS address, email FROM user_profiles WHERE id::text = $1",
    )
    .bind(user_id)
    .fetch_optional(&self.pool)
    .await?;
    Ok(row)
  }

  #[instrument(name = "pg::insert_profile", skip_all, fields(user_id = %profile.id), err(Display))]
  async fn insert_profile(&self, profile: &UserProfile) -> BackendResult<()> {
    sqlx::query(
      "INSERT INTO user_profiles (id, full_name, phone, address, email) VALUES ($1::uuid, $2, $3, $4, $5) \
       ON CONFLICT (id) DO NOTHING",
    )
    .bind(&profile.id)
    .bind(&profile.full_name)
    .bind(&profile.phone)
    .bind(&profile.address)
    .bind(&profile.email)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  #[instrument(name = "pg::update_profile_contact", skip(self, full_name, phone, address), err(Display))]
  async fn update_profile_contact(
    &self,
    user_id: &str,
    full_name: &str,
    phone: &str,
    address: &str,
  ) -> BackendResult<()> {
    // A missing row updates nothing, as over REST.
    sqlx::query(
      "UPDATE user_profiles SET full_name = $2, phone = $3, address = $4, updated_at = now() WHERE id::text = $1",
    )
    .bind(user_id)
    .bind(full_name)
    .bind(phone)
    .bind(address)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  #[instrument(name = "pg::insert_order", skip_all, fields(order_number = %order.order_number), err(Display))]
  async fn insert_order(&self, order: &NewOrder) -> BackendResult<Order> {
    let inserted = sqlx::query_as::<_, Order>(&format!(
      "INSERT INTO orders (user_id, order_number, total_amount, status, payment_method, delivery_address, \
       delivery_method, is_preorder) VALUES ($1::uuid, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
      ORDER_COLUMNS
    ))
    .bind(&order.user_id)
    .bind(&order.order_number)
    .bind(order.total_amount)
    .bind(order.status.as_str())
    .bind(&order.payment_method)
    .bind(&order.delivery_address)
    .bind(&order.delivery_method)
    .bind(order.is_preorder)
    .fetch_one(&self.pool)
    .await?;
    Ok(inserted)
  }

  #[instrument(name = "pg::insert_order_lines", skip_all, fields(count = lines.len()), err(Display))]
  async fn insert_order_lines(&self, lines: &[OrderLine]) -> BackendResult<()> {
    let mut tx = self.pool.begin().await?;
    for line in lines {
      sqlx::query(
        "INSERT INTO order_items (order_id, product_id, product_name, product_price, quantity, subtotal) \
         VALUES ($1::uuid, $2, $3, $4, $5, $6)",
      )
      .bind(&line.order_id)
      .bind(&line.product_id)
      .bind(&line.product_name)
      .bind(line.product_price)
      .bind(line.quantity)
      .bind(line.subtotal)
      .execute(&mut *tx)
      .await?;
    }
    tx.commit().await?;
    Ok(())
  }

  #[instrument(name = "pg::find_order", skip(self), err(Display))]
  async fn find_order(&self, order_id: &str) -> BackendResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!("SELECT {} FROM orders WHERE id::text = $1", ORDER_COLUMNS))
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await?;
    match order {
      Some(order) => Ok(self.attach_lines(vec![order]).await?.into_iter().next()),
      None => Ok(None),
    }
  }

  #[instrument(name = "pg::orders_for_user", skip(self), err(Display))]
  async fn orders_for_user(&self, user_id: &str) -> BackendResult<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(&format!(
      "SELECT {} FROM orders WHERE user_id::text = $1 ORDER BY created_at DESC",
      ORDER_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(&self.pool)
    .await?;
    self.attach_lines(orders).await
  }

  #[instrument(name = "pg::update_order_payment", skip(self, update), fields(status = %update.status), err(Display))]
  async fn update_order_payment(&self, order_id: &str, update: &PaymentUpdate) -> BackendResult<()> {
    let result = sqlx::query(
      "UPDATE orders SET status = $2, payment_proof_url = $3, updated_at = COALESCE($4, updated_at) \
       WHERE id::text = $1",
    )
    .bind(order_id)
    .bind(update.status.as_str())
    .bind(&update.payment_proof_url)
    .bind(update.updated_at)
    .execute(&self.pool)
    .await?;
    if result.rows_affected() == 0 {
      return Err(BackendError::NotFound);
    }
    Ok(())
  }

  #[instrument(name = "pg::ratings_for_order", skip(self), err(Display))]
  async fn ratings_for_order(&self, user_id: &str, order_id: &str) -> BackendResult<Vec<Rating>> {
    let rows = sqlx::query_as::<_, Rating>(
      "SELECT user_id::text AS user_id, order_id::text AS order_id, product_id::text AS product_id, \
       rating::int2 AS rating, review FROM product_ratings WHERE user_id::text = $1 AND order_id::text = $2",
    )
    .bind(user_id)
    .bind(order_id)
    .fetch_all(&self.pool)
    .await?;
    Ok(rows)
  }

  #[instrument(name = "pg::upsert_ratings", skip_all, fields(count = ratings.len()), err(Display))]
  async fn upsert_ratings(&self, ratings: &[Rating]) -> BackendResult<()> {
    let mut tx = self.pool.begin().await?;
    for rating in ratings {
      sqlx::query(
        "INSERT INTO product_ratings (user_id, order_id, product_id, rating, review) \
         VALUES ($1::uuid, $2::uuid, $3, $4, $5) \
         ON CONFLICT (user_id, order_id, product_id) DO UPDATE SET rating = EXCLUDED.rating, review = EXCLUDED.review",
      )
      .bind(&rating.user_id)
      .bind(&rating.order_id)
      .bind(&rating.product_id)
      .bind(rating.rating)
      .bind(&rating.review)
      .execute(&mut *tx)
      .await?;
    }
    tx.commit().await?;
    Ok(())
  }
}
