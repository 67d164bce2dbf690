use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::models::{
    validate_identifier, AddCartItemRequest, Cart, CartItemUpdate, CartLineItem, CartSummary,
    ServiceError, ServiceResult, StorageResult, Validate,
};
use crate::observability::{BusinessTracingMiddleware, Metrics};
use crate::repositories::KeyValueStore;
use crate::warn_with_trace;

/// Storage key of the single-client cart
pub const DEFAULT_CART_KEY: &str = "farm_trade_cart";

/// Storage key of an owner's cart
pub fn cart_storage_key(owner_id: &str) -> String {
    format!("{}:{}", DEFAULT_CART_KEY, owner_id)
}

/// One persisted cart: an ordered list of line items stored as a single
/// JSON value under `cart_key`.
///
/// Every mutation reads the whole cart, changes it in memory and writes it
/// back with one `set`. The write lock is held across that sequence.
pub struct CartService {
    storage: Arc<dyn KeyValueStore>,
    cart_key: String,
    owner_id: Option<String>,
    write_lock: Arc<Mutex<()>>,
    tracing: Arc<BusinessTracingMiddleware>,
}

impl CartService {
    /// Cart stored under the default key
    pub fn new(storage: Arc<dyn KeyValueStore>, metrics: Arc<Metrics>) -> Self {
        Self {
            storage,
            cart_key: DEFAULT_CART_KEY.to_string(),
            owner_id: None,
            write_lock: Arc::new(Mutex::new(())),
            tracing: Arc::new(BusinessTracingMiddleware::new(metrics)),
        }
    }

    pub fn cart_key(&self) -> &str {
        &self.cart_key
    }

    /// Current line items. Missing, unreadable or corrupt data reads as an empty cart.
    #[instrument(skip(self), fields(cart_key = %self.cart_key))]
    pub async fn get_cart_items(&self) -> Vec<CartLineItem> {
        match self.read_cart().await {
            Ok(cart) => cart.items,
            Err(e) => {
                warn_with_trace!(error = %e, "Cart read failed, returning empty cart");
                Vec::new()
            }
        }
    }

    /// Add a line or merge into the existing line for the same product and seller
    #[instrument(skip(self, request), fields(
        cart_key = %self.cart_key,
        product_id = %request.product_id,
        seller_id = %request.seller_id,
        quantity = request.quantity
    ))]
    pub async fn add_to_cart(&self, request: AddCartItemRequest) -> ServiceResult<CartLineItem> {
        request.validate()?;

        self.tracing
            .trace_cart_operation("add_to_cart", self.owner_id.as_deref(), async {
                let _guard = self.write_lock.lock().await;

                let mut cart = self.read_cart().await?;
                let line = cart.add_item(request, Utc::now())?.clone();
                self.write_cart(&cart).await?;

                info!(item_id = %line.id, quantity = line.quantity, "Cart line saved");
                Ok::<_, ServiceError>(line)
            })
            .await
    }

    /// Set a line's quantity; zero or below removes it, an unknown id is a no-op
    #[instrument(skip(self), fields(cart_key = %self.cart_key))]
    pub async fn update_cart_item(
        &self,
        item_id: &str,
        quantity: i64,
    ) -> ServiceResult<CartItemUpdate> {
        self.tracing
            .trace_cart_operation("update_cart_item", self.owner_id.as_deref(), async {
                let _guard = self.write_lock.lock().await;

                let mut cart = self.read_cart().await?;
                let outcome = cart.update_item_quantity(item_id, quantity)?;
                if outcome == CartItemUpdate::NotFound {
                    debug!("No line with this id, nothing to update");
                    return Ok(outcome);
                }
                self.write_cart(&cart).await?;

                Ok::<_, ServiceError>(outcome)
            })
            .await
    }

    /// Remove a line; returns whether one was removed
    #[instrument(skip(self), fields(cart_key = %self.cart_key))]
    pub async fn remove_from_cart(&self, item_id: &str) -> ServiceResult<bool> {
        self.tracing
            .trace_cart_operation("remove_from_cart", self.owner_id.as_deref(), async {
                let _guard = self.write_lock.lock().await;

                let mut cart = self.read_cart().await?;
                if !cart.remove_item(item_id) {
                    debug!("No line with this id, nothing to remove");
                    return Ok(false);
                }
                self.write_cart(&cart).await?;

                Ok::<_, ServiceError>(true)
            })
            .await
    }

    /// Delete the persisted cart
    #[instrument(skip(self), fields(cart_key = %self.cart_key))]
    pub async fn clear_cart(&self) -> ServiceResult<()> {
        self.tracing
            .trace_cart_operation("clear_cart", self.owner_id.as_deref(), async {
                let _guard = self.write_lock.lock().await;
                self.storage.delete(&self.cart_key).await?;
                Ok::<_, ServiceError>(())
            })
            .await
    }

    /// Totals over the current cart; any read or arithmetic failure yields the zero summary
    #[instrument(skip(self), fields(cart_key = %self.cart_key))]
    pub async fn get_cart_summary(&self) -> CartSummary {
        let summary = match self.read_cart().await {
            Ok(cart) => cart.summary(),
            Err(e) => Err(e.into()),
        };

        summary.unwrap_or_else(|e: ServiceError| {
            warn_with_trace!(error = %e, "Cart summary unavailable, returning empty summary");
            CartSummary::default()
        })
    }

    /// Storage errors propagate; a value that does not decode reads as empty
    async fn read_cart(&self) -> StorageResult<Cart> {
        let Some(raw) = self.storage.get(&self.cart_key).await? else {
            return Ok(Cart::new());
        };

        match serde_json::from_str::<Cart>(&raw) {
            Ok(cart) => Ok(cart),
            Err(e) => {
                warn!(error = %e, "Stored cart is corrupt, treating it as empty");
                Ok(Cart::new())
            }
        }
    }

    async fn write_cart(&self, cart: &Cart) -> StorageResult<()> {
        let value = serde_json::to_string(cart)?;
        self.storage.set(&self.cart_key, value).await
    }
}

/// Hands out per-owner carts over one storage backend.
///
/// Carts for the same owner share a write lock so concurrent requests
/// cannot interleave inside one read-modify-write.
pub struct CartDirectory {
    storage: Arc<dyn KeyValueStore>,
    tracing: Arc<BusinessTracingMiddleware>,
    locks: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CartDirectory {
    pub fn new(storage: Arc<dyn KeyValueStore>, metrics: Arc<Metrics>) -> Self {
        Self {
            storage,
            tracing: Arc::new(BusinessTracingMiddleware::new(metrics)),
            locks: StdMutex::new(HashMap::new()),
        }
    }

    /// Cart bound to `owner_id`, ignoring surrounding whitespace
    pub fn cart_for(&self, owner_id: &str) -> ServiceResult<CartService> {
        let owner_id = owner_id.trim();
        validate_identifier("ownerId", owner_id)?;

        let cart_key = cart_storage_key(owner_id);
        let write_lock = {
            let mut locks = self
                .locks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            locks
                .entry(cart_key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        Ok(CartService {
            storage: self.storage.clone(),
            cart_key,
            owner_id: Some(owner_id.to_string()),
            write_lock,
            tracing: self.tracing.clone(),
        })
    }
}
