use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{ServiceError, ServiceResult};

/// How a line item reaches the buyer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    Pickup,
    Delivery,
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryMode::Pickup => write!(f, "pickup"),
            DeliveryMode::Delivery => write!(f, "delivery"),
        }
    }
}

impl FromStr for DeliveryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pickup" => Ok(DeliveryMode::Pickup),
            "delivery" => Ok(DeliveryMode::Delivery),
            _ => Err(format!("Invalid delivery mode: {}", s)),
        }
    }
}

/// One entry in a cart: a quantity of one product from one seller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub seller_id: String,
    pub seller_name: String,
    pub seller_location: String,
    pub quantity: u32,
    pub unit: String,
    pub price_per_unit: Decimal,
    pub total_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub category: String,
    pub estimated_delivery: String,
    pub delivery_mode: DeliveryMode,
    pub max_quantity: u32,
}

/// Request model for adding an item to the cart (a line item without id and total)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemRequest {
    pub product_id: String,
    pub product_name: String,
    pub seller_id: String,
    pub seller_name: String,
    pub seller_location: String,
    pub quantity: u32,
    pub unit: String,
    pub price_per_unit: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub category: String,
    pub estimated_delivery: String,
    pub delivery_mode: DeliveryMode,
    pub max_quantity: u32,
}

/// Request model for updating a line's quantity; zero or below removes the line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: i64,
}

/// Aggregate view of a cart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub total_items: u64,
    pub subtotal: Decimal,
    pub item_count: usize,
}

/// Outcome of a quantity update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartItemUpdate {
    Updated,
    Removed,
    NotFound,
}

/// Ordered collection of line items, persisted as a single JSON array
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    pub items: Vec<CartLineItem>,
}

impl CartLineItem {
    /// Build a new line from an add request, stamping its identity
    pub fn from_request(request: AddCartItemRequest, id: String) -> ServiceResult<Self> {
        let total_price = line_total(request.price_per_unit, request.quantity)?;

        Ok(Self {
            id,
            product_id: request.product_id,
            product_name: request.product_name,
            seller_id: request.seller_id,
            seller_name: request.seller_name,
            seller_location: request.seller_location,
            quantity: request.quantity,
            unit: request.unit,
            price_per_unit: request.price_per_unit,
            total_price,
            image: request.image,
            category: request.category,
            estimated_delivery: request.estimated_delivery,
            delivery_mode: request.delivery_mode,
            max_quantity: request.max_quantity,
        })
    }

    /// Identity of a line: product, seller and the creation instant in millis.
    /// `Cart` keeps these unique by advancing the instant on a clash.
    pub fn line_id(product_id: &str, seller_id: &str, added_at_millis: i64) -> String {
        format!("{}_{}_{}", product_id, seller_id, added_at_millis)
    }

    /// `quantity * price_per_unit`, or `None` past the decimal range
    pub fn computed_total(&self) -> Option<Decimal> {
        self.price_per_unit
            .checked_mul(Decimal::from(self.quantity))
    }

    pub fn is_for(&self, product_id: &str, seller_id: &str) -> bool {
        self.product_id == product_id && self.seller_id == seller_id
    }

    fn capacity_error(&self) -> ServiceError {
        ServiceError::CapacityExceeded {
            max_quantity: self.max_quantity,
            unit: self.unit.clone(),
        }
    }
}

fn line_total(price_per_unit: Decimal, quantity: u32) -> ServiceResult<Decimal> {
    price_per_unit
        .checked_mul(Decimal::from(quantity))
        .ok_or(ServiceError::AmountOutOfRange)
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a line, or merge the quantity into the existing line for the same
    /// product and seller. On a capacity or amount violation the cart is untouched.
    pub fn add_item(
        &mut self,
        request: AddCartItemRequest,
        added_at: DateTime<Utc>,
    ) -> ServiceResult<&CartLineItem> {
        match self
            .items
            .iter()
            .position(|item| item.is_for(&request.product_id, &request.seller_id))
        {
            Some(index) => {
                let existing = &self.items[index];
                let merged = u64::from(existing.quantity) + u64::from(request.quantity);
                if merged > u64::from(existing.max_quantity) {
                    return Err(existing.capacity_error());
                }
                // bounded by max_quantity above
                let merged = merged as u32;
                let total = line_total(existing.price_per_unit, merged)?;
                self.ensure_subtotal_with(Some(index), total)?;

                let existing = &mut self.items[index];
                existing.quantity = merged;
                existing.total_price = total;
                Ok(&self.items[index])
            }
            None => {
                let id = self.unused_line_id(
                    &request.product_id,
                    &request.seller_id,
                    added_at.timestamp_millis(),
                );
                let line = CartLineItem::from_request(request, id)?;
                self.ensure_subtotal_with(None, line.total_price)?;

                self.items.push(line);
                Ok(&self.items[self.items.len() - 1])
            }
        }
    }

    /// Apply a new quantity to the line with `item_id`
    pub fn update_item_quantity(
        &mut self,
        item_id: &str,
        quantity: i64,
    ) -> ServiceResult<CartItemUpdate> {
        let Some(index) = self.items.iter().position(|item| item.id == item_id) else {
            return Ok(CartItemUpdate::NotFound);
        };

        if quantity <= 0 {
            self.items.remove(index);
            return Ok(CartItemUpdate::Removed);
        }

        let item = &self.items[index];
        if quantity > i64::from(item.max_quantity) {
            return Err(item.capacity_error());
        }

        // bounded by max_quantity above
        let quantity = quantity as u32;
        let total = line_total(item.price_per_unit, quantity)?;
        self.ensure_subtotal_with(Some(index), total)?;

        let item = &mut self.items[index];
        item.quantity = quantity;
        item.total_price = total;
        Ok(CartItemUpdate::Updated)
    }

    /// Remove the line with `item_id`; returns whether anything was removed
    pub fn remove_item(&mut self, item_id: &str) -> bool {
        let original_len = self.items.len();
        self.items.retain(|item| item.id != item_id);
        self.items.len() != original_len
    }

    pub fn get_item(&self, item_id: &str) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn find_line(&self, product_id: &str, seller_id: &str) -> Option<&CartLineItem> {
        self.items
            .iter()
            .find(|item| item.is_for(product_id, seller_id))
    }

    /// Sum of quantities across all lines
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of line totals, or `None` past the decimal range
    pub fn subtotal(&self) -> Option<Decimal> {
        self.items
            .iter()
            .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.total_price))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn summary(&self) -> ServiceResult<CartSummary> {
        Ok(CartSummary {
            total_items: self.total_items(),
            subtotal: self.subtotal().ok_or(ServiceError::AmountOutOfRange)?,
            item_count: self.items.len(),
        })
    }

    /// Fails if the subtotal would leave the decimal range once the line at
    /// `replacing` (or a new line) carries `line_total`
    fn ensure_subtotal_with(
        &self,
        replacing: Option<usize>,
        line_total: Decimal,
    ) -> ServiceResult<()> {
        self.items
            .iter()
            .enumerate()
            .filter(|(index, _)| Some(*index) != replacing)
            .try_fold(line_total, |sum, (_, item)| sum.checked_add(item.total_price))
            .map(|_| ())
            .ok_or(ServiceError::AmountOutOfRange)
    }

    fn unused_line_id(&self, product_id: &str, seller_id: &str, mut millis: i64) -> String {
        loop {
            let id = CartLineItem::line_id(product_id, seller_id, millis);
            if self.get_item(&id).is_none() {
                return id;
            }
            millis += 1;
        }
    }
}

impl From<Vec<CartLineItem>> for Cart {
    fn from(items: Vec<CartLineItem>) -> Self {
        Self { items }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use rust_decimal_macros::dec;

    pub fn add_request(product_id: &str, seller_id: &str, quantity: u32) -> AddCartItemRequest {
        AddCartItemRequest {
            product_id: product_id.to_string(),
            product_name: "Tomatoes".to_string(),
            seller_id: seller_id.to_string(),
            seller_name: "Green Acres".to_string(),
            seller_location: "Nashik".to_string(),
            quantity,
            unit: "kg".to_string(),
            price_per_unit: dec!(10),
            image: None,
            category: "Vegetables".to_string(),
            estimated_delivery: "2-3 days".to_string(),
            delivery_mode: DeliveryMode::Delivery,
            max_quantity: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::add_request;
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_cart_creation() {
        let cart = Cart::new();

        assert!(cart.is_empty());
        assert_eq!(cart.summary().unwrap(), CartSummary::default());
    }

    #[test]
    fn test_add_item_computes_total() {
        let mut cart = Cart::new();

        let item = cart.add_item(add_request("P1", "S1", 3), Utc::now()).unwrap();

        assert_eq!(item.quantity, 3);
        assert_eq!(item.total_price, dec!(30));
        assert!(item.id.starts_with("P1_S1_"));
    }

    #[test]
    fn test_add_existing_item_merges_quantity() {
        let mut cart = Cart::new();
        cart.add_item(add_request("P1", "S1", 2), Utc::now()).unwrap();
        cart.add_item(add_request("P1", "S1", 5), Utc::now()).unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 7);
        assert_eq!(cart.items[0].total_price, dec!(70));
    }

    #[test]
    fn test_same_product_different_seller_is_distinct_line() {
        let mut cart = Cart::new();
        cart.add_item(add_request("P1", "S1", 2), Utc::now()).unwrap();
        cart.add_item(add_request("P1", "S2", 2), Utc::now()).unwrap();

        assert_eq!(cart.items.len(), 2);
        assert!(cart.find_line("P1", "S2").is_some());
    }

    #[test]
    fn test_merge_over_capacity_leaves_cart_unchanged() {
        let mut cart = Cart::new();
        cart.add_item(add_request("P1", "S1", 8), Utc::now()).unwrap();
        let before = cart.clone();

        let result = cart.add_item(add_request("P1", "S1", 3), Utc::now());

        match result {
            Err(ServiceError::CapacityExceeded { max_quantity, unit }) => {
                assert_eq!(max_quantity, 10);
                assert_eq!(unit, "kg");
            }
            other => panic!("Expected CapacityExceeded, got {:?}", other),
        }
        assert_eq!(cart, before);
    }

    #[test]
    fn test_update_item_quantity() {
        let mut cart = Cart::new();
        let id = cart
            .add_item(add_request("P1", "S1", 2), Utc::now())
            .unwrap()
            .id
            .clone();

        assert_eq!(
            cart.update_item_quantity(&id, 6).unwrap(),
            CartItemUpdate::Updated
        );
        assert_eq!(cart.items[0].quantity, 6);
        assert_eq!(cart.items[0].total_price, dec!(60));

        assert_eq!(
            cart.update_item_quantity("missing", 1).unwrap(),
            CartItemUpdate::NotFound
        );
    }

    #[test]
    fn test_update_quantity_to_zero_or_below_removes_item() {
        let mut cart = Cart::new();
        let first = cart
            .add_item(add_request("P1", "S1", 2), Utc::now())
            .unwrap()
            .id
            .clone();
        let second = cart
            .add_item(add_request("P2", "S1", 2), Utc::now())
            .unwrap()
            .id
            .clone();

        assert_eq!(
            cart.update_item_quantity(&first, 0).unwrap(),
            CartItemUpdate::Removed
        );
        assert_eq!(
            cart.update_item_quantity(&second, -4).unwrap(),
            CartItemUpdate::Removed
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_over_capacity_fails() {
        let mut cart = Cart::new();
        let id = cart
            .add_item(add_request("P1", "S1", 2), Utc::now())
            .unwrap()
            .id
            .clone();
        let before = cart.clone();

        assert!(cart.update_item_quantity(&id, 11).is_err());
        assert_eq!(cart, before);
    }

    #[test]
    fn test_remove_item() {
        let mut cart = Cart::new();
        let id = cart
            .add_item(add_request("P1", "S1", 2), Utc::now())
            .unwrap()
            .id
            .clone();
        cart.add_item(add_request("P2", "S1", 1), Utc::now()).unwrap();

        assert!(cart.remove_item(&id));
        assert_eq!(cart.items.len(), 1);
        assert!(!cart.remove_item("missing"));
        assert_eq!(cart.items.len(), 1);
    }

    #[test]
    fn test_summary() {
        let mut cart = Cart::new();
        cart.add_item(add_request("P1", "S1", 2), Utc::now()).unwrap();
        let mut second = add_request("P2", "S2", 1);
        second.price_per_unit = dec!(5);
        cart.add_item(second, Utc::now()).unwrap();

        let summary = cart.summary().unwrap();
        assert_eq!(summary.total_items, 3);
        assert_eq!(summary.subtotal, dec!(25));
        assert_eq!(summary.item_count, 2);
    }

    #[test]
    fn test_line_total_past_decimal_range_is_rejected() {
        let mut cart = Cart::new();
        let mut request = add_request("P1", "S1", 2);
        request.price_per_unit = Decimal::MAX;

        let result = cart.add_item(request, Utc::now());

        assert!(matches!(result, Err(ServiceError::AmountOutOfRange)));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_merge_and_update_past_decimal_range_leave_cart_unchanged() {
        let mut cart = Cart::new();
        let mut request = add_request("P1", "S1", 1);
        request.price_per_unit = Decimal::MAX;
        let id = cart.add_item(request.clone(), Utc::now()).unwrap().id.clone();
        let before = cart.clone();

        assert!(matches!(
            cart.add_item(request, Utc::now()),
            Err(ServiceError::AmountOutOfRange)
        ));
        assert!(matches!(
            cart.update_item_quantity(&id, 3),
            Err(ServiceError::AmountOutOfRange)
        ));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_subtotal_past_decimal_range_is_rejected() {
        let mut cart = Cart::new();
        let mut first = add_request("P1", "S1", 1);
        first.price_per_unit = dec!(50000000000000000000000000000);
        let mut second = add_request("P2", "S1", 1);
        second.price_per_unit = dec!(50000000000000000000000000000);

        cart.add_item(first, Utc::now()).unwrap();
        let before = cart.clone();

        assert!(matches!(
            cart.add_item(second, Utc::now()),
            Err(ServiceError::AmountOutOfRange)
        ));
        assert_eq!(cart, before);
        assert!(cart.summary().is_ok());
    }

    #[test]
    fn test_summary_of_out_of_range_lines_fails() {
        let mut line = CartLineItem::from_request(add_request("P1", "S1", 1), "a".to_string())
            .unwrap();
        line.total_price = Decimal::MAX;
        let mut other = line.clone();
        other.id = "b".to_string();

        let cart = Cart::from(vec![line, other]);

        assert_eq!(cart.subtotal(), None);
        assert!(matches!(cart.summary(), Err(ServiceError::AmountOutOfRange)));
    }

    #[test]
    fn test_line_ids_stay_unique_when_parts_contain_separator() {
        let mut cart = Cart::new();
        let added_at = Utc::now();

        let first = cart
            .add_item(add_request("a_b", "c", 1), added_at)
            .unwrap()
            .id
            .clone();
        let second = cart
            .add_item(add_request("a", "b_c", 1), added_at)
            .unwrap()
            .id
            .clone();

        assert_ne!(first, second);

        cart.update_item_quantity(&first, 5).unwrap();
        assert_eq!(cart.find_line("a_b", "c").unwrap().quantity, 5);
        assert_eq!(cart.find_line("a", "b_c").unwrap().quantity, 1);

        assert!(cart.remove_item(&second));
        assert!(cart.find_line("a_b", "c").is_some());
    }

    #[test]
    fn test_serializes_as_camel_case_array() {
        let mut cart = Cart::new();
        cart.add_item(add_request("P1", "S1", 2), Utc::now()).unwrap();

        let json = serde_json::to_value(&cart).unwrap();
        let first = &json.as_array().unwrap()[0];
        assert_eq!(first["productId"], "P1");
        assert_eq!(first["deliveryMode"], "delivery");
        assert!(first.get("image").is_none());

        let decoded: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, cart);
    }

    #[test]
    fn test_delivery_mode_from_str() {
        assert_eq!("Pickup".parse::<DeliveryMode>(), Ok(DeliveryMode::Pickup));
        assert!("drone".parse::<DeliveryMode>().is_err());
    }
}
