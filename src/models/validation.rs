use rust_decimal::Decimal;

use super::{AddCartItemRequest, ValidationError, ValidationResult};

/// Trait for validating input models
pub trait Validate {
    fn validate(&self) -> ValidationResult<()>;
}

/// Validation constants
pub const MAX_ID_LENGTH: usize = 128;
pub const MAX_NAME_LENGTH: usize = 200;
pub const MIN_CART_QUANTITY: u32 = 1;

impl Validate for AddCartItemRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_identifier("productId", &self.product_id)?;
        validate_identifier("sellerId", &self.seller_id)?;
        validate_name("productName", &self.product_name)?;
        validate_cart_quantity(self.quantity)?;
        validate_price_per_unit(&self.price_per_unit)?;
        validate_max_quantity(self.quantity, self.max_quantity)?;
        Ok(())
    }
}

/// Validate an identifier such as a product, seller or owner id
pub fn validate_identifier(field: &str, value: &str) -> ValidationResult<()> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::RequiredField {
            field: field.to_string(),
        });
    }

    if trimmed.len() > MAX_ID_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max_length: MAX_ID_LENGTH,
            actual_length: trimmed.len(),
        });
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "Contains control characters".to_string(),
        });
    }

    Ok(())
}

/// Validate a display name
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().len() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max_length: MAX_NAME_LENGTH,
            actual_length: value.trim().len(),
        });
    }
    Ok(())
}

/// Quantity on an add must be positive
pub fn validate_cart_quantity(quantity: u32) -> ValidationResult<()> {
    if quantity < MIN_CART_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: MIN_CART_QUANTITY.to_string(),
            max: u32::MAX.to_string(),
            value: quantity.to_string(),
        });
    }
    Ok(())
}

/// Unit price may be zero but never negative
pub fn validate_price_per_unit(price: &Decimal) -> ValidationResult<()> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ValidationError::InvalidValue {
            field: "pricePerUnit".to_string(),
            value: price.to_string(),
            reason: "Price cannot be negative".to_string(),
        });
    }
    Ok(())
}

/// The line bound must admit the requested quantity
pub fn validate_max_quantity(quantity: u32, max_quantity: u32) -> ValidationResult<()> {
    if max_quantity < quantity {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: MIN_CART_QUANTITY.to_string(),
            max: max_quantity.to_string(),
            value: quantity.to_string(),
        });
    }
    Ok(())
}
