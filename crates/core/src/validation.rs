//! Client-side form validation.
//!
//! Forms hold raw text as typed by the user. `validate()` either produces the
//! patch to send or a [`ValidationErrors`] listing every offending field, so
//! the caller can show each message next to its field before any request is
//! made.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::entity::{Account, AccountPatch, Address, AddressPatch, Food, FoodPatch, Shop, ShopPatch};
use crate::types::{AccountStatus, Money, ShopStatus};

/// Minimum length of a shop phone number.
pub const MIN_PHONE_LENGTH: usize = 10;

/// One invalid field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field name as used by the form (`price`, `address.city`, ...).
    pub field: &'static str,
    /// Message to show next to the field.
    pub message: String,
}

/// All invalid fields of a form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "invalid input: {joined}")
    }
}

impl ValidationErrors {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }

    /// Message for `field`, if it failed.
    #[must_use]
    pub fn for_field(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// Every failed field, in form order.
    #[must_use]
    pub fn fields(&self) -> &[FieldError] {
        &self.errors
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

fn required(errors: &mut ValidationErrors, field: &'static str, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(field, "is required");
    }
    trimmed.to_owned()
}

/// A blank field clears the stored image, so it is sent as an empty string.
fn optional_url(errors: &mut ValidationErrors, field: &'static str, value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(String::new());
    }
    match url::Url::parse(trimmed) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Some(trimmed.to_owned()),
        _ => {
            errors.push(field, "must be a valid http(s) URL");
            None
        }
    }
}

fn number(errors: &mut ValidationErrors, field: &'static str, value: &str) -> Option<Decimal> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(field, "is required");
        return None;
    }
    if let Ok(n) = Decimal::from_str(trimmed) {
        Some(n)
    } else {
        errors.push(field, "must be a number");
        None
    }
}

/// Add/edit form of a menu item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoodForm {
    pub name: String,
    pub description: String,
    pub price: String,
    pub discount: String,
    pub image_url: String,
    pub is_available: bool,
}

impl Default for FoodForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            price: "0".to_owned(),
            discount: "0".to_owned(),
            image_url: String::new(),
            is_available: true,
        }
    }
}

impl FoodForm {
    /// Prefill the form from an existing item.
    #[must_use]
    pub fn from_food(food: &Food) -> Self {
        Self {
            name: food.name.clone(),
            description: food.description.clone(),
            price: food.price.amount().to_string(),
            discount: food.discount.to_string(),
            image_url: food.image_url.clone().unwrap_or_default(),
            is_available: food.is_available,
        }
    }

    /// Check the form and build the update body.
    ///
    /// Rules: name and description required, price strictly positive,
    /// discount within 0-100, image URL well-formed when present.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<FoodPatch, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let name = required(&mut errors, "name", &self.name);
        let description = required(&mut errors, "description", &self.description);

        let price = number(&mut errors, "price", &self.price).map(Money::new);
        if price.is_some_and(|p| !p.is_positive()) {
            errors.push("price", "must be greater than 0");
        }

        let discount = number(&mut errors, "discount", &self.discount);
        if discount.is_some_and(|d| d < Decimal::ZERO || d > Decimal::ONE_HUNDRED) {
            errors.push("discount", "must be between 0 and 100");
        }

        let image_url = optional_url(&mut errors, "image_url", &self.image_url);

        errors.into_result(FoodPatch {
            name: Some(name),
            description: Some(description),
            price,
            discount,
            image_url,
            is_available: Some(self.is_available),
        })
    }
}

/// Edit form of a shop, used by both the admin list and the owner profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShopForm {
    pub name: String,
    pub description: String,
    pub phone: String,
    pub address: Address,
    pub img: String,
    /// Only the admin form edits the status.
    pub status: Option<ShopStatus>,
}

impl ShopForm {
    /// Prefill the form from a shop; `with_status` enables the status field.
    #[must_use]
    pub fn from_shop(shop: &Shop, with_status: bool) -> Self {
        Self {
            name: shop.name.clone(),
            description: shop.description.clone(),
            phone: shop.phone.clone(),
            address: shop.address.clone(),
            img: shop.img.clone(),
            status: with_status.then_some(shop.status),
        }
    }

    /// Check the form and build the update body.
    ///
    /// Rules: name, description, street, ward, district and city required;
    /// phone at least ten characters; image URL well-formed when present.
    /// The province is optional.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<ShopPatch, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let name = required(&mut errors, "name", &self.name);
        let description = required(&mut errors, "description", &self.description);

        let phone = self.phone.trim().to_owned();
        if phone.chars().count() < MIN_PHONE_LENGTH {
            errors.push("phone", format!("must be at least {MIN_PHONE_LENGTH} characters"));
        }

        let address = Address {
            street: required(&mut errors, "address.street", &self.address.street),
            ward: required(&mut errors, "address.ward", &self.address.ward),
            district: required(&mut errors, "address.district", &self.address.district),
            city: required(&mut errors, "address.city", &self.address.city),
            province: self.address.province.trim().to_owned(),
        };

        let img = optional_url(&mut errors, "img", &self.img);

        errors.into_result(ShopPatch {
            name: Some(name),
            description: Some(description),
            address: Some(AddressPatch::full(&address)),
            phone: Some(phone),
            status: self.status,
            img,
        })
    }
}

/// Edit form of an account (admin).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountForm {
    pub full_name: String,
    pub status: AccountStatus,
}

impl AccountForm {
    /// Prefill the form from an account.
    #[must_use]
    pub fn from_account(account: &Account) -> Self {
        Self {
            full_name: account.full_name().unwrap_or_default().to_owned(),
            status: account.status,
        }
    }

    /// Only the fields that differ from `original`.
    ///
    /// An empty patch means there is nothing to send.
    #[must_use]
    pub fn diff(&self, original: &Account) -> AccountPatch {
        let full_name = self.full_name.trim();
        AccountPatch {
            full_name: (full_name != original.full_name().unwrap_or_default())
                .then(|| full_name.to_owned()),
            status: (self.status != original.status).then_some(self.status),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_food() -> FoodForm {
        FoodForm {
            name: "Com tam".to_owned(),
            description: "Broken rice with pork chop".to_owned(),
            price: "35000".to_owned(),
            discount: "5".to_owned(),
            image_url: "https://img.example.com/comtam.jpg".to_owned(),
            is_available: true,
        }
    }

    #[test]
    fn test_valid_food_form() {
        let patch = valid_food().validate().unwrap();
        assert_eq!(patch.price, Some(Money::from_dong(35_000)));
        assert_eq!(patch.discount, Some(Decimal::from(5)));
        assert_eq!(patch.is_available, Some(true));
    }

    #[test]
    fn test_food_price_must_be_positive() {
        for price in ["0", "-1000"] {
            let form = FoodForm {
                price: price.to_owned(),
                ..valid_food()
            };
            let errors = form.validate().unwrap_err();
            assert_eq!(errors.for_field("price"), Some("must be greater than 0"));
        }

        let form = FoodForm {
            price: "abc".to_owned(),
            ..valid_food()
        };
        assert_eq!(form.validate().unwrap_err().for_field("price"), Some("must be a number"));
    }

    #[test]
    fn test_food_collects_every_error() {
        let form = FoodForm {
            name: " ".to_owned(),
            description: String::new(),
            discount: "150".to_owned(),
            image_url: "not a url".to_owned(),
            ..valid_food()
        };
        let errors = form.validate().unwrap_err();
        let fields: Vec<_> = errors.fields().iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["name", "description", "discount", "image_url"]);
        assert!(errors.to_string().starts_with("invalid input: name: is required"));
    }

    #[test]
    fn test_blank_image_url_clears_the_image() {
        let form = FoodForm {
            image_url: "  ".to_owned(),
            ..valid_food()
        };
        let patch = form.validate().unwrap();
        assert_eq!(patch.image_url.as_deref(), Some(""));
        assert_eq!(serde_json::to_value(&patch).unwrap()["image_url"], "");

        let patch = valid_shop().validate().unwrap();
        assert_eq!(patch.img.as_deref(), Some(""));
    }

    fn valid_shop() -> ShopForm {
        ShopForm {
            name: "Pho Thin".to_owned(),
            description: "Beef noodle soup".to_owned(),
            phone: "0243821234".to_owned(),
            address: Address {
                street: "13 Lo Duc".to_owned(),
                ward: "Ngo Thi Nham".to_owned(),
                district: "Hai Ba Trung".to_owned(),
                city: "Ha Noi".to_owned(),
                province: String::new(),
            },
            img: String::new(),
            status: None,
        }
    }

    #[test]
    fn test_shop_form_rules() {
        assert!(valid_shop().validate().is_ok());

        let mut form = valid_shop();
        form.phone = "0901".to_owned();
        form.address.city = String::new();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.for_field("phone"), Some("must be at least 10 characters"));
        assert_eq!(errors.for_field("address.city"), Some("is required"));
        assert_eq!(errors.for_field("address.province"), None);
    }

    #[test]
    fn test_shop_form_status_only_when_enabled() {
        let patch = valid_shop().validate().unwrap();
        assert_eq!(patch.status, None);

        let form = ShopForm {
            status: Some(ShopStatus::Inactive),
            ..valid_shop()
        };
        assert_eq!(form.validate().unwrap().status, Some(ShopStatus::Inactive));
    }

    #[test]
    fn test_account_diff_sends_only_changes() {
        let account: Account = serde_json::from_value(serde_json::json!({
            "_id": "a1",
            "email": "lan@example.com",
            "status": "ACTIVE",
            "user": {"full_name": "Lan"}
        }))
        .unwrap();

        let unchanged = AccountForm::from_account(&account);
        assert!(unchanged.diff(&account).is_empty());

        let renamed = AccountForm {
            full_name: "Nguyen Lan".to_owned(),
            ..unchanged.clone()
        };
        assert_eq!(
            renamed.diff(&account),
            AccountPatch {
                full_name: Some("Nguyen Lan".to_owned()),
                status: None
            }
        );

        let suspended = AccountForm {
            status: AccountStatus::Pending,
            ..unchanged
        };
        assert_eq!(suspended.diff(&account), AccountPatch::status(AccountStatus::Pending));
    }
}
