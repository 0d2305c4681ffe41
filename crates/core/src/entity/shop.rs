//! Shops (restaurants) on the marketplace.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Resource;
use crate::types::{ShopId, ShopStatus, UserId};

/// A shop record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shop {
    #[serde(rename = "_id")]
    pub id: ShopId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub img: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub owner: Option<ShopOwner>,
    pub status: ShopStatus,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Postal address of a shop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub ward: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub province: String,
}

impl fmt::Display for Address {
    /// Non-empty parts joined with `", "`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = [
            &self.street,
            &self.ward,
            &self.district,
            &self.city,
            &self.province,
        ];
        let mut first = true;
        for part in parts.into_iter().filter(|p| !p.trim().is_empty()) {
            if !first {
                f.write_str(", ")?;
            }
            f.write_str(part.trim())?;
            first = false;
        }
        Ok(())
    }
}

/// Populated owner reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopOwner {
    #[serde(rename = "_id", default)]
    pub id: Option<UserId>,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Partial address; each part is independently editable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddressPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ward: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
}

impl AddressPatch {
    /// A patch that sets every part of `address`.
    #[must_use]
    pub fn full(address: &Address) -> Self {
        Self {
            street: Some(address.street.clone()),
            ward: Some(address.ward.clone()),
            district: Some(address.district.clone()),
            city: Some(address.city.clone()),
            province: Some(address.province.clone()),
        }
    }

    fn apply(&self, address: &mut Address) {
        let fields = [
            (&self.street, &mut address.street),
            (&self.ward, &mut address.ward),
            (&self.district, &mut address.district),
            (&self.city, &mut address.city),
            (&self.province, &mut address.province),
        ];
        for (patch, target) in fields {
            if let Some(value) = patch {
                target.clone_from(value);
            }
        }
    }
}

/// Body of `PUT /admin/updateShop/{id}` and `PUT /owner/{ownerId}/shop`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShopPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<AddressPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ShopStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
}

impl ShopPatch {
    /// A patch that only changes the status.
    #[must_use]
    pub fn status(status: ShopStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

impl Resource for Shop {
    type Id = ShopId;
    type Patch = ShopPatch;

    const KIND: &'static str = "shop";

    fn id(&self) -> &ShopId {
        &self.id
    }

    fn apply_patch(&mut self, patch: &ShopPatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        if let Some(address) = &patch.address {
            address.apply(&mut self.address);
        }
        if let Some(phone) = &patch.phone {
            self.phone.clone_from(phone);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(img) = &patch.img {
            self.img.clone_from(img);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Shop {
        serde_json::from_value(serde_json::json!({
            "_id": "s1",
            "name": "Pho Thin",
            "description": "Beef noodle soup",
            "address": {
                "street": "13 Lo Duc",
                "ward": "Ngo Thi Nham",
                "district": "Hai Ba Trung",
                "city": "Ha Noi",
                "province": ""
            },
            "phone": "0243821234",
            "img": "https://img.example.com/pho.jpg",
            "rating": 4.6,
            "owner": {"_id": "u9", "full_name": "Thin"},
            "status": "ACTIVE"
        }))
        .unwrap()
    }

    #[test]
    fn test_address_display_skips_empty_parts() {
        let shop = sample();
        assert_eq!(
            shop.address.to_string(),
            "13 Lo Duc, Ngo Thi Nham, Hai Ba Trung, Ha Noi"
        );
        assert_eq!(Address::default().to_string(), "");
    }

    #[test]
    fn test_address_parts_patch_independently() {
        let mut shop = sample();
        shop.apply_patch(&ShopPatch {
            address: Some(AddressPatch {
                ward: Some("Pham Dinh Ho".to_owned()),
                ..AddressPatch::default()
            }),
            ..ShopPatch::default()
        });
        assert_eq!(shop.address.ward, "Pham Dinh Ho");
        assert_eq!(shop.address.street, "13 Lo Duc");
        assert_eq!(shop.name, "Pho Thin");
    }

    #[test]
    fn test_status_patch_serializes_alone() {
        let json = serde_json::to_value(ShopPatch::status(ShopStatus::Inactive)).unwrap();
        assert_eq!(json, serde_json::json!({"status": "INACTIVE"}));
    }
}
