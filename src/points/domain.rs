// Domain types - pure, no storage side effects
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::geo::{parse_location_url, web_link, Coordinates};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointError {
    #[error("Add at least one image")]
    MissingImage,

    #[error("Add a location")]
    MissingLocation,

    #[error("Paste a maps link starting with http:// or https://")]
    InvalidLocationUrl,

    #[error("Specify the product type")]
    MissingProductLabel,

    #[error("Unknown product type: {0}")]
    UnknownProductType(String),

    #[error("Unknown status: {0}")]
    UnknownStatus(String),

    #[error("Cannot {action} a point that is {from}")]
    InvalidTransition {
        from: PointStatus,
        action: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointStatus {
    Active,
    Sold,
}

impl PointStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointStatus::Active => "active",
            PointStatus::Sold => "sold",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PointStatus::Active => "Available",
            PointStatus::Sold => "Sold",
        }
    }
}

impl fmt::Display for PointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PointStatus {
    type Err = PointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(PointStatus::Active),
            "sold" => Ok(PointStatus::Sold),
            other => Err(PointError::UnknownStatus(other.to_string())),
        }
    }
}

/// The product placed at a point. `Other` carries a free-text label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    Half,
    Single,
    Other,
}

impl ProductKind {
    pub const ALL: [ProductKind; 3] = [ProductKind::Half, ProductKind::Single, ProductKind::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductKind::Half => "half",
            ProductKind::Single => "single",
            ProductKind::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProductKind::Half => "Half",
            ProductKind::Single => "Single",
            ProductKind::Other => "Other",
        }
    }
}

impl FromStr for ProductKind {
    type Err = PointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "half" => Ok(ProductKind::Half),
            "single" => Ok(ProductKind::Single),
            "other" => Ok(ProductKind::Other),
            other => Err(PointError::UnknownProductType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionPoint {
    pub id: String,
    pub product_type: ProductKind,
    pub product_value: Option<String>,
    pub images: Vec<String>,
    pub image_url: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_url: String,
    pub status: PointStatus,
    pub created_by: String,
    pub sold_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sold_at: Option<DateTime<Utc>>,
}

impl DistributionPoint {
    /// Name shown on cards and used by search.
    pub fn display_name(&self) -> String {
        match self.product_type {
            ProductKind::Other => self
                .product_value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or("Unspecified")
                .to_string(),
            kind => kind.label().to_string(),
        }
    }

    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty() || self.display_name().to_lowercase().contains(&query)
    }

    pub fn is_sold(&self) -> bool {
        self.status == PointStatus::Sold
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.latitude, self.longitude)
    }

    /// Images in display order; older rows may only carry `image_url`.
    pub fn gallery(&self) -> Vec<String> {
        if self.images.is_empty() {
            vec![self.image_url.clone()]
        } else {
            self.images.clone()
        }
    }

    pub fn extra_image_count(&self) -> usize {
        self.gallery().len().saturating_sub(1)
    }

    /// Link for "view on map": the stored link, else one built from coordinates.
    pub fn map_url(&self) -> Option<String> {
        if !self.location_url.trim().is_empty() {
            return Some(self.location_url.clone());
        }
        self.coordinates().map(|c| c.maps_url())
    }

    pub fn directions_url(&self) -> Option<String> {
        self.coordinates().map(|c| c.directions_url())
    }

    /// Pre-filled messaging link carrying the product name and location.
    pub fn share_url(&self) -> String {
        let text = format!("{}\n{}", self.display_name(), self.location_url);
        let encoded: String = url::form_urlencoded::byte_serialize(text.trim().as_bytes()).collect();
        format!("https://wa.me/?text={}", encoded.replace('+', "%20"))
    }

    pub fn created_at_display(&self) -> String {
        format_local(self.created_at)
    }

    pub fn sold_at_display(&self) -> String {
        self.sold_at.map(format_local).unwrap_or_default()
    }

    /// `active -> sold`, stamping who sold it and when.
    pub fn sell(mut self, sold_by: &str, at: DateTime<Utc>) -> Result<Self, PointError> {
        if self.status != PointStatus::Active {
            return Err(PointError::InvalidTransition {
                from: self.status,
                action: "sell",
            });
        }
        self.status = PointStatus::Sold;
        self.sold_by = Some(sold_by.to_string());
        self.sold_at = Some(at);
        Ok(self)
    }

    /// `sold -> active`, clearing the sale stamps.
    pub fn revert_sale(mut self) -> Result<Self, PointError> {
        if self.status != PointStatus::Sold {
            return Err(PointError::InvalidTransition {
                from: self.status,
                action: "undo the sale of",
            });
        }
        self.status = PointStatus::Active;
        self.sold_by = None;
        self.sold_at = None;
        Ok(self)
    }
}

pub fn format_local(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// Where the location of a new point comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationInput {
    /// The device's geolocation fix, if the browser produced one.
    Current(Option<Coordinates>),
    /// A pasted maps link.
    Manual(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub url: String,
    pub coordinates: Option<Coordinates>,
}

impl LocationInput {
    pub fn resolve(&self) -> Result<ResolvedLocation, PointError> {
        match self {
            LocationInput::Current(Some(c)) => Ok(ResolvedLocation {
                url: c.maps_url(),
                coordinates: Some(*c),
            }),
            LocationInput::Current(None) => Err(PointError::MissingLocation),
            LocationInput::Manual(url) => {
                let url = url.trim();
                if url.is_empty() {
                    return Err(PointError::MissingLocation);
                }
                if web_link(url).is_none() {
                    return Err(PointError::InvalidLocationUrl);
                }
                Ok(ResolvedLocation {
                    url: url.to_string(),
                    coordinates: parse_location_url(url).coordinates(),
                })
            }
        }
    }
}

/// Everything the create form collected, before any upload happens.
#[derive(Debug, Clone)]
pub struct PointDraft {
    pub product_type: ProductKind,
    pub product_value: String,
    pub location: LocationInput,
    pub image_count: usize,
}

/// A draft that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidDraft {
    pub product_type: ProductKind,
    pub product_value: Option<String>,
    pub location: ResolvedLocation,
}

impl PointDraft {
    /// Checks run in the order the form reports them: images, location, label.
    pub fn validate(&self) -> Result<ValidDraft, PointError> {
        if self.image_count == 0 {
            return Err(PointError::MissingImage);
        }
        let location = self.location.resolve()?;

        let product_value = match self.product_type {
            ProductKind::Other => {
                let label = self.product_value.trim();
                if label.is_empty() {
                    return Err(PointError::MissingProductLabel);
                }
                Some(label.to_string())
            }
            _ => None,
        };

        Ok(ValidDraft {
            product_type: self.product_type,
            product_value,
            location,
        })
    }
}

/// A validated point ready to insert, with its uploaded image URLs.
#[derive(Debug, Clone)]
pub struct NewPoint {
    pub product_type: ProductKind,
    pub product_value: Option<String>,
    pub location: ResolvedLocation,
    pub images: Vec<String>,
    pub created_by: String,
}

impl NewPoint {
    pub fn from_draft(draft: ValidDraft, images: Vec<String>, created_by: &str) -> Self {
        Self {
            product_type: draft.product_type,
            product_value: draft.product_value,
            location: draft.location,
            images,
            created_by: created_by.to_string(),
        }
    }
}
