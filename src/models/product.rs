use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;

use crate::FarmhubError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub image: String,
}

/// Identifiers arrive either as strings or as plain numbers
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawProductId {
    Text(String),
    Number(u64),
}

/// A product as handed over by the view layer or an API payload, before
/// it's been checked.
///
/// Both `id` and `productId` are accepted, `id` wins when both are set
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    #[serde(default, alias = "_id")]
    pub id: Option<RawProductId>,
    #[serde(default)]
    pub product_id: Option<RawProductId>,
    #[serde(default, alias = "title", alias = "productName")]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default, alias = "img")]
    pub image: Option<String>,
}

impl RawProductId {
    fn is_usable(&self) -> bool {
        match self {
            Self::Text(id) => !id.trim().is_empty(),
            Self::Number(_) => true,
        }
    }
}

impl Product {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        price: f64,
        image: impl Into<String>,
    ) -> Self {
        Self {
            id: ProductId::new(id),
            name: name.into(),
            description: description.into(),
            price,
            image: image.into(),
        }
    }
}

impl TryFrom<ProductInput> for Product {
    type Error = FarmhubError;

    fn try_from(input: ProductInput) -> Result<Self, Self::Error> {
        let fallback = input.product_id.filter(RawProductId::is_usable);
        let id = match input.id.filter(RawProductId::is_usable).or(fallback) {
            Some(RawProductId::Text(id)) => ProductId::new(id.trim()),
            Some(RawProductId::Number(id)) => ProductId::new(id.to_string()),
            None => {
                return Err(FarmhubError::MalformedProduct(
                    "product has no identifier".to_string(),
                ))
            }
        };

        let name = match input.name {
            Some(name) if !name.trim().is_empty() => name.trim().to_owned(),
            _ => {
                return Err(FarmhubError::MalformedProduct(format!(
                    "product {} has no name",
                    id
                )))
            }
        };

        let price = match input.price {
            Some(price) if price.is_finite() && price >= 0.0 => price,
            Some(price) => {
                return Err(FarmhubError::MalformedProduct(format!(
                    "{} has an invalid price: {}",
                    name, price
                )))
            }
            None => {
                return Err(FarmhubError::MalformedProduct(format!(
                    "{} has no price",
                    name
                )))
            }
        };

        Ok(Self {
            id,
            name,
            description: input.description.unwrap_or_default(),
            price,
            image: input.image.unwrap_or_default(),
        })
    }
}

lazy_static! {
    static ref CATALOG: Vec<Product> = vec![
        Product::new(
            "soil-sensor-01",
            "Smart Soil Sensor",
            "Measures moisture, temperature and NPK levels every 15 minutes.",
            49.99,
            "/images/products/smart-soil-sensor.jpg",
        ),
        Product::new(
            "weather-station-02",
            "Weather Station Pro",
            "Solar powered station reporting rainfall, wind and humidity.",
            199.99,
            "/images/products/weather-station-pro.jpg",
        ),
        Product::new(
            "irrigation-ctl-03",
            "Automated Irrigation Controller",
            "Eight zone valve controller driven by soil moisture readings.",
            129.99,
            "/images/products/irrigation-controller.jpg",
        ),
        Product::new(
            "livestock-gps-04",
            "Livestock GPS Tracker",
            "Collar tracker with geofencing and a two year battery.",
            79.99,
            "/images/products/livestock-gps-tracker.jpg",
        ),
        Product::new(
            "greenhouse-mon-05",
            "Greenhouse Climate Monitor",
            "CO2, light and humidity monitoring for enclosed growing.",
            149.99,
            "/images/products/greenhouse-monitor.jpg",
        ),
        Product::new(
            "crop-drone-06",
            "Drone Crop Scanner",
            "Multispectral imaging drone for field health maps.",
            899.0,
            "/images/products/drone-crop-scanner.jpg",
        ),
    ];
}

/// The static product catalog shown on the listing page
pub fn catalog() -> &'static [Product] {
    CATALOG.as_slice()
}

/// Product detail pages are addressed by title, matched case-insensitively
pub fn find_by_title(title: &str) -> Option<&'static Product> {
    let title = title.trim();
    CATALOG.iter().find(|p| p.name.eq_ignore_ascii_case(title))
}
