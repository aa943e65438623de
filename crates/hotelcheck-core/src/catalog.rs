use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// A hotel and the parameters its reviews are checked against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hotel {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Feature tags in display order; the order is part of the parameter text.
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub hotel_id: String,
    pub text: String,
    /// Seed label for sample data. Never consulted during analysis.
    #[serde(default)]
    pub is_anomalous: bool,
}

/// On-disk catalog shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    pub hotels: Vec<Hotel>,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

/// Immutable set of hotels and their reviews, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Catalog {
    hotels: Vec<Hotel>,
    reviews: Vec<Review>,
}

impl Catalog {
    /// Build a catalog from a parsed file after validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if ids collide, required text is
    /// blank, or a review points at an unknown hotel.
    pub fn from_file(file: CatalogFile) -> Result<Self, ConfigError> {
        validate_catalog(&file)?;
        Ok(Self {
            hotels: file.hotels,
            reviews: file.reviews,
        })
    }

    #[must_use]
    pub fn hotels(&self) -> &[Hotel] {
        &self.hotels
    }

    #[must_use]
    pub fn hotel(&self, id: &str) -> Option<&Hotel> {
        self.hotels.iter().find(|h| h.id == id)
    }

    /// Reviews belonging to `hotel_id`, in stored order.
    #[must_use]
    pub fn reviews_for(&self, hotel_id: &str) -> Vec<&Review> {
        self.reviews
            .iter()
            .filter(|r| r.hotel_id == hotel_id)
            .collect()
    }

    /// The three sample hotels with three consistent reviews each, followed
    /// by one seeded review that does not match the hotel.
    #[must_use]
    pub fn sample() -> Self {
        let hotel = |id: &str, name: &str, description: &str, features: &[&str]| Hotel {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            features: features.iter().map(|f| (*f).to_string()).collect(),
        };
        let review = |id: &str, hotel_id: &str, text: &str, is_anomalous: bool| Review {
            id: id.to_string(),
            hotel_id: hotel_id.to_string(),
            text: text.to_string(),
            is_anomalous,
        };

        let hotels = vec![
            hotel(
                "hotel_1",
                "Grand Hotel Moscow",
                "A luxurious five-star hotel in the center of Moscow overlooking the Kremlin. \
                 Spacious rooms with premium furniture, a fine-dining restaurant, a spa and a pool.",
                &["5 stars", "Pool", "Spa", "Restaurant", "Kremlin view", "City center"],
            ),
            hotel(
                "hotel_2",
                "Economy Hostel Petersburg",
                "A budget hostel with shared dorms close to the metro. \
                 Basic amenities, a shared kitchen, Wi-Fi.",
                &["Budget", "Shared rooms", "Near metro", "Wi-Fi", "Shared kitchen"],
            ),
            hotel(
                "hotel_3",
                "Business Hotel City",
                "A comfortable three-star hotel for business travellers. \
                 Conference rooms, fast Wi-Fi, breakfast included.",
                &["3 stars", "Business", "Conference rooms", "Breakfast included", "Fast Wi-Fi"],
            ),
        ];

        let reviews = vec![
            review(
                "hotel_1-r1",
                "hotel_1",
                "Amazing hotel! Gorgeous rooms and a magnificent view of the Kremlin. The staff \
                 are very attentive. The restaurant is top notch and the spa treatments are superb.",
                false,
            ),
            review(
                "hotel_1-r2",
                "hotel_1",
                "A luxury hotel in a great location. The pool is clean and the spa is wonderful. \
                 Rooms are spacious and lavish. Fully lives up to its five stars.",
                false,
            ),
            review(
                "hotel_1-r3",
                "hotel_1",
                "A wonderful place to stay! Everything is first class, from the rooms to the \
                 service. The view from the window is stunning and the breakfasts are excellent.",
                false,
            ),
            review(
                "hotel_1-a1",
                "hotel_1",
                "Very cheap but noisy. The shared rooms are not very clean. Fine as a budget option.",
                true,
            ),
            review(
                "hotel_2-r1",
                "hotel_2",
                "An inexpensive hostel with basic amenities. Clean, but very noisy in the shared \
                 rooms. The metro is close by, which is convenient. Fine for the money.",
                false,
            ),
            review(
                "hotel_2-r2",
                "hotel_2",
                "A budget option for a night. Comfortable beds and there is a kitchen. The internet \
                 works well. Don't expect luxury, but it suits thrifty travellers.",
                false,
            ),
            review(
                "hotel_2-r3",
                "hotel_2",
                "A simple hostel, everything is minimal. Clean, with Wi-Fi and a shared kitchen. \
                 Good location near the metro. The price matches the quality.",
                false,
            ),
            review(
                "hotel_2-a1",
                "hotel_2",
                "Luxurious apartments, a spotless pool and impeccable staff. A magnificent spa!",
                true,
            ),
            review(
                "hotel_3-r1",
                "hotel_3",
                "A great hotel for a business trip. Good internet and somewhere to hold a meeting. \
                 Breakfast is included and the rooms are clean and comfortable.",
                false,
            ),
            review(
                "hotel_3-r2",
                "hotel_3",
                "Convenient for business travel. The conference rooms have everything you need. \
                 Professional staff and fast Wi-Fi. Recommended for business.",
                false,
            ),
            review(
                "hotel_3-r3",
                "hotel_3",
                "A comfortable hotel for work. Quiet rooms with a desk. Good breakfasts and stable \
                 internet. Ideal for business purposes.",
                false,
            ),
            review(
                "hotel_3-a1",
                "hotel_3",
                "The beach holiday was a success! The sea is close, the sand is clean, and there \
                 are cocktails by the pool all day.",
                true,
            ),
        ];

        Self { hotels, reviews }
    }
}

/// Load and validate a hotel catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_catalog(path: &Path) -> Result<Catalog, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: CatalogFile = serde_yaml::from_str(&content)?;
    Catalog::from_file(file)
}

fn validate_catalog(file: &CatalogFile) -> Result<(), ConfigError> {
    let mut hotel_ids = HashSet::new();

    for hotel in &file.hotels {
        if hotel.id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "hotel id must be non-empty".to_string(),
            ));
        }
        if hotel.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "hotel '{}' has an empty name",
                hotel.id
            )));
        }
        if !hotel_ids.insert(hotel.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate hotel id: '{}'",
                hotel.id
            )));
        }
    }

    let mut review_ids = HashSet::new();
    for review in &file.reviews {
        if !hotel_ids.contains(review.hotel_id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "review '{}' references unknown hotel '{}'",
                review.id, review.hotel_id
            )));
        }
        if review.text.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "review '{}' has empty text",
                review.id
            )));
        }
        if !review_ids.insert(review.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate review id: '{}'",
                review.id
            )));
        }
    }

    Ok(())
}
