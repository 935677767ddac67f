//! Customers per city with coordinates.

use std::collections::HashMap;
use std::time::Duration;

use futures::StreamExt;
use futures::stream;
use shopmetrics_core::CustomerRecord;

use super::CityPoint;
use crate::config::GeocoderConfig;
use crate::geocode::{Coordinates, GeocodeError, Geocoder};

/// How coordinate lookups are run for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeocodeSettings {
    /// Upper bound for one city; a slower lookup counts as failed.
    pub timeout: Duration,
    /// Maximum lookups in flight.
    pub concurrency: usize,
}

impl Default for GeocodeSettings {
    fn default() -> Self {
        Self::from(&GeocoderConfig::default())
    }
}

impl From<&GeocoderConfig> for GeocodeSettings {
    fn from(config: &GeocoderConfig) -> Self {
        Self {
            timeout: config.timeout,
            concurrency: config.concurrency.max(1),
        }
    }
}

/// Customer count per `default_address.city`, largest first.
///
/// Customers without a city form their own `None` group. Equal counts are
/// ordered by name so repeated calls agree.
#[must_use]
pub fn count_by_city(customers: &[CustomerRecord]) -> Vec<(Option<String>, u64)> {
    let mut counts: HashMap<Option<&str>, u64> = HashMap::new();
    for customer in customers {
        *counts.entry(customer.city()).or_default() += 1;
    }

    let mut cities: Vec<(Option<String>, u64)> = counts
        .into_iter()
        .map(|(city, count)| (city.map(str::to_string), count))
        .collect();
    cities.sort_by(|(a_name, a_count), (b_name, b_count)| {
        b_count.cmp(a_count).then_with(|| a_name.cmp(b_name))
    });
    cities
}

/// Attach coordinates to each city, keeping the input order.
///
/// Lookups run concurrently up to `settings.concurrency`. Any failure,
/// including a timeout, gives that city [`Coordinates::ZERO`] and is logged;
/// the other cities are unaffected. A missing city name is not looked up.
pub async fn enrich(
    cities: Vec<(Option<String>, u64)>,
    geocoder: &dyn Geocoder,
    settings: &GeocodeSettings,
) -> Vec<CityPoint> {
    stream::iter(cities)
        .map(|(name, customer_count)| async move {
            let coords = match name.as_deref() {
                Some(city) => locate(geocoder, city, settings.timeout).await,
                None => Coordinates::ZERO,
            };
            CityPoint {
                name,
                customer_count,
                lat: coords.lat,
                lng: coords.lng,
            }
        })
        .buffered(settings.concurrency.max(1))
        .collect()
        .await
}

/// Resolve one city, falling back to zero coordinates on any failure.
async fn locate(geocoder: &dyn Geocoder, city: &str, timeout: Duration) -> Coordinates {
    let result = tokio::time::timeout(timeout, geocoder.resolve_city(city))
        .await
        .unwrap_or(Err(GeocodeError::Timeout));

    match result {
        Ok(coords) => coords,
        Err(GeocodeError::Disabled) => Coordinates::ZERO,
        Err(e) => {
            tracing::warn!(city, error = %e, "coordinate lookup failed, using (0, 0)");
            Coordinates::ZERO
        }
    }
}
