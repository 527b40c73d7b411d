//! Geolocation port.

use std::collections::HashMap;

use async_trait::async_trait;
use domain::Location;
use thiserror::Error;

/// Errors returned by [`GeoClient`] implementations.
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("Street not found: {0}")]
    StreetNotFound(String),

    #[error("Geolocation service unavailable: {0}")]
    Unavailable(String),
}

/// Resolves a street address to a grid location.
#[async_trait]
pub trait GeoClient: Send + Sync {
    async fn resolve(&self, street: &str) -> Result<Location, GeoError>;
}

/// Places every street at a random grid location.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomGeoClient;

#[async_trait]
impl GeoClient for RandomGeoClient {
    async fn resolve(&self, _street: &str) -> Result<Location, GeoError> {
        Ok(Location::random())
    }
}

/// Resolves streets from a fixed table.
///
/// Unknown streets map to the fallback location when one is set.
#[derive(Debug, Clone, Default)]
pub struct FixedGeoClient {
    streets: HashMap<String, Location>,
    fallback: Option<Location>,
}

impl FixedGeoClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves every street to `location`.
    pub fn always(location: Location) -> Self {
        Self {
            streets: HashMap::new(),
            fallback: Some(location),
        }
    }

    pub fn with_street(mut self, street: impl Into<String>, location: Location) -> Self {
        self.streets.insert(street.into(), location);
        self
    }
}

#[async_trait]
impl GeoClient for FixedGeoClient {
    async fn resolve(&self, street: &str) -> Result<Location, GeoError> {
        self.streets
            .get(street)
            .copied()
            .or(self.fallback)
            .ok_or_else(|| GeoError::StreetNotFound(street.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_client_resolves_known_streets() {
        let home = Location::new(2, 3).unwrap();
        let client = FixedGeoClient::new().with_street("Tverskaya", home);

        assert_eq!(client.resolve("Tverskaya").await.unwrap(), home);
        assert!(matches!(
            client.resolve("Arbat").await,
            Err(GeoError::StreetNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_fixed_client_fallback() {
        let anywhere = Location::new(9, 9).unwrap();
        let client = FixedGeoClient::always(anywhere);
        assert_eq!(client.resolve("Arbat").await.unwrap(), anywhere);
    }

    #[tokio::test]
    async fn test_random_client_stays_on_grid() {
        let location = RandomGeoClient.resolve("Arbat").await.unwrap();
        assert!(Location::new(location.x(), location.y()).is_ok());
    }
}
