pub mod car;
pub mod service;
pub mod status;
pub mod trip;

use serde::{Deserialize, Serialize};

/// Punto geográfico (latitud/longitud)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}
