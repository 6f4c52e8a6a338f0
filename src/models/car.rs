//! Modelo de Car
//!
//! Un vehículo de la flota con su estado operacional y telemetría. El
//! `device_id` identifica la unidad telemática física: los endpoints
//! autenticados por dispositivo lo usan en lugar del id del coche.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::status::CarStatus;
use crate::models::Location;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Car {
    pub id: Uuid,
    pub device_id: String,
    pub brand: String,
    pub model: String,
    pub license_plate: String,
    pub passenger_seats: i32,
    pub status: CarStatus,
    /// Nula hasta el primer reporte de telemetría
    pub location: Option<Location>,
    pub is_door_open: bool,
    // Telemetría informacional, sin invariantes asociadas
    pub fuel_level: Option<Decimal>,
    pub temperature: Option<Decimal>,
}

impl Car {
    pub fn register(
        device_id: String,
        brand: String,
        model: String,
        license_plate: String,
        passenger_seats: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            device_id,
            brand,
            model,
            license_plate,
            passenger_seats,
            status: CarStatus::Idle,
            location: None,
            is_door_open: false,
            fuel_level: None,
            temperature: None,
        }
    }
}
