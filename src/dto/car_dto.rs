//! DTOs de Car

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::car::Car;
use crate::models::status::CarStatus;
use crate::models::Location;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCarRequest {
    #[validate(length(min = 1, max = 64))]
    pub device_id: String,

    #[validate(length(min = 1, max = 100))]
    pub brand: String,

    #[validate(length(min = 1, max = 100))]
    pub model: String,

    #[validate(length(min = 4, max = 20))]
    pub license_plate: String,

    #[validate(range(min = 1, max = 8))]
    pub passenger_seats: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EditCarRequest {
    pub car_id: Uuid,

    #[validate(length(min = 1, max = 100))]
    pub brand: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub model: Option<String>,

    #[validate(length(min = 4, max = 20))]
    pub license_plate: Option<String>,

    #[validate(range(min = 1, max = 8))]
    pub passenger_seats: Option<i32>,

    pub status: Option<CarStatus>,
}

/// Reporte de telemetría originado por el dispositivo. La identidad del
/// dispositivo es la autenticación; no hay chequeo de rol.
#[derive(Debug, Deserialize)]
pub struct TelemetryUpdateRequest {
    pub device_id: String,
    pub location: Option<Location>,
    pub fuel_level: Option<Decimal>,
    pub temperature: Option<Decimal>,
    pub is_door_open: Option<bool>,
    /// Señal de peligro del vehículo: `true` marca `Danger`,
    /// `false` lo limpia de vuelta a `Idle`
    pub danger: Option<bool>,
}

/// Response de coche para la API. No expone `device_id`: es la
/// credencial de los endpoints de dispositivo.
#[derive(Debug, Serialize)]
pub struct CarInfo {
    pub id: Uuid,
    pub brand: String,
    pub model: String,
    pub license_plate: String,
    pub passenger_seats: i32,
    pub status: CarStatus,
    pub location: Option<Location>,
    pub is_door_open: bool,
    pub fuel_level: Option<Decimal>,
    pub temperature: Option<Decimal>,
}

impl From<Car> for CarInfo {
    fn from(car: Car) -> Self {
        Self {
            id: car.id,
            brand: car.brand,
            model: car.model,
            license_plate: car.license_plate,
            passenger_seats: car.passenger_seats,
            status: car.status,
            location: car.location,
            is_door_open: car.is_door_open,
            fuel_level: car.fuel_level,
            temperature: car.temperature,
        }
    }
}
