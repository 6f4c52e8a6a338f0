//! DTOs de Trip

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::status::TripStatus;
use crate::models::trip::{Trip, TripService};
use crate::models::Location;

/// Request para crear un nuevo viaje. El precio es la tarifa base ya
/// calculada por el colaborador de pricing.
#[derive(Debug, Deserialize)]
pub struct CreateTripRequest {
    pub car_id: Uuid,
    pub start_location: Location,
    pub destination_location: Location,
    pub price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CancelTripRequest {
    pub trip_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct TripServiceRequest {
    pub trip_id: Uuid,
    pub service_id: Uuid,
}

/// Request de las llamadas originadas por el dispositivo del coche
#[derive(Debug, Deserialize)]
pub struct DeviceRequest {
    pub device_id: String,
}

#[derive(Debug, Serialize)]
pub struct TripServiceInfo {
    pub service_id: Uuid,
    pub name: String,
    pub price: Decimal,
}

/// Response de viaje para la API, hidratado con sus servicios
#[derive(Debug, Serialize)]
pub struct TripInfo {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub car_id: Uuid,
    pub status: TripStatus,
    pub start_location: Location,
    pub destination_location: Location,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: Option<DateTime<Utc>>,
    pub price: Decimal,
    pub services: Vec<TripServiceInfo>,
}

impl From<TripService> for TripServiceInfo {
    fn from(service: TripService) -> Self {
        Self {
            service_id: service.service_id,
            name: service.name,
            price: service.price,
        }
    }
}

impl From<Trip> for TripInfo {
    fn from(trip: Trip) -> Self {
        Self {
            id: trip.id,
            customer_id: trip.customer_id,
            car_id: trip.car_id,
            status: trip.status,
            start_location: trip.start_location,
            destination_location: trip.destination_location,
            start_datetime: trip.start_datetime,
            end_datetime: trip.end_datetime,
            price: trip.price,
            services: trip.services.into_iter().map(TripServiceInfo::from).collect(),
        }
    }
}
