//! Modelo de Trip
//!
//! Un viaje de un cliente, desde la solicitud hasta completarse o
//! cancelarse. El precio siempre es `base_fare + Σ(servicios adjuntos)` y
//! se recalcula en cada attach/detach, nunca en lectura.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::status::TripStatus;
use crate::models::Location;
use crate::utils::errors::{AppError, AppResult};

/// Copia trip-scoped de una entrada del catálogo de servicios.
/// Referencia la entrada por id pero no es un alias de ella.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripService {
    pub service_id: Uuid,
    pub name: String,
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub car_id: Uuid,
    pub status: TripStatus,
    pub start_location: Location,
    pub destination_location: Location,
    pub start_datetime: DateTime<Utc>,
    /// Fijado si y solo si el viaje es terminal
    pub end_datetime: Option<DateTime<Utc>>,
    /// Tarifa base suministrada al crear el viaje
    pub base_fare: Decimal,
    /// Precio total vigente: base_fare + servicios
    pub price: Decimal,
    /// Lista ordenada de servicios adjuntos, propiedad exclusiva del viaje
    pub services: Vec<TripService>,
}

impl Trip {
    pub fn create(
        customer_id: Uuid,
        car_id: Uuid,
        start_location: Location,
        destination_location: Location,
        base_fare: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id,
            car_id,
            status: TripStatus::Created,
            start_location,
            destination_location,
            start_datetime: Utc::now(),
            end_datetime: None,
            base_fare,
            price: base_fare,
            services: Vec::new(),
        }
    }

    /// Transición validada contra la tabla de estados. Una transición
    /// ilegal falla sin tocar la entidad.
    pub fn transition_to(&mut self, next: TripStatus) -> AppResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::InvalidState(format!(
                "trip cannot go from {:?} to {:?}",
                self.status, next
            )));
        }
        self.status = next;
        if next.is_terminal() {
            self.end_datetime = Some(Utc::now());
        }
        Ok(())
    }

    /// Adjuntar un servicio del catálogo y recalcular el precio
    pub fn attach_service(&mut self, service_id: Uuid, name: String, price: Decimal) -> AppResult<()> {
        if !self.status.allows_service_changes() {
            return Err(AppError::InvalidState(format!(
                "services cannot be changed on a {:?} trip",
                self.status
            )));
        }
        self.services.push(TripService {
            service_id,
            name,
            price,
        });
        self.recompute_price();
        Ok(())
    }

    /// Quitar un servicio adjunto y recalcular el precio
    pub fn detach_service(&mut self, service_id: Uuid) -> AppResult<()> {
        if !self.status.allows_service_changes() {
            return Err(AppError::InvalidState(format!(
                "services cannot be changed on a {:?} trip",
                self.status
            )));
        }
        let position = self
            .services
            .iter()
            .position(|s| s.service_id == service_id)
            .ok_or(AppError::ServiceNotFound)?;
        self.services.remove(position);
        self.recompute_price();
        Ok(())
    }

    /// Recalcular desde cero: nunca se parte de una suma cacheada
    fn recompute_price(&mut self) {
        self.price = self.base_fare + self.services.iter().map(|s| s.price).sum::<Decimal>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trip_with_base(base: Decimal) -> Trip {
        Trip::create(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Location::new(50.0, 36.2),
            Location::new(50.1, 36.3),
            base,
        )
    }

    #[test]
    fn test_price_recomputation() {
        let mut trip = trip_with_base(Decimal::new(1000, 2)); // 10.00
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        trip.attach_service(a, "Child seat".into(), Decimal::new(500, 2))
            .unwrap();
        trip.attach_service(b, "Priority pickup".into(), Decimal::new(350, 2))
            .unwrap();
        assert_eq!(trip.price, Decimal::new(1850, 2)); // 18.50

        trip.detach_service(b).unwrap();
        assert_eq!(trip.price, Decimal::new(1500, 2)); // 15.00
    }

    #[test]
    fn test_detach_unknown_service_fails() {
        let mut trip = trip_with_base(Decimal::new(1000, 2));
        let err = trip.detach_service(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, AppError::ServiceNotFound));
        assert_eq!(trip.price, Decimal::new(1000, 2));
    }

    #[test]
    fn test_services_frozen_once_terminal() {
        let mut trip = trip_with_base(Decimal::new(1000, 2));
        trip.transition_to(TripStatus::Cancelled).unwrap();

        let err = trip
            .attach_service(Uuid::new_v4(), "Child seat".into(), Decimal::new(500, 2))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
        assert!(trip.services.is_empty());
    }

    #[test]
    fn test_end_datetime_set_only_on_terminal() {
        let mut trip = trip_with_base(Decimal::new(1000, 2));
        assert!(trip.end_datetime.is_none());

        trip.transition_to(TripStatus::InProgress).unwrap();
        assert!(trip.end_datetime.is_none());

        trip.transition_to(TripStatus::Cancelled).unwrap();
        assert!(trip.end_datetime.is_some());
    }

    #[test]
    fn test_illegal_transition_leaves_trip_unchanged() {
        let mut trip = trip_with_base(Decimal::new(1000, 2));
        let err = trip.transition_to(TripStatus::Completed).unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
        assert_eq!(trip.status, TripStatus::Created);
        assert!(trip.end_datetime.is_none());
    }
}
