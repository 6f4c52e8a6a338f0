//! Puerto de persistencia
//!
//! El orquestador solo exige read / read-for-update / write dentro de una
//! transacción. Cada operación pública abre una transacción, hace el
//! check-then-write bajo el lock exclusivo del coche y la confirma; una
//! transacción no confirmada se descarta al hacer drop, así la pareja de
//! escrituras Trip/Car es todo-o-nada.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::car::Car;
use crate::models::service::ServiceRecord;
use crate::models::status::TripStatus;
use crate::models::trip::Trip;
use crate::utils::errors::AppResult;

#[async_trait]
pub trait DispatchStore: Send + Sync + 'static {
    type Tx: StoreTx;

    async fn begin(&self) -> AppResult<Self::Tx>;
}

#[async_trait]
pub trait StoreTx: Send {
    // Cars
    async fn car_by_id(&mut self, car_id: Uuid) -> AppResult<Option<Car>>;
    /// Lectura con lock exclusivo del coche: serializa todas las
    /// transiciones que lo afectan
    async fn car_for_update(&mut self, car_id: Uuid) -> AppResult<Option<Car>>;
    async fn car_by_device_for_update(&mut self, device_id: &str) -> AppResult<Option<Car>>;
    async fn list_cars(&mut self) -> AppResult<Vec<Car>>;
    async fn insert_car(&mut self, car: &Car) -> AppResult<()>;
    async fn update_car(&mut self, car: &Car) -> AppResult<()>;
    async fn delete_car(&mut self, car_id: Uuid) -> AppResult<()>;

    // Trips (siempre hidratados con sus servicios adjuntos)
    async fn trip_by_id(&mut self, trip_id: Uuid) -> AppResult<Option<Trip>>;
    async fn trip_for_update(&mut self, trip_id: Uuid) -> AppResult<Option<Trip>>;
    async fn trip_for_car_in_status(
        &mut self,
        car_id: Uuid,
        status: TripStatus,
    ) -> AppResult<Option<Trip>>;
    async fn trip_owned_in_status(
        &mut self,
        customer_id: Uuid,
        status: TripStatus,
    ) -> AppResult<Option<Trip>>;
    /// Viaje en estado activo (InProgress/WaitingForPassenger) que
    /// referencia al coche; por invariante hay a lo sumo uno
    async fn active_trip_for_car(&mut self, car_id: Uuid) -> AppResult<Option<Trip>>;
    async fn trips_by_owner(&mut self, customer_id: Uuid) -> AppResult<Vec<Trip>>;
    async fn list_trips(&mut self) -> AppResult<Vec<Trip>>;
    async fn insert_trip(&mut self, trip: &Trip) -> AppResult<()>;
    async fn update_trip(&mut self, trip: &Trip) -> AppResult<()>;

    // Catálogo de servicios
    async fn service_by_id(&mut self, service_id: Uuid) -> AppResult<Option<ServiceRecord>>;
    async fn list_services(&mut self) -> AppResult<Vec<ServiceRecord>>;
    async fn insert_service(&mut self, service: &ServiceRecord) -> AppResult<()>;
    async fn update_service(&mut self, service: &ServiceRecord) -> AppResult<()>;
    async fn delete_service(&mut self, service_id: Uuid) -> AppResult<()>;

    async fn commit(self) -> AppResult<()>
    where
        Self: Sized;
}
