//! Implementación en memoria del puerto de persistencia
//!
//! Un mutex sobre el estado completo se retiene durante toda la
//! transacción, así que las transacciones se serializan: misma garantía
//! que el `FOR UPDATE` de PostgreSQL, a granularidad de store. Las
//! escrituras se aplican sobre una copia de trabajo y se vuelcan al
//! confirmar; un drop sin commit las descarta.
//!
//! La usan la suite de tests del orquestador y los arranques locales sin
//! PostgreSQL.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::models::car::Car;
use crate::models::service::ServiceRecord;
use crate::models::status::TripStatus;
use crate::models::trip::Trip;
use crate::store::{DispatchStore, StoreTx};
use crate::utils::errors::AppResult;

#[derive(Default, Clone)]
struct MemoryData {
    cars: HashMap<Uuid, Car>,
    trips: HashMap<Uuid, Trip>,
    services: HashMap<Uuid, ServiceRecord>,
}

#[derive(Default, Clone)]
pub struct MemoryStore {
    data: Arc<Mutex<MemoryData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alta directa de un coche, fuera de toda transacción (fixtures)
    pub async fn seed_car(&self, car: Car) {
        self.data.lock().await.cars.insert(car.id, car);
    }

    /// Alta directa de una entrada de catálogo (fixtures)
    pub async fn seed_service(&self, service: ServiceRecord) {
        self.data.lock().await.services.insert(service.id, service);
    }
}

#[async_trait]
impl DispatchStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> AppResult<MemoryTx> {
        let guard = Arc::clone(&self.data).lock_owned().await;
        let working = guard.clone();
        Ok(MemoryTx { guard, working })
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryData>,
    working: MemoryData,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn car_by_id(&mut self, car_id: Uuid) -> AppResult<Option<Car>> {
        Ok(self.working.cars.get(&car_id).cloned())
    }

    async fn car_for_update(&mut self, car_id: Uuid) -> AppResult<Option<Car>> {
        // El guard del store ya serializa la transacción completa
        Ok(self.working.cars.get(&car_id).cloned())
    }

    async fn car_by_device_for_update(&mut self, device_id: &str) -> AppResult<Option<Car>> {
        Ok(self
            .working
            .cars
            .values()
            .find(|c| c.device_id == device_id)
            .cloned())
    }

    async fn list_cars(&mut self) -> AppResult<Vec<Car>> {
        let mut cars: Vec<Car> = self.working.cars.values().cloned().collect();
        cars.sort_by(|a, b| a.license_plate.cmp(&b.license_plate));
        Ok(cars)
    }

    async fn insert_car(&mut self, car: &Car) -> AppResult<()> {
        self.working.cars.insert(car.id, car.clone());
        Ok(())
    }

    async fn update_car(&mut self, car: &Car) -> AppResult<()> {
        self.working.cars.insert(car.id, car.clone());
        Ok(())
    }

    async fn delete_car(&mut self, car_id: Uuid) -> AppResult<()> {
        self.working.cars.remove(&car_id);
        Ok(())
    }

    async fn trip_by_id(&mut self, trip_id: Uuid) -> AppResult<Option<Trip>> {
        Ok(self.working.trips.get(&trip_id).cloned())
    }

    async fn trip_for_update(&mut self, trip_id: Uuid) -> AppResult<Option<Trip>> {
        Ok(self.working.trips.get(&trip_id).cloned())
    }

    async fn trip_for_car_in_status(
        &mut self,
        car_id: Uuid,
        status: TripStatus,
    ) -> AppResult<Option<Trip>> {
        Ok(self
            .working
            .trips
            .values()
            .find(|t| t.car_id == car_id && t.status == status)
            .cloned())
    }

    async fn trip_owned_in_status(
        &mut self,
        customer_id: Uuid,
        status: TripStatus,
    ) -> AppResult<Option<Trip>> {
        Ok(self
            .working
            .trips
            .values()
            .find(|t| t.customer_id == customer_id && t.status == status)
            .cloned())
    }

    async fn active_trip_for_car(&mut self, car_id: Uuid) -> AppResult<Option<Trip>> {
        Ok(self
            .working
            .trips
            .values()
            .find(|t| t.car_id == car_id && t.status.is_active())
            .cloned())
    }

    async fn trips_by_owner(&mut self, customer_id: Uuid) -> AppResult<Vec<Trip>> {
        let mut trips: Vec<Trip> = self
            .working
            .trips
            .values()
            .filter(|t| t.customer_id == customer_id)
            .cloned()
            .collect();
        trips.sort_by(|a, b| b.start_datetime.cmp(&a.start_datetime));
        Ok(trips)
    }

    async fn list_trips(&mut self) -> AppResult<Vec<Trip>> {
        let mut trips: Vec<Trip> = self.working.trips.values().cloned().collect();
        trips.sort_by(|a, b| b.start_datetime.cmp(&a.start_datetime));
        Ok(trips)
    }

    async fn insert_trip(&mut self, trip: &Trip) -> AppResult<()> {
        self.working.trips.insert(trip.id, trip.clone());
        Ok(())
    }

    async fn update_trip(&mut self, trip: &Trip) -> AppResult<()> {
        self.working.trips.insert(trip.id, trip.clone());
        Ok(())
    }

    async fn service_by_id(&mut self, service_id: Uuid) -> AppResult<Option<ServiceRecord>> {
        Ok(self.working.services.get(&service_id).cloned())
    }

    async fn list_services(&mut self) -> AppResult<Vec<ServiceRecord>> {
        let mut services: Vec<ServiceRecord> = self.working.services.values().cloned().collect();
        services.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(services)
    }

    async fn insert_service(&mut self, service: &ServiceRecord) -> AppResult<()> {
        self.working.services.insert(service.id, service.clone());
        Ok(())
    }

    async fn update_service(&mut self, service: &ServiceRecord) -> AppResult<()> {
        self.working.services.insert(service.id, service.clone());
        Ok(())
    }

    async fn delete_service(&mut self, service_id: Uuid) -> AppResult<()> {
        self.working.services.remove(&service_id);
        Ok(())
    }

    async fn commit(mut self) -> AppResult<()> {
        *self.guard = self.working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::car::Car;
    use crate::models::status::CarStatus;

    fn test_car() -> Car {
        Car::register(
            "DEV-001".into(),
            "Tesla".into(),
            "Model 3".into(),
            "AX 1234 BX".into(),
            4,
        )
    }

    #[tokio::test]
    async fn test_uncommitted_writes_are_discarded() {
        let store = MemoryStore::new();
        let car = test_car();
        store.seed_car(car.clone()).await;

        {
            let mut tx = store.begin().await.unwrap();
            let mut loaded = tx.car_for_update(car.id).await.unwrap().unwrap();
            loaded.status = CarStatus::Danger;
            tx.update_car(&loaded).await.unwrap();
            // drop sin commit
        }

        let mut tx = store.begin().await.unwrap();
        let reloaded = tx.car_by_id(car.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, CarStatus::Idle);
    }

    #[tokio::test]
    async fn test_committed_writes_are_visible() {
        let store = MemoryStore::new();
        let car = test_car();
        store.seed_car(car.clone()).await;

        let mut tx = store.begin().await.unwrap();
        let mut loaded = tx.car_for_update(car.id).await.unwrap().unwrap();
        loaded.status = CarStatus::EnRoute;
        tx.update_car(&loaded).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let reloaded = tx.car_by_id(car.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, CarStatus::EnRoute);
    }
}
