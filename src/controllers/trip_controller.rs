//! Orquestador de viajes
//!
//! La máquina de estados central: crea viajes, valida y ejecuta cada
//! transición y mantiene la invariante Trip↔Car. Cada operación pública
//! abre una transacción, toma el lock exclusivo del coche afectado,
//! hace el check-then-write y confirma; dos `create_trip` concurrentes
//! sobre el mismo coche `Idle` resuelven en exactamente un éxito y un
//! `CarUnavailable`.
//!
//! Orden de locks: siempre coche primero, viaje después. Las operaciones
//! que parten del viaje (stop/cancel) lo leen primero sin lock solo para
//! conocer el coche y lo releen una vez tomado el lock.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::dto::response::ServiceResponse;
use crate::dto::trip_dto::{CreateTripRequest, TripInfo};
use crate::models::status::{CarStatus, TripStatus};
use crate::models::trip::Trip;
use crate::store::{DispatchStore, StoreTx};
use crate::utils::errors::{validation_error, AppError, AppResult};
use crate::utils::guard::{self, Caller};
use uuid::Uuid;

pub struct TripController<S> {
    store: Arc<S>,
}

impl<S: DispatchStore> TripController<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Crear un viaje nuevo y reclamar el coche atómicamente
    pub async fn create_trip(
        &self,
        caller: &Caller,
        request: CreateTripRequest,
    ) -> ServiceResponse<TripInfo> {
        ServiceResponse::from_result("create_trip", self.try_create_trip(caller, request).await)
    }

    async fn try_create_trip(
        &self,
        caller: &Caller,
        request: CreateTripRequest,
    ) -> AppResult<TripInfo> {
        guard::require_customer(caller)?;
        if request.price < Decimal::ZERO {
            return Err(validation_error("price", "price must be non-negative"));
        }

        let mut tx = self.store.begin().await?;
        let mut car = tx
            .car_for_update(request.car_id)
            .await?
            .ok_or(AppError::CarNotFound)?;
        if !car.status.is_claimable() {
            return Err(AppError::CarUnavailable);
        }

        let trip = Trip::create(
            caller.user_id,
            car.id,
            request.start_location,
            request.destination_location,
            request.price,
        );
        tx.insert_trip(&trip).await?;

        car.status = CarStatus::EnRoute;
        tx.update_car(&car).await?;
        tx.commit().await?;

        Ok(TripInfo::from(trip))
    }

    /// Señal del dispositivo: el pasajero subió y el viaje comenzó
    pub async fn advance_trip(&self, device_id: &str) -> ServiceResponse<TripInfo> {
        ServiceResponse::from_result("advance_trip", self.try_advance_trip(device_id).await)
    }

    async fn try_advance_trip(&self, device_id: &str) -> AppResult<TripInfo> {
        let mut tx = self.store.begin().await?;
        let mut car = tx
            .car_by_device_for_update(device_id)
            .await?
            .ok_or(AppError::CarNotFound)?;
        let mut trip = tx
            .trip_for_car_in_status(car.id, TripStatus::Created)
            .await?
            .ok_or(AppError::CarUnavailable)?;

        trip.transition_to(TripStatus::InProgress)?;
        car.status = CarStatus::OnTrip;

        tx.update_trip(&trip).await?;
        tx.update_car(&car).await?;
        tx.commit().await?;

        Ok(TripInfo::from(trip))
    }

    /// Llegada a destino: termina la conducción y espera el descenso
    pub async fn stop_car(&self, caller: &Caller) -> ServiceResponse<TripInfo> {
        ServiceResponse::from_result("stop_car", self.try_stop_car(caller).await)
    }

    async fn try_stop_car(&self, caller: &Caller) -> AppResult<TripInfo> {
        guard::require_customer(caller)?;

        let mut tx = self.store.begin().await?;
        let probe = tx
            .trip_owned_in_status(caller.user_id, TripStatus::InProgress)
            .await?
            .ok_or(AppError::CarUnavailable)?;
        let mut car = tx
            .car_for_update(probe.car_id)
            .await?
            .ok_or(AppError::CarNotFound)?;
        let mut trip = tx
            .trip_for_update(probe.id)
            .await?
            .ok_or(AppError::TripNotFound)?;
        // Revalidar tras tomar el lock del coche
        if trip.status != TripStatus::InProgress {
            return Err(AppError::CarUnavailable);
        }

        trip.transition_to(TripStatus::WaitingForPassenger)?;
        car.status = CarStatus::WaitingForPassenger;

        tx.update_trip(&trip).await?;
        tx.update_car(&car).await?;
        tx.commit().await?;

        Ok(TripInfo::from(trip))
    }

    /// Señal del dispositivo: el pasajero descendió; éxito terminal
    pub async fn complete_trip(&self, device_id: &str) -> ServiceResponse<TripInfo> {
        ServiceResponse::from_result("complete_trip", self.try_complete_trip(device_id).await)
    }

    async fn try_complete_trip(&self, device_id: &str) -> AppResult<TripInfo> {
        let mut tx = self.store.begin().await?;
        let mut car = tx
            .car_by_device_for_update(device_id)
            .await?
            .ok_or(AppError::CarNotFound)?;
        let mut trip = tx
            .trip_for_car_in_status(car.id, TripStatus::WaitingForPassenger)
            .await?
            .ok_or(AppError::CarUnavailable)?;

        trip.transition_to(TripStatus::Completed)?;
        car.status = CarStatus::Idle;

        tx.update_trip(&trip).await?;
        tx.update_car(&car).await?;
        tx.commit().await?;

        Ok(TripInfo::from(trip))
    }

    /// Cancelación por el dueño; libera el coche de vuelta a `Idle`
    pub async fn cancel_own_trip(
        &self,
        caller: &Caller,
        trip_id: Uuid,
    ) -> ServiceResponse<TripInfo> {
        ServiceResponse::from_result(
            "cancel_own_trip",
            self.try_cancel_own_trip(caller, trip_id).await,
        )
    }

    async fn try_cancel_own_trip(&self, caller: &Caller, trip_id: Uuid) -> AppResult<TripInfo> {
        guard::require_customer(caller)?;

        let mut tx = self.store.begin().await?;
        let probe = tx
            .trip_by_id(trip_id)
            .await?
            .ok_or(AppError::TripNotFound)?;
        guard::require_trip_owner(caller, &probe)?;

        let mut car = tx
            .car_for_update(probe.car_id)
            .await?
            .ok_or(AppError::CarNotFound)?;
        let mut trip = tx
            .trip_for_update(trip_id)
            .await?
            .ok_or(AppError::TripNotFound)?;

        trip.transition_to(TripStatus::Cancelled)?;
        tx.update_trip(&trip).await?;

        // Liberar el coche solo si ningún otro viaje activo lo referencia;
        // por invariante no puede haber otro
        if tx.active_trip_for_car(car.id).await?.is_none() {
            car.status = CarStatus::Idle;
            tx.update_car(&car).await?;
        }
        tx.commit().await?;

        Ok(TripInfo::from(trip))
    }

    /// Adjuntar un servicio del catálogo y recalcular el precio
    pub async fn attach_service(
        &self,
        caller: &Caller,
        trip_id: Uuid,
        service_id: Uuid,
    ) -> ServiceResponse<TripInfo> {
        ServiceResponse::from_result(
            "attach_service",
            self.try_attach_service(caller, trip_id, service_id).await,
        )
    }

    async fn try_attach_service(
        &self,
        caller: &Caller,
        trip_id: Uuid,
        service_id: Uuid,
    ) -> AppResult<TripInfo> {
        guard::require_customer(caller)?;

        let mut tx = self.store.begin().await?;
        let mut trip = tx
            .trip_for_update(trip_id)
            .await?
            .ok_or(AppError::TripNotFound)?;
        guard::require_trip_owner(caller, &trip)?;

        let service = tx
            .service_by_id(service_id)
            .await?
            .ok_or(AppError::ServiceNotFound)?;
        trip.attach_service(service.id, service.name, service.price)?;

        tx.update_trip(&trip).await?;
        tx.commit().await?;

        Ok(TripInfo::from(trip))
    }

    /// Quitar un servicio adjunto y recalcular el precio
    pub async fn detach_service(
        &self,
        caller: &Caller,
        trip_id: Uuid,
        service_id: Uuid,
    ) -> ServiceResponse<TripInfo> {
        ServiceResponse::from_result(
            "detach_service",
            self.try_detach_service(caller, trip_id, service_id).await,
        )
    }

    async fn try_detach_service(
        &self,
        caller: &Caller,
        trip_id: Uuid,
        service_id: Uuid,
    ) -> AppResult<TripInfo> {
        guard::require_customer(caller)?;

        let mut tx = self.store.begin().await?;
        let mut trip = tx
            .trip_for_update(trip_id)
            .await?
            .ok_or(AppError::TripNotFound)?;
        guard::require_trip_owner(caller, &trip)?;

        trip.detach_service(service_id)?;

        tx.update_trip(&trip).await?;
        tx.commit().await?;

        Ok(TripInfo::from(trip))
    }

    /// Viajes del cliente autenticado, hidratados con sus servicios
    pub async fn get_own_trips(&self, caller: &Caller) -> ServiceResponse<Vec<TripInfo>> {
        ServiceResponse::from_result("get_own_trips", self.try_get_own_trips(caller).await)
    }

    async fn try_get_own_trips(&self, caller: &Caller) -> AppResult<Vec<TripInfo>> {
        guard::require_customer(caller)?;
        let mut tx = self.store.begin().await?;
        let trips = tx.trips_by_owner(caller.user_id).await?;
        Ok(trips.into_iter().map(TripInfo::from).collect())
    }

    /// Todos los viajes; solo para operadores
    pub async fn get_trips(&self, caller: &Caller) -> ServiceResponse<Vec<TripInfo>> {
        ServiceResponse::from_result("get_trips", self.try_get_trips(caller).await)
    }

    async fn try_get_trips(&self, caller: &Caller) -> AppResult<Vec<TripInfo>> {
        guard::require_administrator(caller)?;
        let mut tx = self.store.begin().await?;
        let trips = tx.list_trips().await?;
        Ok(trips.into_iter().map(TripInfo::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::car::Car;
    use crate::models::service::ServiceRecord;
    use crate::models::Location;
    use crate::store::memory::MemoryStore;
    use crate::utils::errors::ErrorKind;
    use crate::utils::guard::Role;

    fn customer() -> Caller {
        Caller::new(Uuid::new_v4(), Role::Customer)
    }

    fn test_car(device_id: &str) -> Car {
        Car::register(
            device_id.into(),
            "Tesla".into(),
            "Model 3".into(),
            "AX 1234 BX".into(),
            4,
        )
    }

    fn create_request(car_id: Uuid, price: Decimal) -> CreateTripRequest {
        CreateTripRequest {
            car_id,
            start_location: Location::new(49.99, 36.23),
            destination_location: Location::new(50.0, 36.3),
            price,
        }
    }

    async fn setup() -> (TripController<MemoryStore>, Arc<MemoryStore>, Car) {
        let store = Arc::new(MemoryStore::new());
        let car = test_car("DEV-001");
        store.seed_car(car.clone()).await;
        (TripController::new(store.clone()), store, car)
    }

    async fn car_status(store: &MemoryStore, car_id: Uuid) -> CarStatus {
        let mut tx = store.begin().await.unwrap();
        tx.car_by_id(car_id).await.unwrap().unwrap().status
    }

    #[tokio::test]
    async fn test_end_to_end_lifecycle() {
        let (controller, store, car) = setup().await;
        let rider = customer();

        let trip = controller
            .create_trip(&rider, create_request(car.id, Decimal::new(1000, 2)))
            .await
            .success()
            .expect("create should succeed");
        assert_eq!(trip.status, TripStatus::Created);
        assert_eq!(car_status(&store, car.id).await, CarStatus::EnRoute);

        let trip = controller
            .advance_trip("DEV-001")
            .await
            .success()
            .expect("advance should succeed");
        assert_eq!(trip.status, TripStatus::InProgress);
        assert_eq!(car_status(&store, car.id).await, CarStatus::OnTrip);

        let trip = controller
            .stop_car(&rider)
            .await
            .success()
            .expect("stop should succeed");
        assert_eq!(trip.status, TripStatus::WaitingForPassenger);
        assert_eq!(
            car_status(&store, car.id).await,
            CarStatus::WaitingForPassenger
        );

        let trip = controller
            .complete_trip("DEV-001")
            .await
            .success()
            .expect("complete should succeed");
        assert_eq!(trip.status, TripStatus::Completed);
        assert!(trip.end_datetime.is_some());
        assert_eq!(car_status(&store, car.id).await, CarStatus::Idle);
    }

    #[tokio::test]
    async fn test_create_trip_rejects_busy_car() {
        let (controller, store, car) = setup().await;

        controller
            .create_trip(&customer(), create_request(car.id, Decimal::new(1000, 2)))
            .await
            .success()
            .expect("first create should succeed");

        let response = controller
            .create_trip(&customer(), create_request(car.id, Decimal::new(1000, 2)))
            .await;
        let failure = response.failure().expect("second create must fail");
        assert_eq!(failure.code, "CAR_UNAVAILABLE");
        assert_eq!(car_status(&store, car.id).await, CarStatus::EnRoute);
    }

    #[tokio::test]
    async fn test_create_trip_unknown_car() {
        let (controller, _store, _car) = setup().await;
        let response = controller
            .create_trip(&customer(), create_request(Uuid::new_v4(), Decimal::ZERO))
            .await;
        assert_eq!(response.failure().unwrap().code, "CAR_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_create_trip_rejects_negative_price() {
        let (controller, store, car) = setup().await;
        let response = controller
            .create_trip(&customer(), create_request(car.id, Decimal::new(-100, 2)))
            .await;
        assert_eq!(response.failure().unwrap().kind, ErrorKind::InvalidState);
        assert_eq!(car_status(&store, car.id).await, CarStatus::Idle);
    }

    #[tokio::test]
    async fn test_create_trip_requires_customer_role() {
        let (controller, _store, car) = setup().await;
        let admin = Caller::new(Uuid::new_v4(), Role::Administrator);
        let response = controller
            .create_trip(&admin, create_request(car.id, Decimal::new(1000, 2)))
            .await;
        assert_eq!(response.failure().unwrap().kind, ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn test_concurrent_claims_one_winner() {
        let (controller, store, car) = setup().await;
        let controller = Arc::new(controller);

        let a = {
            let controller = controller.clone();
            let request = create_request(car.id, Decimal::new(1000, 2));
            tokio::spawn(async move { controller.create_trip(&customer(), request).await })
        };
        let b = {
            let controller = controller.clone();
            let request = create_request(car.id, Decimal::new(1000, 2));
            tokio::spawn(async move { controller.create_trip(&customer(), request).await })
        };

        let (a, b) = (a.await.unwrap(), b.await.unwrap());
        let successes = [a.is_success(), b.is_success()]
            .iter()
            .filter(|s| **s)
            .count();
        assert_eq!(successes, 1, "exactly one claim must win");

        let loser = if a.is_success() { b } else { a };
        assert_eq!(loser.failure().unwrap().code, "CAR_UNAVAILABLE");
        assert_eq!(car_status(&store, car.id).await, CarStatus::EnRoute);

        // Invariante: un solo viaje referencia al coche
        let mut tx = store.begin().await.unwrap();
        assert_eq!(
            tx.list_trips()
                .await
                .unwrap()
                .iter()
                .filter(|t| t.car_id == car.id && !t.status.is_terminal())
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_out_of_order_transition_fails_cleanly() {
        let (controller, store, car) = setup().await;
        let rider = customer();
        controller
            .create_trip(&rider, create_request(car.id, Decimal::new(1000, 2)))
            .await
            .success()
            .unwrap();

        // stop sobre un viaje todavía Created: no hay viaje InProgress
        let response = controller.stop_car(&rider).await;
        assert_eq!(response.failure().unwrap().code, "CAR_UNAVAILABLE");
        assert_eq!(car_status(&store, car.id).await, CarStatus::EnRoute);

        // complete sin pasar por WaitingForPassenger
        let response = controller.complete_trip("DEV-001").await;
        assert!(response.failure().is_some());
        assert_eq!(car_status(&store, car.id).await, CarStatus::EnRoute);
    }

    #[tokio::test]
    async fn test_cancel_is_not_idempotent_but_car_state_is() {
        let (controller, store, car) = setup().await;
        let rider = customer();
        let trip = controller
            .create_trip(&rider, create_request(car.id, Decimal::new(1000, 2)))
            .await
            .success()
            .unwrap();

        let first = controller.cancel_own_trip(&rider, trip.id).await;
        let cancelled = first.success().expect("first cancel should succeed");
        assert_eq!(cancelled.status, TripStatus::Cancelled);
        assert!(cancelled.end_datetime.is_some());
        assert_eq!(car_status(&store, car.id).await, CarStatus::Idle);

        let second = controller.cancel_own_trip(&rider, trip.id).await;
        assert_eq!(second.failure().unwrap().kind, ErrorKind::InvalidState);
        assert_eq!(car_status(&store, car.id).await, CarStatus::Idle);
    }

    #[tokio::test]
    async fn test_cancel_requires_ownership() {
        let (controller, store, car) = setup().await;
        let rider = customer();
        let trip = controller
            .create_trip(&rider, create_request(car.id, Decimal::new(1000, 2)))
            .await
            .success()
            .unwrap();

        let stranger = customer();
        let response = controller.cancel_own_trip(&stranger, trip.id).await;
        assert_eq!(response.failure().unwrap().kind, ErrorKind::Unauthorized);

        // El viaje y el coche quedan intactos
        let mut tx = store.begin().await.unwrap();
        let stored = tx.trip_by_id(trip.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TripStatus::Created);
        drop(tx);
        assert_eq!(car_status(&store, car.id).await, CarStatus::EnRoute);
    }

    #[tokio::test]
    async fn test_cancel_after_waiting_for_passenger_fails() {
        let (controller, _store, car) = setup().await;
        let rider = customer();
        let trip = controller
            .create_trip(&rider, create_request(car.id, Decimal::new(1000, 2)))
            .await
            .success()
            .unwrap();
        controller.advance_trip("DEV-001").await.success().unwrap();
        controller.stop_car(&rider).await.success().unwrap();

        let response = controller.cancel_own_trip(&rider, trip.id).await;
        assert_eq!(response.failure().unwrap().kind, ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn test_attach_and_detach_recompute_price() {
        let (controller, store, car) = setup().await;
        let child_seat = ServiceRecord::new(
            "Child seat".into(),
            "install_child_seat".into(),
            Decimal::new(500, 2),
        );
        let priority = ServiceRecord::new(
            "Priority pickup".into(),
            "priority_pickup".into(),
            Decimal::new(350, 2),
        );
        store.seed_service(child_seat.clone()).await;
        store.seed_service(priority.clone()).await;

        let rider = customer();
        let trip = controller
            .create_trip(&rider, create_request(car.id, Decimal::new(1000, 2)))
            .await
            .success()
            .unwrap();

        let trip_info = controller
            .attach_service(&rider, trip.id, child_seat.id)
            .await
            .success()
            .unwrap();
        assert_eq!(trip_info.price, Decimal::new(1500, 2));

        let trip_info = controller
            .attach_service(&rider, trip.id, priority.id)
            .await
            .success()
            .unwrap();
        assert_eq!(trip_info.price, Decimal::new(1850, 2));
        assert_eq!(trip_info.services.len(), 2);

        let trip_info = controller
            .detach_service(&rider, trip.id, priority.id)
            .await
            .success()
            .unwrap();
        assert_eq!(trip_info.price, Decimal::new(1500, 2));
        assert_eq!(trip_info.services.len(), 1);
    }

    #[tokio::test]
    async fn test_attach_unknown_service() {
        let (controller, _store, car) = setup().await;
        let rider = customer();
        let trip = controller
            .create_trip(&rider, create_request(car.id, Decimal::new(1000, 2)))
            .await
            .success()
            .unwrap();

        let response = controller
            .attach_service(&rider, trip.id, Uuid::new_v4())
            .await;
        assert_eq!(response.failure().unwrap().code, "SERVICE_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_attach_requires_ownership() {
        let (controller, store, car) = setup().await;
        let svc = ServiceRecord::new("Child seat".into(), "cmd".into(), Decimal::new(500, 2));
        store.seed_service(svc.clone()).await;

        let rider = customer();
        let trip = controller
            .create_trip(&rider, create_request(car.id, Decimal::new(1000, 2)))
            .await
            .success()
            .unwrap();

        let response = controller
            .attach_service(&customer(), trip.id, svc.id)
            .await;
        assert_eq!(response.failure().unwrap().kind, ErrorKind::Unauthorized);

        let mut tx = store.begin().await.unwrap();
        let stored = tx.trip_by_id(trip.id).await.unwrap().unwrap();
        assert!(stored.services.is_empty());
        assert_eq!(stored.price, Decimal::new(1000, 2));
    }

    #[tokio::test]
    async fn test_attach_on_terminal_trip_fails() {
        let (controller, store, car) = setup().await;
        let svc = ServiceRecord::new("Child seat".into(), "cmd".into(), Decimal::new(500, 2));
        store.seed_service(svc.clone()).await;

        let rider = customer();
        let trip = controller
            .create_trip(&rider, create_request(car.id, Decimal::new(1000, 2)))
            .await
            .success()
            .unwrap();
        controller
            .cancel_own_trip(&rider, trip.id)
            .await
            .success()
            .unwrap();

        let response = controller.attach_service(&rider, trip.id, svc.id).await;
        assert_eq!(response.failure().unwrap().kind, ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn test_advance_unknown_device() {
        let (controller, _store, _car) = setup().await;
        let response = controller.advance_trip("NO-SUCH-DEVICE").await;
        assert_eq!(response.failure().unwrap().code, "CAR_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_own_trips_projection() {
        let (controller, store, car) = setup().await;
        let other_car = test_car("DEV-002");
        store.seed_car(other_car.clone()).await;

        let rider = customer();
        let other = customer();
        controller
            .create_trip(&rider, create_request(car.id, Decimal::new(1000, 2)))
            .await
            .success()
            .unwrap();
        controller
            .create_trip(&other, create_request(other_car.id, Decimal::new(2000, 2)))
            .await
            .success()
            .unwrap();

        let own = controller.get_own_trips(&rider).await.success().unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].customer_id, rider.user_id);

        // El listado global exige administrador
        let all = controller.get_trips(&rider).await;
        assert_eq!(all.failure().unwrap().kind, ErrorKind::Unauthorized);

        let admin = Caller::new(Uuid::new_v4(), Role::Administrator);
        let all = controller.get_trips(&admin).await.success().unwrap();
        assert_eq!(all.len(), 2);
    }
}
