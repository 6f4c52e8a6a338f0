//! Controlador de coches
//!
//! CRUD de flota (solo administrador) y endpoints originados por el
//! dispositivo telemático: reporte de telemetría y consulta de puertas.
//! El estado del coche lo dirigen las transiciones de viaje; aquí solo
//! lo muta un administrador o la señal de peligro del dispositivo.

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::dto::car_dto::{CarInfo, CreateCarRequest, EditCarRequest, TelemetryUpdateRequest};
use crate::dto::response::ServiceResponse;
use crate::models::car::Car;
use crate::models::status::CarStatus;
use crate::store::{DispatchStore, StoreTx};
use crate::utils::errors::{AppError, AppResult};
use crate::utils::guard::{self, Caller};

pub const DOOR_OPEN: &str = "DoorOpen";
pub const DOOR_CLOSED: &str = "DoorClosed";

pub struct CarController<S> {
    store: Arc<S>,
}

impl<S: DispatchStore> CarController<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn get_cars(&self) -> ServiceResponse<Vec<CarInfo>> {
        ServiceResponse::from_result("get_cars", self.try_get_cars().await)
    }

    async fn try_get_cars(&self) -> AppResult<Vec<CarInfo>> {
        let mut tx = self.store.begin().await?;
        let cars = tx.list_cars().await?;
        Ok(cars.into_iter().map(CarInfo::from).collect())
    }

    pub async fn create_car(
        &self,
        caller: &Caller,
        request: CreateCarRequest,
    ) -> ServiceResponse<CarInfo> {
        ServiceResponse::from_result("create_car", self.try_create_car(caller, request).await)
    }

    async fn try_create_car(
        &self,
        caller: &Caller,
        request: CreateCarRequest,
    ) -> AppResult<CarInfo> {
        guard::require_administrator(caller)?;
        request.validate()?;

        let mut tx = self.store.begin().await?;
        if tx
            .car_by_device_for_update(&request.device_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "A car with this device id is already registered".to_string(),
            ));
        }

        let car = Car::register(
            request.device_id,
            request.brand,
            request.model,
            request.license_plate,
            request.passenger_seats,
        );
        tx.insert_car(&car).await?;
        tx.commit().await?;

        Ok(CarInfo::from(car))
    }

    pub async fn edit_car(
        &self,
        caller: &Caller,
        request: EditCarRequest,
    ) -> ServiceResponse<CarInfo> {
        ServiceResponse::from_result("edit_car", self.try_edit_car(caller, request).await)
    }

    async fn try_edit_car(&self, caller: &Caller, request: EditCarRequest) -> AppResult<CarInfo> {
        guard::require_administrator(caller)?;
        request.validate()?;

        let mut tx = self.store.begin().await?;
        let mut car = tx
            .car_for_update(request.car_id)
            .await?
            .ok_or(AppError::CarNotFound)?;

        if let Some(status) = request.status {
            // Un cambio de estado manual no puede pisar un viaje activo
            if tx.active_trip_for_car(car.id).await?.is_some() {
                return Err(AppError::Conflict(
                    "Car has an active trip; status is driven by the trip".to_string(),
                ));
            }
            car.status = status;
        }
        car.brand = request.brand.unwrap_or(car.brand);
        car.model = request.model.unwrap_or(car.model);
        car.license_plate = request.license_plate.unwrap_or(car.license_plate);
        car.passenger_seats = request.passenger_seats.unwrap_or(car.passenger_seats);

        tx.update_car(&car).await?;
        tx.commit().await?;

        Ok(CarInfo::from(car))
    }

    pub async fn delete_car(&self, caller: &Caller, car_id: Uuid) -> ServiceResponse<()> {
        ServiceResponse::from_result("delete_car", self.try_delete_car(caller, car_id).await)
    }

    async fn try_delete_car(&self, caller: &Caller, car_id: Uuid) -> AppResult<()> {
        guard::require_administrator(caller)?;

        let mut tx = self.store.begin().await?;
        let car = tx
            .car_for_update(car_id)
            .await?
            .ok_or(AppError::CarNotFound)?;
        if tx.active_trip_for_car(car.id).await?.is_some() {
            return Err(AppError::Conflict(
                "Car has an active trip and cannot be deleted".to_string(),
            ));
        }

        tx.delete_car(car_id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Reporte de telemetría del dispositivo. La resolución del
    /// `device_id` es toda la autenticación que se exige.
    pub async fn update_telemetry(
        &self,
        request: TelemetryUpdateRequest,
    ) -> ServiceResponse<CarInfo> {
        ServiceResponse::from_result(
            "update_telemetry",
            self.try_update_telemetry(request).await,
        )
    }

    async fn try_update_telemetry(&self, request: TelemetryUpdateRequest) -> AppResult<CarInfo> {
        let mut tx = self.store.begin().await?;
        let mut car = tx
            .car_by_device_for_update(&request.device_id)
            .await?
            .ok_or(AppError::CarNotFound)?;

        if let Some(location) = request.location {
            car.location = Some(location);
        }
        if let Some(fuel_level) = request.fuel_level {
            car.fuel_level = Some(fuel_level);
        }
        if let Some(temperature) = request.temperature {
            car.temperature = Some(temperature);
        }
        if let Some(is_door_open) = request.is_door_open {
            car.is_door_open = is_door_open;
        }
        match request.danger {
            Some(true) => car.status = CarStatus::Danger,
            Some(false) if car.status == CarStatus::Danger => car.status = CarStatus::Idle,
            _ => {}
        }

        tx.update_car(&car).await?;
        tx.commit().await?;

        Ok(CarInfo::from(car))
    }

    /// Estado de puertas del coche identificado por su dispositivo
    pub async fn get_door_status(&self, device_id: &str) -> ServiceResponse<&'static str> {
        ServiceResponse::from_result(
            "get_door_status",
            self.try_get_door_status(device_id).await,
        )
    }

    async fn try_get_door_status(&self, device_id: &str) -> AppResult<&'static str> {
        let mut tx = self.store.begin().await?;
        let car = tx
            .car_by_device_for_update(device_id)
            .await?
            .ok_or(AppError::CarNotFound)?;
        Ok(if car.is_door_open {
            DOOR_OPEN
        } else {
            DOOR_CLOSED
        })
    }
}
