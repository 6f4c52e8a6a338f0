//! Rutas HTTP de Car
//!
//! El CRUD exige rol administrador (se verifica en el controlador);
//! `/update` y `/door-status` son endpoints de dispositivo.

use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::car_controller::CarController;
use crate::dto::car_dto::{CarInfo, CreateCarRequest, EditCarRequest, TelemetryUpdateRequest};
use crate::dto::response::ServiceResponse;
use crate::state::AppState;
use crate::utils::guard::Caller;

pub fn create_car_router() -> Router<AppState> {
    Router::new()
        .route("/cars", get(get_cars))
        .route("/create", post(create_car))
        .route("/edit", post(edit_car))
        .route("/delete/:id", delete(delete_car))
        // Endpoints de dispositivo, sin JWT
        .route("/update", post(update_telemetry))
        .route("/door-status/:device_id", get(get_door_status))
}

async fn get_cars(State(state): State<AppState>) -> ServiceResponse<Vec<CarInfo>> {
    CarController::new(state.store.clone()).get_cars().await
}

async fn create_car(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<CreateCarRequest>,
) -> ServiceResponse<CarInfo> {
    CarController::new(state.store.clone())
        .create_car(&caller, request)
        .await
}

async fn edit_car(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<EditCarRequest>,
) -> ServiceResponse<CarInfo> {
    CarController::new(state.store.clone())
        .edit_car(&caller, request)
        .await
}

async fn delete_car(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> ServiceResponse<()> {
    CarController::new(state.store.clone())
        .delete_car(&caller, id)
        .await
}

async fn update_telemetry(
    State(state): State<AppState>,
    Json(request): Json<TelemetryUpdateRequest>,
) -> ServiceResponse<CarInfo> {
    CarController::new(state.store.clone())
        .update_telemetry(request)
        .await
}

async fn get_door_status(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> ServiceResponse<&'static str> {
    CarController::new(state.store.clone())
        .get_door_status(&device_id)
        .await
}
