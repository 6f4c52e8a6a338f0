//! Rutas HTTP de Trip
//!
//! Las rutas de cliente resuelven el `Caller` con el extractor JWT; las
//! de dispositivo (`/advance`, `/complete`) se identifican solo por
//! `device_id` en el body.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::controllers::trip_controller::TripController;
use crate::dto::response::ServiceResponse;
use crate::dto::trip_dto::{
    CancelTripRequest, CreateTripRequest, DeviceRequest, TripInfo, TripServiceRequest,
};
use crate::state::AppState;
use crate::utils::guard::Caller;

pub fn create_trip_router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_trip))
        .route("/user-trips", get(get_own_trips))
        .route("/trips", get(get_trips))
        .route("/cancel", post(cancel_trip))
        .route("/stop", post(stop_car))
        .route("/attach-service", post(attach_service))
        .route("/detach-service", post(detach_service))
        // Endpoints de dispositivo, sin JWT
        .route("/advance", post(advance_trip))
        .route("/complete", post(complete_trip))
}

async fn create_trip(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<CreateTripRequest>,
) -> ServiceResponse<TripInfo> {
    TripController::new(state.store.clone())
        .create_trip(&caller, request)
        .await
}

async fn get_own_trips(
    State(state): State<AppState>,
    caller: Caller,
) -> ServiceResponse<Vec<TripInfo>> {
    TripController::new(state.store.clone())
        .get_own_trips(&caller)
        .await
}

async fn get_trips(
    State(state): State<AppState>,
    caller: Caller,
) -> ServiceResponse<Vec<TripInfo>> {
    TripController::new(state.store.clone())
        .get_trips(&caller)
        .await
}

async fn cancel_trip(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<CancelTripRequest>,
) -> ServiceResponse<TripInfo> {
    TripController::new(state.store.clone())
        .cancel_own_trip(&caller, request.trip_id)
        .await
}

async fn stop_car(State(state): State<AppState>, caller: Caller) -> ServiceResponse<TripInfo> {
    TripController::new(state.store.clone())
        .stop_car(&caller)
        .await
}

async fn attach_service(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<TripServiceRequest>,
) -> ServiceResponse<TripInfo> {
    TripController::new(state.store.clone())
        .attach_service(&caller, request.trip_id, request.service_id)
        .await
}

async fn detach_service(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<TripServiceRequest>,
) -> ServiceResponse<TripInfo> {
    TripController::new(state.store.clone())
        .detach_service(&caller, request.trip_id, request.service_id)
        .await
}

async fn advance_trip(
    State(state): State<AppState>,
    Json(request): Json<DeviceRequest>,
) -> ServiceResponse<TripInfo> {
    TripController::new(state.store.clone())
        .advance_trip(&request.device_id)
        .await
}

async fn complete_trip(
    State(state): State<AppState>,
    Json(request): Json<DeviceRequest>,
) -> ServiceResponse<TripInfo> {
    TripController::new(state.store.clone())
        .complete_trip(&request.device_id)
        .await
}
