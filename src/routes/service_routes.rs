//! Rutas HTTP del catálogo de servicios

use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::service_controller::ServiceController;
use crate::dto::response::ServiceResponse;
use crate::dto::service_dto::{CreateServiceRequest, EditServiceRequest, ServiceInfo};
use crate::state::AppState;
use crate::utils::guard::Caller;

pub fn create_service_router() -> Router<AppState> {
    Router::new()
        .route("/services", get(get_services))
        .route("/:id", get(resolve_service))
        .route("/create", post(create_service))
        .route("/edit", post(edit_service))
        .route("/delete/:id", delete(delete_service))
}

async fn get_services(State(state): State<AppState>) -> ServiceResponse<Vec<ServiceInfo>> {
    ServiceController::new(state.store.clone())
        .get_services()
        .await
}

async fn resolve_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ServiceResponse<ServiceInfo> {
    ServiceController::new(state.store.clone()).resolve(id).await
}

async fn create_service(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<CreateServiceRequest>,
) -> ServiceResponse<ServiceInfo> {
    ServiceController::new(state.store.clone())
        .create_service(&caller, request)
        .await
}

async fn edit_service(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<EditServiceRequest>,
) -> ServiceResponse<ServiceInfo> {
    ServiceController::new(state.store.clone())
        .edit_service(&caller, request)
        .await
}

async fn delete_service(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> ServiceResponse<()> {
    ServiceController::new(state.store.clone())
        .delete_service(&caller, id)
        .await
}
