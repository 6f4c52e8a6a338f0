//! Adaptador del catálogo de servicios
//!
//! `resolve` es la consulta pura que usa el orquestador; el resto es el
//! CRUD de administrador que mantiene el catálogo.

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::dto::response::ServiceResponse;
use crate::dto::service_dto::{CreateServiceRequest, EditServiceRequest, ServiceInfo};
use crate::models::service::ServiceRecord;
use crate::store::{DispatchStore, StoreTx};
use crate::utils::errors::{AppError, AppResult};
use crate::utils::guard::{self, Caller};

pub struct ServiceController<S> {
    store: Arc<S>,
}

impl<S: DispatchStore> ServiceController<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Resolución pura de una entrada del catálogo
    pub async fn resolve(&self, service_id: Uuid) -> ServiceResponse<ServiceInfo> {
        ServiceResponse::from_result("resolve_service", self.try_resolve(service_id).await)
    }

    async fn try_resolve(&self, service_id: Uuid) -> AppResult<ServiceInfo> {
        let mut tx = self.store.begin().await?;
        let service = tx
            .service_by_id(service_id)
            .await?
            .ok_or(AppError::ServiceNotFound)?;
        Ok(ServiceInfo::from(service))
    }

    pub async fn get_services(&self) -> ServiceResponse<Vec<ServiceInfo>> {
        ServiceResponse::from_result("get_services", self.try_get_services().await)
    }

    async fn try_get_services(&self) -> AppResult<Vec<ServiceInfo>> {
        let mut tx = self.store.begin().await?;
        let services = tx.list_services().await?;
        Ok(services.into_iter().map(ServiceInfo::from).collect())
    }

    pub async fn create_service(
        &self,
        caller: &Caller,
        request: CreateServiceRequest,
    ) -> ServiceResponse<ServiceInfo> {
        ServiceResponse::from_result(
            "create_service",
            self.try_create_service(caller, request).await,
        )
    }

    async fn try_create_service(
        &self,
        caller: &Caller,
        request: CreateServiceRequest,
    ) -> AppResult<ServiceInfo> {
        guard::require_administrator(caller)?;
        request.validate()?;

        let service = ServiceRecord::new(request.name, request.command, request.price);
        let mut tx = self.store.begin().await?;
        tx.insert_service(&service).await?;
        tx.commit().await?;
        Ok(ServiceInfo::from(service))
    }

    pub async fn edit_service(
        &self,
        caller: &Caller,
        request: EditServiceRequest,
    ) -> ServiceResponse<ServiceInfo> {
        ServiceResponse::from_result(
            "edit_service",
            self.try_edit_service(caller, request).await,
        )
    }

    async fn try_edit_service(
        &self,
        caller: &Caller,
        request: EditServiceRequest,
    ) -> AppResult<ServiceInfo> {
        guard::require_administrator(caller)?;
        request.validate()?;

        let mut tx = self.store.begin().await?;
        let mut service = tx
            .service_by_id(request.service_id)
            .await?
            .ok_or(AppError::ServiceNotFound)?;

        service.name = request.name.unwrap_or(service.name);
        service.command = request.command.unwrap_or(service.command);
        service.price = request.price.unwrap_or(service.price);

        tx.update_service(&service).await?;
        tx.commit().await?;
        Ok(ServiceInfo::from(service))
    }

    pub async fn delete_service(&self, caller: &Caller, service_id: Uuid) -> ServiceResponse<()> {
        ServiceResponse::from_result(
            "delete_service",
            self.try_delete_service(caller, service_id).await,
        )
    }

    async fn try_delete_service(&self, caller: &Caller, service_id: Uuid) -> AppResult<()> {
        guard::require_administrator(caller)?;

        let mut tx = self.store.begin().await?;
        tx.service_by_id(service_id)
            .await?
            .ok_or(AppError::ServiceNotFound)?;
        tx.delete_service(service_id).await?;
        tx.commit().await?;
        Ok(())
    }
}
