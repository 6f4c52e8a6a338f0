//! DTOs del catálogo de servicios

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::service::ServiceRecord;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateServiceRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(length(min = 1, max = 200))]
    pub command: String,

    pub price: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EditServiceRequest {
    pub service_id: Uuid,

    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 200))]
    pub command: Option<String>,

    pub price: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub id: Uuid,
    pub name: String,
    pub command: String,
    pub price: Decimal,
}

impl From<ServiceRecord> for ServiceInfo {
    fn from(service: ServiceRecord) -> Self {
        Self {
            id: service.id,
            name: service.name,
            command: service.command,
            price: service.price,
        }
    }
}
