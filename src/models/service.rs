//! Modelo de Service (entrada del catálogo)
//!
//! Un complemento con nombre (asiento infantil, recogida prioritaria...)
//! con su comando asociado y su contribución al precio. De solo lectura
//! para el orquestador; su ciclo de vida pertenece al administrador.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ServiceRecord {
    pub id: Uuid,
    pub name: String,
    /// Comando que ejecuta el dispositivo del coche al activar el servicio
    pub command: String,
    pub price: Decimal,
}

impl ServiceRecord {
    pub fn new(name: String, command: String, price: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            command,
            price,
        }
    }
}
