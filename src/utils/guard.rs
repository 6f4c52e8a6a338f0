//! Predicados de autorización
//!
//! El orquestador nunca inspecciona credenciales: recibe un `Caller` ya
//! resuelto por el middleware JWT y evalúa aquí, de forma explícita,
//! "es el dueño de este viaje" / "es administrador". Las reglas viven en
//! el punto de llamada, no en metadata declarativa.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::trip::Trip;
use crate::utils::errors::{AppError, AppResult};

/// Rol del usuario autenticado
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Customer,
    Administrator,
}

/// Identidad resuelta del que llama. Siempre se pasa como parámetro
/// explícito a las operaciones del orquestador, nunca como estado ambiente.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_administrator(&self) -> bool {
        self.role == Role::Administrator
    }

    pub fn owns_trip(&self, trip: &Trip) -> bool {
        trip.customer_id == self.user_id
    }
}

/// El caller debe tener rol Customer
pub fn require_customer(caller: &Caller) -> AppResult<()> {
    if caller.role != Role::Customer {
        return Err(AppError::Unauthorized(
            "Customer role required".to_string(),
        ));
    }
    Ok(())
}

/// El caller debe tener rol Administrator
pub fn require_administrator(caller: &Caller) -> AppResult<()> {
    if !caller.is_administrator() {
        return Err(AppError::Unauthorized(
            "Administrator role required".to_string(),
        ));
    }
    Ok(())
}

/// El caller debe ser el dueño del viaje
pub fn require_trip_owner(caller: &Caller, trip: &Trip) -> AppResult<()> {
    if !caller.owns_trip(trip) {
        return Err(AppError::Unauthorized(
            "Trip belongs to another customer".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::trip::Trip;
    use crate::models::Location;
    use rust_decimal::Decimal;

    fn trip_owned_by(customer_id: Uuid) -> Trip {
        Trip::create(
            customer_id,
            Uuid::new_v4(),
            Location::new(50.0, 36.2),
            Location::new(50.1, 36.3),
            Decimal::new(1000, 2),
        )
    }

    #[test]
    fn test_owner_predicate() {
        let owner = Caller::new(Uuid::new_v4(), Role::Customer);
        let stranger = Caller::new(Uuid::new_v4(), Role::Customer);
        let trip = trip_owned_by(owner.user_id);

        assert!(require_trip_owner(&owner, &trip).is_ok());
        assert!(require_trip_owner(&stranger, &trip).is_err());
    }

    #[test]
    fn test_role_predicates() {
        let admin = Caller::new(Uuid::new_v4(), Role::Administrator);
        let customer = Caller::new(Uuid::new_v4(), Role::Customer);

        assert!(require_administrator(&admin).is_ok());
        assert!(require_administrator(&customer).is_err());
        assert!(require_customer(&customer).is_ok());
        assert!(require_customer(&admin).is_err());
    }
}
