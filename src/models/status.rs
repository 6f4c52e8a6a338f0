//! Modelo de estados
//!
//! Las dos máquinas de estados finitos (Trip y Car) y sus tablas de
//! transición. Mapean a los ENUM de PostgreSQL `trip_status` y `car_status`.

use serde::{Deserialize, Serialize};
use sqlx::Type;

/// Estado del viaje - mapea al ENUM trip_status
///
/// Camino feliz: `Created → InProgress → WaitingForPassenger → Completed`.
/// `Cancelled` solo es alcanzable desde `Created` o `InProgress`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "trip_status", rename_all = "snake_case")]
pub enum TripStatus {
    Created,
    InProgress,
    WaitingForPassenger,
    Completed,
    Cancelled,
}

impl TripStatus {
    /// Tabla de transiciones legales del viaje
    pub fn can_transition_to(&self, next: TripStatus) -> bool {
        use TripStatus::*;
        matches!(
            (self, next),
            (Created, InProgress)
                | (InProgress, WaitingForPassenger)
                | (WaitingForPassenger, Completed)
                | (Created, Cancelled)
                | (InProgress, Cancelled)
        )
    }

    /// Los estados terminales no admiten ninguna transición de salida
    pub fn is_terminal(&self) -> bool {
        matches!(self, TripStatus::Completed | TripStatus::Cancelled)
    }

    /// Un viaje activo mantiene reclamado su coche
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            TripStatus::InProgress | TripStatus::WaitingForPassenger
        )
    }

    /// Los servicios solo pueden modificarse antes de llegar a destino
    pub fn allows_service_changes(&self) -> bool {
        matches!(self, TripStatus::Created | TripStatus::InProgress)
    }
}

/// Estado del coche - mapea al ENUM car_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "car_status", rename_all = "snake_case")]
pub enum CarStatus {
    Inactive,
    Idle,
    EnRoute,
    OnTrip,
    WaitingForPassenger,
    Maintenance,
    Danger,
}

impl CarStatus {
    /// `Idle` es el único estado desde el que un viaje nuevo puede
    /// reclamar el coche
    pub fn is_claimable(&self) -> bool {
        matches!(self, CarStatus::Idle)
    }

    /// `Maintenance`/`Danger` excluyen asignación hasta que un
    /// administrador o la señal del dispositivo lo libere
    pub fn is_out_of_service(&self) -> bool {
        matches!(
            self,
            CarStatus::Inactive | CarStatus::Maintenance | CarStatus::Danger
        )
    }
}
