//! cab_dispatch - motor de orquestación de viajes para una flota de
//! taxis autónomos
//!
//! El núcleo son las dos máquinas de estados emparejadas (Trip y Car),
//! las reglas que las mantienen consistentes entre sí y la disciplina de
//! concurrencia que impide que dos viajes reclamen el mismo coche.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;
