//! Back-office de location de voitures
//!
//! Inventario de coches, contratos de location con fotos y entretien con
//! vencimientos por kilometraje y por fecha.

pub mod config;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use routes::create_router;
pub use state::AppState;
