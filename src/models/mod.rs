//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos del back-office de location.

pub mod auth;
pub mod car;
pub mod contract;
pub mod entretien;
