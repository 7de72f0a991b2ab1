//! Services module
//!
//! Este módulo contiene la lógica de negocio de la aplicación.
//! `contract_lifecycle` y `maintenance_calculator` son puros; el resto de
//! servicios orquestan los repositorios, el almacén de fotos y la autenticación.

pub mod auth_service;
pub mod car_service;
pub mod contract_lifecycle;
pub mod contract_service;
pub mod entretien_service;
pub mod jwt_service;
pub mod maintenance_calculator;
pub mod photo_store;

pub use auth_service::AuthService;
pub use car_service::CarService;
pub use contract_service::ContractService;
pub use entretien_service::EntretienService;
pub use jwt_service::JwtService;
pub use photo_store::{LocalPhotoStore, PhotoStore};
