//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::Repositories;
use crate::services::{AuthService, CarService, ContractService, EntretienService, PhotoStore};

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub repositories: Repositories,
    pub photos: Arc<dyn PhotoStore>,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(
        config: EnvironmentConfig,
        repositories: Repositories,
        photos: Arc<dyn PhotoStore>,
        auth: AuthService,
    ) -> Self {
        Self {
            config,
            repositories,
            photos,
            auth: Arc::new(auth),
        }
    }

    pub fn cars(&self) -> CarService {
        CarService::new(&self.repositories, self.photos.clone())
    }

    pub fn contracts(&self) -> ContractService {
        ContractService::new(&self.repositories, self.photos.clone())
    }

    pub fn entretiens(&self) -> EntretienService {
        EntretienService::new(&self.repositories)
    }
}
