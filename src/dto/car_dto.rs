use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::validation::validate_not_blank;

// Request para crear un coche
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCarRequest {
    #[validate(length(min = 1, max = 100), custom = "validate_not_blank")]
    pub name: String,

    #[validate(length(min = 1, max = 50), custom = "validate_not_blank")]
    pub model: String,

    #[validate(range(min = 1900, max = 2100))]
    pub year: i32,

    #[serde(default)]
    #[validate(range(min = 0, max = 10000000))]
    pub mileage: i64,
}

// Request para actualizar un coche (campos opcionales)
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCarRequest {
    #[validate(length(min = 1, max = 100), custom = "validate_not_blank")]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 50), custom = "validate_not_blank")]
    pub model: Option<String>,

    #[validate(range(min = 1900, max = 2100))]
    pub year: Option<i32>,

    #[validate(range(min = 0, max = 10000000))]
    pub mileage: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CarQuery {
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ModelExistsResponse {
    pub exists: bool,
}
