pub mod admin_service;
pub mod audit;
pub mod auth_service;
pub mod interest_service;
pub mod profile_service;
pub mod seed;
pub mod token_service;
