pub mod normalizer;
pub mod price_service;
