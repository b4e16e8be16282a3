pub mod dto;
pub mod error;
pub mod model;
pub mod reconcile;
pub mod service;
