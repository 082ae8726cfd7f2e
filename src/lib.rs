pub mod application;
pub mod configuration;
pub mod domain;
pub mod repository;
