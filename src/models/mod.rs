pub mod admin;
pub mod auth;
pub mod care;
pub mod common;
pub mod plan;
pub mod subscription;
pub mod webhook;
