pub mod admin;
pub mod auth;
pub mod learning;
pub mod pages;
pub mod status;
