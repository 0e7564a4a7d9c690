pub mod admin_dto;
pub mod auth_dto;
pub mod export_dto;
pub mod quiz_dto;
