pub mod admin;
pub mod contracts;
pub mod health;
pub mod shared;
pub mod shift_templates;
pub mod shifts;
