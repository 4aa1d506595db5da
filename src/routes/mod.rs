use actix_web::web;

use crate::handlers::health;

pub mod admin;
pub mod contracts;
pub mod shift_templates;
pub mod shifts;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health)).service(
        web::scope("/api/v1")
            .configure(contracts::configure)
            .configure(shift_templates::configure)
            .configure(shifts::configure)
            .configure(admin::configure),
    );
}
