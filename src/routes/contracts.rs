use actix_web::web;

use crate::handlers::contracts;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/contracts")
            .route("/{id}/activate", web::post().to(contracts::activate_contract)),
    );
}
