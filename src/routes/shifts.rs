use actix_web::web;

use crate::handlers::shifts;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/shifts")
            .route("", web::post().to(shifts::create_shift))
            .route("/overlaps", web::post().to(shifts::find_overlaps))
            .route("/{id}", web::put().to(shifts::update_shift)),
    );
}
