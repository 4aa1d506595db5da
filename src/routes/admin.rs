use actix_web::web;

use crate::handlers::admin;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route(
                "/expiration-sweep",
                web::post().to(admin::run_expiration_sweep),
            )
            .route("/outbox/relay", web::post().to(admin::relay_outbox)),
    );
}
