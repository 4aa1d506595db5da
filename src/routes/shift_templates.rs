use actix_web::web;

use crate::handlers::shift_templates;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/shift-templates")
            .route("", web::get().to(shift_templates::get_templates))
            .route("/import", web::post().to(shift_templates::import_templates))
            .route("/validate", web::post().to(shift_templates::validate_schedule)),
    );
}
