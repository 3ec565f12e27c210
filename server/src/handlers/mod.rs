use crate::connection::ws_index;
use crate::handlers::status::status;
use actix_web::web;

mod status;

pub fn root(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(ws_index)))
        .service(web::resource("/status").route(web::get().to(status)));
}
