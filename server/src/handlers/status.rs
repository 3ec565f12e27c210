use crate::admin::{AdminCommand, HubStatus};
use crate::server::{ServerCommand, ServerTx};
use actix_web::{error, web, HttpResponse};

pub async fn status(srv_tx: web::Data<ServerTx>) -> Result<HttpResponse, actix_web::Error> {
    let (tx, rx) = tokio::sync::oneshot::channel::<HubStatus>();

    srv_tx
        .send(ServerCommand::AdminCommand(AdminCommand::GetStatus { tx }))
        .map_err(|_| error::ErrorInternalServerError("Internal Server Error"))?;

    let status = rx
        .await
        .map_err(|_| error::ErrorInternalServerError("Receiver await error"))?;

    Ok(HttpResponse::Ok().json(status))
}
