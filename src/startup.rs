use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;

use crate::middleware::{JwtMiddleware, LoggerMiddleware};
use crate::rotation::RotationProtocol;
use crate::routes::{current_user, health_check, logout, refresh};
use crate::transport::CookieTransport;

pub fn run(
    listener: TcpListener,
    protocol: RotationProtocol,
    transport: CookieTransport,
) -> Result<Server, std::io::Error> {
    let protocol_data = web::Data::new(protocol.clone());
    let transport_data = web::Data::new(transport.clone());

    let server = HttpServer::new(move || {
        App::new()
            .wrap(LoggerMiddleware)
            .app_data(protocol_data.clone())
            .app_data(transport_data.clone())
            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/auth/refresh", web::post().to(refresh))
            // Protected routes (require a valid access token)
            .service(
                web::scope("/api")
                    .wrap(JwtMiddleware::new(protocol.clone(), transport.clone()))
                    .route("/me", web::get().to(current_user))
                    .route("/logout", web::post().to(logout)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
