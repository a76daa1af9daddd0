/// JWT Authentication Middleware
///
/// Pulls the access token off the request through the transport binding,
/// validates it with expiry enforced and injects the `IdentityClaims` into
/// request extensions for route handlers.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::error::AppError;
use crate::rotation::RotationProtocol;
use crate::transport::{CookieTransport, TokenTransport};

/// JWT middleware for protecting routes
pub struct JwtMiddleware {
    protocol: RotationProtocol,
    transport: CookieTransport,
}

impl JwtMiddleware {
    pub fn new(protocol: RotationProtocol, transport: CookieTransport) -> Self {
        Self {
            protocol,
            transport,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            protocol: self.protocol.clone(),
            transport: self.transport.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    protocol: RotationProtocol,
    transport: CookieTransport,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let presented = self.transport.extract(req.request());

        let Some(token) = presented.access_token else {
            tracing::warn!(path = %req.path(), "Missing access token");
            return Box::pin(async move { Err(Error::from(AppError::MissingToken)) });
        };

        match self.protocol.authenticate(&token) {
            Ok(claims) => {
                tracing::debug!(
                    subject_id = %claims.subject_id,
                    "Access token validated"
                );
                req.extensions_mut().insert(claims);

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => {
                tracing::warn!(error = %e, "Access token rejected");
                let err = Error::from(AppError::from(e));
                Box::pin(async move { Err(err) })
            }
        }
    }
}
