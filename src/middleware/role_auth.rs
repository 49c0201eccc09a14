use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorForbidden, ErrorUnauthorized},
    Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use log::warn;

use crate::middleware::auth::{Claims, StaffRole};

/// Must be wrapped inside [`super::auth::AuthMiddleware`] so claims are present.
pub struct RequireRole {
    required_role: StaffRole,
}

impl RequireRole {
    pub fn new(role: StaffRole) -> Self {
        RequireRole {
            required_role: role,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequireRoleService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleService {
            service,
            required_role: self.required_role,
        }))
    }
}

pub struct RequireRoleService<S> {
    service: S,
    required_role: StaffRole,
}

impl<S, B> Service<ServiceRequest> for RequireRoleService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let role = req.extensions().get::<Claims>().map(|claims| claims.role);

        match role {
            // Admins may do anything an agent can.
            Some(role) if role == self.required_role || role == StaffRole::Admin => {
                Box::pin(self.service.call(req))
            }
            Some(role) => {
                warn!(
                    "{:?} denied {} {}: requires {:?}",
                    role,
                    req.method(),
                    req.path(),
                    self.required_role
                );
                Box::pin(ready(Err(ErrorForbidden("Insufficient permissions"))))
            }
            None => Box::pin(ready(Err(ErrorUnauthorized("No authorization")))),
        }
    }
}
