use std::future::{ready, Ready};

use actix_web::{
    dev::Payload, error::ErrorUnauthorized, Error, FromRequest, HttpMessage, HttpRequest,
};

use crate::middleware::auth::{Claims, StaffRole};

/// The signed-in staff member. Every catalog and quotation operation is
/// scoped to `agency_id`.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: String,
    pub agency_id: String,
    pub role: StaffRole,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == StaffRole::Admin
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<Claims>() {
            Some(claims) if !claims.agency_id.trim().is_empty() => {
                ready(Ok(AuthenticatedUser {
                    user_id: claims.user_id.clone(),
                    email: claims.sub.clone(),
                    agency_id: claims.agency_id.clone(),
                    role: claims.role,
                }))
            }
            Some(_) => ready(Err(ErrorUnauthorized("Token is not bound to an agency"))),
            None => ready(Err(ErrorUnauthorized("User not authenticated"))),
        }
    }
}
