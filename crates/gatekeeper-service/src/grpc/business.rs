//! Business methods.
//!
//! The business surface carries no logic of its own: every method accepts
//! `Nothing` and returns `Nothing` once the interceptor has admitted the call.

use proto_gen::gatekeeper::Nothing;
use tonic::{Request, Response, Status};

#[derive(Debug, Clone, Copy, Default)]
pub struct BusinessMethods;

impl BusinessMethods {
    pub async fn check(&self, _request: Request<Nothing>) -> Result<Response<Nothing>, Status> {
        Ok(Response::new(Nothing::default()))
    }

    pub async fn add(&self, _request: Request<Nothing>) -> Result<Response<Nothing>, Status> {
        Ok(Response::new(Nothing::default()))
    }

    pub async fn test(&self, _request: Request<Nothing>) -> Result<Response<Nothing>, Status> {
        Ok(Response::new(Nothing::default()))
    }
}
