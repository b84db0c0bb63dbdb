use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::{role::Role, user::User};

#[derive(Deserialize, ToSchema)]
pub struct RegisterReq {
    #[schema(example = "jane@dayflow.io", format = "email")]
    pub email: String,
    #[schema(example = "s3cret!", format = "password")]
    pub password: String,
    #[schema(example = "Jane Doe")]
    pub full_name: Option<String>,
    /// defaults to employee
    pub role: Option<Role>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "jane@dayflow.io", format = "email")]
    pub email: String,
    #[schema(example = "s3cret!", format = "password")]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    /// account email
    pub sub: String,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
}
