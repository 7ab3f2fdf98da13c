use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct Health {
    pub status: &'static str,
}

/// `{"success": true}` body shared by the mutating endpoints.
#[derive(Serialize, Debug)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Serialize, Debug)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Serialize, Debug)]
pub struct ValueResponse {
    pub value: String,
}
