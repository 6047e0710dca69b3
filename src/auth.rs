use async_trait::async_trait;
use pgwire::api::auth::{AuthSource, LoginInfo, Password};
use pgwire::error::PgWireResult;

/// Single shared secret for the cleartext password exchange. Real
/// identity lives with the external auth collaborator; this only keeps
/// strangers off the port.
#[derive(Debug)]
pub struct InspectdAuthSource {
    password: String,
}

impl InspectdAuthSource {
    pub fn new(password: String) -> Self {
        Self { password }
    }
}

#[async_trait]
impl AuthSource for InspectdAuthSource {
    async fn get_password(&self, _login: &LoginInfo) -> PgWireResult<Password> {
        Ok(Password::new(None, self.password.as_bytes().to_vec()))
    }
}
