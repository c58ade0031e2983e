use docchat_types::{
    AuthResponse, LoginData, OtpVerifyData, RegistrationData, ResendOtpData, User, UserSearchResult,
};
use reqwest::Method;

use crate::client::ApiClient;
use crate::error::{ClientError, Result};

/// Shorter queries are answered locally with no results
pub const MIN_SEARCH_QUERY_LEN: usize = 2;

impl ApiClient {
    /// `GET /user/me`
    ///
    /// A 401 means nobody is signed in and yields `None`; the session has been
    /// cleared by then.
    pub async fn me(&self) -> Result<Option<User>> {
        match self.send_json::<User>(self.request(Method::GET, "/user/me")).await {
            Ok(user) => {
                self.session().set_user(user.clone()).await?;
                Ok(Some(user))
            }
            Err(ClientError::Unauthorized) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Register a new account; the server emails a one-time password
    pub async fn register(&self, data: &RegistrationData) -> Result<()> {
        self.send_ack(self.request(Method::POST, "/user/register").json(data))
            .await
    }

    /// Confirm the one-time password and sign in with the returned user
    pub async fn verify_otp(&self, data: &OtpVerifyData) -> Result<Option<User>> {
        let response: AuthResponse = self
            .send_json(self.request(Method::POST, "/user/verify").json(data))
            .await?;
        self.remember(response).await
    }

    pub async fn resend_otp(&self, data: &ResendOtpData) -> Result<()> {
        self.send_ack(self.request(Method::POST, "/user/resend-otp").json(data))
            .await
    }

    pub async fn login(&self, data: &LoginData) -> Result<Option<User>> {
        let response: AuthResponse = self
            .send_json(self.request(Method::POST, "/user/login").json(data))
            .await?;
        self.remember(response).await
    }

    pub async fn logout(&self) -> Result<()> {
        self.send_ack(self.request(Method::POST, "/user/logout")).await?;
        self.session().clear().await
    }

    /// `GET /user/search?query=`
    pub async fn search_users(&self, query: &str) -> Result<Vec<UserSearchResult>> {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_QUERY_LEN {
            return Ok(Vec::new());
        }
        let request = self
            .request(Method::GET, "/user/search")
            .query(&[("query", query)]);
        self.send_json(request).await
    }

    async fn remember(&self, response: AuthResponse) -> Result<Option<User>> {
        if let Some(user) = &response.user {
            tracing::info!("Signed in as {}", user.email);
            self.session().set_user(user.clone()).await?;
        }
        Ok(response.user)
    }
}
