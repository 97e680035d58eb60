//! Authentication backend contract and its two clients.
//!
//!   POST /auth/login   {email, password}                          -> {user, token}
//!   POST /auth/signup  {fullName, email, phone, idNumber, password} -> {user, token}
//!   POST /auth/logout                                              -> (empty)
//!   GET  /auth/me                                                  -> {user}
//!
//! `HttpAuthClient` speaks this contract over REST. `LocalAuth` keeps
//! accounts in process for offline runs and tests.

use reqwest::blocking::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{collections::HashMap, sync::Mutex, time::Duration};

use crate::error::{CrbError, CrbResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id:        String,
    pub full_name: String,
    pub email:     String,
    pub phone:     String,
    pub id_number: String,
}

/// The subset of the user kept on the client after sign-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub full_name: String,
    pub phone:     String,
    pub id_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub email:    String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupData {
    pub full_name: String,
    pub email:     String,
    pub phone:     String,
    pub id_number: String,
    pub password:  String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user:  User,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    pub user: User,
}

/// The contract every auth backend must fulfil.
pub trait AuthApi {
    fn login(&self, credentials: &LoginCredentials) -> CrbResult<AuthResponse>;

    fn signup(&self, data: &SignupData) -> CrbResult<AuthResponse>;

    fn logout(&self, token: Option<&str>) -> CrbResult<()>;

    fn current_user(&self, token: &str) -> CrbResult<User>;
}

impl<A: AuthApi + ?Sized> AuthApi for Box<A> {
    fn login(&self, credentials: &LoginCredentials) -> CrbResult<AuthResponse> {
        (**self).login(credentials)
    }

    fn signup(&self, data: &SignupData) -> CrbResult<AuthResponse> {
        (**self).signup(data)
    }

    fn logout(&self, token: Option<&str>) -> CrbResult<()> {
        (**self).logout(token)
    }

    fn current_user(&self, token: &str) -> CrbResult<User> {
        (**self).current_user(token)
    }
}

// ── REST client ─────────────────────────────────────────────────────

pub struct HttpAuthClient {
    client:   Client,
    base_url: String,
}

impl HttpAuthClient {
    pub fn new(base_url: &str, timeout: Duration) -> CrbResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send(&self, request: RequestBuilder, token: Option<&str>) -> CrbResult<reqwest::blocking::Response> {
        let request = match token {
            Some(t) => request.bearer_auth(t),
            None => request,
        };
        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(CrbError::AuthRejected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> CrbResult<T> {
        let response = self.send(self.client.post(self.url(path)).json(body), None)?;
        Ok(response.json()?)
    }
}

impl AuthApi for HttpAuthClient {
    fn login(&self, credentials: &LoginCredentials) -> CrbResult<AuthResponse> {
        self.post_json("/auth/login", credentials)
    }

    fn signup(&self, data: &SignupData) -> CrbResult<AuthResponse> {
        self.post_json("/auth/signup", data)
    }

    fn logout(&self, token: Option<&str>) -> CrbResult<()> {
        self.send(self.client.post(self.url("/auth/logout")), token)?;
        Ok(())
    }

    fn current_user(&self, token: &str) -> CrbResult<User> {
        let response = self.send(self.client.get(self.url("/auth/me")), Some(token))?;
        let me: MeResponse = response.json()?;
        Ok(me.user)
    }
}

// ── In-process backend ──────────────────────────────────────────────

#[derive(Default)]
struct LocalAccounts {
    by_email: HashMap<String, (User, String)>,
    sessions: HashMap<String, String>, // token -> email
}

/// Accounts held in memory. Tokens are random UUIDs.
#[derive(Default)]
pub struct LocalAuth {
    inner: Mutex<LocalAccounts>,
}

impl LocalAuth {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_accounts<T>(&self, f: impl FnOnce(&mut LocalAccounts) -> CrbResult<T>) -> CrbResult<T> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| CrbError::Other(anyhow::anyhow!("local auth state poisoned")))?;
        f(&mut guard)
    }

    pub fn account_count(&self) -> usize {
        self.with_accounts(|a| Ok(a.by_email.len())).unwrap_or(0)
    }
}

fn rejected(status: u16, message: &str) -> CrbError {
    CrbError::AuthRejected { status, message: message.to_string() }
}

fn open_session(accounts: &mut LocalAccounts, user: User) -> AuthResponse {
    let token = uuid::Uuid::new_v4().to_string();
    accounts.sessions.insert(token.clone(), user.email.clone());
    AuthResponse { user, token }
}

impl AuthApi for LocalAuth {
    fn login(&self, credentials: &LoginCredentials) -> CrbResult<AuthResponse> {
        self.with_accounts(|accounts| {
            let user = match accounts.by_email.get(&credentials.email) {
                Some((user, password)) if *password == credentials.password => user.clone(),
                _ => return Err(rejected(401, "Invalid credentials")),
            };
            Ok(open_session(accounts, user))
        })
    }

    fn signup(&self, data: &SignupData) -> CrbResult<AuthResponse> {
        self.with_accounts(|accounts| {
            if accounts.by_email.contains_key(&data.email) {
                return Err(rejected(409, "Account already exists"));
            }
            let user = User {
                id:        uuid::Uuid::new_v4().to_string(),
                full_name: data.full_name.clone(),
                email:     data.email.clone(),
                phone:     data.phone.clone(),
                id_number: data.id_number.clone(),
            };
            accounts
                .by_email
                .insert(data.email.clone(), (user.clone(), data.password.clone()));
            Ok(open_session(accounts, user))
        })
    }

    fn logout(&self, token: Option<&str>) -> CrbResult<()> {
        self.with_accounts(|accounts| {
            if let Some(t) = token {
                accounts.sessions.remove(t);
            }
            Ok(())
        })
    }

    fn current_user(&self, token: &str) -> CrbResult<User> {
        self.with_accounts(|accounts| {
            accounts
                .sessions
                .get(token)
                .and_then(|email| accounts.by_email.get(email))
                .map(|(user, _)| user.clone())
                .ok_or_else(|| rejected(401, "Session expired"))
        })
    }
}
