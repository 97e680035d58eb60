//! Store methods for the signed-up flag, profile and auth token.

use crate::{auth::UserProfile, error::CrbResult, types::keys};

use super::ClientStore;

impl ClientStore {
    pub fn is_signed_up(&self) -> CrbResult<bool> {
        Ok(self.get_json::<bool>(keys::SIGNED_UP)?.unwrap_or(false))
    }

    pub fn set_signed_up(&self) -> CrbResult<()> {
        self.set_json(keys::SIGNED_UP, &true)
    }

    pub fn load_profile(&self) -> CrbResult<Option<UserProfile>> {
        self.get_json(keys::PROFILE)
    }

    pub fn save_profile(&self, profile: &UserProfile) -> CrbResult<()> {
        self.set_json(keys::PROFILE, profile)
    }

    /// The token is kept as a bare string, not JSON.
    pub fn token(&self) -> CrbResult<Option<String>> {
        self.get_raw(keys::TOKEN)
    }

    pub fn save_token(&self, token: &str) -> CrbResult<()> {
        self.set_raw(keys::TOKEN, token)
    }

    pub fn clear_token(&self) -> CrbResult<()> {
        self.remove(keys::TOKEN)
    }
}
