// User profile endpoints

use tracing::debug;

use crate::client::RestClient;
use crate::error::Error;
use crate::models::EditProfileRequest;

impl RestClient {
    /// Update the current user's profile.
    ///
    /// `POST /users/edit-profile`
    pub async fn edit_user_profile(&self, request: &EditProfileRequest) -> Result<(), Error> {
        debug!(name = %request.name, "editing profile");
        let _: serde_json::Value = self.post("/users/edit-profile", request).await?;
        Ok(())
    }
}
