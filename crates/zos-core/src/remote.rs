// ── Remote API seam ──
//
// Sagas talk to the backend through `RemoteApi` so they can run against
// an in-process fake. `zos_api::RestClient` is the production impl.

use async_trait::async_trait;
use secrecy::SecretString;
use zos_api::models::{
    ChannelResponse, CurrentUserResponse, EditProfileRequest, LinkPreview, MediaResponse,
    MentionableUser, MessageResponse, MessagesResponse, NonceOrAuthorizeResponse,
    UserSearchResult,
};
use zos_api::{RestClient, UploadFile};

use crate::error::CoreError;

#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn fetch_channels(&self, network_id: &str) -> Result<Vec<ChannelResponse>, CoreError>;
    async fn join_channel(&self, channel_id: &str) -> Result<(), CoreError>;
    async fn mark_all_messages_as_read(
        &self,
        channel_id: &str,
        user_id: &str,
    ) -> Result<(), CoreError>;
    async fn search_mentionable_users(&self, channel_id: &str, search: &str)
    -> Vec<MentionableUser>;
    async fn get_zero_users(
        &self,
        matrix_ids: &[String],
    ) -> Result<Vec<UserSearchResult>, CoreError>;

    async fn fetch_messages(
        &self,
        channel_id: &str,
        last_created_at: Option<i64>,
    ) -> Result<MessagesResponse, CoreError>;
    async fn send_message(
        &self,
        channel_id: &str,
        message: &str,
        mentioned_user_ids: &[String],
    ) -> Result<MessageResponse, CoreError>;
    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        message: &str,
        mentioned_user_ids: &[String],
    ) -> Result<(), CoreError>;
    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), CoreError>;
    async fn upload_file_message(
        &self,
        channel_id: &str,
        file: UploadFile,
    ) -> Result<MediaResponse, CoreError>;
    async fn get_link_preview(&self, url: &str) -> Result<LinkPreview, CoreError>;

    async fn nonce_or_authorize(
        &self,
        signed_web3_token: &SecretString,
    ) -> Result<NonceOrAuthorizeResponse, CoreError>;
    async fn fetch_current_user(&self) -> Result<CurrentUserResponse, CoreError>;
    async fn clear_session(&self) -> Result<(), CoreError>;
    async fn edit_user_profile(&self, request: &EditProfileRequest) -> Result<(), CoreError>;
}

#[async_trait]
impl RemoteApi for RestClient {
    async fn fetch_channels(&self, network_id: &str) -> Result<Vec<ChannelResponse>, CoreError> {
        Ok(RestClient::fetch_channels(self, network_id).await?)
    }

    async fn join_channel(&self, channel_id: &str) -> Result<(), CoreError> {
        RestClient::join_channel(self, channel_id).await?;
        Ok(())
    }

    async fn mark_all_messages_as_read(
        &self,
        channel_id: &str,
        user_id: &str,
    ) -> Result<(), CoreError> {
        RestClient::mark_all_messages_as_read(self, channel_id, user_id).await?;
        Ok(())
    }

    async fn search_mentionable_users(
        &self,
        channel_id: &str,
        search: &str,
    ) -> Vec<MentionableUser> {
        RestClient::search_mentionable_users(self, channel_id, search).await
    }

    async fn get_zero_users(
        &self,
        matrix_ids: &[String],
    ) -> Result<Vec<UserSearchResult>, CoreError> {
        Ok(RestClient::get_zero_users(self, matrix_ids).await?)
    }

    async fn fetch_messages(
        &self,
        channel_id: &str,
        last_created_at: Option<i64>,
    ) -> Result<MessagesResponse, CoreError> {
        Ok(RestClient::fetch_messages(self, channel_id, last_created_at).await?)
    }

    async fn send_message(
        &self,
        channel_id: &str,
        message: &str,
        mentioned_user_ids: &[String],
    ) -> Result<MessageResponse, CoreError> {
        Ok(RestClient::send_message(self, channel_id, message, mentioned_user_ids).await?)
    }

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        message: &str,
        mentioned_user_ids: &[String],
    ) -> Result<(), CoreError> {
        RestClient::edit_message(self, channel_id, message_id, message, mentioned_user_ids)
            .await?;
        Ok(())
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), CoreError> {
        RestClient::delete_message(self, channel_id, message_id).await?;
        Ok(())
    }

    async fn upload_file_message(
        &self,
        channel_id: &str,
        file: UploadFile,
    ) -> Result<MediaResponse, CoreError> {
        Ok(RestClient::upload_file_message(self, channel_id, file).await?)
    }

    async fn get_link_preview(&self, url: &str) -> Result<LinkPreview, CoreError> {
        Ok(RestClient::get_link_preview(self, url).await?)
    }

    async fn nonce_or_authorize(
        &self,
        signed_web3_token: &SecretString,
    ) -> Result<NonceOrAuthorizeResponse, CoreError> {
        Ok(RestClient::nonce_or_authorize(self, signed_web3_token).await?)
    }

    async fn fetch_current_user(&self) -> Result<CurrentUserResponse, CoreError> {
        Ok(RestClient::fetch_current_user(self).await?)
    }

    async fn clear_session(&self) -> Result<(), CoreError> {
        RestClient::clear_session(self).await?;
        Ok(())
    }

    async fn edit_user_profile(&self, request: &EditProfileRequest) -> Result<(), CoreError> {
        Ok(RestClient::edit_user_profile(self, request).await?)
    }
}
