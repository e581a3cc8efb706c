// Channel endpoints
//
// Channels are listed per network; everything else is addressed by
// channel id under `/chatChannels/{id}`.

use serde_json::json;
use tracing::{debug, warn};

use crate::client::{RequestFilter, RestClient};
use crate::error::Error;
use crate::models::{ChannelResponse, MentionableUser, UserSearchResult};

impl RestClient {
    /// List the chat channels of a network.
    ///
    /// `GET /networks/{network_id}/chatChannels`
    pub async fn fetch_channels(&self, network_id: &str) -> Result<Vec<ChannelResponse>, Error> {
        debug!(network_id, "fetching channels");
        self.get(&format!("/networks/{network_id}/chatChannels"), None)
            .await
    }

    /// Join a channel as the current user.
    ///
    /// `POST /chatChannels/{channel_id}/join`
    pub async fn join_channel(&self, channel_id: &str) -> Result<u16, Error> {
        debug!(channel_id, "joining channel");
        self.post_status(&format!("/chatChannels/{channel_id}/join"))
            .await
    }

    /// Mark every message in a channel as read for `user_id`.
    ///
    /// `PUT /chatChannels/{channel_id}/messages/mark-as-read` with `{"id": user_id}`
    pub async fn mark_all_messages_as_read(
        &self,
        channel_id: &str,
        user_id: &str,
    ) -> Result<u16, Error> {
        debug!(channel_id, user_id, "marking channel read");
        self.put_status(
            &format!("/chatChannels/{channel_id}/messages/mark-as-read"),
            &json!({ "id": user_id }),
        )
        .await
    }

    /// Users that can be @-mentioned in a channel, filtered by `search`.
    ///
    /// Failures are absorbed: the mention picker shows nothing rather than
    /// an error.
    pub async fn search_mentionable_users(
        &self,
        channel_id: &str,
        search: &str,
    ) -> Vec<MentionableUser> {
        let filter = RequestFilter::from(search);
        match self
            .get(
                &format!("/chatChannels/{channel_id}/mentionable-users"),
                Some(&filter),
            )
            .await
        {
            Ok(users) => users,
            Err(e) => {
                warn!(channel_id, error = %e, "mentionable user search failed");
                Vec::new()
            }
        }
    }

    /// Look up ZERO users by their Matrix ids.
    ///
    /// `GET /matrix/users/zero?matrixIds=...`
    pub async fn get_zero_users(
        &self,
        matrix_ids: &[String],
    ) -> Result<Vec<UserSearchResult>, Error> {
        debug!(count = matrix_ids.len(), "fetching zero users by matrix id");
        let query: Vec<(&str, &str)> = matrix_ids
            .iter()
            .map(|id| ("matrixIds", id.as_str()))
            .collect();
        self.get_query("/matrix/users/zero", &query).await
    }
}
