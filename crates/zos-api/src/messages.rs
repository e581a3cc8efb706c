// Message endpoints
//
// History, send/edit/delete, attachment upload, and link unfurling.

use serde_json::json;
use tracing::debug;

use crate::client::{RequestFilter, RestClient, UploadFile};
use crate::error::Error;
use crate::models::{
    LinkPreview, MediaResponse, MessageResponse, MessagesResponse, SendMessageRequest,
};

impl RestClient {
    /// One page of a channel's history.
    ///
    /// `GET /chatChannels/{channel_id}/messages`, with `lastCreatedAt` to
    /// page backwards from an older message.
    pub async fn fetch_messages(
        &self,
        channel_id: &str,
        last_created_at: Option<i64>,
    ) -> Result<MessagesResponse, Error> {
        debug!(channel_id, ?last_created_at, "fetching messages");
        let path = format!("/chatChannels/{channel_id}/messages");
        match last_created_at {
            Some(ts) => {
                self.get_query(&path, &[("lastCreatedAt", ts.to_string())])
                    .await
            }
            None => self.get(&path, None).await,
        }
    }

    /// Post a message to a channel.
    ///
    /// `POST /chatChannels/{channel_id}/message`
    pub async fn send_message(
        &self,
        channel_id: &str,
        message: &str,
        mentioned_user_ids: &[String],
    ) -> Result<MessageResponse, Error> {
        debug!(channel_id, "sending message");
        let body = SendMessageRequest {
            message: message.to_owned(),
            mentioned_user_ids: mentioned_user_ids.to_vec(),
        };
        self.post(&format!("/chatChannels/{channel_id}/message"), &body)
            .await
    }

    /// Replace the text of a message.
    ///
    /// `PUT /chatChannels/{channel_id}/message` with `{"message": {id, message, mentionedUserIds}}`
    pub async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        message: &str,
        mentioned_user_ids: &[String],
    ) -> Result<u16, Error> {
        debug!(channel_id, message_id, "editing message");
        self.put_status(
            &format!("/chatChannels/{channel_id}/message"),
            &json!({
                "message": {
                    "id": message_id,
                    "message": message,
                    "mentionedUserIds": mentioned_user_ids,
                }
            }),
        )
        .await
    }

    /// Delete a message.
    ///
    /// `DELETE /chatChannels/{channel_id}/message` with `{"message": {"id": ...}}`
    pub async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<u16, Error> {
        debug!(channel_id, message_id, "deleting message");
        self.delete_status(
            &format!("/chatChannels/{channel_id}/message"),
            Some(&json!({ "message": { "id": message_id } })),
        )
        .await
    }

    /// Upload an attachment into a channel.
    ///
    /// `POST /upload/chatChannels/{channel_id}/message` (multipart, `file` part)
    pub async fn upload_file_message(
        &self,
        channel_id: &str,
        file: UploadFile,
    ) -> Result<MediaResponse, Error> {
        debug!(channel_id, file = %file.file_name, "uploading file");
        self.upload(&format!("/upload/chatChannels/{channel_id}/message"), file)
            .await
    }

    /// Unfurl a URL.
    ///
    /// `GET /linkPreviews?filter={"url": ...}`
    pub async fn get_link_preview(&self, url: &str) -> Result<LinkPreview, Error> {
        debug!(url, "fetching link preview");
        let filter = RequestFilter::from(json!({ "url": url }));
        self.get("/linkPreviews", Some(&filter)).await
    }
}
