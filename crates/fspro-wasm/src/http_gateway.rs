use async_trait::async_trait;
use fspro_chat::gateway::{
    chat_request, parse_chat_response, parse_summarize_response, summarize_request,
};
use fspro_chat::{ChatGateway, ChatReply, ClientConfig, NetworkError, SessionId};
use gloo_net::http::{Request, Response};
use serde::Serialize;

/// `fetch`-backed gateway to the responder's two endpoints
pub struct HttpGateway {
    chat_url: String,
    summarize_url: String,
}

impl HttpGateway {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            chat_url: config.chat_url(),
            summarize_url: config.summarize_url(),
        }
    }

    /// POST a JSON body and hand back status and raw text
    async fn post_json<T: Serialize>(&self, url: &str, body: &T) -> Result<(u16, String), NetworkError> {
        let response: Response = Request::post(url)
            .json(body)
            .map_err(|e| NetworkError::Transport(format!("Failed to encode request: {}", e)))?
            .send()
            .await
            .map_err(|e| NetworkError::Transport(format!("Request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| NetworkError::Transport(format!("Failed to read response: {}", e)))?;

        Ok((status, text))
    }
}

#[async_trait(?Send)]
impl ChatGateway for HttpGateway {
    async fn send_message(
        &self,
        text: &str,
        session_id: Option<&SessionId>,
    ) -> Result<ChatReply, NetworkError> {
        let (status, body) = self
            .post_json(&self.chat_url, &chat_request(text, session_id))
            .await?;
        parse_chat_response(status, &body)
    }

    async fn summarize_title(&self, session_id: &SessionId) -> Result<String, NetworkError> {
        let (status, body) = self
            .post_json(&self.summarize_url, &summarize_request(session_id))
            .await?;
        parse_summarize_response(status, &body)
    }
}
