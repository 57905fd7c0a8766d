pub mod middleware;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct FirebaseErrorResponse {
    pub error: FirebaseErrorDetails,
}

/// The `google.rpc.Status` shaped error body returned by Google REST APIs.
#[derive(Debug, Clone, Deserialize)]
pub struct FirebaseErrorDetails {
    pub code: u16,
    pub message: String,
    pub status: Option<String>,
}

impl FirebaseErrorDetails {
    pub fn display_message(&self) -> String {
        match &self.status {
            Some(status) => format!("{} (code: {}, status: {})", self.message, self.code, status),
            None => format!("{} (code: {})", self.message, self.code),
        }
    }
}

impl FirebaseErrorResponse {
    pub fn display_message(&self) -> String {
        self.error.display_message()
    }
}

pub async fn parse_error_response(response: reqwest::Response, default_msg: &str) -> String {
    let status = response.status();
    match response.json::<FirebaseErrorResponse>().await {
        Ok(error_resp) => error_resp.display_message(),
        Err(_) => format!("{}: {}", default_msg, status),
    }
}
