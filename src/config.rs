use std::env;

const DEFAULT_APP_ID: &str = "1089";
const DEFAULT_WS_HOST: &str = "wss://ws.derivws.com/websockets/v3";

/// Connection settings for the trading-times feed, taken from the
/// environment (dotenv is loaded by main).
pub struct DerivConfig {
    pub app_id: String,
    pub ws_host: String,
}

impl DerivConfig {
    pub fn from_env() -> Self {
        let app_id = env::var("DERIV_APP_ID").unwrap_or_else(|_| DEFAULT_APP_ID.to_string());
        let ws_host = env::var("DERIV_WS_URL").unwrap_or_else(|_| DEFAULT_WS_HOST.to_string());

        Self { app_id, ws_host }
    }

    pub fn websocket_url(&self) -> String {
        format!("{}?app_id={}", self.ws_host, self.app_id)
    }
}
