//! Voice vendor client — places the outbound demo call.

use voxlead_core::config::VoiceConfig;
use voxlead_core::error::{Result, VoxleadError};
use voxlead_core::validate::normalize_phone;

/// Client for the vendor's outbound-call endpoint.
pub struct VoiceClient {
    config: VoiceConfig,
    http: reqwest::Client,
}

impl VoiceClient {
    pub fn new(config: VoiceConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// True iff the vendor endpoint and credentials are all present.
    pub fn is_configured(&self) -> bool {
        !self.config.base_url.is_empty()
            && !self.config.api_key.is_empty()
            && !self.config.agent_id.is_empty()
            && !self.config.agent_phone_id.is_empty()
    }

    /// Place an outbound call to `phone`. Returns the vendor's response
    /// body on success.
    pub async fn place_call(&self, phone: &str, name: &str) -> Result<serde_json::Value> {
        if !self.is_configured() {
            return Err(VoxleadError::Config(
                "voice vendor not configured (base_url, api_key, agent ids)".into(),
            ));
        }

        let body = serde_json::json!({
            "agent_id": self.config.agent_id,
            "agent_phone_number_id": self.config.agent_phone_id,
            "to_number": normalize_phone(phone),
            "customer": { "name": if name.is_empty() { "Guest" } else { name } },
            "language": self.config.language,
            "metadata": { "source": self.config.source_tag },
        });

        let resp = self
            .http
            .post(&self.config.base_url)
            .header("X-Api-Key", &self.config.api_key)
            .json(&body)
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| VoxleadError::Channel(format!("Voice call failed: {e}")))?;

        if resp.status().is_success() {
            let data = resp
                .json::<serde_json::Value>()
                .await
                .unwrap_or(serde_json::Value::Null);
            tracing::info!("📞 Outbound call placed to {}", normalize_phone(phone));
            Ok(data)
        } else {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            Err(VoxleadError::Channel(format!(
                "Voice API error {status}: {text}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_configured() {
        let mut config = VoiceConfig::default();
        assert!(!VoiceClient::new(config.clone()).is_configured());

        config.base_url = "https://voice.example.com/v1/outbound-call".into();
        config.api_key = "key".into();
        config.agent_id = "agent".into();
        config.agent_phone_id = "phone".into();
        assert!(VoiceClient::new(config).is_configured());
    }

    #[tokio::test]
    async fn test_place_call_unconfigured_is_config_error() {
        let client = VoiceClient::new(VoiceConfig::default());
        let err = client.place_call("+919876543210", "Asha").await.unwrap_err();
        assert!(matches!(err, VoxleadError::Config(_)));
    }
}
