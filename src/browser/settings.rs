//! The API key popup.

use crate::storage::CredentialStore;
use log::{error, warn};
use serde::Deserialize;

pub const SAVED_FEEDBACK_MS: u64 = 2000;
pub const EMPTY_KEY_ALERT: &str = "Please enter a valid API key";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum SettingsRequest {
    Load,
    Save {
        #[serde(rename = "apiKey", default)]
        api_key: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsReply {
    Prefill(Option<String>),
    Alert(String),
    Saved,
}

impl SettingsReply {
    pub fn to_js(&self) -> Result<String, serde_json::Error> {
        Ok(match self {
            SettingsReply::Prefill(key) => format!(
                "window.__syncfloSettings.prefill({});",
                serde_json::to_string(key)?
            ),
            SettingsReply::Alert(message) => {
                format!("alert({});", serde_json::to_string(message)?)
            }
            SettingsReply::Saved => "window.__syncfloSettings.saved();".to_string(),
        })
    }
}

pub async fn handle_request(store: &CredentialStore, request: SettingsRequest) -> SettingsReply {
    match request {
        SettingsRequest::Load => match store.get_key().await {
            Ok(key) => SettingsReply::Prefill(key),
            Err(e) => {
                warn!("Could not read stored API key: {}", e);
                SettingsReply::Prefill(None)
            }
        },
        SettingsRequest::Save { api_key } => {
            let api_key = api_key.trim();
            if api_key.is_empty() {
                return SettingsReply::Alert(EMPTY_KEY_ALERT.to_string());
            }
            match store.set_key(api_key).await {
                Ok(()) => SettingsReply::Saved,
                Err(e) => {
                    error!("Failed to save API key: {}", e);
                    SettingsReply::Alert(format!("Could not save API key: {}", e))
                }
            }
        }
    }
}

pub fn settings_page_html() -> String {
    SETTINGS_HTML.replace("__SAVED_FEEDBACK_MS__", &SAVED_FEEDBACK_MS.to_string())
}

const SETTINGS_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>SyncFlo Answer Settings</title>
  <style>
    body { font-family: Arial, sans-serif; margin: 16px; width: 300px; }
    input { width: 100%; padding: 8px; margin: 8px 0; box-sizing: border-box; }
    button { width: 100%; padding: 8px; border: 0; color: white; background-color: #4285F4; cursor: pointer; }
  </style>
</head>
<body>
  <label for="apiKey">API Key</label>
  <input type="password" id="apiKey" placeholder="Enter your API key" />
  <button id="saveButton">Save API Key</button>
  <script>
    (function() {
      function post(message) { window.ipc.postMessage(JSON.stringify(message)); }
      var input = document.getElementById('apiKey');
      var button = document.getElementById('saveButton');

      window.__syncfloSettings = {
        load: function() { post({ op: 'load' }); },
        prefill: function(key) { if (key) { input.value = key; } },
        saved: function() {
          button.textContent = 'Saved!';
          button.style.backgroundColor = '#4CAF50';
          setTimeout(function() {
            button.textContent = 'Save API Key';
            button.style.backgroundColor = '#4285F4';
          }, __SAVED_FEEDBACK_MS__);
        }
      };

      button.addEventListener('click', function() {
        post({ op: 'save', apiKey: input.value });
      });
      document.addEventListener('DOMContentLoaded', window.__syncfloSettings.load);
    })();
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn store() -> CredentialStore {
        CredentialStore::new(Arc::new(MemoryStorage::new()), "groqApiKey")
    }

    #[tokio::test]
    async fn load_prefills_stored_key() {
        let store = store();
        assert_eq!(
            handle_request(&store, SettingsRequest::Load).await,
            SettingsReply::Prefill(None)
        );
        store.set_key("gsk_abc").await.unwrap();
        assert_eq!(
            handle_request(&store, SettingsRequest::Load).await,
            SettingsReply::Prefill(Some("gsk_abc".to_string()))
        );
    }

    #[tokio::test]
    async fn save_trims_and_persists() {
        let store = store();
        let request: SettingsRequest =
            serde_json::from_str(r#"{"op":"save","apiKey":"  gsk_abc \n"}"#).unwrap();
        assert_eq!(handle_request(&store, request).await, SettingsReply::Saved);
        assert_eq!(store.get_key().await.unwrap().as_deref(), Some("gsk_abc"));
    }

    #[tokio::test]
    async fn blank_save_alerts_and_keeps_old_key() {
        let store = store();
        store.set_key("old").await.unwrap();
        let reply = handle_request(
            &store,
            SettingsRequest::Save {
                api_key: "   ".to_string(),
            },
        )
        .await;
        assert_eq!(reply, SettingsReply::Alert(EMPTY_KEY_ALERT.to_string()));
        assert_eq!(store.get_key().await.unwrap().as_deref(), Some("old"));
    }

    #[test]
    fn replies_render_as_js() {
        assert_eq!(
            SettingsReply::Prefill(Some("k\"1".to_string())).to_js().unwrap(),
            r#"window.__syncfloSettings.prefill("k\"1");"#
        );
        assert_eq!(
            SettingsReply::Prefill(None).to_js().unwrap(),
            "window.__syncfloSettings.prefill(null);"
        );
        assert_eq!(
            SettingsReply::Alert(EMPTY_KEY_ALERT.to_string()).to_js().unwrap(),
            r#"alert("Please enter a valid API key");"#
        );
    }

    #[test]
    fn page_carries_feedback_delay() {
        let html = settings_page_html();
        assert!(html.contains("}, 2000);"));
    }
}
