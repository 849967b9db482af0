use poise::serenity_prelude::prelude::TypeMapKey;
use serde::Deserialize;

use crate::commands::Error;

const API_URL: &str = "https://saucenao.com/search.php";

/// Client for the SauceNAO similarity search API.
#[derive(Debug, Clone)]
pub struct SauceNao {
    client: reqwest::Client,
    api_key: String,
}

impl SauceNao {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }

    /// Submits an image URL and returns the decoded result set. A non-zero
    /// header status is returned as data, not as an error.
    pub async fn search(&self, image_url: &str) -> Result<SaucePayload, Error> {
        let payload = self
            .client
            .get(API_URL)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("output_type", "2"),
                ("db", "999"),
                ("url", image_url),
            ])
            .send()
            .await?
            .json()
            .await?;
        Ok(payload)
    }
}

pub struct Sauce;

impl TypeMapKey for Sauce {
    type Value = SauceNao;
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaucePayload {
    pub header: PayloadHeader,
    #[serde(default)]
    pub results: Vec<SauceResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayloadHeader {
    pub status: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SauceResult {
    pub header: ResultHeader,
    #[serde(default)]
    pub data: ResultData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultHeader {
    pub similarity: String,
    pub index_id: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultData {
    pub member_name: Option<String>,
    pub twitter_user_handle: Option<String>,
    pub creator: Option<Creator>,
    pub material: Option<String>,
    pub characters: Option<String>,
    #[serde(default)]
    pub ext_urls: Vec<String>,
}

/// Some indices report a single creator, others a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Creator {
    One(String),
    Many(Vec<String>),
}

impl Creator {
    pub fn as_text(&self) -> String {
        match self {
            Creator::One(name) => name.clone(),
            Creator::Many(names) => names.join(", "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_result_payload() {
        let payload: SaucePayload = serde_json::from_str(
            r#"{
                "header": {"status": 0, "results_requested": 8},
                "results": [
                    {
                        "header": {"similarity": "93.21", "thumbnail": "t", "index_id": 5},
                        "data": {
                            "ext_urls": ["https://www.pixiv.net/artworks/1"],
                            "member_name": "someone",
                            "pixiv_id": 1
                        }
                    },
                    {
                        "header": {"similarity": "91.02", "index_id": 9},
                        "data": {
                            "ext_urls": ["https://danbooru.donmai.us/post/show/2"],
                            "creator": "painter",
                            "material": "original",
                            "characters": "a, b"
                        }
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(payload.header.status, 0);
        assert_eq!(payload.results.len(), 2);
        assert_eq!(payload.results[0].header.index_id, 5);
        assert_eq!(payload.results[0].data.member_name.as_deref(), Some("someone"));
        assert_eq!(
            payload.results[1].data.creator.as_ref().map(Creator::as_text),
            Some("painter".to_owned())
        );
    }

    #[test]
    fn decodes_an_error_payload_without_results() {
        let payload: SaucePayload =
            serde_json::from_str(r#"{"header": {"status": 2}}"#).unwrap();
        assert_eq!(payload.header.status, 2);
        assert!(payload.results.is_empty());
    }

    #[test]
    fn decodes_a_creator_list() {
        let creator: Creator = serde_json::from_str(r#"["a", "b"]"#).unwrap();
        assert_eq!(creator.as_text(), "a, b");
    }
}
