// Remote chain service: posts the structured context, expects insights JSON back.

use async_trait::async_trait;
use serde::Serialize;

use super::{InsightBackend, InsightContext};
use crate::health::{DependencyStatus, join_url, probe_url};
use crate::models::{Insights, Summary};

const CHAIN_NAME: &str = "resource_watcher_insights";

#[derive(Serialize)]
struct ChainInput<'a> {
    context: InsightContext<'a>,
}

#[derive(Serialize)]
struct ChainRequest<'a> {
    input: ChainInput<'a>,
    chain_type: &'static str,
}

pub struct ChainBackend {
    client: reqwest::Client,
    base_url: String,
}

impl ChainBackend {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }

    fn run_url(&self) -> String {
        join_url(&self.base_url, &format!("/chains/{}/run", CHAIN_NAME))
    }
}

#[async_trait]
impl InsightBackend for ChainBackend {
    fn name(&self) -> &'static str {
        "langchain"
    }

    async fn generate(&self, summary: &Summary) -> anyhow::Result<Insights> {
        let payload = ChainRequest {
            input: ChainInput {
                context: InsightContext::from_summary(summary),
            },
            chain_type: CHAIN_NAME,
        };
        let response = self.client.post(self.run_url()).json(&payload).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("chain service error ({}): {}", status, body);
        }
        Ok(response.json().await?)
    }

    async fn probe(&self) -> DependencyStatus {
        probe_url(&self.client, &join_url(&self.base_url, "/health")).await
    }
}
