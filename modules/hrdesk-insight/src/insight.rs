//! Insight analytics chain: group → proposal → dimension → drilldown.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use hrdesk_client::{HrClient, InsightGroups, ViewPayload};
use hrdesk_resolver::{AutoSelect, OptionSource, Stage};
use tokio::sync::OnceCell;

pub const GROUP: usize = 0;
pub const PROPOSAL: usize = 1;
pub const DIMENSION: usize = 2;
pub const DRILLDOWN: usize = 3;

/// Overview label. Also the name of the placeholder group the server lists first.
pub const OVERVIEW: &str = "개요";
/// "All" drilldown label.
pub const ALL: &str = "전체";

/// Drilldown lists served by the HR API always start with "전체"; a list
/// without it leaves the drilldown for the user to pick.
pub fn stages() -> Vec<Stage> {
    vec![
        Stage::new("group", OVERVIEW),
        Stage::new("proposal", "-- 제안 선택 --"),
        Stage::new("dimension", OVERVIEW).with_auto_select(AutoSelect::First),
        Stage::new("drilldown", ALL).with_auto_select(AutoSelect::Preferred(ALL.to_string())),
    ]
}

pub struct InsightSource {
    client: HrClient,
    groups: OnceCell<InsightGroups>,
}

impl InsightSource {
    pub fn new(client: HrClient) -> Self {
        Self {
            client,
            groups: OnceCell::new(),
        }
    }

    /// Fetched once; a failed load is retried on the next call.
    async fn groups(&self) -> Result<&InsightGroups> {
        self.groups
            .get_or_try_init(|| self.client.insight_groups())
            .await
            .context("loading insight groups")
    }

    /// Human-readable proposal title, once groups have been loaded.
    pub fn title(&self, proposal: &str) -> Option<&str> {
        self.groups.get()?.title(proposal)
    }
}

#[async_trait]
impl OptionSource for InsightSource {
    type Payload = ViewPayload;

    async fn fetch_options(&self, stage: usize, prefix: &[String]) -> Result<Vec<String>> {
        match (stage, prefix) {
            (GROUP, []) => {
                let groups = self.groups().await?;
                Ok(groups
                    .groups
                    .iter()
                    .filter(|g| g.name != OVERVIEW)
                    .map(|g| g.name.clone())
                    .collect())
            }
            (PROPOSAL, [group]) => {
                let groups = self.groups().await?;
                groups
                    .proposals(group)
                    .map(<[String]>::to_vec)
                    .ok_or_else(|| anyhow!("unknown insight group {group:?}"))
            }
            (DIMENSION, [_, proposal]) => Ok(self.client.insight_dimensions(proposal).await?),
            (DRILLDOWN, [_, proposal, dimension]) => {
                Ok(self.client.insight_drilldown(proposal, dimension).await?)
            }
            _ => bail!("no insight options for stage {stage} with prefix {prefix:?}"),
        }
    }

    async fn fetch_result(&self, selections: &[String]) -> Result<ViewPayload> {
        match selections {
            [_, proposal, dimension, drilldown] => Ok(self
                .client
                .insight_view(proposal, dimension, drilldown)
                .await?),
            _ => bail!("insight view needs 4 selections, got {selections:?}"),
        }
    }
}
