pub mod error;
pub mod types;

pub use error::{ClientError, Result};
pub use types::{
    InsightGroups, MonthlyPayroll, OptionList, PayrollDetail, ProposalGroup, TableRow,
    ViewPayload, ViewTab,
};

use std::time::Duration;

use reqwest::Url;
use serde::de::DeserializeOwned;
use types::YearValue;

/// Client for the HR REST API (insight analytics and payroll lookups).
#[derive(Clone)]
pub struct HrClient {
    client: reqwest::Client,
    base_url: Url,
}

impl HrClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ClientError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(base_url.to_string()));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an endpoint URL, percent-encoding each path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, query: &[(&str, &str)]) -> Result<T> {
        tracing::debug!(url = %url, ?query, "GET");
        let resp = self.client.get(url).query(query).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: error_detail(&body),
            });
        }

        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    // --- Insight ---

    /// Proposal groups and their human-readable titles.
    pub async fn insight_groups(&self) -> Result<InsightGroups> {
        let url = self.endpoint(&["api", "insight", "groups"])?;
        let groups: InsightGroups = self.get_json(url, &[]).await?;
        tracing::debug!(groups = groups.groups.len(), "Fetched insight groups");
        Ok(groups)
    }

    /// Dimension options for a proposal.
    pub async fn insight_dimensions(&self, proposal: &str) -> Result<Vec<String>> {
        let url = self.endpoint(&["api", "insight", "dimensions", proposal])?;
        let list: OptionList = self.get_json(url, &[]).await?;
        Ok(list.options)
    }

    /// Drilldown options for a proposal and dimension.
    pub async fn insight_drilldown(&self, proposal: &str, dimension: &str) -> Result<Vec<String>> {
        let url = self.endpoint(&["api", "insight", "drilldown", proposal, dimension])?;
        let list: OptionList = self.get_json(url, &[]).await?;
        Ok(list.options)
    }

    /// Chart and table data for a fully resolved selection.
    pub async fn insight_view(
        &self,
        proposal: &str,
        dimension: &str,
        drilldown: &str,
    ) -> Result<ViewPayload> {
        let url = self.endpoint(&["api", "insight", "view", proposal])?;
        self.get_json(url, &[("dimension", dimension), ("drilldown", drilldown)])
            .await
    }

    // --- Payroll ---

    /// Years for which the employee has payroll records, newest first as served.
    pub async fn payroll_years(&self, employee_id: &str) -> Result<Vec<String>> {
        let url = self.endpoint(&["api", "payroll", "years", employee_id])?;
        let years: Vec<YearValue> = self.get_json(url, &[]).await?;
        Ok(years.into_iter().map(String::from).collect())
    }

    pub async fn payroll_monthly(&self, employee_id: &str, year: &str) -> Result<Vec<MonthlyPayroll>> {
        let url = self.endpoint(&["api", "payroll", "my", "monthly", employee_id])?;
        self.get_json(url, &[("year", year)]).await
    }

    pub async fn payroll_detail(&self, employee_id: &str, pay_period: &str) -> Result<PayrollDetail> {
        let url = self.endpoint(&["api", "payroll", "my", "detail", employee_id])?;
        self.get_json(url, &[("pay_period", pay_period)]).await
    }
}

/// The server reports failures as `{"detail": "..."}`; fall back to the raw body.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
