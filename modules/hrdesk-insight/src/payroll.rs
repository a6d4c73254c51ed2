//! "My payroll" chain: year → pay period, resolving to the payroll detail.

use anyhow::{bail, Result};
use async_trait::async_trait;
use hrdesk_client::{HrClient, PayrollDetail};
use hrdesk_common::Session;
use hrdesk_resolver::{AutoSelect, OptionSource, Stage};

pub const YEAR: usize = 0;
pub const PAY_PERIOD: usize = 1;

pub fn stages() -> Vec<Stage> {
    vec![
        Stage::new("year", "연도 선택").with_auto_select(AutoSelect::First),
        Stage::new("pay_period", "급여월 선택"),
    ]
}

pub struct PayrollSource {
    client: HrClient,
    session: Session,
}

impl PayrollSource {
    pub fn new(client: HrClient, session: Session) -> Self {
        Self { client, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}

#[async_trait]
impl OptionSource for PayrollSource {
    type Payload = PayrollDetail;

    async fn fetch_options(&self, stage: usize, prefix: &[String]) -> Result<Vec<String>> {
        let employee_id = &self.session.employee_id;
        match (stage, prefix) {
            (YEAR, []) => Ok(self.client.payroll_years(employee_id).await?),
            (PAY_PERIOD, [year]) => {
                let payrolls = self.client.payroll_monthly(employee_id, year).await?;
                let mut periods: Vec<String> = Vec::with_capacity(payrolls.len());
                for payroll in payrolls {
                    if !periods.contains(&payroll.pay_period) {
                        periods.push(payroll.pay_period);
                    }
                }
                Ok(periods)
            }
            _ => bail!("no payroll options for stage {stage} with prefix {prefix:?}"),
        }
    }

    async fn fetch_result(&self, selections: &[String]) -> Result<PayrollDetail> {
        match selections {
            [_, pay_period] => Ok(self
                .client
                .payroll_detail(&self.session.employee_id, pay_period)
                .await?),
            _ => bail!("payroll detail needs 2 selections, got {selections:?}"),
        }
    }
}
