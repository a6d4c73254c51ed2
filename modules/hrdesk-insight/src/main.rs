use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hrdesk_client::HrClient;
use hrdesk_common::{Config, Session};
use hrdesk_insight::cli::{Cli, Command};
use hrdesk_insight::report::{chain_summary, view_summary};
use hrdesk_insight::{insight, payroll, walk, InsightSource, PayrollSource};
use hrdesk_resolver::Resolver;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("hrdesk=info".parse()?))
        .init();

    let command = Cli::parse().command;

    let config = Config::from_env()?;
    config.log_redacted();

    let client = HrClient::new(&config.api_url, config.http_timeout)?;

    match &command {
        Command::Insight { .. } => {
            let source = Arc::new(InsightSource::new(client));
            let mut resolver = Resolver::new(insight::stages(), Arc::clone(&source))?;
            let outcome = walk(&mut resolver, &command.picks()).await;

            print!("{}", chain_summary(&resolver));
            if let Some(proposal) = resolver
                .selection(insight::PROPOSAL)
                .and_then(|s| s.as_value())
            {
                if let Some(title) = source.title(proposal) {
                    println!("title: {title}");
                }
            }
            if let Some(view) = resolver.payload() {
                print!("{}", view_summary(view));
            }
            outcome?;
        }
        Command::Payroll { .. } => {
            let session = Session::from_config(&config)?;
            info!(employee = %session.employee_id, "Resolving payroll");

            let source = Arc::new(PayrollSource::new(client, session));
            let mut resolver = Resolver::new(payroll::stages(), source)?;
            let outcome = walk(&mut resolver, &command.picks()).await;

            print!("{}", chain_summary(&resolver));
            if let Some(detail) = resolver.payload() {
                println!("{}", serde_json::to_string_pretty(detail)?);
            }
            outcome?;
        }
    }

    Ok(())
}
