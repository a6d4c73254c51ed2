use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "hrdesk")]
#[command(about = "Resolve HR insight and payroll selector chains from the command line")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Walk group → proposal → dimension → drilldown and load the view.
    Insight {
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        proposal: Option<String>,
        #[arg(long)]
        dimension: Option<String>,
        #[arg(long)]
        drilldown: Option<String>,
    },
    /// Walk year → pay period for the configured employee.
    Payroll {
        #[arg(long)]
        year: Option<String>,
        /// Pay period as YYYY-MM.
        #[arg(long)]
        period: Option<String>,
    },
}

impl Command {
    /// Requested selections in stage order.
    pub fn picks(&self) -> Vec<Option<String>> {
        match self {
            Command::Insight {
                group,
                proposal,
                dimension,
                drilldown,
            } => vec![
                group.clone(),
                proposal.clone(),
                dimension.clone(),
                drilldown.clone(),
            ],
            Command::Payroll { year, period } => vec![year.clone(), period.clone()],
        }
    }
}
