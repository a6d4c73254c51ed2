use std::fmt;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row of a result table, keyed by column name.
pub type TableRow = serde_json::Map<String, Value>;

/// Payroll detail for a single pay period. The shape is owned by the server.
pub type PayrollDetail = serde_json::Map<String, Value>;

// --- Insight ---

/// A named group of analysis proposals, in the order the server listed them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProposalGroup {
    pub name: String,
    pub proposals: Vec<String>,
}

/// Response of `GET /api/insight/groups`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InsightGroups {
    #[serde(deserialize_with = "ordered_groups")]
    pub groups: Vec<ProposalGroup>,
    #[serde(default)]
    pub titles: std::collections::HashMap<String, String>,
}

impl InsightGroups {
    pub fn proposals(&self, group: &str) -> Option<&[String]> {
        self.groups
            .iter()
            .find(|g| g.name == group)
            .map(|g| g.proposals.as_slice())
    }

    pub fn title(&self, proposal: &str) -> Option<&str> {
        self.titles.get(proposal).map(String::as_str)
    }
}

/// Response of the dimension and drilldown endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct OptionList {
    pub options: Vec<String>,
}

/// A single chart + table pair inside a tabbed view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewTab {
    pub label: String,
    #[serde(default)]
    pub fig: Option<Value>,
    #[serde(default)]
    pub df: Vec<TableRow>,
}

/// Response of `GET /api/insight/view/{proposal}`.
///
/// `fig` is a plotting-library figure (data + layout) and is passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ViewPayload {
    Single {
        #[serde(default)]
        fig: Option<Value>,
        #[serde(default)]
        df: Option<Vec<TableRow>>,
        #[serde(default)]
        df_columns: Vec<String>,
    },
    Tabs {
        tabs: Vec<ViewTab>,
    },
}

impl ViewPayload {
    /// Tab labels, or an empty list for a single view.
    pub fn tab_labels(&self) -> Vec<&str> {
        match self {
            ViewPayload::Single { .. } => Vec::new(),
            ViewPayload::Tabs { tabs } => tabs.iter().map(|t| t.label.as_str()).collect(),
        }
    }

    /// Total table rows across the payload.
    pub fn row_count(&self) -> usize {
        match self {
            ViewPayload::Single { df, .. } => df.as_ref().map_or(0, Vec::len),
            ViewPayload::Tabs { tabs } => tabs.iter().map(|t| t.df.len()).sum(),
        }
    }

    pub fn has_chart(&self) -> bool {
        match self {
            ViewPayload::Single { fig, .. } => fig.is_some(),
            ViewPayload::Tabs { tabs } => tabs.iter().any(|t| t.fig.is_some()),
        }
    }
}

// --- Payroll ---

/// One entry of an employee's monthly payroll list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPayroll {
    pub pay_period: String,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, Value>,
}

/// Payroll years arrive as either strings or numbers depending on the backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum YearValue {
    Text(String),
    Number(i64),
}

impl From<YearValue> for String {
    fn from(value: YearValue) -> Self {
        match value {
            YearValue::Text(s) => s,
            YearValue::Number(n) => n.to_string(),
        }
    }
}

// JSON object order is meaningful here (it is the display order), so collect
// entries as they arrive instead of going through a map type.
fn ordered_groups<'de, D>(deserializer: D) -> Result<Vec<ProposalGroup>, D::Error>
where
    D: Deserializer<'de>,
{
    struct GroupsVisitor;

    impl<'de> Visitor<'de> for GroupsVisitor {
        type Value = Vec<ProposalGroup>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an object mapping group names to proposal ids")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut groups = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((name, proposals)) = access.next_entry::<String, Vec<String>>()? {
                if groups.iter().any(|g: &ProposalGroup| g.name == name) {
                    return Err(de::Error::custom(format!("duplicate group {name:?}")));
                }
                groups.push(ProposalGroup { name, proposals });
            }
            Ok(groups)
        }
    }

    deserializer.deserialize_map(GroupsVisitor)
}
