use std::fmt;

/// The current value of one stage.
///
/// `Unselected` is the "nothing chosen / overview" marker. Being a variant
/// rather than a reserved string, it can never collide with a server option.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Selection {
    #[default]
    Unselected,
    Value(String),
}

impl Selection {
    pub fn value(value: impl Into<String>) -> Self {
        Selection::Value(value.into())
    }

    pub fn as_value(&self) -> Option<&str> {
        match self {
            Selection::Unselected => None,
            Selection::Value(v) => Some(v),
        }
    }

    pub fn is_selected(&self) -> bool {
        matches!(self, Selection::Value(_))
    }
}

impl From<&str> for Selection {
    fn from(value: &str) -> Self {
        Selection::Value(value.to_string())
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Unselected => f.write_str("<unselected>"),
            Selection::Value(v) => f.write_str(v),
        }
    }
}

/// What a stage selects by itself once its options arrive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoSelect {
    /// Stay unselected until the user chooses.
    Never,
    /// Take the first option.
    First,
    /// Take this option if the list contains it, otherwise stay unselected.
    Preferred(String),
}

impl AutoSelect {
    /// The default selection for a freshly fetched option list.
    /// An empty list always yields `Unselected`.
    pub fn pick(&self, options: &[String]) -> Selection {
        match self {
            AutoSelect::Never => Selection::Unselected,
            AutoSelect::First => options
                .first()
                .map_or(Selection::Unselected, |o| Selection::value(o.as_str())),
            AutoSelect::Preferred(label) => {
                if options.iter().any(|o| o == label) {
                    Selection::value(label.as_str())
                } else {
                    Selection::Unselected
                }
            }
        }
    }
}

/// One level of the chain.
#[derive(Debug, Clone)]
pub struct Stage {
    pub name: String,
    /// Label a presenter shows while the stage is unselected.
    pub sentinel_label: String,
    pub auto_select: AutoSelect,
}

impl Stage {
    pub fn new(name: impl Into<String>, sentinel_label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sentinel_label: sentinel_label.into(),
            auto_select: AutoSelect::Never,
        }
    }

    pub fn with_auto_select(mut self, auto_select: AutoSelect) -> Self {
        self.auto_select = auto_select;
        self
    }

    /// Display text for a selection at this stage.
    pub fn label<'a>(&'a self, selection: &'a Selection) -> &'a str {
        selection.as_value().unwrap_or(&self.sentinel_label)
    }
}
