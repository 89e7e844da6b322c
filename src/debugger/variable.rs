use std::fmt::{Display, Formatter};

/// Local variable or function parameter as rendered by the backend.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub type_name: Option<String>,
    pub value: Option<String>,
    /// Composite value that may be expanded.
    pub has_children: bool,
}

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let type_view = self.type_name.as_deref().unwrap_or("unknown");
        let value_view = self.value.as_deref().unwrap_or("unknown");
        write!(f, "{}: {type_view} = {value_view}", self.name)
    }
}
