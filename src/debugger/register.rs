/// CPU register value as reported by the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Register {
    /// Backend register number.
    pub id: String,
    pub name: Option<String>,
    pub value: Option<String>,
}

impl Register {
    pub fn new(id: impl Into<String>, name: Option<&str>, value: Option<&str>) -> Self {
        Self {
            id: id.into(),
            name: name.map(ToString::to_string),
            value: value.map(ToString::to_string),
        }
    }
}
