//! Key matching with camelCase aliases

/// A request key that may also be spelled in camelCase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseField {
    name: &'static str,
}

impl ParseField {
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    /// camelCase spelling of the snake_case name.
    pub fn camel_case_name(&self) -> String {
        let mut out = String::with_capacity(self.name.len());
        let mut upper = false;
        for c in self.name.chars() {
            if c == '_' {
                upper = !out.is_empty();
            } else if upper {
                out.extend(c.to_uppercase());
                upper = false;
            } else {
                out.push(c);
            }
        }
        out
    }

    /// Whether `candidate` names this field. A missing key never matches.
    pub fn matches(&self, candidate: Option<&str>, accept_camel_case: bool) -> bool {
        match candidate {
            Some(key) if key == self.name => true,
            Some(key) => accept_camel_case && key == self.camel_case_name(),
            None => false,
        }
    }
}
