use crate::value::Param;
use std::fmt::Write;
use tokio_postgres::types::ToSql;

#[derive(Debug, Clone)]
enum Part {
    Text(String),
    Param,
}

/// A piece of SQL with its parameters held separately.
///
/// Placeholders are numbered only when the fragment is rendered, so fragments can be
/// composed in any order and the final text is always numbered `$1..$n` left to right,
/// aligned with [`Fragment::params`].
#[derive(Debug, Clone, Default)]
pub struct Fragment {
    parts: Vec<Part>,
    params: Vec<Param>,
}

impl Fragment {
    pub fn new(text: impl Into<String>) -> Self {
        let mut f = Self::empty();
        f.push(&text.into());
        f
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Append text (no parameters).
    pub fn push(&mut self, text: &str) -> &mut Self {
        if text.is_empty() {
            return self;
        }

        match self.parts.last_mut() {
            Some(Part::Text(last)) => last.push_str(text),
            _ => self.parts.push(Part::Text(text.to_string())),
        }
        self
    }

    /// Append a placeholder and bind its value.
    pub fn push_bind(&mut self, value: Param) -> &mut Self {
        self.parts.push(Part::Param);
        self.params.push(value);
        self
    }

    /// Append another fragment, consuming it.
    pub fn push_fragment(&mut self, mut other: Fragment) -> &mut Self {
        self.parts.append(&mut other.parts);
        self.params.append(&mut other.params);
        self
    }

    /// Concatenate fragments with `sep` between them. Empty fragments are skipped.
    pub fn join(fragments: impl IntoIterator<Item = Fragment>, sep: &str) -> Fragment {
        let mut out = Fragment::empty();
        for (i, f) in fragments.into_iter().filter(|f| !f.is_empty()).enumerate() {
            if i > 0 {
                out.push(sep);
            }
            out.push_fragment(f);
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Render the text, numbering placeholders in emission order.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        let mut idx: usize = 0;

        for part in &self.parts {
            match part {
                Part::Text(s) => out.push_str(s),
                Part::Param => {
                    idx += 1;
                    let _ = write!(&mut out, "${}", idx);
                }
            }
        }
        out
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Render into a [`Statement`].
    pub fn build(self) -> Statement {
        Statement {
            sql: self.to_sql(),
            params: self.params,
        }
    }
}

/// Rendered SQL text plus the positionally aligned arguments.
#[derive(Debug, Clone)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Param>,
}

impl Statement {
    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect()
    }
}
