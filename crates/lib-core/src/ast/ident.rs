//! Identifiers and qualified names.

/// A single identifier, optionally delimited (`"Foo"`, `` `Foo` ``, `[Foo]`).
///
/// Equality compares the case-folded, unquoted form unless either side was
/// delimited, in which case case is preserved and compared verbatim — this
/// is the name-resolution rule from the spec's identifier invariants.
#[derive(Debug, Clone, Eq)]
pub struct Ident {
    pub value: String,
    pub quote_style: Option<char>,
}

impl Ident {
    pub fn new(value: impl Into<String>) -> Self {
        Ident { value: value.into(), quote_style: None }
    }

    pub fn quoted(value: impl Into<String>, quote_style: char) -> Self {
        Ident { value: value.into(), quote_style: Some(quote_style) }
    }

    pub fn is_quoted(&self) -> bool {
        self.quote_style.is_some()
    }

    /// The form used for name resolution: case-folded unless quoted.
    pub fn resolution_key(&self) -> std::borrow::Cow<'_, str> {
        if self.is_quoted() {
            std::borrow::Cow::Borrowed(&self.value)
        } else {
            std::borrow::Cow::Owned(self.value.to_ascii_lowercase())
        }
    }
}

impl PartialEq for Ident {
    fn eq(&self, other: &Self) -> bool {
        match (self.quote_style, other.quote_style) {
            (None, None) => self.value.eq_ignore_ascii_case(&other.value),
            _ => self.is_quoted() == other.is_quoted() && self.value == other.value,
        }
    }
}

impl std::hash::Hash for Ident {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.resolution_key().hash(state);
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// A dotted, possibly schema-qualified name (`schema.table`, `alias.column`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectName(pub Vec<Ident>);

impl ObjectName {
    pub fn single(ident: Ident) -> Self {
        ObjectName(vec![ident])
    }

    pub fn last(&self) -> &Ident {
        self.0.last().expect("ObjectName is never empty")
    }

    /// The normalized key used by the table-reference collector and fixture
    /// lookup: schema-qualified, case-folded, delimiters stripped.
    pub fn normalized(&self) -> String {
        self.0.iter().map(|part| part.resolution_key()).collect::<Vec<_>>().join(".")
    }
}

impl std::fmt::Display for ObjectName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unquoted_idents_compare_case_insensitively() {
        assert_eq!(Ident::new("Foo"), Ident::new("foo"));
    }

    #[test]
    fn quoted_idents_preserve_case() {
        assert_ne!(Ident::quoted("Foo", '"'), Ident::quoted("foo", '"'));
        assert_eq!(Ident::quoted("Foo", '"'), Ident::quoted("Foo", '"'));
    }

    #[test]
    fn object_name_normalizes_for_fixture_lookup() {
        let name = ObjectName(vec![Ident::new("Public"), Ident::quoted("Users", '"')]);
        assert_eq!(name.normalized(), "public.Users");
    }
}
