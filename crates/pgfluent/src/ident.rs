//! SQL identifier validation for table names and aliases.
//!
//! Table names and aliases are spliced into the rendered statement (Postgres does not allow
//! parameterizing identifiers), so joined queries validate them with [`Ident`] before executing.
//!
//! - Unquoted parts are validated against: `[A-Za-z_][A-Za-z0-9_$]*`
//! - Quoted parts allow any characters except NUL and escape `"` as `""`

use crate::error::{FluentError, FluentResult};

/// A part of a SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentPart {
    /// Unquoted identifier: must match `[A-Za-z_][A-Za-z0-9_$]*`.
    Unquoted(String),
    /// Quoted identifier: allows any characters except NUL.
    Quoted(String),
}

impl IdentPart {
    /// The identifier text without quotes.
    pub fn name(&self) -> &str {
        match self {
            IdentPart::Unquoted(s) | IdentPart::Quoted(s) => s,
        }
    }
}

/// A SQL identifier, optionally schema-qualified (`public.persons`, `"Org"."Members"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub parts: Vec<IdentPart>,
}

impl Ident {
    /// Parse an identifier string, supporting dotted and quoted forms.
    pub fn parse(s: &str) -> FluentResult<Self> {
        if s.is_empty() {
            return Err(FluentError::validation("Identifier cannot be empty"));
        }
        if s.contains('\0') {
            return Err(FluentError::validation(
                "Identifier cannot contain NUL character",
            ));
        }

        let mut parts = Vec::new();
        let mut chars = s.chars().peekable();

        while chars.peek().is_some() {
            if !parts.is_empty() {
                match chars.next() {
                    Some('.') => {
                        if chars.peek().is_none() {
                            return Err(FluentError::validation("Trailing '.' in identifier"));
                        }
                    }
                    Some(c) => {
                        return Err(FluentError::validation(format!(
                            "Expected '.' between identifier parts, got '{c}'"
                        )));
                    }
                    None => break,
                }
            }

            if chars.peek() == Some(&'"') {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('"') => {
                            // "" is an escaped quote
                            if chars.peek() == Some(&'"') {
                                chars.next();
                                name.push('"');
                            } else {
                                break;
                            }
                        }
                        Some(c) => name.push(c),
                        None => return Err(FluentError::validation("Unclosed quoted identifier")),
                    }
                }
                if name.is_empty() {
                    return Err(FluentError::validation("Empty quoted identifier"));
                }
                parts.push(IdentPart::Quoted(name));
                continue;
            }

            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c == '.' {
                    break;
                }
                let valid = if name.is_empty() {
                    c == '_' || c.is_ascii_alphabetic()
                } else {
                    c == '_' || c == '$' || c.is_ascii_alphanumeric()
                };
                if !valid {
                    return Err(FluentError::validation(format!(
                        "Invalid character in identifier '{s}': '{c}'"
                    )));
                }
                name.push(c);
                chars.next();
            }
            if name.is_empty() {
                return Err(FluentError::validation("Empty identifier segment"));
            }
            parts.push(IdentPart::Unquoted(name));
        }

        if parts.is_empty() {
            return Err(FluentError::validation("Empty identifier"));
        }

        Ok(Self { parts })
    }

    /// Whether this identifier is a single unqualified part (required for aliases).
    pub fn is_simple(&self) -> bool {
        self.parts.len() == 1
    }

    /// The last (relation) part without quotes: `persons` for `public.persons`.
    pub fn relation_name(&self) -> &str {
        self.parts.last().map(IdentPart::name).unwrap_or_default()
    }

    /// Render the identifier as SQL.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            match part {
                IdentPart::Unquoted(s) => out.push_str(s),
                IdentPart::Quoted(s) => {
                    out.push('"');
                    out.push_str(&s.replace('"', "\"\""));
                    out.push('"');
                }
            }
        }
        out
    }
}

/// The relation part of a possibly schema-qualified table name, for comparing against the
/// table name a driver reports. Falls back to the raw text when it does not parse.
pub(crate) fn relation_name(table: &str) -> String {
    match Ident::parse(table) {
        Ok(ident) => ident.relation_name().to_string(),
        Err(_) => table.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ident_simple() {
        let ident = Ident::parse("persons").unwrap();
        assert_eq!(ident.to_sql(), "persons");
        assert!(ident.is_simple());
    }

    #[test]
    fn ident_dotted() {
        let ident = Ident::parse("public.persons").unwrap();
        assert_eq!(ident.to_sql(), "public.persons");
        assert_eq!(ident.relation_name(), "persons");
        assert!(!ident.is_simple());
    }

    #[test]
    fn ident_quoted_with_escape() {
        let ident = Ident::parse(r#""has""quote""#).unwrap();
        assert_eq!(ident.to_sql(), r#""has""quote""#);
        assert_eq!(ident.relation_name(), r#"has"quote"#);
    }

    #[test]
    fn ident_mixed_quoted_unquoted() {
        let ident = Ident::parse(r#"public."Members""#).unwrap();
        assert_eq!(ident.to_sql(), r#"public."Members""#);
        assert_eq!(ident.relation_name(), "Members");
    }

    #[test]
    fn ident_rejects_bad_input() {
        assert!(Ident::parse("").is_err());
        assert!(Ident::parse("1table").is_err());
        assert!(Ident::parse("my table").is_err());
        assert!(Ident::parse("schema..table").is_err());
        assert!(Ident::parse("schema.").is_err());
        assert!(Ident::parse(r#""unclosed"#).is_err());
        assert!(Ident::parse("p; DROP TABLE persons").is_err());
    }

    #[test]
    fn relation_name_of_qualified_table() {
        assert_eq!(relation_name("public.persons"), "persons");
        assert_eq!(relation_name("persons"), "persons");
    }
}
