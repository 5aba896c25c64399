//! Incremental SQL construction for batched statements.

use regex::Regex;
use sqlscript_core::{ArgumentError, CommandDefinition, Error, Params, Result, Value};
use std::cmp::Reverse;
use std::fmt;
use std::fmt::Write as _;
use std::ops::Range;

/// Builds a SQL statement from text fragments and generated parameters.
///
/// Parameter names are unique ignoring case. Indexed parameters are named
/// `@__p{n}_` where `n` is the number of parameters present when the value
/// was added.
///
/// ```
/// use sqlscript::SqlBuilder;
///
/// let mut sql = SqlBuilder::new();
/// for id in [3, 5] {
///     let p = sql.append_indexed_param(id);
///     sql.append_line(&format!("delete from Fruit where Id = {p};"));
/// }
/// assert_eq!(
///     sql.to_debug_string(),
///     "delete from Fruit where Id = 3;\ndelete from Fruit where Id = 5;\n",
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlBuilder {
    text: String,
    params: Params,
}

impl SqlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, text: &str) -> &mut Self {
        self.text.push_str(text);
        self
    }

    /// Append `text` followed by a newline.
    pub fn append_line(&mut self, text: &str) -> &mut Self {
        self.text.push_str(text);
        self.text.push('\n');
        self
    }

    /// Add a parameter under a generated name and return that name.
    pub fn append_indexed_param(&mut self, value: impl Into<Value>) -> String {
        let name = format!("@__p{}_", self.params.len());
        self.params.set(name.clone(), value);
        name
    }

    /// Add a named parameter. Fails if the name is already taken.
    pub fn append_param(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<&mut Self> {
        let name = name.into();
        if self.params.contains(&name) {
            return Err(Error::InvalidArgument(ArgumentError {
                name: "name",
                message: format!("the named parameter '{name}' already exists"),
            }));
        }
        self.params.set(name, value);
        Ok(self)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Consume the builder into an executable command.
    pub fn into_definition(self) -> CommandDefinition {
        CommandDefinition::new(self.text).params(self.params)
    }

    /// The text with every parameter spliced in as a literal.
    pub fn to_debug_string(&self) -> String {
        debug_sql(&self.text, &self.params)
    }
}

impl fmt::Display for SqlBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn stands_alone(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    before.is_none_or(|c| !is_word(c)) && after.is_none_or(|c| !is_word(c))
}

/// Render a value the way it would be written as a SQL literal.
fn write_literal(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Text(s) => {
            out.push('\'');
            out.push_str(&s.replace('\'', "''"));
            out.push('\'');
        }
        Value::Uuid(_) | Value::Json(_) => {
            let _ = write!(out, "'{value}'");
        }
        Value::Array(items) => {
            out.push('(');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_literal(out, item);
            }
            out.push(')');
        }
        other => {
            let _ = write!(out, "{other}");
        }
    }
}

/// Splice parameter values into `sql` for display.
///
/// Every occurrence of a parameter name that is not part of a longer word is
/// replaced, ignoring case. Occurrences are found in `sql` itself, so text
/// spliced in for one parameter is never rewritten by another. Where two
/// names overlap, the occurrence starting first wins, then the longer one.
/// The result is meant for logs and diagnostics; it is never executed.
pub fn debug_sql(sql: &str, params: &Params) -> String {
    let mut spans: Vec<(Range<usize>, &Value)> = Vec::new();
    for (name, value) in params {
        let Ok(pattern) = Regex::new(&format!("(?i){}", regex::escape(name))) else {
            continue;
        };
        spans.extend(
            pattern
                .find_iter(sql)
                .filter(|m| stands_alone(sql, m.start(), m.end()))
                .map(|m| (m.range(), value)),
        );
    }
    spans.sort_by_key(|(range, _)| (range.start, Reverse(range.end)));

    let mut out = String::with_capacity(sql.len());
    let mut copied = 0;
    for (range, value) in spans {
        if range.start < copied {
            continue;
        }
        out.push_str(&sql[copied..range.start]);
        write_literal(&mut out, value);
        copied = range.end;
    }
    out.push_str(&sql[copied..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlscript_core::params;

    #[test]
    fn test_indexed_names_follow_count() {
        let mut sql = SqlBuilder::new();
        assert_eq!(sql.append_indexed_param(1), "@__p0_");
        sql.append_param("@name", "x").unwrap();
        assert_eq!(sql.append_indexed_param(2), "@__p2_");
        assert_eq!(sql.params().len(), 3);
    }

    #[test]
    fn test_duplicate_named_param_rejected() {
        let mut sql = SqlBuilder::new();
        sql.append_param("@Id", 1).unwrap();
        let err = sql.append_param("@id", 2).unwrap_err();
        match err {
            Error::InvalidArgument(e) => {
                assert_eq!(e.name, "name");
                assert!(e.message.contains("@id"));
            }
            _ => panic!("unexpected error"),
        }
        assert_eq!(sql.params().get("@ID"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_text_and_display() {
        let mut sql = SqlBuilder::new();
        sql.append("select 1").append_line("").append_line("select 2");
        assert_eq!(sql.text(), "select 1\nselect 2\n");
        assert_eq!(sql.to_string(), sql.text());

        let def = sql.clone().into_definition();
        assert_eq!(def.sql, "select 1\nselect 2\n");
    }

    #[test]
    fn test_debug_literals() {
        let sql = "insert into t values (@a, @b, @c, @d, @e)";
        let printed = debug_sql(
            sql,
            &params! {
                "@a" => Value::Null,
                "@b" => "it's",
                "@c" => 2.5,
                "@d" => vec![1, 2],
                "@e" => vec!["x".to_string(), "y".to_string()],
            },
        );
        assert_eq!(printed, "insert into t values (null, 'it''s', 2.5, (1, 2), ('x', 'y'))");
    }

    #[test]
    fn test_debug_respects_word_boundaries() {
        let printed = debug_sql(
            "@p1 + @P10 + x@p1 + @p1_a + @p1",
            &params! { "@p1" => 7 },
        );
        assert_eq!(printed, "7 + @P10 + x@p1 + @p1_a + 7");
    }

    #[test]
    fn test_debug_leaves_spliced_text_alone() {
        let printed = debug_sql(
            "select @a, @b",
            &params! { "@a" => "see @b", "@b" => 2 },
        );
        assert_eq!(printed, "select 'see @b', 2");
    }

    #[test]
    fn test_debug_overlapping_names_prefer_longer() {
        let printed = debug_sql("@a.b + @a", &params! { "@a" => 1, "@a.b" => 2 });
        assert_eq!(printed, "2 + 1");
    }

    #[test]
    fn test_debug_adjacent_occurrences() {
        let printed = debug_sql("(@a,@a)", &params! { "@A" => 1 });
        assert_eq!(printed, "(1,1)");
    }

    #[test]
    fn test_debug_without_params_is_identity() {
        assert_eq!(debug_sql("select @x", &Params::new()), "select @x");
    }
}
