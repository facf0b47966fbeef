use std::fmt::Write;

use crate::placeholders::rewrite_named_placeholders;
use crate::types::{NamedParams, ParamValue, RowValues};

pub(crate) fn extract_column_names<I, T, F>(columns: I, name: F) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> &str,
{
    columns
        .into_iter()
        .map(|col| name(&col).to_string())
        .collect()
}

fn quote_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for ch in text.chars() {
        if ch == '\'' {
            out.push('\'');
        }
        out.push(ch);
    }
    out.push('\'');
    out
}

/// ANSI SQL literal for a value: strings single-quoted with `''` escaping, blobs as `X'..'`.
#[must_use]
pub fn quote_literal(value: &RowValues) -> String {
    match value {
        RowValues::Int(i) => i.to_string(),
        RowValues::Float(f) if f.is_finite() => f.to_string(),
        RowValues::Float(f) => quote_text(&f.to_string()),
        RowValues::Text(s) => quote_text(s),
        RowValues::Bool(b) => i64::from(*b).to_string(),
        RowValues::Timestamp(dt) => quote_text(&dt.format("%F %T%.f").to_string()),
        RowValues::Null => "NULL".to_string(),
        RowValues::JSON(j) => quote_text(&j.to_string()),
        RowValues::Blob(bytes) => {
            let mut out = String::with_capacity(bytes.len() * 2 + 3);
            out.push_str("X'");
            for b in bytes {
                let _ = write!(out, "{b:02X}");
            }
            out.push('\'');
            out
        }
    }
}

/// Substitute quoted literals for placeholders. Lists render as comma-joined literals and
/// unknown placeholders are left as-is.
pub(crate) fn materialize_query<F>(sql: &str, params: &NamedParams, quote: F) -> String
where
    F: Fn(&RowValues) -> String,
{
    rewrite_named_placeholders(sql, |name| {
        params.get(name).map(|value| match value {
            ParamValue::Scalar(v) => quote(v),
            ParamValue::List(items) => items.iter().map(&quote).collect::<Vec<_>>().join(", "),
        })
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_by_type() {
        assert_eq!(quote_literal(&RowValues::Int(-4)), "-4");
        assert_eq!(quote_literal(&RowValues::Text("O'Brien".into())), "'O''Brien'");
        assert_eq!(quote_literal(&RowValues::Null), "NULL");
        assert_eq!(quote_literal(&RowValues::Bool(true)), "1");
        assert_eq!(quote_literal(&RowValues::Blob(vec![0xde, 0xad])), "X'DEAD'");
        assert_eq!(quote_literal(&RowValues::Float(f64::NAN)), "'NaN'");
    }

    #[test]
    fn materializes_scalars_and_lists() {
        let params = NamedParams::new()
            .bind("name", "a'b")
            .bind_list("ids", [1, 2]);
        let out = materialize_query(
            "SELECT * FROM t WHERE name = :name AND id IN (:ids) AND z = :missing",
            &params,
            quote_literal,
        );
        assert_eq!(
            out,
            "SELECT * FROM t WHERE name = 'a''b' AND id IN (1, 2) AND z = :missing"
        );
    }
}
