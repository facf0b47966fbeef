//! List parameter expansion.
//!
//! A parameter bound to a sequence is rewritten into one generated scalar placeholder per
//! element, so `IN (:ids)` with three ids becomes
//! `IN (:sqlr_list_ids_0, :sqlr_list_ids_1, :sqlr_list_ids_2)`.

use std::collections::{BTreeMap, HashSet};

use crate::error::SqlResilientError;
use crate::placeholders::{named_placeholders, rewrite_named_placeholders};
use crate::types::{BoundParams, NamedParams, ParamValue};

/// Namespace prefix for generated placeholder names.
pub const EXPANDED_PARAM_PREFIX: &str = "sqlr_list_";

/// Query text and scalar parameters ready to hand to a driver.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedQuery {
    pub sql: String,
    pub params: BoundParams,
}

/// Name generated for element `index` of list parameter `key`.
#[must_use]
pub fn generated_name(key: &str, index: usize) -> String {
    format!("{EXPANDED_PARAM_PREFIX}{key}_{index}")
}

/// Expand list-valued parameters into generated scalar placeholders.
///
/// The caller's parameters are only borrowed; on error nothing has been modified.
///
/// # Errors
/// Returns [`SqlResilientError::ParamCollision`] if a generated name is already a key of
/// `params`, already appears as a placeholder in `sql`, or was generated for another list.
/// Returns [`SqlResilientError::Parameter`] if a list is empty.
pub fn expand_params(sql: &str, params: &NamedParams) -> Result<ExpandedQuery, SqlResilientError> {
    let in_query: HashSet<&str> = named_placeholders(sql).into_iter().map(|p| p.name).collect();
    let mut generated: HashSet<String> = HashSet::new();
    let mut replacements: BTreeMap<&str, String> = BTreeMap::new();
    let mut bound = BoundParams::new();

    for (key, value) in params {
        match value {
            ParamValue::Scalar(scalar) => {
                bound.insert(key, scalar.clone());
            }
            ParamValue::List(items) => {
                if items.is_empty() {
                    return Err(SqlResilientError::Parameter(format!(
                        "list parameter `{key}` is empty; cannot expand to an empty placeholder list"
                    )));
                }
                let mut tokens = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let name = generated_name(key, index);
                    if params.contains_key(&name)
                        || in_query.contains(name.as_str())
                        || generated.contains(&name)
                    {
                        return Err(SqlResilientError::ParamCollision {
                            name,
                            query: sql.to_owned(),
                        });
                    }
                    tokens.push(format!(":{name}"));
                    bound.insert(&name, item.clone());
                    generated.insert(name);
                }
                replacements.insert(key.as_str(), tokens.join(", "));
            }
        }
    }

    let rewritten = rewrite_named_placeholders(sql, |name| replacements.get(name).cloned());
    Ok(ExpandedQuery {
        sql: rewritten.into_owned(),
        params: bound,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RowValues;

    #[test]
    fn expands_in_clause() {
        let params = NamedParams::new().bind_list("ids", [1, 2, 3]);
        let out = expand_params("SELECT name FROM t WHERE id IN (:ids)", &params).unwrap();
        assert_eq!(
            out.sql,
            "SELECT name FROM t WHERE id IN (:sqlr_list_ids_0, :sqlr_list_ids_1, :sqlr_list_ids_2)"
        );
        assert_eq!(out.params.len(), 3);
        assert!(!out.params.contains_key("ids"));
        assert_eq!(out.params.get("sqlr_list_ids_2"), Some(&RowValues::Int(3)));
    }

    #[test]
    fn scalars_pass_through_unchanged() {
        let params = NamedParams::new().bind("id", 9).bind("name", "bob");
        let sql = "UPDATE t SET name = :name WHERE id = :id";
        let out = expand_params(sql, &params).unwrap();
        assert_eq!(out.sql, sql);
        assert_eq!(out.params.len(), 2);
    }

    #[test]
    fn does_not_touch_longer_names() {
        let params = NamedParams::new()
            .bind_list("id", [5, 6])
            .bind("identifier", "x");
        let out = expand_params("WHERE a = :identifier AND b IN (:id)", &params).unwrap();
        assert_eq!(
            out.sql,
            "WHERE a = :identifier AND b IN (:sqlr_list_id_0, :sqlr_list_id_1)"
        );
    }

    #[test]
    fn every_occurrence_is_expanded() {
        let params = NamedParams::new().bind_list("s", ["a", "b"]);
        let out = expand_params("WHERE x IN (:s) OR y IN (:s)", &params).unwrap();
        assert_eq!(
            out.sql,
            "WHERE x IN (:sqlr_list_s_0, :sqlr_list_s_1) OR y IN (:sqlr_list_s_0, :sqlr_list_s_1)"
        );
        assert_eq!(out.params.len(), 2);
    }

    #[test]
    fn collision_with_supplied_key() {
        let params = NamedParams::new()
            .bind_list("ids", [1, 2])
            .bind("sqlr_list_ids_1", 99);
        let err = expand_params("WHERE id IN (:ids) OR id = :sqlr_list_ids_1", &params).unwrap_err();
        assert!(
            matches!(err, SqlResilientError::ParamCollision { ref name, .. } if name == "sqlr_list_ids_1")
        );
    }

    #[test]
    fn collision_with_placeholder_in_query() {
        let params = NamedParams::new().bind_list("ids", [1]);
        let err = expand_params("WHERE id IN (:ids) AND y = :sqlr_list_ids_0", &params).unwrap_err();
        assert!(matches!(err, SqlResilientError::ParamCollision { .. }));
    }

    #[test]
    fn empty_list_is_rejected() {
        let params = NamedParams::new().bind_list("ids", Vec::<i64>::new());
        let err = expand_params("WHERE id IN (:ids)", &params).unwrap_err();
        assert!(matches!(err, SqlResilientError::Parameter(_)));
    }
}
