use serde_json::Value;

use super::error::FilterError;
use super::types::{is_valid_identifier, FilterOp, FilterWhereInfo};

/// Compiles a JSON where-clause into parameterised SQL.
///
/// Values never reach the SQL text: every operand is pushed onto `param_values`
/// and referenced as `$n`. Column names are interpolated and therefore validated.
pub struct FilterWhere {
    param_values: Vec<Value>,
    starting_param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            starting_param_index,
        }
    }

    pub fn generate(where_data: &Value, starting_param_index: usize) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = Self::new(starting_param_index);
        let clause = filter_where.build_clause(where_data)?;
        Ok((clause.unwrap_or_else(|| "1=1".to_string()), filter_where.param_values))
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            Value::String(_) => Err(FilterError::MalformedWhere("raw SQL is not accepted")),
            _ => Err(FilterError::MalformedWhere("expected an object")),
        }
    }

    fn build_clause(&mut self, where_data: &Value) -> Result<Option<String>, FilterError> {
        let obj = match where_data {
            Value::Null => return Ok(None),
            Value::Object(obj) => obj,
            _ => return Err(FilterError::MalformedWhere("nested clauses must be objects")),
        };

        // (sql, needs parentheses when joined with siblings)
        let mut parts: Vec<(String, bool)> = Vec::new();
        for (key, value) in obj {
            if key.starts_with('$') {
                parts.push((self.build_logical(key, value)?, true));
            } else {
                parts.extend(self.build_field(key, value)?.into_iter().map(|sql| (sql, false)));
            }
        }

        Ok(match parts.len() {
            0 => None,
            1 => parts.pop().map(|(sql, _)| sql),
            _ => Some(
                parts
                    .into_iter()
                    .map(|(sql, compound)| if compound { format!("({})", sql) } else { sql })
                    .collect::<Vec<_>>()
                    .join(" AND "),
            ),
        })
    }

    fn build_logical(&mut self, op: &str, value: &Value) -> Result<String, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::operand(op, "requires an array"))?;
                let mut sql_parts = Vec::new();
                for v in arr {
                    if let Some(sql) = self.build_clause(v)? {
                        sql_parts.push(format!("({})", sql));
                    }
                }
                if sql_parts.is_empty() {
                    // Empty conjunction is true, empty disjunction is false
                    return Ok(if op == "$and" { "1=1" } else { "1=0" }.to_string());
                }
                let joiner = if op == "$and" { " AND " } else { " OR " };
                Ok(sql_parts.join(joiner))
            }
            _ => Err(FilterError::UnknownOperator(op.to_string())),
        }
    }

    fn build_field(&mut self, field: &str, value: &Value) -> Result<Vec<String>, FilterError> {
        if !is_valid_identifier(field) {
            return Err(FilterError::identifier("column", field));
        }

        let mut conditions = Vec::new();
        match value {
            Value::Object(obj) if obj.keys().all(|k| k.starts_with('$')) && !obj.is_empty() => {
                for (op_key, op_val) in obj {
                    let operator = FilterOp::parse(op_key)
                        .ok_or_else(|| FilterError::UnknownOperator(op_key.to_string()))?;
                    conditions.push(FilterWhereInfo {
                        column: field.to_string(),
                        operator,
                        data: op_val.clone(),
                    });
                }
            }
            _ => {
                // Implicit equality: { field: value }
                conditions.push(FilterWhereInfo {
                    column: field.to_string(),
                    operator: FilterOp::Eq,
                    data: value.clone(),
                });
            }
        }

        conditions.iter().map(|c| self.build_sql_condition(c)).collect()
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        let quoted_column = format!("\"{}\"", condition.column);
        let data = &condition.data;
        match condition.operator {
            FilterOp::Eq => {
                if data.is_null() {
                    Ok(format!("{} IS NULL", quoted_column))
                } else {
                    Ok(format!("{} = {}", quoted_column, self.param(data.clone())))
                }
            }
            FilterOp::Ne => {
                if data.is_null() {
                    Ok(format!("{} IS NOT NULL", quoted_column))
                } else {
                    Ok(format!("{} <> {}", quoted_column, self.param(data.clone())))
                }
            }
            FilterOp::ILike => Ok(format!("{} ILIKE {}", quoted_column, self.string_param(data)?)),
            FilterOp::In => match data {
                Value::Array(values) if values.is_empty() => Ok("1=0".to_string()),
                Value::Array(values) => {
                    let params: Vec<String> = values.iter().map(|v| self.param(v.clone())).collect();
                    Ok(format!("{} IN ({})", quoted_column, params.join(", ")))
                }
                _ => Err(FilterError::operand("$in", "requires an array")),
            },
            FilterOp::Contains => match data {
                Value::Array(_) | Value::Object(_) => {
                    Ok(format!("{} @> {}::jsonb", quoted_column, self.param(data.clone())))
                }
                _ => Err(FilterError::operand("$contains", "requires an array or object")),
            },
        }
    }

    fn string_param(&mut self, data: &Value) -> Result<String, FilterError> {
        match data {
            Value::String(_) => Ok(self.param(data.clone())),
            _ => Err(FilterError::operand("$ilike", "requires a string")),
        }
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        format!("${}", self.starting_param_index + self.param_values.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn implicit_equality_and_operators() {
        let (sql, params) = FilterWhere::generate(
            &json!({ "name": "Jo", "user_id": { "$in": [1, 2] } }),
            0,
        )
        .unwrap();
        assert_eq!(sql, "\"name\" = $1 AND \"user_id\" IN ($2, $3)");
        assert_eq!(params, vec![json!("Jo"), json!(1), json!(2)]);
    }

    #[test]
    fn nested_logical_operators_number_params_sequentially() {
        let where_data = json!({
            "$and": [
                { "name": { "$ilike": "%jo%" } },
                { "$or": [
                    { "name": { "$ilike": "%smith%" } },
                    { "emails": { "$contains": [{ "value": "smith" }] } }
                ]}
            ]
        });
        let (sql, params) = FilterWhere::generate(&where_data, 0).unwrap();
        assert_eq!(
            sql,
            "(\"name\" ILIKE $1) AND ((\"name\" ILIKE $2) OR (\"emails\" @> $3::jsonb))"
        );
        assert_eq!(params.len(), 3);
        assert_eq!(params[2], json!([{ "value": "smith" }]));
    }

    #[test]
    fn starting_index_offsets_placeholders() {
        let (sql, _) = FilterWhere::generate(&json!({ "id": 5 }), 3).unwrap();
        assert_eq!(sql, "\"id\" = $4");
    }

    #[test]
    fn empty_in_never_matches() {
        let (sql, params) = FilterWhere::generate(&json!({ "user_id": { "$in": [] } }), 0).unwrap();
        assert_eq!(sql, "1=0");
        assert!(params.is_empty());
    }

    #[test]
    fn empty_where_matches_everything() {
        let (sql, _) = FilterWhere::generate(&json!({}), 0).unwrap();
        assert_eq!(sql, "1=1");
        let (sql, _) = FilterWhere::generate(&json!({ "$and": [] }), 0).unwrap();
        assert_eq!(sql, "1=1");
    }

    #[test]
    fn sibling_disjunction_is_parenthesised() {
        let (sql, _) = FilterWhere::generate(
            &json!({ "$or": [{ "name": "a" }, { "name": "b" }], "user_id": 1 }),
            0,
        )
        .unwrap();
        assert_eq!(sql, "((\"name\" = $1) OR (\"name\" = $2)) AND \"user_id\" = $3");
    }

    #[test]
    fn null_comparisons() {
        let (sql, params) =
            FilterWhere::generate(&json!({ "job_title": null, "organization_id": { "$ne": null } }), 0).unwrap();
        assert_eq!(sql, "\"job_title\" IS NULL AND \"organization_id\" IS NOT NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn not_equal_binds_a_parameter() {
        let (sql, params) = FilterWhere::generate(&json!({ "name": { "$ne": "Jo" } }), 0).unwrap();
        assert_eq!(sql, "\"name\" <> $1");
        assert_eq!(params, vec![json!("Jo")]);
    }

    #[test]
    fn operand_shapes_are_checked() {
        let err = FilterWhere::generate(&json!({ "user_id": { "$in": 3 } }), 0).unwrap_err();
        assert_eq!(err, FilterError::operand("$in", "requires an array"));
        let err = FilterWhere::generate(&json!({ "name": { "$ilike": 3 } }), 0).unwrap_err();
        assert_eq!(err, FilterError::operand("$ilike", "requires a string"));
        let err = FilterWhere::generate(&json!({ "emails": { "$contains": "x" } }), 0).unwrap_err();
        assert_eq!(err, FilterError::operand("$contains", "requires an array or object"));
        let err = FilterWhere::generate(&json!({ "$or": { "name": "a" } }), 0).unwrap_err();
        assert_eq!(err, FilterError::operand("$or", "requires an array"));
    }

    #[test]
    fn only_the_emitted_operator_set_is_accepted() {
        for op in ["$gt", "$lte", "$like", "$nin"] {
            let mut condition = serde_json::Map::new();
            condition.insert(op.to_string(), json!("x"));
            let err = FilterWhere::generate(&json!({ "name": Value::Object(condition) }), 0).unwrap_err();
            assert_eq!(err, FilterError::UnknownOperator(op.to_string()));
        }
        let err = FilterWhere::generate(&json!({ "$not": { "name": "x" } }), 0).unwrap_err();
        assert_eq!(err, FilterError::UnknownOperator("$not".to_string()));
    }

    #[test]
    fn rejects_injection_shaped_columns() {
        let err = FilterWhere::generate(&json!({ "name\" OR 1=1 --": "x" }), 0).unwrap_err();
        assert!(matches!(err, FilterError::Identifier { kind: "column", .. }));
    }

    #[test]
    fn rejects_unknown_operators_and_raw_sql() {
        let err = FilterWhere::generate(&json!({ "name": { "$regex": "x" } }), 0).unwrap_err();
        assert_eq!(err, FilterError::UnknownOperator("$regex".to_string()));
        assert!(FilterWhere::validate(&json!("1=1; DROP TABLE persons")).is_err());
    }
}
