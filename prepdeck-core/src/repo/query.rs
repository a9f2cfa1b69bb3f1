use chrono::{DateTime, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    Gte(String, Value),
}

impl Filter {
    pub fn column(&self) -> &str {
        match self {
            Filter::Eq(c, _) | Filter::Gte(c, _) => c,
        }
    }

    fn matches(&self, row: &Value) -> bool {
        match self {
            Filter::Eq(col, want) => row.get(col).map(|v| values_equal(v, want)).unwrap_or(false),
            Filter::Gte(col, min) => row
                .get(col)
                .and_then(|v| compare_values(v, min))
                .map(|o| o != Ordering::Less)
                .unwrap_or(false),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// Row selection shared by every store: equality and lower-bound filters,
/// an optional ordering column and an optional limit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: Uuid) -> Self {
        Self::all().eq("id", id.to_string())
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(column.into(), value.into()));
        self
    }

    pub fn gte(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Gte(column.into(), value.into()));
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.into(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }

    /// Filter, order (stable, so ties keep collection order) and truncate.
    pub fn apply(&self, rows: impl IntoIterator<Item = Value>) -> Vec<Value> {
        let mut v: Vec<Value> = rows.into_iter().filter(|r| self.matches(r)).collect();
        if let Some(order) = &self.order {
            v.sort_by(|a, b| {
                let o = match (a.get(&order.column), b.get(&order.column)) {
                    (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                if order.ascending {
                    o
                } else {
                    o.reverse()
                }
            });
        }
        if let Some(n) = self.limit {
            v.truncate(n);
        }
        v
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) | (Value::String(_), Value::String(_)) => {
            compare_values(a, b) == Some(Ordering::Equal)
        }
        _ => a == b,
    }
}

/// Numbers compare numerically, RFC 3339 strings compare as instants,
/// other strings lexically.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => match (parse_instant(x), parse_instant(y)) {
            (Some(tx), Some(ty)) => Some(tx.cmp(&ty)),
            _ => Some(x.cmp(y)),
        },
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s).ok().map(|d| d.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn timestamps_compare_as_instants() {
        let a = json!("2024-01-01T00:00:00Z");
        let b = json!("2024-01-01T00:00:00.500Z");
        assert_eq!(compare_values(&a, &b), Some(Ordering::Less));
    }

    #[test]
    fn apply_filters_orders_and_limits() {
        let rows = vec![
            json!({"id": "a", "n": 3, "s": "x"}),
            json!({"id": "b", "n": 1, "s": "y"}),
            json!({"id": "c", "n": 2, "s": "x"}),
        ];
        let q = Query::all().eq("s", "x").order_by("n", true).limit(1);
        let out = q.apply(rows);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["id"], "c");
    }

    #[test]
    fn gte_skips_rows_missing_the_column() {
        let rows = vec![json!({"id": "a"}), json!({"id": "b", "n": 5})];
        let out = Query::all().gte("n", 4).apply(rows);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["id"], "b");
    }
}
