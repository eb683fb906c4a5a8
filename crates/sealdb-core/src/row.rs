//! Rows, filters and the exact-match predicate used by read/update/delete.

pub use serde_json::Value;
use serde_json::Number;

/// One record: column name to JSON-compatible value.
pub type Row = serde_json::Map<String, Value>;

/// Conjunctive exact-match predicate, column to expected value.
pub type Filter = serde_json::Map<String, Value>;

/// True when every filter entry matches the row. An empty filter matches
/// everything; a column absent from the row compares as `null`.
pub fn matches(row: &Row, filter: &Filter) -> bool {
    filter.iter().all(|(column, expected)| {
        let actual = row.get(column).unwrap_or(&Value::Null);
        values_equal(actual, expected)
    })
}

/// Structural equality, except that numbers compare by exact value so `1`
/// matches `1.0` but never a float that merely rounds to it.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).map_or(false, |y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

fn numbers_equal(x: &Number, y: &Number) -> bool {
    match (integer(x), integer(y)) {
        (Some(i), Some(j)) => i == j,
        (Some(i), None) => y.as_f64().map_or(false, |f| float_is_integer(f, i)),
        (None, Some(j)) => x.as_f64().map_or(false, |f| float_is_integer(f, j)),
        (None, None) => x.as_f64() == y.as_f64(),
    }
}

fn integer(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

// 2^64: every integral float below this converts to i128 without loss.
const INTEGER_FLOAT_BOUND: f64 = 18_446_744_073_709_551_616.0;

fn float_is_integer(f: f64, i: i128) -> bool {
    f.is_finite() && f.fract() == 0.0 && f.abs() < INTEGER_FLOAT_BOUND && f as i128 == i
}

/// Build a row from a JSON object literal; `None` for any other JSON value.
pub fn from_value(value: Value) -> Option<Row> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}
