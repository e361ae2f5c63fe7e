use std::collections::{BTreeMap, BTreeSet};

use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::{authorize, AppState, MockError};

const MAX_RECORDS: i64 = 10_000;

/// Predefined schemas served by `GET /v1/sozo/schemas`.
pub const BUILTIN_SCHEMAS: [(&str, &[(&str, &str)]); 2] = [
    (
        "saas_customers_v1",
        &[
            ("user_id", "uuid4"),
            ("email", "email"),
            ("plan", "choice:free,pro,enterprise"),
            ("mrr", "float:0-500"),
            ("churned", "boolean:0.15"),
        ],
    ),
    (
        "ecommerce_orders_v1",
        &[
            ("order_id", "uuid4"),
            ("customer", "name"),
            ("amount", "float:5-900"),
            ("items", "int:1-12"),
            ("ordered_on", "date"),
        ],
    ),
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBody {
    pub records: i64,
    pub schema: Option<BTreeMap<String, String>>,
    pub schema_name: Option<String>,
    pub seed: Option<u64>,
}

/// splitmix64; enough for stable fake data.
struct Rng(u64);

impl Rng {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`.
    fn unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: u64) -> u64 {
        if n == 0 {
            0
        } else {
            self.next_u64() % n
        }
    }
}

const FIRST_NAMES: [&str; 6] = ["Ada", "Grace", "Linus", "Barbara", "Ken", "Radia"];
const LAST_NAMES: [&str; 5] = ["Lovelace", "Hopper", "Torvalds", "Liskov", "Perlman"];

fn parse_range(args: &str) -> Option<(f64, f64)> {
    let (lo, hi) = args.split_once('-')?;
    let lo: f64 = lo.trim().parse().ok()?;
    let hi: f64 = hi.trim().parse().ok()?;
    (lo <= hi).then_some((lo, hi))
}

/// Kind of a type spec, used as the stats `type`.
fn kind(spec: &str) -> &str {
    spec.split_once(':').map_or(spec, |(kind, _)| kind)
}

fn generate_value(spec: &str, rng: &mut Rng) -> Value {
    let (kind, args) = spec.split_once(':').unwrap_or((spec, ""));
    match kind {
        "uuid4" | "uuid" => {
            let id = Uuid::from_u64_pair(rng.next_u64(), rng.next_u64());
            json!(id.to_string())
        }
        "email" => json!(format!("user{}@example.com", rng.below(100_000))),
        "name" => json!(format!(
            "{} {}",
            FIRST_NAMES[rng.below(FIRST_NAMES.len() as u64) as usize],
            LAST_NAMES[rng.below(LAST_NAMES.len() as u64) as usize]
        )),
        "choice" => {
            let options: Vec<&str> = args
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .collect();
            if options.is_empty() {
                Value::Null
            } else {
                json!(options[rng.below(options.len() as u64) as usize])
            }
        }
        "float" => {
            let (lo, hi) = parse_range(args).unwrap_or((0.0, 1.0));
            let value = lo + rng.unit() * (hi - lo);
            json!((value * 100.0).round() / 100.0)
        }
        "int" => {
            let (lo, hi) = parse_range(args).unwrap_or((0.0, 100.0));
            let (lo, hi) = (lo as i64, hi as i64);
            json!(lo + rng.below((hi - lo + 1) as u64) as i64)
        }
        "boolean" | "bool" => {
            let p: f64 = args.parse().unwrap_or(0.5);
            json!(rng.unit() < p)
        }
        "date" => {
            let day = rng.below(365);
            let (month, day) = (day / 31 + 1, day % 28 + 1);
            json!(format!("2025-{month:02}-{day:02}"))
        }
        _ => json!(format!("{kind}_{}", rng.below(1000))),
    }
}

fn column_stats(spec: &str, values: &[&Value]) -> Value {
    let mut stats = json!({"type": kind(spec)});
    let numbers: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).collect();
    if !numbers.is_empty() && numbers.len() == values.len() {
        let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
        let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
        stats["min"] = json!(min);
        stats["max"] = json!(max);
        stats["mean"] = json!(mean);
        return stats;
    }
    match kind(spec) {
        "choice" | "boolean" | "bool" => {
            let mut counts: BTreeMap<String, u64> = BTreeMap::new();
            for value in values {
                let label = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                *counts.entry(label).or_default() += 1;
            }
            stats["values"] = json!(counts);
        }
        _ => {
            let unique: BTreeSet<String> = values.iter().map(|v| v.to_string()).collect();
            stats["uniqueCount"] = json!(unique.len());
        }
    }
    stats
}

fn builtin(name: &str) -> Option<Vec<(String, String)>> {
    BUILTIN_SCHEMAS
        .iter()
        .find(|(schema, _)| *schema == name)
        .map(|(_, columns)| {
            columns
                .iter()
                .map(|(column, spec)| (column.to_string(), spec.to_string()))
                .collect()
        })
}

pub async fn generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<GenerateBody>,
) -> Result<Json<Value>, MockError> {
    authorize(&state, &headers)?;
    if !(1..=MAX_RECORDS).contains(&body.records) {
        return Err(MockError::invalid(
            StatusCode::BAD_REQUEST,
            "records",
            format!("records must be between 1 and {MAX_RECORDS}"),
        ));
    }
    // An inline schema wins over a named one.
    let columns: Vec<(String, String)> = match (body.schema, body.schema_name) {
        (Some(schema), _) if !schema.is_empty() => schema.into_iter().collect(),
        (_, Some(name)) => builtin(&name).ok_or_else(|| {
            MockError::invalid(
                StatusCode::UNPROCESSABLE_ENTITY,
                "schemaName",
                format!("unknown schema '{name}'"),
            )
        })?,
        _ => {
            return Err(MockError::invalid(
                StatusCode::BAD_REQUEST,
                "schema",
                "either schema or schemaName is required",
            ))
        }
    };

    let seed = body
        .seed
        .unwrap_or_else(|| Uuid::new_v4().as_u64_pair().0);
    let mut rng = Rng(seed);
    let rows: Vec<Map<String, Value>> = (0..body.records)
        .map(|_| {
            columns
                .iter()
                .map(|(name, spec)| (name.clone(), generate_value(spec, &mut rng)))
                .collect()
        })
        .collect();

    let mut stats = Map::new();
    for (name, spec) in &columns {
        let values: Vec<&Value> = rows.iter().filter_map(|row| row.get(name)).collect();
        stats.insert(name.clone(), column_stats(spec, &values));
    }
    tracing::debug!(records = rows.len(), seed, "generated synthetic rows");

    let names: Vec<&String> = columns.iter().map(|(name, _)| name).collect();
    Ok(Json(json!({
        "columns": names,
        "rows": rows,
        "stats": stats,
    })))
}

pub async fn list_schemas(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, MockError> {
    authorize(&state, &headers)?;
    let schemas: Vec<Value> = BUILTIN_SCHEMAS
        .iter()
        .map(|(name, columns)| {
            let columns: Map<String, Value> = columns
                .iter()
                .map(|(column, spec)| (column.to_string(), json!(spec)))
                .collect();
            json!({"name": name, "columns": columns})
        })
        .collect();
    Ok(Json(json!({"schemas": schemas})))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_values() {
        let mut a = Rng(42);
        let mut b = Rng(42);
        for spec in ["uuid4", "email", "choice:a,b,c", "float:0-500", "int:1-3", "boolean:0.5"] {
            assert_eq!(generate_value(spec, &mut a), generate_value(spec, &mut b));
        }
    }

    #[test]
    fn values_respect_ranges() {
        let mut rng = Rng(7);
        for _ in 0..200 {
            let f = generate_value("float:10-20", &mut rng).as_f64().unwrap();
            assert!((10.0..=20.0).contains(&f));
            let i = generate_value("int:1-3", &mut rng).as_i64().unwrap();
            assert!((1..=3).contains(&i));
            let c = generate_value("choice:free,pro", &mut rng);
            assert!(c == "free" || c == "pro");
        }
    }

    #[test]
    fn stats_by_kind() {
        let numbers = [json!(1.0), json!(3.0)];
        let stats = column_stats("float:0-5", &numbers.iter().collect::<Vec<_>>());
        assert_eq!(stats["type"], "float");
        assert_eq!(stats["mean"], 2.0);

        let plans = [json!("pro"), json!("pro"), json!("free")];
        let stats = column_stats("choice:free,pro", &plans.iter().collect::<Vec<_>>());
        assert_eq!(stats["values"]["pro"], 2);

        let emails = [json!("a@x"), json!("a@x")];
        let stats = column_stats("email", &emails.iter().collect::<Vec<_>>());
        assert_eq!(stats["uniqueCount"], 1);
    }

    #[test]
    fn builtin_lookup() {
        let columns = builtin("saas_customers_v1").unwrap();
        assert_eq!(columns[0], ("user_id".to_string(), "uuid4".to_string()));
        assert!(builtin("missing").is_none());
    }
}
