//! Structured listing filters.
//!
//! Optional command-line style criteria (`from`, `to`, `rating`, `tag`) are
//! parsed into a [`Predicate`] tree, which is then lowered to a SQL condition
//! with positional parameters against a particular [`Target`] table. No
//! caller-supplied text ever ends up inside the SQL string itself.

use chrono::NaiveDate;
use rusqlite::types::Value;

use crate::domain::AssetKind;
use crate::error::{Error, Result};

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Raw, all-optional filter arguments as they arrive from a user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Calendar date, `YYYY-MM-DD`, inclusive.
    pub from: Option<String>,
    /// Calendar date, `YYYY-MM-DD`, inclusive of the whole day.
    pub to: Option<String>,
    /// Operator and value, e.g. `>=3`.
    pub rating: Option<String>,
    /// Comma-separated tag names; an asset must carry all of them.
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
}

impl Comparison {
    // Two-character operators first so `<=` is not read as `<` + `=3`.
    const TOKENS: [(&'static str, Comparison); 5] = [
        ("<=", Comparison::Le),
        (">=", Comparison::Ge),
        ("<", Comparison::Lt),
        (">", Comparison::Gt),
        ("=", Comparison::Eq),
    ];

    pub fn as_sql(&self) -> &'static str {
        match self {
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
            Comparison::Eq => "=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches everything.
    All,
    /// Capture time within `[from, to]`, either bound optional.
    DateRange { from: Option<i64>, to: Option<i64> },
    Rating { op: Comparison, value: i64 },
    /// Asset is associated with the named tag.
    TagMembership(String),
    And(Vec<Predicate>),
}

/// Table and columns a predicate is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    pub table: &'a str,
    pub id_column: &'a str,
    pub time_column: &'a str,
    pub rating_column: &'a str,
    /// Association table and its asset column, when the target has one.
    pub tag_join: Option<(&'a str, &'a str)>,
}

impl Target<'static> {
    /// The archive catalog's table for `kind`.
    pub fn catalog(kind: AssetKind) -> Self {
        Target {
            table: kind.table(),
            id_column: "pid",
            time_column: "exposure_time",
            rating_column: "rating",
            tag_join: Some((kind.tag_table(), kind.tag_column())),
        }
    }
}

/// A lowered predicate: SQL condition text plus its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub sql: String,
    pub params: Vec<Value>,
}

impl FilterCriteria {
    /// Parse the criteria into a predicate. Malformed dates or rating
    /// expressions are rejected with [`Error::Usage`].
    pub fn to_predicate(&self) -> Result<Predicate> {
        let mut parts = Vec::new();

        let from = self.from.as_deref().map(start_of_day).transpose()?;
        let to = self
            .to
            .as_deref()
            .map(|d| start_of_day(d).map(|t| t + SECONDS_PER_DAY))
            .transpose()?;
        if from.is_some() || to.is_some() {
            parts.push(Predicate::DateRange { from, to });
        }

        if let Some(rating) = self.rating.as_deref() {
            let (op, value) = parse_rating(rating)?;
            parts.push(Predicate::Rating { op, value });
        }

        if let Some(tags) = self.tag.as_deref() {
            parts.extend(
                tags.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(|t| Predicate::TagMembership(t.to_string())),
            );
        }

        Ok(Predicate::all_of(parts))
    }
}

/// Unix timestamp of midnight UTC at the start of `date` (`YYYY-MM-DD`).
pub fn start_of_day(date: &str) -> Result<i64> {
    let day = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| Error::Usage(format!("expected a date like 2024-01-31, got '{date}'")))?;
    Ok(day
        .and_hms_opt(0, 0, 0)
        .map(|t| t.and_utc().timestamp())
        .unwrap_or_default())
}

/// Parse a rating filter such as `>=3` into its operator and value.
pub fn parse_rating(input: &str) -> Result<(Comparison, i64)> {
    let usage = || {
        Error::Usage(format!(
            "rating filter needs an operator and a rating, like '>=3'; got '{input}'"
        ))
    };
    let (op, rest) = Comparison::TOKENS
        .iter()
        .find_map(|(token, op)| input.strip_prefix(*token).map(|rest| (*op, rest)))
        .ok_or_else(usage)?;
    let value = rest.trim().parse::<i64>().map_err(|_| usage())?;
    Ok((op, value))
}

impl Predicate {
    /// Conjunction of `parts`, collapsing the trivial cases.
    pub fn all_of(parts: Vec<Predicate>) -> Predicate {
        let mut flat = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                Predicate::All => {}
                Predicate::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Predicate::All,
            1 => flat.remove(0),
            _ => Predicate::And(flat),
        }
    }

    /// Names of every tag the predicate requires.
    pub fn required_tags(&self) -> Vec<&str> {
        match self {
            Predicate::TagMembership(name) => vec![name.as_str()],
            Predicate::And(parts) => parts.iter().flat_map(|p| p.required_tags()).collect(),
            _ => Vec::new(),
        }
    }

    /// The same predicate with every tag condition removed.
    pub fn without_tags(&self) -> Predicate {
        match self {
            Predicate::TagMembership(_) => Predicate::All,
            Predicate::And(parts) => {
                Predicate::all_of(parts.iter().map(|p| p.without_tags()).collect())
            }
            other => other.clone(),
        }
    }

    /// Lower to a parameterized SQL condition over `target`.
    pub fn to_clause(&self, target: &Target<'_>) -> Result<Clause> {
        let mut params = Vec::new();
        let sql = self.lower(target, &mut params)?;
        Ok(Clause { sql, params })
    }

    fn lower(&self, target: &Target<'_>, params: &mut Vec<Value>) -> Result<String> {
        match self {
            Predicate::All => Ok("1".to_string()),
            Predicate::DateRange { from, to } => {
                let mut conds = Vec::new();
                if let Some(from) = from {
                    params.push(Value::Integer(*from));
                    conds.push(format!("{} >= ?", target.time_column));
                }
                if let Some(to) = to {
                    params.push(Value::Integer(*to));
                    conds.push(format!("{} <= ?", target.time_column));
                }
                if conds.is_empty() {
                    Ok("1".to_string())
                } else {
                    Ok(conds.join(" AND "))
                }
            }
            Predicate::Rating { op, value } => {
                params.push(Value::Integer(*value));
                Ok(format!("{} {} ?", target.rating_column, op.as_sql()))
            }
            Predicate::TagMembership(name) => {
                let (tag_table, asset_column) = target
                    .tag_join
                    .ok_or(Error::Unsupported("tag filtering on this source"))?;
                params.push(Value::Text(name.clone()));
                Ok(format!(
                    "{table}.{id} IN (SELECT {tag_table}.{asset_column} FROM {tag_table} \
                     INNER JOIN Tag ON {tag_table}.tag_id = Tag.tid WHERE Tag.name = ?)",
                    table = target.table,
                    id = target.id_column,
                ))
            }
            Predicate::And(parts) => {
                if parts.is_empty() {
                    return Ok("1".to_string());
                }
                let conds = parts
                    .iter()
                    .map(|p| p.lower(target, params).map(|sql| format!("({sql})")))
                    .collect::<Result<Vec<_>>>()?;
                Ok(conds.join(" AND "))
            }
        }
    }
}
