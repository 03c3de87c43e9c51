use std::{collections::BTreeMap, fmt};

use jiff::Timestamp;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::entities::movie;

pub const RATING_MIN: f64 = 0.0;
pub const RATING_MAX: f64 = 10.0;

/// Object id of a stored movie: 12 bytes rendered as 24 lowercase hex digits.
///
/// The first four bytes are the big-endian creation second, the rest are random.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MovieId(String);

impl MovieId {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 12];
        // ids minted after 2106 keep the saturated prefix
        let secs = u32::try_from(Timestamp::now().as_second()).unwrap_or(u32::MAX);
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..].copy_from_slice(&uuid::Uuid::new_v4().as_bytes()[8..]);
        Self(hex::encode(bytes))
    }

    /// Returns `None` for anything that is not exactly 12 hex-encoded bytes.
    pub fn parse(raw: &str) -> Option<Self> {
        let bytes = hex::decode(raw).ok()?;
        (bytes.len() == 12).then(|| Self(hex::encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MovieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    pub director: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<movie::Model> for Movie {
    type Error = jiff::Error;

    fn try_from(row: movie::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: MovieId(row.id),
            title: row.title,
            director: row.director,
            year: row.year,
            genre: row.genre,
            rating: row.rating,
            created_at: Timestamp::from_millisecond(row.created_at)?,
            updated_at: Timestamp::from_millisecond(row.updated_at)?,
        })
    }
}

/// Field-keyed validation failures. Every violated field is reported.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
    pub fn add(&mut self, path: &'static str, message: impl Into<String>) {
        self.0.entry(path).or_insert_with(|| message.into());
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Movie validation failed: ")?;
        for (i, (path, message)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{path}: {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// One key of a request body, keeping "absent" apart from "explicitly null".
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Field {
    #[default]
    Absent,
    Null,
    Value(Value),
}

impl Field {
    fn from_body(body: &Map<String, Value>, key: &str) -> Self {
        match body.get(key) {
            None => Field::Absent,
            Some(Value::Null) => Field::Null,
            Some(value) => Field::Value(value.clone()),
        }
    }
}

/// A candidate record exactly as the client sent it, before casting.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MovieDraft {
    pub title: Field,
    pub director: Field,
    pub year: Field,
    pub genre: Field,
    pub rating: Field,
}

/// A fully validated record ready to be inserted.
#[derive(Clone, Debug, PartialEq)]
pub struct NewMovie {
    pub title: String,
    pub director: String,
    pub year: Option<i32>,
    pub genre: Option<String>,
    pub rating: Option<f64>,
}

/// Validated partial update. The outer `Option` is "supplied or not", the
/// inner one (for optional fields) is "set or cleared".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MovieChanges {
    pub title: Option<String>,
    pub director: Option<String>,
    pub year: Option<Option<i32>>,
    pub genre: Option<Option<String>>,
    pub rating: Option<Option<f64>>,
}

impl MovieDraft {
    /// Reads the known keys of a JSON object. Unknown and server-managed keys
    /// (`id`, `createdAt`, `updatedAt`) are ignored.
    pub fn from_json(body: &Map<String, Value>) -> Self {
        Self {
            title: Field::from_body(body, "title"),
            director: Field::from_body(body, "director"),
            year: Field::from_body(body, "year"),
            genre: Field::from_body(body, "genre"),
            rating: Field::from_body(body, "rating"),
        }
    }

    pub fn validate_new(&self) -> Result<NewMovie, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let title = required_text("title", &self.title, &mut errors);
        let director = required_text("director", &self.director, &mut errors);
        let year = optional("year", &self.year, cast_year, &mut errors).flatten();
        let genre = optional("genre", &self.genre, cast_genre, &mut errors).flatten();
        let rating = optional("rating", &self.rating, cast_rating, &mut errors).flatten();

        match (title, director) {
            (Some(title), Some(director)) => {
                errors.into_result(NewMovie { title, director, year, genre, rating })
            }
            _ => Err(errors),
        }
    }

    /// Only supplied fields are checked; absent ones stay untouched.
    pub fn validate_changes(&self) -> Result<MovieChanges, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let changes = MovieChanges {
            title: supplied(&self.title)
                .and_then(|field| required_text("title", field, &mut errors)),
            director: supplied(&self.director)
                .and_then(|field| required_text("director", field, &mut errors)),
            year: optional("year", &self.year, cast_year, &mut errors),
            genre: optional("genre", &self.genre, cast_genre, &mut errors),
            rating: optional("rating", &self.rating, cast_rating, &mut errors),
        };

        errors.into_result(changes)
    }
}

fn supplied(field: &Field) -> Option<&Field> {
    (*field != Field::Absent).then_some(field)
}

fn required_text(path: &'static str, field: &Field, errors: &mut ValidationErrors) -> Option<String> {
    let value = match field {
        Field::Absent | Field::Null => None,
        Field::Value(value) => match cast_text(path, value) {
            Ok(text) => Some(text).filter(|t| !t.is_empty()),
            Err(message) => {
                errors.add(path, message);
                return None;
            }
        },
    };
    if value.is_none() {
        errors.add(path, format!("Path '{path}' is required."));
    }
    value
}

/// `None` when the field was absent or invalid, `Some(None)` when it clears.
fn optional<T>(
    path: &'static str,
    field: &Field,
    cast: fn(&'static str, &Value) -> Result<Option<T>, String>,
    errors: &mut ValidationErrors,
) -> Option<Option<T>> {
    match field {
        Field::Absent => None,
        Field::Null => Some(None),
        Field::Value(value) => match cast(path, value) {
            Ok(cast) => Some(cast),
            Err(message) => {
                errors.add(path, message);
                None
            }
        },
    }
}

fn cast_text(path: &str, value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!("Cast to string failed for value \"{other}\" at path '{path}'.")),
    }
}

fn cast_number(path: &str, value: &Value) -> Result<Option<f64>, String> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    };
    match parsed {
        Some(n) => Ok(Some(n)),
        None => {
            let shown = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Err(format!("Cast to Number failed for value \"{shown}\" at path '{path}'."))
        }
    }
}

fn cast_genre(path: &'static str, value: &Value) -> Result<Option<String>, String> {
    cast_text(path, value).map(Some)
}

fn cast_year(path: &'static str, value: &Value) -> Result<Option<i32>, String> {
    let Some(n) = cast_number(path, value)? else {
        return Ok(None);
    };
    if n.fract() != 0.0 {
        return Err(format!("Path '{path}' must be an integer."));
    }
    if n < f64::from(i32::MIN) || n > f64::from(i32::MAX) {
        return Err(format!("Path '{path}' ({n}) is outside the supported range."));
    }
    Ok(Some(n as i32))
}

fn cast_rating(path: &'static str, value: &Value) -> Result<Option<f64>, String> {
    let Some(n) = cast_number(path, value)? else {
        return Ok(None);
    };
    if n > RATING_MAX {
        return Err(format!(
            "Path '{path}' ({n}) is more than maximum allowed value ({RATING_MAX})."
        ));
    }
    if n < RATING_MIN {
        return Err(format!(
            "Path '{path}' ({n}) is less than minimum allowed value ({RATING_MIN})."
        ));
    }
    Ok(Some(n))
}
