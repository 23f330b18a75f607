//! Models, lookups and field maps.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ServiceProgrammingError;

/// A persisted record type.
///
/// Field access goes through serde, so a model only declares its name,
/// its field list and how to reach its primary key.
///
/// # Examples
///
/// ```
/// use heaven::services::Model;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
/// #[serde(default)]
/// struct Article {
///     id: Option<i64>,
///     title: String,
///     published: bool,
/// }
///
/// impl Model for Article {
///     const NAME: &'static str = "Article";
///     const FIELDS: &'static [&'static str] = &["id", "title", "published"];
///
///     fn pk(&self) -> Option<i64> {
///         self.id
///     }
///
///     fn set_pk(&mut self, pk: i64) {
///         self.id = Some(pk);
///     }
/// }
///
/// let mut article = Article { id: Some(3), ..Default::default() };
/// article.set_field("title", "Hello".into()).unwrap();
/// assert_eq!(article.title, "Hello");
/// assert_eq!(article.describe(), "Article object (3)");
/// assert!(article.field("tittle").is_err());
/// ```
pub trait Model: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Model name used in messages.
    const NAME: &'static str;
    /// Every field name, primary key included.
    const FIELDS: &'static [&'static str];
    /// Name of the primary key field.
    const PK: &'static str = "id";

    /// Primary key, `None` until saved.
    fn pk(&self) -> Option<i64>;

    /// Assigns the primary key.
    fn set_pk(&mut self, pk: i64);

    /// Fails unless `name` is one of [`Model::FIELDS`].
    fn check_field(name: &str) -> Result<(), ServiceProgrammingError> {
        if Self::FIELDS.contains(&name) {
            return Ok(());
        }
        Err(ServiceProgrammingError::UnknownField {
            model: Self::NAME,
            field: name.to_string(),
            choices: Self::FIELDS.join(", "),
        })
    }

    /// All fields as a map.
    fn to_fields(&self) -> Result<Fields, ServiceProgrammingError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(Fields(map)),
            Ok(other) => Err(mismatch::<Self>(format!("{other}"))),
            Err(err) => Err(mismatch::<Self>(err.to_string())),
        }
    }

    /// Value of one field.
    fn field(&self, name: &str) -> Result<Value, ServiceProgrammingError> {
        Self::check_field(name)?;
        Ok(self.to_fields()?.0.remove(name).unwrap_or(Value::Null))
    }

    /// Assigns one field.
    fn set_field(&mut self, name: &str, value: Value) -> Result<(), ServiceProgrammingError> {
        Self::check_field(name)?;
        let mut fields = self.to_fields()?;
        fields.0.insert(name.to_string(), value);
        *self = Self::from_fields(fields)?;
        Ok(())
    }

    /// Builds an instance from a field map. Missing fields take the model's
    /// serde defaults.
    fn from_fields(fields: Fields) -> Result<Self, ServiceProgrammingError> {
        for name in fields.names() {
            Self::check_field(name)?;
        }
        serde_json::from_value(Value::Object(fields.0)).map_err(|e| mismatch::<Self>(e.to_string()))
    }

    /// `"<NAME> object (<pk>)"`.
    fn describe(&self) -> String {
        match self.pk() {
            Some(pk) => format!("{} object ({pk})", Self::NAME),
            None => format!("{} object (None)", Self::NAME),
        }
    }
}

fn mismatch<M: Model>(found: String) -> ServiceProgrammingError {
    ServiceProgrammingError::ModelMismatch {
        service: M::NAME.to_string(),
        expected: M::NAME,
        found,
    }
}

/// Field names mapped to values.
///
/// ```
/// use heaven::services::Fields;
///
/// let fields = Fields::new().set("title", "Hello").set("published", true);
/// assert_eq!(fields.len(), 2);
/// assert_eq!(fields.get("published"), Some(&true.into()));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(Map<String, Value>);

impl Fields {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Value of a field, if present.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Field names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.keys().map(String::as_str)
    }

    /// Iterates over names and values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Removes a field and returns its value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    /// Unwraps the underlying map.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Fields {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Equality filters, all of which must match.
///
/// ```
/// use heaven::services::Lookup;
///
/// let lookup = Lookup::new().exact("title", "Hello").exact("published", true);
/// assert_eq!(lookup.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lookup(Vec<(String, Value)>);

impl Lookup {
    /// A lookup matching everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// A lookup on the primary key of `M`.
    pub fn pk<M: Model>(pk: i64) -> Self {
        Self::new().exact(M::PK, pk)
    }

    /// Adds a `field == value` filter.
    pub fn exact(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.push((field.into(), value.into()));
        self
    }

    /// Number of filters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no filters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fails on the first filter naming an unknown field.
    pub fn check<M: Model>(&self) -> Result<(), ServiceProgrammingError> {
        self.0.iter().try_for_each(|(field, _)| M::check_field(field))
    }

    /// Returns `true` if `instance` satisfies every filter.
    pub fn matches<M: Model>(&self, instance: &M) -> Result<bool, ServiceProgrammingError> {
        let fields = instance.to_fields()?;
        for (field, expected) in &self.0 {
            M::check_field(field)?;
            if fields.get(field).unwrap_or(&Value::Null) != expected {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{field}={value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    #[serde(default)]
    pub(crate) struct Article {
        pub id: Option<i64>,
        pub title: String,
        pub views: i64,
        pub published: bool,
    }

    impl Model for Article {
        const NAME: &'static str = "Article";
        const FIELDS: &'static [&'static str] = &["id", "title", "views", "published"];

        fn pk(&self) -> Option<i64> {
            self.id
        }

        fn set_pk(&mut self, pk: i64) {
            self.id = Some(pk);
        }
    }

    pub(crate) fn article(title: &str, views: i64) -> Article {
        Article {
            title: title.to_string(),
            views,
            ..Default::default()
        }
    }

    #[test]
    fn unknown_field_lists_choices() {
        let err = Article::default().field("titel").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot resolve keyword 'titel' into field of Article. Choices are: id, title, views, published"
        );
    }

    #[test]
    fn set_field_with_wrong_type_is_a_mismatch() {
        let mut a = article("A", 1);
        let err = a.set_field("views", json!("many")).unwrap_err();
        assert!(matches!(err, ServiceProgrammingError::ModelMismatch { .. }));
        assert_eq!(a.views, 1);
    }

    #[test]
    fn from_fields_fills_defaults() {
        let a = Article::from_fields(Fields::new().set("title", "Draft")).unwrap();
        assert_eq!(a, article("Draft", 0));
        assert!(Article::from_fields(Fields::new().set("body", "x")).is_err());
    }

    #[test]
    fn describe_unsaved() {
        assert_eq!(article("A", 0).describe(), "Article object (None)");
    }

    #[test]
    fn lookup_matches_all_filters() {
        let a = article("A", 5);
        assert!(Lookup::new().exact("title", "A").matches(&a).unwrap());
        assert!(!Lookup::new()
            .exact("title", "A")
            .exact("views", 6)
            .matches(&a)
            .unwrap());
        assert!(Lookup::new().exact("nope", 1).matches(&a).is_err());
        assert_eq!(Lookup::pk::<Article>(3).exact("title", "A").to_string(), "id=3, title=\"A\"");
    }
}
