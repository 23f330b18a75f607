use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{ConfigError, OperationError, ServiceError, ServiceException, ServiceProgrammingError};
use crate::logging::{resolve_sink, SharedSink};
use crate::settings::Settings;
use crate::template::LogSubject;

use super::decorator::{LogMessages, ServiceFunction};
use super::guard::write_guard;
use super::model::{Fields, Lookup, Model};
use super::objects::Objects;
use super::store::{Repository, StoreError};

/// Result of a decorated service call.
///
/// `Ok(None)` is a runtime failure that was logged and suppressed.
pub type ServiceResult<M> = Result<Option<Service<M>>, ServiceError>;

/// What a service does with a runtime failure after logging it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Return it as [`ServiceError::Failed`]
    #[default]
    Raise,
    /// Return `Ok(None)`
    Suppress,
}

impl ErrorPolicy {
    /// `Raise` for `true`, `Suppress` for `false`.
    pub fn from_flag(raise: bool) -> Self {
        if raise {
            ErrorPolicy::Raise
        } else {
            ErrorPolicy::Suppress
        }
    }
}

type CreateFn<M> = dyn Fn(&dyn Repository<M>, Fields) -> Result<M, OperationError> + Send + Sync;

/// How a service turns fields into a stored instance.
pub struct CreationStrategy<M>(Arc<CreateFn<M>>);

impl<M: Model> CreationStrategy<M> {
    /// Wraps a creation function.
    pub fn new<F>(create: F) -> Self
    where
        F: Fn(&dyn Repository<M>, Fields) -> Result<M, OperationError> + Send + Sync + 'static,
    {
        Self(Arc::new(create))
    }

    /// Builds the instance from the fields and inserts it.
    pub fn insert() -> Self {
        Self::new(|repository, fields| Ok(repository.insert(M::from_fields(fields)?)?))
    }

    fn create(&self, repository: &dyn Repository<M>, fields: Fields) -> Result<M, OperationError> {
        (self.0)(repository, fields)
    }
}

impl<M> Clone for CreationStrategy<M> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<M> fmt::Debug for CreationStrategy<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CreationStrategy").finish_non_exhaustive()
    }
}

impl From<StoreError> for OperationError {
    fn from(err: StoreError) -> Self {
        OperationError::failure(err)
    }
}

/// A handle over the rows of one model.
///
/// Handles are values: every successful call returns a new handle holding
/// the call's result, and the original is left untouched. Chain calls by
/// reassigning:
///
/// ```
/// use std::sync::Arc;
///
/// use heaven::services::{Fields, InMemoryStore, Lookup, LogMessages, Model, Service};
/// use heaven::{RecordingSink, Settings};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// #[serde(default)]
/// struct Article {
///     id: Option<i64>,
///     title: String,
/// }
///
/// impl Model for Article {
///     const NAME: &'static str = "Article";
///     const FIELDS: &'static [&'static str] = &["id", "title"];
///     fn pk(&self) -> Option<i64> { self.id }
///     fn set_pk(&mut self, pk: i64) { self.id = Some(pk) }
/// }
///
/// let sink = RecordingSink::shared();
/// let articles = Service::<Article>::builder("ArticleService", Arc::new(InMemoryStore::<Article>::new()))
///     .logger(sink.clone())
///     .build(&Settings::default())
///     .unwrap();
///
/// let messages = |info: &str| LogMessages::new().info(info).error("article query failed");
///
/// articles
///     .create(Fields::new().set("title", "Hello"), messages("created $objects$"))
///     .unwrap();
/// let found = articles
///     .filter(Lookup::new().exact("title", "Hello"), messages("filtered"))
///     .unwrap()
///     .unwrap()
///     .first(messages("first is $objects$"))
///     .unwrap()
///     .unwrap();
///
/// assert_eq!(found.to_string(), "{ArticleService Article object (1)}");
/// assert_eq!(sink.messages(heaven::LogLevel::Info).last().unwrap(), "first is Article object (1)");
/// ```
pub struct Service<M: Model> {
    name: &'static str,
    repository: Arc<dyn Repository<M>>,
    objects: Objects<M>,
    read_only: bool,
    policy: ErrorPolicy,
    logger: SharedSink,
    creation: CreationStrategy<M>,
    decorator: Arc<ServiceFunction>,
}

/// Configures a [`Service`].
pub struct ServiceBuilder<M: Model> {
    name: &'static str,
    repository: Arc<dyn Repository<M>>,
    read_only: bool,
    policy: Option<ErrorPolicy>,
    logger: Option<SharedSink>,
    creation: Option<CreationStrategy<M>>,
    decorator: Option<ServiceFunction>,
}

impl<M: Model> ServiceBuilder<M> {
    /// Rejects write operations when `true`.
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Overrides the configured `RAISE_EXCEPTION`.
    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Uses `logger` instead of the configured one.
    pub fn logger(mut self, logger: SharedSink) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Replaces the default insert-based creation.
    pub fn creation(mut self, creation: CreationStrategy<M>) -> Self {
        self.creation = Some(creation);
        self
    }

    /// Replaces the decorator built from settings.
    pub fn decorator(mut self, decorator: ServiceFunction) -> Self {
        self.decorator = Some(decorator);
        self
    }

    /// Builds the service, filling unset options from `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingLogger`] if no logger was given and the
    /// settings have none.
    pub fn build(self, settings: &Settings) -> Result<Service<M>, ConfigError> {
        let logger = resolve_sink(self.logger, settings.services.logger.as_ref(), self.name)?;
        Ok(Service {
            name: self.name,
            repository: self.repository,
            objects: Objects::Manager,
            read_only: self.read_only,
            policy: self
                .policy
                .unwrap_or_else(|| ErrorPolicy::from_flag(settings.services.raise_exception)),
            logger,
            creation: self.creation.unwrap_or_else(CreationStrategy::insert),
            decorator: Arc::new(
                self.decorator
                    .unwrap_or_else(|| ServiceFunction::from_settings(settings)),
            ),
        })
    }
}

impl<M: Model> Service<M> {
    /// Starts configuring a service called `name` over `repository`.
    pub fn builder(name: &'static str, repository: Arc<dyn Repository<M>>) -> ServiceBuilder<M> {
        ServiceBuilder {
            name,
            repository,
            read_only: false,
            policy: None,
            logger: None,
            creation: None,
            decorator: None,
        }
    }

    /// A service with every option taken from `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingLogger`] if the settings have no logger.
    pub fn new(
        name: &'static str,
        repository: Arc<dyn Repository<M>>,
        settings: &Settings,
    ) -> Result<Self, ConfigError> {
        Self::builder(name, repository).build(settings)
    }

    /// A handle like this one over `objects`.
    pub fn with_objects(&self, objects: Objects<M>) -> Self {
        Self {
            name: self.name,
            repository: Arc::clone(&self.repository),
            objects,
            read_only: self.read_only,
            policy: self.policy,
            logger: Arc::clone(&self.logger),
            creation: self.creation.clone(),
            decorator: Arc::clone(&self.decorator),
        }
    }

    /// Name shown in log messages.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Current objects.
    pub fn objects(&self) -> &Objects<M> {
        &self.objects
    }

    /// Takes the objects out of the handle.
    pub fn into_objects(self) -> Objects<M> {
        self.objects
    }

    /// Whether write operations are rejected.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// What happens to runtime failures.
    pub fn error_policy(&self) -> ErrorPolicy {
        self.policy
    }

    /// Sink for this service's messages.
    pub fn logger(&self) -> &SharedSink {
        &self.logger
    }

    /// The storage behind this service.
    pub fn repository(&self) -> &dyn Repository<M> {
        self.repository.as_ref()
    }

    /// Applies the error policy to a logged runtime failure.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Failed`] under [`ErrorPolicy::Raise`].
    pub fn service_function_error_handler(&self, err: anyhow::Error) -> ServiceResult<M> {
        match self.policy {
            ErrorPolicy::Raise => Err(ServiceException::new(err).into()),
            ErrorPolicy::Suppress => Ok(None),
        }
    }

    /// Runs a custom operation through the service decorator.
    ///
    /// The operation receives this handle and returns the objects for the
    /// new one.
    ///
    /// # Errors
    ///
    /// See [`ServiceFunction::run`].
    pub fn call<F>(&self, messages: LogMessages, operation: F) -> ServiceResult<M>
    where
        F: FnOnce(&Self) -> Result<Objects<M>, OperationError>,
    {
        self.decorator.run(self, messages, operation)
    }

    /// Like [`Service::call`], but rejected on a read-only service.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceProgrammingError::ReadOnly`] before anything else
    /// is checked, then as [`Service::call`].
    pub fn call_for_write<F>(&self, messages: LogMessages, operation: F) -> ServiceResult<M>
    where
        F: FnOnce(&Self) -> Result<Objects<M>, OperationError>,
    {
        write_guard(self, |service| service.call(messages, operation))?
    }

    /// Rows the current objects stand for.
    fn current(&self) -> Result<Vec<M>, OperationError> {
        Ok(match &self.objects {
            Objects::Manager => self.repository.fetch_all()?,
            Objects::Set(rows) => rows.clone(),
            Objects::Instance(instance) => vec![instance.clone()],
            Objects::Count(_) | Objects::Empty => Vec::new(),
        })
    }

    fn select(&self, lookup: &Lookup) -> Result<Vec<M>, OperationError> {
        lookup.check::<M>()?;
        let mut rows = Vec::new();
        for row in self.current()? {
            if lookup.matches(&row)? {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    /// `instance`, or the handle's own instance when `None`.
    fn target<'a>(&'a self, instance: Option<&'a M>) -> Result<&'a M, ServiceProgrammingError> {
        instance
            .or_else(|| self.objects.instance())
            .ok_or_else(|| ServiceProgrammingError::MissingArgument {
                argument: "instance",
                service: self.name.to_string(),
            })
    }

    /// The single row matching `lookup`.
    ///
    /// # Errors
    ///
    /// An empty lookup or an unknown field is a programming error. No match
    /// or several matches are runtime failures.
    pub fn get(&self, lookup: Lookup, messages: LogMessages) -> ServiceResult<M> {
        self.call(messages, |service| {
            if lookup.is_empty() {
                return Err(ServiceProgrammingError::EmptyLookup {
                    service: service.name.to_string(),
                }
                .into());
            }
            let mut rows = service.select(&lookup)?;
            match rows.len() {
                0 => Err(StoreError::DoesNotExist { model: M::NAME }.into()),
                1 => Ok(Objects::Instance(rows.remove(0))),
                count => Err(StoreError::MultipleObjectsReturned {
                    model: M::NAME,
                    count,
                }
                .into()),
            }
        })
    }

    /// Rows matching `lookup`.
    ///
    /// # Errors
    ///
    /// An unknown field is a programming error.
    pub fn filter(&self, lookup: Lookup, messages: LogMessages) -> ServiceResult<M> {
        self.call(messages, |service| Ok(Objects::Set(service.select(&lookup)?)))
    }

    /// Every row the handle stands for.
    ///
    /// # Errors
    ///
    /// See [`Service::call`].
    pub fn all(&self, messages: LogMessages) -> ServiceResult<M> {
        self.call(messages, |service| Ok(Objects::Set(service.current()?)))
    }

    /// Rows sorted by `fields`; a leading `-` sorts descending.
    ///
    /// # Errors
    ///
    /// An unknown field is a programming error.
    pub fn order_by(&self, fields: &[&str], messages: LogMessages) -> ServiceResult<M> {
        self.call(messages, |service| {
            let keys = fields
                .iter()
                .map(|field| match field.strip_prefix('-') {
                    Some(name) => M::check_field(name).map(|()| (name, true)),
                    None => M::check_field(field).map(|()| (*field, false)),
                })
                .collect::<Result<Vec<_>, _>>()?;

            let mut rows = service
                .current()?
                .into_iter()
                .map(|row| row.to_fields().map(|fields| (fields, row)))
                .collect::<Result<Vec<_>, _>>()?;

            rows.sort_by(|(a, _), (b, _)| {
                keys.iter()
                    .map(|(name, descending)| {
                        let ordering = compare_values(
                            a.get(name).unwrap_or(&Value::Null),
                            b.get(name).unwrap_or(&Value::Null),
                        );
                        if *descending {
                            ordering.reverse()
                        } else {
                            ordering
                        }
                    })
                    .find(|ordering| ordering.is_ne())
                    .unwrap_or(Ordering::Equal)
            });
            Ok(Objects::Set(rows.into_iter().map(|(_, row)| row).collect()))
        })
    }

    /// The first row, or [`Objects::Empty`].
    ///
    /// # Errors
    ///
    /// See [`Service::call`].
    pub fn first(&self, messages: LogMessages) -> ServiceResult<M> {
        self.call(messages, |service| Ok(service.current()?.into_iter().next().into()))
    }

    /// The last row, or [`Objects::Empty`].
    ///
    /// # Errors
    ///
    /// See [`Service::call`].
    pub fn last(&self, messages: LogMessages) -> ServiceResult<M> {
        self.call(messages, |service| Ok(service.current()?.into_iter().last().into()))
    }

    /// Number of rows, as [`Objects::Count`].
    ///
    /// # Errors
    ///
    /// See [`Service::call`].
    pub fn count(&self, messages: LogMessages) -> ServiceResult<M> {
        self.call(messages, |service| Ok(Objects::Count(service.current()?.len())))
    }

    /// Creates a row with the service's creation strategy.
    ///
    /// # Errors
    ///
    /// Read-only services and unknown fields are programming errors.
    pub fn create(&self, fields: Fields, messages: LogMessages) -> ServiceResult<M> {
        self.create_with(&self.creation, fields, messages)
    }

    /// Creates a row with an explicit creation strategy.
    ///
    /// # Errors
    ///
    /// Same as [`Service::create`].
    pub fn create_with(
        &self,
        strategy: &CreationStrategy<M>,
        fields: Fields,
        messages: LogMessages,
    ) -> ServiceResult<M> {
        self.call_for_write(messages, |service| {
            let instance = strategy.create(service.repository(), fields)?;
            Ok(Objects::Instance(instance))
        })
    }

    /// Writes `fields` to `instance` (or the handle's own instance) and saves
    /// only those fields.
    ///
    /// # Errors
    ///
    /// Read-only services, a missing instance and unknown fields are
    /// programming errors.
    pub fn update(&self, instance: Option<&M>, fields: Fields, messages: LogMessages) -> ServiceResult<M> {
        self.call_for_write(messages, |service| {
            let mut updated = service.target(instance)?.clone();
            let mut names = Vec::with_capacity(fields.len());
            for (name, value) in fields.iter() {
                updated.set_field(name, value.clone())?;
                names.push(name.to_string());
            }
            let saved = service.repository.save(&updated, Some(names.as_slice()))?;
            Ok(Objects::Instance(saved))
        })
    }

    /// Deletes `instance` (or the handle's own instance).
    ///
    /// # Errors
    ///
    /// Read-only services and a missing instance are programming errors.
    pub fn delete(&self, instance: Option<&M>, messages: LogMessages) -> ServiceResult<M> {
        self.call_for_write(messages, |service| {
            service.repository.remove(service.target(instance)?)?;
            Ok(Objects::Empty)
        })
    }

    /// Creates many rows at once. Nothing is stored if any row fails.
    ///
    /// # Errors
    ///
    /// Read-only services and unknown fields are programming errors.
    pub fn bulk_create(&self, rows: Vec<Fields>, messages: LogMessages) -> ServiceResult<M> {
        self.call_for_write(messages, |service| {
            let instances = rows
                .into_iter()
                .map(M::from_fields)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Objects::Set(service.repository.bulk_insert(instances)?))
        })
    }

    /// Saves `fields` of every instance. Nothing is written if any row fails.
    ///
    /// # Errors
    ///
    /// Read-only services and unknown fields are programming errors.
    pub fn bulk_update(
        &self,
        instances: Vec<M>,
        fields: &[&str],
        messages: LogMessages,
    ) -> ServiceResult<M> {
        self.call_for_write(messages, |service| {
            for field in fields {
                M::check_field(field)?;
            }
            let names: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
            let saved = service
                .repository
                .bulk_save(&instances, Some(names.as_slice()))?;
            Ok(Objects::Set(saved))
        })
    }

    /// Reloads `instance` from storage in place. Not logged.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the row is gone.
    pub fn refresh_from_db(&self, instance: &mut M) -> Result<(), StoreError> {
        *instance = self.repository.reload(instance)?;
        Ok(())
    }
}

/// Orders JSON values: null, then bools, numbers, strings; other kinds
/// compare equal.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) | Value::Object(_) => 4,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

impl<M: Model> Clone for Service<M> {
    fn clone(&self) -> Self {
        self.with_objects(self.objects.clone())
    }
}

impl<M: Model> fmt::Display for Service<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{} {}}}", self.name, self.objects)
    }
}

impl<M: Model> fmt::Debug for Service<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.name)
            .field("model", &M::NAME)
            .field("objects", &self.objects)
            .field("read_only", &self.read_only)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<M: Model> LogSubject for Service<M> {
    fn subject(&self) -> String {
        self.to_string()
    }

    fn objects(&self) -> String {
        self.objects.to_string()
    }
}
