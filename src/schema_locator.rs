//! A way to register and retrieve Schemas

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::native::etw_types::EventRecord;
use crate::parser::Parser;
use crate::provider;
use crate::schema::{Schema, SchemaKey};

/// Schema module errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// No schema is registered for this key
    Unknown(SchemaKey),
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown(key) => write!(f, "no schema for {}", key),
        }
    }
}

impl std::error::Error for SchemaError {}

pub type SchemaResult<T> = Result<T, SchemaError>;

static BUILTIN: Lazy<SchemaLocator> = Lazy::new(|| {
    let locator = provider::all_schemas().iter().copied().collect::<SchemaLocator>();
    log::debug!("built-in schema locator: {} schemas", locator.len());
    locator
});

/// Represents a registry of known Schemas
///
/// This registry is implemented as a [HashMap] where the key is a [`SchemaKey`], that is a combination
/// of the following elements of an [Event Record](https://docs.microsoft.com/en-us/windows/win32/api/evntcons/ns-evntcons-event_record)
/// * EventHeader.ProviderId
/// * EventHeader.EventDescriptor.Id
/// * EventHeader.EventDescriptor.Version
/// * EventHeader.EventDescriptor.Opcode
///
/// From the [docs](https://docs.microsoft.com/en-us/windows/win32/api/evntprov/ns-evntprov-event_descriptor):
/// > For manifest-based ETW, the combination Provider.DecodeGuid + Event.Id + Event.Version should uniquely identify an event,
/// > i.e. all events with the same DecodeGuid, Id, and Version should have the same set of fields with no changes in field names, field types, or field ordering.
///
/// Classic kernel events all have id 0, and are told apart by their opcode instead.
#[derive(Default)]
pub struct SchemaLocator {
    schemas: HashMap<SchemaKey, &'static Schema>,
}

impl std::fmt::Debug for SchemaLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaLocator")
            .field("len", &self.schemas.len())
            .finish()
    }
}

impl SchemaLocator {
    /// An empty locator
    pub fn new() -> Self {
        SchemaLocator {
            schemas: HashMap::new(),
        }
    }

    /// A locator that knows every schema of the [`provider`](crate::provider) module
    pub fn builtin() -> &'static SchemaLocator {
        &BUILTIN
    }

    /// Registers `schema`, returning the schema previously registered with the same key (if any)
    pub fn register(&mut self, schema: &'static Schema) -> Option<&'static Schema> {
        let previous = self.schemas.insert(schema.key(), schema);
        if let Some(previous) = previous {
            log::warn!(
                "schema {} replaces {} for {}",
                schema.name(),
                previous.name(),
                schema.key()
            );
        }
        previous
    }

    pub fn get(&self, key: &SchemaKey) -> Option<&'static Schema> {
        self.schemas.get(key).copied()
    }

    /// Retrieve the Schema of an ETW Event
    ///
    /// # Arguments
    /// * `event` - The [EventRecord] to decode
    ///
    /// # Example
    /// ```
    /// # use etwschema::native::etw_types::EventRecord;
    /// # use etwschema::schema_locator::SchemaLocator;
    /// let my_callback = |record: &EventRecord, schema_locator: &SchemaLocator| {
    ///     let schema = schema_locator.event_schema(record).unwrap();
    /// };
    /// ```
    pub fn event_schema(&self, event: &EventRecord) -> SchemaResult<&'static Schema> {
        let key = SchemaKey::new(event);
        self.get(&key).ok_or_else(|| {
            log::debug!("no schema for {}", key);
            SchemaError::Unknown(key)
        })
    }

    /// A [`Parser`] for `event`, with the schema registered for its key
    pub fn parser<'record>(
        &self,
        event: &'record EventRecord<'record>,
    ) -> SchemaResult<Parser<'static, 'record>> {
        let schema = self.event_schema(event)?;
        // The schema was selected by key: no need to validate it again
        Ok(Parser::create_unchecked(event, schema))
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn schemas(&self) -> impl Iterator<Item = &'static Schema> + '_ {
        self.schemas.values().copied()
    }
}

impl Extend<&'static Schema> for SchemaLocator {
    fn extend<I: IntoIterator<Item = &'static Schema>>(&mut self, iter: I) {
        for schema in iter {
            self.register(schema);
        }
    }
}

impl std::iter::FromIterator<&'static Schema> for SchemaLocator {
    fn from_iter<I: IntoIterator<Item = &'static Schema>>(iter: I) -> Self {
        let mut locator = SchemaLocator::new();
        locator.extend(iter);
        locator
    }
}
