//! Typed event views
//!
//! An event view is a struct wrapping a [`Parser`] for one well-known [`Schema`], with one accessor
//! per field. Views are declared with the [`event_view!`](crate::event_view) macro, which generates
//! the `static` schema, the struct and its accessors from a single field list.
//!
//! # Example
//! ```
//! use etwschema::event_view;
//! use etwschema::native::etw_types::{EventDescriptor, EventHeader, EventRecord};
//! use etwschema::schema::FieldKind;
//! use etwschema::view::EventView;
//! use etwschema::Guid;
//!
//! const MY_PROVIDER: Guid = Guid::from_u128(0x7dd42a49_5329_4832_8dfd_43d979153a88);
//!
//! event_view! {
//!     /// A made-up event
//!     pub struct Connect => CONNECT {
//!         name: "MyProvider/Connect",
//!         descriptor: EventDescriptor::new(MY_PROVIDER, 12, 0),
//!         fields: {
//!             port: u16 = ("Port", FieldKind::UInt16),
//!             host: String = ("Host", FieldKind::UnicodeString),
//!         }
//!     }
//! }
//!
//! let mut payload = 443u16.to_le_bytes().to_vec();
//! payload.extend_from_slice(&[b'a', 0, b'b', 0, 0, 0]);
//! let record = EventRecord::new(EventHeader::new(*CONNECT.descriptor()), payload);
//!
//! let connect = Connect::new(&record).unwrap();
//! assert_eq!(connect.port().unwrap(), 443);
//! assert_eq!(connect.host().unwrap(), "ab");
//! ```
use crate::native::etw_types::EventRecord;
use crate::parser::{Parser, ParserResult};
use crate::schema::Schema;

/// A typed accessor over the payload of one kind of event
///
/// Accessors resolve field offsets through the wrapped [`Parser`], so they share its cache.
pub trait EventView<'record>: Sized {
    /// The layout this view decodes
    fn schema() -> &'static Schema;

    #[doc(hidden)]
    fn from_parser(parser: Parser<'static, 'record>) -> Self;

    fn parser(&self) -> &Parser<'static, 'record>;

    /// Wraps `record`, after checking it has the identity of [`Self::schema`]
    fn new(record: &'record EventRecord<'record>) -> ParserResult<Self> {
        Parser::create(record, Self::schema()).map(Self::from_parser)
    }

    /// Wraps `record` without checking its identity
    fn new_unchecked(record: &'record EventRecord<'record>) -> Self {
        Self::from_parser(Parser::create_unchecked(record, Self::schema()))
    }

    /// Whether [`Self::new`] would accept `record`
    fn matches(record: &EventRecord) -> bool {
        Self::schema().matches(record)
    }

    fn record(&self) -> &'record EventRecord<'record> {
        self.parser().record()
    }
}

/// Declares a `static` [`Schema`] and a typed [`EventView`] over it
///
/// Each field line reads `accessor: ReturnType = ("FieldName", FieldKind::Kind)`. Return types
/// that borrow from the payload use an elided lifetime (e.g. `AddressList<'_>`).
/// Fields are listed in payload order.
#[macro_export]
macro_rules! event_view {
    (
        $(#[$meta:meta])*
        $vis:vis struct $view:ident => $schema:ident {
            name: $name:expr,
            descriptor: $descriptor:expr,
            fields: {
                $(
                    $(#[$field_meta:meta])*
                    $accessor:ident: $ty:ty = ($field_name:expr, $kind:expr),
                )*
            }
        }
    ) => {
        #[doc = concat!("Layout of [`", stringify!($view), "`]")]
        $vis static $schema: $crate::schema::Schema = {
            const FIELDS: &[$crate::schema::Field] = &[
                $( $crate::schema::Field::new($field_name, $kind), )*
            ];
            $crate::schema::Schema::new($name, $descriptor, FIELDS)
        };

        $(#[$meta])*
        $vis struct $view<'record> {
            parser: $crate::parser::Parser<'static, 'record>,
        }

        impl<'record> $crate::view::EventView<'record> for $view<'record> {
            fn schema() -> &'static $crate::schema::Schema {
                &$schema
            }

            fn from_parser(parser: $crate::parser::Parser<'static, 'record>) -> Self {
                $view { parser }
            }

            fn parser(&self) -> &$crate::parser::Parser<'static, 'record> {
                &self.parser
            }
        }

        #[allow(dead_code)]
        impl<'record> $view<'record> {
            $(
                $(#[$field_meta])*
                pub fn $accessor(&self) -> $crate::parser::ParserResult<$ty> {
                    self.parser.try_parse($field_name)
                }
            )*
        }

        impl ::std::fmt::Debug for $view<'_> {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                let mut s = f.debug_struct(stringify!($view));
                for (name, value) in self.parser.values() {
                    match value {
                        Ok(v) => s.field(name, &v),
                        Err(e) => s.field(name, &e),
                    };
                }
                s.finish()
            }
        }
    };
}
