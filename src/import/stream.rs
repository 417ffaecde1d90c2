//! Element-at-a-time decoding of a top-level JSON array

use crate::error::ImportError;
use serde::de::{self, Deserializer as _, SeqAccess, Visitor};
use serde_json::Value;
use std::fmt;
use std::io::BufRead;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode `reader` as a JSON array and hand each element to `handler`
/// without materializing the whole array.
///
/// A leading UTF-8 byte order mark is skipped. Stops at the first decode
/// error or the first error returned by `handler`.
pub fn for_each_element<R, F>(mut reader: R, mut handler: F) -> Result<(), ImportError>
where
    R: BufRead,
    F: FnMut(Value) -> Result<(), ImportError>,
{
    if reader.fill_buf()?.starts_with(UTF8_BOM) {
        reader.consume(UTF8_BOM.len());
    }

    let mut deserializer = serde_json::Deserializer::from_reader(reader);
    let mut failure = None;

    let decoded = (&mut deserializer).deserialize_seq(ElementVisitor {
        handler: &mut handler,
        failure: &mut failure,
    });

    if let Some(error) = failure {
        return Err(error);
    }
    decoded?;
    deserializer.end()?;
    Ok(())
}

struct ElementVisitor<'a, F> {
    handler: &'a mut F,
    failure: &'a mut Option<ImportError>,
}

impl<'de, 'a, F> Visitor<'de> for ElementVisitor<'a, F>
where
    F: FnMut(Value) -> Result<(), ImportError>,
{
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a JSON array of row objects")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        while let Some(element) = seq.next_element::<Value>()? {
            if let Err(error) = (self.handler)(element) {
                *self.failure = Some(error);
                return Err(de::Error::custom("row handler failed"));
            }
        }
        Ok(())
    }
}
