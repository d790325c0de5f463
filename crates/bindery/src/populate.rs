//! Struct populator.
//!
//! One pass walks a destination under a single [`Tag`], resolving each
//! field's annotation against a [`SourceMap`] and delegating leaf writes to
//! the value converter.

use tracing::{debug, trace};

use crate::convert::{convert_scalar, deref_pointer};
use crate::descriptor::{Bind, Destination, Target};
use crate::error::BindError;
use crate::field::{Field, Kind};
use crate::source::SourceMap;
use crate::tag::Tag;

/// Populates `destination` from `source` under `tag`.
///
/// Only fields annotated for `tag` are written. Unannotated nested
/// structures without decoding hooks are walked with the same source. The
/// first error aborts the pass; fields already written keep their values.
///
/// # Example
///
/// ```rust
/// use bindery::{populate, Bind, SourceMap, Tag};
///
/// #[derive(Bind, Default)]
/// struct Page {
///     #[bind(query = "page")]
///     number: u32,
///     #[bind(query = "tag")]
///     tags: Vec<String>,
/// }
///
/// let source = SourceMap::from_query("page=3&tag=a&tag=b");
/// let mut page = Page::default();
/// populate(&mut page, &source, Tag::Query).unwrap();
///
/// assert_eq!(page.number, 3);
/// assert_eq!(page.tags, vec!["a", "b"]);
/// ```
pub fn populate<D>(destination: &mut D, source: &SourceMap, tag: Tag) -> Result<(), BindError>
where
    D: Destination + ?Sized,
{
    if source.is_empty() {
        return Ok(());
    }
    debug!(tag = %tag, keys = source.len(), "populating destination");

    match destination.target() {
        Target::Struct(target) => populate_struct(target, source, tag),
        Target::Map(map) => {
            if map.accepts_values() {
                for (key, values) in source.iter() {
                    map.insert_values(key, values);
                }
            } else {
                trace!(tag = %tag, "map element type cannot hold raw values");
            }
            Ok(())
        }
        Target::Opaque if tag.tolerates_opaque_destination() => {
            trace!(tag = %tag, "destination is not a struct, skipping pass");
            Ok(())
        }
        Target::Opaque => Err(BindError::UnsupportedDestinationShape { tag }),
    }
}

fn populate_struct(target: &mut dyn Bind, source: &SourceMap, tag: Tag) -> Result<(), BindError> {
    let descriptors = target.descriptors();

    for (index, descriptor) in descriptors.iter().enumerate() {
        if !descriptor.settable {
            continue;
        }
        let Some(field) = target.field_mut(index) else {
            continue;
        };

        // An embedded pointer contributes its pointee, if any.
        let field = if descriptor.embedded && field.kind() == Kind::Pointer {
            match field.as_pointer().and_then(|pointer| pointer.pointee()) {
                Some(pointee) => pointee,
                None => continue,
            }
        } else {
            field
        };

        let annotation = descriptor.annotations.get(tag);
        if descriptor.embedded && annotation.is_some() {
            return Err(BindError::AnnotationConflict {
                field: descriptor.name,
                tag,
            });
        }

        let Some(key) = annotation else {
            if field.kind() == Kind::Struct && !has_hook(field) {
                if let Some(nested) = field.as_struct() {
                    populate_struct(nested, source, tag)?;
                }
            }
            continue;
        };

        let Some(values) = source.lookup(key) else {
            trace!(field = descriptor.name, key, "no value for field");
            continue;
        };
        assign(field, values)?;
    }

    Ok(())
}

fn has_hook(field: &mut dyn Field) -> bool {
    field.params_hook().is_some() || field.param_hook().is_some() || field.text_hook().is_some()
}

/// Writes every raw value of one key into `field`.
///
/// The multi-value hook sees the whole sequence; single-value hooks and
/// scalar kinds see the first value; sequences get one element per value.
pub(crate) fn assign(field: &mut dyn Field, values: &[String]) -> Result<(), BindError> {
    let field = deref_pointer(field)?;
    if let Some(hook) = field.params_hook() {
        return hook.decode_params(values).map_err(BindError::hook);
    }
    let Some(first) = values.first() else {
        return Ok(());
    };

    let single_hook = field.param_hook().is_some() || field.text_hook().is_some();
    if !single_hook && field.kind() == Kind::Sequence {
        if let Some(sequence) = field.as_sequence() {
            return sequence.assign(values);
        }
    }
    convert_scalar(field, first)
}
