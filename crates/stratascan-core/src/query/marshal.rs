use crate::{
    convert::{ConversionError, ValueConverter},
    native::NativeValue,
    value::Value,
};

/// Convert UDF arguments into the native argument list, preserving order.
///
/// `None` means the caller passed no argument list; it stays `None`.
/// The first element that fails to convert aborts the whole list.
pub fn marshal(
    args: Option<&[Value]>,
    converter: &dyn ValueConverter,
) -> Result<Option<Vec<NativeValue>>, ConversionError> {
    let Some(args) = args else {
        return Ok(None);
    };

    let mut list = Vec::with_capacity(args.len());
    for arg in args {
        list.push(converter.value_to_native(arg)?);
    }

    Ok(Some(list))
}
