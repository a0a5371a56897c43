use resq_ast::{EnumValue, Value};
use resq_schema::{EnumType, IntWidth};

use crate::numeric::{parse_integer, Num};
use crate::{unsupported, Input};

/// Enums accept a variant name (case-insensitive) or a number that fits the
/// underlying width. Numbers need not correspond to a declared variant.
pub(crate) fn to_enum(ty: &EnumType, input: Input<'_>) -> Result<Value, String> {
    match input {
        Input::Text(s) => {
            let s = s.trim();
            if let Some(variant) = ty.variant_named(s) {
                return Ok(Value::Enum(EnumValue {
                    type_name: ty.name.clone(),
                    variant: Some(variant.name.clone()),
                    discriminant: variant.value,
                }));
            }
            let number =
                parse_integer(s).map_err(|_| format!("{s:?} is not a variant of {}", ty.name))?;
            from_discriminant(ty, number)
        }
        Input::Number(num) => {
            let Num::Int(number) = num else {
                return Err(format!("{num:?} is not an integral enum value"));
            };
            from_discriminant(ty, number)
        }
        other => Err(unsupported(&other)),
    }
}

fn from_discriminant(ty: &EnumType, number: i128) -> Result<Value, String> {
    // The narrowest integral width that holds the number, then the underlying check
    let extracted = IntWidth::ALL
        .iter()
        .find(|width| width.contains(number))
        .ok_or_else(|| format!("{number} does not fit any integral type"))?;
    if !ty.underlying.contains(number) {
        return Err(format!(
            "{number} ({extracted:?}) does not fit the {:?} underlying type of {}",
            ty.underlying, ty.name
        ));
    }
    let discriminant =
        i64::try_from(number).map_err(|_| format!("{number} exceeds the enum discriminant range"))?;

    Ok(Value::Enum(EnumValue {
        type_name: ty.name.clone(),
        variant: ty.variant_valued(discriminant).map(|v| v.name.clone()),
        discriminant,
    }))
}
