//! Turns user-entered text into typed element values, per VR.
//!
//! The inverse of the display formatting: multi-valued input uses the
//! same `\` separator the text encoding uses on the wire.

use dicom::core::value::PrimitiveValue;
use dicom::core::{Tag, VR};

use crate::utils::formatting::is_binary_vr;

/// Parses `text` into a value conforming to `vr`. The error is a
/// human-readable detail; callers attach the offending tag.
pub fn parse_value(text: &str, vr: VR) -> Result<PrimitiveValue, String> {
    if text.trim().is_empty() {
        return Ok(PrimitiveValue::Empty);
    }

    match vr {
        VR::SQ => Err("sequence containers cannot be edited as text".to_string()),
        _ if is_binary_vr(vr) => Err(format!(
            "binary payloads ({}) cannot be edited as text",
            vr.to_string()
        )),
        VR::IS | VR::SL => parse_components::<i32>(text, "integer").map(|v| PrimitiveValue::I32(v.into())),
        VR::SS => parse_components::<i16>(text, "16-bit integer").map(|v| PrimitiveValue::I16(v.into())),
        VR::SV => parse_components::<i64>(text, "64-bit integer").map(|v| PrimitiveValue::I64(v.into())),
        VR::UL => parse_components::<u32>(text, "unsigned integer").map(|v| PrimitiveValue::U32(v.into())),
        VR::US => parse_components::<u16>(text, "16-bit unsigned integer").map(|v| PrimitiveValue::U16(v.into())),
        VR::UV => parse_components::<u64>(text, "64-bit unsigned integer").map(|v| PrimitiveValue::U64(v.into())),
        VR::DS | VR::FD => parse_components::<f64>(text, "decimal").map(|v| PrimitiveValue::F64(v.into())),
        VR::FL => parse_components::<f32>(text, "decimal").map(|v| PrimitiveValue::F32(v.into())),
        VR::AT => {
            let tags = split_components(text)
                .map(parse_tag_literal)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(PrimitiveValue::Tags(tags.into()))
        }
        VR::DA => {
            for component in split_components(text) {
                check_date(component)?;
            }
            Ok(text_value(text, true))
        }
        VR::TM => {
            for component in split_components(text) {
                check_time(component)?;
            }
            Ok(text_value(text, true))
        }
        VR::DT => {
            for component in split_components(text) {
                check_datetime(component)?;
            }
            Ok(text_value(text, true))
        }
        // LT/ST/UT treat backslash as ordinary text, everything else as
        // a multiplicity separator
        VR::LT | VR::ST | VR::UT => Ok(PrimitiveValue::from(text)),
        _ => Ok(text_value(text, false)),
    }
}

/// Checks that an already-typed value can legally live under `vr`.
/// Used for the tree-wide pass before a commit; accepts everything the
/// codec itself produces for that VR.
pub fn value_conforms(vr: VR, value: &PrimitiveValue) -> Result<(), String> {
    if matches!(value, PrimitiveValue::Empty) {
        return Ok(());
    }
    match vr {
        VR::IS | VR::SL | VR::SS | VR::SV => check_string_components(vr, value, |s| {
            s.parse::<i64>().map(|_| ()).map_err(|_| "integer")
        }),
        VR::UL | VR::US | VR::UV => check_string_components(vr, value, |s| {
            s.parse::<u64>().map(|_| ()).map_err(|_| "unsigned integer")
        }),
        VR::DS | VR::FL | VR::FD => check_string_components(vr, value, |s| {
            s.parse::<f64>().map(|_| ()).map_err(|_| "decimal")
        }),
        VR::DA => check_string_components(vr, value, |s| check_date(s).map_err(|_| "date")),
        VR::AT => match value {
            PrimitiveValue::Tags(_) | PrimitiveValue::U16(_) => Ok(()),
            _ => Err(format!("{} requires tag values", vr.to_string())),
        },
        _ => Ok(()),
    }
}

fn check_string_components<'a>(
    vr: VR,
    value: &'a PrimitiveValue,
    check: impl Fn(&'a str) -> Result<(), &'static str>,
) -> Result<(), String> {
    let components: Vec<&str> = match value {
        PrimitiveValue::Str(s) => vec![s.as_str()],
        PrimitiveValue::Strs(values) => values.iter().map(|s| s.as_str()).collect(),
        // already numeric, nothing textual to re-check
        _ => return Ok(()),
    };
    for component in components {
        let trimmed = component.trim_end_matches(['\0', ' ']).trim();
        if trimmed.is_empty() {
            continue;
        }
        check(trimmed).map_err(|kind| {
            format!("'{trimmed}' is not a valid {kind} for {}", vr.to_string())
        })?;
    }
    Ok(())
}

fn split_components(text: &str) -> impl Iterator<Item = &str> {
    text.split('\\').map(str::trim)
}

fn text_value(text: &str, trim: bool) -> PrimitiveValue {
    let components: Vec<String> = text
        .split('\\')
        .map(|part| if trim { part.trim() } else { part })
        .map(str::to_string)
        .collect();
    if components.len() == 1 {
        PrimitiveValue::Str(components.into_iter().next().unwrap_or_default())
    } else {
        PrimitiveValue::Strs(components.into())
    }
}

fn parse_components<T: std::str::FromStr>(text: &str, kind: &str) -> Result<Vec<T>, String> {
    split_components(text)
        .map(|part| {
            part.parse::<T>()
                .map_err(|_| format!("'{part}' is not a valid {kind}"))
        })
        .collect()
}

/// Parses a tag literal such as `0010,0010` or `(0010,0010)`.
fn parse_tag_literal(text: &str) -> Result<Tag, String> {
    let inner = text
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')');
    let (group, element) = inner
        .split_once(',')
        .ok_or_else(|| format!("'{text}' is not a tag literal (expected GGGG,EEEE)"))?;
    let group = u16::from_str_radix(group.trim(), 16)
        .map_err(|_| format!("'{text}' has an invalid group number"))?;
    let element = u16::from_str_radix(element.trim(), 16)
        .map_err(|_| format!("'{text}' has an invalid element number"))?;
    Ok(Tag(group, element))
}

fn check_date(text: &str) -> Result<(), String> {
    if text.len() == 8 && text.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(format!("'{text}' is not a date in YYYYMMDD form"))
    }
}

fn check_time(text: &str) -> Result<(), String> {
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (text, None),
    };
    let whole_ok = matches!(whole.len(), 2 | 4 | 6) && whole.bytes().all(|b| b.is_ascii_digit());
    let fraction_ok = fraction.map_or(true, |f| {
        !f.is_empty() && f.len() <= 6 && f.bytes().all(|b| b.is_ascii_digit())
    });
    if whole_ok && fraction_ok {
        Ok(())
    } else {
        Err(format!("'{text}' is not a time in HHMMSS.FFFFFF form"))
    }
}

fn check_datetime(text: &str) -> Result<(), String> {
    let ok = text.len() >= 4
        && text.len() <= 26
        && text.bytes().take(4).all(|b| b.is_ascii_digit())
        && text
            .bytes()
            .all(|b| b.is_ascii_digit() || b == b'.' || b == b'+' || b == b'-');
    if ok {
        Ok(())
    } else {
        Err(format!("'{text}' is not a datetime in YYYYMMDDHHMMSS form"))
    }
}
