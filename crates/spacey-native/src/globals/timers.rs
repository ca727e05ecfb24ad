// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Timer functions: setTimeout, clearTimeout

use crate::error::{NativeError, Result};
use crate::runtime::{Context, TimerId};
use crate::value::Value;

/// setTimeout(callback, delay) - returns the timer handle as a number.
///
/// Called with fewer than two arguments it schedules nothing and returns
/// `undefined`.
pub fn set_timeout(cx: &mut Context, args: &[Value]) -> Result<Value> {
    let [callback, delay, ..] = args else {
        return Ok(Value::Undefined);
    };
    let delay = to_delay_ms(delay)?;
    let id = cx.set_timeout(callback, delay)?;
    Ok(Value::Number(id.0 as f64))
}

/// clearTimeout(handle) - anything that is not a valid handle is ignored
pub fn clear_timeout(cx: &mut Context, args: &[Value]) -> Result<Value> {
    if let Some(id) = args.first().and_then(to_timer_id) {
        cx.clear_timeout(id);
    }
    Ok(Value::Undefined)
}

/// Convert a script delay argument to whole milliseconds.
///
/// Booleans are 0 or 1, finite numbers and numeric strings are truncated
/// toward zero. Everything else, `undefined` and `null` included, is a
/// TypeError.
pub fn to_delay_ms(value: &Value) -> Result<i64> {
    match to_integer(value) {
        Some(ms) => Ok(ms),
        None => Err(NativeError::type_error(match value {
            Value::String(s) => format!("invalid timer delay '{}'", s),
            Value::Number(n) => format!("invalid timer delay {}", n),
            _ => format!("timer delay must be a number, got {}", value.type_of()),
        })),
    }
}

/// Interpret a script value as a timer handle.
///
/// Uses the delay coercion, so `1.5` names slot 1 and `"0"` names slot 0.
/// Values that do not coerce, and negative values, name no slot.
pub fn to_timer_id(value: &Value) -> Option<TimerId> {
    to_integer(value)
        .and_then(|n| usize::try_from(n).ok())
        .map(TimerId)
}

/// Numeric coercion shared by delays and handles, truncated toward zero
fn to_integer(value: &Value) -> Option<i64> {
    let n = match value {
        Value::Boolean(b) => f64::from(u8::from(*b)),
        Value::Number(n) => *n,
        Value::String(s) => parse_numeric(s.trim())?,
        Value::Undefined | Value::Null | Value::Object(_) | Value::Function(_) => return None,
    };
    // Saturating float-to-int cast
    n.is_finite().then(|| n.trunc() as i64)
}

fn parse_numeric(s: &str) -> Option<f64> {
    if let Ok(n) = s.parse::<i64>() {
        return Some(n as f64);
    }
    // Rust's float grammar accepts "inf" and "nan"; the finiteness check
    // in the caller rejects them
    s.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module_system::ModuleRegistry;
    use crate::value::{Callable, Object};
    use parking_lot::RwLock;
    use std::sync::Arc;

    #[test]
    fn test_delay_conversion() {
        assert_eq!(to_delay_ms(&Value::from(true)).unwrap(), 1);
        assert_eq!(to_delay_ms(&Value::from(12.9)).unwrap(), 12);
        assert_eq!(to_delay_ms(&Value::from(-3.7)).unwrap(), -3);
        assert_eq!(to_delay_ms(&Value::from(" 25 ")).unwrap(), 25);
        assert_eq!(to_delay_ms(&Value::from("7.5")).unwrap(), 7);
    }

    #[test]
    fn test_delay_rejections() {
        let obj = Value::Object(Arc::new(RwLock::new(Object::new())));
        for value in [
            Value::Undefined,
            Value::Null,
            Value::from(f64::NAN),
            Value::from(f64::INFINITY),
            Value::from("soon"),
            Value::from(""),
            Value::from("inf"),
            obj,
        ] {
            assert!(
                matches!(to_delay_ms(&value), Err(NativeError::TypeError(_))),
                "{value:?}"
            );
        }
    }

    #[test]
    fn test_timer_id_conversion() {
        assert_eq!(to_timer_id(&Value::from(3.0)), Some(TimerId(3)));
        assert_eq!(to_timer_id(&Value::from(1.5)), Some(TimerId(1)));
        assert_eq!(to_timer_id(&Value::from(-0.5)), Some(TimerId(0)));
        assert_eq!(to_timer_id(&Value::from(" 0 ")), Some(TimerId(0)));
        assert_eq!(to_timer_id(&Value::from(true)), Some(TimerId(1)));
        assert_eq!(to_timer_id(&Value::from(-1.0)), None);
        assert_eq!(to_timer_id(&Value::from(f64::NAN)), None);
        assert_eq!(to_timer_id(&Value::from("slot")), None);
        assert_eq!(to_timer_id(&Value::Undefined), None);
        assert_eq!(to_timer_id(&Value::Null), None);
    }

    #[test]
    fn test_set_timeout_requires_function() {
        let mut cx = Context::new(Arc::new(ModuleRegistry::new()));
        let err = cx
            .call_global("setTimeout", &[Value::from("code"), Value::from(10.0)])
            .unwrap_err();
        assert!(matches!(err, NativeError::TypeError(_)));

        let callback = Value::Function(Arc::new(Callable::native("cb", |_cx, _args| {
            Ok(Value::Undefined)
        })));
        let handle = cx
            .call_global("setTimeout", &[callback, Value::from(10.0)])
            .unwrap();
        assert_eq!(handle, Value::from(0.0));
        assert_eq!(cx.pending_timers(), 1);

        cx.call_global("clearTimeout", &[Value::from("0")]).unwrap();
        assert_eq!(cx.pending_timers(), 0);
    }

    #[test]
    fn test_set_timeout_without_delay_schedules_nothing() {
        let mut cx = Context::new(Arc::new(ModuleRegistry::new()));
        let callback = Value::Function(Arc::new(Callable::native("cb", |_cx, _args| {
            Ok(Value::Undefined)
        })));

        assert_eq!(cx.call_global("setTimeout", &[]).unwrap(), Value::Undefined);
        let result = cx.call_global("setTimeout", &[callback.clone()]).unwrap();
        assert_eq!(result, Value::Undefined);
        assert_eq!(cx.pending_timers(), 0);

        for delay in [Value::Undefined, Value::Null] {
            let err = cx
                .call_global("setTimeout", &[callback.clone(), delay])
                .unwrap_err();
            assert!(matches!(err, NativeError::TypeError(_)));
        }
        assert_eq!(cx.pending_timers(), 0);
    }
}
