//! Canonical rendering, used by `print`, interpolation and `string(x)`.

use std::fmt::{self, Write};

use super::Value;

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::Bool(true) => f.write_str("yes"),
            Value::Bool(false) => f.write_str("no"),
            Value::Nil => f.write_str("nil"),
            Value::Uninitialized => f.write_str("<uninitialized>"),
            Value::Const(inner) => inner.fmt(f),
            Value::Tuple(items) => {
                f.write_char('(')?;
                write_joined(f, items)?;
                f.write_char(')')
            }
            Value::Array(a) => {
                f.write_char('[')?;
                write_joined(f, &a.snapshot())?;
                f.write_char(']')
            }
            Value::Map(m) => {
                f.write_char('{')?;
                for (i, (key, value)) in m.sorted_entries().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {value}", key.value())?;
                }
                f.write_char('}')
            }
            Value::Struct(s) => {
                f.write_str(s.name.as_deref().unwrap_or("struct"))?;
                f.write_char('{')?;
                for (i, (name, value)) in s.fields().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                f.write_char('}')
            }
            Value::Enum(e) => write!(f, "{}.{}", e.type_name, e.variant),
            Value::Function(_) => f.write_str("<function>"),
            Value::Named(n) => n.inner.fmt(f),
            Value::Error(e) => f.write_str(&e.message),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}
