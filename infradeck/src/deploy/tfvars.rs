//! Rendering of `terraform.tfvars`

use serde_json::Value;

use crate::models::terraform::Variables;

/// Render variables as `key = value` lines in key order.
///
/// Strings are quoted and escaped, numbers and booleans are written as is,
/// and lists, objects and null use their JSON form, which HCL also accepts.
pub fn render_tfvars(variables: &Variables) -> String {
    let mut out = String::new();
    for (key, value) in variables {
        out.push_str(key);
        out.push_str(" = ");
        match value {
            Value::String(s) => out.push_str(&quote(s)),
            other => out.push_str(&other.to_string()),
        }
        out.push('\n');
    }
    out
}

fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
