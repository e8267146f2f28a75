//! Built-in Handlebars helpers

use handlebars::{Handlebars, handlebars_helper};
use serde_json::Value;

handlebars_helper!(eq: |a: Json, b: Json| a == b);
handlebars_helper!(ne: |a: Json, b: Json| a != b);
handlebars_helper!(upper: |s: str| s.to_uppercase());
handlebars_helper!(lower: |s: str| s.to_lowercase());
handlebars_helper!(len: |v: Json| match v {
    Value::Array(items) => items.len(),
    Value::Object(map) => map.len(),
    Value::String(s) => s.chars().count(),
    _ => 0,
});
handlebars_helper!(json: |v: Json| v.to_string());

/// Register all built-in helpers
pub fn register_builtin_helpers(handlebars: &mut Handlebars) {
    handlebars.register_helper("eq", Box::new(eq));
    handlebars.register_helper("ne", Box::new(ne));
    handlebars.register_helper("upper", Box::new(upper));
    handlebars.register_helper("lower", Box::new(lower));
    handlebars.register_helper("len", Box::new(len));
    handlebars.register_helper("json", Box::new(json));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(template: &str, data: &Value) -> String {
        let mut handlebars = Handlebars::new();
        register_builtin_helpers(&mut handlebars);
        handlebars.render_template(template, data).unwrap()
    }

    #[test]
    fn test_comparison_helpers() {
        let data = json!({"a": 1, "b": 1, "c": 2});
        assert_eq!(render("{{#if (eq a b)}}yes{{/if}}", &data), "yes");
        assert_eq!(render("{{#if (ne a c)}}yes{{/if}}", &data), "yes");
    }

    #[test]
    fn test_string_helpers() {
        let data = json!({"name": "Ada"});
        assert_eq!(render("{{upper name}} {{lower name}}", &data), "ADA ada");
    }

    #[test]
    fn test_len_helper() {
        let data = json!({"items": [1, 2, 3], "word": "héllo"});
        assert_eq!(render("{{len items}}/{{len word}}", &data), "3/5");
    }
}
