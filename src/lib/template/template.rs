use super::types::{Attributes, Segment, Template};

impl Template {
    /// Splits `format` into literal and `{key:default}` segments.
    ///
    /// Never fails. A `{` seen while a placeholder is already open is emitted
    /// as a literal and closes the placeholder, so `{{x}` renders as `{x}`.
    /// An unterminated placeholder at the end of input is kept as literal text.
    pub fn parse(format: &str) -> Self {
        let mut segments = Vec::new();
        let mut in_placeholder = false;
        let mut span = String::new();

        for ch in format.chars() {
            match ch {
                '{' if in_placeholder => {
                    segments.push(Segment::Literal("{".to_string()));
                    in_placeholder = false;
                }
                '{' => {
                    segments.push(Segment::Literal(std::mem::take(&mut span)));
                    in_placeholder = true;
                }
                '}' if in_placeholder => {
                    let (key, default) = span.split_once(':').unwrap_or((span.as_str(), ""));
                    segments.push(Segment::Placeholder {
                        key: key.to_string(),
                        default: default.to_string(),
                    });
                    span.clear();
                    in_placeholder = false;
                }
                _ => span.push(ch),
            }
        }

        if in_placeholder {
            span.insert(0, '{');
        }
        segments.push(Segment::Literal(span));
        segments.retain(|segment| !matches!(segment, Segment::Literal(text) if text.is_empty()));

        Template { segments }
    }

    /// Renders the template. Missing keys and empty values both fall back to
    /// the placeholder's default.
    pub fn substitute(&self, attrs: &Attributes) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder { key, default } => {
                    match attrs.get(key).filter(|value| !value.is_empty()) {
                        Some(value) => out.push_str(value),
                        None => out.push_str(default),
                    }
                }
            }
        }
        out
    }

    #[cfg(test)]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl From<&str> for Template {
    fn from(format: &str) -> Self {
        Template::parse(format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn render(format: &str, pairs: &[(&str, &str)]) -> String {
        Template::parse(format).substitute(&attrs(pairs))
    }

    #[test]
    fn test_parse_segments() {
        let template = Template::parse("rules/{name}-{env:prod}.yml");
        assert_eq!(
            template.segments(),
            &[
                Segment::Literal("rules/".to_string()),
                Segment::Placeholder {
                    key: "name".to_string(),
                    default: String::new()
                },
                Segment::Literal("-".to_string()),
                Segment::Placeholder {
                    key: "env".to_string(),
                    default: "prod".to_string()
                },
                Segment::Literal(".yml".to_string()),
            ]
        );
    }

    #[test]
    fn test_substitutes_every_placeholder_in_order() {
        let out = render(
            "/srv/{image}/{name}.{ext}",
            &[("image", "nginx:1.25"), ("name", "web"), ("ext", "conf")],
        );
        assert_eq!(out, "/srv/nginx:1.25/web.conf");
    }

    #[test]
    fn test_plain_string_is_unchanged() {
        assert_eq!(render("static.conf", &[]), "static.conf");
        assert_eq!(render("", &[]), "");
    }

    #[test]
    fn test_default_fallback() {
        assert_eq!(render("{k:def}", &[]), "def");
        assert_eq!(render("{k:def}", &[("k", "")]), "def");
        assert_eq!(render("{k:def}", &[("k", "v")]), "v");
    }

    #[test]
    fn test_default_splits_on_first_colon() {
        assert_eq!(render("{k:a:b}", &[]), "a:b");
    }

    #[test]
    fn test_missing_key_without_default_is_empty() {
        assert_eq!(render("x{k}y", &[]), "xy");
    }

    #[test]
    fn test_empty_key_uses_default() {
        assert_eq!(render("{:fallback}", &[]), "fallback");
        assert_eq!(render("a{}b", &[]), "ab");
    }

    #[test]
    fn test_unterminated_placeholder_is_literal() {
        assert_eq!(render("a{b", &[]), "a{b");
        assert_eq!(render("{name}{", &[("name", "web")]), "web{");
    }

    #[test]
    fn test_doubled_open_brace_cancels_placeholder() {
        assert_eq!(render("{{x}", &[]), "{x}");
        assert_eq!(render("{{x}", &[("x", "ignored")]), "{x}");
    }

    #[test]
    fn test_stray_close_brace_is_literal() {
        assert_eq!(render("a}b", &[]), "a}b");
    }

    #[test]
    fn test_label_keys_with_dots() {
        let out = render(
            "{com.example.group:default}/{name}",
            &[("com.example.group", "edge"), ("name", "api")],
        );
        assert_eq!(out, "edge/api");
    }
}
