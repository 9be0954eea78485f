use crate::config::AccessorNaming;

/// Which half of an accessor pair a method name looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorKind {
    Reader,
    /// `is`-prefixed reader, only meaningful for boolean properties
    BooleanReader,
    Writer,
}

impl AccessorNaming {
    pub fn reader(self, property: &str) -> String {
        self.prefixed("get", property)
    }

    pub fn boolean_reader(self, property: &str) -> String {
        self.prefixed("is", property)
    }

    pub fn writer(self, property: &str) -> String {
        self.prefixed("set", property)
    }

    fn prefixed(self, prefix: &str, property: &str) -> String {
        match self {
            AccessorNaming::Bean => format!("{}{}", prefix, capitalize(property)),
            AccessorNaming::Snake => format!("{}_{}", prefix, property),
        }
    }

    /// Splits an accessor-shaped method name into its kind and property name.
    pub fn parse(self, method: &str) -> Option<(AccessorKind, String)> {
        const PREFIXES: [(&str, AccessorKind); 3] = [
            ("get", AccessorKind::Reader),
            ("is", AccessorKind::BooleanReader),
            ("set", AccessorKind::Writer),
        ];

        for (prefix, kind) in PREFIXES {
            let Some(rest) = method.strip_prefix(prefix) else {
                continue;
            };
            let property = match self {
                AccessorNaming::Bean => {
                    if !rest.chars().next().is_some_and(|ch| ch.is_uppercase()) {
                        continue;
                    }
                    decapitalize(rest)
                }
                AccessorNaming::Snake => match rest.strip_prefix('_') {
                    Some(name) if !name.is_empty() => name.to_string(),
                    _ => continue,
                },
            };
            return Some((kind, property));
        }
        None
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// JavaBeans rule: `URL` stays `URL`, `Name` becomes `name`.
fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    if chars.next().is_some_and(|second| second.is_uppercase()) && first.is_uppercase() {
        return name.to_string();
    }
    first.to_lowercase().chain(name.chars().skip(1)).collect()
}
