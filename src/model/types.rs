use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to a (possibly parameterized) type as declared in source.
///
/// The `origin` line is host metadata: it does not participate in equality
/// and is never carried over into synthesized signatures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<GenericArg>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub array_dims: usize,
    #[serde(skip)]
    pub origin: Option<usize>,
}

/// One argument of a parameterized type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenericArg {
    /// `Map<String, Integer>`
    Concrete(TypeRef),
    /// `?`, `? extends Number & Comparable`, `? super Integer`
    Wildcard {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        upper: Vec<TypeRef>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lower: Option<TypeRef>,
    },
    /// `T extends Comparable<T>`
    Placeholder {
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        upper: Vec<TypeRef>,
    },
}

fn is_zero(value: &usize) -> bool {
    *value == 0
}

impl TypeRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            array_dims: 0,
            origin: None,
        }
    }

    pub fn with_args(mut self, args: Vec<GenericArg>) -> Self {
        self.args = args;
        self
    }

    pub fn array(mut self, dims: usize) -> Self {
        self.array_dims = dims;
        self
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.origin = Some(line);
        self
    }

    pub fn is_generic(&self) -> bool {
        !self.args.is_empty()
    }

    /// Last segment of a dotted name (`java.util.List` -> `List`).
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Matches either the full or the simple name against `candidates`,
    /// ignoring array types.
    pub fn is_one_of(&self, candidates: &[String]) -> bool {
        self.array_dims == 0
            && !self.is_generic()
            && candidates
                .iter()
                .any(|candidate| candidate == &self.name || candidate == self.simple_name())
    }

    /// Rebuilds this reference node by node.
    ///
    /// Every argument and bound becomes a fresh node, so the copy shares no
    /// host metadata with the declaration it was taken from.
    pub fn structural_copy(&self) -> TypeRef {
        TypeRef {
            name: self.name.clone(),
            args: self.args.iter().map(GenericArg::structural_copy).collect(),
            array_dims: self.array_dims,
            origin: None,
        }
    }
}

impl GenericArg {
    pub fn structural_copy(&self) -> GenericArg {
        match self {
            GenericArg::Concrete(ty) => GenericArg::Concrete(ty.structural_copy()),
            GenericArg::Wildcard { upper, lower } => GenericArg::Wildcard {
                upper: upper.iter().map(TypeRef::structural_copy).collect(),
                lower: lower.as_ref().map(TypeRef::structural_copy),
            },
            GenericArg::Placeholder { name, upper } => GenericArg::Placeholder {
                name: name.clone(),
                upper: upper.iter().map(TypeRef::structural_copy).collect(),
            },
        }
    }
}

// `origin` is a source position and stays out of equality.
impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.args == other.args && self.array_dims == other.array_dims
    }
}

impl Eq for TypeRef {}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "<")?;
            for (idx, arg) in self.args.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ">")?;
        }
        for _ in 0..self.array_dims {
            write!(f, "[]")?;
        }
        Ok(())
    }
}

impl fmt::Display for GenericArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenericArg::Concrete(ty) => write!(f, "{}", ty),
            GenericArg::Wildcard { upper, lower } => {
                write!(f, "?")?;
                if !upper.is_empty() {
                    write!(f, " extends {}", join_bounds(upper))?;
                }
                if let Some(lower) = lower {
                    write!(f, " super {}", lower)?;
                }
                Ok(())
            }
            GenericArg::Placeholder { name, upper } => {
                write!(f, "{}", name)?;
                if !upper.is_empty() {
                    write!(f, " extends {}", join_bounds(upper))?;
                }
                Ok(())
            }
        }
    }
}

fn join_bounds(bounds: &[TypeRef]) -> String {
    bounds
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" & ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_of_wildcard() -> TypeRef {
        TypeRef::new("Map")
            .with_args(vec![
                GenericArg::Concrete(TypeRef::new("String").at_line(3)),
                GenericArg::Concrete(TypeRef::new("List").with_args(vec![GenericArg::Wildcard {
                    upper: vec![TypeRef::new("Number")],
                    lower: None,
                }])),
            ])
            .at_line(3)
    }

    #[test]
    fn structural_copy_drops_origin_but_keeps_shape() {
        let original = list_of_wildcard();
        let copy = original.structural_copy();

        assert_eq!(copy, original);
        assert_eq!(copy.origin, None);
        assert_eq!(original.origin, Some(3));
        match &copy.args[0] {
            GenericArg::Concrete(inner) => assert_eq!(inner.origin, None),
            other => panic!("unexpected argument {:?}", other),
        }
    }

    #[test]
    fn display_renders_bounds_and_arrays() {
        assert_eq!(list_of_wildcard().to_string(), "Map<String, List<? extends Number>>");

        let placeholder = TypeRef::new("Box").with_args(vec![GenericArg::Placeholder {
            name: "T".into(),
            upper: vec![TypeRef::new("Comparable"), TypeRef::new("Serializable")],
        }]);
        assert_eq!(placeholder.to_string(), "Box<T extends Comparable & Serializable>");

        let lower = TypeRef::new("List")
            .with_args(vec![GenericArg::Wildcard {
                upper: vec![],
                lower: Some(TypeRef::new("Integer")),
            }])
            .array(2);
        assert_eq!(lower.to_string(), "List<? super Integer>[][]");
    }

    #[test]
    fn simple_name_matching_ignores_packages() {
        let ty = TypeRef::new("java.lang.Boolean");
        assert_eq!(ty.simple_name(), "Boolean");
        assert!(ty.is_one_of(&["Boolean".to_string()]));
        assert!(!ty.clone().array(1).is_one_of(&["Boolean".to_string()]));
    }
}
