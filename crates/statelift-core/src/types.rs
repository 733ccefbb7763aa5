//! Semantic types, as produced by the checker and consumed by the
//! type-to-syntax converter.
//!
//! Untyped constant kinds are kept distinct so the converter can apply the
//! default-type rule at emission time (untyped int becomes `int`, untyped
//! rune becomes `rune`, and so on).

use std::fmt;

/// Basic type kinds, including the untyped constant kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicKind {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    UnsafePointer,
    UntypedBool,
    UntypedInt,
    UntypedRune,
    UntypedFloat,
    UntypedComplex,
    UntypedString,
    UntypedNil,
}

impl BasicKind {
    /// The written name of a typed basic kind.
    pub fn name(self) -> &'static str {
        match self {
            BasicKind::Bool => "bool",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::Complex64 => "complex64",
            BasicKind::Complex128 => "complex128",
            BasicKind::String => "string",
            BasicKind::UnsafePointer => "unsafe.Pointer",
            BasicKind::UntypedBool => "untyped bool",
            BasicKind::UntypedInt => "untyped int",
            BasicKind::UntypedRune => "untyped rune",
            BasicKind::UntypedFloat => "untyped float",
            BasicKind::UntypedComplex => "untyped complex",
            BasicKind::UntypedString => "untyped string",
            BasicKind::UntypedNil => "untyped nil",
        }
    }

    /// Look up a predeclared type name.
    pub fn from_name(name: &str) -> Option<BasicKind> {
        Some(match name {
            "bool" => BasicKind::Bool,
            "int" => BasicKind::Int,
            "int8" => BasicKind::Int8,
            "int16" => BasicKind::Int16,
            "int32" | "rune" => BasicKind::Int32,
            "int64" => BasicKind::Int64,
            "uint" => BasicKind::Uint,
            "uint8" | "byte" => BasicKind::Uint8,
            "uint16" => BasicKind::Uint16,
            "uint32" => BasicKind::Uint32,
            "uint64" => BasicKind::Uint64,
            "uintptr" => BasicKind::Uintptr,
            "float32" => BasicKind::Float32,
            "float64" => BasicKind::Float64,
            "complex64" => BasicKind::Complex64,
            "complex128" => BasicKind::Complex128,
            "string" => BasicKind::String,
            _ => return None,
        })
    }
}

/// Channel directionality of a semantic channel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// One field of a semantic struct type.
#[derive(Debug, Clone, PartialEq)]
pub struct SemField {
    pub name: String,
    pub ty: SemType,
}

/// One formal of a semantic signature; the name is kept where the source
/// had one so generated signatures can preserve it.
#[derive(Debug, Clone, PartialEq)]
pub struct SemParam {
    pub name: String,
    pub ty: SemType,
}

/// A semantic type.
#[derive(Debug, Clone, PartialEq)]
pub enum SemType {
    Basic(BasicKind),
    Array {
        len: u64,
        elem: Box<SemType>,
    },
    Slice(Box<SemType>),
    Struct(Vec<SemField>),
    Pointer(Box<SemType>),
    Tuple(Vec<SemType>),
    Signature {
        params: Vec<SemParam>,
        results: Vec<SemParam>,
    },
    Interface {
        embeds: Vec<SemType>,
        methods: Vec<SemParam>,
    },
    Map {
        key: Box<SemType>,
        value: Box<SemType>,
    },
    Chan {
        dir: ChanDir,
        elem: Box<SemType>,
    },
    Named {
        /// Effective path of the defining package; `None` for predeclared
        /// named types such as `error`.
        package: Option<String>,
        name: String,
    },
}

impl fmt::Display for SemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemType::Basic(kind) => write!(f, "{}", kind.name()),
            SemType::Array { len, elem } => write!(f, "[{}]{}", len, elem),
            SemType::Slice(elem) => write!(f, "[]{}", elem),
            SemType::Struct(fields) => {
                write!(f, "struct{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{} {}", field.name, field.ty)?;
                }
                write!(f, "}}")
            }
            SemType::Pointer(elem) => write!(f, "*{}", elem),
            SemType::Tuple(elems) => {
                write!(f, "(")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", elem)?;
                }
                write!(f, ")")
            }
            SemType::Signature { params, results } => {
                write!(f, "func(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", param.ty)?;
                }
                write!(f, ")")?;
                if !results.is_empty() {
                    write!(f, " (")?;
                    for (i, result) in results.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", result.ty)?;
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
            SemType::Interface { embeds, methods } => {
                write!(f, "interface{{")?;
                let mut first = true;
                for embed in embeds {
                    if !first {
                        write!(f, "; ")?;
                    }
                    first = false;
                    write!(f, "{}", embed)?;
                }
                for method in methods {
                    if !first {
                        write!(f, "; ")?;
                    }
                    first = false;
                    write!(f, "{}{}", method.name, method.ty)?;
                }
                write!(f, "}}")
            }
            SemType::Map { key, value } => write!(f, "map[{}]{}", key, value),
            SemType::Chan { dir, elem } => match dir {
                ChanDir::Both => write!(f, "chan {}", elem),
                ChanDir::Send => write!(f, "chan<- {}", elem),
                ChanDir::Recv => write!(f, "<-chan {}", elem),
            },
            SemType::Named { package, name } => match package {
                Some(package) => write!(f, "{}.{}", package, name),
                None => write!(f, "{}", name),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_and_rune_are_basic_aliases() {
        assert_eq!(BasicKind::from_name("byte"), Some(BasicKind::Uint8));
        assert_eq!(BasicKind::from_name("rune"), Some(BasicKind::Int32));
    }

    #[test]
    fn display_compounds() {
        let ty = SemType::Map {
            key: Box::new(SemType::Basic(BasicKind::String)),
            value: Box::new(SemType::Slice(Box::new(SemType::Basic(BasicKind::Int)))),
        };
        assert_eq!(ty.to_string(), "map[string][]int");
    }

    #[test]
    fn display_named_with_package() {
        let ty = SemType::Named {
            package: Some("root/b".to_string()),
            name: "T".to_string(),
        };
        assert_eq!(ty.to_string(), "root/b.T");
    }
}
