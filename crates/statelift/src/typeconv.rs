//! Semantic type → syntactic type expression.
//!
//! Generated state structs expose variables by their types. When those
//! types mention named types from other packages, the emitted qualifier is
//! the effective (vendor-stripped) path, so the printed imports resolve;
//! named types defined in the emission package itself stay unqualified.
//!
//! Untyped constant kinds take their default types here: bool, int, rune,
//! float64, complex64, string. Unsafe pointers, tuples, and untyped nil
//! have no written form and are conversion failures.

use thiserror::Error;

use statelift_core::error::LiftError;
use statelift_core::types::{BasicKind, ChanDir, SemParam, SemType};
use statelift_syntax::ast::{
    ChanDir as SynChanDir, Expr, Ident, InterfaceElem, InterfaceType, Lit, LitKind, NodeIdGen,
    Param, Signature, StructField, StructType, TypeExpr,
};

/// Conversion failures; each carries a description of the offending type.
#[derive(Debug, Error)]
pub enum TypeConvError {
    #[error("unsafe pointer has no written form")]
    UnsafePointer,

    #[error("untyped nil has no written form")]
    UntypedNil,

    #[error("tuple type reached the converter: {describe}")]
    Tuple { describe: String },

    #[error("interface element {describe} is not a method signature")]
    MalformedInterface { describe: String },
}

impl From<TypeConvError> for LiftError {
    fn from(err: TypeConvError) -> Self {
        LiftError::UnsupportedType {
            describe: err.to_string(),
        }
    }
}

/// Convert a semantic type to the type expression to embed in generated
/// source for package `pkg` (an effective path).
pub fn type_to_syntax(
    ty: &SemType,
    pkg: &str,
    ids: &mut NodeIdGen,
) -> Result<TypeExpr, TypeConvError> {
    match ty {
        SemType::Basic(kind) => basic(*kind, ids),
        SemType::Array { len, elem } => Ok(TypeExpr::Array {
            len: Some(Box::new(Expr::Lit(Lit {
                id: ids.fresh(),
                kind: LitKind::Int,
                text: len.to_string(),
            }))),
            elem: Box::new(type_to_syntax(elem, pkg, ids)?),
        }),
        SemType::Slice(elem) => Ok(TypeExpr::Array {
            len: None,
            elem: Box::new(type_to_syntax(elem, pkg, ids)?),
        }),
        SemType::Struct(fields) => {
            let mut out = Vec::new();
            for field in fields {
                out.push(StructField {
                    id: ids.fresh(),
                    names: vec![Ident::new(ids.fresh(), &field.name)],
                    ty: type_to_syntax(&field.ty, pkg, ids)?,
                    tag: None,
                    comments: Vec::new(),
                    blank_before: false,
                });
            }
            Ok(TypeExpr::Struct(StructType { fields: out }))
        }
        SemType::Pointer(elem) => Ok(TypeExpr::Pointer(Box::new(type_to_syntax(
            elem, pkg, ids,
        )?))),
        SemType::Tuple(_) => Err(TypeConvError::Tuple {
            describe: ty.to_string(),
        }),
        SemType::Signature { params, results } => {
            Ok(TypeExpr::Func(Box::new(signature(params, results, pkg, ids)?)))
        }
        SemType::Interface { embeds, methods } => {
            let mut elems = Vec::new();
            for embed in embeds {
                elems.push(InterfaceElem::Embedded(type_to_syntax(embed, pkg, ids)?));
            }
            for method in methods {
                let SemType::Signature { params, results } = &method.ty else {
                    return Err(TypeConvError::MalformedInterface {
                        describe: method.ty.to_string(),
                    });
                };
                elems.push(InterfaceElem::Method {
                    id: ids.fresh(),
                    name: Ident::new(ids.fresh(), &method.name),
                    sig: signature(params, results, pkg, ids)?,
                });
            }
            Ok(TypeExpr::Interface(InterfaceType { elems }))
        }
        SemType::Map { key, value } => Ok(TypeExpr::Map {
            key: Box::new(type_to_syntax(key, pkg, ids)?),
            value: Box::new(type_to_syntax(value, pkg, ids)?),
        }),
        SemType::Chan { dir, elem } => Ok(TypeExpr::Chan {
            dir: match dir {
                ChanDir::Both => SynChanDir::Both,
                ChanDir::Send => SynChanDir::Send,
                ChanDir::Recv => SynChanDir::Recv,
            },
            elem: Box::new(type_to_syntax(elem, pkg, ids)?),
        }),
        SemType::Named { package, name } => match package {
            Some(package) if package != pkg => Ok(TypeExpr::Name(Ident::qualified(
                ids.fresh(),
                name,
                package,
            ))),
            _ => Ok(TypeExpr::Name(Ident::new(ids.fresh(), name))),
        },
    }
}

fn basic(kind: BasicKind, ids: &mut NodeIdGen) -> Result<TypeExpr, TypeConvError> {
    let name = match kind {
        BasicKind::UnsafePointer => return Err(TypeConvError::UnsafePointer),
        BasicKind::UntypedNil => return Err(TypeConvError::UntypedNil),
        BasicKind::UntypedBool => "bool",
        BasicKind::UntypedInt => "int",
        BasicKind::UntypedRune => "rune",
        BasicKind::UntypedFloat => "float64",
        BasicKind::UntypedComplex => "complex64",
        BasicKind::UntypedString => "string",
        typed => typed.name(),
    };
    Ok(TypeExpr::Name(Ident::new(ids.fresh(), name)))
}

fn signature(
    params: &[SemParam],
    results: &[SemParam],
    pkg: &str,
    ids: &mut NodeIdGen,
) -> Result<Signature, TypeConvError> {
    let mut sig = Signature::default();
    for param in params {
        sig.params.push(formal(param, pkg, ids)?);
    }
    for result in results {
        sig.results.push(formal(result, pkg, ids)?);
    }
    Ok(sig)
}

fn formal(param: &SemParam, pkg: &str, ids: &mut NodeIdGen) -> Result<Param, TypeConvError> {
    let names = if param.name.is_empty() {
        Vec::new()
    } else {
        vec![Ident::new(ids.fresh(), &param.name)]
    };
    Ok(Param {
        id: ids.fresh(),
        names,
        ty: type_to_syntax(&param.ty, pkg, ids)?,
        variadic: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use statelift_syntax::ast::NodeIdGen;

    fn render(ty: &SemType, pkg: &str) -> String {
        let mut ids = NodeIdGen::new();
        let converted = type_to_syntax(ty, pkg, &mut ids).unwrap();
        print_type(&converted)
    }

    // Render through a throwaway file so the printer's import resolution
    // applies to qualified names.
    fn print_type(ty: &TypeExpr) -> String {
        use statelift_syntax::ast::*;
        let mut ids = NodeIdGen::new();
        let file = File {
            id: ids.fresh(),
            name: "t.go".to_string(),
            package: "t".to_string(),
            doc: Vec::new(),
            imports: Vec::new(),
            decls: vec![Decl::Type(TypeDecl {
                id: ids.fresh(),
                grouped: false,
                specs: vec![TypeSpec {
                    id: ids.fresh(),
                    name: Ident::new(ids.fresh(), "X"),
                    assign: false,
                    ty: ty.clone(),
                    comments: Vec::new(),
                }],
                comments: Vec::new(),
            })],
        };
        let out = statelift_syntax::print_file(&file);
        let line = out
            .lines()
            .find(|l| l.starts_with("type X "))
            .unwrap()
            .to_string();
        line.trim_start_matches("type X ").to_string()
    }

    #[test]
    fn untyped_defaults() {
        assert_eq!(render(&SemType::Basic(BasicKind::UntypedInt), "root/a"), "int");
        assert_eq!(
            render(&SemType::Basic(BasicKind::UntypedRune), "root/a"),
            "rune"
        );
        assert_eq!(
            render(&SemType::Basic(BasicKind::UntypedFloat), "root/a"),
            "float64"
        );
        assert_eq!(
            render(&SemType::Basic(BasicKind::UntypedComplex), "root/a"),
            "complex64"
        );
    }

    #[test]
    fn arrays_keep_their_length() {
        let ty = SemType::Array {
            len: 4,
            elem: Box::new(SemType::Basic(BasicKind::Uint8)),
        };
        assert_eq!(render(&ty, "root/a"), "[4]uint8");
    }

    #[test]
    fn slices_and_maps() {
        let ty = SemType::Map {
            key: Box::new(SemType::Basic(BasicKind::String)),
            value: Box::new(SemType::Slice(Box::new(SemType::Basic(BasicKind::Int)))),
        };
        assert_eq!(render(&ty, "root/a"), "map[string][]int");
    }

    #[test]
    fn channels_keep_direction() {
        let ty = SemType::Chan {
            dir: ChanDir::Recv,
            elem: Box::new(SemType::Basic(BasicKind::Int)),
        };
        assert_eq!(render(&ty, "root/a"), "<-chan int");
    }

    #[test]
    fn named_type_in_same_package_is_unqualified() {
        let ty = SemType::Named {
            package: Some("root/a".to_string()),
            name: "T".to_string(),
        };
        assert_eq!(render(&ty, "root/a"), "T");
    }

    #[test]
    fn named_type_elsewhere_is_qualified_by_effective_path() {
        let ty = SemType::Named {
            package: Some("root/b".to_string()),
            name: "T".to_string(),
        };
        assert_eq!(render(&ty, "root/a"), "b.T");
    }

    #[test]
    fn signature_preserves_formal_names() {
        let ty = SemType::Signature {
            params: vec![SemParam {
                name: "n".to_string(),
                ty: SemType::Basic(BasicKind::Int),
            }],
            results: vec![SemParam {
                name: String::new(),
                ty: SemType::Basic(BasicKind::String),
            }],
        };
        assert_eq!(render(&ty, "root/a"), "func(n int) string");
    }

    #[test]
    fn tuple_is_a_conversion_failure() {
        let mut ids = NodeIdGen::new();
        let err = type_to_syntax(
            &SemType::Tuple(vec![SemType::Basic(BasicKind::Int)]),
            "root/a",
            &mut ids,
        )
        .unwrap_err();
        assert!(matches!(err, TypeConvError::Tuple { .. }));
    }

    #[test]
    fn unsafe_pointer_and_untyped_nil_fail() {
        let mut ids = NodeIdGen::new();
        assert!(matches!(
            type_to_syntax(&SemType::Basic(BasicKind::UnsafePointer), "root/a", &mut ids),
            Err(TypeConvError::UnsafePointer)
        ));
        assert!(matches!(
            type_to_syntax(&SemType::Basic(BasicKind::UntypedNil), "root/a", &mut ids),
            Err(TypeConvError::UntypedNil)
        ));
    }

    #[test]
    fn nested_struct_fields_convert_recursively() {
        use statelift_core::types::SemField;
        let ty = SemType::Struct(vec![SemField {
            name: "inner".to_string(),
            ty: SemType::Pointer(Box::new(SemType::Named {
                package: Some("root/b".to_string()),
                name: "T".to_string(),
            })),
        }]);
        let mut ids = NodeIdGen::new();
        let converted = type_to_syntax(&ty, "root/a", &mut ids).unwrap();
        match converted {
            TypeExpr::Struct(st) => {
                assert_eq!(st.fields.len(), 1);
                assert!(matches!(st.fields[0].ty, TypeExpr::Pointer(_)));
            }
            other => panic!("expected struct, got {:?}", other),
        }
    }
}
