//! Lowers `ruff_python_ast`'s parse tree into this crate's untyped AST.
//!
//! This is the one file in the workspace that knows about the host parser's
//! concrete node shapes. It performs no inference and no folding: an
//! unsupported construct (anything outside the typed subset this compiler
//! accepts) becomes a [`FrontEndError::Unsupported`], not a panic, and the
//! structured diagnostic conversion happens at the call site in `compile`.
//! Everything downstream of [`lower_module`] only ever sees `crate::ast`.

use num_bigint::BigInt;
use ruff_python_ast::{self as rast, Expr as RExpr, Stmt as RStmt};
use ruff_text_size::Ranged;

use crate::{
    ast::{
        BinOp, ClassDef, CmpOp, Expr, ExprKind, FieldDef, FunctionDef, Keyword, Literal, Module, Param, Stmt,
        StmtKind, TypeExpr, UnOp,
    },
    diagnostics::{Diagnostic, Nestable},
    names::Name,
    span::{LineIndex, Span},
};

#[derive(Debug, Clone)]
pub enum FrontEndError {
    Parse(String),
    Unsupported { what: &'static str, span: Span },
}

impl std::fmt::Display for FrontEndError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::Unsupported { what, span } => write!(f, "unsupported construct `{what}` at {}", span.start),
        }
    }
}

impl std::error::Error for FrontEndError {}

impl Nestable for FrontEndError {
    fn nested(self) -> Result<Diagnostic, Self> {
        Err(self)
    }
}

impl FrontEndError {
    /// The span to blame this error on for a rendered diagnostic: the
    /// offending construct's own span where known, or a synthetic one for a
    /// raw parse failure (the underlying parser's own error already carries
    /// its own position inside `Self::Parse`'s message).
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Parse(_) => Span::synthetic(),
            Self::Unsupported { span, .. } => *span,
        }
    }
}

/// Parses `source` and lowers it into this crate's untyped AST.
pub fn lower_module(source: &str) -> Result<Module, FrontEndError> {
    let parsed = ruff_python_parser::parse_module(source).map_err(|e| FrontEndError::Parse(e.to_string()))?;
    let lines = LineIndex::new(source);
    let mut lowering = Lowering { lines: &lines };
    let body = parsed
        .syntax()
        .body
        .iter()
        .map(|s| lowering.stmt(s))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Module { body })
}

struct Lowering<'a> {
    lines: &'a LineIndex,
}

impl Lowering<'_> {
    fn span(&self, node: &impl Ranged) -> Span {
        self.lines.span_of(node)
    }

    fn name(id: &rast::name::Name) -> Name {
        Name::new(id.as_str())
    }

    fn ident(id: &rast::Identifier) -> Name {
        Name::new(id.as_str())
    }

    fn stmt(&mut self, stmt: &RStmt) -> Result<Stmt, FrontEndError> {
        let span = self.span(stmt);
        let kind = match stmt {
            RStmt::FunctionDef(def) => StmtKind::FunctionDef(self.function_def(def)?),
            RStmt::ClassDef(def) => StmtKind::ClassDef(self.class_def(def)?),
            RStmt::Assign(assign) => {
                let [target] = assign.targets.as_slice() else {
                    return Err(FrontEndError::Unsupported { what: "multi-target assignment", span });
                };
                let RExpr::Name(name) = target else {
                    return Err(FrontEndError::Unsupported { what: "non-name assignment target", span });
                };
                StmtKind::Assign { target: Self::name(&name.id), value: self.expr(&assign.value)? }
            }
            RStmt::AnnAssign(ann) => {
                let RExpr::Name(name) = ann.target.as_ref() else {
                    return Err(FrontEndError::Unsupported { what: "non-name annotated-assign target", span });
                };
                StmtKind::AnnAssign {
                    target: Self::name(&name.id),
                    annotation: self.type_expr(&ann.annotation)?,
                    value: ann.value.as_deref().map(|v| self.expr(v)).transpose()?,
                }
            }
            RStmt::Expr(expr_stmt) => StmtKind::ExprStmt(self.expr(&expr_stmt.value)?),
            RStmt::If(if_stmt) => {
                let mut orelse = Vec::new();
                for clause in if_stmt.elif_else_clauses.iter().rev() {
                    let clause_body = clause
                        .body
                        .iter()
                        .map(|s| self.stmt(s))
                        .collect::<Result<Vec<_>, _>>()?;
                    orelse = if let Some(test) = &clause.test {
                        vec![Stmt {
                            span: self.span(clause),
                            kind: StmtKind::If { test: self.expr(test)?, body: clause_body, orelse: std::mem::take(&mut orelse) },
                        }]
                    } else {
                        clause_body
                    };
                }
                StmtKind::If {
                    test: self.expr(&if_stmt.test)?,
                    body: if_stmt.body.iter().map(|s| self.stmt(s)).collect::<Result<_, _>>()?,
                    orelse,
                }
            }
            RStmt::For(for_stmt) => {
                let RExpr::Name(target) = for_stmt.target.as_ref() else {
                    return Err(FrontEndError::Unsupported { what: "non-name for-loop target", span });
                };
                StmtKind::For {
                    target: Self::name(&target.id),
                    iter: self.expr(&for_stmt.iter)?,
                    body: for_stmt.body.iter().map(|s| self.stmt(s)).collect::<Result<_, _>>()?,
                }
            }
            RStmt::Return(ret) => StmtKind::Return(ret.value.as_deref().map(|v| self.expr(v)).transpose()?),
            RStmt::Assert(assert_stmt) => StmtKind::Assert {
                test: self.expr(&assert_stmt.test)?,
                msg: assert_stmt.msg.as_deref().map(|v| self.expr(v)).transpose()?,
            },
            RStmt::Import(import) => StmtKind::Import {
                names: import.names.iter().map(|alias| Self::ident(&alias.name)).collect(),
            },
            RStmt::ImportFrom(import) => StmtKind::Import {
                names: import.names.iter().map(|alias| Self::ident(&alias.name)).collect(),
            },
            other => return Err(FrontEndError::Unsupported { what: stmt_kind_name(other), span }),
        };
        Ok(Stmt { span, kind })
    }

    fn function_def(&mut self, def: &rast::StmtFunctionDef) -> Result<FunctionDef, FrontEndError> {
        let span = self.span(def);
        let mut params = Vec::new();
        for p in def.parameters.posonlyargs.iter().chain(def.parameters.args.iter()) {
            params.push(self.param(p)?);
        }
        if def.parameters.vararg.is_some() || def.parameters.kwarg.is_some() || !def.parameters.kwonlyargs.is_empty() {
            return Err(FrontEndError::Unsupported { what: "*args/**kwargs/keyword-only parameters", span });
        }
        let returns = def
            .returns
            .as_deref()
            .map(|r| self.type_expr(r))
            .transpose()?
            .unwrap_or(TypeExpr::NoneType);
        Ok(FunctionDef {
            span,
            name: Self::ident(&def.name),
            params,
            returns,
            body: def.body.iter().map(|s| self.stmt(s)).collect::<Result<_, _>>()?,
        })
    }

    fn param(&mut self, p: &rast::ParameterWithDefault) -> Result<Param, FrontEndError> {
        let span = self.span(p);
        let annotation = p
            .parameter
            .annotation
            .as_deref()
            .map(|a| self.type_expr(a))
            .transpose()?
            .ok_or(FrontEndError::Unsupported { what: "parameter without type annotation", span })?;
        Ok(Param {
            span,
            name: Self::ident(&p.parameter.name),
            annotation,
            default: p.default.as_deref().map(|d| self.expr(d)).transpose()?,
        })
    }

    fn class_def(&mut self, def: &rast::StmtClassDef) -> Result<ClassDef, FrontEndError> {
        let span = self.span(def);
        let mut fields = Vec::new();
        let mut constructor_tag = None;
        for stmt in &def.body {
            match stmt {
                RStmt::AnnAssign(ann) => {
                    let RExpr::Name(name) = ann.target.as_ref() else {
                        continue;
                    };
                    fields.push(FieldDef { name: Self::name(&name.id), annotation: self.type_expr(&ann.annotation)? });
                }
                RStmt::Assign(assign) => {
                    if let [RExpr::Name(name)] = assign.targets.as_slice() {
                        if name.id.as_str() == "CONSTR_ID" {
                            constructor_tag = literal_int(&assign.value);
                        }
                    }
                }
                RStmt::Pass(_) | RStmt::Expr(_) => {}
                other => return Err(FrontEndError::Unsupported { what: stmt_kind_name(other), span: self.span(other) }),
            }
        }
        Ok(ClassDef { span, name: Self::ident(&def.name), constructor_tag, fields })
    }

    fn type_expr(&mut self, expr: &RExpr) -> Result<TypeExpr, FrontEndError> {
        match expr {
            RExpr::Name(name) if name.id.as_str() == "None" => Ok(TypeExpr::NoneType),
            RExpr::NoneLiteral(_) => Ok(TypeExpr::NoneType),
            RExpr::Name(name) => Ok(TypeExpr::Name(Self::name(&name.id))),
            RExpr::Subscript(sub) => {
                let RExpr::Name(base) = sub.value.as_ref() else {
                    return Err(FrontEndError::Unsupported { what: "non-name generic base type", span: self.span(sub) });
                };
                let args = match sub.slice.as_ref() {
                    RExpr::Tuple(tuple) => tuple.elts.iter().map(|e| self.type_expr(e)).collect::<Result<_, _>>()?,
                    other => vec![self.type_expr(other)?],
                };
                Ok(TypeExpr::Subscript { base: Self::name(&base.id), args })
            }
            other => Err(FrontEndError::Unsupported { what: "type annotation shape", span: self.span(other) }),
        }
    }

    fn expr(&mut self, expr: &RExpr) -> Result<Expr, FrontEndError> {
        let span = self.span(expr);
        let kind = match expr {
            RExpr::NumberLiteral(n) => ExprKind::Literal(Literal::Int(number_to_bigint(&n.value).ok_or(
                FrontEndError::Unsupported { what: "non-integer numeric literal", span },
            )?)),
            RExpr::StringLiteral(s) => ExprKind::Literal(Literal::Str(s.value.to_str().to_owned())),
            RExpr::BytesLiteral(b) => ExprKind::Literal(Literal::ByteString(b.value.iter().flatten().copied().collect())),
            RExpr::BooleanLiteral(b) => ExprKind::Literal(Literal::Bool(b.value)),
            RExpr::NoneLiteral(_) => ExprKind::Literal(Literal::None),
            RExpr::Name(name) => ExprKind::Name(Self::name(&name.id)),
            RExpr::BinOp(binop) => ExprKind::BinOp {
                op: lower_binop(binop.op).ok_or(FrontEndError::Unsupported { what: "binary operator", span })?,
                left: Box::new(self.expr(&binop.left)?),
                right: Box::new(self.expr(&binop.right)?),
            },
            RExpr::UnaryOp(unop) => ExprKind::UnOp {
                op: lower_unop(unop.op).ok_or(FrontEndError::Unsupported { what: "unary operator", span })?,
                operand: Box::new(self.expr(&unop.operand)?),
            },
            RExpr::BoolOp(boolop) => ExprKind::BoolOp {
                and: matches!(boolop.op, rast::BoolOp::And),
                values: boolop.values.iter().map(|e| self.expr(e)).collect::<Result<_, _>>()?,
            },
            RExpr::Compare(cmp) => {
                if cmp.comparators.len() != 1 || cmp.ops.len() != 1 {
                    return Err(FrontEndError::Unsupported { what: "chained comparison", span });
                }
                ExprKind::Compare {
                    left: Box::new(self.expr(&cmp.left)?),
                    op: lower_cmpop(cmp.ops[0]).ok_or(FrontEndError::Unsupported { what: "comparison operator", span })?,
                    right: Box::new(self.expr(&cmp.comparators[0])?),
                }
            }
            RExpr::Call(call) => {
                if let RExpr::Name(name) = call.func.as_ref() {
                    if name.id.as_str() == "isinstance" && call.arguments.args.len() == 2 {
                        let RExpr::Name(class) = &call.arguments.args[1] else {
                            return Err(FrontEndError::Unsupported { what: "dynamic isinstance class", span });
                        };
                        return Ok(Expr {
                            span,
                            kind: ExprKind::IsInstance {
                                value: Box::new(self.expr(&call.arguments.args[0])?),
                                class: Self::name(&class.id),
                            },
                        });
                    }
                }
                let args = call.arguments.args.iter().map(|a| self.expr(a)).collect::<Result<_, _>>()?;
                let keywords = call
                    .arguments
                    .keywords
                    .iter()
                    .map(|kw| {
                        let name = kw.arg.as_ref().ok_or(FrontEndError::Unsupported { what: "**kwargs expansion", span })?;
                        Ok(Keyword { name: Self::ident(name), value: self.expr(&kw.value)? })
                    })
                    .collect::<Result<_, FrontEndError>>()?;
                ExprKind::Call { func: Box::new(self.expr(&call.func)?), args, keywords }
            }
            RExpr::Attribute(attr) => ExprKind::Attribute { value: Box::new(self.expr(&attr.value)?), attr: Self::ident(&attr.attr) },
            RExpr::Subscript(sub) => ExprKind::Subscript { value: Box::new(self.expr(&sub.value)?), index: Box::new(self.expr(&sub.slice)?) },
            RExpr::List(list) => ExprKind::List(list.elts.iter().map(|e| self.expr(e)).collect::<Result<_, _>>()?),
            RExpr::Tuple(tuple) => ExprKind::Tuple(tuple.elts.iter().map(|e| self.expr(e)).collect::<Result<_, _>>()?),
            RExpr::Dict(dict) => {
                let mut keys = Vec::new();
                let mut values = Vec::new();
                for item in &dict.items {
                    let key = item.key.as_ref().ok_or(FrontEndError::Unsupported { what: "**dict expansion", span })?;
                    keys.push(self.expr(key)?);
                    values.push(self.expr(&item.value)?);
                }
                ExprKind::Dict { keys, values }
            }
            RExpr::If(ifexp) => ExprKind::IfExp {
                test: Box::new(self.expr(&ifexp.test)?),
                body: Box::new(self.expr(&ifexp.body)?),
                orelse: Box::new(self.expr(&ifexp.orelse)?),
            },
            other => return Err(FrontEndError::Unsupported { what: expr_kind_name(other), span }),
        };
        Ok(Expr { span, kind })
    }
}

fn number_to_bigint(n: &rast::Number) -> Option<BigInt> {
    match n {
        rast::Number::Int(i) => BigInt::parse_bytes(i.to_string().as_bytes(), 10),
        rast::Number::Float(_) | rast::Number::Complex { .. } => None,
    }
}

fn literal_int(expr: &RExpr) -> Option<i64> {
    match expr {
        RExpr::NumberLiteral(n) => match &n.value {
            rast::Number::Int(i) => i.to_string().parse().ok(),
            _ => None,
        },
        RExpr::UnaryOp(u) if matches!(u.op, rast::UnaryOp::USub) => literal_int(&u.operand).map(|v| -v),
        _ => None,
    }
}

fn lower_binop(op: rast::Operator) -> Option<BinOp> {
    use rast::Operator as O;
    Some(match op {
        O::Add => BinOp::Add,
        O::Sub => BinOp::Sub,
        O::Mult => BinOp::Mult,
        O::FloorDiv => BinOp::FloorDiv,
        O::Mod => BinOp::Mod,
        O::BitAnd => BinOp::BitAnd,
        O::BitOr => BinOp::BitOr,
        O::BitXor => BinOp::BitXor,
        O::LShift => BinOp::LShift,
        O::RShift => BinOp::RShift,
        _ => return None,
    })
}

fn lower_unop(op: rast::UnaryOp) -> Option<UnOp> {
    match op {
        rast::UnaryOp::Not => Some(UnOp::Not),
        rast::UnaryOp::USub => Some(UnOp::USub),
        rast::UnaryOp::UAdd | rast::UnaryOp::Invert => None,
    }
}

fn lower_cmpop(op: rast::CmpOp) -> Option<CmpOp> {
    use rast::CmpOp as O;
    Some(match op {
        O::Eq => CmpOp::Eq,
        O::NotEq => CmpOp::NotEq,
        O::Lt => CmpOp::Lt,
        O::LtE => CmpOp::LtE,
        O::Gt => CmpOp::Gt,
        O::GtE => CmpOp::GtE,
        _ => return None,
    })
}

fn stmt_kind_name(stmt: &RStmt) -> &'static str {
    match stmt {
        RStmt::FunctionDef(_) => "function-def",
        RStmt::ClassDef(_) => "class-def",
        RStmt::Return(_) => "return",
        RStmt::Delete(_) => "del",
        RStmt::Assign(_) => "assign",
        RStmt::AugAssign(_) => "augmented-assign",
        RStmt::AnnAssign(_) => "annotated-assign",
        RStmt::TypeAlias(_) => "type-alias",
        RStmt::For(_) => "for",
        RStmt::While(_) => "while",
        RStmt::If(_) => "if",
        RStmt::With(_) => "with",
        RStmt::Match(_) => "match",
        RStmt::Raise(_) => "raise",
        RStmt::Try(_) => "try",
        RStmt::Assert(_) => "assert",
        RStmt::Import(_) => "import",
        RStmt::ImportFrom(_) => "import-from",
        RStmt::Global(_) => "global",
        RStmt::Nonlocal(_) => "nonlocal",
        RStmt::Expr(_) => "expr-stmt",
        RStmt::Pass(_) => "pass",
        RStmt::Break(_) => "break",
        RStmt::Continue(_) => "continue",
        RStmt::IpyEscapeCommand(_) => "ipy-escape-command",
    }
}

fn expr_kind_name(expr: &RExpr) -> &'static str {
    match expr {
        RExpr::BoolOp(_) => "bool-op",
        RExpr::Named(_) => "named-expr",
        RExpr::BinOp(_) => "bin-op",
        RExpr::UnaryOp(_) => "unary-op",
        RExpr::Lambda(_) => "lambda",
        RExpr::If(_) => "conditional-expr",
        RExpr::Dict(_) => "dict",
        RExpr::Set(_) => "set",
        RExpr::ListComp(_) => "list-comprehension",
        RExpr::SetComp(_) => "set-comprehension",
        RExpr::DictComp(_) => "dict-comprehension",
        RExpr::Generator(_) => "generator-expression",
        RExpr::Await(_) => "await",
        RExpr::Yield(_) => "yield",
        RExpr::YieldFrom(_) => "yield-from",
        RExpr::Compare(_) => "compare",
        RExpr::Call(_) => "call",
        RExpr::FString(_) => "f-string",
        RExpr::StringLiteral(_) => "string-literal",
        RExpr::BytesLiteral(_) => "bytes-literal",
        RExpr::NumberLiteral(_) => "number-literal",
        RExpr::BooleanLiteral(_) => "boolean-literal",
        RExpr::NoneLiteral(_) => "none-literal",
        RExpr::EllipsisLiteral(_) => "ellipsis-literal",
        RExpr::Attribute(_) => "attribute",
        RExpr::Subscript(_) => "subscript",
        RExpr::Starred(_) => "starred",
        RExpr::Name(_) => "name",
        RExpr::List(_) => "list",
        RExpr::Tuple(_) => "tuple",
        RExpr::Slice(_) => "slice",
        RExpr::IpyEscapeCommand(_) => "ipy-escape-command",
    }
}
