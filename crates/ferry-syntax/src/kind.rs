//! Node kinds, child roles, flags and per-node payloads of the arena tree.

use bitflags::bitflags;

/// Every shape the lowering pass can produce. Closed on purpose: the
/// transformer matches on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SyntaxKind {
    Module,

    // Statements
    Block,
    Empty,
    ExprStmt,
    VarStmt,
    Declarator,
    FnDecl,
    ClassDecl,
    InterfaceDecl,
    InterfaceBody,
    TypeAliasDecl,
    EnumDecl,
    EnumBody,
    EnumMember,
    NamespaceDecl,
    If,
    While,
    DoWhile,
    For,
    ForIn,
    ForOf,
    Return,
    Break,
    Continue,
    Throw,
    Try,
    Catch,
    Switch,
    SwitchCase,
    Labeled,
    Debugger,
    With,

    // Module items
    Import,
    ImportNamed,
    ImportDefault,
    ImportNamespace,
    ExportDecl,
    ExportDefaultDecl,
    ExportDefaultExpr,
    ExportNamed,
    ExportSpecifier,
    ExportAll,
    ImportEquals,
    ExportAssignment,

    // Classes and functions
    ClassBody,
    ClassProp,
    PrivateProp,
    Constructor,
    Method,
    PrivateMethod,
    StaticBlock,
    IndexSignature,
    Param,
    ParamProp,
    Decorator,
    Heritage,

    // Binding patterns
    BindingIdent,
    ObjectPat,
    PatKeyValue,
    PatShorthand,
    RestPat,
    ArrayPat,
    AssignPat,
    Hole,

    // Expressions
    Ident,
    This,
    Super,
    Null,
    Bool,
    Number,
    String,
    BigInt,
    Regex,
    Template,
    TemplateElement,
    TaggedTemplate,
    ArrayLit,
    ObjectLit,
    KeyValueProp,
    ShorthandProp,
    MethodProp,
    GetterProp,
    SetterProp,
    Spread,
    FnExpr,
    Arrow,
    ClassExpr,
    Unary,
    Update,
    Binary,
    Assign,
    Member,
    SuperMember,
    OptChain,
    Call,
    New,
    Cond,
    Seq,
    Paren,
    Await,
    Yield,
    MetaProp,
    AsExpr,
    ConstAssertion,
    NonNull,
    TypeAssertion,
    Satisfies,
    Instantiation,
    PrivateName,
    PropIdent,
    ComputedKey,

    // Types
    TypeAnn,
    KeywordType,
    TypeRef,
    QualifiedName,
    TypeArgs,
    TypeParams,
    TypeParam,
    ArrayType,
    TupleType,
    TupleElement,
    UnionType,
    IntersectionType,
    FnType,
    ConstructorType,
    TypeLiteral,
    PropertySignature,
    MethodSignature,
    CallSignature,
    ConstructSignature,
    GetterSignature,
    SetterSignature,
    LiteralType,
    TypeQuery,
    ConditionalType,
    TypeOperator,
    MappedType,
    IndexedAccessType,
    ParenType,
    OptionalType,
    RestType,
    InferType,
    ThisType,
    TypePredicate,
    ImportType,
    TemplateLiteralType,

    // Tokens
    Separator,
    /// A construct kept only as its source text.
    Opaque,
}

impl SyntaxKind {
    /// Every kind, in declaration order.
    pub const ALL: &'static [SyntaxKind] = &[
        SyntaxKind::Module,
        SyntaxKind::Block,
        SyntaxKind::Empty,
        SyntaxKind::ExprStmt,
        SyntaxKind::VarStmt,
        SyntaxKind::Declarator,
        SyntaxKind::FnDecl,
        SyntaxKind::ClassDecl,
        SyntaxKind::InterfaceDecl,
        SyntaxKind::InterfaceBody,
        SyntaxKind::TypeAliasDecl,
        SyntaxKind::EnumDecl,
        SyntaxKind::EnumBody,
        SyntaxKind::EnumMember,
        SyntaxKind::NamespaceDecl,
        SyntaxKind::If,
        SyntaxKind::While,
        SyntaxKind::DoWhile,
        SyntaxKind::For,
        SyntaxKind::ForIn,
        SyntaxKind::ForOf,
        SyntaxKind::Return,
        SyntaxKind::Break,
        SyntaxKind::Continue,
        SyntaxKind::Throw,
        SyntaxKind::Try,
        SyntaxKind::Catch,
        SyntaxKind::Switch,
        SyntaxKind::SwitchCase,
        SyntaxKind::Labeled,
        SyntaxKind::Debugger,
        SyntaxKind::With,
        SyntaxKind::Import,
        SyntaxKind::ImportNamed,
        SyntaxKind::ImportDefault,
        SyntaxKind::ImportNamespace,
        SyntaxKind::ExportDecl,
        SyntaxKind::ExportDefaultDecl,
        SyntaxKind::ExportDefaultExpr,
        SyntaxKind::ExportNamed,
        SyntaxKind::ExportSpecifier,
        SyntaxKind::ExportAll,
        SyntaxKind::ImportEquals,
        SyntaxKind::ExportAssignment,
        SyntaxKind::ClassBody,
        SyntaxKind::ClassProp,
        SyntaxKind::PrivateProp,
        SyntaxKind::Constructor,
        SyntaxKind::Method,
        SyntaxKind::PrivateMethod,
        SyntaxKind::StaticBlock,
        SyntaxKind::IndexSignature,
        SyntaxKind::Param,
        SyntaxKind::ParamProp,
        SyntaxKind::Decorator,
        SyntaxKind::Heritage,
        SyntaxKind::BindingIdent,
        SyntaxKind::ObjectPat,
        SyntaxKind::PatKeyValue,
        SyntaxKind::PatShorthand,
        SyntaxKind::RestPat,
        SyntaxKind::ArrayPat,
        SyntaxKind::AssignPat,
        SyntaxKind::Hole,
        SyntaxKind::Ident,
        SyntaxKind::This,
        SyntaxKind::Super,
        SyntaxKind::Null,
        SyntaxKind::Bool,
        SyntaxKind::Number,
        SyntaxKind::String,
        SyntaxKind::BigInt,
        SyntaxKind::Regex,
        SyntaxKind::Template,
        SyntaxKind::TemplateElement,
        SyntaxKind::TaggedTemplate,
        SyntaxKind::ArrayLit,
        SyntaxKind::ObjectLit,
        SyntaxKind::KeyValueProp,
        SyntaxKind::ShorthandProp,
        SyntaxKind::MethodProp,
        SyntaxKind::GetterProp,
        SyntaxKind::SetterProp,
        SyntaxKind::Spread,
        SyntaxKind::FnExpr,
        SyntaxKind::Arrow,
        SyntaxKind::ClassExpr,
        SyntaxKind::Unary,
        SyntaxKind::Update,
        SyntaxKind::Binary,
        SyntaxKind::Assign,
        SyntaxKind::Member,
        SyntaxKind::SuperMember,
        SyntaxKind::OptChain,
        SyntaxKind::Call,
        SyntaxKind::New,
        SyntaxKind::Cond,
        SyntaxKind::Seq,
        SyntaxKind::Paren,
        SyntaxKind::Await,
        SyntaxKind::Yield,
        SyntaxKind::MetaProp,
        SyntaxKind::AsExpr,
        SyntaxKind::ConstAssertion,
        SyntaxKind::NonNull,
        SyntaxKind::TypeAssertion,
        SyntaxKind::Satisfies,
        SyntaxKind::Instantiation,
        SyntaxKind::PrivateName,
        SyntaxKind::PropIdent,
        SyntaxKind::ComputedKey,
        SyntaxKind::TypeAnn,
        SyntaxKind::KeywordType,
        SyntaxKind::TypeRef,
        SyntaxKind::QualifiedName,
        SyntaxKind::TypeArgs,
        SyntaxKind::TypeParams,
        SyntaxKind::TypeParam,
        SyntaxKind::ArrayType,
        SyntaxKind::TupleType,
        SyntaxKind::TupleElement,
        SyntaxKind::UnionType,
        SyntaxKind::IntersectionType,
        SyntaxKind::FnType,
        SyntaxKind::ConstructorType,
        SyntaxKind::TypeLiteral,
        SyntaxKind::PropertySignature,
        SyntaxKind::MethodSignature,
        SyntaxKind::CallSignature,
        SyntaxKind::ConstructSignature,
        SyntaxKind::GetterSignature,
        SyntaxKind::SetterSignature,
        SyntaxKind::LiteralType,
        SyntaxKind::TypeQuery,
        SyntaxKind::ConditionalType,
        SyntaxKind::TypeOperator,
        SyntaxKind::MappedType,
        SyntaxKind::IndexedAccessType,
        SyntaxKind::ParenType,
        SyntaxKind::OptionalType,
        SyntaxKind::RestType,
        SyntaxKind::InferType,
        SyntaxKind::ThisType,
        SyntaxKind::TypePredicate,
        SyntaxKind::ImportType,
        SyntaxKind::TemplateLiteralType,
        SyntaxKind::Separator,
        SyntaxKind::Opaque,
    ];

    pub fn is_function_like(self) -> bool {
        matches!(
            self,
            SyntaxKind::FnDecl
                | SyntaxKind::FnExpr
                | SyntaxKind::Arrow
                | SyntaxKind::Method
                | SyntaxKind::PrivateMethod
                | SyntaxKind::Constructor
                | SyntaxKind::MethodProp
                | SyntaxKind::GetterProp
                | SyntaxKind::SetterProp
        )
    }

    pub fn is_loop(self) -> bool {
        matches!(
            self,
            SyntaxKind::For
                | SyntaxKind::ForIn
                | SyntaxKind::ForOf
                | SyntaxKind::While
                | SyntaxKind::DoWhile
        )
    }

    pub fn is_type(self) -> bool {
        matches!(
            self,
            SyntaxKind::KeywordType
                | SyntaxKind::TypeRef
                | SyntaxKind::ArrayType
                | SyntaxKind::TupleType
                | SyntaxKind::UnionType
                | SyntaxKind::IntersectionType
                | SyntaxKind::FnType
                | SyntaxKind::ConstructorType
                | SyntaxKind::TypeLiteral
                | SyntaxKind::LiteralType
                | SyntaxKind::TypeQuery
                | SyntaxKind::ConditionalType
                | SyntaxKind::TypeOperator
                | SyntaxKind::MappedType
                | SyntaxKind::IndexedAccessType
                | SyntaxKind::ParenType
                | SyntaxKind::OptionalType
                | SyntaxKind::RestType
                | SyntaxKind::InferType
                | SyntaxKind::ThisType
                | SyntaxKind::TypePredicate
                | SyntaxKind::ImportType
                | SyntaxKind::TemplateLiteralType
        )
    }
}

/// Position of a child inside its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Root,
    Item,
    Name,
    TypeParams,
    TypeArgs,
    Param,
    ReturnType,
    Body,
    Test,
    Consequent,
    Alternate,
    Init,
    Update,
    Left,
    Right,
    Operand,
    Callee,
    Argument,
    Object,
    Property,
    Key,
    Value,
    Element,
    Member,
    Extends,
    Implements,
    SuperClass,
    Default,
    Constraint,
    TypeAnn,
    Label,
    Handler,
    Finalizer,
    Discriminant,
    Case,
    Quasi,
    Expression,
    Decorator,
    Separator,
    Specifier,
    Declarator,
    Declaration,
    CheckType,
    ExtendsType,
    TrueType,
    FalseType,
    IndexType,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NodeFlags: u32 {
        const ASYNC = 1 << 0;
        const GENERATOR = 1 << 1;
        const STATIC = 1 << 2;
        const READONLY = 1 << 3;
        const OPTIONAL = 1 << 4;
        const PRIVATE = 1 << 5;
        const PROTECTED = 1 << 6;
        const PUBLIC = 1 << 7;
        const ABSTRACT = 1 << 8;
        const DECLARE = 1 << 9;
        const OVERRIDE = 1 << 10;
        const COMPUTED = 1 << 11;
        const DEFINITE = 1 << 12;
        const TYPE_ONLY = 1 << 13;
        const SPREAD = 1 << 14;
        const CONST = 1 << 15;
        const AWAIT = 1 << 16;
        const DELEGATE = 1 << 17;
        /// A function or method signature without a body.
        const BODYLESS = 1 << 18;
        const EXPORTED = 1 << 19;
        const DEFAULT_EXPORT = 1 << 20;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    LogicalAnd,
    LogicalOr,
    NullishCoalescing,
    In,
    InstanceOf,
    BitAnd,
    BitOr,
    BitXor,
    LShift,
    RShift,
    ZeroFillRShift,
}

impl BinaryOp {
    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::LogicalAnd | BinaryOp::LogicalOr)
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::EqEq
                | BinaryOp::NotEq
                | BinaryOp::EqEqEq
                | BinaryOp::NotEqEq
                | BinaryOp::Lt
                | BinaryOp::LtEq
                | BinaryOp::Gt
                | BinaryOp::GtEq
                | BinaryOp::In
                | BinaryOp::InstanceOf
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Exp => "**",
            BinaryOp::EqEq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::EqEqEq => "===",
            BinaryOp::NotEqEq => "!==",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::LogicalOr => "||",
            BinaryOp::NullishCoalescing => "??",
            BinaryOp::In => "in",
            BinaryOp::InstanceOf => "instanceof",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::LShift => "<<",
            BinaryOp::RShift => ">>",
            BinaryOp::ZeroFillRShift => ">>>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Minus,
    Plus,
    Not,
    BitNot,
    TypeOf,
    Void,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    LShift,
    RShift,
    ZeroFillRShift,
    BitOr,
    BitXor,
    BitAnd,
    And,
    Or,
    Nullish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordType {
    Any,
    Unknown,
    Number,
    Object,
    Boolean,
    BigInt,
    String,
    Symbol,
    Void,
    Undefined,
    Null,
    Never,
    Intrinsic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Method,
    Getter,
    Setter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeOperatorKind {
    KeyOf,
    Unique,
    ReadOnly,
}

/// Payload carried by a node in addition to its kind and children.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NodeData {
    #[default]
    None,
    /// Identifier text of names, property keys and binding identifiers.
    Name(String),
    /// Cooked value of a string literal.
    Str(String),
    Num(f64),
    Bool(bool),
    Regex { pattern: String, flags: String },
    Binary(BinaryOp),
    Unary(UnaryOp),
    Assign(AssignOp),
    Update { op: UpdateOp, prefix: bool },
    Var(VarKind),
    Keyword(KeywordType),
    Method(MethodKind),
    TypeOperator(TypeOperatorKind),
    /// Import/export specifier: the local binding and, when it differs, the exported name.
    Specifier { local: String, remote: Option<String> },
    /// Module specifier of imports and re-exports.
    Source(String),
}

impl NodeData {
    pub fn name(&self) -> Option<&str> {
        match self {
            NodeData::Name(name) => Some(name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_op_categories() {
        assert!(BinaryOp::LogicalAnd.is_logical());
        assert!(!BinaryOp::NullishCoalescing.is_logical());
        assert!(BinaryOp::InstanceOf.is_comparison());
        assert_eq!(BinaryOp::ZeroFillRShift.as_str(), ">>>");
    }

    #[test]
    fn test_kind_groups() {
        assert!(SyntaxKind::Arrow.is_function_like());
        assert!(!SyntaxKind::ClassDecl.is_function_like());
        assert!(SyntaxKind::UnionType.is_type());
        assert!(!SyntaxKind::TypeAnn.is_type());
        assert!(SyntaxKind::DoWhile.is_loop());
    }

    #[test]
    fn test_all_kinds_listed_once() {
        let mut kinds = SyntaxKind::ALL.to_vec();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), SyntaxKind::ALL.len());
        assert!(kinds.contains(&SyntaxKind::Opaque));
    }
}
