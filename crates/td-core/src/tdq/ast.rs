//! Typed AST produced by the parser.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Match,
    NotMatch,
}

impl CompareOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::Le => "<=",
            CompareOp::Ge => ">=",
            CompareOp::Match => "~",
            CompareOp::NotMatch => "!~",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialKind {
    Me,
    Empty,
    Null,
}

/// A literal value on the right-hand side of a field expression or as a
/// function argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    StringValue(String),
    NumberValue(i64),
    /// `raw` is the literal text as written; `relative` distinguishes an
    /// offset/keyword form (`-7d`, `today`) from an absolute `YYYY-MM-DD`.
    DateValue { raw: String, relative: bool },
    SpecialValue(SpecialKind),
    Identifier(String),
}

impl Value {
    /// The value rendered back as TDQ source text (used by `unparse`).
    pub fn unparse(&self) -> String {
        match self {
            Value::StringValue(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
            Value::NumberValue(n) => n.to_string(),
            Value::DateValue { raw, .. } => raw.clone(),
            Value::SpecialValue(SpecialKind::Me) => "@me".to_string(),
            Value::SpecialValue(SpecialKind::Empty) => "EMPTY".to_string(),
            Value::SpecialValue(SpecialKind::Null) => "NULL".to_string(),
            Value::Identifier(id) => id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    FieldExpr {
        field: String,
        op: CompareOp,
        value: Value,
    },
    BinaryExpr {
        op: BoolOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    UnaryExpr {
        expr: Box<Expr>,
    },
    FunctionCall {
        name: String,
        args: Vec<Value>,
    },
    TextSearch(String),
}

impl Expr {
    /// Render the AST back to TDQ source text. Used by the parser round-trip
    /// property test: `parse(unparse(ast)) == ast`.
    pub fn unparse(&self) -> String {
        match self {
            Expr::FieldExpr { field, op, value } => {
                format!("{field} {} {}", op.as_str(), value.unparse())
            }
            Expr::BinaryExpr { op, left, right } => {
                let op_str = match op {
                    BoolOp::And => "AND",
                    BoolOp::Or => "OR",
                };
                format!("({} {op_str} {})", left.unparse(), right.unparse())
            }
            Expr::UnaryExpr { expr } => format!("NOT ({})", expr.unparse()),
            Expr::FunctionCall { name, args } => {
                let rendered: Vec<String> = args.iter().map(Value::unparse).collect();
                format!("{name}({})", rendered.join(", "))
            }
            Expr::TextSearch(text) => format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\"")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortClause {
    pub field: String,
    pub direction: SortDirection,
}

/// The fields a `sort:` clause may reference.
pub const SORT_FIELD_WHITELIST: &[&str] = &[
    "created", "updated", "priority", "points", "closed", "deleted", "id", "title", "status",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub expr: Option<Expr>,
    pub sort: Option<SortClause>,
}

/// True iff the AST contains any `note.<field>` dotted field, which routes
/// the whole query to the note executor.
pub fn routes_to_notes(expr: &Expr) -> bool {
    match expr {
        Expr::FieldExpr { field, .. } => field.starts_with("note."),
        Expr::BinaryExpr { left, right, .. } => routes_to_notes(left) || routes_to_notes(right),
        Expr::UnaryExpr { expr } => routes_to_notes(expr),
        Expr::FunctionCall { .. } | Expr::TextSearch(_) => false,
    }
}
