pub use recette_core::Span;

/// An AST node with source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    /// The wrapped AST node.
    pub node: T,
    /// Where the node was written.
    pub span: Span,
}

impl<T> Spanned<T> {
    /// Wrap `node`.
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// A parsed assembler source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    /// Statements in source order. Labels sharing a line with an
    /// instruction come first, each as its own statement.
    pub statements: Vec<Spanned<Statement>>,
}

impl Program {
    /// Names of every label defined in the program.
    pub fn labels(&self) -> impl Iterator<Item = &Spanned<String>> {
        self.statements.iter().filter_map(|s| match &s.node {
            Statement::Label(label) => Some(&label.name),
            _ => None,
        })
    }
}

/// One statement of the assembler grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `NAME:`
    Label(Label),
    /// `NAME = expression`
    Assignment(Assignment),
    /// A reserved directive such as `.ASCII /text/`.
    Directive(Directive),
    /// A mnemonic with operands, or a bare operand list.
    Instruction(Instruction),
}

/// A label definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    /// The label name, without the colon.
    pub name: Spanned<String>,
}

/// A symbol assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// The assigned symbol.
    pub name: Spanned<String>,
    /// Its value.
    pub value: Spanned<Expression>,
}

/// The reserved assembler directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    /// `.PAGE`
    Page,
    /// `.ASCII`
    Ascii,
    /// `.ASCIZ`
    Asciz,
    /// `.BYTE`
    Byte,
    /// `.WORD`
    Word,
    /// `.EVEN`
    Even,
    /// `.END`
    End,
}

impl DirectiveKind {
    /// Look up a directive by its exact spelling.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            ".PAGE" => Some(Self::Page),
            ".ASCII" => Some(Self::Ascii),
            ".ASCIZ" => Some(Self::Asciz),
            ".BYTE" => Some(Self::Byte),
            ".WORD" => Some(Self::Word),
            ".EVEN" => Some(Self::Even),
            ".END" => Some(Self::End),
            _ => None,
        }
    }

    /// The spelling of the directive.
    pub fn name(self) -> &'static str {
        match self {
            Self::Page => ".PAGE",
            Self::Ascii => ".ASCII",
            Self::Asciz => ".ASCIZ",
            Self::Byte => ".BYTE",
            Self::Word => ".WORD",
            Self::Even => ".EVEN",
            Self::End => ".END",
        }
    }
}

/// A directive with its operands.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    /// Which directive.
    pub kind: DirectiveKind,
    /// Span of the directive name.
    pub keyword: Span,
    /// Operands, possibly none.
    pub operands: Vec<Spanned<Operand>>,
}

/// An instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// The mnemonic; `None` for an operand-only statement.
    pub mnemonic: Option<Spanned<String>>,
    /// Operands, possibly none.
    pub operands: Vec<Spanned<Operand>>,
}

/// Addressing modes.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// `expr`
    Absolute(Spanned<Expression>),
    /// `#expr`
    Immediate(Spanned<Expression>),
    /// `(reg)+`
    PostIncrement(Spanned<String>),
    /// `-(reg)`
    PreDecrement(Spanned<String>),
    /// `(reg)` or `expr(reg)`
    Indirect {
        /// The register.
        register: Spanned<String>,
        /// Displacement added to the register, if any.
        displacement: Option<Spanned<Expression>>,
    },
    /// `@operand`
    DoubleIndirect(Box<Spanned<Operand>>),
}

/// Binary operators, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-`
    Negate,
}

/// Arithmetic expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A symbol reference.
    Var(String),
    /// An integer, or a character literal as its code point.
    Integer(i64),
    /// A string literal.
    String(String),
    /// `left op right`
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Spanned<Expression>>,
        /// Right operand.
        right: Box<Spanned<Expression>>,
    },
    /// `op operand`
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Spanned<Expression>>,
    },
}

impl Expression {
    /// Fold the expression to a constant when it contains no symbol or
    /// string. Arithmetic wraps like a machine word would.
    pub fn constant(&self) -> Option<i64> {
        match self {
            Expression::Integer(n) => Some(*n),
            Expression::Var(_) | Expression::String(_) => None,
            Expression::Unary { op, operand } => match op {
                UnaryOp::Negate => operand.node.constant().map(i64::wrapping_neg),
            },
            Expression::Binary { op, left, right } => {
                let l = left.node.constant()?;
                let r = right.node.constant()?;
                Some(match op {
                    BinaryOp::Add => l.wrapping_add(r),
                    BinaryOp::Sub => l.wrapping_sub(r),
                    BinaryOp::Mul => l.wrapping_mul(r),
                })
            }
        }
    }
}
