use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ExpressionType {
    Scalar,
    Pixel,
    Percentage,
    Color,
    Bool,
    Undefined,
}

impl ExpressionType {
    pub fn describe(self) -> &'static str {
        match self {
            ExpressionType::Scalar => "Scalar",
            ExpressionType::Pixel => "Pixel",
            ExpressionType::Percentage => "Percentage",
            ExpressionType::Color => "Color",
            ExpressionType::Bool => "Bool",
            ExpressionType::Undefined => "Undefined",
        }
    }

    pub fn is_scalar(self) -> bool {
        matches!(self, ExpressionType::Scalar)
    }

    /// Result type of an arithmetic operation over `lhs` and `rhs`.
    ///
    /// A non-scalar operand lends its unit to the result; when both operands are non-scalar
    /// the left one wins. Mismatches are reported by the checker's operation rules, not here.
    pub fn combine(lhs: ExpressionType, rhs: ExpressionType) -> ExpressionType {
        if !lhs.is_scalar() {
            lhs
        } else if !rhs.is_scalar() {
            rhs
        } else {
            ExpressionType::Scalar
        }
    }
}
