use std::fmt;

/// A PB type tag. Equality is structural (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Type {
    Int,
    Float,
    Bool,
    Str,
    NoneType,
    List(Box<Type>),
    /// Dict key type is always `Str`; kept explicit to mirror the data model
    /// in spec §3 rather than hard-coding the key away.
    Dict(Box<Type>, Box<Type>),
    Class(String),
    Func(Vec<Type>, Box<Type>),
}

impl Type {
    pub fn dict_of(value: Type) -> Type {
        Type::Dict(Box::new(Type::Str), Box::new(value))
    }

    pub fn list_of(elem: Type) -> Type {
        Type::List(Box::new(elem))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    /// `bool` is deliberately excluded from "numeric" (spec §9 Open
    /// Questions: the stricter reading is taken).
    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Int | Type::Float | Type::Bool | Type::Str)
    }

    /// True if a value of type `self` may be used where `target` is expected,
    /// via `bool -> int -> float` widening or subclass -> superclass
    /// conversion (spec §4.3). `ancestors` must return the base-chain (most
    /// immediate base first) for a class name.
    pub fn assignable_to(&self, target: &Type, ancestors: impl Fn(&str) -> Vec<String>) -> bool {
        if self == target {
            return true;
        }
        match (self, target) {
            (Type::Bool, Type::Int) | (Type::Bool, Type::Float) | (Type::Int, Type::Float) => true,
            (Type::Class(from), Type::Class(to)) => ancestors(from).iter().any(|a| a == to),
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::Bool => write!(f, "bool"),
            Type::Str => write!(f, "str"),
            Type::NoneType => write!(f, "None"),
            Type::List(elem) => write!(f, "list[{elem}]"),
            Type::Dict(key, value) => write!(f, "dict[{key}, {value}]"),
            Type::Class(name) => write!(f, "{name}"),
            Type::Func(params, ret) => {
                write!(f, "(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ") -> {ret}")
            }
        }
    }
}
