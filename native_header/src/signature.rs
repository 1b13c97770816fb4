//! # Native Method Signatures
//!
//! Type codes and method descriptors shared by the host and native libraries.
//!
//! A descriptor lists the parameter kinds of a native method between
//! parentheses followed by its return kind, e.g. `(IFLjava/lang/String;)V`
//! for a method taking an `int`, a `float` and a `String` and returning nothing.
//!
//! ```
//! use native_header::signature::{MethodDescriptor, Signature};
//!
//! let descriptor = MethodDescriptor::parse("(IFLjava/lang/String;)V").unwrap();
//! assert_eq!(descriptor.params, vec![Signature::Int, Signature::Float, Signature::string()]);
//! assert_eq!(descriptor.ret, Signature::Void);
//! assert_eq!(descriptor.to_string(), "(IFLjava/lang/String;)V");
//! ```
use std::fmt::{self, Display};

use thiserror::Error;

/// Class name used for text parameters.
pub const STRING_CLASS: &str = "java/lang/String";

/// A single parameter or return kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Signature {
    Void,
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    /// Reference type, stored with `/` separators (`java/lang/String`).
    Object(String),
    Array(Box<Signature>),
}

impl Signature {
    /// The text kind, `Ljava/lang/String;`.
    pub fn string() -> Self {
        Signature::Object(STRING_CLASS.to_string())
    }

    /// Builds an object kind from a dotted or slashed class name.
    pub fn object(class: &str) -> Self {
        Signature::Object(normalize_class_name(class))
    }

    pub fn array(inner: Signature) -> Self {
        Signature::Array(Box::new(inner))
    }

    pub fn is_primitive(&self) -> bool {
        !matches!(self, Signature::Object(_) | Signature::Array(_))
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signature::Void => f.write_str("V"),
            Signature::Boolean => f.write_str("Z"),
            Signature::Byte => f.write_str("B"),
            Signature::Char => f.write_str("C"),
            Signature::Short => f.write_str("S"),
            Signature::Int => f.write_str("I"),
            Signature::Long => f.write_str("J"),
            Signature::Float => f.write_str("F"),
            Signature::Double => f.write_str("D"),
            Signature::Object(name) => write!(f, "L{};", name),
            Signature::Array(inner) => write!(f, "[{}", inner),
        }
    }
}

/// Parameter kinds and return kind of a native method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    pub params: Vec<Signature>,
    pub ret: Signature,
}

/// Reasons a descriptor string can be rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("descriptor must start with '(': {0:?}")]
    MissingOpenParen(String),
    #[error("descriptor has no closing ')': {0:?}")]
    MissingCloseParen(String),
    #[error("unterminated class name at offset {offset}")]
    UnterminatedObject { offset: usize },
    #[error("unknown type code {code:?} at offset {offset}")]
    UnknownType { code: char, offset: usize },
    #[error("array at offset {offset} has no element type")]
    MissingArrayElement { offset: usize },
    #[error("'V' is only valid as a return type (offset {offset})")]
    VoidNotAllowed { offset: usize },
    #[error("missing return type")]
    MissingReturn,
    #[error("unexpected trailing characters {0:?}")]
    Trailing(String),
}

impl MethodDescriptor {
    pub fn new(params: Vec<Signature>, ret: Signature) -> Self {
        Self { params, ret }
    }

    /// Parses a descriptor of the form `(<params>)<ret>`.
    pub fn parse(text: &str) -> Result<Self, DescriptorError> {
        let Some(rest) = text.strip_prefix('(') else {
            return Err(DescriptorError::MissingOpenParen(text.to_string()));
        };
        let Some(close) = rest.find(')') else {
            return Err(DescriptorError::MissingCloseParen(text.to_string()));
        };

        let mut cursor = Cursor { text, pos: 1 };
        let mut params = Vec::new();
        while cursor.pos < close + 1 {
            let offset = cursor.pos;
            let signature = cursor.read_type(close + 1)?;
            if signature == Signature::Void {
                return Err(DescriptorError::VoidNotAllowed { offset });
            }
            params.push(signature);
        }

        cursor.pos = close + 2;
        if cursor.pos >= text.len() {
            return Err(DescriptorError::MissingReturn);
        }
        let ret = cursor.read_type(text.len())?;
        if cursor.pos != text.len() {
            return Err(DescriptorError::Trailing(text[cursor.pos..].to_string()));
        }

        Ok(Self { params, ret })
    }

    /// The parameter part without parentheses, used for overloaded symbol names.
    pub fn params_descriptor(&self) -> String {
        self.params.iter().map(ToString::to_string).collect()
    }
}

impl Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}){}", self.params_descriptor(), self.ret)
    }
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl Cursor<'_> {
    // Reads one type starting at `pos`, never past `end`.
    fn read_type(&mut self, end: usize) -> Result<Signature, DescriptorError> {
        let offset = self.pos;
        let Some(code) = self.text[offset..end].chars().next() else {
            return Err(DescriptorError::MissingReturn);
        };
        self.pos += code.len_utf8();

        let signature = match code {
            'V' => Signature::Void,
            'Z' => Signature::Boolean,
            'B' => Signature::Byte,
            'C' => Signature::Char,
            'S' => Signature::Short,
            'I' => Signature::Int,
            'J' => Signature::Long,
            'F' => Signature::Float,
            'D' => Signature::Double,
            'L' => {
                let Some(len) = self.text[self.pos..end].find(';') else {
                    return Err(DescriptorError::UnterminatedObject { offset });
                };
                let name = &self.text[self.pos..self.pos + len];
                if name.is_empty() {
                    return Err(DescriptorError::UnterminatedObject { offset });
                }
                self.pos += len + 1;
                Signature::object(name)
            }
            '[' => {
                if self.pos >= end {
                    return Err(DescriptorError::MissingArrayElement { offset });
                }
                let inner_offset = self.pos;
                let inner = self.read_type(end)?;
                if inner == Signature::Void {
                    return Err(DescriptorError::VoidNotAllowed { offset: inner_offset });
                }
                Signature::array(inner)
            }
            other => return Err(DescriptorError::UnknownType { code: other, offset }),
        };

        Ok(signature)
    }
}

/// Converts `com.example.Foo` into `com/example/Foo`.
pub fn normalize_class_name(class: &str) -> String {
    class.replace('.', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_example_descriptor() {
        let descriptor = MethodDescriptor::parse("(IFLjava/lang/String;)V").unwrap();

        assert_eq!(
            descriptor,
            MethodDescriptor::new(
                vec![Signature::Int, Signature::Float, Signature::string()],
                Signature::Void
            )
        );
    }

    #[test]
    fn parses_arrays_and_objects() {
        let descriptor = MethodDescriptor::parse("([[ZLjava/util/List;[Ljava/lang/String;)[J").unwrap();

        assert_eq!(descriptor.params.len(), 3);
        assert_eq!(descriptor.params[0], Signature::array(Signature::array(Signature::Boolean)));
        assert_eq!(descriptor.params[1], Signature::object("java.util.List"));
        assert_eq!(descriptor.params[2], Signature::array(Signature::string()));
        assert_eq!(descriptor.ret, Signature::array(Signature::Long));
        assert_eq!(descriptor.to_string(), "([[ZLjava/util/List;[Ljava/lang/String;)[J");
    }

    #[test]
    fn empty_parameter_list() {
        let descriptor = MethodDescriptor::parse("()D").unwrap();

        assert!(descriptor.params.is_empty());
        assert_eq!(descriptor.ret, Signature::Double);
        assert_eq!(descriptor.params_descriptor(), "");
    }

    #[test]
    fn rejects_malformed_descriptors() {
        assert!(matches!(
            MethodDescriptor::parse("IF)V"),
            Err(DescriptorError::MissingOpenParen(_))
        ));
        assert!(matches!(
            MethodDescriptor::parse("(IF"),
            Err(DescriptorError::MissingCloseParen(_))
        ));
        assert!(matches!(
            MethodDescriptor::parse("(Ljava/lang/String)V"),
            Err(DescriptorError::UnterminatedObject { offset: 1 })
        ));
        assert!(matches!(
            MethodDescriptor::parse("(IQ)V"),
            Err(DescriptorError::UnknownType { code: 'Q', offset: 2 })
        ));
        assert!(matches!(
            MethodDescriptor::parse("(V)V"),
            Err(DescriptorError::VoidNotAllowed { offset: 1 })
        ));
        assert!(matches!(
            MethodDescriptor::parse("([V)I"),
            Err(DescriptorError::VoidNotAllowed { offset: 2 })
        ));
        assert_eq!(MethodDescriptor::parse("(I)"), Err(DescriptorError::MissingReturn));
        assert_eq!(
            MethodDescriptor::parse("([)V"),
            Err(DescriptorError::MissingArrayElement { offset: 1 })
        );
        assert_eq!(
            MethodDescriptor::parse("(I)[["),
            Err(DescriptorError::MissingArrayElement { offset: 4 })
        );
        assert_eq!(
            MethodDescriptor::parse("(I)VV"),
            Err(DescriptorError::Trailing("V".to_string()))
        );
    }

    #[test]
    fn dotted_class_names_are_normalized() {
        assert_eq!(
            Signature::object("com.github.kr328.typedjni.Example").to_string(),
            "Lcom/github/kr328/typedjni/Example;"
        );
        assert!(Signature::Float.is_primitive());
        assert!(!Signature::string().is_primitive());
    }
}
