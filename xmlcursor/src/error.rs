/*!
# Error types

This module holds the error types returned by the various functions of this
crate.
*/
use std::error;
use std::fmt;
use std::io;
use std::ops::Deref;
use std::result::Result as StdResult;
use std::sync::Arc;

use crate::node::NodeType;

/// The cursor is not positioned the way a start/end element or string read
/// requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
	/// Content node of the given kind found where another kind was required.
	UnexpectedNodeType(NodeType),

	/// The element name did not match the requested name.
	NameMismatch,

	/// The input ended inside an element whose content was being read.
	UnexpectedEnd,
}

impl error::Error for StateError {}

impl fmt::Display for StateError {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::UnexpectedNodeType(kind) => write!(f, "{} is an invalid node type", kind),
			Self::NameMismatch => f.write_str("element name does not match"),
			Self::UnexpectedEnd => f.write_str("unexpected end of input in element content"),
		}
	}
}

/// Validation failure of the element-string operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatError {
	/// The next content node is of the given kind, not an element.
	UnexpectedNodeType(NodeType),

	/// The next element does not have the requested name.
	ElementNotFound,

	/// A node of the given kind was found inside an element which may only
	/// contain text.
	UnexpectedContent(NodeType),
}

impl error::Error for FormatError {}

impl fmt::Display for FormatError {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::UnexpectedNodeType(kind) => write!(f, "{} is an invalid node type", kind),
			Self::ElementNotFound => f.write_str("element not found"),
			Self::UnexpectedContent(kind) => {
				write!(f, "unexpected {} node in simple content", kind)
			}
		}
	}
}

/// Structural violation detected by a [`Sink`](crate::writer::Sink).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
	/// Emitted if an attribute is written outside of an element header.
	AttributeNotAllowed,

	/// Emitted if an element is closed while none is open.
	NoOpenElement,

	/// Emitted if whitespace content contains non-whitespace characters.
	InvalidWhitespace,

	/// Emitted if a comment contains `--` or ends with `-`.
	InvalidComment,

	/// Emitted if a processing instruction contains `?>` or has an empty
	/// target.
	InvalidProcessingInstruction,
}

impl error::Error for EncodeError {}

impl fmt::Display for EncodeError {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::AttributeNotAllowed => f.write_str("attribute outside of element header"),
			Self::NoOpenElement => f.write_str("no element open"),
			Self::InvalidWhitespace => f.write_str("non-whitespace character in whitespace"),
			Self::InvalidComment => f.write_str("invalid comment text"),
			Self::InvalidProcessingInstruction => f.write_str("invalid processing instruction"),
		}
	}
}

/// [`std::sync::Arc`]-based around [`std::io::Error`] to allow cloning.
#[derive(Clone)]
pub struct IOErrorWrapper(Arc<io::Error>);

impl IOErrorWrapper {
	fn wrap(e: io::Error) -> IOErrorWrapper {
		IOErrorWrapper(Arc::new(e))
	}
}

impl fmt::Debug for IOErrorWrapper {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		fmt::Debug::fmt(&**self, f)
	}
}

impl fmt::Display for IOErrorWrapper {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		fmt::Display::fmt(&**self, f)
	}
}

impl PartialEq for IOErrorWrapper {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}

impl Deref for IOErrorWrapper {
	type Target = io::Error;

	fn deref(&self) -> &io::Error {
		&*self.0
	}
}

/// Opaque failure reported by a cursor backend.
///
/// Backends which are not built on [`std::io`] wrap their own error types
/// in this, so that they travel through composite operations untouched.
#[derive(Clone)]
pub struct CursorFailure(Arc<dyn error::Error + Send + Sync + 'static>);

impl CursorFailure {
	/// Access the backend error.
	pub fn get_ref(&self) -> &(dyn error::Error + Send + Sync + 'static) {
		&*self.0
	}
}

impl fmt::Debug for CursorFailure {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		fmt::Debug::fmt(&*self.0, f)
	}
}

impl fmt::Display for CursorFailure {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		fmt::Display::fmt(&*self.0, f)
	}
}

impl PartialEq for CursorFailure {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}

/// Error types which may be returned by the adapter, the composite
/// operations, the copier or the reference backends.
///
/// Errors raised by a cursor or sink are never translated: whatever the
/// collaborator returned is what the caller of a composite operation sees.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
	/// A required collaborator was absent.
	///
	/// The string names the missing argument.
	InvalidArgument(&'static str),

	/// The cursor was not positioned as a start/end element or string read
	/// requires.
	InvalidState(StateError),

	/// Validation failure of an element-string read.
	InvalidFormat(FormatError),

	/// The collaborator does not implement the requested capability.
	///
	/// The string names the operation.
	Unsupported(&'static str),

	/// Structural violation detected by a sink.
	Encode(EncodeError),

	/// An I/O error from a cursor backend or sink.
	IO(IOErrorWrapper),

	/// A backend-specific failure of the cursor.
	Cursor(CursorFailure),
}

pub type Result<T> = StdResult<T, Error>;

impl Error {
	pub fn io(e: io::Error) -> Error {
		Error::IO(IOErrorWrapper::wrap(e))
	}

	/// Wrap a backend-specific error.
	pub fn cursor<E: error::Error + Send + Sync + 'static>(e: E) -> Error {
		Error::Cursor(CursorFailure(Arc::new(e)))
	}
}

impl From<io::Error> for Error {
	fn from(e: io::Error) -> Error {
		Error::io(e)
	}
}

impl From<StateError> for Error {
	fn from(e: StateError) -> Error {
		Error::InvalidState(e)
	}
}

impl From<FormatError> for Error {
	fn from(e: FormatError) -> Error {
		Error::InvalidFormat(e)
	}
}

impl From<EncodeError> for Error {
	fn from(e: EncodeError) -> Error {
		Error::Encode(e)
	}
}

impl fmt::Display for Error {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Error::InvalidArgument(arg) => write!(f, "invalid argument: {} is absent", arg),
			Error::InvalidState(e) => write!(f, "invalid cursor state: {}", e),
			Error::InvalidFormat(e) => write!(f, "invalid format: {}", e),
			Error::Unsupported(op) => write!(f, "{} is not supported", op),
			Error::Encode(e) => write!(f, "cannot encode: {}", e),
			Error::IO(e) => write!(f, "I/O error: {}", e),
			Error::Cursor(e) => write!(f, "cursor error: {}", e),
		}
	}
}

impl error::Error for Error {
	fn source(&self) -> Option<&(dyn error::Error + 'static)> {
		match self {
			Error::IO(e) => Some(&**e),
			Error::Cursor(e) => Some(e.get_ref()),
			Error::InvalidState(e) => Some(e),
			Error::InvalidFormat(e) => Some(e),
			Error::Encode(e) => Some(e),
			Error::InvalidArgument(_) | Error::Unsupported(_) => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn io_errors_compare_by_identity() {
		let e1 = Error::io(io::Error::new(io::ErrorKind::Other, "foo"));
		let e2 = Error::io(io::Error::new(io::ErrorKind::Other, "foo"));
		assert_eq!(e1, e1.clone());
		assert_ne!(e1, e2);
	}

	#[test]
	fn display_names_the_node_type() {
		let e = Error::InvalidState(StateError::UnexpectedNodeType(NodeType::EndElement));
		assert_eq!(
			e.to_string(),
			"invalid cursor state: EndElement is an invalid node type"
		);
	}

	#[test]
	fn cursor_failures_expose_their_source() {
		let e = Error::cursor(io::Error::new(io::ErrorKind::InvalidData, "bad token"));
		let src = error::Error::source(&e).unwrap();
		assert_eq!(src.to_string(), "bad token");
	}
}
