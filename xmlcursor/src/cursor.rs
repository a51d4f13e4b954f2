/*!
# Capability contract for cursor backends

A backend implements two traits:

* [`CursorState`] is the synchronous facade: it inspects the node the
  cursor is positioned on and navigates its attributes. None of its
  methods ever perform I/O.
* [`Cursor`] holds the four primitives which may need to wait for input:
  [`read`](Cursor::read), [`move_to_content`](Cursor::move_to_content),
  [`skip`](Cursor::skip) and [`get_value`](Cursor::get_value), each in a
  blocking and a poll-based suspending form.

Which of the two forms is used is decided once, by
[`DualModeCursor`](crate::DualModeCursor), from
[`Cursor::execution_mode`].
*/
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::{Error, Result};
use crate::node::{NodeType, NodeTypeSet, ReadState};

/// Whether the operations of a cursor complete immediately or may suspend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionMode {
	/// Operations block until complete; their futures are always ready on
	/// first poll.
	Immediate,
	/// Operations may return [`Poll::Pending`] while waiting for input.
	Suspendable,
}

/**
# Synchronous view of the cursor position

Strings are reported the way XML readers traditionally do: absent names,
prefixes or namespace URIs are empty strings, not `None`.
*/
pub trait CursorState {
	/// Kind of the current node.
	fn node_type(&self) -> NodeType;

	/// Qualified name (`prefix:local`) of the current node.
	///
	/// For processing instructions this is the target, for document types
	/// the root element name and for entity references the entity name.
	fn name(&self) -> &str;

	/// Local part of the current node's name.
	fn local_name(&self) -> &str;

	/// Namespace URI of the current element or attribute.
	fn namespace_uri(&self) -> &str;

	/// Namespace prefix of the current element or attribute.
	fn prefix(&self) -> &str;

	/// Text value of the current node.
	fn value(&self) -> &str;

	/// Nesting depth of the current node. The root element has depth 0.
	///
	/// Only meaningful while the cursor is interactive.
	fn depth(&self) -> usize;

	/// Base URI of the current node.
	fn base_uri(&self) -> &str;

	/// True if the current node is an element written as `<a/>`.
	fn is_empty_element(&self) -> bool;

	/// True if the current attribute was supplied as a default rather than
	/// written in the document.
	fn is_default(&self) -> bool {
		false
	}

	/// Number of attributes on the current node.
	fn attribute_count(&self) -> usize;

	/// True once the input has been exhausted.
	fn eof(&self) -> bool;

	/// Lifecycle state of the cursor.
	fn read_state(&self) -> ReadState;

	/// True if the cursor is positioned on a node.
	#[inline]
	fn is_interactive(&self) -> bool {
		self.read_state() == ReadState::Interactive
	}

	/// Look up an attribute value by qualified name.
	fn get_attribute(&self, name: &str) -> Option<&str>;

	/// Look up an attribute value by local name and namespace URI.
	fn get_attribute_ns(&self, local_name: &str, namespace_uri: &str) -> Option<&str>;

	/// Look up an attribute value by position.
	fn get_attribute_at(&self, index: usize) -> Option<&str>;

	/// Resolve a namespace prefix in the scope of the current node.
	///
	/// The empty prefix resolves the default namespace.
	fn lookup_namespace(&self, prefix: &str) -> Option<&str>;

	/// Position the cursor on the attribute with the given qualified name.
	fn move_to_attribute(&mut self, name: &str) -> bool;

	/// Position the cursor on the attribute with the given expanded name.
	fn move_to_attribute_ns(&mut self, local_name: &str, namespace_uri: &str) -> bool;

	/// Position the cursor on the attribute at `index`.
	fn move_to_attribute_at(&mut self, index: usize) -> bool;

	/// Return from an attribute to the element owning it.
	///
	/// Returns false if the cursor was not on an attribute.
	fn move_to_element(&mut self) -> bool;

	/// Position the cursor on the first attribute of the current element.
	fn move_to_first_attribute(&mut self) -> bool;

	/// Position the cursor on the next attribute.
	fn move_to_next_attribute(&mut self) -> bool;

	/// Step into the value of the current attribute.
	fn read_attribute_value(&mut self) -> bool;

	/// Expand the entity reference the cursor is positioned on.
	fn resolve_entity(&mut self) -> Result<()>;

	/// True if [`read_value_chunk`](Self::read_value_chunk) is available.
	fn can_read_value_chunk(&self) -> bool {
		false
	}

	/// Copy the next piece of the current node's value into `buf`.
	///
	/// Returns the number of chars written; zero once the value is
	/// exhausted.
	fn read_value_chunk(&mut self, buf: &mut [char]) -> Result<usize> {
		let _ = buf;
		Err(Error::Unsupported("read_value_chunk"))
	}
}

/**
# Forward-only token cursor

The blocking primitives are the only required methods; the rest have
defaults which follow the usual pull-reader semantics in terms of
[`read`](Self::read) and [`CursorState`].

Backends which can wait for input without blocking report
[`ExecutionMode::Suspendable`] and override the `poll_*` methods. The
default `poll_*` methods complete immediately using the blocking form.
*/
pub trait Cursor: CursorState {
	/// Advance to the next node.
	///
	/// Returns false once the input is exhausted.
	fn read(&mut self) -> Result<bool>;

	/// Skip over markup which is not content.
	///
	/// Moves from an attribute back to its element, then reads forward until
	/// the cursor is on a member of [`NodeTypeSet::CONTENT`] or the input is
	/// exhausted. Returns the kind of the node it stopped at.
	fn move_to_content(&mut self) -> Result<NodeType> {
		loop {
			match self.node_type() {
				NodeType::Attribute => {
					self.move_to_element();
					return Ok(self.node_type());
				}
				kind if NodeTypeSet::CONTENT.contains(kind) => return Ok(kind),
				_ => (),
			}
			if !self.read()? {
				return Ok(self.node_type());
			}
		}
	}

	/// Skip the current node, including all children of an element.
	fn skip(&mut self) -> Result<()> {
		if !self.is_interactive() {
			return Ok(());
		}
		self.move_to_element();
		if self.node_type() != NodeType::Element || self.is_empty_element() {
			self.read()?;
			return Ok(());
		}
		let depth = self.depth();
		while self.read()? && depth < self.depth() {}
		if self.node_type() == NodeType::EndElement {
			self.read()?;
		}
		Ok(())
	}

	/// Obtain the value of the current node.
	fn get_value(&mut self) -> Result<String> {
		Ok(self.value().to_owned())
	}

	/// Declared execution mode of this cursor.
	fn execution_mode(&self) -> ExecutionMode {
		ExecutionMode::Immediate
	}

	/// Suspending form of [`read`](Self::read).
	fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<bool>>
	where
		Self: Unpin,
	{
		let _ = cx;
		Poll::Ready(self.get_mut().read())
	}

	/// Suspending form of [`move_to_content`](Self::move_to_content).
	fn poll_move_to_content(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<NodeType>>
	where
		Self: Unpin,
	{
		let _ = cx;
		Poll::Ready(self.get_mut().move_to_content())
	}

	/// Suspending form of [`skip`](Self::skip).
	fn poll_skip(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>>
	where
		Self: Unpin,
	{
		let _ = cx;
		Poll::Ready(self.get_mut().skip())
	}

	/// Suspending form of [`get_value`](Self::get_value).
	fn poll_get_value(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<String>>
	where
		Self: Unpin,
	{
		let _ = cx;
		Poll::Ready(self.get_mut().get_value())
	}
}
