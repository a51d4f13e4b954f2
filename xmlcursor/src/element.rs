/*!
# Composite element reads

Start/end tag consumption, start tag tests and simple-content text
extraction, implemented on [`DualModeCursor`] purely in terms of its four
primitives and the synchronous [`CursorState`] accessors. No operation here
introduces a suspension point of its own, so each behaves identically in
both execution modes.

On failure an operation stops where it is. Nodes consumed up to that point
stay consumed.
*/
use tracing::debug;

use crate::cursor::{Cursor, CursorState};
use crate::error::{FormatError, Result, StateError};
use crate::node::{NodeType, NodeTypeSet};
use crate::wrapper::DualModeCursor;

/// Name requirement of a start tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameTest<'a> {
	Any,
	/// Qualified name, as written (`prefix:local`).
	QName(&'a str),
	/// Local name and namespace URI.
	Expanded(&'a str, &'a str),
}

impl NameTest<'_> {
	fn matches<R: CursorState + ?Sized>(&self, cursor: &R) -> bool {
		match *self {
			Self::Any => true,
			Self::QName(name) => cursor.name() == name,
			Self::Expanded(local_name, namespace_uri) => {
				cursor.local_name() == local_name && cursor.namespace_uri() == namespace_uri
			}
		}
	}
}

impl<'c, C: Cursor + Unpin + ?Sized> DualModeCursor<'c, C> {
	async fn read_start_element_matching(&mut self, test: NameTest<'_>) -> Result<()> {
		let kind = self.move_to_content().await?;
		if kind != NodeType::Element {
			debug!(%kind, "start element expected");
			return Err(StateError::UnexpectedNodeType(kind).into());
		}
		if !test.matches(&*self) {
			debug!(name = self.name(), ?test, "start element name mismatch");
			return Err(StateError::NameMismatch.into());
		}
		self.read().await?;
		Ok(())
	}

	/// Consume the start tag of the next element.
	///
	/// Skips non-content nodes first. Fails with
	/// [`StateError::UnexpectedNodeType`] if the next content node is not a
	/// start tag.
	pub async fn read_start_element(&mut self) -> Result<()> {
		self.read_start_element_matching(NameTest::Any).await
	}

	/// Consume the start tag of the next element, which must have the
	/// qualified name `name`.
	///
	/// Fails like [`read_start_element`](Self::read_start_element) and
	/// additionally with [`StateError::NameMismatch`].
	pub async fn read_start_element_named(&mut self, name: &str) -> Result<()> {
		self.read_start_element_matching(NameTest::QName(name)).await
	}

	/// Consume the start tag of the next element, which must have the given
	/// local name and namespace URI.
	///
	/// Fails like [`read_start_element`](Self::read_start_element) and
	/// additionally with [`StateError::NameMismatch`].
	pub async fn read_start_element_ns(&mut self, local_name: &str, namespace_uri: &str) -> Result<()> {
		self.read_start_element_matching(NameTest::Expanded(local_name, namespace_uri))
			.await
	}

	/// Consume the next end tag.
	///
	/// Fails with [`StateError::UnexpectedNodeType`] if the next content node
	/// is not an end tag.
	pub async fn read_end_element(&mut self) -> Result<()> {
		let kind = self.move_to_content().await?;
		if kind != NodeType::EndElement {
			debug!(%kind, "end element expected");
			return Err(StateError::UnexpectedNodeType(kind).into());
		}
		self.read().await?;
		Ok(())
	}

	async fn is_start_element_matching(&mut self, test: NameTest<'_>) -> Result<bool> {
		Ok(self.move_to_content().await? == NodeType::Element && test.matches(&*self))
	}

	/// Test whether the next content node is a start tag.
	///
	/// Non-content nodes before it are skipped, the start tag itself is not
	/// consumed.
	pub async fn is_start_element(&mut self) -> Result<bool> {
		self.is_start_element_matching(NameTest::Any).await
	}

	/// Test whether the next content node is a start tag with the qualified
	/// name `name`.
	pub async fn is_start_element_named(&mut self, name: &str) -> Result<bool> {
		self.is_start_element_matching(NameTest::QName(name)).await
	}

	/// Test whether the next content node is a start tag with the given
	/// local name and namespace URI.
	pub async fn is_start_element_ns(&mut self, local_name: &str, namespace_uri: &str) -> Result<bool> {
		self.is_start_element_matching(NameTest::Expanded(local_name, namespace_uri))
			.await
	}

	/**
	Concatenate the run of text nodes at the current position.

	Text, CDATA and whitespace nodes (see [`NodeTypeSet::TEXTUAL`]) are
	consumed until the first node of another kind, which the cursor is left
	on.

	* Before the first read, nothing happens and the empty string is
	  returned.
	* On an attribute, the cursor first returns to the owning element.
	* On an empty element, the empty string is returned without reading.
	* On any other start tag, the cursor steps inside first. If the input
	  ends there, [`StateError::UnexpectedEnd`] is returned.
	*/
	pub async fn read_string(&mut self) -> Result<String> {
		if !self.is_interactive() {
			return Ok(String::new());
		}
		self.move_to_element();
		if self.node_type() == NodeType::Element {
			if self.is_empty_element() {
				return Ok(String::new());
			}
			if !self.read().await? {
				debug!("input ended inside element");
				return Err(StateError::UnexpectedEnd.into());
			}
			if self.node_type() == NodeType::EndElement {
				return Ok(String::new());
			}
		}
		let mut result = String::new();
		while NodeTypeSet::TEXTUAL.contains(self.node_type()) {
			result.push_str(&self.get_value().await?);
			if !self.read().await? {
				break;
			}
		}
		Ok(result)
	}

	async fn read_element_string_matching(&mut self, test: NameTest<'_>) -> Result<String> {
		let kind = self.move_to_content().await?;
		if kind != NodeType::Element {
			debug!(%kind, "element with simple content expected");
			return Err(FormatError::UnexpectedNodeType(kind).into());
		}
		if !test.matches(&*self) {
			debug!(name = self.name(), ?test, "element not found");
			return Err(FormatError::ElementNotFound.into());
		}
		if self.is_empty_element() {
			self.read().await?;
			return Ok(String::new());
		}
		let result = self.read_string().await?;
		let kind = self.node_type();
		if kind != NodeType::EndElement {
			debug!(%kind, "unexpected node in simple content");
			return Err(FormatError::UnexpectedContent(kind).into());
		}
		self.read().await?;
		Ok(result)
	}

	/// Read an element which contains only text, and return that text.
	///
	/// The cursor ends up after the element's end tag. Fails with
	/// [`FormatError::UnexpectedNodeType`] if the next content node is not a
	/// start tag and with [`FormatError::UnexpectedContent`] if the element
	/// contains anything but text.
	///
	/// All three variants read the content directly from the start tag; none
	/// of them steps into the element before collecting its text.
	pub async fn read_element_string(&mut self) -> Result<String> {
		self.read_element_string_matching(NameTest::Any).await
	}

	/// Like [`read_element_string`](Self::read_element_string) for an element
	/// with the qualified name `name`.
	///
	/// Fails with [`FormatError::ElementNotFound`] if the name differs.
	pub async fn read_element_string_named(&mut self, name: &str) -> Result<String> {
		self.read_element_string_matching(NameTest::QName(name)).await
	}

	/// Like [`read_element_string`](Self::read_element_string) for an element
	/// with the given local name and namespace URI.
	///
	/// Fails with [`FormatError::ElementNotFound`] if the name differs.
	pub async fn read_element_string_ns(
		&mut self,
		local_name: &str,
		namespace_uri: &str,
	) -> Result<String> {
		self.read_element_string_matching(NameTest::Expanded(local_name, namespace_uri))
			.await
	}
}
