/*!
# Subtree copying

[`NodeCopier`] mirrors the node a cursor is positioned on, and for elements
its complete subtree up to and including the end tag, onto a [`Sink`].
*/
use tracing::trace;

use crate::cursor::{Cursor, CursorState};
use crate::error::{Error, Result};
use crate::node::NodeType;
use crate::wrapper::DualModeCursor;
use crate::writer::Sink;

/// Default number of chars pulled per chunk when copying text.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/**
Options for [`NodeCopier`]

```rust
use xmlcursor::CopyOptions;

let opts = CopyOptions::default().default_attributes(true).chunk_size(256);
```
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOptions {
	/// Also copy attributes which were supplied as defaults.
	///
	/// Defaults to false.
	pub default_attributes: bool,

	/// Number of chars pulled at once from cursors which support chunked
	/// value reads.
	///
	/// Defaults to 1024. Zero is treated as one.
	pub chunk_size: usize,
}

impl CopyOptions {
	/// Set [`Self::default_attributes`].
	pub fn default_attributes(mut self, enabled: bool) -> Self {
		self.default_attributes = enabled;
		self
	}

	/// Set [`Self::chunk_size`].
	pub fn chunk_size(mut self, chars: usize) -> Self {
		self.chunk_size = chars;
		self
	}
}

impl Default for CopyOptions {
	fn default() -> Self {
		Self {
			default_attributes: false,
			chunk_size: DEFAULT_CHUNK_SIZE,
		}
	}
}

/**
Copies nodes from a [`DualModeCursor`] to a [`Sink`].

The copier owns the buffer used for chunked text reads. It is allocated on
first use and reused by later copies, so a copier can be kept around for
many calls.

```rust
use xmlcursor::{CopyOptions, Document, DualModeCursor, Encoder, MemoryCursor, NodeCopier};

# tokio_test::block_on(async {
let doc = Document::builder()
	.start("a")
	.start("b")
	.text("x")
	.end()
	.end()
	.build()
	.unwrap();
let mut inner = MemoryCursor::new(doc);
let mut cursor = DualModeCursor::wrap(&mut inner);
cursor.move_to_content().await.unwrap();

let mut copier = NodeCopier::new(CopyOptions::default());
let mut enc = Encoder::new();
copier.copy(Some(&mut cursor), &mut enc).await.unwrap();
assert_eq!(&enc.get_ref()[..], b"<a><b>x</b></a>");
# });
```
*/
#[derive(Debug)]
pub struct NodeCopier {
	options: CopyOptions,
	buffer: Option<Vec<char>>,
}

impl NodeCopier {
	pub fn new(options: CopyOptions) -> Self {
		Self {
			options,
			buffer: None,
		}
	}

	pub fn options(&self) -> &CopyOptions {
		&self.options
	}

	/**
	Copy the current node of `cursor`, with its subtree, to `sink`.

	Afterwards the cursor is positioned on the first node after the copied
	subtree, or at the end of input. If the cursor has not been read from
	yet, everything up to the end of input is copied.

	Errors from the cursor or the sink abort the copy; whatever was written
	before stays written.

	# Errors

	[`Error::InvalidArgument`] if `cursor` is `None`.
	*/
	pub async fn copy<C, S>(&mut self, cursor: Option<&mut DualModeCursor<'_, C>>, sink: &mut S) -> Result<()>
	where
		C: Cursor + Unpin + ?Sized,
		S: Sink + ?Sized,
	{
		let cursor = cursor.ok_or(Error::InvalidArgument("cursor"))?;
		let start_depth = match cursor.node_type() {
			NodeType::None => None,
			_ => Some(cursor.depth()),
		};
		loop {
			self.copy_node(cursor, sink).await?;
			if !cursor.read().await? {
				return Ok(());
			}
			let depth = cursor.depth();
			let within = start_depth.map_or(true, |start| {
				depth > start || (depth == start && cursor.node_type() == NodeType::EndElement)
			});
			if !within {
				return Ok(());
			}
		}
	}

	async fn copy_node<C, S>(&mut self, cursor: &mut DualModeCursor<'_, C>, sink: &mut S) -> Result<()>
	where
		C: Cursor + Unpin + ?Sized,
		S: Sink + ?Sized,
	{
		let kind = cursor.node_type();
		trace!(%kind, depth = cursor.depth(), name = cursor.name(), "copying node");
		match kind {
			NodeType::Element => {
				sink.write_start_element(cursor.prefix(), cursor.local_name(), cursor.namespace_uri())?;
				sink.write_attributes(&mut *cursor, self.options.default_attributes)?;
				if cursor.is_empty_element() {
					sink.write_end_element()?;
				}
			}
			NodeType::Text => {
				if cursor.can_read_value_chunk() {
					let chunk_size = self.options.chunk_size.max(1);
					let buf = self.buffer.get_or_insert_with(|| vec!['\0'; chunk_size]);
					loop {
						let n = cursor.read_value_chunk(buf)?;
						if n == 0 {
							break;
						}
						sink.write_chars(&buf[..n])?;
					}
				} else {
					let value = cursor.get_value().await?;
					sink.write_string(&value)?;
				}
			}
			NodeType::Whitespace | NodeType::SignificantWhitespace => {
				let value = cursor.get_value().await?;
				sink.write_whitespace(&value)?;
			}
			NodeType::CData => {
				let value = cursor.get_value().await?;
				sink.write_cdata(&value)?;
			}
			NodeType::EntityReference => sink.write_entity_ref(cursor.name())?,
			NodeType::ProcessingInstruction | NodeType::XmlDeclaration => {
				let value = cursor.get_value().await?;
				sink.write_processing_instruction(cursor.name(), &value)?;
			}
			NodeType::DocumentType => {
				let subset = cursor.get_value().await?;
				sink.write_doctype(
					cursor.name(),
					cursor.get_attribute("PUBLIC"),
					cursor.get_attribute("SYSTEM"),
					&subset,
				)?;
			}
			NodeType::Comment => {
				let value = cursor.get_value().await?;
				sink.write_comment(&value)?;
			}
			NodeType::EndElement => sink.write_full_end_element()?,
			_ => (),
		}
		Ok(())
	}
}

impl<'c, C: Cursor + Unpin + ?Sized> DualModeCursor<'c, C> {
	/// Copy the current node and its subtree to `sink`.
	///
	/// Shorthand for [`NodeCopier::copy`] with a fresh copier.
	pub async fn copy_node_to<S: Sink + ?Sized>(&mut self, sink: &mut S, options: CopyOptions) -> Result<()> {
		NodeCopier::new(options).copy(Some(self), sink).await
	}
}
