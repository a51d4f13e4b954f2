/*!
# Write side

[`Sink`] is the capability a [`NodeCopier`](crate::NodeCopier) writes to.
[`Encoder`] is a sink which serializes the calls into XML text.
*/
use std::fmt;

use bytes::{BufMut, BytesMut};

use crate::cursor::CursorState;
use crate::error::{EncodeError, Result};
use crate::memory::{XMLNS_XML, XMLNS_XMLNS};

const PREFIX_XML: &'static str = "xml";
const PREFIX_XMLNS: &'static str = "xmlns";

const CDATA_SPECIALS: &'static [u8] = &[b'<', b'>', b'&', b'\r'];

const ATTR_SPECIALS: &'static [u8] = &[b'"', b'\'', b'\r', b'\n', b'\t', b'<', b'>', b'&'];

fn escape<B: BufMut>(out: &mut B, data: &[u8], specials: &'static [u8]) {
	let mut last_index = 0;
	for (i, &ch) in data.iter().enumerate() {
		if !specials.contains(&ch) {
			continue;
		}
		let replacement: &[u8] = match ch {
			b'"' => b"&#34;",
			b'\'' => b"&#39;",
			b'<' => b"&lt;",
			b'>' => b"&gt;",
			b'&' => b"&amp;",
			b'\r' => b"&#xd;",
			b'\n' => b"&#xa;",
			b'\t' => b"&#x9;",
			_ => continue,
		};
		out.put_slice(&data[last_index..i]);
		out.put_slice(replacement);
		last_index = i + 1;
	}
	out.put_slice(&data[last_index..]);
}

fn is_xml_whitespace(ch: char) -> bool {
	matches!(ch, ' ' | '\t' | '\n' | '\r')
}

/**
# Receiver of structured write calls

Names are passed split into prefix, local name and namespace URI, with the
empty string for an absent part, mirroring [`CursorState`].

Only [`write_attributes`](Self::write_attributes) has a default
implementation.
*/
pub trait Sink {
	/// Open the header of an element.
	fn write_start_element(&mut self, prefix: &str, local_name: &str, namespace_uri: &str) -> Result<()>;

	/// Add an attribute to the element header currently open.
	fn write_attribute(
		&mut self,
		prefix: &str,
		local_name: &str,
		namespace_uri: &str,
		value: &str,
	) -> Result<()>;

	/// Copy all attributes of the element `cursor` is positioned on.
	///
	/// Attributes which were supplied as defaults are skipped unless
	/// `default_attributes` is set. The cursor is returned to the element
	/// afterwards, also on error.
	fn write_attributes(&mut self, cursor: &mut dyn CursorState, default_attributes: bool) -> Result<()> {
		if !cursor.move_to_first_attribute() {
			return Ok(());
		}
		let mut result = Ok(());
		loop {
			if default_attributes || !cursor.is_default() {
				result = self.write_attribute(
					cursor.prefix(),
					cursor.local_name(),
					cursor.namespace_uri(),
					cursor.value(),
				);
				if result.is_err() {
					break;
				}
			}
			if !cursor.move_to_next_attribute() {
				break;
			}
		}
		cursor.move_to_element();
		result
	}

	/// Close the innermost element, in short form if it has no content.
	fn write_end_element(&mut self) -> Result<()>;

	/// Close the innermost element, always with a separate end tag.
	fn write_full_end_element(&mut self) -> Result<()>;

	/// Write text content.
	fn write_string(&mut self, text: &str) -> Result<()>;

	/// Write text content from a char buffer.
	fn write_chars(&mut self, chars: &[char]) -> Result<()>;

	/// Write whitespace-only content.
	fn write_whitespace(&mut self, ws: &str) -> Result<()>;

	/// Write a CDATA section.
	fn write_cdata(&mut self, text: &str) -> Result<()>;

	/// Write a reference to the named entity.
	fn write_entity_ref(&mut self, name: &str) -> Result<()>;

	/// Write a processing instruction. The XML declaration is written
	/// through this too, with target `xml`.
	fn write_processing_instruction(&mut self, target: &str, data: &str) -> Result<()>;

	/// Write a document type declaration.
	fn write_doctype(
		&mut self,
		name: &str,
		public_id: Option<&str>,
		system_id: Option<&str>,
		subset: &str,
	) -> Result<()>;

	/// Write a comment.
	fn write_comment(&mut self, text: &str) -> Result<()>;
}

#[derive(Debug)]
struct OpenElement {
	qname: String,
	// number of entries this element pushed onto the binding stack
	bindings: usize,
}

/**
Serializes [`Sink`] calls into a [`BytesMut`].

Namespace declarations are emitted as needed: whenever an element or
attribute uses a prefix which is not bound to its namespace URI in the
current scope, a declaration is added to the element header. Explicit
`xmlns` attributes which repeat such a declaration are dropped.

```rust
use xmlcursor::{Encoder, Sink};

let mut enc = Encoder::new();
enc.write_start_element("", "greeting", "").unwrap();
enc.write_attribute("", "lang", "", "en").unwrap();
enc.write_string("fish & chips").unwrap();
enc.write_full_end_element().unwrap();
assert_eq!(&enc.get_ref()[..], &b"<greeting lang=\"en\">fish &amp; chips</greeting>"[..]);
```
*/
pub struct Encoder {
	buf: BytesMut,
	stack: Vec<OpenElement>,
	// (prefix, namespace URI); the empty prefix is the default namespace
	bindings: Vec<(String, String)>,
	head_open: bool,
}

impl Encoder {
	pub fn new() -> Self {
		Self::with_capacity(0)
	}

	/// Create an encoder whose buffer can hold `capacity` bytes without
	/// reallocating.
	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			buf: BytesMut::with_capacity(capacity),
			stack: Vec::new(),
			bindings: Vec::new(),
			head_open: false,
		}
	}

	/// Bytes written so far.
	pub fn get_ref(&self) -> &BytesMut {
		&self.buf
	}

	/// Remove and return the bytes written so far.
	///
	/// The element nesting is not affected, so this can be used to flush
	/// output in pieces.
	pub fn take(&mut self) -> BytesMut {
		self.buf.split()
	}

	/// Number of elements currently open.
	pub fn depth(&self) -> usize {
		self.stack.len()
	}

	pub fn into_inner(self) -> BytesMut {
		self.buf
	}

	fn lookup(&self, prefix: &str) -> Option<&str> {
		match prefix {
			PREFIX_XML => return Some(XMLNS_XML),
			PREFIX_XMLNS => return Some(XMLNS_XMLNS),
			_ => (),
		}
		self.bindings
			.iter()
			.rev()
			.find(|(p, _)| p == prefix)
			.map(|(_, uri)| uri.as_str())
	}

	fn is_bound(&self, prefix: &str, namespace_uri: &str) -> bool {
		match self.lookup(prefix) {
			Some(uri) => uri == namespace_uri,
			None => prefix.is_empty() && namespace_uri.is_empty(),
		}
	}

	fn close_head(&mut self) {
		if self.head_open {
			self.buf.put_u8(b'>');
			self.head_open = false;
		}
	}

	fn declare(&mut self, prefix: &str, namespace_uri: &str) {
		if prefix.is_empty() {
			self.buf.put_slice(b" xmlns='");
		} else {
			self.buf.put_slice(b" xmlns:");
			self.buf.put_slice(prefix.as_bytes());
			self.buf.put_slice(b"='");
		}
		escape(&mut self.buf, namespace_uri.as_bytes(), ATTR_SPECIALS);
		self.buf.put_u8(b'\'');
		self.bindings.push((prefix.to_owned(), namespace_uri.to_owned()));
		if let Some(top) = self.stack.last_mut() {
			top.bindings += 1;
		}
	}

	fn declared_here(&self, prefix: &str) -> Option<&str> {
		let n = self.stack.last().map_or(0, |top| top.bindings);
		self.bindings[self.bindings.len() - n..]
			.iter()
			.find(|(p, _)| p == prefix)
			.map(|(_, uri)| uri.as_str())
	}

	fn write_end_tag(&mut self, element: OpenElement) {
		self.buf.put_slice(b"</");
		self.buf.put_slice(element.qname.as_bytes());
		self.buf.put_u8(b'>');
		self.pop_bindings(element);
	}

	fn pop_bindings(&mut self, element: OpenElement) {
		let keep = self.bindings.len() - element.bindings;
		self.bindings.truncate(keep);
	}
}

impl Default for Encoder {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for Encoder {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("Encoder")
			.field("buffered", &self.buf.len())
			.field("depth", &self.stack.len())
			.field("head_open", &self.head_open)
			.finish()
	}
}

impl Sink for Encoder {
	fn write_start_element(&mut self, prefix: &str, local_name: &str, namespace_uri: &str) -> Result<()> {
		self.close_head();
		let qname = if prefix.is_empty() {
			local_name.to_owned()
		} else {
			format!("{}:{}", prefix, local_name)
		};
		self.buf.put_u8(b'<');
		self.buf.put_slice(qname.as_bytes());
		self.stack.push(OpenElement { qname, bindings: 0 });
		self.head_open = true;
		if !self.is_bound(prefix, namespace_uri) {
			self.declare(prefix, namespace_uri);
		}
		Ok(())
	}

	fn write_attribute(
		&mut self,
		prefix: &str,
		local_name: &str,
		namespace_uri: &str,
		value: &str,
	) -> Result<()> {
		if !self.head_open {
			return Err(EncodeError::AttributeNotAllowed.into());
		}
		let declared = match (prefix, local_name) {
			(PREFIX_XMLNS, _) => Some(local_name),
			("", PREFIX_XMLNS) => Some(""),
			_ => None,
		};
		if let Some(declared) = declared {
			if declared == PREFIX_XML || self.declared_here(declared).is_some() {
				return Ok(());
			}
			self.declare(declared, value);
			return Ok(());
		}
		if !prefix.is_empty() && !self.is_bound(prefix, namespace_uri) {
			self.declare(prefix, namespace_uri);
		}
		self.buf.put_u8(b' ');
		if !prefix.is_empty() {
			self.buf.put_slice(prefix.as_bytes());
			self.buf.put_u8(b':');
		}
		self.buf.put_slice(local_name.as_bytes());
		self.buf.put_slice(b"=\"");
		escape(&mut self.buf, value.as_bytes(), ATTR_SPECIALS);
		self.buf.put_u8(b'"');
		Ok(())
	}

	fn write_end_element(&mut self) -> Result<()> {
		let element = self.stack.pop().ok_or(EncodeError::NoOpenElement)?;
		if self.head_open {
			self.buf.put_slice(b"/>");
			self.head_open = false;
			self.pop_bindings(element);
		} else {
			self.write_end_tag(element);
		}
		Ok(())
	}

	fn write_full_end_element(&mut self) -> Result<()> {
		let element = self.stack.pop().ok_or(EncodeError::NoOpenElement)?;
		self.close_head();
		self.write_end_tag(element);
		Ok(())
	}

	fn write_string(&mut self, text: &str) -> Result<()> {
		self.close_head();
		escape(&mut self.buf, text.as_bytes(), CDATA_SPECIALS);
		Ok(())
	}

	fn write_chars(&mut self, chars: &[char]) -> Result<()> {
		let text: String = chars.iter().collect();
		self.write_string(&text)
	}

	fn write_whitespace(&mut self, ws: &str) -> Result<()> {
		if !ws.chars().all(is_xml_whitespace) {
			return Err(EncodeError::InvalidWhitespace.into());
		}
		self.close_head();
		self.buf.put_slice(ws.as_bytes());
		Ok(())
	}

	fn write_cdata(&mut self, text: &str) -> Result<()> {
		self.close_head();
		self.buf.put_slice(b"<![CDATA[");
		let mut pieces = text.split("]]>");
		if let Some(first) = pieces.next() {
			self.buf.put_slice(first.as_bytes());
		}
		for piece in pieces {
			// end the section between ]] and >
			self.buf.put_slice(b"]]]]><![CDATA[>");
			self.buf.put_slice(piece.as_bytes());
		}
		self.buf.put_slice(b"]]>");
		Ok(())
	}

	fn write_entity_ref(&mut self, name: &str) -> Result<()> {
		self.close_head();
		self.buf.put_u8(b'&');
		self.buf.put_slice(name.as_bytes());
		self.buf.put_u8(b';');
		Ok(())
	}

	fn write_processing_instruction(&mut self, target: &str, data: &str) -> Result<()> {
		if target.is_empty() || target.contains("?>") || data.contains("?>") {
			return Err(EncodeError::InvalidProcessingInstruction.into());
		}
		self.close_head();
		self.buf.put_slice(b"<?");
		self.buf.put_slice(target.as_bytes());
		if !data.is_empty() {
			self.buf.put_u8(b' ');
			self.buf.put_slice(data.as_bytes());
		}
		self.buf.put_slice(b"?>");
		Ok(())
	}

	fn write_doctype(
		&mut self,
		name: &str,
		public_id: Option<&str>,
		system_id: Option<&str>,
		subset: &str,
	) -> Result<()> {
		self.close_head();
		self.buf.put_slice(b"<!DOCTYPE ");
		self.buf.put_slice(name.as_bytes());
		match (public_id, system_id) {
			(Some(public_id), system_id) => {
				self.buf.put_slice(b" PUBLIC \"");
				self.buf.put_slice(public_id.as_bytes());
				self.buf.put_slice(b"\" \"");
				self.buf.put_slice(system_id.unwrap_or("").as_bytes());
				self.buf.put_u8(b'"');
			}
			(None, Some(system_id)) => {
				self.buf.put_slice(b" SYSTEM \"");
				self.buf.put_slice(system_id.as_bytes());
				self.buf.put_u8(b'"');
			}
			(None, None) => (),
		}
		if !subset.is_empty() {
			self.buf.put_slice(b" [");
			self.buf.put_slice(subset.as_bytes());
			self.buf.put_u8(b']');
		}
		self.buf.put_u8(b'>');
		Ok(())
	}

	fn write_comment(&mut self, text: &str) -> Result<()> {
		if text.contains("--") || text.ends_with('-') {
			return Err(EncodeError::InvalidComment.into());
		}
		self.close_head();
		self.buf.put_slice(b"<!--");
		self.buf.put_slice(text.as_bytes());
		self.buf.put_slice(b"-->");
		Ok(())
	}
}
