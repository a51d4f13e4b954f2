/*!
# In-memory cursor backend

[`MemoryCursor`] walks a pre-built [`Document`], a flat list of nodes with
depths and namespace scopes already resolved. It implements the complete
[`Cursor`] contract, including attribute navigation, chunked value reads and
both execution modes, and is what the tests of this crate run against.

Documents are assembled with a [`DocumentBuilder`]:

```
use xmlcursor::{Cursor, CursorState, Document, MemoryCursor, NodeType};

let doc = Document::builder()
	.start("greeting")
	.attr("lang", "en")
	.text("hello")
	.end()
	.build()
	.unwrap();
let mut cursor = MemoryCursor::new(doc);
assert_eq!(cursor.move_to_content().unwrap(), NodeType::Element);
assert_eq!(cursor.get_attribute("lang"), Some("en"));
```
*/
use std::pin::Pin;
use std::task::{Context, Poll};

use smartstring::alias::String as SmartString;

use crate::cursor::{Cursor, CursorState, ExecutionMode};
use crate::error::{Error, Result, StateError};
use crate::node::{NodeType, ReadState};

/// XML core namespace URI (for the `xml:` prefix)
pub const XMLNS_XML: &'static str = "http://www.w3.org/XML/1998/namespace";
/// XML namespace URI (for the `xmlns:` prefix)
pub const XMLNS_XMLNS: &'static str = "http://www.w3.org/2000/xmlns/";

const PREFIX_XML: &'static str = "xml";
const PREFIX_XMLNS: &'static str = "xmlns";

#[derive(Debug, Clone, PartialEq)]
struct QName {
	prefix: SmartString,
	local_name: SmartString,
	qname: SmartString,
	// None until resolved against the enclosing scopes
	namespace_uri: Option<String>,
}

impl QName {
	fn parse(name: &str) -> Result<Self> {
		let (prefix, local_name) = match name.find(':') {
			Some(idx) => (&name[..idx], &name[idx + 1..]),
			None => ("", name),
		};
		if local_name.is_empty() || local_name.contains(':') || name.starts_with(':') {
			return Err(Error::InvalidArgument("name"));
		}
		Ok(Self {
			prefix: prefix.into(),
			local_name: local_name.into(),
			qname: name.into(),
			namespace_uri: None,
		})
	}

	fn explicit(prefix: &str, local_name: &str, namespace_uri: &str) -> Result<Self> {
		if local_name.is_empty() || local_name.contains(':') || prefix.contains(':') {
			return Err(Error::InvalidArgument("name"));
		}
		let qname: SmartString = if prefix.is_empty() {
			local_name.into()
		} else {
			let mut s = SmartString::new();
			s.push_str(prefix);
			s.push(':');
			s.push_str(local_name);
			s
		};
		Ok(Self {
			prefix: prefix.into(),
			local_name: local_name.into(),
			qname,
			namespace_uri: Some(namespace_uri.to_owned()),
		})
	}

	fn namespace_uri(&self) -> &str {
		self.namespace_uri.as_deref().unwrap_or("")
	}

	fn is_declaration(&self) -> bool {
		self.prefix.as_str() == PREFIX_XMLNS
			|| (self.prefix.is_empty() && self.local_name.as_str() == PREFIX_XMLNS)
	}
}

#[derive(Debug, Clone, PartialEq)]
struct Attribute {
	name: QName,
	value: String,
	default: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
	Element {
		name: QName,
		attributes: Vec<Attribute>,
		empty: bool,
	},
	EndElement {
		// index of the matching start tag
		start: usize,
		name: Option<QName>,
	},
	Text(String),
	CData(String),
	Whitespace(String),
	SignificantWhitespace(String),
	Comment(String),
	ProcessingInstruction {
		target: SmartString,
		data: String,
	},
	XmlDeclaration(String),
	DocumentType {
		name: SmartString,
		public_id: Option<String>,
		system_id: Option<String>,
		subset: String,
	},
	EntityReference(SmartString),
}

impl Token {
	fn node_type(&self) -> NodeType {
		match self {
			Self::Element { .. } => NodeType::Element,
			Self::EndElement { .. } => NodeType::EndElement,
			Self::Text(_) => NodeType::Text,
			Self::CData(_) => NodeType::CData,
			Self::Whitespace(_) => NodeType::Whitespace,
			Self::SignificantWhitespace(_) => NodeType::SignificantWhitespace,
			Self::Comment(_) => NodeType::Comment,
			Self::ProcessingInstruction { .. } => NodeType::ProcessingInstruction,
			Self::XmlDeclaration(_) => NodeType::XmlDeclaration,
			Self::DocumentType { .. } => NodeType::DocumentType,
			Self::EntityReference(_) => NodeType::EntityReference,
		}
	}

	fn element_name(&self) -> Option<&QName> {
		match self {
			Self::Element { name, .. } => Some(name),
			Self::EndElement { name, .. } => name.as_ref(),
			_ => None,
		}
	}

	fn attributes(&self) -> &[Attribute] {
		match self {
			Self::Element { attributes, .. } => &attributes[..],
			_ => &[],
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
struct Entry {
	token: Token,
	depth: usize,
	scope: usize,
}

#[derive(Debug, Clone, PartialEq)]
struct Scope {
	parent: Option<usize>,
	bindings: Vec<(SmartString, String)>,
}

/// A resolved, immutable node sequence for [`MemoryCursor`].
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
	entries: Vec<Entry>,
	scopes: Vec<Scope>,
}

impl Document {
	/// Start assembling a document.
	pub fn builder() -> DocumentBuilder {
		DocumentBuilder::default()
	}

	/// Number of nodes in the document.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	fn lookup(&self, scope: usize, prefix: &str) -> Option<&str> {
		lookup(&self.scopes, scope, prefix)
	}
}

fn lookup<'s>(scopes: &'s [Scope], mut scope: usize, prefix: &str) -> Option<&'s str> {
	loop {
		let s = &scopes[scope];
		if let Some((_, uri)) = s.bindings.iter().rev().find(|(p, _)| p.as_str() == prefix) {
			return Some(uri.as_str());
		}
		scope = s.parent?;
	}
}

/**
# Assembly of [`Document`]s

Nodes are appended in document order. Attributes may only follow
[`start`](Self::start) or [`empty`](Self::empty) (or their `_ns` variants)
directly. Namespace prefixes are resolved against `xmlns` attributes when
[`build`](Self::build) runs.

Elements still open when `build` is called are left unterminated, which
produces a truncated node sequence.

The first misuse is remembered and reported by `build`.
*/
#[derive(Debug, Default)]
pub struct DocumentBuilder {
	tokens: Vec<Token>,
	open: Vec<usize>,
	head: Option<usize>,
	err: Option<Error>,
}

impl DocumentBuilder {
	fn fail(&mut self, e: Error) {
		if self.err.is_none() {
			self.err = Some(e);
		}
	}

	fn push(mut self, token: Token) -> Self {
		self.head = None;
		self.tokens.push(token);
		self
	}

	fn push_element(mut self, name: Result<QName>, empty: bool) -> Self {
		let name = match name {
			Ok(v) => v,
			Err(e) => {
				self.fail(e);
				return self;
			}
		};
		let idx = self.tokens.len();
		self = self.push(Token::Element {
			name,
			attributes: Vec::new(),
			empty,
		});
		self.head = Some(idx);
		if !empty {
			self.open.push(idx);
		}
		self
	}

	fn push_attribute(mut self, name: Result<QName>, value: &str, default: bool) -> Self {
		let name = match name {
			Ok(v) => v,
			Err(e) => {
				self.fail(e);
				return self;
			}
		};
		let head = match self.head {
			Some(v) => v,
			None => {
				self.fail(Error::InvalidArgument("attribute owner"));
				return self;
			}
		};
		if let Token::Element { attributes, .. } = &mut self.tokens[head] {
			attributes.push(Attribute {
				name,
				value: value.to_owned(),
				default,
			});
		}
		self
	}

	/// Append an XML declaration with the given pseudo-attribute text.
	pub fn xml_declaration(self, value: &str) -> Self {
		self.push(Token::XmlDeclaration(value.to_owned()))
	}

	/// Append a document type declaration.
	pub fn doctype(
		self,
		name: &str,
		public_id: Option<&str>,
		system_id: Option<&str>,
		subset: &str,
	) -> Self {
		self.push(Token::DocumentType {
			name: name.into(),
			public_id: public_id.map(|s| s.to_owned()),
			system_id: system_id.map(|s| s.to_owned()),
			subset: subset.to_owned(),
		})
	}

	/// Open an element by qualified name.
	pub fn start(self, name: &str) -> Self {
		self.push_element(QName::parse(name), false)
	}

	/// Open an element with an explicit namespace URI.
	pub fn start_ns(self, prefix: &str, local_name: &str, namespace_uri: &str) -> Self {
		self.push_element(QName::explicit(prefix, local_name, namespace_uri), false)
	}

	/// Append an empty element (`<name/>`) by qualified name.
	pub fn empty(self, name: &str) -> Self {
		self.push_element(QName::parse(name), true)
	}

	/// Append an empty element with an explicit namespace URI.
	pub fn empty_ns(self, prefix: &str, local_name: &str, namespace_uri: &str) -> Self {
		self.push_element(QName::explicit(prefix, local_name, namespace_uri), true)
	}

	/// Add an attribute to the element just opened.
	pub fn attr(self, name: &str, value: &str) -> Self {
		self.push_attribute(QName::parse(name), value, false)
	}

	/// Add an attribute with an explicit namespace URI.
	pub fn attr_ns(self, prefix: &str, local_name: &str, namespace_uri: &str, value: &str) -> Self {
		self.push_attribute(QName::explicit(prefix, local_name, namespace_uri), value, false)
	}

	/// Add an attribute which was supplied as a default value.
	pub fn default_attr(self, name: &str, value: &str) -> Self {
		self.push_attribute(QName::parse(name), value, true)
	}

	/// Close the innermost open element.
	pub fn end(mut self) -> Self {
		match self.open.pop() {
			Some(start) => self.push(Token::EndElement { start, name: None }),
			None => {
				self.fail(Error::InvalidArgument("open element"));
				self
			}
		}
	}

	pub fn text(self, text: &str) -> Self {
		self.push(Token::Text(text.to_owned()))
	}

	pub fn cdata(self, text: &str) -> Self {
		self.push(Token::CData(text.to_owned()))
	}

	pub fn whitespace(self, ws: &str) -> Self {
		self.push(Token::Whitespace(ws.to_owned()))
	}

	pub fn significant_whitespace(self, ws: &str) -> Self {
		self.push(Token::SignificantWhitespace(ws.to_owned()))
	}

	pub fn comment(self, text: &str) -> Self {
		self.push(Token::Comment(text.to_owned()))
	}

	pub fn processing_instruction(self, target: &str, data: &str) -> Self {
		self.push(Token::ProcessingInstruction {
			target: target.into(),
			data: data.to_owned(),
		})
	}

	pub fn entity_ref(self, name: &str) -> Self {
		self.push(Token::EntityReference(name.into()))
	}

	/// Resolve namespaces and depths and produce the document.
	pub fn build(self) -> Result<Document> {
		if let Some(e) = self.err {
			return Err(e);
		}
		let mut scopes = vec![Scope {
			parent: None,
			bindings: vec![
				(PREFIX_XML.into(), XMLNS_XML.to_owned()),
				(PREFIX_XMLNS.into(), XMLNS_XMLNS.to_owned()),
			],
		}];
		let mut stack: Vec<usize> = Vec::new();
		let mut entries: Vec<Entry> = Vec::with_capacity(self.tokens.len());

		for mut token in self.tokens.into_iter() {
			let parent = stack.last().copied().unwrap_or(0);
			let depth = stack.len();
			let (depth, scope, opens) = match &mut token {
				Token::Element {
					name,
					attributes,
					empty,
				} => {
					let decls: Vec<(SmartString, String)> = attributes
						.iter()
						.filter(|a| a.name.is_declaration())
						.map(|a| {
							let prefix = if a.name.prefix.is_empty() {
								SmartString::new()
							} else {
								a.name.local_name.clone()
							};
							(prefix, a.value.clone())
						})
						.collect();
					let scope = if decls.is_empty() {
						parent
					} else {
						scopes.push(Scope {
							parent: Some(parent),
							bindings: decls,
						});
						scopes.len() - 1
					};
					resolve_element(&scopes, scope, name)?;
					for attr in attributes.iter_mut() {
						resolve_attribute(&scopes, scope, &mut attr.name)?;
					}
					(depth, scope, !*empty)
				}
				Token::EndElement { start, name } => {
					let scope = stack.pop().unwrap_or(0);
					*name = entries[*start].token.element_name().cloned();
					(depth.saturating_sub(1), scope, false)
				}
				_ => (depth, parent, false),
			};
			entries.push(Entry {
				token,
				depth,
				scope,
			});
			if opens {
				stack.push(scope);
			}
		}

		Ok(Document { entries, scopes })
	}
}

fn resolve_element(scopes: &[Scope], scope: usize, name: &mut QName) -> Result<()> {
	if name.namespace_uri.is_some() {
		return Ok(());
	}
	match lookup(scopes, scope, &name.prefix) {
		Some(uri) => name.namespace_uri = Some(uri.to_owned()),
		None if name.prefix.is_empty() => name.namespace_uri = Some(String::new()),
		None => return Err(Error::InvalidArgument("namespace prefix")),
	}
	Ok(())
}

fn resolve_attribute(scopes: &[Scope], scope: usize, name: &mut QName) -> Result<()> {
	if name.namespace_uri.is_some() {
		return Ok(());
	}
	if name.is_declaration() {
		name.namespace_uri = Some(XMLNS_XMLNS.to_owned());
		return Ok(());
	}
	if name.prefix.is_empty() {
		// unprefixed attributes are never in the default namespace
		name.namespace_uri = Some(String::new());
		return Ok(());
	}
	match lookup(scopes, scope, &name.prefix) {
		Some(uri) => name.namespace_uri = Some(uri.to_owned()),
		None => return Err(Error::InvalidArgument("namespace prefix")),
	}
	Ok(())
}

// primitive which is waiting for its second poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
	Read,
	MoveToContent,
	Skip,
	GetValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
	Node,
	Attribute(usize),
	AttributeValue(usize),
}

/**
# Cursor over a [`Document`]

Created with [`MemoryCursor::new`] it declares
[`ExecutionMode::Immediate`]. Created with [`MemoryCursor::suspendable`] it
declares [`ExecutionMode::Suspendable`] and each `poll_*` primitive returns
[`Poll::Pending`] once (waking itself) before it completes. The number of
such suspensions is available from [`MemoryCursor::suspensions`].
*/
#[derive(Debug, Clone)]
pub struct MemoryCursor {
	doc: Document,
	pos: usize,
	state: ReadState,
	focus: Focus,
	mode: ExecutionMode,
	chunked: bool,
	// byte offset into the current value for read_value_chunk
	chunk_offset: usize,
	base_uri: String,
	yielded: Option<Gate>,
	suspensions: usize,
}

impl MemoryCursor {
	/// Create a cursor which completes every operation immediately.
	pub fn new(doc: Document) -> Self {
		Self::with_mode(doc, ExecutionMode::Immediate)
	}

	/// Create a cursor which suspends once in every primitive.
	pub fn suspendable(doc: Document) -> Self {
		Self::with_mode(doc, ExecutionMode::Suspendable)
	}

	pub fn with_mode(doc: Document, mode: ExecutionMode) -> Self {
		Self {
			doc,
			pos: 0,
			state: ReadState::Initial,
			focus: Focus::Node,
			mode,
			chunked: false,
			chunk_offset: 0,
			base_uri: String::new(),
			yielded: None,
			suspensions: 0,
		}
	}

	/// Enable or disable [`CursorState::read_value_chunk`] support.
	///
	/// Disabled by default.
	pub fn value_chunks(mut self, enabled: bool) -> Self {
		self.chunked = enabled;
		self
	}

	/// Set the base URI reported for all nodes.
	pub fn base_uri(mut self, uri: &str) -> Self {
		self.base_uri = uri.to_owned();
		self
	}

	/// Number of times a `poll_*` primitive returned [`Poll::Pending`].
	pub fn suspensions(&self) -> usize {
		self.suspensions
	}

	/// Access the document.
	pub fn document(&self) -> &Document {
		&self.doc
	}

	fn entry(&self) -> Option<&Entry> {
		if self.state != ReadState::Interactive {
			return None;
		}
		self.doc.entries.get(self.pos)
	}

	fn attribute(&self) -> Option<&Attribute> {
		let idx = match self.focus {
			Focus::Node => return None,
			Focus::Attribute(i) | Focus::AttributeValue(i) => i,
		};
		self.entry()?.token.attributes().get(idx)
	}

	fn attributes(&self) -> &[Attribute] {
		match self.entry() {
			Some(entry) => entry.token.attributes(),
			None => &[],
		}
	}

	fn focus_attribute(&mut self, idx: Option<usize>) -> bool {
		match idx {
			Some(i) => {
				self.focus = Focus::Attribute(i);
				self.chunk_offset = 0;
				true
			}
			None => false,
		}
	}

	// A primitive passes on the poll after the one which suspended it. A
	// pending future of another primitive which was dropped does not count.
	fn poll_gate(&mut self, gate: Gate, cx: &mut Context<'_>) -> Poll<()> {
		if self.mode == ExecutionMode::Suspendable && self.yielded != Some(gate) {
			self.yielded = Some(gate);
			self.suspensions += 1;
			cx.waker().wake_by_ref();
			return Poll::Pending;
		}
		self.yielded = None;
		Poll::Ready(())
	}
}

impl CursorState for MemoryCursor {
	fn node_type(&self) -> NodeType {
		match (self.entry(), self.focus) {
			(None, _) => NodeType::None,
			(Some(_), Focus::Attribute(_)) => NodeType::Attribute,
			(Some(_), Focus::AttributeValue(_)) => NodeType::Text,
			(Some(entry), Focus::Node) => entry.token.node_type(),
		}
	}

	fn name(&self) -> &str {
		match self.focus {
			Focus::Attribute(_) => {
				return self.attribute().map(|a| a.name.qname.as_str()).unwrap_or("")
			}
			Focus::AttributeValue(_) => return "",
			Focus::Node => (),
		}
		match self.entry().map(|e| &e.token) {
			Some(Token::Element { name, .. }) => name.qname.as_str(),
			Some(Token::EndElement { name: Some(name), .. }) => name.qname.as_str(),
			Some(Token::ProcessingInstruction { target, .. }) => target.as_str(),
			Some(Token::XmlDeclaration(_)) => PREFIX_XML,
			Some(Token::DocumentType { name, .. }) => name.as_str(),
			Some(Token::EntityReference(name)) => name.as_str(),
			_ => "",
		}
	}

	fn local_name(&self) -> &str {
		match self.focus {
			Focus::Attribute(_) => {
				return self.attribute().map(|a| a.name.local_name.as_str()).unwrap_or("")
			}
			Focus::AttributeValue(_) => return "",
			Focus::Node => (),
		}
		match self.entry().and_then(|e| e.token.element_name()) {
			Some(name) => name.local_name.as_str(),
			None => self.name(),
		}
	}

	fn namespace_uri(&self) -> &str {
		match self.focus {
			Focus::Attribute(_) => self.attribute().map(|a| a.name.namespace_uri()).unwrap_or(""),
			Focus::AttributeValue(_) => "",
			Focus::Node => self
				.entry()
				.and_then(|e| e.token.element_name())
				.map(|n| n.namespace_uri())
				.unwrap_or(""),
		}
	}

	fn prefix(&self) -> &str {
		match self.focus {
			Focus::Attribute(_) => self.attribute().map(|a| a.name.prefix.as_str()).unwrap_or(""),
			Focus::AttributeValue(_) => "",
			Focus::Node => self
				.entry()
				.and_then(|e| e.token.element_name())
				.map(|n| n.prefix.as_str())
				.unwrap_or(""),
		}
	}

	fn value(&self) -> &str {
		if self.focus != Focus::Node {
			return self.attribute().map(|a| a.value.as_str()).unwrap_or("");
		}
		match self.entry().map(|e| &e.token) {
			Some(Token::Text(s))
			| Some(Token::CData(s))
			| Some(Token::Whitespace(s))
			| Some(Token::SignificantWhitespace(s))
			| Some(Token::Comment(s))
			| Some(Token::XmlDeclaration(s)) => s.as_str(),
			Some(Token::ProcessingInstruction { data, .. }) => data.as_str(),
			Some(Token::DocumentType { subset, .. }) => subset.as_str(),
			_ => "",
		}
	}

	fn depth(&self) -> usize {
		let base = match self.entry() {
			Some(entry) => entry.depth,
			None => return 0,
		};
		match self.focus {
			Focus::Node => base,
			Focus::Attribute(_) => base + 1,
			Focus::AttributeValue(_) => base + 2,
		}
	}

	fn base_uri(&self) -> &str {
		&self.base_uri
	}

	fn is_empty_element(&self) -> bool {
		match (self.focus, self.entry().map(|e| &e.token)) {
			(Focus::Node, Some(Token::Element { empty, .. })) => *empty,
			_ => false,
		}
	}

	fn is_default(&self) -> bool {
		match self.focus {
			Focus::Attribute(_) => self.attribute().map(|a| a.default).unwrap_or(false),
			_ => false,
		}
	}

	fn attribute_count(&self) -> usize {
		match self.entry().map(|e| &e.token) {
			Some(Token::Element { attributes, .. }) => attributes.len(),
			Some(Token::DocumentType {
				public_id,
				system_id,
				..
			}) => public_id.is_some() as usize + system_id.is_some() as usize,
			_ => 0,
		}
	}

	fn eof(&self) -> bool {
		self.state == ReadState::EndOfFile
	}

	fn read_state(&self) -> ReadState {
		self.state
	}

	fn get_attribute(&self, name: &str) -> Option<&str> {
		match self.entry().map(|e| &e.token) {
			Some(Token::DocumentType {
				public_id,
				system_id,
				..
			}) => match name {
				"PUBLIC" => public_id.as_deref(),
				"SYSTEM" => system_id.as_deref(),
				_ => None,
			},
			_ => self
				.attributes()
				.iter()
				.find(|a| a.name.qname.as_str() == name)
				.map(|a| a.value.as_str()),
		}
	}

	fn get_attribute_ns(&self, local_name: &str, namespace_uri: &str) -> Option<&str> {
		self.attributes()
			.iter()
			.find(|a| a.name.local_name.as_str() == local_name && a.name.namespace_uri() == namespace_uri)
			.map(|a| a.value.as_str())
	}

	fn get_attribute_at(&self, index: usize) -> Option<&str> {
		self.attributes().get(index).map(|a| a.value.as_str())
	}

	fn lookup_namespace(&self, prefix: &str) -> Option<&str> {
		let entry = self.entry()?;
		self.doc.lookup(entry.scope, prefix)
	}

	fn move_to_attribute(&mut self, name: &str) -> bool {
		let idx = self.attributes().iter().position(|a| a.name.qname.as_str() == name);
		self.focus_attribute(idx)
	}

	fn move_to_attribute_ns(&mut self, local_name: &str, namespace_uri: &str) -> bool {
		let idx = self
			.attributes()
			.iter()
			.position(|a| {
				a.name.local_name.as_str() == local_name && a.name.namespace_uri() == namespace_uri
			});
		self.focus_attribute(idx)
	}

	fn move_to_attribute_at(&mut self, index: usize) -> bool {
		let idx = if index < self.attributes().len() {
			Some(index)
		} else {
			None
		};
		self.focus_attribute(idx)
	}

	fn move_to_element(&mut self) -> bool {
		if self.focus == Focus::Node {
			return false;
		}
		self.focus = Focus::Node;
		self.chunk_offset = 0;
		true
	}

	fn move_to_first_attribute(&mut self) -> bool {
		self.move_to_attribute_at(0)
	}

	fn move_to_next_attribute(&mut self) -> bool {
		match self.focus {
			Focus::Node => self.move_to_first_attribute(),
			Focus::Attribute(i) | Focus::AttributeValue(i) => self.move_to_attribute_at(i + 1),
		}
	}

	fn read_attribute_value(&mut self) -> bool {
		match self.focus {
			Focus::Attribute(i) => {
				self.focus = Focus::AttributeValue(i);
				self.chunk_offset = 0;
				true
			}
			_ => false,
		}
	}

	fn resolve_entity(&mut self) -> Result<()> {
		match self.node_type() {
			NodeType::EntityReference => Err(Error::Unsupported("resolve_entity")),
			other => Err(Error::InvalidState(StateError::UnexpectedNodeType(other))),
		}
	}

	fn can_read_value_chunk(&self) -> bool {
		self.chunked
	}

	fn read_value_chunk(&mut self, buf: &mut [char]) -> Result<usize> {
		if !self.chunked {
			return Err(Error::Unsupported("read_value_chunk"));
		}
		let value = self.value();
		let mut n = 0;
		let mut consumed = self.chunk_offset;
		for (slot, ch) in buf.iter_mut().zip(value[self.chunk_offset..].chars()) {
			*slot = ch;
			consumed += ch.len_utf8();
			n += 1;
		}
		self.chunk_offset = consumed;
		Ok(n)
	}
}

impl Cursor for MemoryCursor {
	fn read(&mut self) -> Result<bool> {
		self.focus = Focus::Node;
		self.chunk_offset = 0;
		match self.state {
			ReadState::Initial => {
				if self.doc.entries.is_empty() {
					self.state = ReadState::EndOfFile;
					return Ok(false);
				}
				self.pos = 0;
				self.state = ReadState::Interactive;
				Ok(true)
			}
			ReadState::Interactive => {
				if self.pos + 1 < self.doc.entries.len() {
					self.pos += 1;
					Ok(true)
				} else {
					self.state = ReadState::EndOfFile;
					Ok(false)
				}
			}
			_ => Ok(false),
		}
	}

	fn execution_mode(&self) -> ExecutionMode {
		self.mode
	}

	fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<bool>> {
		let this = self.get_mut();
		match this.poll_gate(Gate::Read, cx) {
			Poll::Pending => Poll::Pending,
			Poll::Ready(()) => Poll::Ready(this.read()),
		}
	}

	fn poll_move_to_content(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<NodeType>> {
		let this = self.get_mut();
		match this.poll_gate(Gate::MoveToContent, cx) {
			Poll::Pending => Poll::Pending,
			Poll::Ready(()) => Poll::Ready(this.move_to_content()),
		}
	}

	fn poll_skip(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>> {
		let this = self.get_mut();
		match this.poll_gate(Gate::Skip, cx) {
			Poll::Pending => Poll::Pending,
			Poll::Ready(()) => Poll::Ready(this.skip()),
		}
	}

	fn poll_get_value(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<String>> {
		let this = self.get_mut();
		match this.poll_gate(Gate::GetValue, cx) {
			Poll::Pending => Poll::Pending,
			Poll::Ready(()) => Poll::Ready(this.get_value()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use tokio_test::{assert_pending, assert_ready_ok};

	fn sample() -> Document {
		Document::builder()
			.xml_declaration("version='1.0'")
			.comment(" prologue ")
			.start("root")
			.attr("xmlns", "urn:example:default")
			.attr("xmlns:x", "urn:example:x")
			.attr("id", "r1")
			.whitespace("\n  ")
			.start("x:child")
			.attr("x:kind", "leaf")
			.default_attr("flag", "on")
			.text("some text")
			.end()
			.empty("sibling")
			.end()
			.build()
			.unwrap()
	}

	fn read_to(cursor: &mut MemoryCursor, kind: NodeType, name: &str) {
		while cursor.read().unwrap() {
			if cursor.node_type() == kind && cursor.name() == name {
				return;
			}
		}
		panic!("{:?} {} not found", kind, name);
	}

	#[test]
	fn cursor_starts_uninteractive() {
		let cursor = MemoryCursor::new(sample());
		assert_eq!(cursor.read_state(), ReadState::Initial);
		assert_eq!(cursor.node_type(), NodeType::None);
		assert!(!cursor.is_interactive());
		assert!(!cursor.eof());
	}

	#[test]
	fn cursor_reports_depths_in_document_order() {
		let mut cursor = MemoryCursor::new(sample());
		let mut seen = Vec::new();
		while cursor.read().unwrap() {
			seen.push((cursor.node_type(), cursor.depth()));
		}
		assert_eq!(
			seen,
			vec![
				(NodeType::XmlDeclaration, 0),
				(NodeType::Comment, 0),
				(NodeType::Element, 0),
				(NodeType::Whitespace, 1),
				(NodeType::Element, 1),
				(NodeType::Text, 2),
				(NodeType::EndElement, 1),
				(NodeType::Element, 1),
				(NodeType::EndElement, 0),
			]
		);
		assert!(cursor.eof());
		assert_eq!(cursor.read_state(), ReadState::EndOfFile);
		assert_eq!(cursor.node_type(), NodeType::None);
		assert!(!cursor.read().unwrap());
	}

	#[test]
	fn cursor_resolves_namespaces() {
		let mut cursor = MemoryCursor::new(sample());
		read_to(&mut cursor, NodeType::Element, "x:child");
		assert_eq!(cursor.prefix(), "x");
		assert_eq!(cursor.local_name(), "child");
		assert_eq!(cursor.namespace_uri(), "urn:example:x");
		assert_eq!(cursor.lookup_namespace(""), Some("urn:example:default"));
		assert_eq!(cursor.lookup_namespace("xml"), Some(XMLNS_XML));
		assert_eq!(cursor.lookup_namespace("nope"), None);
		assert_eq!(cursor.get_attribute_ns("kind", "urn:example:x"), Some("leaf"));
		// unprefixed attributes stay unnamespaced
		assert_eq!(cursor.get_attribute_ns("flag", ""), Some("on"));

		read_to(&mut cursor, NodeType::Element, "sibling");
		assert_eq!(cursor.namespace_uri(), "urn:example:default");
		assert!(cursor.is_empty_element());
	}

	#[test]
	fn end_element_carries_the_start_name() {
		let mut cursor = MemoryCursor::new(sample());
		read_to(&mut cursor, NodeType::EndElement, "x:child");
		assert_eq!(cursor.local_name(), "child");
		assert_eq!(cursor.namespace_uri(), "urn:example:x");
	}

	#[test]
	fn attribute_navigation_round_trip() {
		let mut cursor = MemoryCursor::new(sample());
		read_to(&mut cursor, NodeType::Element, "x:child");
		assert_eq!(cursor.attribute_count(), 2);
		assert!(cursor.move_to_first_attribute());
		assert_eq!(cursor.node_type(), NodeType::Attribute);
		assert_eq!(cursor.name(), "x:kind");
		assert_eq!(cursor.value(), "leaf");
		assert_eq!(cursor.depth(), 2);
		assert!(!cursor.is_default());
		assert!(cursor.read_attribute_value());
		assert_eq!(cursor.node_type(), NodeType::Text);
		assert_eq!(cursor.value(), "leaf");
		assert_eq!(cursor.depth(), 3);
		assert!(!cursor.read_attribute_value());
		assert!(cursor.move_to_next_attribute());
		assert_eq!(cursor.name(), "flag");
		assert!(cursor.is_default());
		assert!(!cursor.move_to_next_attribute());
		assert!(cursor.move_to_element());
		assert_eq!(cursor.node_type(), NodeType::Element);
		assert!(!cursor.move_to_element());
		assert!(cursor.move_to_attribute("flag"));
		assert!(cursor.move_to_attribute_ns("kind", "urn:example:x"));
		assert!(!cursor.move_to_attribute_at(2));
		assert_eq!(cursor.get_attribute_at(1), Some("on"));
	}

	#[test]
	fn read_leaves_attribute_focus() {
		let mut cursor = MemoryCursor::new(sample());
		read_to(&mut cursor, NodeType::Element, "x:child");
		assert!(cursor.move_to_first_attribute());
		assert!(cursor.read().unwrap());
		assert_eq!(cursor.node_type(), NodeType::Text);
		assert_eq!(cursor.value(), "some text");
	}

	#[test]
	fn move_to_content_skips_prologue() {
		let mut cursor = MemoryCursor::new(sample());
		assert_eq!(cursor.move_to_content().unwrap(), NodeType::Element);
		assert_eq!(cursor.name(), "root");
		assert!(cursor.move_to_first_attribute());
		assert_eq!(cursor.move_to_content().unwrap(), NodeType::Element);
		assert_eq!(cursor.name(), "root");
	}

	#[test]
	fn skip_consumes_the_whole_element() {
		let mut cursor = MemoryCursor::new(sample());
		read_to(&mut cursor, NodeType::Element, "x:child");
		cursor.skip().unwrap();
		assert_eq!(cursor.node_type(), NodeType::Element);
		assert_eq!(cursor.name(), "sibling");
		cursor.skip().unwrap();
		assert_eq!(cursor.node_type(), NodeType::EndElement);
		assert_eq!(cursor.name(), "root");
	}

	#[test]
	fn chunked_reads_split_on_char_boundaries() {
		let doc = Document::builder()
			.start("a")
			.text("gr\u{fc}\u{df}e")
			.end()
			.build()
			.unwrap();
		let mut cursor = MemoryCursor::new(doc).value_chunks(true);
		cursor.read().unwrap();
		cursor.read().unwrap();
		let mut buf = ['\0'; 2];
		let mut out = String::new();
		loop {
			let n = cursor.read_value_chunk(&mut buf[..]).unwrap();
			if n == 0 {
				break;
			}
			out.extend(buf[..n].iter());
		}
		assert_eq!(out, "gr\u{fc}\u{df}e");
	}

	#[test]
	fn chunked_reads_are_off_by_default() {
		let doc = Document::builder().start("a").text("x").end().build().unwrap();
		let mut cursor = MemoryCursor::new(doc);
		cursor.read().unwrap();
		assert!(!cursor.can_read_value_chunk());
		let mut buf = ['\0'; 4];
		assert_eq!(
			cursor.read_value_chunk(&mut buf[..]),
			Err(Error::Unsupported("read_value_chunk"))
		);
	}

	#[test]
	fn doctype_exposes_public_and_system_ids() {
		let doc = Document::builder()
			.doctype("html", Some("-//W3C//DTD XHTML 1.0 Strict//EN"), Some("xhtml1-strict.dtd"), "")
			.empty("html")
			.build()
			.unwrap();
		let mut cursor = MemoryCursor::new(doc);
		cursor.read().unwrap();
		assert_eq!(cursor.node_type(), NodeType::DocumentType);
		assert_eq!(cursor.name(), "html");
		assert_eq!(cursor.attribute_count(), 2);
		assert_eq!(cursor.get_attribute("PUBLIC"), Some("-//W3C//DTD XHTML 1.0 Strict//EN"));
		assert_eq!(cursor.get_attribute("SYSTEM"), Some("xhtml1-strict.dtd"));
	}

	#[test]
	fn resolve_entity_is_rejected() {
		let doc = Document::builder()
			.start("a")
			.entity_ref("nbsp")
			.end()
			.build()
			.unwrap();
		let mut cursor = MemoryCursor::new(doc);
		assert_eq!(
			cursor.resolve_entity(),
			Err(Error::InvalidState(StateError::UnexpectedNodeType(NodeType::None)))
		);
		cursor.read().unwrap();
		cursor.read().unwrap();
		assert_eq!(cursor.name(), "nbsp");
		assert_eq!(cursor.resolve_entity(), Err(Error::Unsupported("resolve_entity")));
	}

	#[test]
	fn builder_rejects_misuse() {
		assert_eq!(
			Document::builder().attr("a", "b").build(),
			Err(Error::InvalidArgument("attribute owner"))
		);
		assert_eq!(
			Document::builder().end().build(),
			Err(Error::InvalidArgument("open element"))
		);
		assert_eq!(
			Document::builder().start("p:a").end().build(),
			Err(Error::InvalidArgument("namespace prefix"))
		);
		assert_eq!(
			Document::builder().start(":a").build(),
			Err(Error::InvalidArgument("name"))
		);
		assert_eq!(
			Document::builder().start("").build(),
			Err(Error::InvalidArgument("name"))
		);
	}

	#[test]
	fn builder_accepts_truncated_documents() {
		let doc = Document::builder().start("a").text("x").build().unwrap();
		assert_eq!(doc.len(), 2);
	}

	#[test]
	fn suspendable_cursor_yields_once_per_primitive() {
		let doc = Document::builder().empty("a").build().unwrap();
		let mut cursor = MemoryCursor::suspendable(doc);
		assert_eq!(cursor.execution_mode(), ExecutionMode::Suspendable);
		{
			let mut fut = tokio_test::task::spawn(std::future::poll_fn(|cx| {
				Pin::new(&mut cursor).poll_read(cx)
			}));
			assert_pending!(fut.poll());
			assert!(fut.is_woken());
			assert_eq!(assert_ready_ok!(fut.poll()), true);
		}
		assert_eq!(cursor.suspensions(), 1);
		assert_eq!(cursor.name(), "a");
	}

	#[test]
	fn immediate_cursor_never_yields() {
		let doc = Document::builder().empty("a").build().unwrap();
		let mut cursor = MemoryCursor::new(doc);
		{
			let mut fut = tokio_test::task::spawn(std::future::poll_fn(|cx| {
				Pin::new(&mut cursor).poll_move_to_content(cx)
			}));
			assert_eq!(assert_ready_ok!(fut.poll()), NodeType::Element);
		}
		assert_eq!(cursor.suspensions(), 0);
	}

	#[test]
	fn abandoned_suspension_does_not_carry_over() {
		let doc = Document::builder().start("a").text("t").end().build().unwrap();
		let mut cursor = MemoryCursor::suspendable(doc);
		{
			let mut fut = tokio_test::task::spawn(std::future::poll_fn(|cx| {
				Pin::new(&mut cursor).poll_read(cx)
			}));
			assert_pending!(fut.poll());
		}
		assert_eq!(cursor.read_state(), ReadState::Initial);
		{
			let mut fut = tokio_test::task::spawn(std::future::poll_fn(|cx| {
				Pin::new(&mut cursor).poll_move_to_content(cx)
			}));
			assert_pending!(fut.poll());
			assert_eq!(assert_ready_ok!(fut.poll()), NodeType::Element);
		}
		assert_eq!(cursor.suspensions(), 2);
	}
}
